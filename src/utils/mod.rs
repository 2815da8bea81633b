pub mod bins;
pub mod exec_policy;
pub mod lock;
pub mod process;
