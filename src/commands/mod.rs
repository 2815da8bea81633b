pub mod apply;
pub mod pools;
