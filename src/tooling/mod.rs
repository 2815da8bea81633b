use std::sync::Arc;

use anyhow::Result;

use crate::utils::{bins::ensure_bins, process::Runner};

pub mod zpool;

pub use zpool::{ZpoolCli, ZpoolPort};

/// Builds the zpool port after checking its binary is available.
pub fn zpool_port(runner: Arc<dyn Runner + Send + Sync>) -> Result<Arc<dyn ZpoolPort>> {
    ensure_bins(zpool::REQ_BINS.iter().copied())?;
    Ok(Arc::new(ZpoolCli::new(runner)))
}
