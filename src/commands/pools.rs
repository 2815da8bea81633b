use anyhow::{Context, Result};
use clap::Args;

use crate::{AppCtx, resource::inspect_pool, topology::PoolState, ui};

#[derive(Args, Debug)]
pub struct ListArgs {}

impl ListArgs {
    pub fn run(&self, ctx: &AppCtx) -> Result<()> {
        let pools = ctx.zpool()?.list_pools()?;
        ui::print_pools(&pools);
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    pub pool: String,

    /// Print the parsed topology as JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(&self, ctx: &AppCtx) -> Result<()> {
        let zpool = ctx.zpool()?;
        match inspect_pool(zpool.as_ref(), &self.pool)? {
            PoolState::Absent => {
                tracing::info!("[status] pool {} is absent", self.pool);
                if self.json {
                    println!("null");
                }
            }
            PoolState::Present(topo) if self.json => {
                let out = serde_json::to_string_pretty(&topo)
                    .with_context(|| format!("serialize topology of {}", self.pool))?;
                println!("{out}");
            }
            PoolState::Present(topo) => ui::print_topology(&topo),
        }
        Ok(())
    }
}
