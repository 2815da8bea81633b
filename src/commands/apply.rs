use anyhow::{Context, Result};
use clap::Args;
use tracing as log;

use crate::{
    AppCtx,
    resource::PoolResource,
    ui,
    utils::{exec_policy::with_dry_run_enabled, lock::PoolLock},
};

#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Only look at this configured pool.
    #[arg(long)]
    pub pool: Option<String>,
}

impl PlanArgs {
    pub fn run(&self, ctx: &AppCtx) -> Result<()> {
        let cfg = ctx.cfg()?;
        let zpool = ctx.zpool()?;
        for desired in cfg.select(self.pool.as_deref())? {
            let mut res = PoolResource::new(desired, zpool.clone());
            let actions = res
                .plan()
                .with_context(|| format!("plan pool {}", desired.name))?;
            ui::print_plan(&desired.name, &actions);
        }
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Only converge this configured pool.
    #[arg(long)]
    pub pool: Option<String>,

    /// Log mutating zpool commands instead of running them.
    #[arg(long)]
    pub dry_run: bool,
}

impl ApplyArgs {
    pub fn run(&self, ctx: &AppCtx) -> Result<()> {
        let cfg = ctx.cfg()?;
        let zpool = ctx.zpool()?;
        let pools = cfg.select(self.pool.as_deref())?;

        let mut changed = 0usize;
        for desired in pools {
            let _lock = PoolLock::try_acquire(&desired.name)?;
            let mut res = PoolResource::new(desired, zpool.clone());
            let done = with_dry_run_enabled(self.dry_run, || res.apply())
                .with_context(|| format!("apply pool {}", desired.name))?;
            if !done.is_empty() {
                changed += 1;
            }
        }

        let mode = if self.dry_run { " (dry-run)" } else { "" };
        log::info!("[apply] done{mode}: {changed} pool(s) changed");
        Ok(())
    }
}
