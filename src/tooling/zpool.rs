use std::sync::Arc;

use anyhow::{Context, Result};

use crate::utils::process::{CmdSpec, Runner, StdioSpec};

pub const REQ_BINS: &[&str] = &["zpool"];

pub trait ZpoolPort: Send + Sync {
    fn list_pools(&self) -> Result<Vec<String>>;
    /// First word of every vdev-tree line of `zpool status`, header and pool
    /// name removed. Empty when the pool does not exist.
    fn status_tokens(&self, pool: &str) -> Result<Vec<String>>;
    fn create(&self, pool: &str, vdevs: &[String]) -> Result<()>;
    fn destroy(&self, pool: &str) -> Result<()>;
    fn get_property(&self, pool: &str, prop: &str) -> Result<String>;
    fn set_property(&self, pool: &str, prop: &str, value: &str) -> Result<()>;
}

type DynRunner = dyn Runner + Send + Sync;

pub struct ZpoolCli {
    runner: Arc<DynRunner>,
}

impl ZpoolCli {
    pub fn new(runner: Arc<DynRunner>) -> Self {
        Self { runner }
    }

    #[inline]
    fn zpool(&self) -> CmdSpec {
        CmdSpec::new("zpool")
    }

    pub fn create_cmd(&self, pool: &str, vdevs: &[String]) -> CmdSpec {
        self.zpool()
            .arg("create")
            .arg(pool)
            .args(vdevs.iter().cloned())
            .stderr(StdioSpec::Inherit)
    }
}

impl ZpoolPort for ZpoolCli {
    fn list_pools(&self) -> Result<Vec<String>> {
        let cmd = self
            .zpool()
            .args(["list", "-H", "-o", "name"])
            .stdout(StdioSpec::Pipe)
            .stderr(StdioSpec::Pipe);
        let out = self.runner.run_capture(&cmd).context("zpool list")?;

        Ok(out
            .lines()
            .filter_map(|l| l.split_whitespace().next())
            .map(str::to_string)
            .collect())
    }

    fn status_tokens(&self, pool: &str) -> Result<Vec<String>> {
        let cmd = self
            .zpool()
            .args(["status", "-P", pool])
            .stdout(StdioSpec::Pipe)
            .stderr(StdioSpec::Pipe);

        // a missing pool exits non-zero with nothing on stdout
        let out = self
            .runner
            .output(&cmd)
            .with_context(|| format!("zpool status {pool}"))?;
        if !out.success {
            tracing::debug!("[zpool] status {pool}: {}", out.stderr.trim());
        }
        Ok(vdev_tokens(&out.stdout))
    }

    fn create(&self, pool: &str, vdevs: &[String]) -> Result<()> {
        let cmd = self.create_cmd(pool, vdevs);
        self.runner
            .run(&cmd)
            .with_context(|| format!("zpool create {pool}"))
    }

    fn destroy(&self, pool: &str) -> Result<()> {
        let cmd = self
            .zpool()
            .args(["destroy", pool])
            .stderr(StdioSpec::Inherit);
        self.runner
            .run(&cmd)
            .with_context(|| format!("zpool destroy {pool}"))
    }

    fn get_property(&self, pool: &str, prop: &str) -> Result<String> {
        let cmd = self
            .zpool()
            .args(["get", "-H", "-o", "value", prop, pool])
            .stdout(StdioSpec::Pipe)
            .stderr(StdioSpec::Null);
        let out = self
            .runner
            .run_capture(&cmd)
            .with_context(|| format!("zpool get {prop} {pool}"))?;
        Ok(out.trim().to_string())
    }

    fn set_property(&self, pool: &str, prop: &str, value: &str) -> Result<()> {
        let cmd = self
            .zpool()
            .args(["set", &format!("{prop}={value}"), pool])
            .stderr(StdioSpec::Inherit);
        self.runner
            .run(&cmd)
            .with_context(|| format!("zpool set {prop}={value} {pool}"))
    }
}

/// Extracts the vdev tree from `zpool status` output.
///
/// Tree lines are tab-indented and start after the `NAME` column header; the
/// first entry under it is the pool itself and is dropped.
pub fn vdev_tokens(status: &str) -> Vec<String> {
    let mut tree = status
        .lines()
        .filter(|l| l.starts_with('\t'))
        .filter_map(|l| l.split_whitespace().next())
        .skip_while(|w| *w != "NAME");

    // header, then pool name
    if tree.next().is_none() || tree.next().is_none() {
        return Vec::new();
    }
    tree.map(str::to_string).collect()
}
