use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

mod commands;
mod config;
mod resource;
mod tooling;
mod topology;
mod ui;
mod utils;

use commands::{apply, pools};
use config::Config;
use tooling::ZpoolPort;
use utils::process::{ProcessRunner, Runner};

pub struct AppCtx {
    pub debug: bool,
    pub config: PathBuf,
    pub runner: Arc<dyn Runner + Send + Sync>,
}

impl AppCtx {
    pub fn cfg(&self) -> Result<Config> {
        Config::load(&self.config)
    }

    pub fn zpool(&self) -> Result<Arc<dyn ZpoolPort>> {
        tooling::zpool_port(self.runner.clone())
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "zpoolctl",
    about = "Declarative ZFS pool lifecycle: inspect zpool topology, create, destroy, tune",
    arg_required_else_help = false,
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    #[arg(long, default_value = "./config.toml", global = true)]
    config: PathBuf,

    #[arg(long, global = true)]
    debug: bool,

    #[arg(long, global = true)]
    check_config: bool,

    #[arg(long, global = true)]
    print_config: bool,

    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// List existing pools.
    List(pools::ListArgs),
    /// Show the parsed vdev topology of one pool.
    Status(pools::StatusArgs),
    /// Show what `apply` would change.
    Plan(apply::PlanArgs),
    /// Converge configured pools to their desired state.
    Apply(apply::ApplyArgs),
}

fn init_tracing(debug: bool) {
    let default = if debug { "trace" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_file(debug)
        .with_line_number(debug)
        .without_time()
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let ctx = AppCtx {
        debug: cli.debug,
        config: cli.config,
        runner: Arc::new(ProcessRunner::new()),
    };
    if ctx.debug {
        tracing::debug!("config path: {}", ctx.config.display());
    }

    if cli.check_config || cli.print_config {
        let cfg = ctx.cfg()?;
        if cli.check_config {
            tracing::info!("config OK: {} pool(s)", cfg.pools.len());
        }
        if cli.print_config {
            println!("{}", cfg.to_toml()?);
        }
        return Ok(());
    }

    let Some(cmd) = cli.command else {
        let mut cmd = Cli::command();
        cmd.print_help()?;
        println!();
        return Ok(());
    };

    match cmd {
        Cmd::List(args) => args.run(&ctx),
        Cmd::Status(args) => args.run(&ctx),
        Cmd::Plan(args) => args.run(&ctx),
        Cmd::Apply(args) => args.run(&ctx),
    }
}
