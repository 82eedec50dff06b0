mod aws;
mod check;
mod cli;
mod command;
mod config;
mod content_type;
mod error;
mod lightsail;
mod manifest;
mod mirror;
mod package;
mod route53;
mod s3;
mod ssh;

use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::config::DeployConfig;
use crate::error::Result;

fn main() {
    init_tracing();
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // The snapshot is taken before any network call; missing credentials
    // fail here.
    let config = DeployConfig::from_env()?;
    match cli.command {
        Commands::Sync(args) => runtime()?.block_on(s3::sync(&config, args)),
        Commands::Mirror(args) => mirror::run(&config, args),
        Commands::Deploy(args) => lightsail::deploy(&config, args),
        Commands::VerifyDomain => runtime()?.block_on(route53::run(&config)),
        Commands::Check => runtime()?.block_on(check::run(&config)),
    }
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init()
        .ok();
}
