use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "shipctl", version, about = "Web app deployment CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upload a built directory tree to the S3 bucket and invalidate CloudFront.
    Sync(SyncArgs),
    /// Mirror a local directory onto the EC2 host over SFTP.
    Mirror(MirrorArgs),
    /// Package the app and deploy it to the Lightsail host.
    Deploy(DeployArgs),
    /// Look up the domain's hosted zone and A record in Route 53.
    VerifyDomain,
    /// Verify AWS credentials and SSH connectivity without deploying.
    Check,
}

#[derive(Args)]
pub struct SyncArgs {
    /// Local directory to upload.
    #[arg(long, default_value = "build")]
    pub path: PathBuf,
    /// Optional key prefix inside the bucket.
    #[arg(long)]
    pub prefix: Option<String>,
}

#[derive(Args)]
pub struct MirrorArgs {
    /// Local directory to mirror.
    #[arg(long, default_value = "build")]
    pub path: PathBuf,
    /// Remote directory to mirror into.
    #[arg(long)]
    pub remote_dir: String,
}

#[derive(Args)]
pub struct DeployArgs {
    /// Project root containing the deploy-file manifest entries.
    #[arg(long, default_value = ".")]
    pub project_root: PathBuf,
    /// Run `npm run build` before packaging.
    #[arg(long, default_value_t = false)]
    pub build: bool,
}
