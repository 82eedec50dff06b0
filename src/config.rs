use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{DeployError, Result};

const DEFAULT_REGION: &str = "us-east-1";
const DEFAULT_SSH_PORT: u16 = 22;
const DEFAULT_EC2_KEY_PATH: &str = "~/.ssh/aws_key";
const DEFAULT_LIGHTSAIL_USER: &str = "bitnami";
const DEFAULT_LIGHTSAIL_KEY_PATH: &str = "~/.ssh/lightsail.pem";
const DEFAULT_REMOTE_APP_DIR: &str = "/opt/bitnami/apache/htdocs/app";
const DEFAULT_REMOTE_NGINX_DIR: &str = "/opt/bitnami/nginx/conf/server_blocks";
const DEFAULT_NGINX_CONFIG_FILE: &str = "config/nginx.conf";

const DEFAULT_DEPLOY_FILES: [&str; 6] = [
    "build",
    "backend",
    "config",
    "package.json",
    "package-lock.json",
    "server.js",
];

const DEFAULT_POST_DEPLOY_COMMANDS: [&str; 3] = [
    "cd {remote_app_dir} && npm install --production",
    "pm2 stop {domain} || true",
    "cd {remote_app_dir} && pm2 start server.js --name {domain}",
];

const DEFAULT_RESTART_COMMANDS: [&str; 1] = ["sudo /opt/bitnami/ctlscript.sh restart nginx"];

/// S3 bucket plus optional key prefix and CloudFront distribution.
#[derive(Debug, Clone)]
pub struct ObjectStorageTarget {
    pub bucket: String,
    pub key_prefix: Option<String>,
    pub distribution_id: Option<String>,
}

/// A host reachable over SSH onto which a directory tree is mirrored.
#[derive(Debug, Clone)]
pub struct RemoteHostTarget {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub key_path: PathBuf,
    pub remote_root: String,
}

/// A pm2 + nginx host that receives the packaged archive.
#[derive(Debug, Clone)]
pub struct PackagedTarget {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub key_path: PathBuf,
    pub remote_app_dir: String,
    pub remote_nginx_dir: String,
}

/// Immutable snapshot of the deployment environment, taken once at startup.
/// No component reads process state after this is constructed.
#[derive(Debug, Clone)]
pub struct DeployConfig {
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub aws_region: String,
    pub s3_bucket: String,
    pub cloudfront_distribution_id: Option<String>,
    pub domain: Option<String>,
    pub route53_hosted_zone_id: Option<String>,

    pub ec2_host: Option<String>,
    pub ec2_port: u16,
    pub ec2_username: Option<String>,
    pub ec2_key_path: PathBuf,

    pub lightsail_ip: Option<String>,
    pub lightsail_ssh_user: String,
    pub lightsail_ssh_port: u16,
    pub lightsail_key_path: PathBuf,
    pub remote_app_dir: String,
    pub remote_nginx_dir: String,
    pub nginx_config_file: String,

    pub deploy_files: Vec<String>,
    pub post_deploy_commands: Vec<String>,
    pub restart_commands: Vec<String>,
}

impl DeployConfig {
    /// Loads `.env` (if present) and snapshots the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_vars(&vars)
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self> {
        let home = get(vars, "HOME");

        let aws_access_key_id = require(vars, "AWS_ACCESS_KEY_ID")?;
        let aws_secret_access_key = require(vars, "AWS_SECRET_ACCESS_KEY")?;
        let s3_bucket = require(vars, "AWS_S3_BUCKET")?;

        Ok(Self {
            aws_access_key_id,
            aws_secret_access_key,
            aws_region: get(vars, "AWS_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
            s3_bucket,
            cloudfront_distribution_id: get(vars, "AWS_CLOUDFRONT_DISTRIBUTION_ID"),
            domain: get(vars, "DOMAIN"),
            route53_hosted_zone_id: get(vars, "AWS_ROUTE53_HOSTED_ZONE_ID"),

            ec2_host: get(vars, "AWS_EC2_HOST"),
            ec2_port: parse_port(vars, "AWS_EC2_PORT")?.unwrap_or(DEFAULT_SSH_PORT),
            ec2_username: get(vars, "AWS_EC2_USERNAME"),
            ec2_key_path: expand_home(
                &get(vars, "AWS_EC2_KEY_PATH").unwrap_or_else(|| DEFAULT_EC2_KEY_PATH.to_string()),
                home.as_deref(),
            ),

            lightsail_ip: get(vars, "LIGHTSAIL_IP"),
            lightsail_ssh_user: get(vars, "LIGHTSAIL_SSH_USER")
                .unwrap_or_else(|| DEFAULT_LIGHTSAIL_USER.to_string()),
            lightsail_ssh_port: parse_port(vars, "LIGHTSAIL_SSH_PORT")?.unwrap_or(DEFAULT_SSH_PORT),
            lightsail_key_path: expand_home(
                &get(vars, "LIGHTSAIL_SSH_KEY_PATH")
                    .unwrap_or_else(|| DEFAULT_LIGHTSAIL_KEY_PATH.to_string()),
                home.as_deref(),
            ),
            remote_app_dir: get(vars, "LIGHTSAIL_REMOTE_DIR")
                .unwrap_or_else(|| DEFAULT_REMOTE_APP_DIR.to_string()),
            remote_nginx_dir: get(vars, "LIGHTSAIL_NGINX_DIR")
                .unwrap_or_else(|| DEFAULT_REMOTE_NGINX_DIR.to_string()),
            nginx_config_file: get(vars, "NGINX_CONFIG_FILE")
                .unwrap_or_else(|| DEFAULT_NGINX_CONFIG_FILE.to_string()),

            deploy_files: get(vars, "DEPLOY_FILES")
                .map(|value| {
                    value
                        .split(',')
                        .map(|item| item.trim().to_string())
                        .filter(|item| !item.is_empty())
                        .collect()
                })
                .unwrap_or_else(|| DEFAULT_DEPLOY_FILES.map(String::from).to_vec()),
            post_deploy_commands: DEFAULT_POST_DEPLOY_COMMANDS.map(String::from).to_vec(),
            restart_commands: DEFAULT_RESTART_COMMANDS.map(String::from).to_vec(),
        })
    }

    pub fn require_domain(&self) -> Result<&str> {
        self.domain
            .as_deref()
            .ok_or_else(|| DeployError::Config("DOMAIN is required for this command".to_string()))
    }

    pub fn object_storage_target(&self, key_prefix: Option<String>) -> ObjectStorageTarget {
        ObjectStorageTarget {
            bucket: self.s3_bucket.clone(),
            key_prefix,
            distribution_id: self.cloudfront_distribution_id.clone(),
        }
    }

    pub fn mirror_target(&self, remote_root: String) -> Result<RemoteHostTarget> {
        let host = self
            .ec2_host
            .clone()
            .ok_or_else(|| DeployError::Config("AWS_EC2_HOST is required for mirror".to_string()))?;
        let username = self.ec2_username.clone().ok_or_else(|| {
            DeployError::Config("AWS_EC2_USERNAME is required for mirror".to_string())
        })?;
        Ok(RemoteHostTarget {
            host,
            port: self.ec2_port,
            username,
            key_path: self.ec2_key_path.clone(),
            remote_root,
        })
    }

    pub fn packaged_target(&self) -> Result<PackagedTarget> {
        let host = self
            .lightsail_ip
            .clone()
            .ok_or_else(|| DeployError::Config("LIGHTSAIL_IP is required for deploy".to_string()))?;
        Ok(PackagedTarget {
            host,
            port: self.lightsail_ssh_port,
            username: self.lightsail_ssh_user.clone(),
            key_path: self.lightsail_key_path.clone(),
            remote_app_dir: self.remote_app_dir.clone(),
            remote_nginx_dir: self.remote_nginx_dir.clone(),
        })
    }
}

fn get(vars: &HashMap<String, String>, key: &str) -> Option<String> {
    vars.get(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn require(vars: &HashMap<String, String>, key: &str) -> Result<String> {
    get(vars, key)
        .ok_or_else(|| DeployError::Config(format!("{key} environment variable is missing")))
}

fn parse_port(vars: &HashMap<String, String>, key: &str) -> Result<Option<u16>> {
    match get(vars, key) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<u16>()
            .map(Some)
            .map_err(|_| DeployError::Config(format!("{key} is not a valid port: {raw}"))),
    }
}

fn expand_home(path: &str, home: Option<&str>) -> PathBuf {
    if let (Some(home), Some(rest)) = (home, path.strip_prefix("~/")) {
        return PathBuf::from(home).join(rest);
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_vars() -> HashMap<String, String> {
        HashMap::from([
            ("AWS_ACCESS_KEY_ID".to_string(), "AKIATEST".to_string()),
            ("AWS_SECRET_ACCESS_KEY".to_string(), "secret".to_string()),
            ("AWS_S3_BUCKET".to_string(), "my-assets".to_string()),
        ])
    }

    #[test]
    fn minimal_vars_use_defaults() {
        let config = DeployConfig::from_vars(&base_vars()).expect("config");
        assert_eq!(config.aws_region, "us-east-1");
        assert_eq!(config.lightsail_ssh_user, "bitnami");
        assert_eq!(config.lightsail_ssh_port, 22);
        assert_eq!(config.ec2_port, 22);
        assert_eq!(config.deploy_files.len(), 6);
        assert!(config.deploy_files.contains(&"server.js".to_string()));
        assert!(config.cloudfront_distribution_id.is_none());
    }

    #[test]
    fn missing_bucket_fails_at_startup() {
        let mut vars = base_vars();
        vars.remove("AWS_S3_BUCKET");
        let err = DeployConfig::from_vars(&vars).unwrap_err();
        assert!(err.to_string().contains("AWS_S3_BUCKET"));
    }

    #[test]
    fn missing_credentials_fail_at_startup() {
        let mut vars = base_vars();
        vars.remove("AWS_ACCESS_KEY_ID");
        assert!(DeployConfig::from_vars(&vars).is_err());
        let mut vars = base_vars();
        vars.insert("AWS_SECRET_ACCESS_KEY".to_string(), "  ".to_string());
        assert!(DeployConfig::from_vars(&vars).is_err());
    }

    #[test]
    fn key_paths_expand_home() {
        let mut vars = base_vars();
        vars.insert("HOME".to_string(), "/home/deploy".to_string());
        vars.insert(
            "LIGHTSAIL_SSH_KEY_PATH".to_string(),
            "~/.ssh/lightsail.pem".to_string(),
        );
        let config = DeployConfig::from_vars(&vars).expect("config");
        assert_eq!(
            config.lightsail_key_path,
            PathBuf::from("/home/deploy/.ssh/lightsail.pem")
        );
    }

    #[test]
    fn deploy_files_override_is_parsed() {
        let mut vars = base_vars();
        vars.insert("DEPLOY_FILES".to_string(), "dist, server.js".to_string());
        let config = DeployConfig::from_vars(&vars).expect("config");
        assert_eq!(config.deploy_files, vec!["dist", "server.js"]);
    }

    #[test]
    fn invalid_port_is_a_config_error() {
        let mut vars = base_vars();
        vars.insert("LIGHTSAIL_SSH_PORT".to_string(), "ssh".to_string());
        assert!(DeployConfig::from_vars(&vars).is_err());
    }

    #[test]
    fn mirror_target_requires_host_and_username() {
        let config = DeployConfig::from_vars(&base_vars()).expect("config");
        assert!(config.mirror_target("/var/www".to_string()).is_err());

        let mut vars = base_vars();
        vars.insert("AWS_EC2_HOST".to_string(), "10.0.0.5".to_string());
        vars.insert("AWS_EC2_USERNAME".to_string(), "ubuntu".to_string());
        let config = DeployConfig::from_vars(&vars).expect("config");
        let target = config.mirror_target("/var/www".to_string()).expect("target");
        assert_eq!(target.host, "10.0.0.5");
        assert_eq!(target.remote_root, "/var/www");
    }

    #[test]
    fn packaged_target_requires_server_ip() {
        let config = DeployConfig::from_vars(&base_vars()).expect("config");
        assert!(config.packaged_target().is_err());
    }
}
