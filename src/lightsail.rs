use std::path::Path;
use std::process::Command;

use crate::cli::DeployArgs;
use crate::command::{self, shell_quote, TemplateVars};
use crate::config::{DeployConfig, PackagedTarget};
use crate::error::{DeployError, Result};
use crate::package;
use crate::ssh;

const REMOTE_ARCHIVE_PATH: &str = "/tmp/deploy.tar.gz";
const NGINX_TEST_COMMAND: &str = "sudo /opt/bitnami/nginx/sbin/nginx -t";

pub fn deploy(config: &DeployConfig, args: DeployArgs) -> Result<()> {
    let target = config.packaged_target()?;
    let domain = config.require_domain()?;

    // Resolve every template up front so a bad placeholder fails before the
    // build, the packaging and the session.
    let vars = TemplateVars {
        remote_app_dir: &target.remote_app_dir,
        remote_nginx_dir: &target.remote_nginx_dir,
        domain,
        server_ip: &target.host,
    };
    let post_deploy = command::resolve_all(&config.post_deploy_commands, &vars)?;
    let restart = command::resolve_all(&config.restart_commands, &vars)?;
    let steps = deploy_steps(
        &target,
        &config.nginx_config_file,
        domain,
        &post_deploy,
        &restart,
    );

    if args.build {
        run_build(&args.project_root)?;
    }

    println!("Packaging {} deploy entries", config.deploy_files.len());
    let archive = package::build_archive(&args.project_root, &config.deploy_files)?;

    let session = ssh::connect(&target.host, target.port, &target.username, &target.key_path)?;

    // Transfer phase. If this fails the execution phase never starts.
    println!("Transferring archive to {}:{REMOTE_ARCHIVE_PATH}", target.host);
    ssh::upload_file(&session, archive.path(), Path::new(REMOTE_ARCHIVE_PATH))?;

    // Execution phase: discrete commands, each checked, abort on the first
    // non-zero exit.
    for step in &steps {
        println!("$ {step}");
        ssh::run_checked(&session, step)?;
    }

    println!("Deployed to {} ({domain})", target.host);
    Ok(())
}

/// The ordered remote step list: ensure the app directory, extract and drop
/// the archive, post-deploy commands, nginx config install + syntax check,
/// restart commands. Pure so the sequence is testable.
fn deploy_steps(
    target: &PackagedTarget,
    nginx_config_file: &str,
    domain: &str,
    post_deploy: &[String],
    restart: &[String],
) -> Vec<String> {
    let app_dir = shell_quote(&target.remote_app_dir);
    let nginx_source = shell_quote(&format!("{}/{nginx_config_file}", target.remote_app_dir));
    let nginx_target = shell_quote(&format!("{}/{domain}.conf", target.remote_nginx_dir));

    let mut steps = vec![
        format!("mkdir -p {app_dir}"),
        format!("tar -xzf {REMOTE_ARCHIVE_PATH} -C {app_dir}"),
        format!("rm -f {REMOTE_ARCHIVE_PATH}"),
    ];
    steps.extend(post_deploy.iter().cloned());
    steps.push(format!("sudo cp {nginx_source} {nginx_target}"));
    steps.push(NGINX_TEST_COMMAND.to_string());
    steps.extend(restart.iter().cloned());
    steps
}

fn run_build(project_root: &Path) -> Result<()> {
    println!("Running npm run build in {}", project_root.display());
    let status = Command::new("npm")
        .args(["run", "build"])
        .current_dir(project_root)
        .status()
        .map_err(|err| DeployError::Build(format!("npm run build: {err}")))?;
    if !status.success() {
        return Err(DeployError::Build(format!(
            "npm run build exited with {}",
            status.code().unwrap_or(-1)
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn target() -> PackagedTarget {
        PackagedTarget {
            host: "192.0.2.1".to_string(),
            port: 22,
            username: "bitnami".to_string(),
            key_path: PathBuf::from("/tmp/key.pem"),
            remote_app_dir: "/opt/bitnami/apache/htdocs/app".to_string(),
            remote_nginx_dir: "/opt/bitnami/nginx/conf/server_blocks".to_string(),
        }
    }

    #[test]
    fn steps_run_in_deployment_order() {
        let post = vec!["npm install --production".to_string()];
        let restart = vec!["sudo restart-nginx".to_string()];
        let steps = deploy_steps(&target(), "config/nginx.conf", "example.com", &post, &restart);

        assert!(steps[0].starts_with("mkdir -p"));
        assert!(steps[1].starts_with("tar -xzf /tmp/deploy.tar.gz"));
        assert!(steps[2].starts_with("rm -f /tmp/deploy.tar.gz"));
        assert_eq!(steps[3], "npm install --production");

        let cp = steps.iter().position(|s| s.starts_with("sudo cp")).unwrap();
        let test = steps.iter().position(|s| s.contains("nginx -t")).unwrap();
        let restart_at = steps.iter().position(|s| s.contains("restart-nginx")).unwrap();
        assert!(cp < test);
        assert!(test < restart_at);
        assert_eq!(restart_at, steps.len() - 1);
    }

    #[test]
    fn nginx_paths_are_quoted_and_templated() {
        let steps = deploy_steps(&target(), "config/nginx.conf", "example.com", &[], &[]);
        let cp = steps.iter().find(|s| s.starts_with("sudo cp")).unwrap();
        assert!(cp.contains("'/opt/bitnami/apache/htdocs/app/config/nginx.conf'"));
        assert!(cp.contains("'/opt/bitnami/nginx/conf/server_blocks/example.com.conf'"));
    }

    #[test]
    fn default_templates_resolve_without_placeholders() {
        let config_vars = TemplateVars {
            remote_app_dir: "/opt/app",
            remote_nginx_dir: "/etc/nginx",
            domain: "example.com",
            server_ip: "192.0.2.1",
        };
        let templates = vec![
            "cd {remote_app_dir} && npm install --production".to_string(),
            "pm2 stop {domain} || true".to_string(),
            "cd {remote_app_dir} && pm2 start server.js --name {domain}".to_string(),
        ];
        let resolved = command::resolve_all(&templates, &config_vars).expect("resolve");
        for step in resolved {
            assert!(!step.contains('{') && !step.contains('}'), "step: {step}");
        }
    }
}
