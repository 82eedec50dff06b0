use std::fs;
use std::io;
use std::path::Path;

use ssh2::{ErrorCode, Sftp};

use crate::cli::MirrorArgs;
use crate::command::shell_quote;
use crate::config::DeployConfig;
use crate::error::{DeployError, Result};
use crate::ssh;

// libssh2 SFTP status codes: SSH_FX_NO_SUCH_FILE and SSH_FX_NO_SUCH_PATH.
const FX_NO_SUCH_FILE: i32 = 2;
const FX_NO_SUCH_PATH: i32 = 10;

pub fn run(config: &DeployConfig, args: MirrorArgs) -> Result<()> {
    let target = config.mirror_target(args.remote_dir)?;
    if !args.path.is_dir() {
        return Err(DeployError::Config(format!(
            "local directory {} does not exist",
            args.path.display()
        )));
    }
    let session = ssh::connect(&target.host, target.port, &target.username, &target.key_path)?;
    ssh::run_checked(
        &session,
        &format!("mkdir -p {}", shell_quote(&target.remote_root)),
    )?;
    let sftp = session.sftp()?;
    let uploaded = mirror(&sftp, &args.path, Path::new(&target.remote_root))?;
    println!(
        "Mirrored {uploaded} files from {} to {}:{}",
        args.path.display(),
        target.host,
        target.remote_root
    );
    Ok(())
}

/// Recursively mirrors `local_dir` onto `remote_dir`. Every file is
/// re-uploaded on every run (resync by overwrite, no change detection).
/// Only a definite SFTP not-found status triggers directory creation; any
/// other stat failure aborts the mirror.
pub fn mirror(sftp: &Sftp, local_dir: &Path, remote_dir: &Path) -> Result<usize> {
    let mut uploaded = 0;
    for entry in fs::read_dir(local_dir)? {
        let entry = entry?;
        let local_path = entry.path();
        let remote_path = remote_dir.join(entry.file_name());
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            match sftp.stat(&remote_path) {
                Ok(_) => {}
                Err(err) if is_not_found(&err) => {
                    sftp.mkdir(&remote_path, 0o755).map_err(|err| {
                        DeployError::Transfer(format!(
                            "mkdir {}: {err}",
                            remote_path.display()
                        ))
                    })?;
                }
                Err(err) => {
                    return Err(DeployError::Transfer(format!(
                        "stat {}: {err}",
                        remote_path.display()
                    )));
                }
            }
            uploaded += mirror(sftp, &local_path, &remote_path)?;
        } else if file_type.is_file() {
            let mut local_file = fs::File::open(&local_path)?;
            let mut remote_file = sftp.create(&remote_path).map_err(|err| {
                DeployError::Transfer(format!("create {}: {err}", remote_path.display()))
            })?;
            io::copy(&mut local_file, &mut remote_file).map_err(|err| {
                DeployError::Transfer(format!(
                    "upload {} -> {}: {err}",
                    local_path.display(),
                    remote_path.display()
                ))
            })?;
            tracing::info!(remote = %remote_path.display(), "uploaded");
            uploaded += 1;
        }
    }
    Ok(uploaded)
}

fn is_not_found(err: &ssh2::Error) -> bool {
    matches!(
        err.code(),
        ErrorCode::SFTP(FX_NO_SUCH_FILE) | ErrorCode::SFTP(FX_NO_SUCH_PATH)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_sftp_not_found_triggers_directory_creation() {
        let not_found = ssh2::Error::new(ErrorCode::SFTP(FX_NO_SUCH_FILE), "no such file");
        assert!(is_not_found(&not_found));
        let no_path = ssh2::Error::new(ErrorCode::SFTP(FX_NO_SUCH_PATH), "no such path");
        assert!(is_not_found(&no_path));

        let denied = ssh2::Error::new(ErrorCode::SFTP(3), "permission denied");
        assert!(!is_not_found(&denied));
        let session = ssh2::Error::new(ErrorCode::Session(-7), "socket timeout");
        assert!(!is_not_found(&session));
    }
}
