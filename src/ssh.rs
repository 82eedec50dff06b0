use std::fs;
use std::io::{self, Read};
use std::net::TcpStream;
use std::path::Path;
use std::time::Duration;

use ssh2::Session;

use crate::error::{DeployError, Result};

const IO_TIMEOUT: Duration = Duration::from_secs(20);

/// Opens an authenticated session using a private key file. The session is
/// owned by the caller and closed when it is dropped, on every exit path.
pub fn connect(host: &str, port: u16, username: &str, key_path: &Path) -> Result<Session> {
    if !key_path.is_file() {
        return Err(DeployError::Config(format!(
            "SSH key not found at {}",
            key_path.display()
        )));
    }
    let tcp = TcpStream::connect((host, port))
        .map_err(|err| DeployError::Transfer(format!("connect {host}:{port}: {err}")))?;
    tcp.set_read_timeout(Some(IO_TIMEOUT)).ok();
    tcp.set_write_timeout(Some(IO_TIMEOUT)).ok();
    let mut session = Session::new()?;
    session.set_tcp_stream(tcp);
    session.handshake()?;
    session.userauth_pubkey_file(username, None, key_path, None)?;
    if !session.authenticated() {
        return Err(DeployError::Transfer(format!(
            "SSH authentication failed for {username}@{host}"
        )));
    }
    tracing::info!(host, port, username, "SSH session established");
    Ok(session)
}

/// Runs one remote command over its own channel and fails if it exits
/// non-zero. Stdout and stderr are captured and returned together.
pub fn run_checked(session: &Session, command: &str) -> Result<String> {
    let mut channel = session.channel_session()?;
    channel.exec(command)?;
    let mut stdout = String::new();
    channel.read_to_string(&mut stdout).ok();
    let mut stderr = String::new();
    channel.stderr().read_to_string(&mut stderr).ok();
    channel.wait_close().ok();
    let status = channel.exit_status().unwrap_or(-1);
    if !stderr.trim().is_empty() {
        stdout.push_str("\n");
        stdout.push_str(&stderr);
    }
    if status != 0 {
        tracing::error!(command, status, output = %stdout.trim(), "remote command failed");
        return Err(DeployError::RemoteExec {
            command: command.to_string(),
            status,
        });
    }
    tracing::debug!(command, "remote command succeeded");
    Ok(stdout)
}

/// Copies one local file to a remote path over SFTP.
pub fn upload_file(session: &Session, local: &Path, remote: &Path) -> Result<()> {
    let sftp = session.sftp()?;
    let mut local_file = fs::File::open(local)?;
    let mut remote_file = sftp
        .create(remote)
        .map_err(|err| DeployError::Transfer(format!("create {}: {err}", remote.display())))?;
    io::copy(&mut local_file, &mut remote_file).map_err(|err| {
        DeployError::Transfer(format!(
            "upload {} -> {}: {err}",
            local.display(),
            remote.display()
        ))
    })?;
    Ok(())
}
