use anyhow::{anyhow, Context, Result};
use std::ffi::OsStr;
use std::process::{Command, Stdio};
use tracing::debug;

/// Runs an external tool to completion and returns its stdout.
///
/// A non-zero exit is an error carrying the tool's stderr.
pub fn run_tool<I, S>(exe: &str, args: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(exe);
    cmd.args(args);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    debug!("run {:?}", cmd);

    let output = cmd
        .output()
        .with_context(|| format!("spawning {exe}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!(
            "{exe} exited with {}: {}",
            output.status,
            stderr.trim()
        ));
    }

    if !output.stderr.is_empty() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!("{exe} stderr: {}", stderr.trim());
    }

    Ok(output.stdout)
}
