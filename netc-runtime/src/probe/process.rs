use crate::error::ProbeError;
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

/// A running probe with its output drained in the background.
///
/// Output is read concurrently so a chatty probe never blocks on a full pipe while the runner
/// sleeps. The child is killed if this is dropped before it exits.
pub(crate) struct ProbeProcess {
    child: Child,
    stdout: JoinHandle<std::io::Result<String>>,
    stderr: JoinHandle<std::io::Result<String>>,
}

pub(crate) struct ProbeOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ProbeProcess {
    pub fn spawn(mut command: Command) -> Result<Self, ProbeError> {
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(ProbeError::Launch)?;
        let stdout = child.stdout.take().ok_or(ProbeError::MissingPipe)?;
        let stderr = child.stderr.take().ok_or(ProbeError::MissingPipe)?;

        Ok(Self {
            child,
            stdout: tokio::spawn(read_all(stdout)),
            stderr: tokio::spawn(read_all(stderr)),
        })
    }

    /// Cancel safe.
    pub async fn wait(&mut self) -> Result<ExitStatus, ProbeError> {
        self.child.wait().await.map_err(ProbeError::Wait)
    }

    /// Ask the probe to stop the way an operator pressing Ctrl+C would, so it prints its summary.
    #[cfg(unix)]
    pub fn request_graceful_stop(&mut self) -> Result<(), ProbeError> {
        let Some(pid) = self.child.id() else {
            // Already reaped.
            return Ok(());
        };
        let Ok(pid) = libc::pid_t::try_from(pid) else {
            return Err(ProbeError::Signal(std::io::Error::other(format!(
                "pid {pid} out of range"
            ))));
        };

        // SAFETY: kill(2) has no memory-safety preconditions; the pid belongs to our child,
        // which has not been reaped yet.
        let res = unsafe { libc::kill(pid, libc::SIGINT) };
        if res != 0 {
            return Err(ProbeError::Signal(std::io::Error::last_os_error()));
        }
        Ok(())
    }

    #[cfg(not(unix))]
    pub fn request_graceful_stop(&mut self) -> Result<(), ProbeError> {
        self.child.start_kill().map_err(ProbeError::Signal)
    }

    pub async fn force_terminate(&mut self) -> Result<(), ProbeError> {
        self.child.kill().await.map_err(ProbeError::Signal)
    }

    /// Wait for exit and collect everything the probe printed.
    pub async fn finish(mut self) -> Result<ProbeOutput, ProbeError> {
        let status = self.wait().await?;
        let stdout = self.stdout.await?.map_err(ProbeError::Output)?;
        let stderr = self.stderr.await?.map_err(ProbeError::Output)?;

        Ok(ProbeOutput {
            status,
            stdout,
            stderr,
        })
    }
}

async fn read_all(mut pipe: impl AsyncRead + Unpin) -> std::io::Result<String> {
    let mut buf = Vec::new();
    pipe.read_to_end(&mut buf).await?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
