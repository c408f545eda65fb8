//! Infrastructure implementation of the `AgentRunner` port.
//!
//! `ProcessAgentRunner` spawns the agent with tokio, records its pid with an
//! atomic write (temp file + rename), and signals it on stop.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::process::Child;

use crate::application::ports::AgentRunner;
use crate::domain::process::{AgentProcessHandle, parse_pid, render_pid};

/// How long a freshly spawned agent must survive before it counts as started.
const STARTUP_GRACE: Duration = Duration::from_millis(250);

/// Production `AgentRunner`: one agent executable, one pid file.
pub struct ProcessAgentRunner {
    agent_path: PathBuf,
    pid_file: PathBuf,
}

impl ProcessAgentRunner {
    #[must_use]
    pub fn new(agent_path: PathBuf, pid_file: PathBuf) -> Self {
        Self {
            agent_path,
            pid_file,
        }
    }

    #[must_use]
    pub fn pid_file(&self) -> &Path {
        &self.pid_file
    }

    /// Atomic write via temp file then rename.
    fn write_pid_file(&self, pid: u32) -> Result<()> {
        if let Some(parent) = self.pid_file.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
        let temp_path = self.pid_file.with_extension("pid.tmp");
        std::fs::write(&temp_path, render_pid(pid))
            .with_context(|| format!("writing temp file {}", temp_path.display()))?;
        std::fs::rename(&temp_path, &self.pid_file)
            .with_context(|| format!("finalizing pid file {}", self.pid_file.display()))?;
        Ok(())
    }

    /// Everything after spawn. On error the caller still owns `child`.
    async fn settle(&self, program: &str, child: &mut Child) -> Result<u32> {
        if let Ok(status) = tokio::time::timeout(STARTUP_GRACE, child.wait()).await {
            let status = status.with_context(|| format!("checking {program}"))?;
            anyhow::bail!("{program} exited during startup with {status}");
        }
        let pid = child
            .id()
            .with_context(|| format!("{program} has no process id"))?;
        self.write_pid_file(pid)?;
        Ok(pid)
    }
}

impl AgentRunner for ProcessAgentRunner {
    async fn start(&self, config_dir: &Path) -> Result<AgentProcessHandle> {
        let program = self.agent_path.display().to_string();
        let mut child = tokio::process::Command::new(&self.agent_path)
            .arg("agent")
            .arg("-config-dir")
            .arg(config_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("failed to spawn {program}"))?;

        let pid = match self.settle(&program, &mut child).await {
            Ok(pid) => pid,
            Err(e) => {
                // Without a pid file, stop could never find it.
                if let Ok(None) = child.try_wait() {
                    if let Err(kill_err) = child.kill().await {
                        tracing::warn!(error = %kill_err, "failed to kill {program} after start failure");
                    }
                }
                return Err(e);
            }
        };
        tracing::debug!(pid, pid_file = %self.pid_file.display(), "pid recorded");

        Ok(AgentProcessHandle {
            pid,
            pid_file: self.pid_file.clone(),
        })
    }

    async fn stop(&self, handle: &AgentProcessHandle) -> Result<()> {
        signal::terminate(handle.pid)
    }

    fn recorded(&self) -> Result<Option<AgentProcessHandle>> {
        let contents = match std::fs::read_to_string(&self.pid_file) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("reading pid file {}", self.pid_file.display()));
            }
        };
        let pid = parse_pid(&contents)
            .map_err(|reason| anyhow::anyhow!("{}: {reason}", self.pid_file.display()))?;
        Ok(Some(AgentProcessHandle {
            pid,
            pid_file: self.pid_file.clone(),
        }))
    }

    fn is_alive(&self, handle: &AgentProcessHandle) -> bool {
        signal::is_alive(handle.pid)
    }
}

#[cfg(unix)]
mod signal {
    use anyhow::{Context, Result};
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    fn to_pid(pid: u32) -> Result<Pid> {
        let raw = i32::try_from(pid).with_context(|| format!("pid {pid} out of range"))?;
        Ok(Pid::from_raw(raw))
    }

    pub fn terminate(pid: u32) -> Result<()> {
        kill(to_pid(pid)?, Signal::SIGTERM).with_context(|| format!("sending SIGTERM to {pid}"))
    }

    pub fn is_alive(pid: u32) -> bool {
        let Ok(pid) = to_pid(pid) else {
            return false;
        };
        match kill(pid, None::<Signal>) {
            Ok(()) | Err(Errno::EPERM) => true,
            Err(_) => false,
        }
    }
}

#[cfg(not(unix))]
mod signal {
    use anyhow::Result;

    pub fn terminate(pid: u32) -> Result<()> {
        anyhow::bail!("cannot signal pid {pid}: signals are not supported on this platform")
    }

    pub fn is_alive(_pid: u32) -> bool {
        false
    }
}
