//! Agent process identity and the pid-file format.
//!
//! This module is intentionally free of I/O: reading and writing the file is
//! the agent runner's job, parsing and rendering its contents lives here.

use std::fmt;
use std::path::PathBuf;

/// Identity of a running agent subprocess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentProcessHandle {
    pub pid: u32,
    /// Where the pid was recorded.
    pub pid_file: PathBuf,
}

impl fmt::Display for AgentProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pid {} ({})", self.pid, self.pid_file.display())
    }
}

/// Parse pid-file contents: one decimal process id, surrounding whitespace
/// ignored.
///
/// # Errors
///
/// Returns a reason if the contents are empty, not a number, or zero.
pub fn parse_pid(contents: &str) -> Result<u32, String> {
    let trimmed = contents.trim();
    if trimmed.is_empty() {
        return Err("pid file is empty".to_string());
    }
    let pid: u32 = trimmed
        .parse()
        .map_err(|e| format!("invalid pid {trimmed:?}: {e}"))?;
    if pid == 0 {
        return Err("pid 0 is not a process".to_string());
    }
    Ok(pid)
}

/// Render a pid the way it is stored on disk.
#[must_use]
pub fn render_pid(pid: u32) -> String {
    format!("{pid}\n")
}

/// Controller phases for one invocation.
///
/// `Polling` is the only phase that repeats; every other phase is entered at
/// most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootPhase {
    Idle,
    Starting,
    Polling,
    Joined,
    TimedOut,
    Configuring,
    Configured,
    ConfigFailed,
}

impl fmt::Display for BootPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Polling => "polling",
            Self::Joined => "joined",
            Self::TimedOut => "timed-out",
            Self::Configuring => "configuring",
            Self::Configured => "configured",
            Self::ConfigFailed => "config-failed",
        })
    }
}
