//! Boot and terminal identity
//!
//! A session is bound to the terminal window it was started in. The binding
//! key combines a terminal id (stable while the window lives) with a boot id
//! (changes on reboot, so stale pids are never reused as keys).

use crate::error::{ParleyError, ParleyResult};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::process::Command;
use tracing::debug;

const LINUX_BOOT_ID: &str = "/proc/sys/kernel/random/boot_id";

/// Env vars set by terminal emulators, in priority order
const TERMINAL_ENV_VARS: &[&str] = &["WT_SESSION", "TERM_SESSION_ID", "ITERM_SESSION_ID"];

fn sha256_hex(input: &str) -> String {
    Sha256::digest(input.as_bytes())
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

fn command_output(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!text.is_empty()).then_some(text)
}

/// Identifier of the current boot
pub fn boot_id() -> ParleyResult<String> {
    if Path::new(LINUX_BOOT_ID).exists() {
        let raw = std::fs::read_to_string(LINUX_BOOT_ID)
            .map_err(|e| ParleyError::io_at(format!("Failed to read boot_id: {}", e), LINUX_BOOT_ID))?;
        return Ok(raw.trim().to_string());
    }

    if let Some(boot_time) = command_output("sysctl", &["-n", "kern.boottime"]) {
        debug!("boot id derived from sysctl kern.boottime");
        return Ok(sha256_hex(&boot_time));
    }

    if cfg!(windows) {
        let last_boot = command_output(
            "powershell",
            &[
                "-NoProfile",
                "-Command",
                "(Get-CimInstance Win32_OperatingSystem).LastBootUpTime.ToString('o')",
            ],
        );
        if let Some(last_boot) = last_boot {
            return Ok(sha256_hex(&last_boot));
        }
    }

    Err(ParleyError::other(
        "Failed to find a boot id: no /proc boot_id, sysctl or Windows boot time available",
    ))
}

/// Make an id usable as a single file name component
fn file_safe(id: &str) -> String {
    id.replace(['/', '\\'], "_")
}

/// Terminal id from the given environment, falling back to `parent_pid`
pub fn terminal_id_from<F>(env: F, parent_pid: Option<u32>) -> ParleyResult<String>
where
    F: Fn(&str) -> Option<String>,
{
    let from_env = TERMINAL_ENV_VARS
        .iter()
        .filter_map(|name| env(name))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty());

    match (from_env, parent_pid) {
        (Some(id), _) => Ok(file_safe(&id)),
        (None, Some(pid)) => Ok(pid.to_string()),
        (None, None) => Err(ParleyError::other(
            "Failed to determine a terminal id: no terminal session variable and no parent process",
        )),
    }
}

#[cfg(unix)]
fn parent_pid() -> Option<u32> {
    Some(std::os::unix::process::parent_id())
}

#[cfg(not(unix))]
fn parent_pid() -> Option<u32> {
    None
}

/// Identifier of the current terminal window
pub fn terminal_id() -> ParleyResult<String> {
    terminal_id_from(|name| std::env::var(name).ok(), parent_pid())
}

/// (terminal, boot) pair keying the session lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalIdentity {
    pub terminal_id: String,
    pub boot_id: String,
}

impl TerminalIdentity {
    pub fn new(terminal_id: impl Into<String>, boot_id: impl Into<String>) -> Self {
        Self {
            terminal_id: file_safe(&terminal_id.into()),
            boot_id: file_safe(&boot_id.into()),
        }
    }

    /// Identity of the terminal this process runs in
    pub fn detect() -> ParleyResult<Self> {
        let identity = Self::new(terminal_id()?, boot_id()?);
        debug!(terminal = %identity.terminal_id, boot = %identity.boot_id, "detected terminal identity");
        Ok(identity)
    }

    /// `<terminal_id>.<boot_id>`
    pub fn combined(&self) -> String {
        format!("{}.{}", self.terminal_id, self.boot_id)
    }
}
