//! External VPN command surface.
//!
//! Everything the monitor knows about the system's VPN state comes from one
//! place: the network-configuration utility (`scutil --nc …`). This module
//! wraps those invocations behind the [`StatusSource`] trait so the engine
//! can be driven by a scripted fake in tests.
//!
//! Failure policy: a command that cannot be launched, times out, or produces
//! undecodable bytes yields an empty string, which the parser maps to
//! `Unknown`. Nothing here returns an error to callers.

use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use crate::constants;
use crate::log_warning;

/// Seam between the monitor engine and the OS command that owns VPN state.
///
/// Start/stop report nothing back: correctness is observed by the next
/// status query, never inferred from an exit code.
pub trait StatusSource: Send + Sync {
    /// Raw text of `status <service>` -- stdout and stderr merged.
    fn status_text(&self, service: &str) -> String;
    /// Issue the start-service command. Fire and forget.
    fn start(&self, service: &str);
    /// Issue the stop-service command. Fire and forget.
    fn stop(&self, service: &str);
    /// Raw text of the service list command.
    fn list_text(&self) -> String;
}

/// Production [`StatusSource`] shelling out to `scutil`.
pub struct Scutil {
    /// Bound on status/list invocations. A hang stalls only the one
    /// in-flight check; the single-flight guard prevents pile-up.
    timeout: Duration,
}

impl Scutil {
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for Scutil {
    fn default() -> Self {
        Self::new(Duration::from_secs(constants::DEFAULT_COMMAND_TIMEOUT_SECS))
    }
}

impl StatusSource for Scutil {
    fn status_text(&self, service: &str) -> String {
        run_bounded(&["--nc", "status", service], self.timeout)
    }

    fn start(&self, service: &str) {
        run_fire_and_forget(&["--nc", "start", service]);
    }

    fn stop(&self, service: &str) {
        run_fire_and_forget(&["--nc", "stop", service]);
    }

    fn list_text(&self) -> String {
        run_bounded(&["--nc", "list"], self.timeout)
    }
}

/// Run scutil with a deadline; empty string on launch failure or timeout.
fn run_bounded(args: &[&str], timeout: Duration) -> String {
    let child = Command::new(constants::SCUTIL_PATH)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn();

    let Ok(mut child) = child else {
        log_warning!("VPN", "failed to launch {} {:?}", constants::SCUTIL_PATH, args);
        return String::new();
    };

    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(_)) => break,
            Ok(None) => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    log_warning!("VPN", "scutil {:?} timed out after {:?}", args, timeout);
                    return String::new();
                }
                std::thread::sleep(Duration::from_millis(25));
            }
            Err(_) => {
                let _ = child.kill();
                let _ = child.wait();
                return String::new();
            }
        }
    }

    match child.wait_with_output() {
        Ok(output) => {
            // Merge both streams, matching what an interactive invocation shows.
            let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
            text.push_str(&String::from_utf8_lossy(&output.stderr));
            text
        }
        Err(_) => String::new(),
    }
}

/// Run a control command to completion, ignoring its outcome.
fn run_fire_and_forget(args: &[&str]) {
    let result = Command::new(constants::SCUTIL_PATH)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    if result.is_err() {
        log_warning!("VPN", "failed to launch {} {:?}", constants::SCUTIL_PATH, args);
    }
}

/// Service names currently registered with the system, sorted.
///
/// Advisory only -- feeds service pickers, never engine state.
#[must_use]
pub fn list_services(source: &dyn StatusSource) -> Vec<String> {
    parse_service_list(&source.list_text())
}

/// Parse service list output into sorted display names.
///
/// Each useful line carries the service name as its first double-quoted
/// substring; lines without a quoted name are ignored.
#[must_use]
pub fn parse_service_list(text: &str) -> Vec<String> {
    let mut names: Vec<String> = text
        .lines()
        .filter_map(first_quoted)
        .map(str::to_string)
        .collect();
    names.sort_unstable();
    names
}

/// The contents of the first `"…"` pair on a line, if any.
fn first_quoted(line: &str) -> Option<&str> {
    let start = line.find('"')? + 1;
    let len = line[start..].find('"')?;
    Some(&line[start..start + len])
}
