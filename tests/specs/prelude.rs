//! Test helpers for behavioral specifications.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

// Aggressive timeouts so the suite runs fast; these feed the same env vars
// `tunnel-cli`'s `env.rs` reads at startup.
const TUNNEL_TIMEOUT_CONNECT_MS: &str = "2000";
const TUNNEL_TIMEOUT_EXIT_MS: &str = "500";
const TUNNEL_TIMEOUT_IPC_MS: &str = "500";
const TUNNEL_CONNECT_POLL_MS: &str = "5";

pub const WAIT_POLL_MS: u64 = 10;
pub const WAIT_MAX_MS: u64 = 2000;

/// Resolve a built binary's path, falling back to resolving relative to the
/// test binary itself when `CARGO_MANIFEST_DIR` is stale.
fn binary_path(name: &str) -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));

    let standard = manifest_dir.join("target/debug").join(name);
    if standard.exists() {
        return standard;
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join(name);
            if fallback.exists() {
                return fallback;
            }
        }
    }

    standard
}

fn tunnel_binary() -> PathBuf {
    binary_path("tunnel")
}

pub fn tunneld_binary() -> PathBuf {
    binary_path("tunneld")
}

/// Isolated supervisor instance: its own state directory, so the suite
/// never touches a real operator's `~/.local/state/tunneld`.
pub struct Supervisor {
    state_dir: tempfile::TempDir,
}

impl Supervisor {
    pub fn empty() -> Self {
        Self { state_dir: tempfile::tempdir().unwrap() }
    }

    pub fn state_path(&self) -> &Path {
        self.state_dir.path()
    }

    /// Build a `tunnel` CLI command scoped to this supervisor's state dir.
    pub fn cli(&self) -> CliBuilder {
        CliBuilder::new(self.state_path())
    }

    pub fn daemon_log(&self) -> String {
        let log_path = self.state_path().join("daemon.log");
        std::fs::read_to_string(&log_path).unwrap_or_else(|_| "(no daemon log)".to_string())
    }

    /// SIGKILL the daemon process (simulates a crash).
    pub fn daemon_kill(&self) -> bool {
        let pid_file = self.state_path().join("daemon.pid");
        let Ok(content) = std::fs::read_to_string(&pid_file) else { return false };
        let Ok(pid) = content.trim().parse::<u32>() else { return false };
        Command::new("kill")
            .args(["-9", &pid.to_string()])
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        let mut cmd = self.cli().args(&["daemon", "stop"]).command();
        cmd.stdout(std::process::Stdio::null()).stderr(std::process::Stdio::null());
        let _ = cmd.status();
    }
}

pub struct CliBuilder {
    args: Vec<String>,
    envs: Vec<(String, String)>,
}

impl CliBuilder {
    fn new(state_dir: &Path) -> Self {
        Self {
            args: Vec::new(),
            envs: vec![
                ("TUNNELD_STATE_DIR".into(), state_dir.to_string_lossy().into_owned()),
                ("TUNNELD_BINARY".into(), tunneld_binary().to_string_lossy().into_owned()),
                ("TUNNEL_TIMEOUT_CONNECT_MS".into(), TUNNEL_TIMEOUT_CONNECT_MS.into()),
                ("TUNNEL_TIMEOUT_EXIT_MS".into(), TUNNEL_TIMEOUT_EXIT_MS.into()),
                ("TUNNEL_TIMEOUT_IPC_MS".into(), TUNNEL_TIMEOUT_IPC_MS.into()),
                ("TUNNEL_CONNECT_POLL_MS".into(), TUNNEL_CONNECT_POLL_MS.into()),
            ],
        }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.envs.push((key.to_string(), value.to_string()));
        self
    }

    pub fn command(self) -> Command {
        let mut cmd = Command::new(tunnel_binary());
        cmd.args(&self.args);
        for (key, value) in self.envs {
            cmd.env(key, value);
        }
        cmd
    }

    pub fn passes(self) -> RunAssert {
        let mut cmd = self.command();
        let output = cmd.output().expect("command should run");
        assert!(
            output.status.success(),
            "expected command to pass, got exit code {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }

    pub fn fails(self) -> RunAssert {
        let mut cmd = self.command();
        let output = cmd.output().expect("command should run");
        assert!(
            !output.status.success(),
            "expected command to fail, but it passed\nstdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }
}

pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.stdout();
        assert!(stdout.contains(expected), "stdout does not contain '{}'\nstdout: {}", expected, stdout);
        self
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        let stderr = self.stderr();
        assert!(stderr.contains(expected), "stderr does not contain '{}'\nstderr: {}", expected, stderr);
        self
    }
}

/// Poll a condition until it returns true or the timeout is reached.
pub fn wait_for<F>(timeout_ms: u64, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    let timeout = std::time::Duration::from_millis(timeout_ms);
    let poll_interval = std::time::Duration::from_millis(WAIT_POLL_MS);

    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        std::thread::sleep(poll_interval);
    }
    false
}

/// Poll until a TCP port accepts connections.
pub fn wait_for_port(port: u16) -> bool {
    wait_for(WAIT_MAX_MS, || std::net::TcpStream::connect(("127.0.0.1", port)).is_ok())
}
