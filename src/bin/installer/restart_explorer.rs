use std::io;
use std::process::{Command, Stdio};
use std::thread::sleep;
use std::time::{Duration, Instant};

use folder_preview_win::log::log_cli;

const WAIT_EXIT: Duration = Duration::from_secs(5);
const WAIT_START: Duration = Duration::from_secs(5);
const POLL_INTERVAL: Duration = Duration::from_millis(200);

fn explorer_running() -> bool {
    Command::new("tasklist")
        .args(["/FI", "IMAGENAME eq explorer.exe", "/FO", "CSV", "/NH"])
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .map(|out| String::from_utf8_lossy(&out.stdout).contains("explorer.exe"))
        .unwrap_or(false)
}

fn wait_until(expected: bool, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if explorer_running() == expected {
            return true;
        }
        sleep(POLL_INTERVAL);
    }
    explorer_running() == expected
}

/// Restarts Explorer so the preview pane drops any cached handler instance.
pub fn restart_explorer() -> io::Result<()> {
    log_cli("Restart Explorer: taskkill /F /IM explorer.exe");
    let status = Command::new("taskkill")
        .args(["/F", "/IM", "explorer.exe"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()?;
    if !status.success() {
        log_cli(format!(
            "Restart Explorer: taskkill exit code {:?} (Explorer may already be stopped)",
            status.code()
        ));
    }

    if !wait_until(false, WAIT_EXIT) {
        log_cli("Restart Explorer: explorer.exe still running after timeout");
    }

    log_cli("Restart Explorer: starting explorer.exe");
    Command::new("explorer.exe")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    if wait_until(true, WAIT_START) {
        println!("Explorer restarted.");
    } else {
        println!("Explorer did not come back within {:?}; start it manually.", WAIT_START);
    }
    Ok(())
}
