use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::LazyLock;

use crate::settings::logging_enabled;

const LOG_FILE_NAME: &str = "folder-preview-win.log";

static DESKTOP_LOG_PATH: LazyLock<Result<PathBuf, String>> = LazyLock::new(|| {
    std::env::var_os("USERPROFILE")
        .or_else(|| std::env::var_os("HOME"))
        .map(|home| PathBuf::from(home).join("Desktop").join(LOG_FILE_NAME))
        .ok_or_else(|| "neither USERPROFILE nor HOME is set".to_string())
});

pub fn log_file_path() -> Option<PathBuf> {
    DESKTOP_LOG_PATH.as_ref().ok().cloned()
}

/// Writes one line to the diagnostic log; failures go to stderr.
pub fn log(message: impl AsRef<str>) {
    if let Err(err) = log_desktop(message) {
        eprintln!("[dll log] {err}");
    }
}

pub fn log_cli(message: impl Into<String>) {
    let text = message.into();
    if let Err(err) = log_desktop(&text) {
        eprintln!("[log] cannot write '{}': {}", text, err);
    }
}

pub fn log_ui(message: impl AsRef<str>) {
    let msg = message.as_ref();
    log_cli(msg);
    println!("{msg}");
}

pub fn log_desktop(message: impl AsRef<str>) -> Result<(), String> {
    if !logging_enabled() {
        return Ok(());
    }

    let path = DESKTOP_LOG_PATH
        .as_ref()
        .map_err(|err| err.clone())?
        .clone();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("failed to create {}: {}", parent.display(), e))?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| format!("failed to open {}: {}", path.display(), e))?;

    writeln!(file, "{}", format_line(message.as_ref()))
        .map_err(|e| format!("failed to write to {}: {}", path.display(), e))?;

    Ok(())
}

fn format_line(message: &str) -> String {
    use chrono::Local;

    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
    format!("[{}] {}", timestamp, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_carry_a_millisecond_timestamp() {
        let line = format_line("DoPreview");
        // "[2024-01-02 03:04:05.678] DoPreview"
        assert!(line.starts_with('['));
        assert_eq!(line.find(']'), Some(24));
        assert!(line.ends_with("] DoPreview"));
    }

    #[test]
    fn log_file_lives_on_the_desktop() {
        if let Some(path) = log_file_path() {
            assert!(path.ends_with(PathBuf::from("Desktop").join(LOG_FILE_NAME)));
        }
    }
}
