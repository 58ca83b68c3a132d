//! Display recent log entries.

use crate::logging::log_dir;
use anyhow::anyhow;
use std::fs;
use std::path::{Path, PathBuf};

const TAIL_LINES: usize = 50;

/// Prints the tail of the most recent log file.
///
/// # Errors
/// - If the log directory cannot be determined or read
/// - If the log file cannot be read
pub fn handle_logs() -> Result<(), anyhow::Error> {
    let dir = log_dir()?;

    let Some(log_file) = latest_log(&dir)? else {
        println!("No log files found in: {}", dir.display());
        println!("Run 'levelscope' to generate logs.");
        return Ok(());
    };

    let content =
        fs::read_to_string(&log_file).map_err(|e| anyhow!("Failed to read log file: {e}"))?;

    println!("{}", log_file.display());
    println!();
    for line in tail(&content, TAIL_LINES) {
        println!("{line}");
    }

    Ok(())
}

/// Last `count` lines of `content`.
fn tail(content: &str, count: usize) -> Vec<&str> {
    let lines: Vec<&str> = content.lines().collect();
    lines[lines.len().saturating_sub(count)..].to_vec()
}

/// Most recently modified `levelscope.log*` file in `dir`, if any.
fn latest_log(dir: &Path) -> Result<Option<PathBuf>, anyhow::Error> {
    if !dir.exists() {
        return Ok(None);
    }

    let entries =
        fs::read_dir(dir).map_err(|e| anyhow!("Failed to read log directory: {e}"))?;

    let latest = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("levelscope.log"))
        })
        .filter_map(|path| {
            let modified = fs::metadata(&path).ok()?.modified().ok()?;
            Some((path, modified))
        })
        .max_by_key(|(_, modified)| *modified)
        .map(|(path, _)| path);

    Ok(latest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tail_short_content() {
        assert_eq!(tail("a\nb", 50), vec!["a", "b"]);
    }

    #[test]
    fn test_tail_long_content() {
        let content: String = (0..60).map(|i| format!("line {i}\n")).collect();
        let lines = tail(&content, 50);
        assert_eq!(lines.len(), 50);
        assert_eq!(lines[0], "line 10");
        assert_eq!(lines[49], "line 59");
    }

    #[test]
    fn test_latest_log_missing_dir() {
        let dir = std::env::temp_dir().join(format!("levelscope-nolog-{}", std::process::id()));
        assert!(latest_log(&dir).unwrap().is_none());
    }

    #[test]
    fn test_latest_log_ignores_other_files() {
        let dir = std::env::temp_dir().join(format!("levelscope-logs-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("notes.txt"), "x").unwrap();
        fs::write(dir.join("levelscope.log.2026-10-19"), "entry").unwrap();

        let latest = latest_log(&dir).unwrap().unwrap();
        assert!(latest.ends_with("levelscope.log.2026-10-19"));

        fs::remove_dir_all(&dir).unwrap();
    }
}
