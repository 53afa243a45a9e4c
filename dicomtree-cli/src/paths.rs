//! Log file locations.
//!
//! Logs go to the platform cache directory:
//!
//! - Linux: `$XDG_CACHE_HOME/dicomtree` or `~/.cache/dicomtree`
//! - macOS: `~/Library/Caches/org.commontk.dicomtree`
//! - Windows: `C:\Users\<User>\AppData\Local\commontk\dicomtree\cache`

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use directories::ProjectDirs;

const QUALIFIER: &str = "org";
const ORGANIZATION: &str = "commontk";
const APPLICATION: &str = "dicomtree";

const LATEST_LOG: &str = "latest.log";

/// Archived logs kept next to the latest one.
const MAX_ARCHIVED_LOGS: usize = 10;

/// Directory holding the log files, or `None` without a home directory.
pub fn log_dir() -> Option<PathBuf> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
        .map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Path of the log file for the current run.
pub fn log_file(dir: &Path) -> PathBuf {
    dir.join(LATEST_LOG)
}

/// Archives the previous run's log under a timestamped name and prunes the
/// oldest archives.
///
/// Must run before the new log file is created. Failures are ignored; a
/// missing archive never stops the browser.
pub fn rotate_logs(dir: &Path) {
    let latest = log_file(dir);
    if latest.exists() {
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let _ = fs::rename(&latest, dir.join(format!("{}.log", stamp)));
    }
    prune_archives(dir, MAX_ARCHIVED_LOGS);
}

fn prune_archives(dir: &Path, keep: usize) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    let mut archives: Vec<_> = entries
        .filter_map(Result::ok)
        .filter(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            name.ends_with(".log") && name != LATEST_LOG
        })
        .collect();
    if archives.len() <= keep {
        return;
    }

    // timestamped names sort chronologically
    archives.sort_by_key(|entry| entry.file_name());
    for entry in &archives[..archives.len() - keep] {
        let _ = fs::remove_file(entry.path());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("dicomtree-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_rotate_archives_latest() {
        let dir = scratch("rotate");
        fs::write(log_file(&dir), "previous run").unwrap();

        rotate_logs(&dir);

        assert!(!log_file(&dir).exists());
        let archived: Vec<_> = fs::read_dir(&dir).unwrap().filter_map(Result::ok).collect();
        assert_eq!(archived.len(), 1);
        assert_eq!(fs::read_to_string(archived[0].path()).unwrap(), "previous run");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_prune_keeps_newest() {
        let dir = scratch("prune");
        for day in 1..=5 {
            fs::write(dir.join(format!("202401{:02}_000000.log", day)), "").unwrap();
        }
        fs::write(log_file(&dir), "").unwrap();

        prune_archives(&dir, 2);

        let mut left: Vec<_> = fs::read_dir(&dir)
            .unwrap()
            .filter_map(Result::ok)
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        left.sort();
        assert_eq!(
            left,
            vec!["20240104_000000.log", "20240105_000000.log", "latest.log"]
        );
        fs::remove_dir_all(&dir).unwrap();
    }
}
