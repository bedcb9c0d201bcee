// Run lock preventing two concurrent loops in one project

use crate::context::ProjectContext;
use anyhow::{anyhow, Context as _, Result};
use chrono::{DateTime, Duration, Utc};
use fs2::FileExt;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

/// Age beyond which a lock is treated as abandoned even if its pid is alive.
const LOCK_STALE_HOURS: i64 = 2;

/// Lock file contents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// Process ID that holds the lock
    pub pid: u32,
    /// Timestamp when the lock was acquired
    pub timestamp: DateTime<Utc>,
    /// Session ID of the run
    pub session_id: String,
    /// Binary version (for debugging leftover locks)
    pub version: String,
}

impl LockInfo {
    fn new(session_id: &str) -> Self {
        Self {
            pid: std::process::id(),
            timestamp: Utc::now(),
            session_id: session_id.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Exclusive lock over `.ralph/ralph.lock`, held for the duration of a run.
///
/// The OS-level flock is the live guard; the JSON body (pid, timestamp)
/// lets a later invocation recognize and take over a lock whose owner died
/// without cleaning up.
#[derive(Debug)]
pub struct RunLock {
    file: File,
    lock_path: PathBuf,
    session_id: String,
    owned: bool,
}

impl RunLock {
    /// Acquire the lock for this project, or explain who holds it.
    pub fn acquire(context: &ProjectContext) -> Result<RunLock> {
        let lock_path = context.lock_path();
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        if lock_path.exists() {
            match read_lock_info(&lock_path) {
                Ok(info) if !is_stale(&info) => {
                    return Err(anyhow!(
                        "Another ralph run is active in this project (pid {}, started {}). \
                         Remove {} if that process is gone.",
                        info.pid,
                        info.timestamp.to_rfc3339(),
                        lock_path.display()
                    ));
                }
                Ok(info) => warn!(
                    "[Lock] Taking over stale lock from pid {} ({})",
                    info.pid,
                    info.timestamp.to_rfc3339()
                ),
                Err(e) => warn!("[Lock] Replacing unreadable lock file: {}", e),
            }
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&lock_path)
            .with_context(|| format!("Failed to open {}", lock_path.display()))?;
        file.try_lock_exclusive().map_err(|_| {
            anyhow!(
                "Another ralph run holds the lock at {}",
                lock_path.display()
            )
        })?;

        let session_id = uuid::Uuid::new_v4().to_string();
        let info = LockInfo::new(&session_id);
        file.set_len(0).context("Failed to truncate lock file")?;
        serde_json::to_writer_pretty(&file, &info).context("Failed to write lock info")?;

        Ok(RunLock {
            file,
            lock_path,
            session_id,
            owned: true,
        })
    }

    /// Best-effort release; also runs on drop.
    pub fn release(&mut self) {
        if !self.owned {
            return;
        }
        self.owned = false;
        if let Err(e) = fs2::FileExt::unlock(&self.file) {
            warn!("[Lock] Failed to unlock {}: {}", self.lock_path.display(), e);
        }
        if let Err(e) = fs::remove_file(&self.lock_path) {
            warn!("[Lock] Failed to remove {}: {}", self.lock_path.display(), e);
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn path(&self) -> &Path {
        &self.lock_path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        self.release();
    }
}

/// Info for a live (non-stale) run lock, if one exists.
pub fn active_run(context: &ProjectContext) -> Option<LockInfo> {
    let path = context.lock_path();
    if !path.exists() {
        return None;
    }
    match read_lock_info(&path) {
        Ok(info) if !is_stale(&info) => Some(info),
        _ => None,
    }
}

fn read_lock_info(path: &Path) -> Result<LockInfo> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read lock file {}", path.display()))?;
    serde_json::from_str(&contents).context("Failed to parse lock file")
}

fn is_stale(info: &LockInfo) -> bool {
    let age = Utc::now() - info.timestamp;
    if age > Duration::hours(LOCK_STALE_HOURS) {
        return true;
    }
    !is_process_alive(info.pid)
}

fn is_process_alive(pid: u32) -> bool {
    use sysinfo::{Pid, System};

    let mut system = System::new();
    system.refresh_processes(sysinfo::ProcessesToUpdate::All, true);
    system.process(Pid::from_u32(pid)).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_context(temp_dir: &TempDir) -> ProjectContext {
        ProjectContext::new(temp_dir.path())
    }

    fn write_lock_file(context: &ProjectContext, info: &LockInfo) {
        fs::create_dir_all(context.ralph_dir()).unwrap();
        fs::write(
            context.lock_path(),
            serde_json::to_string_pretty(info).unwrap(),
        )
        .unwrap();
    }

    #[test]
    fn test_acquire_writes_pid_and_session() {
        let temp_dir = TempDir::new().unwrap();
        let context = make_context(&temp_dir);

        let lock = RunLock::acquire(&context).unwrap();
        assert!(context.lock_path().exists());
        assert!(!lock.session_id().is_empty());

        let info = read_lock_info(&context.lock_path()).unwrap();
        assert_eq!(info.pid, std::process::id());
        assert_eq!(info.session_id, lock.session_id());
        assert!(info.timestamp <= Utc::now());
    }

    #[test]
    fn test_second_acquire_fails_while_held() {
        let temp_dir = TempDir::new().unwrap();
        let context = make_context(&temp_dir);

        let _held = RunLock::acquire(&context).unwrap();

        let err = RunLock::acquire(&context).unwrap_err().to_string();
        assert!(err.contains("active"));
        assert!(err.contains(&std::process::id().to_string()));
    }

    #[test]
    fn test_drop_removes_lock_file() {
        let temp_dir = TempDir::new().unwrap();
        let context = make_context(&temp_dir);

        {
            let _lock = RunLock::acquire(&context).unwrap();
            assert!(context.lock_path().exists());
        }

        assert!(!context.lock_path().exists());
    }

    #[test]
    fn test_takes_over_lock_from_dead_process() {
        let temp_dir = TempDir::new().unwrap();
        let context = make_context(&temp_dir);

        // 999999 is very unlikely to be a live pid
        write_lock_file(
            &context,
            &LockInfo {
                pid: 999999,
                timestamp: Utc::now(),
                session_id: "left-behind".to_string(),
                version: "0.0.0".to_string(),
            },
        );

        let lock = RunLock::acquire(&context).unwrap();
        assert_ne!(lock.session_id(), "left-behind");
    }

    #[test]
    fn test_takes_over_lock_older_than_two_hours() {
        let temp_dir = TempDir::new().unwrap();
        let context = make_context(&temp_dir);

        write_lock_file(
            &context,
            &LockInfo {
                pid: std::process::id(),
                timestamp: Utc::now() - Duration::hours(3),
                session_id: "ancient".to_string(),
                version: "0.0.0".to_string(),
            },
        );

        assert!(RunLock::acquire(&context).is_ok());
    }

    #[test]
    fn test_release_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let context = make_context(&temp_dir);

        let mut lock = RunLock::acquire(&context).unwrap();
        lock.release();
        lock.release();
        assert!(!context.lock_path().exists());
    }

    #[test]
    fn test_active_run_reporting() {
        let temp_dir = TempDir::new().unwrap();
        let context = make_context(&temp_dir);
        assert!(active_run(&context).is_none());

        {
            let _lock = RunLock::acquire(&context).unwrap();
            let info = active_run(&context).unwrap();
            assert_eq!(info.pid, std::process::id());
        }

        assert!(active_run(&context).is_none());
    }
}
