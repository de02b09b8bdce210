use std::path::Path;
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

use anyhow::{Context, Result};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::model::AccessLevel;

/// Creates a watcher for the profile database and returns a receiver for change events.
/// The watcher must be kept alive for events to be received.
pub fn watch_db(db_path: &str) -> Result<(RecommendedWatcher, Receiver<()>)> {
    let (tx, rx) = mpsc::channel();

    let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
        if res.is_ok() {
            let _ = tx.send(());
        }
    })
    .context("failed to create file watcher")?;

    // SQLite writes through -wal/-shm siblings, so watch the directory.
    let path = Path::new(db_path);
    let watch_path = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    watcher
        .watch(watch_path, RecursiveMode::NonRecursive)
        .with_context(|| format!("failed to watch {}", watch_path.display()))?;

    Ok((watcher, rx))
}

/// Waits for a database change event with timeout.
/// Returns true if an event was received, false on timeout.
pub fn wait_for_change(rx: &Receiver<()>, timeout: Duration) -> bool {
    rx.recv_timeout(timeout).is_ok()
}

/// Drains any pending events from the receiver.
pub fn drain_events(rx: &Receiver<()>) {
    while rx.try_recv().is_ok() {}
}

/// Remembers the last level reported for a user so the watch loop only
/// prints transitions.
#[derive(Debug, Default)]
pub struct LevelTracker {
    last: Option<AccessLevel>,
}

impl LevelTracker {
    /// Returns the previous level when `level` differs from it; the first
    /// observation always counts as a change.
    pub fn observe(&mut self, level: AccessLevel) -> Option<Option<AccessLevel>> {
        if self.last == Some(level) {
            return None;
        }
        Some(self.last.replace(level))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_reports_only_transitions() {
        let mut t = LevelTracker::default();
        assert_eq!(t.observe(AccessLevel::Preview), Some(None));
        assert_eq!(t.observe(AccessLevel::Preview), None);
        assert_eq!(t.observe(AccessLevel::None), Some(Some(AccessLevel::Preview)));
        assert_eq!(t.observe(AccessLevel::Full), Some(Some(AccessLevel::None)));
    }

    #[test]
    fn watcher_sees_database_writes() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("access.db");
        let db_path = db_path.to_str().unwrap();
        let conn = crate::db::open(db_path).unwrap();
        crate::db::init(&conn).unwrap();

        let (_watcher, rx) = watch_db(db_path).unwrap();
        drain_events(&rx);
        crate::ops::add_profile(&conn, "u1", "a@example.com", None, None).unwrap();
        assert!(wait_for_change(&rx, Duration::from_secs(5)));
    }
}
