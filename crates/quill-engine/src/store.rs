//! Transcript persistence: one JSON record per session
//!
//! Saves are atomic from the caller's perspective: the record is written
//! to a temporary sibling file and renamed over the previous version, so
//! a crash or failed save never leaves a truncated transcript behind.

use crate::error::{Error, Result};
use crate::session::{Session, SessionSummary};
use std::fs;
use std::path::{Path, PathBuf};

/// Load/save/list of persisted sessions, keyed by session id.
#[derive(Debug, Clone)]
pub struct TranscriptStore {
    dir: PathBuf,
}

impl TranscriptStore {
    /// Store rooted at the given directory. Created on first save/list.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The default per-user sessions directory
    pub fn default_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("quill")
            .join("sessions")
    }

    /// Directory backing this store
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    /// Persist a session. Writes `<id>.json.tmp` then renames over
    /// `<id>.json`; a failure leaves any prior valid record intact.
    pub fn save(&self, session: &Session) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let path = self.path_for(&session.id);
        let tmp_path = self.dir.join(format!("{}.json.tmp", session.id));

        let data = serde_json::to_string_pretty(session)?;
        fs::write(&tmp_path, &data)?;
        fs::rename(&tmp_path, &path)?;

        tracing::debug!(id = %session.id, path = %path.display(), "session saved");
        Ok(())
    }

    /// Load a session by id
    pub fn load(&self, id: &str) -> Result<Session> {
        let path = self.path_for(id);
        let data = fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound(id.to_string())
            } else {
                Error::Io(e)
            }
        })?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Summaries of every stored session, newest first.
    /// Unreadable or corrupt records are skipped.
    pub fn list(&self) -> Result<Vec<SessionSummary>> {
        if !self.dir.exists() {
            return Ok(vec![]);
        }

        let mut summaries = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            match fs::read_to_string(&path)
                .map_err(Error::Io)
                .and_then(|data| Ok(serde_json::from_str::<Session>(&data)?))
            {
                Ok(session) => summaries.push(session.summary()),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable session");
                }
            }
        }

        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries)
    }

    /// Delete a session's storage entry
    pub fn delete(&self, id: &str) -> Result<()> {
        fs::remove_file(self.path_for(id)).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound(id.to_string())
            } else {
                Error::Io(e)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_ai::Message;
    use tempfile::TempDir;

    fn store() -> (TempDir, TranscriptStore) {
        let dir = TempDir::new().unwrap();
        let store = TranscriptStore::new(dir.path());
        (dir, store)
    }

    fn sample_session() -> Session {
        let mut session = Session::new("claude-sonnet-4-5-20250929");
        session.messages.push(Message::user("hi"));
        session.messages.push(Message::assistant("hello"));
        session.total_cost = 0.0072;
        session
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let (_dir, store) = store();
        let session = sample_session();
        store.save(&session).unwrap();
        let loaded = store.load(&session.id).unwrap();
        assert_eq!(loaded, session);
    }

    #[test]
    fn test_load_missing_is_not_found() {
        let (_dir, store) = store();
        let err = store.load("nope").unwrap_err();
        assert!(matches!(err, Error::NotFound(id) if id == "nope"));
    }

    #[test]
    fn test_save_creates_directory() {
        let dir = TempDir::new().unwrap();
        let store = TranscriptStore::new(dir.path().join("nested").join("sessions"));
        store.save(&sample_session()).unwrap();
        assert!(store.dir().exists());
    }

    #[test]
    fn test_save_leaves_no_tmp_file() {
        let (_dir, store) = store();
        let session = sample_session();
        store.save(&session).unwrap();
        let leftovers: Vec<_> = fs::read_dir(store.dir())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_resave_replaces_prior_version() {
        let (_dir, store) = store();
        let mut session = sample_session();
        store.save(&session).unwrap();

        session.messages.push(Message::user("more"));
        session.messages.push(Message::assistant("sure"));
        session.total_cost += 0.001;
        store.save(&session).unwrap();

        let loaded = store.load(&session.id).unwrap();
        assert_eq!(loaded.messages.len(), 4);
        assert_eq!(loaded, session);
    }

    #[test]
    fn test_failed_save_keeps_prior_record_intact() {
        let (_dir, store) = store();
        let session = sample_session();
        store.save(&session).unwrap();

        // Occupy the tmp path with a directory so the next save fails
        // at the write, before the rename.
        let tmp_path = store.dir().join(format!("{}.json.tmp", session.id));
        fs::create_dir(&tmp_path).unwrap();

        let mut updated = session.clone();
        updated.messages.push(Message::user("lost"));
        updated.total_cost += 0.001;
        assert!(store.save(&updated).is_err());

        let loaded = store.load(&session.id).unwrap();
        assert_eq!(loaded, session);
    }

    #[test]
    fn test_list_orders_newest_first() {
        let (_dir, store) = store();
        let mut old = sample_session();
        old.created_at = chrono::Utc::now() - chrono::Duration::hours(2);
        let new = sample_session();
        store.save(&old).unwrap();
        store.save(&new).unwrap();

        let summaries = store.list().unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].id, new.id);
        assert_eq!(summaries[1].id, old.id);
    }

    #[test]
    fn test_list_empty_dir_absent() {
        let dir = TempDir::new().unwrap();
        let store = TranscriptStore::new(dir.path().join("never-created"));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_list_skips_corrupt_records() {
        let (_dir, store) = store();
        store.save(&sample_session()).unwrap();
        fs::write(store.dir().join("garbage.json"), "not json").unwrap();
        let summaries = store.list().unwrap();
        assert_eq!(summaries.len(), 1);
    }

    #[test]
    fn test_delete_removes_record() {
        let (_dir, store) = store();
        let session = sample_session();
        store.save(&session).unwrap();
        store.delete(&session.id).unwrap();
        assert!(matches!(
            store.load(&session.id).unwrap_err(),
            Error::NotFound(_)
        ));
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let (_dir, store) = store();
        assert!(matches!(
            store.delete("nope").unwrap_err(),
            Error::NotFound(_)
        ));
    }
}
