//! Session manager for handling multiple conversations

use super::store::{ConversationSession, Utterance};
use crate::utils::safe_filename;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const SNAPSHOT_TYPE: &str = "session";

/// Owns conversation sessions on behalf of a transport
///
/// Each session is persisted as JSONL: the first line is a snapshot of the
/// dialogue state, every following line is one history entry.
#[derive(Debug)]
pub struct SessionManager {
    /// Sessions directory
    sessions_dir: PathBuf,
    /// In-memory cache of sessions
    cache: HashMap<String, ConversationSession>,
}

impl SessionManager {
    /// Create a new session manager persisting under `sessions_dir`
    pub fn new<P: AsRef<Path>>(sessions_dir: P) -> Self {
        Self {
            sessions_dir: sessions_dir.as_ref().to_path_buf(),
            cache: HashMap::new(),
        }
    }

    /// Get or create a session
    pub fn get_or_create(&mut self, key: impl Into<String>) -> &mut ConversationSession {
        let key = key.into();
        if !self.cache.contains_key(&key) {
            let session = self.load(&key).unwrap_or_else(|| {
                debug!("Creating session {}", key);
                ConversationSession::new(&key)
            });
            self.cache.insert(key.clone(), session);
        }
        self.cache
            .entry(key.clone())
            .or_insert_with(|| ConversationSession::new(key))
    }

    /// Get a session if it is cached
    pub fn get(&self, key: &str) -> Option<&ConversationSession> {
        self.cache.get(key)
    }

    /// Load a session from disk
    fn load(&self, key: &str) -> Option<ConversationSession> {
        let path = self.session_path(key);
        if !path.exists() {
            return None;
        }

        let content = std::fs::read_to_string(&path).ok()?;
        let mut lines = content.lines().map(str::trim).filter(|l| !l.is_empty());

        let mut snapshot: Value = serde_json::from_str(lines.next()?).ok()?;
        if snapshot.get("_type").and_then(|v| v.as_str()) != Some(SNAPSHOT_TYPE) {
            warn!("Session file {:?} has no snapshot header", path);
            return None;
        }
        if let Some(map) = snapshot.as_object_mut() {
            map.remove("_type");
        }

        let mut session: ConversationSession = match serde_json::from_value(snapshot) {
            Ok(session) => session,
            Err(e) => {
                warn!("Failed to parse session {}: {}", key, e);
                return None;
            }
        };
        session.key = key.to_string();
        session.history = lines
            .filter_map(|line| serde_json::from_str::<Utterance>(line).ok())
            .collect();

        Some(session)
    }

    /// Save a cached session to disk
    pub fn save(&self, key: &str) -> crate::Result<()> {
        let session = self
            .cache
            .get(key)
            .ok_or_else(|| crate::Error::NotFound(format!("session {}", key)))?;
        self.write(session)
    }

    fn write(&self, session: &ConversationSession) -> crate::Result<()> {
        std::fs::create_dir_all(&self.sessions_dir)?;
        let path = self.session_path(&session.key);

        let mut snapshot = serde_json::to_value(session)?;
        if let Some(map) = snapshot.as_object_mut() {
            map.remove("history");
            map.insert("_type".to_string(), Value::String(SNAPSHOT_TYPE.to_string()));
        }

        let mut lines = vec![serde_json::to_string(&snapshot)?];
        for utterance in &session.history {
            lines.push(serde_json::to_string(utterance)?);
        }

        std::fs::write(&path, lines.join("\n"))?;
        Ok(())
    }

    /// Delete a session
    pub fn delete(&mut self, key: &str) -> crate::Result<bool> {
        self.cache.remove(key);

        let path = self.session_path(key);
        if path.exists() {
            std::fs::remove_file(&path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// List all persisted sessions, most recently updated first
    pub fn list_sessions(&self) -> Vec<SessionInfo> {
        let mut sessions = Vec::new();

        let Ok(entries) = std::fs::read_dir(&self.sessions_dir) else {
            return sessions;
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("jsonl") {
                continue;
            }
            let Ok(content) = std::fs::read_to_string(&path) else {
                continue;
            };
            let Some(first_line) = content.lines().next() else {
                continue;
            };
            let Ok(value) = serde_json::from_str::<Value>(first_line) else {
                continue;
            };
            if value.get("_type").and_then(|v| v.as_str()) != Some(SNAPSHOT_TYPE) {
                continue;
            }

            let text = |field: &str| value.get(field).and_then(|v| v.as_str()).map(String::from);
            sessions.push(SessionInfo {
                key: text("key").unwrap_or_default(),
                state: text("state"),
                updated_at: text("updated_at"),
                turns: content.lines().count().saturating_sub(1),
                path: path.to_string_lossy().to_string(),
            });
        }

        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        sessions
    }

    /// Get the file path for a session
    fn session_path(&self, key: &str) -> PathBuf {
        self.sessions_dir
            .join(format!("{}.jsonl", safe_filename(key)))
    }
}

/// Information about a persisted session
#[derive(Debug, Clone)]
pub struct SessionInfo {
    /// Session key
    pub key: String,
    /// FSM state at last save
    pub state: Option<String>,
    /// Last update time
    pub updated_at: Option<String>,
    /// Number of recorded utterances
    pub turns: usize,
    /// File path
    pub path: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DialogueState, Intent, SlotKind};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn noon() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_session_manager_creation() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SessionManager::new(temp_dir.path());
        assert!(manager.list_sessions().is_empty());
    }

    #[test]
    fn test_get_or_create_session() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = SessionManager::new(temp_dir.path());

        let session = manager.get_or_create("web:123");
        session.record_utterance("hello", noon());

        assert_eq!(session.history.len(), 1);
        assert_eq!(session.key, "web:123");
        assert!(manager.get("web:123").is_some());
    }

    #[test]
    fn test_save_and_load_session() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = SessionManager::new(temp_dir.path());

        let session = manager.get_or_create("cli:456");
        session.record_utterance("set gym alarm", noon());
        session.user_name = Some("Sarah".to_string());
        session.begin(
            Intent::SetAlarm,
            [(SlotKind::Label, "gym".to_string())].into_iter().collect(),
            &[SlotKind::Label, SlotKind::Time],
        );
        manager.save("cli:456").unwrap();

        manager.cache.clear();
        let session = manager.get_or_create("cli:456");

        assert_eq!(session.history.len(), 1);
        assert_eq!(session.history[0].text, "set gym alarm");
        assert_eq!(session.state, DialogueState::Collecting);
        assert_eq!(session.missing_fields, vec![SlotKind::Time]);
        assert_eq!(session.user_name.as_deref(), Some("Sarah"));

        let listed = manager.list_sessions();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].key, "cli:456");
        assert_eq!(listed[0].state.as_deref(), Some("COLLECTING"));
        assert_eq!(listed[0].turns, 1);
    }

    #[test]
    fn test_save_unknown_session_fails() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SessionManager::new(temp_dir.path());
        assert!(manager.save("missing").is_err());
    }

    #[test]
    fn test_delete_session() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = SessionManager::new(temp_dir.path());
        manager.get_or_create("gone");
        manager.save("gone").unwrap();

        assert!(manager.delete("gone").unwrap());
        assert!(!manager.delete("gone").unwrap());
        assert!(manager.get("gone").is_none());
    }
}
