//! SQLite-backed conversation store
//!
//! Owns the schema: two tables, `conversations` and `messages`, with a
//! cascading foreign key so deleting a conversation removes its
//! messages in the same statement. Timestamps are stored as RFC 3339
//! text; message order is `created_at` then insertion order, so
//! same-millisecond appends still replay in the order they happened.

use async_trait::async_trait;
use braid_application::{ConversationStore, StoreError};
use braid_domain::{Conversation, Message, Role};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS conversations (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    model TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS messages (
    id TEXT PRIMARY KEY,
    conversation_id TEXT NOT NULL,
    role TEXT NOT NULL,
    content TEXT NOT NULL,
    created_at TEXT NOT NULL,
    FOREIGN KEY (conversation_id) REFERENCES conversations(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_messages_conversation
    ON messages(conversation_id);
";

/// Conversation store backed by a SQLite database file.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and apply the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Persistence(e.to_string()))?;
        }
        let conn = Connection::open(path).map_err(persistence)?;
        Self::init(conn)
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(persistence)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(persistence)?;
        conn.execute_batch(SCHEMA).map_err(persistence)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conversation_exists(conn: &Connection, id: &str) -> Result<bool, StoreError> {
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM conversations WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .map_err(persistence)?;
        Ok(count > 0)
    }
}

fn persistence(e: rusqlite::Error) -> StoreError {
    StoreError::Persistence(e.to_string())
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Persistence(format!("bad timestamp '{raw}': {e}")))
}

fn parse_role(raw: &str) -> Result<Role, StoreError> {
    Role::from_str(raw).map_err(|e| StoreError::Persistence(e.to_string()))
}

#[async_trait]
impl ConversationStore for SqliteStore {
    async fn list_conversations(&self) -> Result<Vec<Conversation>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT id, title, model, created_at, updated_at
                 FROM conversations
                 ORDER BY updated_at DESC",
            )
            .map_err(persistence)?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .map_err(persistence)?;

        let mut conversations = Vec::new();
        for row in rows {
            let (id, title, model, created_at, updated_at) = row.map_err(persistence)?;
            conversations.push(Conversation {
                id,
                title,
                model,
                created_at: parse_timestamp(&created_at)?,
                updated_at: parse_timestamp(&updated_at)?,
            });
        }
        Ok(conversations)
    }

    async fn create_conversation(
        &self,
        title: &str,
        model: &str,
    ) -> Result<Conversation, StoreError> {
        let conversation = Conversation {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            model: model.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO conversations (id, title, model, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                conversation.id,
                conversation.title,
                conversation.model,
                conversation.created_at.to_rfc3339(),
                conversation.updated_at.to_rfc3339(),
            ],
        )
        .map_err(persistence)?;

        debug!(id = %conversation.id, title = %conversation.title, "created conversation");
        Ok(conversation)
    }

    async fn get_messages(&self, conversation_id: &str) -> Result<Vec<Message>, StoreError> {
        let conn = self.conn.lock().unwrap();
        if !Self::conversation_exists(&conn, conversation_id)? {
            return Err(StoreError::NotFound(conversation_id.to_string()));
        }

        let mut stmt = conn
            .prepare(
                "SELECT id, conversation_id, role, content, created_at
                 FROM messages
                 WHERE conversation_id = ?1
                 ORDER BY created_at ASC, rowid ASC",
            )
            .map_err(persistence)?;

        let rows = stmt
            .query_map(params![conversation_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .map_err(persistence)?;

        let mut messages = Vec::new();
        for row in rows {
            let (id, conversation_id, role, content, created_at) = row.map_err(persistence)?;
            messages.push(Message {
                id,
                conversation_id,
                role: parse_role(&role)?,
                content,
                created_at: parse_timestamp(&created_at)?,
            });
        }
        Ok(messages)
    }

    async fn save_message(
        &self,
        conversation_id: &str,
        role: Role,
        content: &str,
    ) -> Result<Message, StoreError> {
        let message = Message {
            id: Uuid::new_v4().to_string(),
            conversation_id: conversation_id.to_string(),
            role,
            content: content.to_string(),
            created_at: Utc::now(),
        };

        let conn = self.conn.lock().unwrap();
        if !Self::conversation_exists(&conn, conversation_id)? {
            return Err(StoreError::NotFound(conversation_id.to_string()));
        }

        conn.execute(
            "INSERT INTO messages (id, conversation_id, role, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                message.id,
                message.conversation_id,
                message.role.as_str(),
                message.content,
                message.created_at.to_rfc3339(),
            ],
        )
        .map_err(persistence)?;

        conn.execute(
            "UPDATE conversations SET updated_at = ?1 WHERE id = ?2",
            params![message.created_at.to_rfc3339(), conversation_id],
        )
        .map_err(persistence)?;

        Ok(message)
    }

    async fn delete_conversation(&self, id: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn
            .execute("DELETE FROM conversations WHERE id = ?1", params![id])
            .map_err(persistence)?;
        debug!(id = %id, deleted, "deleted conversation");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    #[tokio::test]
    async fn messages_replay_in_creation_order() {
        let store = store();
        let convo = store.create_conversation("Greetings", "llama3").await.unwrap();

        store.save_message(&convo.id, Role::User, "Hi").await.unwrap();
        store
            .save_message(&convo.id, Role::Assistant, "Hello!")
            .await
            .unwrap();
        store.save_message(&convo.id, Role::User, "Bye").await.unwrap();

        let messages = store.get_messages(&convo.id).await.unwrap();
        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["Hi", "Hello!", "Bye"]);
        assert_eq!(messages[1].role, Role::Assistant);
        assert!(messages.iter().all(|m| m.conversation_id == convo.id));
    }

    #[tokio::test]
    async fn list_orders_by_most_recent_activity() {
        let store = store();
        let first = store.create_conversation("First", "llama3").await.unwrap();
        let second = store.create_conversation("Second", "llama3").await.unwrap();

        // Touching the older conversation moves it to the front
        store.save_message(&first.id, Role::User, "ping").await.unwrap();

        let listed = store.list_conversations().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, first.id);
        assert_eq!(listed[1].id, second.id);
    }

    #[tokio::test]
    async fn save_into_missing_conversation_is_not_found() {
        let store = store();
        let err = store
            .save_message("no-such-id", Role::User, "Hi")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn get_messages_for_missing_conversation_is_not_found() {
        let store = store();
        let err = store.get_messages("no-such-id").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn empty_conversation_yields_empty_history() {
        let store = store();
        let convo = store.create_conversation("Empty", "llama3").await.unwrap();
        assert!(store.get_messages(&convo.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_cascades_to_messages_and_is_idempotent() {
        let store = store();
        let convo = store.create_conversation("Doomed", "llama3").await.unwrap();
        store.save_message(&convo.id, Role::User, "Hi").await.unwrap();

        store.delete_conversation(&convo.id).await.unwrap();
        assert!(store.list_conversations().await.unwrap().is_empty());
        assert!(matches!(
            store.get_messages(&convo.id).await,
            Err(StoreError::NotFound(_))
        ));

        // Deleting again is a no-op
        store.delete_conversation(&convo.id).await.unwrap();
    }

    #[tokio::test]
    async fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("braid.db");
        let store = SqliteStore::open(&path).unwrap();
        store.create_conversation("Disk", "llama3").await.unwrap();
        assert!(path.exists());
    }
}
