//! Message store adapters.
//!
//! `MessageStore` is the boundary the reader executes built queries against.
//! `SqliteStore` runs them on the inbox database, `MemoryStore` evaluates the
//! same selection in process.
//!
//! CHANGELOG:
//! - 10/16/2026 - Initial implementation

use parking_lot::{Mutex, RwLock};
use rusqlite::types::ToSqlOutput;
use rusqlite::{params_from_iter, Connection, ToSql};
use std::path::PathBuf;

use super::connection;
use super::query::{Param, StoreQuery};
use crate::error::{Result, SmsError};
use crate::message::Message;

/// Inbox table layout. `date` is Unix milliseconds.
pub const SMS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS sms (
    _id INTEGER PRIMARY KEY AUTOINCREMENT,
    address TEXT,
    body TEXT,
    date INTEGER NOT NULL,
    read INTEGER NOT NULL DEFAULT 0
)
"#;

/// Executes built queries. Results come back ordered and capped.
pub trait MessageStore: Send + Sync {
    fn query(&self, query: &StoreQuery) -> Result<Vec<Message>>;
}

impl ToSql for Param {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            Param::Integer(v) => v.to_sql(),
            Param::Text(v) => v.to_sql(),
        }
    }
}

// ============================================================================
// SQLite
// ============================================================================

/// Store backed by a hot SQLite connection, opened on first use.
pub struct SqliteStore {
    db_path: Option<PathBuf>,
    conn: Mutex<Option<Connection>>,
}

impl SqliteStore {
    /// Store over the inbox database at `db_path` (opened read-only when first queried).
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: Some(db_path.into()),
            conn: Mutex::new(None),
        }
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            db_path: None,
            conn: Mutex::new(Some(conn)),
        }
    }
}

impl MessageStore for SqliteStore {
    fn query(&self, query: &StoreQuery) -> Result<Vec<Message>> {
        let mut guard = self.conn.lock();
        if guard.is_none() {
            let path = self
                .db_path
                .as_deref()
                .ok_or_else(|| SmsError::Store("no inbox database configured".to_string()))?;
            let conn = connection::open_db(path).map_err(|e| SmsError::Store(format!("{:#}", e)))?;
            *guard = Some(conn);
        }

        match guard.as_ref() {
            Some(conn) => query_messages(conn, query),
            None => Err(SmsError::Store("inbox connection unavailable".to_string())),
        }
    }
}

/// Run a built query on a connection.
///
/// The prepared statement and its cursor are dropped on every return path.
pub fn query_messages(conn: &Connection, query: &StoreQuery) -> Result<Vec<Message>> {
    let sql = format!(
        "SELECT _id, address, body, date, read FROM sms WHERE {} ORDER BY {} LIMIT ?",
        query.selection.clause(),
        query.order_by
    );

    let mut params = query.selection.parameters();
    params.push(Param::Integer(query.limit as i64));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(params.iter()), |row: &rusqlite::Row| {
        Ok(Message {
            id: row.get::<_, i64>(0)?.to_string(),
            address: row.get(1)?,
            body: row.get(2)?,
            timestamp_millis: row.get(3)?,
            read: row.get::<_, i32>(4)? == 1,
        })
    })?;

    let messages = rows.collect::<rusqlite::Result<Vec<Message>>>()?;
    Ok(messages)
}

/// Highest row id currently in the inbox (0 when empty).
pub fn query_max_row_id(conn: &Connection) -> Result<i64> {
    let max = conn.query_row("SELECT COALESCE(MAX(_id), 0) FROM sms", [], |row| {
        row.get::<_, i64>(0)
    })?;
    Ok(max)
}

/// Rows inserted after `row_id`, oldest first, as `(row_id, message)`.
pub fn query_rows_after(conn: &Connection, row_id: i64) -> Result<Vec<(i64, Message)>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT _id, address, body, date, read
        FROM sms
        WHERE _id > ?1
        ORDER BY _id ASC
        "#,
    )?;

    let rows = stmt.query_map([row_id], |row: &rusqlite::Row| {
        let id: i64 = row.get(0)?;
        Ok((
            id,
            Message {
                id: id.to_string(),
                address: row.get(1)?,
                body: row.get(2)?,
                timestamp_millis: row.get(3)?,
                read: row.get::<_, i32>(4)? == 1,
            },
        ))
    })?;

    let out = rows.collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(out)
}

// ============================================================================
// In-memory
// ============================================================================

/// Store holding messages in process; evaluates selections directly.
#[derive(Default)]
pub struct MemoryStore {
    messages: RwLock<Vec<Message>>,
    fail_with: RwLock<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, message: Message) {
        self.messages.write().push(message);
    }

    /// Make subsequent queries fail with the given reason (or succeed again with `None`).
    pub fn set_failure(&self, reason: Option<String>) {
        *self.fail_with.write() = reason;
    }
}

impl MessageStore for MemoryStore {
    fn query(&self, query: &StoreQuery) -> Result<Vec<Message>> {
        if let Some(reason) = self.fail_with.read().clone() {
            return Err(SmsError::Store(reason));
        }

        let mut matched: Vec<Message> = self
            .messages
            .read()
            .iter()
            .filter(|m| query.selection.evaluate(m))
            .cloned()
            .collect();

        matched.sort_by(|a, b| b.timestamp_millis.cmp(&a.timestamp_millis));
        matched.truncate(query.limit as usize);
        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::query::{self, Query};
    use crate::filter::SenderSet;

    fn seeded() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SMS_SCHEMA).unwrap();
        let rows: &[(&str, &str, i64, i32)] = &[
            ("MYBANK", "credited 100", 100, 1),
            ("FRIEND", "lunch?", 150, 0),
            ("MyBank-Alert", "debited 50", 300, 0),
            ("BANKCO", "balance", 200, 1),
        ];
        for (address, body, date, read) in rows {
            conn.execute(
                "INSERT INTO sms (address, body, date, read) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![address, body, date, read],
            )
            .unwrap();
        }
        conn
    }

    fn built(senders: &[&str], since: i64, limit: i64) -> StoreQuery {
        let senders: SenderSet = senders.iter().collect();
        query::build(&Query::new(senders, since, limit).unwrap())
    }

    #[test]
    fn test_sqlite_newest_first_and_limited() {
        let store = SqliteStore::from_connection(seeded());
        let messages = store.query(&built(&["bank"], 0, 2)).unwrap();

        let dates: Vec<i64> = messages.iter().map(|m| m.timestamp_millis).collect();
        assert_eq!(dates, vec![300, 200]);
        assert_eq!(messages[0].address.as_deref(), Some("MyBank-Alert"));
        assert!(!messages[0].read);
        assert!(messages[1].read);
    }

    #[test]
    fn test_sqlite_since_is_exclusive() {
        let store = SqliteStore::from_connection(seeded());
        let messages = store.query(&built(&["BANK"], 200, 100)).unwrap();

        let dates: Vec<i64> = messages.iter().map(|m| m.timestamp_millis).collect();
        assert_eq!(dates, vec![300]);
    }

    #[test]
    fn test_sqlite_row_id_becomes_message_id() {
        let store = SqliteStore::from_connection(seeded());
        let messages = store.query(&built(&["FRIEND"], 0, 10)).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, "2");
    }

    #[test]
    fn test_sqlite_empty_pattern_matches_every_address() {
        let store = SqliteStore::from_connection(seeded());
        let messages = store.query(&built(&[""], 0, 10)).unwrap();
        assert_eq!(messages.len(), 4);
    }

    #[test]
    fn test_sqlite_query_failure_propagates() {
        let conn = Connection::open_in_memory().unwrap();
        let store = SqliteStore::from_connection(conn);
        let err = store.query(&built(&["BANK"], 0, 10)).unwrap_err();
        assert!(matches!(err, SmsError::StoreQuery(_)));
    }

    #[test]
    fn test_sqlite_missing_inbox_is_store_error() {
        let store = SqliteStore::new("/nonexistent/sms-reader/inbox.db");
        let err = store.query(&built(&["BANK"], 0, 10)).unwrap_err();
        assert!(matches!(err, SmsError::Store(_)));
    }

    #[test]
    fn test_rows_after() {
        let conn = seeded();
        assert_eq!(query_max_row_id(&conn).unwrap(), 4);
        let rows = query_rows_after(&conn, 2).unwrap();
        let ids: Vec<i64> = rows.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![3, 4]);
    }

    #[test]
    fn test_memory_store_matches_sqlite_semantics() {
        let store = MemoryStore::new();
        for (i, (address, date)) in [("BANK-A", 100), ("BANK-B", 300), ("BANK-C", 200), ("MOM", 400)]
            .into_iter()
            .enumerate()
        {
            store.insert(Message {
                id: i.to_string(),
                address: Some(address.to_string()),
                body: None,
                timestamp_millis: date,
                read: true,
            });
        }

        let messages = store.query(&built(&["BANK"], 0, 2)).unwrap();
        let dates: Vec<i64> = messages.iter().map(|m| m.timestamp_millis).collect();
        assert_eq!(dates, vec![300, 200]);
    }

    #[test]
    fn test_memory_store_failure() {
        let store = MemoryStore::new();
        store.set_failure(Some("cursor closed".to_string()));
        assert!(matches!(
            store.query(&built(&["BANK"], 0, 2)),
            Err(SmsError::Store(_))
        ));
    }
}
