use super::{KeyValueStore, PersistenceResult};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;

pub struct SqliteKvStore {
    connection: Mutex<Connection>,
}

impl SqliteKvStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    pub fn in_memory() -> PersistenceResult<Self> {
        let connection = Connection::open_in_memory()?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            CREATE TABLE IF NOT EXISTS kv_entries (
                namespace TEXT NOT NULL,
                key TEXT NOT NULL,
                value_json TEXT NOT NULL,
                PRIMARY KEY (namespace, key)
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }
}

impl KeyValueStore for SqliteKvStore {
    fn get(&self, namespace: &str, key: &str) -> PersistenceResult<Option<Value>> {
        let conn = self.connection.lock();
        let mut stmt =
            conn.prepare("SELECT value_json FROM kv_entries WHERE namespace = ?1 AND key = ?2")?;
        let json: Option<String> = stmt
            .query_row(params![namespace, key], |row| row.get(0))
            .optional()?;
        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn put(&self, namespace: &str, key: &str, value: &Value) -> PersistenceResult<()> {
        let json = serde_json::to_string(value)?;
        let conn = self.connection.lock();
        conn.execute(
            "INSERT INTO kv_entries (namespace, key, value_json) VALUES (?1, ?2, ?3)
             ON CONFLICT(namespace, key) DO UPDATE SET value_json = excluded.value_json",
            params![namespace, key, json],
        )?;
        Ok(())
    }

    fn delete(&self, namespace: &str, key: &str) -> PersistenceResult<bool> {
        let conn = self.connection.lock();
        let removed = conn.execute(
            "DELETE FROM kv_entries WHERE namespace = ?1 AND key = ?2",
            params![namespace, key],
        )?;
        Ok(removed > 0)
    }
}
