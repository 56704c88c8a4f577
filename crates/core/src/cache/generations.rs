//! SQLite-backed cache generations.
//!
//! Implements [`CacheStorage`] for [`CacheDb`]. Entries live in one table
//! keyed by (generation, key) and are cascade-deleted with their generation.

use async_trait::async_trait;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, Connection, OptionalExtension};

use super::connection::CacheDb;
use super::entry::CacheEntry;
use super::storage::CacheStorage;
use crate::Error;
use crate::request::{Headers, Response};

const SELECT_ENTRY: &str = "SELECT e.key, e.method, e.url, e.status, e.headers_json, e.body, e.stored_at
     FROM entries e";

/// Entry row before the header JSON is decoded.
type RawEntry = (String, String, String, u16, String, Vec<u8>, String);

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawEntry> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?, row.get(6)?))
}

fn decode((key, method, url, status, headers_json, body, stored_at): RawEntry) -> Result<CacheEntry, Error> {
    let headers: Headers = serde_json::from_str(&headers_json)?;
    Ok(CacheEntry { key, method, url, response: Response { status, headers, body }, stored_at })
}

fn ensure_generation(conn: &Connection, generation: &str) -> Result<(), Error> {
    conn.execute(
        "INSERT INTO generations (name, created_at) VALUES (?1, ?2) ON CONFLICT(name) DO NOTHING",
        params![generation, chrono::Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

fn upsert_entry(conn: &Connection, generation: &str, entry: &CacheEntry) -> Result<(), Error> {
    let headers_json = serde_json::to_string(&entry.response.headers)?;
    conn.execute(
        "INSERT INTO entries (generation, key, method, url, status, headers_json, body, stored_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(generation, key) DO UPDATE SET
             method = excluded.method,
             url = excluded.url,
             status = excluded.status,
             headers_json = excluded.headers_json,
             body = excluded.body,
             stored_at = excluded.stored_at",
        params![
            generation,
            &entry.key,
            &entry.method,
            &entry.url,
            entry.response.status,
            headers_json,
            &entry.response.body,
            &entry.stored_at,
        ],
    )?;
    Ok(())
}

#[async_trait]
impl CacheStorage for CacheDb {
    async fn open(&self, generation: &str) -> Result<(), Error> {
        let generation = generation.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> { ensure_generation(conn, &generation) })
            .await
            .map_err(Error::from)
    }

    async fn generations(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM generations ORDER BY id ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    async fn delete_generation(&self, generation: &str) -> Result<bool, Error> {
        let generation = generation.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM entries WHERE generation = ?1", params![generation])?;
                let deleted = tx.execute("DELETE FROM generations WHERE name = ?1", params![generation])?;
                tx.commit()?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn get(&self, generation: &str, key: &str) -> Result<Option<CacheEntry>, Error> {
        let generation = generation.to_string();
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<CacheEntry>, Error> {
                let raw = conn
                    .query_row(
                        &format!("{SELECT_ENTRY} WHERE e.generation = ?1 AND e.key = ?2"),
                        params![generation, key],
                        read_row,
                    )
                    .optional()?;
                raw.map(decode).transpose()
            })
            .await
            .map_err(Error::from)
    }

    async fn put(&self, generation: &str, entry: &CacheEntry) -> Result<(), Error> {
        let generation = generation.to_string();
        let entry = entry.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                ensure_generation(&tx, &generation)?;
                upsert_entry(&tx, &generation, &entry)?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn put_all(&self, generation: &str, entries: &[CacheEntry]) -> Result<(), Error> {
        let generation = generation.to_string();
        let entries = entries.to_vec();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                ensure_generation(&tx, &generation)?;
                for entry in &entries {
                    upsert_entry(&tx, &generation, entry)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn match_any(&self, key: &str) -> Result<Option<CacheEntry>, Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<CacheEntry>, Error> {
                let raw = conn
                    .query_row(
                        &format!(
                            "{SELECT_ENTRY} JOIN generations g ON g.name = e.generation
                             WHERE e.key = ?1 ORDER BY g.id ASC LIMIT 1"
                        ),
                        params![key],
                        read_row,
                    )
                    .optional()?;
                raw.map(decode).transpose()
            })
            .await
            .map_err(Error::from)
    }

    async fn entries(&self, generation: &str) -> Result<Vec<CacheEntry>, Error> {
        let generation = generation.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<CacheEntry>, Error> {
                let mut stmt = conn.prepare(&format!("{SELECT_ENTRY} WHERE e.generation = ?1 ORDER BY e.rowid ASC"))?;
                let rows = stmt
                    .query_map(params![generation], read_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows.into_iter().map(decode).collect()
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn make_entry(path: &str, body: &str) -> CacheEntry {
        let url = Url::parse("https://example.com").unwrap().join(path).unwrap();
        let response = Response::new(200, body.as_bytes().to_vec()).with_header("Content-Type", "text/css");
        CacheEntry::for_url("GET", &url, response)
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let entry = make_entry("/app.css", "body{}");

        db.put("portfolio-static-v1", &entry).await.unwrap();

        let retrieved = db.get("portfolio-static-v1", &entry.key).await.unwrap().unwrap();
        assert_eq!(retrieved, entry);
        assert_eq!(retrieved.response.content_type(), Some("text/css"));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(db.get("portfolio-static-v1", "nonexistent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put("static", &make_entry("/app.css", "old")).await.unwrap();
        db.put("static", &make_entry("/app.css", "new")).await.unwrap();

        let entries = db.entries("static").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].response.text(), "new");
    }

    #[tokio::test]
    async fn test_generations_in_creation_order() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open("static-v0").await.unwrap();
        db.open("dynamic-v0").await.unwrap();
        db.open("static-v1").await.unwrap();
        db.open("static-v0").await.unwrap();

        assert_eq!(db.generations().await.unwrap(), vec!["static-v0", "dynamic-v0", "static-v1"]);
    }

    #[tokio::test]
    async fn test_delete_generation_removes_entries() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let entry = make_entry("/app.css", "body{}");
        db.put("static-v0", &entry).await.unwrap();

        assert!(db.delete_generation("static-v0").await.unwrap());
        assert!(!db.delete_generation("static-v0").await.unwrap());
        assert!(db.generations().await.unwrap().is_empty());
        assert!(db.match_any(&entry.key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_match_any_prefers_oldest_generation() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put("static", &make_entry("/", "shell")).await.unwrap();
        db.put("dynamic", &make_entry("/", "fresh")).await.unwrap();

        let found = db.match_any(&make_entry("/", "").key).await.unwrap().unwrap();
        assert_eq!(found.response.text(), "shell");
    }

    #[tokio::test]
    async fn test_put_all() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let entries = vec![make_entry("/", "a"), make_entry("/index.html", "b"), make_entry("/manifest.json", "c")];

        db.put_all("static", &entries).await.unwrap();

        let stored = db.entries("static").await.unwrap();
        let urls: Vec<_> = stored.iter().map(|e| e.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://example.com/", "https://example.com/index.html", "https://example.com/manifest.json"]
        );
    }
}
