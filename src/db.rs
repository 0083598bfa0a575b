use crate::config::Config;
use crate::model::*;
use anyhow::Result;
use libsql::{Builder, Connection, Database as LibsqlDatabase};
use std::path::Path;
use std::time::Duration;

const SYSTEM_MIGRATIONS: &[(&str, &str)] =
    &[("system/000_migrations_table.sql", include_str!("migrations/system/000_migrations_table.sql"))];

const MIGRATIONS: &[(&str, &str)] = &[("001_schema.sql", include_str!("migrations/001_schema.sql"))];

const USER_COLUMNS: &str = "id, username, password, email, google_token, stripe_customer_id, \
     two_fa_enabled, two_fa_secret, max_collections, max_swipes_per_collection";

const COLLECTION_COLUMNS: &str = "id, name, description, created_by, items, created_at, updated_at";

/// Store ids are integers, but they travel through the API and tokens as
/// opaque strings. Anything that does not parse cannot name a row.
fn parse_id(id: &str) -> Option<i64> {
    id.trim().parse::<i64>().ok()
}

pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

pub struct Database {
    #[allow(dead_code)]
    db: LibsqlDatabase,
    conn: Connection,
}

impl Database {
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    async fn is_migration_applied(conn: &Connection, name: &str) -> Result<bool> {
        let query = "SELECT 1 FROM _migrations WHERE name = ?";
        match conn.query(query, libsql::params![name]).await {
            Ok(mut rows) => Ok(rows.next().await?.is_some()),
            Err(e) => {
                if e.to_string().contains("no such table") {
                    Ok(false)
                } else {
                    Err(e.into())
                }
            }
        }
    }

    async fn record_migration(conn: &Connection, name: &str) -> Result<()> {
        let query = r#"
            INSERT INTO _migrations (name, applied_at)
            VALUES (?, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        "#;
        conn.execute(query, libsql::params![name]).await?;
        Ok(())
    }

    async fn run_migration(conn: &Connection, name: &str, sql: &str) -> Result<()> {
        if Self::is_migration_applied(conn, name).await? {
            tracing::debug!("migration {} already applied, skipping", name);
            return Ok(());
        }

        tracing::info!("applying migration: {}", name);
        conn.execute_batch(sql)
            .await
            .map_err(|e| anyhow::anyhow!("failed to execute migration {name}: {e}"))?;

        Self::record_migration(conn, name).await?;
        Ok(())
    }

    /// Opens the database named in the config, relative to `data_dir`.
    pub async fn new(cfg: &Config, data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(cfg.app.get_db());
        let turso_url = cfg.app.turso_url.clone();
        let turso_auth_token = cfg.app.turso_auth_token.clone();

        let db = match (&turso_url, &turso_auth_token) {
            (Some(url), Some(token)) => {
                tracing::info!("[db] running in synced database mode (offline writes)");
                let sync_interval = Duration::from_secs(cfg.app.sync_interval_seconds);
                Builder::new_synced_database(&path, url.clone(), token.clone())
                    .sync_interval(sync_interval)
                    .build()
                    .await?
            }
            _ => Builder::new_local(&path).build().await?,
        };

        Self::setup(db).await
    }

    /// A private, throwaway database. Used by tests and tooling.
    pub async fn in_memory() -> Result<Self> {
        let db = Builder::new_local(":memory:").build().await?;
        Self::setup(db).await
    }

    async fn setup(db: LibsqlDatabase) -> Result<Self> {
        let conn = db.connect()?;
        conn.query("SELECT 1", ()).await?;

        for (filename, sql) in SYSTEM_MIGRATIONS {
            Self::run_migration(&conn, filename, sql).await?;
        }

        for (filename, sql) in MIGRATIONS {
            Self::run_migration(&conn, filename, sql).await?;
        }

        Ok(Database { db, conn })
    }

    // ------------------------------------------------------------------
    // users
    // ------------------------------------------------------------------

    pub async fn create_user(&self, input: NewUser) -> Result<User> {
        let query = format!(
            r#"
            INSERT INTO users (username, password, email, max_collections, max_swipes_per_collection)
            VALUES (?, ?, ?, ?, ?)
            RETURNING {USER_COLUMNS}
        "#
        );

        let mut rows = self
            .conn
            .query(
                &query,
                libsql::params![
                    input.username,
                    input.password_hash,
                    input.email,
                    input.max_collections,
                    input.max_swipes_per_collection
                ],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Self::row_to_user(&row)?)
        } else {
            anyhow::bail!("Failed to create user")
        }
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?");
        let mut rows = self.conn.query(&query, libsql::params![username]).await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::row_to_user(&row)?))
        } else {
            Ok(None)
        }
    }

    pub async fn find_user_by_id(&self, id: &str) -> Result<Option<User>> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };

        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        let mut rows = self.conn.query(&query, libsql::params![id]).await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::row_to_user(&row)?))
        } else {
            Ok(None)
        }
    }

    fn row_to_user(row: &libsql::Row) -> Result<User> {
        let two_fa_enabled: i64 = row.get(6)?;
        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            password: row.get(2)?,
            email: row.get(3)?,
            google_token: row.get(4)?,
            stripe_customer_id: row.get(5)?,
            two_fa: TwoFactor {
                enabled: two_fa_enabled != 0,
                secret: row.get(7)?,
            },
            max_collections: row.get(8)?,
            max_swipes_per_collection: row.get(9)?,
        })
    }

    // ------------------------------------------------------------------
    // swipes
    // ------------------------------------------------------------------

    pub async fn create_swipe(&self, input: NewSwipe) -> Result<Swipe> {
        let tags = serde_json::to_string(&input.tags)?;
        let query = r#"
            INSERT INTO swipes (user_id, url, platform, tags, notes, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, user_id, url, platform, tags, notes, created_at
        "#;

        let mut rows = self
            .conn
            .query(
                query,
                libsql::params![input.user_id, input.url, input.platform, tags, input.notes, now_timestamp()],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Self::row_to_swipe(&row)?)
        } else {
            anyhow::bail!("Failed to create swipe")
        }
    }

    pub async fn get_swipe(&self, id: &str) -> Result<Option<Swipe>> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };

        let query = r#"
            SELECT id, user_id, url, platform, tags, notes, created_at
            FROM swipes WHERE id = ?
        "#;
        let mut rows = self.conn.query(query, libsql::params![id]).await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::row_to_swipe(&row)?))
        } else {
            Ok(None)
        }
    }

    fn row_to_swipe(row: &libsql::Row) -> Result<Swipe> {
        let id: i64 = row.get(0)?;
        let tags: String = row.get(4)?;
        Ok(Swipe {
            id: id.to_string(),
            user_id: row.get(1)?,
            url: row.get(2)?,
            platform: row.get(3)?,
            tags: serde_json::from_str(&tags)
                .map_err(|e| anyhow::anyhow!("invalid tags on swipe {id}: {e}"))?,
            notes: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    // ------------------------------------------------------------------
    // collections
    // ------------------------------------------------------------------

    pub async fn count_collections_by_owner(&self, owner: &str) -> Result<i64> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM collections WHERE created_by = ?", libsql::params![owner])
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(row.get(0)?)
        } else {
            Ok(0)
        }
    }

    pub async fn create_collection(&self, owner: &str, name: &str, description: &str) -> Result<Collection> {
        let now = now_timestamp();
        let query = format!(
            r#"
            INSERT INTO collections (name, description, created_by, items, created_at, updated_at)
            VALUES (?, ?, ?, '[]', ?, ?)
            RETURNING {COLLECTION_COLUMNS}
        "#
        );

        let mut rows = self
            .conn
            .query(&query, libsql::params![name, description, owner, now.clone(), now])
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Self::row_to_collection(&row)?)
        } else {
            anyhow::bail!("Failed to create collection")
        }
    }

    pub async fn list_collections_by_owner(&self, owner: &str) -> Result<Vec<Collection>> {
        let query = format!("SELECT {COLLECTION_COLUMNS} FROM collections WHERE created_by = ? ORDER BY id");
        let mut rows = self.conn.query(&query, libsql::params![owner]).await?;

        let mut collections = Vec::new();
        while let Some(row) = rows.next().await? {
            collections.push(Self::row_to_collection(&row)?);
        }

        Ok(collections)
    }

    /// Looks a collection up by id, but only if `owner` created it.
    pub async fn find_collection(&self, id: &str, owner: &str) -> Result<Option<Collection>> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };

        let query = format!("SELECT {COLLECTION_COLUMNS} FROM collections WHERE id = ? AND created_by = ?");
        let mut rows = self.conn.query(&query, libsql::params![id, owner]).await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::row_to_collection(&row)?))
        } else {
            Ok(None)
        }
    }

    /// Writes every mutable field of `collection` back by id.
    pub async fn save_collection(&self, collection: &Collection) -> Result<()> {
        let id = parse_id(&collection.id)
            .ok_or_else(|| anyhow::anyhow!("invalid collection id: {}", collection.id))?;
        let items = serde_json::to_string(&collection.items)?;

        let query = r#"
            UPDATE collections
            SET name = ?, description = ?, items = ?, updated_at = ?
            WHERE id = ?
        "#;
        self.conn
            .execute(
                query,
                libsql::params![
                    collection.name.clone(),
                    collection.description.clone(),
                    items,
                    collection.updated_at.clone(),
                    id
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn delete_collection(&self, id: &str) -> Result<bool> {
        let Some(id) = parse_id(id) else {
            return Ok(false);
        };

        let result = self
            .conn
            .execute("DELETE FROM collections WHERE id = ?", libsql::params![id])
            .await?;
        Ok(result > 0)
    }

    fn row_to_collection(row: &libsql::Row) -> Result<Collection> {
        let id: i64 = row.get(0)?;
        let items: String = row.get(4)?;
        Ok(Collection {
            id: id.to_string(),
            name: row.get(1)?,
            description: row.get(2)?,
            created_by: row.get(3)?,
            items: serde_json::from_str(&items)
                .map_err(|e| anyhow::anyhow!("invalid items on collection {id}: {e}"))?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            password_hash: "not-a-real-hash".to_string(),
            email: format!("{username}@example.com"),
            max_collections: None,
            max_swipes_per_collection: Some(3),
        }
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let db = Database::in_memory().await.unwrap();
        for (filename, sql) in MIGRATIONS {
            Database::run_migration(db.connection(), filename, sql).await.unwrap();
        }

        let mut rows = db
            .connection()
            .query("SELECT COUNT(*) FROM _migrations", ())
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        let count: i64 = row.get(0).unwrap();
        assert_eq!(count, (SYSTEM_MIGRATIONS.len() + MIGRATIONS.len()) as i64);
    }

    #[tokio::test]
    async fn test_user_lookup() {
        let db = Database::in_memory().await.unwrap();
        let user = db.create_user(new_user("ama")).await.unwrap();

        assert_eq!(user.max_collections, None);
        assert_eq!(user.max_swipes_per_collection, Some(3));
        assert!(!user.two_fa.enabled);

        let by_name = db.find_user_by_username("ama").await.unwrap().unwrap();
        assert_eq!(by_name.id, user.id);

        let by_id = db.find_user_by_id(&user.id.to_string()).await.unwrap().unwrap();
        assert_eq!(by_id.username, "ama");

        assert!(db.find_user_by_username("AMA").await.unwrap().is_none());
        assert!(db.find_user_by_id("not-a-number").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let db = Database::in_memory().await.unwrap();
        db.create_user(new_user("kofi")).await.unwrap();
        assert!(db.create_user(new_user("kofi")).await.is_err());
    }

    #[tokio::test]
    async fn test_swipe_persisted_with_timestamp() {
        let db = Database::in_memory().await.unwrap();
        let swipe = db
            .create_swipe(NewSwipe {
                user_id: "u1".to_string(),
                url: "http://x".to_string(),
                platform: "tiktok".to_string(),
                tags: vec!["a".to_string(), "b".to_string()],
                notes: "n".to_string(),
            })
            .await
            .unwrap();

        let stored = db.get_swipe(&swipe.id).await.unwrap().unwrap();
        assert_eq!(stored.user_id, "u1");
        assert_eq!(stored.tags, vec!["a", "b"]);
        assert!(chrono::DateTime::parse_from_rfc3339(&stored.created_at).is_ok());
    }

    #[tokio::test]
    async fn test_collections_scoped_to_owner() {
        let db = Database::in_memory().await.unwrap();
        let mine = db.create_collection("1", "reads", "long reads").await.unwrap();
        db.create_collection("1", "clips", "short clips").await.unwrap();
        db.create_collection("2", "theirs", "not mine").await.unwrap();

        assert_eq!(db.count_collections_by_owner("1").await.unwrap(), 2);
        assert_eq!(db.count_collections_by_owner("3").await.unwrap(), 0);

        let listed = db.list_collections_by_owner("1").await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].name, "reads");
        assert!(listed[0].items.is_empty());
        assert_eq!(listed[0].created_at, listed[0].updated_at);

        assert!(db.find_collection(&mine.id, "1").await.unwrap().is_some());
        assert!(db.find_collection(&mine.id, "2").await.unwrap().is_none());
        assert!(db.find_collection("bogus", "1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_and_delete_collection() {
        let db = Database::in_memory().await.unwrap();
        let mut collection = db.create_collection("1", "reads", "long reads").await.unwrap();

        collection.name = "renamed".to_string();
        collection.items.push("42".to_string());
        collection.items.push("7".to_string());
        db.save_collection(&collection).await.unwrap();

        let stored = db.find_collection(&collection.id, "1").await.unwrap().unwrap();
        assert_eq!(stored.name, "renamed");
        assert_eq!(stored.items, vec!["42", "7"]);

        assert!(db.delete_collection(&collection.id).await.unwrap());
        assert!(!db.delete_collection(&collection.id).await.unwrap());
        assert!(db.find_collection(&collection.id, "1").await.unwrap().is_none());
    }
}
