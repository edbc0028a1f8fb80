//! Metadata store trait and the SQLite implementation.

use crate::error::{MetadataError, MetadataResult, is_unique_violation};
use crate::repos::{ContentRepo, DomainRepo, RepositoryConfigRepo, RepositoryRepo, UploadRepo};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::{Duration, Instant};

/// Combined metadata store trait.
#[async_trait]
pub trait MetadataStore:
    RepositoryRepo + RepositoryConfigRepo + ContentRepo + DomainRepo + UploadRepo + Send + Sync
{
    /// Create tables and indexes that do not exist yet.
    async fn migrate(&self) -> MetadataResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> MetadataResult<()>;
}

/// SQLite-based metadata store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
    query_timeout: Duration,
}

impl SqliteStore {
    /// Open (creating if missing) a SQLite store at `path`.
    pub async fn new(
        path: impl AsRef<Path>,
        query_timeout_secs: Option<u64>,
    ) -> MetadataResult<Self> {
        let path = path.as_ref();
        let query_timeout_secs = query_timeout_secs.unwrap_or(600);

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        let store = Self::connect(opts, query_timeout_secs).await?;

        tracing::warn!(
            query_timeout_secs = query_timeout_secs,
            "SQLite query timeout is advisory only - slow statements are logged, not cancelled. \
             Use PostgreSQL for deployments that need enforced statement timeouts."
        );

        Ok(store)
    }

    /// Open a private in-memory store. Each call yields an independent database.
    pub async fn in_memory() -> MetadataResult<Self> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        Self::connect(opts, 600).await
    }

    async fn connect(opts: SqliteConnectOptions, query_timeout_secs: u64) -> MetadataResult<Self> {
        let pool = SqlitePoolOptions::new()
            // One connection serializes writers; SQLite allows a single writer anyway
            // and an in-memory database only lives as long as its connection.
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await?;

        let store = Self {
            pool,
            query_timeout: Duration::from_secs(query_timeout_secs),
        };
        store.migrate().await?;
        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    fn warn_if_slow(&self, operation: &'static str, started: Instant) {
        let elapsed = started.elapsed();
        if elapsed > self.query_timeout {
            tracing::warn!(
                operation,
                elapsed_ms = elapsed.as_millis() as u64,
                timeout_secs = self.query_timeout.as_secs(),
                "SQLite operation exceeded advisory query timeout"
            );
        }
    }
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn migrate(&self) -> MetadataResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

// Implement all the repository traits for SqliteStore
mod sqlite_impl {
    use super::*;
    use crate::content_table::{
        ColumnValue, ContentRow, ContentTable, SQLITE_MAX_BIND_PARAMS, key_parts, rows_per_statement,
    };
    use crate::models::*;
    use reposync_core::{ContentKind, NaturalKey, normalize_repository_url};
    use sqlx::{FromRow, QueryBuilder, Row};
    use std::collections::{HashMap, HashSet};
    use time::OffsetDateTime;
    use uuid::Uuid;

    /// Append `<key columns> IN (...)` for a batch of natural keys.
    fn push_key_filter(qb: &mut QueryBuilder<'_, Sqlite>, table: &ContentTable, keys: &[NaturalKey]) {
        if table.key_columns.len() == 1 {
            qb.push(table.key_columns[0]).push(" IN (");
            let mut list = qb.separated(", ");
            for key in keys {
                for part in key_parts(key) {
                    list.push_bind(part.to_string());
                }
            }
            qb.push(")");
            return;
        }

        qb.push(format!("({}) IN (VALUES ", table.key_select()));
        for (i, key) in keys.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push("(");
            let mut tuple = qb.separated(", ");
            for part in key_parts(key) {
                tuple.push_bind(part.to_string());
            }
            qb.push(")");
        }
        qb.push(")");
    }

    fn push_uuid_list(qb: &mut QueryBuilder<'_, Sqlite>, uuids: &[Uuid]) {
        qb.push("(");
        let mut list = qb.separated(", ");
        for uuid in uuids {
            list.push_bind(*uuid);
        }
        qb.push(")");
    }

    #[async_trait]
    impl RepositoryRepo for SqliteStore {
        async fn create_repository(&self, url: &str) -> MetadataResult<RepositoryRow> {
            let url = normalize_repository_url(url);
            if url.is_empty() {
                return Err(MetadataError::InvalidInput(
                    "repository URL cannot be blank".to_string(),
                ));
            }

            let now = OffsetDateTime::now_utc();
            sqlx::query(
                r#"
                INSERT INTO repositories (uuid, url, package_count, created_at, updated_at)
                VALUES (?, ?, 0, ?, ?)
                ON CONFLICT(url) DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(&url)
            .bind(now)
            .bind(now)
            .execute(&self.pool)
            .await?;

            self.get_repository_by_url(&url).await?.ok_or_else(|| {
                MetadataError::Internal(format!("repository for {url} vanished after insert"))
            })
        }

        async fn get_repository(&self, uuid: Uuid) -> MetadataResult<Option<RepositoryRow>> {
            let row = sqlx::query_as::<_, RepositoryRow>("SELECT * FROM repositories WHERE uuid = ?")
                .bind(uuid)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }

        async fn get_repository_by_url(&self, url: &str) -> MetadataResult<Option<RepositoryRow>> {
            let row = sqlx::query_as::<_, RepositoryRow>("SELECT * FROM repositories WHERE url = ?")
                .bind(normalize_repository_url(url))
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }

        async fn record_introspection(
            &self,
            uuid: Uuid,
            record: &IntrospectionRecord,
        ) -> MetadataResult<()> {
            let result = sqlx::query(
                r#"
                UPDATE repositories
                SET last_introspection_status = ?,
                    last_introspection_time = ?,
                    last_introspection_error = ?,
                    package_count = COALESCE(?, package_count),
                    updated_at = ?
                WHERE uuid = ?
                "#,
            )
            .bind(&record.status)
            .bind(record.introspected_at)
            .bind(&record.error)
            .bind(record.package_count)
            .bind(OffsetDateTime::now_utc())
            .bind(uuid)
            .execute(&self.pool)
            .await?;

            if result.rows_affected() == 0 {
                return Err(MetadataError::NotFound(format!("repository {uuid}")));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl RepositoryConfigRepo for SqliteStore {
        async fn create_repository_config(
            &self,
            config: &NewRepositoryConfig,
        ) -> MetadataResult<RepositoryConfigRow> {
            if config.name.trim().is_empty() {
                return Err(MetadataError::InvalidInput(
                    "repository name cannot be blank".to_string(),
                ));
            }
            let repository = self.create_repository(&config.url).await?;
            let uuid = Uuid::new_v4();
            let now = OffsetDateTime::now_utc();

            let result = sqlx::query(
                r#"
                INSERT INTO repository_configurations (
                    uuid, name, org_id, repository_uuid, arch, versions,
                    gpg_key, metadata_verification, created_at, updated_at
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(uuid)
            .bind(&config.name)
            .bind(&config.org_id)
            .bind(repository.uuid)
            .bind(&config.arch)
            .bind(serde_json::to_string(&config.versions)?)
            .bind(&config.gpg_key)
            .bind(config.metadata_verification)
            .bind(now)
            .bind(now)
            .execute(&self.pool)
            .await;

            match result {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => {
                    return Err(MetadataError::AlreadyExists(format!(
                        "repository configuration '{}' ({}) for org {}",
                        config.name, repository.url, config.org_id
                    )));
                }
                Err(e) => return Err(e.into()),
            }

            self.get_repository_config(uuid).await?.ok_or_else(|| {
                MetadataError::Internal(format!("repository configuration {uuid} vanished"))
            })
        }

        async fn get_repository_config(
            &self,
            uuid: Uuid,
        ) -> MetadataResult<Option<RepositoryConfigRow>> {
            let row = sqlx::query_as::<_, RepositoryConfigRow>(
                "SELECT * FROM repository_configurations WHERE uuid = ?",
            )
            .bind(uuid)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row)
        }

        async fn list_repository_configs(
            &self,
            org_id: &str,
        ) -> MetadataResult<Vec<RepositoryConfigRow>> {
            let rows = sqlx::query_as::<_, RepositoryConfigRow>(
                "SELECT * FROM repository_configurations WHERE org_id = ? ORDER BY name",
            )
            .bind(org_id)
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        }

        async fn repository_name_in_use(
            &self,
            org_id: &str,
            name: &str,
            excluded: &[Uuid],
        ) -> MetadataResult<bool> {
            let mut qb = QueryBuilder::<Sqlite>::new(
                "SELECT EXISTS(SELECT 1 FROM repository_configurations WHERE org_id = ",
            );
            qb.push_bind(org_id.to_string());
            qb.push(" AND name = ");
            qb.push_bind(name.to_string());
            if !excluded.is_empty() {
                qb.push(" AND uuid NOT IN ");
                push_uuid_list(&mut qb, excluded);
            }
            qb.push(")");

            let exists: bool = qb.build_query_scalar().fetch_one(&self.pool).await?;
            Ok(exists)
        }

        async fn repository_url_in_use(
            &self,
            org_id: &str,
            url: &str,
            excluded: &[Uuid],
        ) -> MetadataResult<bool> {
            let mut qb = QueryBuilder::<Sqlite>::new(
                "SELECT EXISTS(SELECT 1 FROM repository_configurations rc \
                 JOIN repositories r ON r.uuid = rc.repository_uuid WHERE rc.org_id = ",
            );
            qb.push_bind(org_id.to_string());
            qb.push(" AND r.url = ");
            qb.push_bind(url.to_string());
            if !excluded.is_empty() {
                qb.push(" AND rc.uuid NOT IN ");
                push_uuid_list(&mut qb, excluded);
            }
            qb.push(")");

            let exists: bool = qb.build_query_scalar().fetch_one(&self.pool).await?;
            Ok(exists)
        }

        async fn org_ids_for_url(&self, url: &str) -> MetadataResult<Vec<String>> {
            let rows: Vec<String> = sqlx::query_scalar(
                r#"
                SELECT DISTINCT rc.org_id FROM repository_configurations rc
                JOIN repositories r ON r.uuid = rc.repository_uuid
                WHERE r.url = ?
                ORDER BY rc.org_id
                "#,
            )
            .bind(url)
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        }
    }

    #[async_trait]
    impl ContentRepo for SqliteStore {
        async fn content_uuids(
            &self,
            kind: ContentKind,
            keys: &[NaturalKey],
            lookup_batch_size: usize,
        ) -> MetadataResult<HashMap<NaturalKey, Uuid>> {
            let table = ContentTable::for_kind(kind);
            let mut result = HashMap::with_capacity(keys.len());
            if keys.is_empty() {
                return Ok(result);
            }

            let started = Instant::now();
            let per_lookup = table.keys_per_lookup(lookup_batch_size, SQLITE_MAX_BIND_PARAMS);
            for batch in keys.chunks(per_lookup) {
                let mut qb = QueryBuilder::<Sqlite>::new(format!(
                    "SELECT uuid, {} FROM {} WHERE ",
                    table.key_select(),
                    table.entity_table
                ));
                push_key_filter(&mut qb, table, batch);

                let rows = qb.build().fetch_all(&self.pool).await?;
                for row in rows {
                    let uuid: Uuid = row.try_get("uuid")?;
                    let columns = table
                        .key_columns
                        .iter()
                        .map(|column| row.try_get::<String, _>(*column))
                        .collect::<Result<Vec<_>, _>>()?;
                    result.insert(table.key_from_columns(columns), uuid);
                }
            }
            self.warn_if_slow("content_uuids", started);

            Ok(result)
        }

        async fn insert_content(
            &self,
            kind: ContentKind,
            rows: &[ContentRow],
            batch_size: usize,
        ) -> MetadataResult<u64> {
            let table = ContentTable::for_kind(kind);
            let now = OffsetDateTime::now_utc();
            let started = Instant::now();
            let mut inserted = 0;

            let per_insert = table.rows_per_insert(batch_size, SQLITE_MAX_BIND_PARAMS);
            for batch in rows.chunks(per_insert) {
                let mut qb = QueryBuilder::<Sqlite>::new(format!(
                    "INSERT INTO {} (uuid, {}, created_at) ",
                    table.entity_table,
                    table.insert_columns.join(", ")
                ));
                qb.push_values(batch, |mut b, row| {
                    b.push_bind(Uuid::new_v4());
                    for value in &row.values {
                        match value {
                            ColumnValue::Text(text) => {
                                b.push_bind(text.clone());
                            }
                            ColumnValue::Integer(int) => {
                                b.push_bind(*int);
                            }
                        }
                    }
                    b.push_bind(now);
                });
                qb.push(" ON CONFLICT DO NOTHING");

                let result = qb.build().execute(&self.pool).await?;
                inserted += result.rows_affected();
                tracing::debug!(
                    table = table.entity_table,
                    batch_rows = batch.len(),
                    inserted = result.rows_affected(),
                    "Inserted content batch"
                );
            }
            self.warn_if_slow("insert_content", started);

            Ok(inserted)
        }

        async fn associated_uuids(
            &self,
            kind: ContentKind,
            repository_uuid: Uuid,
        ) -> MetadataResult<HashSet<Uuid>> {
            let table = ContentTable::for_kind(kind);
            let sql = format!(
                "SELECT {} FROM {} WHERE repository_uuid = ?",
                table.association_column, table.association_table
            );
            let rows: Vec<Uuid> = sqlx::query_scalar(&sql)
                .bind(repository_uuid)
                .fetch_all(&self.pool)
                .await?;
            Ok(rows.into_iter().collect())
        }

        async fn delete_associations(
            &self,
            kind: ContentKind,
            repository_uuid: Uuid,
            content_uuids: &[Uuid],
            batch_size: usize,
        ) -> MetadataResult<u64> {
            let table = ContentTable::for_kind(kind);
            let mut deleted = 0;
            // One slot goes to repository_uuid.
            let per_delete = rows_per_statement(batch_size, 1, SQLITE_MAX_BIND_PARAMS - 1);
            for batch in content_uuids.chunks(per_delete) {
                let mut qb = QueryBuilder::<Sqlite>::new(format!(
                    "DELETE FROM {} WHERE repository_uuid = ",
                    table.association_table
                ));
                qb.push_bind(repository_uuid);
                qb.push(format!(" AND {} IN ", table.association_column));
                push_uuid_list(&mut qb, batch);

                deleted += qb.build().execute(&self.pool).await?.rows_affected();
            }
            Ok(deleted)
        }

        async fn insert_associations(
            &self,
            kind: ContentKind,
            repository_uuid: Uuid,
            content_uuids: &[Uuid],
            batch_size: usize,
        ) -> MetadataResult<u64> {
            let table = ContentTable::for_kind(kind);
            let started = Instant::now();
            let mut inserted = 0;
            let per_insert = rows_per_statement(batch_size, 2, SQLITE_MAX_BIND_PARAMS);
            for batch in content_uuids.chunks(per_insert) {
                let mut qb = QueryBuilder::<Sqlite>::new(format!(
                    "INSERT INTO {} (repository_uuid, {}) ",
                    table.association_table, table.association_column
                ));
                qb.push_values(batch, |mut b, uuid| {
                    b.push_bind(repository_uuid).push_bind(*uuid);
                });
                qb.push(" ON CONFLICT DO NOTHING");

                inserted += qb.build().execute(&self.pool).await?.rows_affected();
            }
            self.warn_if_slow("insert_associations", started);
            Ok(inserted)
        }

        async fn orphaned_uuids(&self, kind: ContentKind) -> MetadataResult<Vec<Uuid>> {
            let table = ContentTable::for_kind(kind);
            let sql = format!(
                "SELECT e.uuid FROM {entity} e \
                 LEFT JOIN {assoc} a ON a.{column} = e.uuid \
                 WHERE a.{column} IS NULL",
                entity = table.entity_table,
                assoc = table.association_table,
                column = table.association_column,
            );
            let rows: Vec<Uuid> = sqlx::query_scalar(&sql).fetch_all(&self.pool).await?;
            Ok(rows)
        }

        async fn delete_orphans(
            &self,
            kind: ContentKind,
            content_uuids: &[Uuid],
            batch_size: usize,
        ) -> MetadataResult<u64> {
            let table = ContentTable::for_kind(kind);
            let mut deleted = 0;
            let per_delete = rows_per_statement(batch_size, 1, SQLITE_MAX_BIND_PARAMS);
            for batch in content_uuids.chunks(per_delete) {
                let mut qb = QueryBuilder::<Sqlite>::new(format!(
                    "DELETE FROM {} WHERE uuid IN ",
                    table.entity_table
                ));
                push_uuid_list(&mut qb, batch);
                qb.push(format!(
                    " AND NOT EXISTS (SELECT 1 FROM {assoc} a WHERE a.{column} = {entity}.uuid)",
                    assoc = table.association_table,
                    column = table.association_column,
                    entity = table.entity_table,
                ));

                deleted += qb.build().execute(&self.pool).await?.rows_affected();
            }
            Ok(deleted)
        }

        async fn list_repository_content_keys(
            &self,
            kind: ContentKind,
            repository_uuid: Uuid,
        ) -> MetadataResult<Vec<NaturalKey>> {
            let table = ContentTable::for_kind(kind);
            let columns: Vec<String> = table.key_columns.iter().map(|c| format!("e.{c}")).collect();
            let sql = format!(
                "SELECT {columns} FROM {entity} e \
                 JOIN {assoc} a ON a.{column} = e.uuid \
                 WHERE a.repository_uuid = ?",
                columns = columns.join(", "),
                entity = table.entity_table,
                assoc = table.association_table,
                column = table.association_column,
            );
            let rows = sqlx::query(&sql)
                .bind(repository_uuid)
                .fetch_all(&self.pool)
                .await?;

            let mut keys = Vec::with_capacity(rows.len());
            for row in rows {
                let parts = (0..table.key_columns.len())
                    .map(|i| row.try_get::<String, _>(i))
                    .collect::<Result<Vec<_>, _>>()?;
                keys.push(table.key_from_columns(parts));
            }
            keys.sort();
            Ok(keys)
        }

        async fn count_repository_content(
            &self,
            kind: ContentKind,
            repository_uuid: Uuid,
        ) -> MetadataResult<u64> {
            let table = ContentTable::for_kind(kind);
            let sql = format!(
                "SELECT COUNT(*) FROM {} WHERE repository_uuid = ?",
                table.association_table
            );
            let count: i64 = sqlx::query_scalar(&sql)
                .bind(repository_uuid)
                .fetch_one(&self.pool)
                .await?;
            Ok(count as u64)
        }

        async fn count_content(&self, kind: ContentKind) -> MetadataResult<u64> {
            let table = ContentTable::for_kind(kind);
            let sql = format!("SELECT COUNT(*) FROM {}", table.entity_table);
            let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
            Ok(count as u64)
        }
    }

    #[async_trait]
    impl DomainRepo for SqliteStore {
        async fn insert_domain(&self, org_id: &str, domain_name: &str) -> MetadataResult<bool> {
            let result = sqlx::query(
                r#"
                INSERT INTO domains (org_id, domain_name, created_at)
                VALUES (?, ?, ?)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(org_id)
            .bind(domain_name)
            .bind(OffsetDateTime::now_utc())
            .execute(&self.pool)
            .await?;
            Ok(result.rows_affected() == 1)
        }

        async fn domain_names_for_org(&self, org_id: &str) -> MetadataResult<Vec<String>> {
            let rows: Vec<String> =
                sqlx::query_scalar("SELECT domain_name FROM domains WHERE org_id = ?")
                    .bind(org_id)
                    .fetch_all(&self.pool)
                    .await?;
            Ok(rows)
        }

        async fn list_domains(&self) -> MetadataResult<Vec<DomainRow>> {
            let rows = sqlx::query_as::<_, DomainRow>(
                "SELECT org_id, domain_name, created_at FROM domains ORDER BY org_id",
            )
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        }
    }

    /// Upload row as stored in SQLite, with `chunk_list` as JSON text.
    #[derive(FromRow)]
    struct StoredUpload {
        upload_uuid: String,
        org_id: String,
        sha256: String,
        chunk_size: i64,
        chunk_list: String,
        created_at: OffsetDateTime,
    }

    impl TryFrom<StoredUpload> for UploadRow {
        type Error = MetadataError;

        fn try_from(row: StoredUpload) -> MetadataResult<Self> {
            Ok(UploadRow {
                upload_uuid: row.upload_uuid,
                org_id: row.org_id,
                sha256: row.sha256,
                chunk_size: row.chunk_size,
                chunk_list: serde_json::from_str(&row.chunk_list)?,
                created_at: row.created_at,
            })
        }
    }

    #[async_trait]
    impl UploadRepo for SqliteStore {
        async fn insert_upload(&self, upload: &UploadRow) -> MetadataResult<()> {
            let result = sqlx::query(
                r#"
                INSERT INTO uploads (upload_uuid, org_id, sha256, chunk_size, chunk_list, created_at)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&upload.upload_uuid)
            .bind(&upload.org_id)
            .bind(&upload.sha256)
            .bind(upload.chunk_size)
            .bind(serde_json::to_string(&upload.chunk_list)?)
            .bind(upload.created_at)
            .execute(&self.pool)
            .await;

            match result {
                Ok(_) => Ok(()),
                Err(e) if is_unique_violation(&e) => Err(MetadataError::AlreadyExists(format!(
                    "upload {}",
                    upload.upload_uuid
                ))),
                Err(e) => Err(e.into()),
            }
        }

        async fn find_upload(
            &self,
            org_id: &str,
            sha256: &str,
            chunk_size: i64,
        ) -> MetadataResult<Option<UploadRow>> {
            let row = sqlx::query_as::<_, StoredUpload>(
                r#"
                SELECT * FROM uploads
                WHERE org_id = ? AND sha256 = ? AND chunk_size = ?
                ORDER BY created_at, upload_uuid
                LIMIT 1
                "#,
            )
            .bind(org_id)
            .bind(sha256)
            .bind(chunk_size)
            .fetch_optional(&self.pool)
            .await?;
            row.map(UploadRow::try_from).transpose()
        }

        async fn append_upload_chunk(
            &self,
            org_id: &str,
            upload_uuid: &str,
            chunk_sha256: &str,
        ) -> MetadataResult<bool> {
            let result = sqlx::query(
                r#"
                UPDATE uploads
                SET chunk_list = json_insert(chunk_list, '$[#]', ?3)
                WHERE org_id = ?1 AND upload_uuid = ?2
                  AND NOT EXISTS (
                      SELECT 1 FROM json_each(uploads.chunk_list) WHERE json_each.value = ?3
                  )
                "#,
            )
            .bind(org_id)
            .bind(upload_uuid)
            .bind(chunk_sha256)
            .execute(&self.pool)
            .await?;
            Ok(result.rows_affected() == 1)
        }

        async fn delete_upload(&self, upload_uuid: &str) -> MetadataResult<bool> {
            let result = sqlx::query("DELETE FROM uploads WHERE upload_uuid = ?")
                .bind(upload_uuid)
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected() > 0)
        }

        async fn list_uploads_created_before(
            &self,
            cutoff: OffsetDateTime,
        ) -> MetadataResult<Vec<UploadRow>> {
            let rows = sqlx::query_as::<_, StoredUpload>(
                "SELECT * FROM uploads WHERE created_at < ? ORDER BY created_at, upload_uuid",
            )
            .bind(cutoff)
            .fetch_all(&self.pool)
            .await?;
            rows.into_iter().map(UploadRow::try_from).collect()
        }
    }
}

const SCHEMA_SQL: &str = r#"
-- Repositories (shared across tenants, one row per normalized URL)
CREATE TABLE IF NOT EXISTS repositories (
    uuid BLOB PRIMARY KEY,
    url TEXT NOT NULL UNIQUE,
    last_introspection_status TEXT,
    last_introspection_time TEXT,
    last_introspection_error TEXT,
    package_count INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Per-tenant repository configurations
CREATE TABLE IF NOT EXISTS repository_configurations (
    uuid BLOB PRIMARY KEY,
    name TEXT NOT NULL,
    org_id TEXT NOT NULL,
    repository_uuid BLOB NOT NULL REFERENCES repositories(uuid) ON DELETE CASCADE,
    arch TEXT NOT NULL DEFAULT '',
    versions TEXT NOT NULL DEFAULT '[]',
    gpg_key TEXT NOT NULL DEFAULT '',
    metadata_verification INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE(name, org_id),
    UNIQUE(repository_uuid, org_id)
);
CREATE INDEX IF NOT EXISTS idx_repository_configurations_org ON repository_configurations(org_id);

-- Global content entities
CREATE TABLE IF NOT EXISTS packages (
    uuid BLOB PRIMARY KEY,
    name TEXT NOT NULL,
    arch TEXT NOT NULL,
    version TEXT NOT NULL,
    release TEXT NOT NULL DEFAULT '',
    epoch INTEGER NOT NULL DEFAULT 0,
    checksum TEXT NOT NULL UNIQUE,
    summary TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS package_groups (
    uuid BLOB PRIMARY KEY,
    id TEXT NOT NULL,
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    package_list TEXT NOT NULL DEFAULT '[]',
    created_at TEXT NOT NULL,
    UNIQUE(id, name)
);

CREATE TABLE IF NOT EXISTS environments (
    uuid BLOB PRIMARY KEY,
    id TEXT NOT NULL,
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    UNIQUE(id, name)
);

-- Repository associations
CREATE TABLE IF NOT EXISTS repositories_packages (
    repository_uuid BLOB NOT NULL REFERENCES repositories(uuid) ON DELETE CASCADE,
    package_uuid BLOB NOT NULL REFERENCES packages(uuid),
    PRIMARY KEY (repository_uuid, package_uuid)
);
CREATE INDEX IF NOT EXISTS idx_repositories_packages_package ON repositories_packages(package_uuid);

CREATE TABLE IF NOT EXISTS repositories_package_groups (
    repository_uuid BLOB NOT NULL REFERENCES repositories(uuid) ON DELETE CASCADE,
    package_group_uuid BLOB NOT NULL REFERENCES package_groups(uuid),
    PRIMARY KEY (repository_uuid, package_group_uuid)
);
CREATE INDEX IF NOT EXISTS idx_repositories_package_groups_group
    ON repositories_package_groups(package_group_uuid);

CREATE TABLE IF NOT EXISTS repositories_environments (
    repository_uuid BLOB NOT NULL REFERENCES repositories(uuid) ON DELETE CASCADE,
    environment_uuid BLOB NOT NULL REFERENCES environments(uuid),
    PRIMARY KEY (repository_uuid, environment_uuid)
);
CREATE INDEX IF NOT EXISTS idx_repositories_environments_environment
    ON repositories_environments(environment_uuid);

-- Tenant storage domains
CREATE TABLE IF NOT EXISTS domains (
    org_id TEXT NOT NULL UNIQUE,
    domain_name TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);

-- Resumable uploads
CREATE TABLE IF NOT EXISTS uploads (
    upload_uuid TEXT PRIMARY KEY,
    org_id TEXT NOT NULL,
    sha256 TEXT NOT NULL,
    chunk_size INTEGER NOT NULL,
    chunk_list TEXT NOT NULL DEFAULT '[]',
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_uploads_natural_key ON uploads(org_id, sha256, chunk_size);
CREATE INDEX IF NOT EXISTS idx_uploads_created_at ON uploads(created_at);
"#;
