//! PostgreSQL-based metadata store implementation.

use crate::content_table::{
    ColumnValue, ContentRow, ContentTable, POSTGRES_MAX_BIND_PARAMS, key_parts,
};
use crate::error::{MetadataError, MetadataResult, is_unique_violation};
use crate::models::*;
use crate::repos::{ContentRepo, DomainRepo, RepositoryConfigRepo, RepositoryRepo, UploadRepo};
use crate::store::MetadataStore;
use async_trait::async_trait;
use reposync_core::config::PgSslMode;
use reposync_core::{ContentKind, NaturalKey, normalize_repository_url};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode as SqlxPgSslMode};
use sqlx::{FromRow, Pool, Postgres, QueryBuilder, Row};
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use time::OffsetDateTime;
use uuid::Uuid;

/// PostgreSQL schema (embedded).
const POSTGRES_SCHEMA: &str = include_str!("postgres_schema.sql");

fn postgres_schema_statements(schema: &str) -> Vec<&str> {
    schema
        .split(';')
        .filter_map(|statement| {
            let trimmed = statement.trim();
            if trimmed.is_empty() {
                return None;
            }
            let has_sql = trimmed.lines().any(|line| {
                let line = line.trim();
                !line.is_empty() && !line.starts_with("--")
            });
            has_sql.then_some(trimmed)
        })
        .collect()
}

/// PostgreSQL-based metadata store.
pub struct PostgresStore {
    pool: Pool<Postgres>,
}

impl PostgresStore {
    /// Create a new PostgreSQL store from a connection URL.
    pub async fn from_url(
        url: &str,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> MetadataResult<Self> {
        let opts = PgConnectOptions::from_str(url)?;
        Self::connect(opts, max_connections, statement_timeout_ms).await
    }

    /// Create a new PostgreSQL store from individual connection parameters.
    ///
    /// This allows credentials to be passed separately, e.g. the password via
    /// `REPOSYNC_METADATA__PASSWORD`.
    #[allow(clippy::too_many_arguments)]
    pub async fn from_params(
        host: &str,
        port: u16,
        username: Option<&str>,
        password: Option<&str>,
        database: &str,
        ssl_mode: Option<PgSslMode>,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> MetadataResult<Self> {
        let mut opts = PgConnectOptions::new()
            .host(host)
            .port(port)
            .database(database);

        if let Some(user) = username {
            opts = opts.username(user);
        }

        if let Some(pass) = password {
            opts = opts.password(pass);
        }

        if let Some(mode) = ssl_mode {
            let sqlx_mode = match mode {
                PgSslMode::Disable => SqlxPgSslMode::Disable,
                PgSslMode::Prefer => SqlxPgSslMode::Prefer,
                PgSslMode::Require => SqlxPgSslMode::Require,
            };
            opts = opts.ssl_mode(sqlx_mode);
        }

        // Log connection info without password
        tracing::info!(
            host = host,
            port = port,
            database = database,
            username = username.unwrap_or("<none>"),
            ssl_mode = ?ssl_mode,
            "Connecting to PostgreSQL with individual parameters"
        );

        Self::connect(opts, max_connections, statement_timeout_ms).await
    }

    async fn connect(
        mut opts: PgConnectOptions,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> MetadataResult<Self> {
        if let Some(timeout_ms) = statement_timeout_ms {
            opts = opts.options([("statement_timeout", format!("{}ms", timeout_ms))]);
            tracing::info!("PostgreSQL statement_timeout set to {}ms", timeout_ms);
        }

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;

        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

#[async_trait]
impl MetadataStore for PostgresStore {
    async fn migrate(&self) -> MetadataResult<()> {
        // PostgreSQL doesn't allow multiple statements in a single prepared statement,
        // so we split the schema and execute each statement separately.
        for statement in postgres_schema_statements(POSTGRES_SCHEMA) {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Append `<key columns> IN (...)` for a batch of natural keys.
fn push_key_filter(qb: &mut QueryBuilder<'_, Postgres>, table: &ContentTable, keys: &[NaturalKey]) {
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

fn push_uuid_list(qb: &mut QueryBuilder<'_, Postgres>, uuids: &[Uuid]) {
    qb.push("(");
    let mut list = qb.separated(", ");
    for uuid in uuids {
        list.push_bind(*uuid);
    }
    qb.push(")");
}

#[async_trait]
impl RepositoryRepo for PostgresStore {
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
            VALUES ($1, $2, 0, $3, $3)
            ON CONFLICT (url) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&url)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get_repository_by_url(&url).await?.ok_or_else(|| {
            MetadataError::Internal(format!("repository for {url} vanished after insert"))
        })
    }

    async fn get_repository(&self, uuid: Uuid) -> MetadataResult<Option<RepositoryRow>> {
        let row = sqlx::query_as::<_, RepositoryRow>("SELECT * FROM repositories WHERE uuid = $1")
            .bind(uuid)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn get_repository_by_url(&self, url: &str) -> MetadataResult<Option<RepositoryRow>> {
        let row = sqlx::query_as::<_, RepositoryRow>("SELECT * FROM repositories WHERE url = $1")
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
            SET last_introspection_status = $1,
                last_introspection_time = $2,
                last_introspection_error = $3,
                package_count = COALESCE($4, package_count),
                updated_at = $5
            WHERE uuid = $6
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
impl RepositoryConfigRepo for PostgresStore {
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
        let now = OffsetDateTime::now_utc();

        let result = sqlx::query_as::<_, RepositoryConfigRow>(
            r#"
            INSERT INTO repository_configurations (
                uuid, name, org_id, repository_uuid, arch, versions,
                gpg_key, metadata_verification, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&config.name)
        .bind(&config.org_id)
        .bind(repository.uuid)
        .bind(&config.arch)
        .bind(serde_json::to_string(&config.versions)?)
        .bind(&config.gpg_key)
        .bind(config.metadata_verification)
        .bind(now)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(row),
            Err(e) if is_unique_violation(&e) => Err(MetadataError::AlreadyExists(format!(
                "repository configuration '{}' ({}) for org {}",
                config.name, repository.url, config.org_id
            ))),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_repository_config(
        &self,
        uuid: Uuid,
    ) -> MetadataResult<Option<RepositoryConfigRow>> {
        let row = sqlx::query_as::<_, RepositoryConfigRow>(
            "SELECT * FROM repository_configurations WHERE uuid = $1",
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
            "SELECT * FROM repository_configurations WHERE org_id = $1 ORDER BY name",
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
        let mut qb = QueryBuilder::<Postgres>::new(
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
        let mut qb = QueryBuilder::<Postgres>::new(
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
            WHERE r.url = $1
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
impl ContentRepo for PostgresStore {
    async fn content_uuids(
        &self,
        kind: ContentKind,
        keys: &[NaturalKey],
        lookup_batch_size: usize,
    ) -> MetadataResult<HashMap<NaturalKey, Uuid>> {
        let table = ContentTable::for_kind(kind);
        let mut result = HashMap::with_capacity(keys.len());

        let per_lookup = table.keys_per_lookup(lookup_batch_size, POSTGRES_MAX_BIND_PARAMS);
        for batch in keys.chunks(per_lookup) {
            let mut qb = QueryBuilder::<Postgres>::new(format!(
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
        let mut inserted = 0;

        let per_insert = table.rows_per_insert(batch_size, POSTGRES_MAX_BIND_PARAMS);
        for batch in rows.chunks(per_insert) {
            let mut qb = QueryBuilder::<Postgres>::new(format!(
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

        Ok(inserted)
    }

    async fn associated_uuids(
        &self,
        kind: ContentKind,
        repository_uuid: Uuid,
    ) -> MetadataResult<HashSet<Uuid>> {
        let table = ContentTable::for_kind(kind);
        let sql = format!(
            "SELECT {} FROM {} WHERE repository_uuid = $1",
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
        for batch in content_uuids.chunks(batch_size.max(1)) {
            let result = sqlx::query(&format!(
                "DELETE FROM {} WHERE repository_uuid = $1 AND {} = ANY($2)",
                table.association_table, table.association_column
            ))
            .bind(repository_uuid)
            .bind(batch)
            .execute(&self.pool)
            .await?;
            deleted += result.rows_affected();
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
        let mut inserted = 0;
        for batch in content_uuids.chunks(batch_size.max(1)) {
            let result = sqlx::query(&format!(
                "INSERT INTO {} (repository_uuid, {}) \
                 SELECT $1, content_uuid FROM UNNEST($2::uuid[]) AS t(content_uuid) \
                 ON CONFLICT DO NOTHING",
                table.association_table, table.association_column
            ))
            .bind(repository_uuid)
            .bind(batch)
            .execute(&self.pool)
            .await?;
            inserted += result.rows_affected();
        }
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
        let sql = format!(
            "DELETE FROM {entity} e WHERE e.uuid = ANY($1) \
             AND NOT EXISTS (SELECT 1 FROM {assoc} a WHERE a.{column} = e.uuid)",
            entity = table.entity_table,
            assoc = table.association_table,
            column = table.association_column,
        );
        let mut deleted = 0;
        for batch in content_uuids.chunks(batch_size.max(1)) {
            let result = sqlx::query(&sql).bind(batch).execute(&self.pool).await?;
            deleted += result.rows_affected();
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
             WHERE a.repository_uuid = $1",
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
            "SELECT COUNT(*) FROM {} WHERE repository_uuid = $1",
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
impl DomainRepo for PostgresStore {
    async fn insert_domain(&self, org_id: &str, domain_name: &str) -> MetadataResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO domains (org_id, domain_name, created_at)
            VALUES ($1, $2, $3)
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
            sqlx::query_scalar("SELECT domain_name FROM domains WHERE org_id = $1")
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

/// Upload row as stored in PostgreSQL, with `chunk_list` as `text[]`.
#[derive(FromRow)]
struct StoredUpload {
    upload_uuid: String,
    org_id: String,
    sha256: String,
    chunk_size: i64,
    chunk_list: Vec<String>,
    created_at: OffsetDateTime,
}

impl From<StoredUpload> for UploadRow {
    fn from(row: StoredUpload) -> Self {
        UploadRow {
            upload_uuid: row.upload_uuid,
            org_id: row.org_id,
            sha256: row.sha256,
            chunk_size: row.chunk_size,
            chunk_list: row.chunk_list,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl UploadRepo for PostgresStore {
    async fn insert_upload(&self, upload: &UploadRow) -> MetadataResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO uploads (upload_uuid, org_id, sha256, chunk_size, chunk_list, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&upload.upload_uuid)
        .bind(&upload.org_id)
        .bind(&upload.sha256)
        .bind(upload.chunk_size)
        .bind(&upload.chunk_list)
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
            WHERE org_id = $1 AND sha256 = $2 AND chunk_size = $3
            ORDER BY created_at, upload_uuid
            LIMIT 1
            "#,
        )
        .bind(org_id)
        .bind(sha256)
        .bind(chunk_size)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(UploadRow::from))
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
            SET chunk_list = array_append(chunk_list, $3)
            WHERE org_id = $1 AND upload_uuid = $2 AND $3 <> ALL(chunk_list)
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
        let result = sqlx::query("DELETE FROM uploads WHERE upload_uuid = $1")
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
            "SELECT * FROM uploads WHERE created_at < $1 ORDER BY created_at, upload_uuid",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(UploadRow::from).collect())
    }
}
