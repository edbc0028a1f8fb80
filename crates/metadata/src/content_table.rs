//! Static table descriptors for the three content kinds.
//!
//! Every SQL identifier used by the content repositories comes from the
//! descriptors below; nothing caller-supplied is ever interpolated into SQL.

use crate::error::MetadataResult;
use reposync_core::{ContentItem, ContentKind, Environment, NaturalKey, Package, PackageGroup};

/// Bound parameters one PostgreSQL statement can carry (wire protocol limit).
pub const POSTGRES_MAX_BIND_PARAMS: usize = 65_535;

/// Bound parameters one SQLite statement can carry (`SQLITE_MAX_VARIABLE_NUMBER`
/// default since 3.32).
pub const SQLITE_MAX_BIND_PARAMS: usize = 32_766;

/// Rows of a per-row bound statement that fit in `max_params`, capped at `batch_size`.
pub fn rows_per_statement(batch_size: usize, params_per_row: usize, max_params: usize) -> usize {
    batch_size
        .min(max_params / params_per_row.max(1))
        .max(1)
}

/// Table layout of one content kind.
#[derive(Debug)]
pub struct ContentTable {
    pub kind: ContentKind,
    /// Global entity table.
    pub entity_table: &'static str,
    /// Columns forming the natural key, in `NaturalKey` order.
    pub key_columns: &'static [&'static str],
    /// Repository association table.
    pub association_table: &'static str,
    /// Column of the association table referencing the entity uuid.
    pub association_column: &'static str,
    /// Descriptive columns written on insert, in `ContentRow::values` order.
    /// `uuid` and `created_at` are supplied by the store.
    pub insert_columns: &'static [&'static str],
}

static PACKAGES: ContentTable = ContentTable {
    kind: ContentKind::Package,
    entity_table: "packages",
    key_columns: &["checksum"],
    association_table: "repositories_packages",
    association_column: "package_uuid",
    insert_columns: &[
        "name", "arch", "version", "release", "epoch", "checksum", "summary",
    ],
};

static PACKAGE_GROUPS: ContentTable = ContentTable {
    kind: ContentKind::PackageGroup,
    entity_table: "package_groups",
    key_columns: &["id", "name"],
    association_table: "repositories_package_groups",
    association_column: "package_group_uuid",
    insert_columns: &["id", "name", "description", "package_list"],
};

static ENVIRONMENTS: ContentTable = ContentTable {
    kind: ContentKind::Environment,
    entity_table: "environments",
    key_columns: &["id", "name"],
    association_table: "repositories_environments",
    association_column: "environment_uuid",
    insert_columns: &["id", "name", "description"],
};

impl ContentTable {
    pub fn for_kind(kind: ContentKind) -> &'static ContentTable {
        match kind {
            ContentKind::Package => &PACKAGES,
            ContentKind::PackageGroup => &PACKAGE_GROUPS,
            ContentKind::Environment => &ENVIRONMENTS,
        }
    }

    /// Comma-separated key column list for SELECT clauses.
    pub fn key_select(&self) -> String {
        self.key_columns.join(", ")
    }

    /// Number of natural keys in one lookup binding at most `lookup_batch_size`
    /// parameters, never past `max_params`.
    pub fn keys_per_lookup(&self, lookup_batch_size: usize, max_params: usize) -> usize {
        (lookup_batch_size.min(max_params) / self.key_columns.len()).max(1)
    }

    /// Rows of one multi-row entity insert. Each row binds `uuid`, the
    /// descriptive columns and `created_at`.
    pub fn rows_per_insert(&self, batch_size: usize, max_params: usize) -> usize {
        rows_per_statement(batch_size, self.insert_columns.len() + 2, max_params)
    }

    /// Rebuild a natural key from the key column values of one row.
    pub fn key_from_columns(&self, mut columns: Vec<String>) -> NaturalKey {
        if self.key_columns.len() == 1 {
            NaturalKey::Checksum(columns.swap_remove(0))
        } else {
            let name = columns.pop().unwrap_or_default();
            let id = columns.pop().unwrap_or_default();
            NaturalKey::IdName { id, name }
        }
    }
}

/// The bound parts of a natural key, in `key_columns` order.
pub fn key_parts(key: &NaturalKey) -> Vec<&str> {
    match key {
        NaturalKey::Checksum(checksum) => vec![checksum.as_str()],
        NaturalKey::IdName { id, name } => vec![id.as_str(), name.as_str()],
    }
}

/// A single bound column value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnValue {
    Text(String),
    Integer(i64),
}

/// One entity row ready for insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRow {
    pub key: NaturalKey,
    pub values: Vec<ColumnValue>,
}

/// A crawled item that knows how to lay itself out as an entity row.
pub trait ContentRecord: ContentItem {
    fn column_values(&self) -> MetadataResult<Vec<ColumnValue>>;

    fn to_row(&self) -> MetadataResult<ContentRow> {
        Ok(ContentRow {
            key: self.natural_key(),
            values: self.column_values()?,
        })
    }
}

impl ContentRecord for Package {
    fn column_values(&self) -> MetadataResult<Vec<ColumnValue>> {
        Ok(vec![
            ColumnValue::Text(self.name.clone()),
            ColumnValue::Text(self.arch.clone()),
            ColumnValue::Text(self.version.clone()),
            ColumnValue::Text(self.release.clone()),
            ColumnValue::Integer(i64::from(self.epoch)),
            ColumnValue::Text(self.checksum.clone()),
            ColumnValue::Text(self.summary.clone()),
        ])
    }
}

impl ContentRecord for PackageGroup {
    fn column_values(&self) -> MetadataResult<Vec<ColumnValue>> {
        Ok(vec![
            ColumnValue::Text(self.id.clone()),
            ColumnValue::Text(self.name.clone()),
            ColumnValue::Text(self.description.clone()),
            ColumnValue::Text(serde_json::to_string(&self.package_list)?),
        ])
    }
}

impl ContentRecord for Environment {
    fn column_values(&self) -> MetadataResult<Vec<ColumnValue>> {
        Ok(vec![
            ColumnValue::Text(self.id.clone()),
            ColumnValue::Text(self.name.clone()),
            ColumnValue::Text(self.description.clone()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptors_line_up_with_records() {
        let pkg = Package {
            name: "bash".to_string(),
            arch: "x86_64".to_string(),
            version: "5.1".to_string(),
            release: "2".to_string(),
            epoch: 1,
            checksum: "c0ffee".to_string(),
            summary: String::new(),
        };
        let row = pkg.to_row().unwrap();
        let table = ContentTable::for_kind(ContentKind::Package);
        assert_eq!(row.values.len(), table.insert_columns.len());
        assert_eq!(row.values[4], ColumnValue::Integer(1));

        let group = PackageGroup {
            id: "core".to_string(),
            name: "Core".to_string(),
            description: String::new(),
            package_list: vec!["bash".to_string()],
        };
        let row = group.to_row().unwrap();
        let table = ContentTable::for_kind(ContentKind::PackageGroup);
        assert_eq!(row.values.len(), table.insert_columns.len());
        assert_eq!(row.values[3], ColumnValue::Text(r#"["bash"]"#.to_string()));
    }

    #[test]
    fn test_key_columns_round_trip() {
        let table = ContentTable::for_kind(ContentKind::Environment);
        let key = NaturalKey::id_name("minimal", "Minimal Install");
        let parts: Vec<String> = key_parts(&key).into_iter().map(String::from).collect();
        assert_eq!(table.key_from_columns(parts), key);

        let table = ContentTable::for_kind(ContentKind::Package);
        let key = NaturalKey::Checksum("abc".to_string());
        assert_eq!(table.key_from_columns(vec!["abc".to_string()]), key);
    }

    #[test]
    fn test_keys_per_lookup_accounts_for_composite_keys() {
        let packages = ContentTable::for_kind(ContentKind::Package);
        let groups = ContentTable::for_kind(ContentKind::PackageGroup);
        assert_eq!(packages.keys_per_lookup(900, SQLITE_MAX_BIND_PARAMS), 900);
        assert_eq!(groups.keys_per_lookup(900, SQLITE_MAX_BIND_PARAMS), 450);
        assert_eq!(groups.keys_per_lookup(1, SQLITE_MAX_BIND_PARAMS), 1);
        assert_eq!(
            groups.keys_per_lookup(1_000_000, SQLITE_MAX_BIND_PARAMS),
            SQLITE_MAX_BIND_PARAMS / 2
        );
    }

    #[test]
    fn test_rows_per_insert_stays_under_bind_limit() {
        let packages = ContentTable::for_kind(ContentKind::Package);
        assert_eq!(packages.rows_per_insert(1000, POSTGRES_MAX_BIND_PARAMS), 1000);

        // 7 descriptive columns plus uuid and created_at.
        let rows = packages.rows_per_insert(30_000, POSTGRES_MAX_BIND_PARAMS);
        assert_eq!(rows, POSTGRES_MAX_BIND_PARAMS / 9);
        assert!(rows * 9 <= POSTGRES_MAX_BIND_PARAMS);

        let rows = packages.rows_per_insert(30_000, SQLITE_MAX_BIND_PARAMS);
        assert!(rows * 9 <= SQLITE_MAX_BIND_PARAMS);

        let environments = ContentTable::for_kind(ContentKind::Environment);
        assert_eq!(environments.rows_per_insert(0, SQLITE_MAX_BIND_PARAMS), 1);
    }

    #[test]
    fn test_rows_per_statement() {
        assert_eq!(rows_per_statement(10, 2, 100), 10);
        assert_eq!(rows_per_statement(100, 2, 100), 50);
        assert_eq!(rows_per_statement(100, 1, 99), 99);
        assert_eq!(rows_per_statement(0, 2, 100), 1);
    }
}
