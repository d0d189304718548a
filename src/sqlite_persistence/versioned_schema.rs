use anyhow::{bail, Result};
use rusqlite::{params, types::Type, Connection};

pub const DEFAULT_TIMESTAMP: &str = "(cast(strftime('%s','now') as int))";

pub const BASE_DB_VERSION: usize = 99999;

#[macro_export]
macro_rules! sqlite_column {
    ($name:expr, $sql_type:expr $(, $field:ident = $value:expr)*) => {
        {
            // Only mutated when optional field assignments are passed.
            #[allow(unused_mut)]
            let mut column = Column {
                name: $name,
                sql_type: $sql_type,
                is_primary_key: false,
                non_null: false,
                is_unique: false,
                default_value: None,
                foreign_key: None,
            };
            $(
                column.$field = $value;
            )*
            column
        }
    };
}

#[derive(Debug, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Integer,
    Real,
    Blob,
}

impl SqlType {
    fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Text => "TEXT",
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
            SqlType::Blob => "BLOB",
        }
    }

    fn from_sql(s: &str) -> Option<&'static SqlType> {
        match s {
            "TEXT" => Some(&SqlType::Text),
            "INTEGER" => Some(&SqlType::Integer),
            "REAL" => Some(&SqlType::Real),
            "BLOB" => Some(&SqlType::Blob),
            _ => None,
        }
    }
}

#[allow(unused)]
pub enum ForeignKeyOnChange {
    NoAction,
    Restrict,
    SetNull,
    SetDefault,
    Cascade,
}

impl ForeignKeyOnChange {
    fn as_sql(&self) -> &'static str {
        match self {
            ForeignKeyOnChange::NoAction => "NO ACTION",
            ForeignKeyOnChange::Restrict => "RESTRICT",
            ForeignKeyOnChange::SetNull => "SET NULL",
            ForeignKeyOnChange::SetDefault => "SET DEFAULT",
            ForeignKeyOnChange::Cascade => "CASCADE",
        }
    }
}

pub struct ForeignKey {
    pub foreign_table: &'static str,
    pub foreign_column: &'static str,
    pub on_delete: ForeignKeyOnChange,
}

pub struct Column<'a, S: AsRef<str>> {
    pub name: S,
    pub sql_type: &'a SqlType,
    pub is_primary_key: bool,
    pub non_null: bool,
    pub is_unique: bool,
    pub default_value: Option<S>,
    pub foreign_key: Option<&'a ForeignKey>,
}

impl<S: AsRef<str>> Column<'_, S> {
    fn definition_sql(&self) -> String {
        let mut sql = format!("{} {}", self.name.as_ref(), self.sql_type.as_sql());
        if self.is_primary_key {
            sql.push_str(" PRIMARY KEY");
        }
        if self.non_null {
            sql.push_str(" NOT NULL");
        }
        if self.is_unique {
            sql.push_str(" UNIQUE");
        }
        if let Some(default_value) = &self.default_value {
            sql.push_str(&format!(" DEFAULT {}", default_value.as_ref()));
        }
        if let Some(fk) = self.foreign_key {
            sql.push_str(&format!(
                " REFERENCES {}({}) ON DELETE {}",
                fk.foreign_table,
                fk.foreign_column,
                fk.on_delete.as_sql()
            ));
        }
        sql
    }
}

pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column<'static, &'static str>],
    /// (index name, indexed columns)
    pub indices: &'static [(&'static str, &'static str)],
    pub unique_constraints: &'static [&'static [&'static str]],
}

impl Table {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        let mut definitions: Vec<String> =
            self.columns.iter().map(|c| c.definition_sql()).collect();
        for unique_constraint in self.unique_constraints {
            definitions.push(format!("UNIQUE ({})", unique_constraint.join(", ")));
        }
        conn.execute(
            &format!("CREATE TABLE {} ({});", self.name, definitions.join(", ")),
            params![],
        )?;

        for (index_name, columns) in self.indices {
            conn.execute(
                &format!("CREATE INDEX {} ON {}({});", index_name, self.name, columns),
                params![],
            )?;
        }
        Ok(())
    }

    fn validate(&self, conn: &Connection) -> Result<()> {
        self.validate_columns(conn)?;
        self.validate_indices(conn)?;
        self.validate_unique_constraints(conn)?;
        self.validate_foreign_keys(conn)
    }

    fn validate_columns(&self, conn: &Connection) -> Result<()> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({});", self.name))?;
        let actual_columns = stmt
            .query_map(params![], |row| {
                let sql_type = SqlType::from_sql(&row.get::<_, String>(2)?).ok_or_else(|| {
                    rusqlite::Error::InvalidColumnType(2, "type".to_string(), Type::Text)
                })?;
                Ok(Column {
                    name: row.get::<_, String>(1)?,
                    sql_type,
                    non_null: row.get::<_, i32>(3)? == 1,
                    default_value: row.get::<_, Option<String>>(4)?,
                    is_primary_key: row.get::<_, i32>(5)? == 1,
                    is_unique: false,
                    foreign_key: None,
                })
            })?
            .collect::<Result<Vec<Column<'_, String>>, _>>()?;

        if actual_columns.len() != self.columns.len() {
            bail!(
                "Table {} has {} columns, expected {}. Found: [{}], expected: [{}]",
                self.name,
                actual_columns.len(),
                self.columns.len(),
                actual_columns
                    .iter()
                    .map(|c| c.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                self.columns
                    .iter()
                    .map(|c| c.name)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        for (actual, expected) in actual_columns.iter().zip(self.columns.iter()) {
            if actual.name != expected.name {
                bail!(
                    "Table {} column name mismatch: expected {}, got {}",
                    self.name,
                    expected.name,
                    actual.name
                );
            }
            if actual.sql_type != expected.sql_type
                || actual.non_null != expected.non_null
                || actual.is_primary_key != expected.is_primary_key
            {
                bail!(
                    "Table {} column {} definition mismatch: expected `{}`",
                    self.name,
                    expected.name,
                    expected.definition_sql()
                );
            }
            // SQLite may report defaults wrapped in parentheses.
            let actual_default = actual.default_value.as_deref().map(strip_parentheses);
            let expected_default = expected.default_value.map(strip_parentheses);
            if actual_default != expected_default {
                bail!(
                    "Table {} column {} default value mismatch: expected {:?}, got {:?}",
                    self.name,
                    expected.name,
                    expected.default_value,
                    actual.default_value
                );
            }
        }
        Ok(())
    }

    fn validate_indices(&self, conn: &Connection) -> Result<()> {
        for (index_name, _) in self.indices {
            let exists = conn
                .prepare("SELECT 1 FROM sqlite_master WHERE type='index' AND name=?1 AND tbl_name=?2")?
                .exists(params![index_name, self.name])?;
            if !exists {
                bail!("Table {} is missing index '{}'", self.name, index_name);
            }
        }
        Ok(())
    }

    fn validate_unique_constraints(&self, conn: &Connection) -> Result<()> {
        if self.unique_constraints.is_empty() {
            return Ok(());
        }
        let unique_index_names: Vec<String> = conn
            .prepare(&format!("PRAGMA index_list({})", self.name))?
            .query_map([], |row| Ok((row.get::<_, String>(1)?, row.get::<_, i32>(2)?)))?
            .filter_map(|r| r.ok())
            .filter(|(_, is_unique)| *is_unique == 1)
            .map(|(name, _)| name)
            .collect();

        let mut unique_column_sets: Vec<Vec<String>> = Vec::new();
        for index_name in &unique_index_names {
            let mut cols: Vec<String> = conn
                .prepare(&format!("PRAGMA index_info({})", index_name))?
                .query_map([], |row| row.get::<_, String>(2))?
                .filter_map(|r| r.ok())
                .collect();
            cols.sort();
            unique_column_sets.push(cols);
        }

        for expected in self.unique_constraints {
            let mut expected_sorted: Vec<&str> = expected.to_vec();
            expected_sorted.sort();
            let found = unique_column_sets.iter().any(|actual| {
                actual.iter().map(String::as_str).collect::<Vec<_>>() == expected_sorted
            });
            if !found {
                bail!(
                    "Table {} is missing unique constraint on columns ({})",
                    self.name,
                    expected.join(", ")
                );
            }
        }
        Ok(())
    }

    fn validate_foreign_keys(&self, conn: &Connection) -> Result<()> {
        // PRAGMA foreign_key_list: id, seq, table, from, to, on_update, on_delete, match
        let actual_fks: Vec<(String, String, String, String)> = conn
            .prepare(&format!("PRAGMA foreign_key_list({})", self.name))?
            .query_map([], |row| {
                Ok((row.get(3)?, row.get(2)?, row.get(4)?, row.get(6)?))
            })?
            .filter_map(|r| r.ok())
            .collect();

        for column in self.columns {
            let Some(expected) = column.foreign_key else {
                continue;
            };
            let expected_on_delete = expected.on_delete.as_sql();
            let matching = actual_fks.iter().find(|(from, ..)| from == column.name);
            match matching {
                Some((_, table, to, on_delete))
                    if table == expected.foreign_table
                        && to == expected.foreign_column
                        && on_delete == expected_on_delete => {}
                Some((_, table, to, on_delete)) => bail!(
                    "Table {} column {} has foreign key mismatch: expected REFERENCES {}({}) ON DELETE {}, got REFERENCES {}({}) ON DELETE {}",
                    self.name,
                    column.name,
                    expected.foreign_table,
                    expected.foreign_column,
                    expected_on_delete,
                    table,
                    to,
                    on_delete
                ),
                None => bail!(
                    "Table {} column {} is missing foreign key: expected REFERENCES {}({}) ON DELETE {}",
                    self.name,
                    column.name,
                    expected.foreign_table,
                    expected.foreign_column,
                    expected_on_delete
                ),
            }
        }
        Ok(())
    }
}

pub struct VersionedSchema {
    pub version: usize,
    pub tables: &'static [Table],
    pub migration: Option<fn(&Connection) -> Result<()>>,
}

fn strip_parentheses(s: &str) -> &str {
    s.strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .unwrap_or(s)
}

impl VersionedSchema {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        conn.execute("PRAGMA foreign_keys = ON;", params![])?;
        for table in self.tables {
            table.create(conn)?;
        }
        conn.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + self.version),
            [],
        )?;
        Ok(())
    }

    pub fn validate(&self, conn: &Connection) -> Result<()> {
        for table in self.tables {
            table.validate(conn)?;
        }
        Ok(())
    }
}
