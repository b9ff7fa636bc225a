//! Shared repository error type and SQL helpers.

use crate::db::DbError;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// SQL expression producing the store's ISO-8601 UTC timestamp.
pub(crate) const NOW_SQL: &str = "strftime('%Y-%m-%dT%H:%M:%fZ', 'now')";

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Connection was not migrated to a schema containing this table.
    MissingRequiredTable(&'static str),
    /// Persisted row cannot be decoded into a valid record.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::MissingRequiredTable(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Generates a fresh opaque row id.
pub(crate) fn new_record_id() -> String {
    Uuid::new_v4().to_string()
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

/// Decodes an enum text column, rejecting values outside the closed set.
pub(crate) fn parse_enum<T>(
    value: &str,
    column: &str,
    parse: impl FnOnce(&str) -> Option<T>,
) -> RepoResult<T> {
    parse(value)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid value `{value}` in {column}")))
}

/// Verifies that every table a repository depends on exists.
pub(crate) fn ensure_tables(conn: &Connection, tables: &[&'static str]) -> RepoResult<()> {
    for &table in tables {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

/// Collects `column = ?` assignments for partial updates.
///
/// `updated_at` is always appended, so an empty patch still touches the row.
#[derive(Debug, Default)]
pub(crate) struct Assignments {
    /// `None` binds the column to the store's current timestamp.
    entries: Vec<(&'static str, Option<Value>)>,
}

impl Assignments {
    pub(crate) fn text(&mut self, column: &'static str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value {
            self.entries
                .push((column, Some(Value::Text(value.to_string()))));
        }
        self
    }

    pub(crate) fn real(&mut self, column: &'static str, value: Option<f64>) -> &mut Self {
        if let Some(value) = value {
            self.entries.push((column, Some(Value::Real(value))));
        }
        self
    }

    pub(crate) fn integer(&mut self, column: &'static str, value: Option<i64>) -> &mut Self {
        if let Some(value) = value {
            self.entries.push((column, Some(Value::Integer(value))));
        }
        self
    }

    pub(crate) fn flag(&mut self, column: &'static str, value: Option<bool>) -> &mut Self {
        self.integer(column, value.map(bool_to_int))
    }

    /// Stamps `column` with the store's current timestamp.
    pub(crate) fn now(&mut self, column: &'static str) -> &mut Self {
        self.entries.push((column, None));
        self
    }

    /// Executes `UPDATE {table} SET ... WHERE id = ?` and returns the number
    /// of changed rows.
    pub(crate) fn execute(&mut self, conn: &Connection, table: &str, id: &str) -> RepoResult<usize> {
        self.now("updated_at");

        let mut fragments = Vec::with_capacity(self.entries.len());
        let mut bind_values: Vec<Value> = Vec::new();
        for (column, value) in self.entries.drain(..) {
            match value {
                Some(value) => {
                    fragments.push(format!("{column} = ?"));
                    bind_values.push(value);
                }
                None => fragments.push(format!("{column} = {NOW_SQL}")),
            }
        }
        bind_values.push(Value::Text(id.to_string()));

        let sql = format!("UPDATE {table} SET {} WHERE id = ?;", fragments.join(", "));
        let changed = conn.execute(&sql, params_from_iter(bind_values))?;
        Ok(changed)
    }
}

/// Runs a query expected to return at most one row.
pub(crate) fn query_one<T>(
    conn: &Connection,
    sql: &str,
    id: &str,
    parse: fn(&Row<'_>) -> RepoResult<T>,
) -> RepoResult<Option<T>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse(row)?));
    }
    Ok(None)
}

/// Runs a query and decodes every row.
pub(crate) fn query_all<T>(
    conn: &Connection,
    sql: &str,
    bind_values: Vec<Value>,
    parse: fn(&Row<'_>) -> RepoResult<T>,
) -> RepoResult<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(parse(row)?);
    }
    Ok(items)
}

/// Converts a read-back miss right after a write into an error.
pub(crate) fn load_required<T>(record: Option<T>, table: &str, id: &str) -> RepoResult<T> {
    record.ok_or_else(|| {
        RepoError::InvalidData(format!("row `{id}` missing from {table} after write"))
    })
}
