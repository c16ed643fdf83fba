//! Generic CRUD execution against SQLite.

use crate::config::{ColumnType, ResolvedTable, RowKey};
use crate::error::AppError;
use crate::record::Record;
use crate::sql::{self, BindValue, QueryBuf};
use serde_json::{Map, Value};
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Sqlite, SqlitePool};

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

pub struct CrudService;

impl CrudService {
    /// List rows with optional filters (exact match), ordered by primary key.
    pub async fn list(
        pool: &SqlitePool,
        table: &ResolvedTable,
        filters: &[(String, Value)],
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<Vec<Record>, AppError> {
        let q = sql::select_list(table, filters, limit, offset);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let rows = bind(&q).fetch_all(pool).await?;
        rows.iter().map(|r| row_to_record(r, table)).collect()
    }

    pub async fn count(
        pool: &SqlitePool,
        table: &ResolvedTable,
        filters: &[(String, Value)],
    ) -> Result<u64, AppError> {
        let q = sql::count(table, filters);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query_scalar::<_, i64>(&q.sql);
        for p in &q.params {
            query = query.bind(BindValue::from_json(p));
        }
        let n = query.fetch_one(pool).await?;
        Ok(n.max(0) as u64)
    }

    /// Fetch one row by primary key.
    pub async fn read(pool: &SqlitePool, table: &ResolvedTable, key: &RowKey) -> Result<Option<Record>, AppError> {
        let q = sql::select_by_key(table, key);
        Self::fetch_optional(pool, table, &q).await
    }

    /// Insert one row. Returns created row.
    pub async fn create(
        pool: &SqlitePool,
        table: &ResolvedTable,
        values: &[(String, Value)],
    ) -> Result<Record, AppError> {
        let q = sql::insert(table, values);
        let row = Self::fetch_optional(pool, table, &q)
            .await?
            .ok_or(AppError::Db(sqlx::Error::RowNotFound))?;
        tracing::info!(table = %table.name, "row created");
        Ok(row)
    }

    /// Update the given columns of one row. Returns the updated row, or the
    /// current row unchanged when there is nothing to set.
    pub async fn update(
        pool: &SqlitePool,
        table: &ResolvedTable,
        key: &RowKey,
        changes: &[(String, Value)],
    ) -> Result<Option<Record>, AppError> {
        let Some(q) = sql::update(table, key, changes) else {
            return Self::read(pool, table, key).await;
        };
        let row = Self::fetch_optional(pool, table, &q).await?;
        if row.is_some() {
            tracing::info!(table = %table.name, key = %key.path(), "row updated");
        }
        Ok(row)
    }

    /// Delete one row. Returns deleted row or None.
    pub async fn delete(pool: &SqlitePool, table: &ResolvedTable, key: &RowKey) -> Result<Option<Record>, AppError> {
        let q = sql::delete(table, key);
        let row = Self::fetch_optional(pool, table, &q).await?;
        if row.is_some() {
            tracing::info!(table = %table.name, key = %key.path(), "row deleted");
        }
        Ok(row)
    }

    /// Delete every key in one transaction. Returns the number of rows removed.
    pub async fn delete_many(pool: &SqlitePool, table: &ResolvedTable, keys: &[RowKey]) -> Result<u64, AppError> {
        let mut tx = pool.begin().await?;
        let mut deleted = 0;
        for key in keys {
            let q = sql::delete(table, key);
            tracing::debug!(sql = %q.sql, params = ?q.params, "query (tx)");
            deleted += bind(&q).execute(&mut *tx).await?.rows_affected();
        }
        tx.commit().await?;
        tracing::info!(table = %table.name, requested = keys.len(), deleted, "bulk delete committed");
        Ok(deleted)
    }

    async fn fetch_optional(
        pool: &SqlitePool,
        table: &ResolvedTable,
        q: &QueryBuf,
    ) -> Result<Option<Record>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let row = bind(q).fetch_optional(pool).await?;
        row.map(|r| row_to_record(&r, table)).transpose()
    }
}

fn bind(q: &QueryBuf) -> SqliteQuery<'_> {
    let mut query = sqlx::query(&q.sql);
    for p in &q.params {
        query = query.bind(BindValue::from_json(p));
    }
    query
}

/// Decode by the value's storage class, then shape by the declared column type.
fn row_to_record(row: &SqliteRow, table: &ResolvedTable) -> Result<Record, AppError> {
    use sqlx::{Row, TypeInfo, ValueRef};
    let mut fields = Map::new();
    for (idx, col) in table.columns.iter().enumerate() {
        let raw = row.try_get_raw(idx)?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            let storage = raw.type_info().name().to_string();
            match storage.as_str() {
                "INTEGER" => Value::from(row.try_get::<i64, _>(idx)?),
                "REAL" => Value::from(row.try_get::<f64, _>(idx)?),
                "BLOB" => Value::String(format!("<{} bytes>", row.try_get::<Vec<u8>, _>(idx)?.len())),
                _ => Value::String(row.try_get::<String, _>(idx)?),
            }
        };
        fields.insert(col.name.clone(), shape(col.type_, value));
    }
    Ok(Record::new(fields))
}

fn shape(type_: ColumnType, value: Value) -> Value {
    match (type_, value) {
        (ColumnType::Boolean, Value::Number(n)) => Value::Bool(n.as_i64().unwrap_or(0) != 0),
        (ColumnType::Json, Value::String(s)) => serde_json::from_str(&s).unwrap_or(Value::String(s)),
        (_, v) => v,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn shapes_booleans_and_json() {
        assert_eq!(shape(ColumnType::Boolean, json!(1)), json!(true));
        assert_eq!(shape(ColumnType::Boolean, json!(0)), json!(false));
        assert_eq!(shape(ColumnType::Json, json!(r#"{"a":1}"#)), json!({"a": 1}));
        assert_eq!(shape(ColumnType::Json, json!("not json")), json!("not json"));
        assert_eq!(shape(ColumnType::Integer, json!(5)), json!(5));
    }
}
