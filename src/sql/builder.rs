//! Builds parameterized INSERT, SELECT, UPDATE, DELETE from a resolved table.

use crate::config::{ResolvedTable, RowKey};
use serde_json::Value;

/// Quote identifier for SQLite (safe: only from config).
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) -> String {
        self.params.push(v);
        format!("?{}", self.params.len())
    }

    fn where_key(&mut self, key: &RowKey) -> String {
        key.parts
            .iter()
            .map(|(col, v)| {
                let ph = self.push_param(v.clone());
                format!("{} = {}", quoted(col), ph)
            })
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    fn where_filters(&mut self, table: &ResolvedTable, filters: &[(String, Value)]) -> String {
        let parts: Vec<String> = filters
            .iter()
            .filter(|(col, _)| table.column(col).is_some())
            .map(|(col, v)| {
                let ph = self.push_param(v.clone());
                format!("{} = {}", quoted(col), ph)
            })
            .collect();
        if parts.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", parts.join(" AND "))
        }
    }
}

fn column_list(table: &ResolvedTable) -> String {
    table
        .columns
        .iter()
        .map(|c| quoted(&c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

fn order_by_pk(table: &ResolvedTable) -> String {
    table
        .pk_columns
        .iter()
        .map(|c| quoted(c))
        .collect::<Vec<_>>()
        .join(", ")
}

/// SELECT list with optional filters (exact match per column), ORDER BY pk, optional LIMIT/OFFSET.
/// Filters on unknown columns are ignored.
pub fn select_list(
    table: &ResolvedTable,
    filters: &[(String, Value)],
    limit: Option<u32>,
    offset: Option<u32>,
) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = q.where_filters(table, filters);
    let limit_clause = match (limit, offset) {
        (Some(l), Some(o)) => format!(" LIMIT {} OFFSET {}", l, o),
        (Some(l), None) => format!(" LIMIT {}", l),
        (None, Some(o)) => format!(" LIMIT -1 OFFSET {}", o),
        (None, None) => String::new(),
    };
    q.sql = format!(
        "SELECT {} FROM {}{} ORDER BY {}{}",
        column_list(table),
        quoted(&table.name),
        where_clause,
        order_by_pk(table),
        limit_clause
    );
    q
}

/// SELECT COUNT(*) with the same filters as [`select_list`].
pub fn count(table: &ResolvedTable, filters: &[(String, Value)]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = q.where_filters(table, filters);
    q.sql = format!("SELECT COUNT(*) FROM {}{}", quoted(&table.name), where_clause);
    q
}

/// SELECT one row by primary key.
pub fn select_by_key(table: &ResolvedTable, key: &RowKey) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = q.where_key(key);
    q.sql = format!(
        "SELECT {} FROM {} WHERE {}",
        column_list(table),
        quoted(&table.name),
        where_clause
    );
    q
}

/// INSERT the given known columns. With no values the row is built from defaults.
pub fn insert(table: &ResolvedTable, values: &[(String, Value)]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for (name, v) in values {
        if table.column(name).is_none() {
            continue;
        }
        cols.push(quoted(name));
        placeholders.push(q.push_param(v.clone()));
    }
    q.sql = if cols.is_empty() {
        format!(
            "INSERT INTO {} DEFAULT VALUES RETURNING {}",
            quoted(&table.name),
            column_list(table)
        )
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            quoted(&table.name),
            cols.join(", "),
            placeholders.join(", "),
            column_list(table)
        )
    };
    q
}

/// UPDATE by key: SET only the given known non-key columns.
/// Returns `None` when nothing is left to set.
pub fn update(table: &ResolvedTable, key: &RowKey, changes: &[(String, Value)]) -> Option<QueryBuf> {
    let mut q = QueryBuf::new();
    let sets: Vec<String> = changes
        .iter()
        .filter(|(name, _)| table.column(name).map(|c| !c.primary_key).unwrap_or(false))
        .map(|(name, v)| {
            let ph = q.push_param(v.clone());
            format!("{} = {}", quoted(name), ph)
        })
        .collect();
    if sets.is_empty() {
        return None;
    }
    let where_clause = q.where_key(key);
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} RETURNING {}",
        quoted(&table.name),
        sets.join(", "),
        where_clause,
        column_list(table)
    );
    Some(q)
}

/// DELETE by key.
pub fn delete(table: &ResolvedTable, key: &RowKey) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = q.where_key(key);
    q.sql = format!(
        "DELETE FROM {} WHERE {} RETURNING {}",
        quoted(&table.name),
        where_clause,
        column_list(table)
    );
    q
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::user_table;
    use serde_json::json;

    fn key(id: i64) -> RowKey {
        RowKey {
            parts: vec![("id".into(), json!(id))],
        }
    }

    #[test]
    fn list_with_filters_and_paging() {
        let t = user_table();
        let q = select_list(
            &t,
            &[("name".into(), json!("bob")), ("bogus".into(), json!(1))],
            Some(10),
            Some(20),
        );
        assert_eq!(
            q.sql,
            r#"SELECT "id", "name" FROM "user" WHERE "name" = ?1 ORDER BY "id" LIMIT 10 OFFSET 20"#
        );
        assert_eq!(q.params, vec![json!("bob")]);
    }

    #[test]
    fn update_skips_key_and_unknown_columns() {
        let t = user_table();
        let q = update(
            &t,
            &key(3),
            &[("id".into(), json!(9)), ("name".into(), json!("x")), ("zzz".into(), json!(1))],
        )
        .unwrap();
        assert_eq!(
            q.sql,
            r#"UPDATE "user" SET "name" = ?1 WHERE "id" = ?2 RETURNING "id", "name""#
        );
        assert_eq!(q.params, vec![json!("x"), json!(3)]);
        assert!(update(&t, &key(3), &[("id".into(), json!(9))]).is_none());
    }

    #[test]
    fn insert_and_delete() {
        let t = user_table();
        let q = insert(&t, &[("name".into(), json!("x"))]);
        assert_eq!(q.sql, r#"INSERT INTO "user" ("name") VALUES (?1) RETURNING "id", "name""#);
        let q = insert(&t, &[]);
        assert!(q.sql.contains("DEFAULT VALUES"));
        let q = delete(&t, &key(1));
        assert_eq!(q.sql, r#"DELETE FROM "user" WHERE "id" = ?1 RETURNING "id", "name""#);
    }

    #[test]
    fn quotes_identifiers() {
        assert_eq!(quoted(r#"we"ird"#), r#""we""ird""#);
    }
}
