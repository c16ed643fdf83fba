//! CRUD dispatcher: resolves the routed table and row key, then runs one admin action.

use crate::config::{ResolvedModel, ResolvedTable, RowKey};
use crate::error::AppError;
use crate::pk::{pk_list_to_dict, selected_item_tokens};
use crate::record::{update_difference_object, Record};
use crate::service::{coerce_token, form_values, CrudService, RequestValidator};
use serde_json::Value;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;

/// Table registered in the model map, matched case-insensitively.
pub fn get_table(model: &ResolvedModel, name: &str) -> Option<Arc<ResolvedTable>> {
    model.get_table(name)
}

/// Page of rows for the list view.
#[derive(Debug)]
pub struct ListPage {
    pub rows: Vec<Record>,
    pub page: u32,
    pub pages: u32,
    pub total: u64,
    /// Active column filters, carried into pagination links.
    pub filters: Vec<(String, Value)>,
}

/// List view query string: `page` plus exact-match column filters.
#[derive(Debug, Default)]
pub struct ListQuery {
    pub page: u32,
    pub filters: Vec<(String, Value)>,
}

impl ListQuery {
    pub fn from_params(table: &ResolvedTable, params: &HashMap<String, String>) -> Self {
        let mut query = ListQuery {
            page: 1,
            filters: Vec::new(),
        };
        for (k, v) in params {
            if k == "page" {
                query.page = v.parse().ok().filter(|p| *p > 0).unwrap_or(1);
            } else if let Some(col) = table.column(k) {
                let raw = Value::String(v.clone());
                let val = coerce_token(col, &raw).unwrap_or(raw);
                query.filters.push((k.clone(), val));
            }
        }
        query.filters.sort_by(|a, b| a.0.cmp(&b.0));
        query
    }
}

#[derive(Debug)]
pub struct Crud {
    pub table: Arc<ResolvedTable>,
    pub key: Option<RowKey>,
}

impl Crud {
    /// Resolve `table_name` and decode `pk_tokens`. An unknown table, an odd
    /// token count, or a key that does not fit the table's primary key is NotFound.
    pub fn new(model: &ResolvedModel, table_name: &str, pk_tokens: &[String]) -> Result<Self, AppError> {
        let table = get_table(model, table_name)
            .ok_or_else(|| AppError::not_found(format!("table '{}' is not registered", table_name)))?;
        if pk_tokens.is_empty() {
            return Ok(Crud { table, key: None });
        }
        let pk = pk_list_to_dict(pk_tokens.iter().map(|t| Value::String(t.clone())))
            .ok_or_else(|| AppError::not_found(format!("odd primary key token count for '{}'", table.name)))?;
        let key = table
            .row_key(&pk)
            .ok_or_else(|| AppError::not_found(format!("primary key does not match '{}'", table.name)))?;
        Ok(Crud { table, key: Some(key) })
    }

    fn key(&self) -> Result<&RowKey, AppError> {
        self.key
            .as_ref()
            .ok_or_else(|| AppError::not_found(format!("no primary key given for '{}'", self.table.name)))
    }

    pub async fn list(&self, pool: &SqlitePool, query: &ListQuery, per_page: u32) -> Result<ListPage, AppError> {
        let per_page = per_page.max(1);
        let total = CrudService::count(pool, &self.table, &query.filters).await?;
        let pages = (total.div_ceil(per_page as u64)).max(1) as u32;
        let page = query.page.clamp(1, pages);
        let rows = CrudService::list(
            pool,
            &self.table,
            &query.filters,
            Some(per_page),
            Some((page - 1) * per_page),
        )
        .await?;
        Ok(ListPage {
            rows,
            page,
            pages,
            total,
            filters: query.filters.clone(),
        })
    }

    /// Bulk delete from `selected_item` values (JSON token lists such as `["id", 2]`).
    /// Any undecodable item fails the batch before anything is deleted.
    pub async fn delete_selected(&self, pool: &SqlitePool, items: &[String]) -> Result<u64, AppError> {
        let keys = items
            .iter()
            .map(|raw| {
                selected_item_tokens(raw)
                    .and_then(|pk| self.table.row_key(&pk))
                    .ok_or_else(|| AppError::not_found(format!("bad selected item {}", raw)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if keys.is_empty() {
            return Ok(0);
        }
        CrudService::delete_many(pool, &self.table, &keys).await
    }

    pub async fn create(&self, pool: &SqlitePool, fields: &[(String, String)]) -> Result<Record, AppError> {
        let values = form_values(&self.table, fields)?;
        let body: HashMap<String, Value> = values.iter().cloned().collect();
        for col in self.table.form_columns() {
            if !col.nullable && !col.has_default() && body.get(&col.name).map_or(true, Value::is_null) {
                return Err(AppError::Validation(format!("{} is required", col.label)));
            }
        }
        RequestValidator::validate(&body, &RequestValidator::rules(&self.table))?;
        CrudService::create(pool, &self.table, &values).await
    }

    pub async fn read(&self, pool: &SqlitePool) -> Result<Record, AppError> {
        let key = self.key()?;
        CrudService::read(pool, &self.table, key)
            .await?
            .ok_or_else(|| AppError::not_found(format!("no {} row {}", self.table.name, key.path())))
    }

    /// Merge submitted fields into the stored row and write only the columns that changed.
    pub async fn update(&self, pool: &SqlitePool, fields: &[(String, String)]) -> Result<Record, AppError> {
        let key = self.key()?;
        let mut record = self.read(pool).await?;
        let values = form_values(&self.table, fields)?;
        let mut changes = Vec::new();
        for (name, value) in values {
            if update_difference_object(&mut record, &name, value.clone()) {
                changes.push((name, value));
            }
        }
        let body: HashMap<String, Value> = changes.iter().cloned().collect();
        RequestValidator::validate_partial(&body, &RequestValidator::rules(&self.table))?;
        if changes.is_empty() {
            return Ok(record);
        }
        CrudService::update(pool, &self.table, key, &changes)
            .await?
            .ok_or_else(|| AppError::not_found(format!("no {} row {}", self.table.name, key.path())))
    }

    pub async fn delete(&self, pool: &SqlitePool) -> Result<Record, AppError> {
        let key = self.key()?;
        CrudService::delete(pool, &self.table, key)
            .await?
            .ok_or_else(|| AppError::not_found(format!("no {} row {}", self.table.name, key.path())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::model;

    fn tokens(t: &[&str]) -> Vec<String> {
        t.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn odd_primary_key_is_not_found() {
        let err = Crud::new(&model(), "user", &tokens(&["foo", "bar", "baz"])).unwrap_err();
        assert_eq!(err.to_string(), "The resource could not be found.");
    }

    #[test]
    fn unknown_table_is_not_found() {
        let err = Crud::new(&model(), "user666", &tokens(&["foo", "bar"])).unwrap_err();
        assert_eq!(err.to_string(), "The resource could not be found.");
    }

    #[test]
    fn key_must_match_table() {
        assert!(Crud::new(&model(), "user", &tokens(&["foo", "bar"])).is_err());
        assert!(Crud::new(&model(), "user", &tokens(&["id", "abc"])).is_err());
        let crud = Crud::new(&model(), "USER", &tokens(&["id", "7"])).unwrap();
        assert_eq!(crud.table.name, "user");
        assert_eq!(crud.key.unwrap().path(), "id/7");
        assert!(Crud::new(&model(), "user", &[]).unwrap().key.is_none());
    }

    #[test]
    fn list_query_parses_page_and_filters() {
        let m = model();
        let table = get_table(&m, "user").unwrap();
        let params = HashMap::from([
            ("page".to_string(), "3".to_string()),
            ("id".to_string(), "4".to_string()),
            ("nope".to_string(), "x".to_string()),
        ]);
        let q = ListQuery::from_params(&table, &params);
        assert_eq!(q.page, 3);
        assert_eq!(q.filters, vec![("id".to_string(), serde_json::json!(4))]);
    }
}
