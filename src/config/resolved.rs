//! Resolved model: config validated and flattened for runtime use.

use crate::config::{ColumnType, ValidationRule};
use crate::pk::{encode_segment, token_repr, PkMap};
use crate::service::coerce_token;
use serde_json::Value;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct ColumnInfo {
    pub name: String,
    pub label: String,
    pub type_: ColumnType,
    pub primary_key: bool,
    pub nullable: bool,
    /// SQL default expression (e.g. CURRENT_TIMESTAMP).
    pub default: Option<String>,
    /// Foreign key target as (table, column).
    pub references: Option<(String, String)>,
    pub validation: Option<ValidationRule>,
}

impl ColumnInfo {
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

#[derive(Clone, Debug)]
pub struct ResolvedTable {
    pub name: String,
    pub label: String,
    pub columns: Vec<ColumnInfo>,
    pub pk_columns: Vec<String>,
    pub list_display: Vec<String>,
}

impl ResolvedTable {
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// A single integer primary key is assigned by SQLite when omitted.
    pub fn has_auto_pk(&self) -> bool {
        self.pk_columns.len() == 1
            && self
                .column(&self.pk_columns[0])
                .map(|c| c.type_ == ColumnType::Integer)
                .unwrap_or(false)
    }

    /// Columns rendered in the list view.
    pub fn list_columns(&self) -> Vec<&ColumnInfo> {
        if self.list_display.is_empty() {
            return self.columns.iter().collect();
        }
        self.list_display.iter().filter_map(|n| self.column(n)).collect()
    }

    /// Columns editable through the create/update form.
    pub fn form_columns(&self) -> impl Iterator<Item = &ColumnInfo> {
        let auto_pk = self.has_auto_pk();
        self.columns.iter().filter(move |c| !(auto_pk && c.primary_key))
    }

    /// Build a row key from decoded key/value tokens. The keys must be exactly
    /// this table's primary key columns and every value must parse as its column type.
    pub fn row_key(&self, pk: &PkMap<Value>) -> Option<RowKey> {
        if pk.len() != self.pk_columns.len() {
            return None;
        }
        let mut parts = Vec::with_capacity(self.pk_columns.len());
        for name in &self.pk_columns {
            let raw = pk.get(&Value::String(name.clone()))?;
            let col = self.column(name)?;
            parts.push((name.clone(), coerce_token(col, raw)?));
        }
        Some(RowKey { parts })
    }

    /// Row key read back from a fetched row.
    pub fn key_of(&self, row: &serde_json::Map<String, Value>) -> Option<RowKey> {
        let parts = self
            .pk_columns
            .iter()
            .map(|c| row.get(c).filter(|v| !v.is_null()).map(|v| (c.clone(), v.clone())))
            .collect::<Option<Vec<_>>>()?;
        Some(RowKey { parts })
    }
}

/// Primary key values of one row, ordered as the table's pk columns.
#[derive(Clone, Debug, PartialEq)]
pub struct RowKey {
    pub parts: Vec<(String, Value)>,
}

impl RowKey {
    /// Flat key/value token list, e.g. `["id", 2]`.
    pub fn tokens(&self) -> Vec<Value> {
        self.parts
            .iter()
            .flat_map(|(k, v)| [Value::String(k.clone()), v.clone()])
            .collect()
    }

    /// URL path form, e.g. `id/2`. Each token is percent-encoded as one segment,
    /// so a text key such as `a/b` becomes `slug/a%2Fb`.
    pub fn path(&self) -> String {
        self.parts
            .iter()
            .flat_map(|(k, v)| [encode_segment(k), encode_segment(&token_text(v))])
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Human-readable label used in breadcrumbs, e.g. `2` or `a=1, b=x`.
    pub fn label(&self) -> String {
        if let [(_, v)] = self.parts.as_slice() {
            return token_text(v);
        }
        self.parts
            .iter()
            .map(|(k, v)| format!("{}={}", k, token_text(v)))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Display form of the token list, e.g. `['id', 2]`.
    pub fn repr(&self) -> String {
        token_repr(&self.tokens())
    }
}

fn token_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Clone, Debug)]
pub struct ModelGroup {
    pub label: String,
    pub tables: Vec<Arc<ResolvedTable>>,
}

#[derive(Clone, Debug)]
pub struct ResolvedModel {
    pub groups: Vec<ModelGroup>,
    /// Every known table (catalog plus tables referenced by dotted path), for migrations.
    pub tables: Vec<Arc<ResolvedTable>>,
}

impl ResolvedModel {
    /// Case-insensitive lookup among the tables registered in the model map.
    pub fn get_table(&self, name: &str) -> Option<Arc<ResolvedTable>> {
        self.groups
            .iter()
            .flat_map(|g| g.tables.iter())
            .find(|t| t.name.eq_ignore_ascii_case(name))
            .cloned()
    }
}
