//! Raw config types: table catalog, model map and admin options.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    #[serde(alias = "int", alias = "bigint", alias = "serial")]
    Integer,
    #[serde(alias = "float", alias = "double", alias = "numeric")]
    Real,
    #[serde(alias = "string", alias = "varchar")]
    Text,
    #[serde(alias = "bool")]
    Boolean,
    #[serde(alias = "datetime")]
    Timestamp,
    Date,
    Uuid,
    Json,
}

impl ColumnType {
    /// SQLite type affinity used in DDL.
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::Integer | ColumnType::Boolean => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text
            | ColumnType::Timestamp
            | ColumnType::Date
            | ColumnType::Uuid
            | ColumnType::Json => "TEXT",
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ValidationRule {
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub min_length: Option<u32>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub allowed: Option<Vec<Value>>,
    #[serde(default)]
    pub minimum: Option<f64>,
    #[serde(default)]
    pub maximum: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: ColumnType,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default = "default_true")]
    pub nullable: bool,
    /// SQL default expression, e.g. `CURRENT_TIMESTAMP`.
    #[serde(default)]
    pub default: Option<String>,
    /// Foreign key target as `table.column`.
    #[serde(default)]
    pub references: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub validation: Option<ValidationRule>,
}

fn default_true() -> bool {
    true
}

impl ColumnConfig {
    pub fn new(name: &str, type_: ColumnType) -> Self {
        ColumnConfig {
            name: name.to_string(),
            type_,
            primary_key: false,
            nullable: true,
            default: None,
            references: None,
            label: None,
            validation: None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    pub fn references(mut self, target: &str) -> Self {
        self.references = Some(target.to_string());
        self
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TableConfig {
    pub name: String,
    /// Display label; defaults to the table name.
    #[serde(default)]
    pub label: Option<String>,
    pub columns: Vec<ColumnConfig>,
    /// Columns shown in the list view; all columns when empty.
    #[serde(default)]
    pub list_display: Vec<String>,
}

impl TableConfig {
    pub fn new(name: &str, columns: Vec<ColumnConfig>) -> Self {
        TableConfig {
            name: name.to_string(),
            label: None,
            columns,
            list_display: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ModelGroupConfig {
    /// Catalog table names or dotted paths to registered [`TableConfig`] objects.
    pub tables: Vec<String>,
}

/// Section label -> group, in declaration order. The empty label is the ungrouped section.
pub type ModelMap = Vec<(String, ModelGroupConfig)>;

/// Typed admin options extracted from [`crate::config::Settings`].
#[derive(Clone, Debug)]
pub struct AdminConfig {
    pub database_url: Option<String>,
    pub route_prefix: String,
    pub items_per_page: u32,
    pub max_body_bytes: usize,
    pub dashboard_title: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        AdminConfig {
            database_url: None,
            route_prefix: "/admin".into(),
            items_per_page: 10,
            max_body_bytes: 1024 * 1024,
            dashboard_title: "Dashboard".into(),
        }
    }
}
