//! Catalog validation: referential integrity and primary keys.

use crate::config::TableConfig;
use crate::error::ConfigError;
use std::collections::HashSet;

pub fn validate(tables: &[TableConfig]) -> Result<(), ConfigError> {
    let mut names = HashSet::new();
    for t in tables {
        if t.name.is_empty() {
            return Err(ConfigError::Validation("table name must not be empty".into()));
        }
        if !names.insert(t.name.to_lowercase()) {
            return Err(ConfigError::DuplicateTable(t.name.clone()));
        }
        if t.columns.is_empty() {
            return Err(ConfigError::Validation(format!("table {} has no columns", t.name)));
        }
        let mut cols = HashSet::new();
        for c in &t.columns {
            if !cols.insert(c.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate column {}.{}",
                    t.name, c.name
                )));
            }
        }
        if !t.columns.iter().any(|c| c.primary_key) {
            return Err(ConfigError::InvalidPrimaryKey {
                table: t.name.clone(),
                column: "<none>".into(),
            });
        }
        for name in &t.list_display {
            if !cols.contains(name.as_str()) {
                return Err(ConfigError::MissingReference {
                    kind: "column",
                    id: format!("{}.{}", t.name, name),
                });
            }
        }
        for c in &t.columns {
            if let Some(pattern) = c.validation.as_ref().and_then(|v| v.pattern.as_deref()) {
                regex::Regex::new(pattern).map_err(|e| {
                    ConfigError::Validation(format!("invalid pattern for {}.{}: {}", t.name, c.name, e))
                })?;
            }
        }
    }

    for t in tables {
        for c in &t.columns {
            let Some(target) = c.references.as_deref() else { continue };
            let (table, column) = split_reference(target).ok_or_else(|| {
                ConfigError::Validation(format!(
                    "reference on {}.{} must be table.column, got '{}'",
                    t.name, c.name, target
                ))
            })?;
            let found = tables
                .iter()
                .find(|o| o.name.eq_ignore_ascii_case(table))
                .map(|o| o.columns.iter().any(|oc| oc.name == column))
                .unwrap_or(false);
            if !found {
                return Err(ConfigError::MissingReference {
                    kind: "column",
                    id: target.to_string(),
                });
            }
        }
    }
    Ok(())
}

pub fn split_reference(target: &str) -> Option<(&str, &str)> {
    let (table, column) = target.split_once('.')?;
    if table.is_empty() || column.is_empty() {
        return None;
    }
    Some((table, column))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ColumnConfig, ColumnType};

    fn user() -> TableConfig {
        TableConfig::new(
            "user",
            vec![
                ColumnConfig::new("id", ColumnType::Integer).primary_key(),
                ColumnConfig::new("name", ColumnType::Text),
            ],
        )
    }

    #[test]
    fn accepts_valid_catalog() {
        let profile = TableConfig::new(
            "profile",
            vec![
                ColumnConfig::new("id", ColumnType::Integer).primary_key(),
                ColumnConfig::new("user_id", ColumnType::Integer).references("user.id"),
            ],
        );
        validate(&[user(), profile]).unwrap();
    }

    #[test]
    fn rejects_duplicate_tables_and_missing_pk() {
        assert!(matches!(
            validate(&[user(), user()]),
            Err(ConfigError::DuplicateTable(_))
        ));
        let no_pk = TableConfig::new("log", vec![ColumnConfig::new("msg", ColumnType::Text)]);
        assert!(matches!(
            validate(&[no_pk]),
            Err(ConfigError::InvalidPrimaryKey { .. })
        ));
    }

    #[test]
    fn rejects_dangling_reference() {
        let profile = TableConfig::new(
            "profile",
            vec![
                ColumnConfig::new("id", ColumnType::Integer).primary_key(),
                ColumnConfig::new("user_id", ColumnType::Integer).references("account.id"),
            ],
        );
        assert!(matches!(
            validate(&[user(), profile]),
            Err(ConfigError::MissingReference { .. })
        ));
    }
}
