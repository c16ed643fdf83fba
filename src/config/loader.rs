//! Build the resolved model and admin options from [`Settings`].

use crate::config::resolved::{ColumnInfo, ModelGroup, ResolvedModel, ResolvedTable};
use crate::config::settings::{get_obj_from_settings, SettingValue, Settings};
use crate::config::types::*;
use crate::config::{split_reference, validate};
use crate::error::ConfigError;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

pub const DATABASE_URL: &str = "database.url";
pub const MODELS: &str = "sacrud.models";
/// Pyramid-style names, looked up before their short forms.
pub const SQLALCHEMY_URL: &str = "sqlalchemy.url";
pub const PYRAMID_SACRUD_MODELS: &str = "pyramid_sacrud.models";
pub const TABLES: &str = "sacrud.tables";
pub const ROUTE_PREFIX: &str = "sacrud.route_prefix";
pub const ITEMS_PER_PAGE: &str = "sacrud.items_per_page";
pub const MAX_BODY_BYTES: &str = "sacrud.max_body_bytes";
pub const DASHBOARD_TITLE: &str = "sacrud.dashboard_title";

/// First of `keys` present in `settings`.
fn first_key<'k>(settings: &Settings, keys: &[&'k str]) -> Option<&'k str> {
    keys.iter().copied().find(|k| settings.get(k).is_some())
}

impl AdminConfig {
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let defaults = AdminConfig::default();
        let items_per_page = match settings.get_u64(ITEMS_PER_PAGE)? {
            Some(0) => {
                return Err(ConfigError::Validation(format!("{} must be at least 1", ITEMS_PER_PAGE)))
            }
            Some(n) => n.min(u32::MAX as u64) as u32,
            None => defaults.items_per_page,
        };
        Ok(AdminConfig {
            database_url: first_key(settings, &[SQLALCHEMY_URL, DATABASE_URL])
                .and_then(|k| settings.get_str(k))
                .map(str::to_string),
            route_prefix: normalize_prefix(settings.get_str(ROUTE_PREFIX).unwrap_or(&defaults.route_prefix)),
            items_per_page,
            max_body_bytes: settings
                .get_u64(MAX_BODY_BYTES)?
                .map(|n| n as usize)
                .unwrap_or(defaults.max_body_bytes),
            dashboard_title: settings
                .get_str(DASHBOARD_TITLE)
                .map(str::to_string)
                .unwrap_or(defaults.dashboard_title),
        })
    }
}

/// `admin/` -> `/admin`; `/` -> `` (mount at root).
pub fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

/// Table catalog from `sacrud.tables`: a JSON array, an object reference, or a dotted path.
pub fn load_catalog(settings: &Settings) -> Result<Vec<TableConfig>, ConfigError> {
    match settings.get(TABLES) {
        None => Ok(Vec::new()),
        Some(SettingValue::Json(v)) => {
            serde_json::from_value(v.clone()).map_err(|e| ConfigError::Load(format!("{}: {}", TABLES, e)))
        }
        Some(_) => Ok(get_obj_from_settings::<Vec<TableConfig>>(settings, TABLES)?
            .as_ref()
            .clone()),
    }
}

/// Model map from `pyramid_sacrud.models` (or `sacrud.models`): a JSON object `{label: {tables: [...]}}`,
/// an object reference, or a dotted path.
pub fn load_model_map(settings: &Settings) -> Result<ModelMap, ConfigError> {
    let key = first_key(settings, &[PYRAMID_SACRUD_MODELS, MODELS])
        .ok_or_else(|| ConfigError::MissingSetting(PYRAMID_SACRUD_MODELS.into()))?;
    match settings.get(key) {
        None => Err(ConfigError::MissingSetting(key.into())),
        Some(SettingValue::Json(Value::Object(groups))) => groups
            .iter()
            .map(|(label, group)| {
                let group: ModelGroupConfig = serde_json::from_value(group.clone())
                    .map_err(|e| ConfigError::Load(format!("{} '{}': {}", key, label, e)))?;
                Ok((label.clone(), group))
            })
            .collect(),
        Some(SettingValue::Json(_)) => Err(ConfigError::WrongType {
            key: key.into(),
            expected: "JSON object",
        }),
        Some(_) => Ok(get_obj_from_settings::<ModelMap>(settings, key)?.as_ref().clone()),
    }
}

/// Build resolved model: catalog tables plus any table named by dotted path in the model map.
pub fn resolve(settings: &Settings) -> Result<ResolvedModel, ConfigError> {
    let mut catalog = load_catalog(settings)?;
    let model_map = load_model_map(settings)?;

    let mut group_refs: Vec<(String, Vec<String>)> = Vec::with_capacity(model_map.len());
    for (label, group) in &model_map {
        let mut names = Vec::with_capacity(group.tables.len());
        for table_ref in &group.tables {
            if let Some(t) = catalog.iter().find(|t| t.name.eq_ignore_ascii_case(table_ref)) {
                names.push(t.name.clone());
                continue;
            }
            let object = settings
                .imports()
                .resolve(table_ref)
                .ok_or_else(|| ConfigError::MissingReference {
                    kind: "table",
                    id: table_ref.clone(),
                })?;
            let table = object
                .downcast::<TableConfig>()
                .map_err(|_| ConfigError::WrongType {
                    key: table_ref.clone(),
                    expected: "table config",
                })?;
            if !catalog.iter().any(|t| t.name.eq_ignore_ascii_case(&table.name)) {
                catalog.push(table.as_ref().clone());
            }
            names.push(table.name.clone());
        }
        group_refs.push((label.clone(), names));
    }

    validate(&catalog)?;

    let tables: Vec<Arc<ResolvedTable>> = catalog.iter().map(|t| Arc::new(resolve_table(t))).collect();
    let by_name: HashMap<&str, &Arc<ResolvedTable>> = tables.iter().map(|t| (t.name.as_str(), t)).collect();
    let groups = group_refs
        .into_iter()
        .map(|(label, names)| ModelGroup {
            label,
            tables: names
                .iter()
                .filter_map(|n| by_name.get(n.as_str()).map(|t| Arc::clone(t)))
                .collect(),
        })
        .collect();

    tracing::debug!(tables = tables.len(), "resolved admin model");
    Ok(ResolvedModel { groups, tables })
}

fn resolve_table(t: &TableConfig) -> ResolvedTable {
    let columns = t
        .columns
        .iter()
        .map(|c| ColumnInfo {
            name: c.name.clone(),
            label: c.label.clone().unwrap_or_else(|| c.name.clone()),
            type_: c.type_,
            primary_key: c.primary_key,
            nullable: c.nullable && !c.primary_key,
            default: c.default.clone(),
            references: c
                .references
                .as_deref()
                .and_then(split_reference)
                .map(|(t, c)| (t.to_string(), c.to_string())),
            validation: c.validation.clone(),
        })
        .collect();
    ResolvedTable {
        name: t.name.clone(),
        label: t.label.clone().unwrap_or_else(|| t.name.clone()),
        columns,
        pk_columns: t.columns.iter().filter(|c| c.primary_key).map(|c| c.name.clone()).collect(),
        list_display: t.list_display.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        let mut s = Settings::from_json_str(
            r#"{
                "sacrud.tables": [
                    {"name": "user", "columns": [
                        {"name": "id", "type": "integer", "primary_key": true},
                        {"name": "name", "type": "text"}
                    ]}
                ],
                "sacrud.models": {
                    "": {"tables": ["user"]},
                    "Auth models": {"tables": ["user", "myapp.models:Profile"]}
                }
            }"#,
        )
        .unwrap();
        let profile = TableConfig::new(
            "profile",
            vec![
                ColumnConfig::new("id", ColumnType::Integer).primary_key(),
                ColumnConfig::new("user_id", ColumnType::Integer).references("user.id"),
            ],
        );
        s.imports_mut().register("myapp.models.Profile", Arc::new(profile));
        s
    }

    #[test]
    fn resolves_groups_in_order() {
        let model = resolve(&settings()).unwrap();
        let labels: Vec<_> = model.groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, ["", "Auth models"]);
        assert_eq!(model.tables.len(), 2);
        let auth: Vec<_> = model.groups[1].tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(auth, ["user", "profile"]);
    }

    #[test]
    fn get_table_is_case_insensitive() {
        let model = resolve(&settings()).unwrap();
        assert_eq!(model.get_table("UsEr").map(|t| t.name.clone()), Some("user".into()));
        assert!(model.get_table("foo").is_none());
    }

    #[test]
    fn model_map_from_object_reference() {
        let mut s = settings();
        let map: ModelMap = vec![(
            "Only users".into(),
            ModelGroupConfig { tables: vec!["user".into()] },
        )];
        s.insert_object(MODELS, Arc::new(map));
        let model = resolve(&s).unwrap();
        assert_eq!(model.groups.len(), 1);
        assert!(model.get_table("profile").is_none());
    }

    #[test]
    fn unknown_table_reference_fails() {
        let mut s = settings();
        s.insert(MODELS, serde_json::json!({"": {"tables": ["nope"]}}));
        assert!(matches!(resolve(&s), Err(ConfigError::MissingReference { .. })));
    }

    #[test]
    fn accepts_pyramid_key_names() {
        let mut s = Settings::from_json_str(
            r#"{
                "sqlalchemy.url": "sqlite::memory:",
                "database.url": "sqlite://ignored.db",
                "sacrud.tables": [
                    {"name": "user", "columns": [{"name": "id", "type": "integer", "primary_key": true}]}
                ],
                "pyramid_sacrud.models": {"Auth models": {"tables": ["user"]}}
            }"#,
        )
        .unwrap();
        let cfg = AdminConfig::from_settings(&s).unwrap();
        assert_eq!(cfg.database_url.as_deref(), Some("sqlite::memory:"));
        let model = resolve(&s).unwrap();
        assert_eq!(model.groups[0].label, "Auth models");

        // the long name wins over the short one
        s.insert(MODELS, serde_json::json!({"Other": {"tables": ["user"]}}));
        assert_eq!(resolve(&s).unwrap().groups[0].label, "Auth models");
    }

    #[test]
    fn missing_model_map_names_pyramid_key() {
        let err = resolve(&Settings::new()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingSetting(k) if k == PYRAMID_SACRUD_MODELS));
    }

    #[test]
    fn admin_config_defaults_and_overrides() {
        let mut s = Settings::new();
        let cfg = AdminConfig::from_settings(&s).unwrap();
        assert_eq!(cfg.route_prefix, "/admin");
        assert_eq!(cfg.items_per_page, 10);

        s.insert(ROUTE_PREFIX, "panel/");
        s.insert(ITEMS_PER_PAGE, "3");
        let cfg = AdminConfig::from_settings(&s).unwrap();
        assert_eq!(cfg.route_prefix, "/panel");
        assert_eq!(cfg.items_per_page, 3);
    }
}
