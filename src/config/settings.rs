//! Flat process-wide settings and dotted-path object resolution.
//!
//! Values are plain strings, structured JSON, or object references. A string
//! can name an object registered in the [`ImportRegistry`] (`module:Name` or
//! `module.Name`), which is how configuration files point at objects built in code.

use crate::config::loader::{DATABASE_URL, ROUTE_PREFIX, SQLALCHEMY_URL};
use crate::error::ConfigError;
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

pub type ObjectRef = Arc<dyn Any + Send + Sync>;

#[derive(Clone)]
pub enum SettingValue {
    Str(String),
    Json(Value),
    Object(ObjectRef),
}

impl std::fmt::Debug for SettingValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingValue::Str(s) => f.debug_tuple("Str").field(s).finish(),
            SettingValue::Json(v) => f.debug_tuple("Json").field(v).finish(),
            SettingValue::Object(_) => f.write_str("Object(..)"),
        }
    }
}

impl From<Value> for SettingValue {
    fn from(v: Value) -> Self {
        match v {
            Value::String(s) => SettingValue::Str(s),
            other => SettingValue::Json(other),
        }
    }
}

impl From<&str> for SettingValue {
    fn from(s: &str) -> Self {
        SettingValue::Str(s.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(s: String) -> Self {
        SettingValue::Str(s)
    }
}

/// Named objects that dotted-path settings resolve to.
#[derive(Clone, Default)]
pub struct ImportRegistry {
    objects: HashMap<String, ObjectRef>,
}

impl ImportRegistry {
    pub fn register<T: Any + Send + Sync>(&mut self, path: &str, object: Arc<T>) {
        self.objects.insert(normalize_path(path), object);
    }

    pub fn resolve(&self, path: &str) -> Option<ObjectRef> {
        self.objects.get(&normalize_path(path)).cloned()
    }
}

/// `pkg.module.Name` and `pkg.module:Name` name the same object.
fn normalize_path(path: &str) -> String {
    let path = path.trim();
    if path.contains(':') {
        return path.to_string();
    }
    match path.rsplit_once('.') {
        Some((module, name)) => format!("{}:{}", module, name),
        None => path.to_string(),
    }
}

#[derive(Clone, Debug, Default)]
pub struct Settings {
    values: HashMap<String, SettingValue>,
    imports: ImportRegistry,
}

impl std::fmt::Debug for ImportRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.objects.keys()).finish()
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object; every top-level key becomes a setting.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let v: Value = serde_json::from_str(s).map_err(|e| ConfigError::Load(e.to_string()))?;
        let Value::Object(map) = v else {
            return Err(ConfigError::Load("settings must be a JSON object".into()));
        };
        let mut settings = Settings::new();
        for (k, v) in map {
            settings.insert(k, v);
        }
        Ok(settings)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&text)
    }

    /// Overlay `DATABASE_URL` and `SACRUD_ROUTE_PREFIX` from the environment.
    /// The URL replaces `sqlalchemy.url` when that key is in use.
    pub fn apply_env(&mut self) {
        let url_key = if self.values.contains_key(SQLALCHEMY_URL) {
            SQLALCHEMY_URL
        } else {
            DATABASE_URL
        };
        for (var, key) in [("DATABASE_URL", url_key), ("SACRUD_ROUTE_PREFIX", ROUTE_PREFIX)] {
            if let Ok(v) = std::env::var(var) {
                tracing::debug!(var, key, "setting from environment");
                self.insert(key, v);
            }
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<SettingValue>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn insert_object<T: Any + Send + Sync>(&mut self, key: impl Into<String>, object: Arc<T>) {
        self.values.insert(key.into(), SettingValue::Object(object));
    }

    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.values.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(SettingValue::Str(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Integer setting given either as a JSON number or a numeric string.
    pub fn get_u64(&self, key: &str) -> Result<Option<u64>, ConfigError> {
        let wrong = || ConfigError::WrongType {
            key: key.to_string(),
            expected: "positive integer",
        };
        match self.values.get(key) {
            None => Ok(None),
            Some(SettingValue::Str(s)) => s.trim().parse().map(Some).map_err(|_| wrong()),
            Some(SettingValue::Json(v)) => v.as_u64().map(Some).ok_or_else(wrong),
            Some(SettingValue::Object(_)) => Err(wrong()),
        }
    }

    pub fn imports(&self) -> &ImportRegistry {
        &self.imports
    }

    pub fn imports_mut(&mut self) -> &mut ImportRegistry {
        &mut self.imports
    }
}

/// Look up `key`: an object reference is returned as stored, a string is
/// resolved as a dotted path against the import registry.
pub fn get_obj_from_settings<T: Any + Send + Sync>(
    settings: &Settings,
    key: &str,
) -> Result<Arc<T>, ConfigError> {
    let object = match settings.get(key) {
        None => return Err(ConfigError::MissingSetting(key.to_string())),
        Some(SettingValue::Object(o)) => o.clone(),
        Some(SettingValue::Str(path)) => settings
            .imports()
            .resolve(path)
            .ok_or_else(|| ConfigError::Unresolvable(path.clone()))?,
        Some(SettingValue::Json(_)) => {
            return Err(ConfigError::WrongType {
                key: key.to_string(),
                expected: "object reference or dotted path",
            })
        }
    };
    object.downcast::<T>().map_err(|_| ConfigError::WrongType {
        key: key.to_string(),
        expected: std::any::type_name::<T>(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct User {
        name: &'static str,
    }

    #[test]
    fn resolves_dotted_path_and_direct_reference() {
        let user = Arc::new(User { name: "user" });
        let mut settings = Settings::new();
        settings.imports_mut().register("sacrud.tests:User", user.clone());

        settings.insert("foo.User", "sacrud.tests:User");
        let obj = get_obj_from_settings::<User>(&settings, "foo.User").unwrap();
        assert!(Arc::ptr_eq(&obj, &user));

        settings.insert("foo.User", "sacrud.tests.User");
        let obj = get_obj_from_settings::<User>(&settings, "foo.User").unwrap();
        assert!(Arc::ptr_eq(&obj, &user));

        settings.insert_object("foo.User", user.clone());
        let obj = get_obj_from_settings::<User>(&settings, "foo.User").unwrap();
        assert!(Arc::ptr_eq(&obj, &user));
    }

    #[test]
    fn missing_or_unresolvable_is_a_config_error() {
        let mut settings = Settings::new();
        assert!(matches!(
            get_obj_from_settings::<User>(&settings, "foo.User"),
            Err(ConfigError::MissingSetting(_))
        ));
        settings.insert("foo.User", "nowhere:User");
        assert!(matches!(
            get_obj_from_settings::<User>(&settings, "foo.User"),
            Err(ConfigError::Unresolvable(_))
        ));
        settings.insert_object("foo.User", Arc::new(42u32));
        assert!(matches!(
            get_obj_from_settings::<User>(&settings, "foo.User"),
            Err(ConfigError::WrongType { .. })
        ));
    }

    #[test]
    fn loads_json_object() {
        let settings = Settings::from_json_str(
            r#"{"database.url": "sqlite::memory:", "sacrud.items_per_page": 25}"#,
        )
        .unwrap();
        assert_eq!(settings.get_str("database.url"), Some("sqlite::memory:"));
        assert_eq!(settings.get_u64("sacrud.items_per_page").unwrap(), Some(25));
        assert!(Settings::from_json_str("[1, 2]").is_err());
    }
}
