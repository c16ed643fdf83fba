//! Row records and difference-only field updates.

use serde::Serialize;
use serde_json::{Map, Value};

/// One fetched row, fields in column order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    pub fn new(fields: Map<String, Value>) -> Self {
        Record { fields }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

/// Anything with named fields that an update can be merged into.
pub trait FieldTarget {
    fn field(&self, name: &str) -> Option<&Value>;
    fn set_field(&mut self, name: &str, value: Value);
}

impl FieldTarget for Record {
    fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    fn set_field(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_string(), value);
    }
}

impl FieldTarget for Map<String, Value> {
    fn field(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }

    fn set_field(&mut self, name: &str, value: Value) {
        self.insert(name.to_string(), value);
    }
}

/// Set `key` on `target` unless it already holds `value`. Returns whether the target changed.
pub fn update_difference_object<T: FieldTarget + ?Sized>(target: &mut T, key: &str, value: Value) -> bool {
    if target.field(key) == Some(&value) {
        return false;
    }
    target.set_field(key, value);
    true
}
