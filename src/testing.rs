//! Shared fixtures for unit tests.

use crate::config::{resolve, ResolvedModel, ResolvedTable, Settings};

pub const SETTINGS: &str = r#"{
    "sacrud.tables": [
        {"name": "user", "columns": [
            {"name": "id", "type": "integer", "primary_key": true},
            {"name": "name", "type": "text"}
        ]},
        {"name": "profile", "columns": [
            {"name": "id", "type": "integer", "primary_key": true},
            {"name": "user_id", "type": "integer", "references": "user.id"},
            {"name": "bio", "type": "text"}
        ]}
    ],
    "sacrud.models": {
        "": {"tables": ["user"]},
        "Auth models": {"tables": ["user", "profile"]}
    }
}"#;

pub fn settings() -> Settings {
    Settings::from_json_str(SETTINGS).expect("fixture settings")
}

pub fn model() -> ResolvedModel {
    resolve(&settings()).expect("fixture model")
}

pub fn user_table() -> ResolvedTable {
    model().get_table("user").expect("user table").as_ref().clone()
}
