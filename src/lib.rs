//! sacrud-admin: configuration-driven CRUD admin panel.

pub mod breadcrumbs;
pub mod config;
pub mod crud;
pub mod error;
pub mod handlers;
pub mod migration;
pub mod pk;
pub mod record;
pub mod render;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

#[cfg(test)]
mod testing;

pub use breadcrumbs::{breadcrumbs, get_crumb, Crumb, View};
pub use config::{get_obj_from_settings, resolve, AdminConfig, ResolvedModel, ResolvedTable, Settings};
pub use crud::{get_table, Crud};
pub use error::{AppError, ConfigError};
pub use migration::apply_migrations;
pub use pk::pk_list_to_dict;
pub use record::{update_difference_object, FieldTarget, Record};
pub use routes::{admin_routes, common_routes};
pub use service::CrudService;
pub use state::AppState;
pub use store::connect;
