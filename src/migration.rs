//! Apply the table catalog to the database: one CREATE TABLE IF NOT EXISTS per table.

use crate::config::{ResolvedModel, ResolvedTable};
use crate::error::AppError;
use crate::sql::quoted;
use sqlx::SqlitePool;

/// DDL for one table. A single integer primary key becomes SQLite's rowid alias.
pub fn create_table_sql(table: &ResolvedTable) -> String {
    let auto_pk = table.has_auto_pk();
    let mut defs: Vec<String> = Vec::with_capacity(table.columns.len() + 1);
    for c in &table.columns {
        let mut def = format!("{} {}", quoted(&c.name), c.type_.sql_type());
        if auto_pk && c.primary_key {
            def.push_str(" PRIMARY KEY");
        } else if !c.nullable {
            def.push_str(" NOT NULL");
        }
        if let Some(d) = &c.default {
            def.push_str(" DEFAULT ");
            def.push_str(d);
        }
        if let Some((t, col)) = &c.references {
            def.push_str(&format!(" REFERENCES {}({})", quoted(t), quoted(col)));
        }
        defs.push(def);
    }
    if !auto_pk {
        let pk: Vec<String> = table.pk_columns.iter().map(|c| quoted(c)).collect();
        defs.push(format!("PRIMARY KEY ({})", pk.join(", ")));
    }
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        quoted(&table.name),
        defs.join(",\n    ")
    )
}

/// Create every known table. Idempotent; existing tables are left untouched.
pub async fn apply_migrations(pool: &SqlitePool, model: &ResolvedModel) -> Result<(), AppError> {
    for table in &model.tables {
        let ddl = create_table_sql(table);
        tracing::debug!(sql = %ddl, "migration");
        sqlx::query(&ddl).execute(pool).await?;
    }
    tracing::info!(tables = model.tables.len(), "migrations applied");
    Ok(())
}
