//! Example consumer: a separate Rust project that uses sacrud-admin as a dependency.
//! Tables are defined in code and referenced from settings by dotted path.
//!
//! Run from repo root: `cargo run -p example-consumer`

use sacrud_admin::config::{
    ColumnConfig, ColumnType, ModelGroupConfig, ModelMap, TableConfig, PYRAMID_SACRUD_MODELS, SQLALCHEMY_URL,
};
use sacrud_admin::{
    admin_routes, apply_migrations, common_routes, connect, resolve, AdminConfig, AppState,
    Settings,
};
use std::sync::Arc;
use tokio::net::TcpListener;

fn article() -> TableConfig {
    let mut published = ColumnConfig::new("published", ColumnType::Boolean);
    published.nullable = false;
    published.default = Some("0".into());
    let mut created = ColumnConfig::new("created_at", ColumnType::Timestamp);
    created.default = Some("CURRENT_TIMESTAMP".into());
    let mut table = TableConfig::new(
        "article",
        vec![
            ColumnConfig::new("id", ColumnType::Integer).primary_key(),
            ColumnConfig::new("title", ColumnType::Text),
            published,
            created,
        ],
    );
    table.label = Some("Articles".into());
    table
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("sacrud_admin=info")),
        )
        .init();

    let mut settings = Settings::new();
    settings.insert(SQLALCHEMY_URL, "sqlite://consumer.db");
    settings.apply_env();
    settings.imports_mut().register("consumer.models:Article", Arc::new(article()));
    let models: ModelMap = vec![(
        "Content".into(),
        ModelGroupConfig {
            tables: vec!["consumer.models:Article".into()],
        },
    )];
    settings.insert_object(PYRAMID_SACRUD_MODELS, Arc::new(models));

    let config = AdminConfig::from_settings(&settings)?;
    let model = resolve(&settings)?;
    let database_url = config.database_url.clone().unwrap_or_else(|| "sqlite://consumer.db".into());
    let pool = connect(&database_url).await?;
    apply_migrations(&pool, &model).await?;

    let state = AppState::new(pool, model, config);
    let app = axum::Router::new()
        .merge(common_routes(state.clone()))
        .merge(admin_routes(state));
    let listener = TcpListener::bind("127.0.0.1:3000").await?;
    let port = listener.local_addr()?.port();
    tracing::info!("Example consumer listening on http://127.0.0.1:{}/admin/", port);
    axum::serve(listener, app).await?;
    Ok(())
}
