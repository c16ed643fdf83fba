//! Example server: loads settings from a JSON file (`SACRUD_SETTINGS`, default
//! `demos/admin.json`), creates the catalog's tables, and mounts the admin panel.

use sacrud_admin::{
    admin_routes, apply_migrations, common_routes, connect, resolve, AdminConfig, AppState,
    Settings,
};
use axum::Router;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("sacrud_admin=info".parse()?))
        .init();

    let path = std::env::var("SACRUD_SETTINGS").unwrap_or_else(|_| "demos/admin.json".into());
    let mut settings = Settings::from_json_file(&path)?;
    settings.apply_env();
    let config = AdminConfig::from_settings(&settings)?;
    let model = resolve(&settings)?;

    let database_url = config.database_url.clone().unwrap_or_else(|| "sqlite://admin.db".into());
    let pool = connect(&database_url).await?;
    apply_migrations(&pool, &model).await?;

    let prefix = config.route_prefix.clone();
    let state = AppState::new(pool, model, config);
    let app = Router::new()
        .merge(common_routes(state.clone()))
        .merge(admin_routes(state));

    let listener = TcpListener::bind("0.0.0.0:3000").await?;
    tracing::info!("listening on {} (admin at {}/)", listener.local_addr()?, prefix);
    axum::serve(listener, app).await?;
    Ok(())
}
