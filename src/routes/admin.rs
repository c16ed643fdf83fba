//! Admin panel routes mounted under the configured route prefix.
//! Row-level views take the primary key as a `key/value/...` path tail.

use crate::handlers::admin::{
    create_form, create_submit, delete as delete_handler, home, list, list_action, read, redirect_home,
    update_form, update_submit,
};
use crate::state::AppState;
use axum::{routing::get, Router};
use tower_http::limit::RequestBodyLimitLayer;

pub fn admin_routes(state: AppState) -> Router {
    let prefix = state.config.route_prefix.clone();
    let mut router = Router::new()
        .route(&format!("{}/", prefix), get(home))
        .route(&format!("{}/:table/", prefix), get(list).post(list_action))
        .route(
            &format!("{}/:table/create/", prefix),
            get(create_form).post(create_submit),
        )
        .route(&format!("{}/:table/read/*pk", prefix), get(read))
        .route(
            &format!("{}/:table/update/*pk", prefix),
            get(update_form).post(update_submit),
        )
        .route(&format!("{}/:table/delete/*pk", prefix), get(delete_handler));
    if !prefix.is_empty() {
        router = router.route(&prefix, get(redirect_home));
    }
    router
        .layer(RequestBodyLimitLayer::new(state.config.max_body_bytes))
        .with_state(state)
}
