//! Admin panel handlers: dashboard, list with bulk actions, create, read, update, delete.

use crate::breadcrumbs::{breadcrumbs, View};
use crate::crud::{Crud, ListQuery};
use crate::error::AppError;
use crate::pk::path_tokens;
use crate::render;
use crate::service::is_submitted;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    Form,
};
use std::collections::HashMap;

type FormFields = Vec<(String, String)>;

/// 302 to `location`, matching what browsers expect after a form post.
fn found(location: String) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

fn list_url(state: &AppState, crud: &Crud) -> String {
    format!("{}/{}/", state.config.route_prefix, crud.table.name)
}

/// Primary-key tokens from the still-encoded request path: everything after
/// `{prefix}/{table}/{action}/`. The `*pk` capture is already percent-decoded,
/// which would merge an escaped `/` into the separators.
fn pk_tokens(state: &AppState, uri: &Uri) -> Result<Vec<String>, AppError> {
    let tail = uri
        .path()
        .strip_prefix(state.config.route_prefix.as_str())
        .and_then(|rest| rest.trim_start_matches('/').splitn(3, '/').nth(2))
        .unwrap_or_default();
    path_tokens(tail).ok_or_else(|| AppError::not_found(format!("undecodable key path '{}'", tail)))
}

fn submitted_values(fields: &FormFields) -> HashMap<String, String> {
    fields.iter().cloned().collect()
}

pub async fn redirect_home(State(state): State<AppState>) -> Response {
    found(format!("{}/", state.config.route_prefix))
}

pub async fn home(State(state): State<AppState>) -> Html<String> {
    Html(render::home(&state.config, &state.model))
}

async fn render_list(
    state: &AppState,
    crud: &Crud,
    params: &HashMap<String, String>,
) -> Result<Html<String>, AppError> {
    let query = ListQuery::from_params(&crud.table, params);
    let page = crud.list(&state.pool, &query, state.config.items_per_page).await?;
    let crumbs = breadcrumbs(&crud.table.name, &crud.table.label, View::List, None);
    Ok(Html(render::list(&state.config, &crud.table, &page, &crumbs)))
}

pub async fn list(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Html<String>, AppError> {
    let crud = Crud::new(&state.model, &table, &[])?;
    render_list(&state, &crud, &params).await
}

/// POST on the list view: `selected_action` applied to every `selected_item`.
pub async fn list_action(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    Form(fields): Form<FormFields>,
) -> Result<Html<String>, AppError> {
    let crud = Crud::new(&state.model, &table, &[])?;
    let action = fields
        .iter()
        .find(|(k, _)| k == "selected_action")
        .map(|(_, v)| v.as_str())
        .unwrap_or_default();
    let items: Vec<String> = fields
        .iter()
        .filter(|(k, _)| k == "selected_item")
        .map(|(_, v)| v.clone())
        .collect();
    match action {
        "delete" => {
            crud.delete_selected(&state.pool, &items).await?;
        }
        "" => {}
        other => tracing::debug!(action = other, "ignoring unknown list action"),
    }
    render_list(&state, &crud, &params).await
}

fn render_form(
    state: &AppState,
    crud: &Crud,
    view: View,
    values: &HashMap<String, String>,
    error: Option<&str>,
) -> String {
    let id = crud.key.as_ref().map(|k| k.label());
    let crumbs = breadcrumbs(&crud.table.name, &crud.table.label, view, id.as_deref());
    render::form(&state.config, &crud.table, crud.key.as_ref(), values, error, &crumbs)
}

/// Form submission outcome: redirect on success, form with errors on validation failure.
fn after_submit<T>(
    state: &AppState,
    crud: &Crud,
    view: View,
    fields: &FormFields,
    result: Result<T, AppError>,
) -> Result<Response, AppError> {
    match result {
        Ok(_) => Ok(found(list_url(state, crud))),
        Err(AppError::Validation(msg)) => {
            let html = render_form(state, crud, view, &submitted_values(fields), Some(&msg));
            Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(html)).into_response())
        }
        Err(e) => Err(e),
    }
}

pub async fn create_form(
    State(state): State<AppState>,
    Path(table): Path<String>,
) -> Result<Html<String>, AppError> {
    let crud = Crud::new(&state.model, &table, &[])?;
    Ok(Html(render_form(&state, &crud, View::Create, &HashMap::new(), None)))
}

pub async fn create_submit(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Form(fields): Form<FormFields>,
) -> Result<Response, AppError> {
    let crud = Crud::new(&state.model, &table, &[])?;
    if !is_submitted(&fields) {
        let html = render_form(&state, &crud, View::Create, &submitted_values(&fields), None);
        return Ok(Html(html).into_response());
    }
    let result = crud.create(&state.pool, &fields).await;
    after_submit(&state, &crud, View::Create, &fields, result)
}

pub async fn read(
    State(state): State<AppState>,
    Path((table, _)): Path<(String, String)>,
    uri: Uri,
) -> Result<Html<String>, AppError> {
    let crud = Crud::new(&state.model, &table, &pk_tokens(&state, &uri)?)?;
    let record = crud.read(&state.pool).await?;
    let key = crud.key.as_ref().ok_or_else(|| AppError::not_found("read without key"))?;
    let label = key.label();
    let crumbs = breadcrumbs(&crud.table.name, &crud.table.label, View::Read, Some(&label));
    Ok(Html(render::read(&state.config, &crud.table, key, &record, &crumbs)))
}

pub async fn update_form(
    State(state): State<AppState>,
    Path((table, _)): Path<(String, String)>,
    uri: Uri,
) -> Result<Html<String>, AppError> {
    let crud = Crud::new(&state.model, &table, &pk_tokens(&state, &uri)?)?;
    let record = crud.read(&state.pool).await?;
    let values = render::form_values_of(&crud.table, &record);
    Ok(Html(render_form(&state, &crud, View::Update, &values, None)))
}

pub async fn update_submit(
    State(state): State<AppState>,
    Path((table, _)): Path<(String, String)>,
    uri: Uri,
    Form(fields): Form<FormFields>,
) -> Result<Response, AppError> {
    let crud = Crud::new(&state.model, &table, &pk_tokens(&state, &uri)?)?;
    if !is_submitted(&fields) {
        let record = crud.read(&state.pool).await?;
        let values = render::form_values_of(&crud.table, &record);
        return Ok(Html(render_form(&state, &crud, View::Update, &values, None)).into_response());
    }
    let result = crud.update(&state.pool, &fields).await;
    after_submit(&state, &crud, View::Update, &fields, result)
}

pub async fn delete(
    State(state): State<AppState>,
    Path((table, _)): Path<(String, String)>,
    uri: Uri,
) -> Result<Response, AppError> {
    let crud = Crud::new(&state.model, &table, &pk_tokens(&state, &uri)?)?;
    crud.delete(&state.pool).await?;
    Ok(found(list_url(&state, &crud)))
}
