//! Back-office routes for curating data sources and reviewing ingested tools.
//!
//! Mounted only when an admin token is configured. Every handler requires an
//! [`AdminSession`].

use crate::directory_store::{
    NewDataSource, NewToolCandidate, StatusTransition, ToolStatus,
};
use crate::search::{is_valid_slug, parse_search_request};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::Response,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;

use super::envelope::{ApiError, RequestContext};
use super::session::AdminSession;
use super::state::{GuardedDirectoryStore, GuardedQueryExecutor, ServerState};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeletedSource {
    id: i64,
}

fn validate_source(source: &NewDataSource) -> Result<(), ApiError> {
    if source.name.trim().is_empty() {
        return Err(ApiError::invalid("name must not be empty"));
    }
    if !(source.url.starts_with("https://") || source.url.starts_with("http://")) {
        return Err(ApiError::invalid("url must be an http(s) URL"));
    }
    if !is_valid_slug(&source.kind) {
        return Err(ApiError::invalid("kind must be a slug"));
    }
    Ok(())
}

fn validate_candidate(candidate: &NewToolCandidate) -> Result<(), ApiError> {
    if !is_valid_slug(&candidate.slug) {
        return Err(ApiError::invalid(format!(
            "'{}' is not a valid slug",
            candidate.slug
        )));
    }
    if candidate.name.trim().is_empty() {
        return Err(ApiError::invalid("name must not be empty"));
    }
    if let Some(bad) = candidate.tag_slugs.iter().find(|t| !is_valid_slug(t)) {
        return Err(ApiError::invalid(format!("'{}' is not a valid tag slug", bad)));
    }
    Ok(())
}

async fn list_sources(
    _session: AdminSession,
    ctx: RequestContext,
    State(store): State<GuardedDirectoryStore>,
) -> Response {
    match store.list_data_sources() {
        Ok(sources) => ctx.ok(sources),
        Err(err) => ctx.fail(ApiError::StorageUnavailable(err)),
    }
}

async fn add_source(
    _session: AdminSession,
    ctx: RequestContext,
    State(store): State<GuardedDirectoryStore>,
    body: Result<Json<NewDataSource>, JsonRejection>,
) -> Response {
    let source = match body {
        Ok(Json(source)) => source,
        Err(rejection) => return ctx.fail(ApiError::invalid(rejection.body_text())),
    };
    if let Err(err) = validate_source(&source) {
        return ctx.fail(err);
    }

    match store.add_data_source(&source) {
        Ok(created) => {
            info!("Added data source {} ({})", created.id, created.url);
            ctx.respond(StatusCode::CREATED, created)
        }
        Err(err) => ctx.fail(err.into()),
    }
}

async fn delete_source(
    _session: AdminSession,
    ctx: RequestContext,
    State(store): State<GuardedDirectoryStore>,
    id: Result<Path<i64>, PathRejection>,
) -> Response {
    let id = match id {
        Ok(Path(id)) => id,
        Err(rejection) => return ctx.fail(ApiError::invalid(rejection.body_text())),
    };
    match store.delete_data_source(id) {
        Ok(true) => ctx.ok(DeletedSource { id }),
        Ok(false) => ctx.fail(ApiError::NotFound(format!("Data source {} not found", id))),
        Err(err) => ctx.fail(ApiError::StorageUnavailable(err)),
    }
}

async fn submit_candidate(
    _session: AdminSession,
    ctx: RequestContext,
    State(store): State<GuardedDirectoryStore>,
    body: Result<Json<NewToolCandidate>, JsonRejection>,
) -> Response {
    let candidate = match body {
        Ok(Json(candidate)) => candidate,
        Err(rejection) => return ctx.fail(ApiError::invalid(rejection.body_text())),
    };
    if let Err(err) = validate_candidate(&candidate) {
        return ctx.fail(err);
    }

    match store.insert_candidate(&candidate) {
        Ok(tool) => {
            info!("Ingested candidate {} as {}", tool.slug, tool.id);
            ctx.respond(StatusCode::CREATED, tool)
        }
        Err(err) => ctx.fail(err.into()),
    }
}

async fn list_pending(
    _session: AdminSession,
    ctx: RequestContext,
    State(executor): State<GuardedQueryExecutor>,
    raw: Result<Query<HashMap<String, String>>, QueryRejection>,
) -> Response {
    let raw = match raw {
        Ok(Query(raw)) => raw,
        Err(rejection) => return ctx.fail(ApiError::invalid(rejection.body_text())),
    };
    let request = match parse_search_request(&raw) {
        Ok(request) => request,
        Err(errors) => return ctx.fail(errors.into()),
    };
    match executor.search_with_statuses(&request, &[ToolStatus::Pending]) {
        Ok(page) => ctx.ok(page),
        Err(err) => ctx.fail(err.into()),
    }
}

fn review(state: &ServerState, ctx: &RequestContext, id: &str, status: ToolStatus) -> Response {
    match state.store.review_tool(id, status) {
        Ok(StatusTransition::Applied(tool)) => {
            info!("Tool {} is now {}", tool.id, status.as_str());
            state.executor.invalidate();
            ctx.ok(tool)
        }
        Ok(StatusTransition::NotFound) => {
            ctx.fail(ApiError::NotFound(format!("Tool '{}' not found", id)))
        }
        Ok(StatusTransition::NotPending(current)) => ctx.fail(ApiError::invalid(format!(
            "Tool '{}' is {} and can no longer be reviewed",
            id,
            current.as_str()
        ))),
        Err(err) => ctx.fail(ApiError::StorageUnavailable(err)),
    }
}

async fn approve_candidate(
    _session: AdminSession,
    ctx: RequestContext,
    State(state): State<ServerState>,
    id: Result<Path<String>, PathRejection>,
) -> Response {
    match id {
        Ok(Path(id)) => review(&state, &ctx, &id, ToolStatus::Published),
        Err(rejection) => ctx.fail(ApiError::invalid(rejection.body_text())),
    }
}

async fn reject_candidate(
    _session: AdminSession,
    ctx: RequestContext,
    State(state): State<ServerState>,
    id: Result<Path<String>, PathRejection>,
) -> Response {
    match id {
        Ok(Path(id)) => review(&state, &ctx, &id, ToolStatus::Rejected),
        Err(rejection) => ctx.fail(ApiError::invalid(rejection.body_text())),
    }
}

pub fn make_admin_routes(state: ServerState) -> Option<Router> {
    if state.config.admin_token.as_deref().unwrap_or("").is_empty() {
        return None;
    }

    Some(
        Router::new()
            .route("/sources", get(list_sources).post(add_source))
            .route("/sources/{id}", delete(delete_source))
            .route("/ingest", get(list_pending).post(submit_candidate))
            .route("/ingest/{id}/approve", post(approve_candidate))
            .route("/ingest/{id}/reject", post(reject_candidate))
            .with_state(state),
    )
}
