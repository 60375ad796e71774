use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::envelope::{ApiError, RequestContext};
use super::session::ClientIdentity;
use super::state::{GuardedDirectoryStore, ServerState};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToolIdQuery {
    tool_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FavoriteBody {
    tool_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteStatus {
    pub tool_id: String,
    pub is_favorited: bool,
}

fn required_tool_id(query: ToolIdQuery) -> Result<String, ApiError> {
    query
        .tool_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::invalid("toolId is required"))
}

async fn get_favorites(
    ctx: RequestContext,
    ClientIdentity(owner): ClientIdentity,
    State(store): State<GuardedDirectoryStore>,
    query: Result<Query<ToolIdQuery>, QueryRejection>,
) -> Response {
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => return ctx.fail(ApiError::invalid(rejection.body_text())),
    };
    let tool_id = query.tool_id.map(|id| id.trim().to_string());
    match tool_id.filter(|id| !id.is_empty()) {
        Some(tool_id) => match store.is_favorite(&owner, &tool_id) {
            Ok(is_favorited) => ctx.ok(FavoriteStatus {
                tool_id,
                is_favorited,
            }),
            Err(err) => ctx.fail(ApiError::StorageUnavailable(err)),
        },
        None => match store.list_favorites(&owner) {
            Ok(tools) => ctx.ok(tools),
            Err(err) => ctx.fail(ApiError::StorageUnavailable(err)),
        },
    }
}

async fn add_favorite(
    ctx: RequestContext,
    ClientIdentity(owner): ClientIdentity,
    State(store): State<GuardedDirectoryStore>,
    body: Result<Json<FavoriteBody>, JsonRejection>,
) -> Response {
    let tool_id = match body {
        Ok(Json(body)) => body.tool_id.trim().to_string(),
        Err(rejection) => return ctx.fail(ApiError::invalid(rejection.body_text())),
    };
    if tool_id.is_empty() {
        return ctx.fail(ApiError::invalid("toolId is required"));
    }

    match store.get_tool(&tool_id) {
        Ok(Some(tool)) if tool.status.is_visible() => {}
        Ok(_) => return ctx.fail(ApiError::NotFound(format!("Tool '{}' not found", tool_id))),
        Err(err) => return ctx.fail(ApiError::StorageUnavailable(err)),
    }

    match store.add_favorite(&owner, &tool_id) {
        Ok(newly_added) => {
            debug!("Favorite {} for {} (new: {})", tool_id, owner, newly_added);
            ctx.respond(
                StatusCode::CREATED,
                FavoriteStatus {
                    tool_id,
                    is_favorited: true,
                },
            )
        }
        Err(err) => ctx.fail(ApiError::StorageUnavailable(err)),
    }
}

async fn remove_favorite(
    ctx: RequestContext,
    ClientIdentity(owner): ClientIdentity,
    State(store): State<GuardedDirectoryStore>,
    query: Result<Query<ToolIdQuery>, QueryRejection>,
) -> Response {
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => return ctx.fail(ApiError::invalid(rejection.body_text())),
    };
    let tool_id = match required_tool_id(query) {
        Ok(tool_id) => tool_id,
        Err(err) => return ctx.fail(err),
    };

    match store.remove_favorite(&owner, &tool_id) {
        Ok(_) => ctx.ok(FavoriteStatus {
            tool_id,
            is_favorited: false,
        }),
        Err(err) => ctx.fail(ApiError::StorageUnavailable(err)),
    }
}

pub fn make_favorites_routes(state: ServerState) -> Router {
    Router::new()
        .route(
            "/favorites",
            get(get_favorites).post(add_favorite).delete(remove_favorite),
        )
        .with_state(state)
}
