//! Public browsing routes: tools, categories, tags and search suggestions.

use crate::search::{parse_search_request, MAX_QUERY_CHARS};
use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::HeaderValue,
    middleware,
    response::Response,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

use super::envelope::{ApiError, RequestContext};
use super::http_layers::{http_cache, CachePolicy};
use super::state::{GuardedDirectoryStore, GuardedQueryExecutor, ServerState};
use crate::directory_store::SearchSuggestion;

pub const CACHE_STATUS_HEADER: &str = "X-Cache";

/// Shorter queries never reach the store.
pub const MIN_SUGGESTION_QUERY_GRAPHEMES: usize = 2;
pub const MAX_SUGGESTIONS: usize = 8;

const CATEGORIES_CACHE_POLICY: CachePolicy = CachePolicy::Shared { s_maxage_sec: 3600 };
const TAGS_CACHE_POLICY: CachePolicy = CachePolicy::Shared { s_maxage_sec: 1800 };

async fn search_tools(
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
        Err(errors) => {
            debug!("Rejected search parameters: {:?}", errors.fields());
            return ctx.fail(errors.into());
        }
    };

    match executor.search(&request) {
        Ok((page, cache_status)) => {
            let mut response = ctx.ok(page);
            response.headers_mut().insert(
                CACHE_STATUS_HEADER,
                HeaderValue::from_static(cache_status.as_header_value()),
            );
            response
        }
        Err(err) => ctx.fail(err.into()),
    }
}

async fn get_tool(
    ctx: RequestContext,
    State(store): State<GuardedDirectoryStore>,
    slug: Result<Path<String>, PathRejection>,
) -> Response {
    let slug = match slug {
        Ok(Path(slug)) => slug,
        Err(rejection) => return ctx.fail(ApiError::invalid(rejection.body_text())),
    };
    match store.get_visible_tool_by_slug(&slug) {
        Ok(Some(tool)) => ctx.ok(tool),
        Ok(None) => ctx.fail(ApiError::NotFound(format!("Tool '{}' not found", slug))),
        Err(err) => ctx.fail(ApiError::StorageUnavailable(err)),
    }
}

async fn list_categories(ctx: RequestContext, State(store): State<GuardedDirectoryStore>) -> Response {
    match store.list_categories() {
        Ok(categories) => ctx.ok(categories),
        Err(err) => ctx.fail(ApiError::StorageUnavailable(err)),
    }
}

async fn list_tags(ctx: RequestContext, State(store): State<GuardedDirectoryStore>) -> Response {
    match store.list_tags() {
        Ok(tags) => ctx.ok(tags),
        Err(err) => ctx.fail(ApiError::StorageUnavailable(err)),
    }
}

#[derive(Deserialize)]
struct SuggestionsQuery {
    #[serde(default)]
    q: String,
}

#[derive(Serialize)]
struct SuggestionsData {
    suggestions: Vec<SearchSuggestion>,
}

async fn search_suggestions(
    ctx: RequestContext,
    State(store): State<GuardedDirectoryStore>,
    query: Result<Query<SuggestionsQuery>, QueryRejection>,
) -> Response {
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => return ctx.fail(ApiError::invalid(rejection.body_text())),
    };
    let text = query.q.trim();
    if text.graphemes(true).count() < MIN_SUGGESTION_QUERY_GRAPHEMES {
        return ctx.ok(SuggestionsData {
            suggestions: vec![],
        });
    }
    if text.chars().count() > MAX_QUERY_CHARS {
        return ctx.fail(ApiError::invalid("Query is too long"));
    }

    match store.suggest(text, MAX_SUGGESTIONS) {
        Ok(suggestions) => ctx.ok(SuggestionsData { suggestions }),
        Err(err) => ctx.fail(ApiError::StorageUnavailable(err)),
    }
}

pub fn make_tools_routes(state: ServerState) -> Router {
    let categories: Router<ServerState> = Router::new()
        .route("/categories", get(list_categories))
        .layer(middleware::from_fn_with_state(
            CATEGORIES_CACHE_POLICY,
            http_cache,
        ));

    let tags: Router<ServerState> = Router::new()
        .route("/tags", get(list_tags))
        .layer(middleware::from_fn_with_state(TAGS_CACHE_POLICY, http_cache));

    Router::new()
        .route("/tools", get(search_tools))
        .route("/tools/{slug}", get(get_tool))
        .route("/search/suggestions", get(search_suggestions))
        .merge(categories)
        .merge(tags)
        .with_state(state)
}
