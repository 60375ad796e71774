//! Parsing of raw query-string input into a bounded `SearchRequest`.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;
pub const MAX_QUERY_CHARS: usize = 200;
pub const MAX_TAGS: usize = 10;

lazy_static! {
    static ref SLUG_REGEX: Regex = Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").unwrap();
}

pub fn is_valid_slug(s: &str) -> bool {
    SLUG_REGEX.is_match(s)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Latest,
    Popular,
    Relevance,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Latest => "latest",
            SortOrder::Popular => "popular",
            SortOrder::Relevance => "relevance",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "latest" => Ok(SortOrder::Latest),
            "popular" => Ok(SortOrder::Popular),
            "relevance" => Ok(SortOrder::Relevance),
            _ => Err(()),
        }
    }
}

/// A validated tool search. Visibility is implicit: only public statuses are
/// ever matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub page: u32,
    pub page_size: u32,
    pub query: Option<String>,
    pub sort: SortOrder,
    pub category_slug: Option<String>,
    pub tag_slugs: BTreeSet<String>,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
            query: None,
            sort: SortOrder::default(),
            category_slug: None,
            tag_slugs: BTreeSet::new(),
        }
    }
}

impl SearchRequest {
    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.page_size as u64
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every field that failed validation, in field order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid search parameters")]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn fields(&self) -> Vec<&'static str> {
        self.0.iter().map(|e| e.field).collect()
    }
}

fn non_empty<'a>(raw: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    raw.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn parse_bounded(
    raw: &HashMap<String, String>,
    field: &'static str,
    default: u32,
    max: u32,
    errors: &mut Vec<FieldError>,
) -> u32 {
    let Some(value) = non_empty(raw, field) else {
        return default;
    };
    match value.parse::<u32>() {
        Ok(n) if (1..=max).contains(&n) => n,
        _ => {
            errors.push(FieldError {
                field,
                message: format!("must be an integer between 1 and {}", max),
            });
            default
        }
    }
}

/// Parses a raw query-string map. All fields are checked independently so
/// that every violation is reported at once.
pub fn parse_search_request(
    raw: &HashMap<String, String>,
) -> Result<SearchRequest, ValidationErrors> {
    let mut errors = Vec::new();

    let page = parse_bounded(raw, "page", DEFAULT_PAGE, u32::MAX, &mut errors);
    let page_size = parse_bounded(raw, "pageSize", DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, &mut errors);

    let query = non_empty(raw, "q").map(str::to_string);
    if let Some(q) = &query {
        if q.chars().count() > MAX_QUERY_CHARS {
            errors.push(FieldError {
                field: "q",
                message: format!("must be at most {} characters", MAX_QUERY_CHARS),
            });
        }
    }

    let sort = match non_empty(raw, "sort") {
        None => SortOrder::default(),
        Some(value) => value.parse().unwrap_or_else(|_| {
            errors.push(FieldError {
                field: "sort",
                message: "must be one of latest, popular, relevance".to_string(),
            });
            SortOrder::default()
        }),
    };

    let category_slug = non_empty(raw, "category").map(str::to_string);
    if let Some(category) = &category_slug {
        if !is_valid_slug(category) {
            errors.push(FieldError {
                field: "category",
                message: format!("'{}' is not a valid slug", category),
            });
        }
    }

    let tag_slugs: BTreeSet<String> = non_empty(raw, "tags")
        .map(|tags| {
            tags.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    if let Some(bad) = tag_slugs.iter().find(|t| !is_valid_slug(t)) {
        errors.push(FieldError {
            field: "tags",
            message: format!("'{}' is not a valid slug", bad),
        });
    } else if tag_slugs.len() > MAX_TAGS {
        errors.push(FieldError {
            field: "tags",
            message: format!("at most {} tags are allowed", MAX_TAGS),
        });
    }

    if !errors.is_empty() {
        return Err(ValidationErrors(errors));
    }

    Ok(SearchRequest {
        page,
        page_size,
        query,
        sort,
        category_slug,
        tag_slugs,
    })
}
