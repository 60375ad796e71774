use serde::{Deserialize, Serialize};

/// Lifecycle status of a tool listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    /// Ingested, waiting for an admin decision.
    Pending,
    /// Accepted by an admin.
    Approved,
    /// Publicly listed.
    Published,
    /// Refused by an admin.
    Rejected,
}

impl ToolStatus {
    /// Statuses that anonymous callers are allowed to see.
    pub const VISIBLE: &'static [ToolStatus] = &[ToolStatus::Published, ToolStatus::Approved];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolStatus::Pending => "pending",
            ToolStatus::Approved => "approved",
            ToolStatus::Published => "published",
            ToolStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ToolStatus::Pending),
            "approved" => Some(ToolStatus::Approved),
            "published" => Some(ToolStatus::Published),
            "rejected" => Some(ToolStatus::Rejected),
            _ => None,
        }
    }

    pub fn is_visible(&self) -> bool {
        Self::VISIBLE.contains(self)
    }
}

/// Read-only projection of a tool listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSummary {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub description: String,
    /// Slug of the category, if the tool has one.
    pub category: Option<String>,
    /// Tag slugs, sorted.
    pub tags: Vec<String>,
    pub status: ToolStatus,
    pub popularity: i64,
    /// Unix timestamp (seconds).
    pub created_at: i64,
}

/// One page of tools plus the unpaginated match count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultPage {
    pub items: Vec<ToolSummary>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub slug: String,
    pub name: String,
    pub description: String,
    /// Number of visible tools in the category.
    pub tool_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagSummary {
    pub slug: String,
    pub name: String,
    pub tool_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    Tool,
    Category,
    Tag,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSuggestion {
    pub kind: SuggestionKind,
    pub slug: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSource {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub kind: String,
    pub enabled: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDataSource {
    pub name: String,
    pub url: String,
    #[serde(default = "default_source_kind")]
    pub kind: String,
}

fn default_source_kind() -> String {
    "registry".to_string()
}

/// An ingested listing submitted for review. Always stored as pending.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewToolCandidate {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category_slug: Option<String>,
    #[serde(default)]
    pub tag_slugs: Vec<String>,
    pub source_id: Option<i64>,
}

/// Sort order resolved by the query executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolOrdering {
    CreatedDesc,
    PopularityDesc,
    /// Requires a non-empty text filter.
    RelevanceDesc,
}

/// A fully resolved storage query: what to match, how to order, which slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolFilter {
    pub statuses: Vec<ToolStatus>,
    pub text: Option<String>,
    pub category_slug: Option<String>,
    /// Every tag must be present on a matching tool.
    pub tag_slugs: Vec<String>,
    pub ordering: ToolOrdering,
    pub limit: u32,
    pub offset: u64,
}

/// Rows of a tool query plus the unpaginated count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRows {
    pub items: Vec<ToolSummary>,
    pub total: u64,
}
