//! Shared constants for end-to-end tests
//!
//! When the seeded directory changes, update only this file and fixtures.rs.

// ============================================================================
// Admin
// ============================================================================

/// Bearer token the test server accepts on /api/admin routes
pub const ADMIN_TOKEN: &str = "test-admin-token";

// ============================================================================
// Seeded categories
// ============================================================================

pub const CATEGORY_DATABASES: &str = "databases";
pub const CATEGORY_DEV_TOOLS: &str = "dev-tools";

// ============================================================================
// Seeded tools
// ============================================================================

/// Published, category databases, tags sql + official
pub const POSTGRES_SLUG: &str = "postgres-mcp";
pub const POSTGRES_NAME: &str = "Postgres MCP";

/// Published, category databases, tag sql
pub const SQLITE_SLUG: &str = "sqlite-explorer";
pub const SQLITE_NAME: &str = "SQLite Explorer";

/// Published, category dev-tools, tags git + official
pub const GITHUB_SLUG: &str = "github-mcp";
pub const GITHUB_NAME: &str = "GitHub MCP";

/// Left pending, never visible to anonymous callers
pub const DRAFT_SLUG: &str = "draft-tool";

/// Number of tools visible after seeding
pub const VISIBLE_TOOL_COUNT: u64 = 3;

// ============================================================================
// Test Timeouts and Configuration
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual HTTP requests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;
