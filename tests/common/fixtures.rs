//! Seed data for end-to-end tests

use super::constants::*;
use anyhow::{bail, Result};
use mcp_directory_server::directory_store::{
    DirectoryStore, NewToolCandidate, SqliteDirectoryStore, StatusTransition, ToolStatus,
};
use std::path::PathBuf;
use tempfile::TempDir;

fn candidate(slug: &str, name: &str, description: &str, category: &str, tags: &[&str]) -> NewToolCandidate {
    NewToolCandidate {
        slug: slug.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        category_slug: Some(category.to_string()),
        tag_slugs: tags.iter().map(|t| t.to_string()).collect(),
        source_id: None,
    }
}

fn publish(store: &SqliteDirectoryStore, candidate: &NewToolCandidate) -> Result<()> {
    let tool = store.insert_candidate(candidate)?;
    match store.review_tool(&tool.id, ToolStatus::Published)? {
        StatusTransition::Applied(_) => Ok(()),
        other => bail!("Could not publish {}: {:?}", candidate.slug, other),
    }
}

/// Creates a temporary directory database with 2 categories, 3 published
/// tools and 1 pending tool.
/// Returns (temp_dir, db_path)
pub fn create_test_directory() -> Result<(TempDir, PathBuf)> {
    let dir = TempDir::new()?;
    let db_path = dir.path().join("directory.db");

    let store = SqliteDirectoryStore::new(&db_path)?;
    store.upsert_category(CATEGORY_DATABASES, "Databases", "Relational and embedded stores")?;
    store.upsert_category(CATEGORY_DEV_TOOLS, "Developer Tools", "Source control and CI")?;
    store.upsert_tag("sql", "SQL")?;
    store.upsert_tag("official", "Official")?;

    publish(
        &store,
        &candidate(
            POSTGRES_SLUG,
            POSTGRES_NAME,
            "Query PostgreSQL databases",
            CATEGORY_DATABASES,
            &["sql", "official"],
        ),
    )?;
    publish(
        &store,
        &candidate(
            SQLITE_SLUG,
            SQLITE_NAME,
            "Browse local SQLite files",
            CATEGORY_DATABASES,
            &["sql"],
        ),
    )?;
    publish(
        &store,
        &candidate(
            GITHUB_SLUG,
            GITHUB_NAME,
            "Manage GitHub issues and pull requests",
            CATEGORY_DEV_TOOLS,
            &["git", "official"],
        ),
    )?;

    store.insert_candidate(&candidate(
        DRAFT_SLUG,
        "Draft Tool",
        "Not reviewed yet",
        CATEGORY_DEV_TOOLS,
        &["git"],
    ))?;

    Ok((dir, db_path))
}
