use anyhow::{Context, Result};
use chrono::DateTime;
use clap::Parser;
use std::collections::HashMap;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use mcp_directory_server::directory_store::{ResultPage, SqliteDirectoryStore};
use mcp_directory_server::search::{parse_search_request, NoOpQueryCache, QueryExecutor};

fn parse_db_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s).canonicalize()?;
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

/// Runs tool searches against a directory database, one query per line.
#[derive(Parser, Debug)]
struct CliArgs {
    #[clap(value_parser = parse_db_path)]
    pub db_path: PathBuf,

    /// latest, popular or relevance.
    #[clap(long, default_value = "relevance")]
    pub sort: String,

    #[clap(long)]
    pub category: Option<String>,

    /// Comma separated tag slugs, all of which must match.
    #[clap(long)]
    pub tags: Option<String>,

    #[clap(long, default_value_t = 20)]
    pub page_size: u32,
}

fn print_page(query: &str, page: &ResultPage) {
    if page.items.is_empty() {
        println!("No matches found for \"{}\".", query);
        return;
    }
    println!(
        "Showing {} of {} matches for \"{}\":\n",
        page.items.len(),
        page.total,
        query
    );
    for tool in &page.items {
        let added = DateTime::from_timestamp(tool.created_at, 0)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "?".to_string());
        println!(
            "{} ({}) [{}] pop={} added={} tags={}",
            tool.name,
            tool.slug,
            tool.category.as_deref().unwrap_or("-"),
            tool.popularity,
            added,
            tool.tags.join(",")
        );
    }
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();
    println!("Cli Search opening {}...", cli_args.db_path.display());

    let store = SqliteDirectoryStore::new(&cli_args.db_path)
        .with_context(|| format!("Could not open {}", cli_args.db_path.display()))?;
    let executor = QueryExecutor::new(Arc::new(store), Arc::new(NoOpQueryCache), Duration::ZERO);
    println!("Done!");

    let mut base_params = HashMap::new();
    base_params.insert("sort".to_string(), cli_args.sort.clone());
    base_params.insert("pageSize".to_string(), cli_args.page_size.to_string());
    if let Some(category) = &cli_args.category {
        base_params.insert("category".to_string(), category.clone());
    }
    if let Some(tags) = &cli_args.tags {
        base_params.insert("tags".to_string(), tags.clone());
    }

    println!("Please enter your search query:");
    for line in io::stdin().lock().lines() {
        let line = line.context("Failed to read line")?;
        let query = line.trim();

        let mut params = base_params.clone();
        params.insert("q".to_string(), query.to_string());

        match parse_search_request(&params) {
            Ok(request) => match executor.search(&request) {
                Ok((page, _)) => print_page(query, &page),
                Err(err) => println!("Search failed: {:#}", anyhow::Error::from(err)),
            },
            Err(errors) => {
                for error in errors.0 {
                    println!("Invalid {}: {}", error.field, error.message);
                }
            }
        }
        println!("\nPlease enter your search query:");
    }
    Ok(())
}
