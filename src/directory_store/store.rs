use super::models::{
    CategorySummary, DataSource, NewDataSource, NewToolCandidate, SearchSuggestion,
    SuggestionKind, TagSummary, ToolFilter, ToolOrdering, ToolRows, ToolStatus, ToolSummary,
};
use super::schema::DIRECTORY_VERSIONED_SCHEMAS;
use super::trait_def::{DirectoryStore, StatusTransition, StoreWriteError};
use crate::sqlite_persistence::{open_in_memory_db, open_versioned_db};
use anyhow::{anyhow, Context, Result};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, ToSql};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// Columns selected for every `ToolSummary`, the tag list being folded into a
/// single comma separated column.
const TOOL_SUMMARY_COLUMNS: &str = "t.id, t.slug, t.name, t.description, c.slug, t.status, \
     t.popularity, t.created_at, \
     (SELECT group_concat(g.slug, ',') FROM tool_tags tt JOIN tags g ON g.id = tt.tag_id \
      WHERE tt.tool_id = t.id) AS tag_list";

const TOOL_FROM: &str = "FROM tools t LEFT JOIN categories c ON c.id = t.category_id";

pub struct SqliteDirectoryStore {
    conn: Mutex<Connection>,
}

impl SqliteDirectoryStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path = db_path.as_ref();
        info!("Opening directory database at {:?}", path);
        let conn = open_versioned_db(path, DIRECTORY_VERSIONED_SCHEMAS)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = open_in_memory_db(DIRECTORY_VERSIONED_SCHEMAS)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("directory connection mutex poisoned"))
    }

    /// Creates or renames a category.
    pub fn upsert_category(&self, slug: &str, name: &str, description: &str) -> Result<()> {
        self.conn()?.execute(
            "INSERT INTO categories (slug, name, description) VALUES (?1, ?2, ?3)
             ON CONFLICT(slug) DO UPDATE SET name = excluded.name, description = excluded.description",
            params![slug, name, description],
        )?;
        Ok(())
    }

    /// Creates or renames a tag.
    pub fn upsert_tag(&self, slug: &str, name: &str) -> Result<()> {
        self.conn()?.execute(
            "INSERT INTO tags (slug, name) VALUES (?1, ?2)
             ON CONFLICT(slug) DO UPDATE SET name = excluded.name",
            params![slug, name],
        )?;
        Ok(())
    }

    fn status_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<ToolStatus> {
        let raw: String = row.get(idx)?;
        ToolStatus::parse(&raw).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                rusqlite::types::Type::Text,
                format!("unknown tool status '{}'", raw).into(),
            )
        })
    }

    fn row_to_tool_summary(row: &rusqlite::Row) -> rusqlite::Result<ToolSummary> {
        let tag_list: Option<String> = row.get(8)?;
        let mut tags: Vec<String> = tag_list
            .map(|s| s.split(',').map(str::to_string).collect())
            .unwrap_or_default();
        tags.sort();

        Ok(ToolSummary {
            id: row.get(0)?,
            slug: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            category: row.get(4)?,
            tags,
            status: Self::status_column(row, 5)?,
            popularity: row.get(6)?,
            created_at: row.get(7)?,
        })
    }

    fn row_to_data_source(row: &rusqlite::Row) -> rusqlite::Result<DataSource> {
        Ok(DataSource {
            id: row.get(0)?,
            name: row.get(1)?,
            url: row.get(2)?,
            kind: row.get(3)?,
            enabled: row.get::<_, i64>(4)? != 0,
            created_at: row.get(5)?,
        })
    }

    fn query_tool_by(conn: &Connection, condition: &str, value: &str) -> Result<Option<ToolSummary>> {
        let sql = format!(
            "SELECT {} {} WHERE {} = ?1",
            TOOL_SUMMARY_COLUMNS, TOOL_FROM, condition
        );
        Ok(conn
            .query_row(&sql, params![value], Self::row_to_tool_summary)
            .optional()?)
    }

    fn visible_statuses_sql() -> String {
        status_list_sql(ToolStatus::VISIBLE)
    }
}

fn status_list_sql(statuses: &[ToolStatus]) -> String {
    statuses
        .iter()
        .map(|s| format!("'{}'", s.as_str()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Escapes `%`, `_` and the escape character itself for a `LIKE ... ESCAPE '\'`.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// SQL fragments for a `ToolFilter`. Parameters are positional and appear in
/// the same order as their placeholders.
struct ToolQuerySql {
    where_clause: String,
    where_params: Vec<Box<dyn ToSql>>,
    order_clause: String,
    order_params: Vec<Box<dyn ToSql>>,
}

impl ToolQuerySql {
    fn build(filter: &ToolFilter) -> Self {
        let mut conditions: Vec<String> = Vec::new();
        let mut where_params: Vec<Box<dyn ToSql>> = Vec::new();

        if filter.statuses.is_empty() {
            conditions.push("0".to_string());
        } else {
            conditions.push(format!("t.status IN ({})", placeholders(filter.statuses.len())));
            for status in &filter.statuses {
                where_params.push(Box::new(status.as_str()));
            }
        }

        if let Some(text) = &filter.text {
            let pattern = format!("%{}%", escape_like(text));
            conditions.push(
                "(t.name LIKE ? ESCAPE '\\' OR t.description LIKE ? ESCAPE '\\')".to_string(),
            );
            where_params.push(Box::new(pattern.clone()));
            where_params.push(Box::new(pattern));
        }

        if let Some(category) = &filter.category_slug {
            conditions.push("c.slug = ?".to_string());
            where_params.push(Box::new(category.clone()));
        }

        if !filter.tag_slugs.is_empty() {
            conditions.push(format!(
                "t.id IN (SELECT tt.tool_id FROM tool_tags tt JOIN tags g ON g.id = tt.tag_id \
                 WHERE g.slug IN ({}) GROUP BY tt.tool_id HAVING COUNT(DISTINCT g.slug) = ?)",
                placeholders(filter.tag_slugs.len())
            ));
            for tag in &filter.tag_slugs {
                where_params.push(Box::new(tag.clone()));
            }
            where_params.push(Box::new(filter.tag_slugs.len() as i64));
        }

        let mut order_params: Vec<Box<dyn ToSql>> = Vec::new();
        let order_clause = match (filter.ordering, &filter.text) {
            (ToolOrdering::PopularityDesc, _) => {
                "t.popularity DESC, t.created_at DESC, t.id ASC".to_string()
            }
            (ToolOrdering::RelevanceDesc, Some(text)) => {
                let escaped = escape_like(text);
                order_params.push(Box::new(text.clone()));
                order_params.push(Box::new(format!("{}%", escaped)));
                order_params.push(Box::new(format!("%{}%", escaped)));
                "CASE \
                   WHEN lower(t.name) = lower(?) THEN 3 \
                   WHEN t.name LIKE ? ESCAPE '\\' THEN 2 \
                   WHEN t.name LIKE ? ESCAPE '\\' THEN 1 \
                   ELSE 0 END DESC, t.created_at DESC, t.id ASC"
                    .to_string()
            }
            _ => "t.created_at DESC, t.id ASC".to_string(),
        };

        Self {
            where_clause: conditions.join(" AND "),
            where_params,
            order_clause,
            order_params,
        }
    }
}

impl DirectoryStore for SqliteDirectoryStore {
    fn ping(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }

    fn find_tools(&self, filter: &ToolFilter) -> Result<ToolRows> {
        let conn = self.conn()?;
        let sql = ToolQuerySql::build(filter);

        let count_sql = format!("SELECT COUNT(*) {} WHERE {}", TOOL_FROM, sql.where_clause);
        let total: i64 = conn
            .query_row(
                &count_sql,
                params_from_iter(sql.where_params.iter().map(|p| p.as_ref())),
                |row| row.get(0),
            )
            .context("Failed to count tools")?;

        let items_sql = format!(
            "SELECT {} {} WHERE {} ORDER BY {} LIMIT ? OFFSET ?",
            TOOL_SUMMARY_COLUMNS, TOOL_FROM, sql.where_clause, sql.order_clause
        );
        debug!("find_tools: {}", items_sql);

        let limit = filter.limit as i64;
        let offset = filter.offset as i64;
        let all_params: Vec<&dyn ToSql> = sql
            .where_params
            .iter()
            .chain(sql.order_params.iter())
            .map(|p| p.as_ref())
            .chain([&limit as &dyn ToSql, &offset as &dyn ToSql])
            .collect();

        let mut stmt = conn.prepare(&items_sql)?;
        let items = stmt
            .query_map(all_params.as_slice(), Self::row_to_tool_summary)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read tools")?;

        Ok(ToolRows {
            items,
            total: total.max(0) as u64,
        })
    }

    fn get_tool(&self, id: &str) -> Result<Option<ToolSummary>> {
        let conn = self.conn()?;
        Self::query_tool_by(&conn, "t.id", id)
    }

    fn get_visible_tool_by_slug(&self, slug: &str) -> Result<Option<ToolSummary>> {
        let conn = self.conn()?;
        Ok(Self::query_tool_by(&conn, "t.slug", slug)?.filter(|t| t.status.is_visible()))
    }

    fn list_categories(&self) -> Result<Vec<CategorySummary>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT c.slug, c.name, c.description,
                (SELECT COUNT(*) FROM tools t WHERE t.category_id = c.id AND t.status IN ({}))
             FROM categories c ORDER BY c.name ASC, c.slug ASC",
            Self::visible_statuses_sql()
        );
        let mut stmt = conn.prepare(&sql)?;
        let categories = stmt
            .query_map([], |row| {
                Ok(CategorySummary {
                    slug: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    tool_count: row.get::<_, i64>(3)?.max(0) as u64,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(categories)
    }

    fn list_tags(&self) -> Result<Vec<TagSummary>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT g.slug, g.name,
                (SELECT COUNT(*) FROM tool_tags tt JOIN tools t ON t.id = tt.tool_id
                 WHERE tt.tag_id = g.id AND t.status IN ({}))
             FROM tags g ORDER BY g.name ASC, g.slug ASC",
            Self::visible_statuses_sql()
        );
        let mut stmt = conn.prepare(&sql)?;
        let tags = stmt
            .query_map([], |row| {
                Ok(TagSummary {
                    slug: row.get(0)?,
                    name: row.get(1)?,
                    tool_count: row.get::<_, i64>(2)?.max(0) as u64,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tags)
    }

    fn suggest(&self, text: &str, limit: usize) -> Result<Vec<SearchSuggestion>> {
        let conn = self.conn()?;
        let escaped = escape_like(text);
        let prefix = format!("{}%", escaped);
        let contains = format!("%{}%", escaped);
        let mut suggestions = Vec::with_capacity(limit);

        let tools_sql = format!(
            "SELECT slug, name FROM tools
             WHERE status IN ({}) AND name LIKE ?1 ESCAPE '\\'
             ORDER BY (name LIKE ?2 ESCAPE '\\') DESC, popularity DESC, name ASC
             LIMIT ?3",
            Self::visible_statuses_sql()
        );
        let lookups: [(SuggestionKind, &str); 3] = [
            (SuggestionKind::Tool, tools_sql.as_str()),
            (
                SuggestionKind::Category,
                "SELECT slug, name FROM categories WHERE name LIKE ?1 ESCAPE '\\'
                 ORDER BY (name LIKE ?2 ESCAPE '\\') DESC, name ASC LIMIT ?3",
            ),
            (
                SuggestionKind::Tag,
                "SELECT slug, name FROM tags WHERE name LIKE ?1 ESCAPE '\\'
                 ORDER BY (name LIKE ?2 ESCAPE '\\') DESC, name ASC LIMIT ?3",
            ),
        ];

        for (kind, sql) in lookups {
            let remaining = limit.saturating_sub(suggestions.len());
            if remaining == 0 {
                break;
            }
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt
                .query_map(params![contains, prefix, remaining as i64], |row| {
                    Ok(SearchSuggestion {
                        kind,
                        slug: row.get(0)?,
                        label: row.get(1)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            suggestions.extend(rows);
        }

        Ok(suggestions)
    }

    fn is_favorite(&self, owner: &str, tool_id: &str) -> Result<bool> {
        let conn = self.conn()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM favorites WHERE owner = ?1 AND tool_id = ?2",
                params![owner, tool_id],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn add_favorite(&self, owner: &str, tool_id: &str) -> Result<bool> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO favorites (owner, tool_id) VALUES (?1, ?2)",
            params![owner, tool_id],
        )?;
        if inserted > 0 {
            tx.execute(
                "UPDATE tools SET popularity = popularity + 1 WHERE id = ?1",
                params![tool_id],
            )?;
        }
        tx.commit()?;
        Ok(inserted > 0)
    }

    fn remove_favorite(&self, owner: &str, tool_id: &str) -> Result<bool> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let deleted = tx.execute(
            "DELETE FROM favorites WHERE owner = ?1 AND tool_id = ?2",
            params![owner, tool_id],
        )?;
        if deleted > 0 {
            tx.execute(
                "UPDATE tools SET popularity = MAX(popularity - 1, 0) WHERE id = ?1",
                params![tool_id],
            )?;
        }
        tx.commit()?;
        Ok(deleted > 0)
    }

    fn list_favorites(&self, owner: &str) -> Result<Vec<ToolSummary>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} {} JOIN favorites f ON f.tool_id = t.id
             WHERE f.owner = ?1 AND t.status IN ({})
             ORDER BY f.created_at DESC, t.id ASC",
            TOOL_SUMMARY_COLUMNS,
            TOOL_FROM,
            Self::visible_statuses_sql()
        );
        let mut stmt = conn.prepare(&sql)?;
        let tools = stmt
            .query_map(params![owner], Self::row_to_tool_summary)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tools)
    }

    fn list_data_sources(&self) -> Result<Vec<DataSource>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, url, kind, enabled, created_at FROM data_sources ORDER BY id ASC",
        )?;
        let sources = stmt
            .query_map([], Self::row_to_data_source)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(sources)
    }

    fn add_data_source(&self, source: &NewDataSource) -> Result<DataSource, StoreWriteError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(anyhow::Error::from)?;

        let url_taken = tx
            .query_row(
                "SELECT 1 FROM data_sources WHERE url = ?1",
                params![source.url],
                |_| Ok(()),
            )
            .optional()
            .map_err(anyhow::Error::from)?
            .is_some();
        if url_taken {
            return Err(StoreWriteError::DuplicateUrl(source.url.clone()));
        }

        tx.execute(
            "INSERT INTO data_sources (name, url, kind) VALUES (?1, ?2, ?3)",
            params![source.name, source.url, source.kind],
        )
        .with_context(|| format!("Failed to insert data source {}", source.url))?;
        let id = tx.last_insert_rowid();
        let created = tx
            .query_row(
                "SELECT id, name, url, kind, enabled, created_at FROM data_sources WHERE id = ?1",
                params![id],
                Self::row_to_data_source,
            )
            .map_err(anyhow::Error::from)?;
        tx.commit().map_err(anyhow::Error::from)?;
        debug!("Registered data source {} ({})", created.id, created.url);
        Ok(created)
    }

    fn delete_data_source(&self, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM data_sources WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    fn insert_candidate(
        &self,
        candidate: &NewToolCandidate,
    ) -> Result<ToolSummary, StoreWriteError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(anyhow::Error::from)?;

        let slug_taken = tx
            .query_row(
                "SELECT 1 FROM tools WHERE slug = ?1",
                params![candidate.slug],
                |_| Ok(()),
            )
            .optional()
            .map_err(anyhow::Error::from)?
            .is_some();
        if slug_taken {
            return Err(StoreWriteError::DuplicateSlug(candidate.slug.clone()));
        }

        let category_id: Option<i64> = match &candidate.category_slug {
            None => None,
            Some(slug) => Some(
                tx.query_row(
                    "SELECT id FROM categories WHERE slug = ?1",
                    params![slug],
                    |row| row.get(0),
                )
                .optional()
                .map_err(anyhow::Error::from)?
                .ok_or_else(|| StoreWriteError::UnknownCategory(slug.clone()))?,
            ),
        };

        if let Some(source_id) = candidate.source_id {
            let exists = tx
                .query_row(
                    "SELECT 1 FROM data_sources WHERE id = ?1",
                    params![source_id],
                    |_| Ok(()),
                )
                .optional()
                .map_err(anyhow::Error::from)?
                .is_some();
            if !exists {
                return Err(StoreWriteError::UnknownSource(source_id));
            }
        }

        let id = uuid::Uuid::new_v4().to_string();
        tx.execute(
            "INSERT INTO tools (id, slug, name, description, category_id, status, source_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                id,
                candidate.slug,
                candidate.name,
                candidate.description,
                category_id,
                ToolStatus::Pending.as_str(),
                candidate.source_id
            ],
        )
        .map_err(anyhow::Error::from)?;

        for tag in &candidate.tag_slugs {
            tx.execute(
                "INSERT OR IGNORE INTO tags (slug, name) VALUES (?1, ?1)",
                params![tag],
            )
            .map_err(anyhow::Error::from)?;
            tx.execute(
                "INSERT OR IGNORE INTO tool_tags (tool_id, tag_id)
                 SELECT ?1, id FROM tags WHERE slug = ?2",
                params![id, tag],
            )
            .map_err(anyhow::Error::from)?;
        }

        let created = Self::query_tool_by(&tx, "t.id", &id)?
            .ok_or_else(|| anyhow!("Inserted tool {} could not be read back", id))?;
        tx.commit().map_err(anyhow::Error::from)?;
        Ok(created)
    }

    fn review_tool(&self, id: &str, status: ToolStatus) -> Result<StatusTransition> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let current = tx
            .query_row(
                "SELECT status FROM tools WHERE id = ?1",
                params![id],
                |row| Self::status_column(row, 0),
            )
            .optional()
            .with_context(|| format!("Failed to read status of tool {}", id))?;
        let Some(current) = current else {
            return Ok(StatusTransition::NotFound);
        };
        if current != ToolStatus::Pending {
            return Ok(StatusTransition::NotPending(current));
        }

        tx.execute(
            "UPDATE tools SET status = ?1, reviewed_at = cast(strftime('%s','now') as int)
             WHERE id = ?2",
            params![status.as_str(), id],
        )?;
        let updated = Self::query_tool_by(&tx, "t.id", id)?
            .ok_or_else(|| anyhow!("Reviewed tool {} disappeared", id))?;
        tx.commit()?;
        Ok(StatusTransition::Applied(updated))
    }
}
