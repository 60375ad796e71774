//! SQLite schema definitions for the directory database.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP,
};

// =============================================================================
// Version 1 - Listings, taxonomy and favorites
// =============================================================================

const CATEGORIES_TABLE_V1: Table = Table {
    name: "categories",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("slug", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!(
            "description",
            &SqlType::Text,
            non_null = true,
            default_value = Some("''")
        ),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[],
    unique_constraints: &[],
};

const TAGS_TABLE_V1: Table = Table {
    name: "tags",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("slug", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[],
};

const CATEGORY_FOREIGN_KEY: ForeignKey = ForeignKey {
    foreign_table: "categories",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::SetNull,
};

const TOOLS_TABLE_V1: Table = Table {
    name: "tools",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true),
        sqlite_column!("slug", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!(
            "description",
            &SqlType::Text,
            non_null = true,
            default_value = Some("''")
        ),
        sqlite_column!(
            "category_id",
            &SqlType::Integer,
            foreign_key = Some(&CATEGORY_FOREIGN_KEY)
        ),
        sqlite_column!("status", &SqlType::Text, non_null = true),
        sqlite_column!(
            "popularity",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[
        ("idx_tools_status_created", "status, created_at DESC"),
        ("idx_tools_popularity", "popularity DESC"),
        ("idx_tools_category", "category_id"),
    ],
    unique_constraints: &[],
};

const TOOL_FOREIGN_KEY: ForeignKey = ForeignKey {
    foreign_table: "tools",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const TAG_FOREIGN_KEY: ForeignKey = ForeignKey {
    foreign_table: "tags",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const TOOL_TAGS_TABLE_V1: Table = Table {
    name: "tool_tags",
    columns: &[
        sqlite_column!(
            "tool_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&TOOL_FOREIGN_KEY)
        ),
        sqlite_column!(
            "tag_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&TAG_FOREIGN_KEY)
        ),
    ],
    indices: &[("idx_tool_tags_tag", "tag_id")],
    unique_constraints: &[&["tool_id", "tag_id"]],
};

const FAVORITES_TABLE_V1: Table = Table {
    name: "favorites",
    columns: &[
        sqlite_column!("owner", &SqlType::Text, non_null = true),
        sqlite_column!(
            "tool_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&TOOL_FOREIGN_KEY)
        ),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_favorites_owner", "owner, created_at DESC")],
    unique_constraints: &[&["owner", "tool_id"]],
};

// =============================================================================
// Version 2 - Data sources and review bookkeeping
// =============================================================================

const DATA_SOURCES_TABLE_V2: Table = Table {
    name: "data_sources",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("url", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("kind", &SqlType::Text, non_null = true),
        sqlite_column!(
            "enabled",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("1")
        ),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[],
    unique_constraints: &[],
};

const SOURCE_FOREIGN_KEY: ForeignKey = ForeignKey {
    foreign_table: "data_sources",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::SetNull,
};

/// Columns added in version 2 are appended, matching `ALTER TABLE` order.
const TOOLS_TABLE_V2: Table = Table {
    name: "tools",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true),
        sqlite_column!("slug", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!(
            "description",
            &SqlType::Text,
            non_null = true,
            default_value = Some("''")
        ),
        sqlite_column!(
            "category_id",
            &SqlType::Integer,
            foreign_key = Some(&CATEGORY_FOREIGN_KEY)
        ),
        sqlite_column!("status", &SqlType::Text, non_null = true),
        sqlite_column!(
            "popularity",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "source_id",
            &SqlType::Integer,
            foreign_key = Some(&SOURCE_FOREIGN_KEY)
        ),
        sqlite_column!("reviewed_at", &SqlType::Integer),
    ],
    indices: &[
        ("idx_tools_status_created", "status, created_at DESC"),
        ("idx_tools_popularity", "popularity DESC"),
        ("idx_tools_category", "category_id"),
    ],
    unique_constraints: &[],
};

fn migrate_v1_to_v2(conn: &rusqlite::Connection) -> anyhow::Result<()> {
    DATA_SOURCES_TABLE_V2.create(conn)?;
    conn.execute(
        "ALTER TABLE tools ADD COLUMN source_id INTEGER REFERENCES data_sources(id) ON DELETE SET NULL",
        [],
    )?;
    conn.execute("ALTER TABLE tools ADD COLUMN reviewed_at INTEGER", [])?;
    Ok(())
}

pub static DIRECTORY_VERSIONED_SCHEMAS: &[VersionedSchema] = &[
    VersionedSchema {
        version: 1,
        tables: &[
            CATEGORIES_TABLE_V1,
            TAGS_TABLE_V1,
            TOOLS_TABLE_V1,
            TOOL_TAGS_TABLE_V1,
            FAVORITES_TABLE_V1,
        ],
        migration: None,
    },
    VersionedSchema {
        version: 2,
        tables: &[
            CATEGORIES_TABLE_V1,
            TAGS_TABLE_V1,
            DATA_SOURCES_TABLE_V2,
            TOOLS_TABLE_V2,
            TOOL_TAGS_TABLE_V1,
            FAVORITES_TABLE_V1,
        ],
        migration: Some(migrate_v1_to_v2),
    },
];
