// PostgreSQL Store Access
// Read-only queries against the normalized key schema. Every method is a
// single filtered select; shaping happens downstream on plain row structs.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::types::{KeyStatus, Language};

/// Key row joined with one localized info row, as returned by the list
/// query. A key appears once per language variant.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct KeyListRow {
    pub id: Uuid,
    pub group_id: Option<Uuid>,
    pub version: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub title: String,
    pub language_code: String,
}

/// Key row joined with one localized info row, as returned by the by-id
/// query. Carries the fields the list shape omits.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct KeyDetailRow {
    pub id: Uuid,
    pub group_id: Option<Uuid>,
    pub revision_id: Option<Uuid>,
    pub version: Option<String>,
    pub status: String,
    pub creators: Option<JsonValue>,
    pub contributors: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub title: String,
    pub description: Option<String>,
    pub language_code: String,
}

/// Language availability row for a key
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct KeyLanguageRow {
    pub key_id: Uuid,
    pub language_code: String,
}

/// Link row between a key and a collection
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CollectionLinkRow {
    pub key_id: Uuid,
    pub collection_id: Uuid,
}

/// Link row between a key and a publishing organization
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PublisherLinkRow {
    pub key_id: Uuid,
    pub organization_id: Uuid,
}

/// Link row between a key and a media asset
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct KeyMediaRow {
    pub key_id: Uuid,
    pub media_id: i64,
}

/// Group node with one localized name and its optional parent link.
/// The full set of these rows forms the classification adjacency list.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GroupRow {
    pub id: Uuid,
    pub language_code: String,
    pub name: String,
    pub parent_id: Option<Uuid>,
}

/// Content columns of a revision
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RevisionContentRow {
    pub content: Option<JsonValue>,
    pub media: Option<JsonValue>,
    pub mode: Option<String>,
}

/// File path columns of a media record
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MediaFileRow {
    pub id: i64,
    pub file_path: Option<String>,
    pub thumbnail_path: Option<String>,
}

/// Localized title row for a media asset
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MediaTitleRow {
    pub media_id: i64,
    pub language_code: String,
    pub title: String,
}

/// Organization with localized info for one language
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationRow {
    pub id: Uuid,
    pub full_name: String,
    pub short_name: Option<String>,
    pub description: Option<String>,
    pub home_url: Option<String>,
}

/// Group with localized info for one language (metadata listing shape)
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct GroupListingRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

/// Collection with localized info for one language (metadata listing shape)
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct CollectionListingRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Clone)]
pub struct KeyStore {
    pool: PgPool,
}

impl KeyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> PgPool {
        self.pool.clone()
    }

    fn status_filter(include_private: bool) -> Vec<String> {
        let statuses = if include_private {
            KeyStatus::revision_visible()
        } else {
            KeyStatus::publicly_visible()
        };
        statuses.iter().map(|s| s.to_string()).collect()
    }

    /// All publicly visible keys with their localized titles, newest first
    #[instrument(skip(self))]
    pub async fn list_public_keys(&self) -> Result<Vec<KeyListRow>> {
        let rows = sqlx::query_as::<_, KeyListRow>(
            r#"
            SELECT
                k.id,
                k.group_id,
                k.version,
                k.status,
                k.created_at,
                k.updated_at,
                ki.title,
                ki.language_code
            FROM keys k
            JOIN key_info ki ON ki.key_id = k.id
            WHERE k.status = ANY($1)
            ORDER BY k.created_at DESC
            "#,
        )
        .bind(Self::status_filter(false))
        .fetch_all(&self.pool)
        .await
        .context("failed to list keys")?;

        Ok(rows)
    }

    /// Rows for one key, one per localized info row, newest first.
    /// `include_private` widens the status filter for revision lookups;
    /// `language` narrows the join to a single info row.
    #[instrument(skip(self))]
    pub async fn key_rows(
        &self,
        key_id: Uuid,
        include_private: bool,
        language: Option<Language>,
    ) -> Result<Vec<KeyDetailRow>> {
        let rows = sqlx::query_as::<_, KeyDetailRow>(
            r#"
            SELECT
                k.id,
                k.group_id,
                k.revision_id,
                k.version,
                k.status,
                k.creators,
                k.contributors,
                k.created_at,
                k.updated_at,
                ki.title,
                ki.description,
                ki.language_code
            FROM keys k
            JOIN key_info ki ON ki.key_id = k.id
            WHERE k.id = $1
              AND k.status = ANY($2)
              AND ($3::text IS NULL OR ki.language_code = $3)
            ORDER BY k.created_at DESC
            "#,
        )
        .bind(key_id)
        .bind(Self::status_filter(include_private))
        .bind(language.map(|l| l.as_str()))
        .fetch_all(&self.pool)
        .await
        .context("failed to fetch key rows")?;

        Ok(rows)
    }

    /// Language availability for every key
    #[instrument(skip(self))]
    pub async fn key_languages(&self) -> Result<Vec<KeyLanguageRow>> {
        let rows = sqlx::query_as::<_, KeyLanguageRow>(
            r#"
            SELECT key_id, language_code
            FROM key_languages
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("failed to fetch key languages")?;

        Ok(rows)
    }

    /// Collection membership links, for every key or for one
    #[instrument(skip(self))]
    pub async fn collection_links(&self, key_id: Option<Uuid>) -> Result<Vec<CollectionLinkRow>> {
        let rows = sqlx::query_as::<_, CollectionLinkRow>(
            r#"
            SELECT key_id, collection_id
            FROM key_collections
            WHERE ($1::uuid IS NULL OR key_id = $1)
            "#,
        )
        .bind(key_id)
        .fetch_all(&self.pool)
        .await
        .context("failed to fetch collection links")?;

        Ok(rows)
    }

    /// Publisher links for one key
    #[instrument(skip(self))]
    pub async fn publisher_links(&self, key_id: Uuid) -> Result<Vec<PublisherLinkRow>> {
        let rows = sqlx::query_as::<_, PublisherLinkRow>(
            r#"
            SELECT key_id, organization_id
            FROM key_publishers
            WHERE key_id = $1
            "#,
        )
        .bind(key_id)
        .fetch_all(&self.pool)
        .await
        .context("failed to fetch publisher links")?;

        Ok(rows)
    }

    /// Media links, for every key or for one
    #[instrument(skip(self))]
    pub async fn key_media_links(&self, key_id: Option<Uuid>) -> Result<Vec<KeyMediaRow>> {
        let rows = sqlx::query_as::<_, KeyMediaRow>(
            r#"
            SELECT key_id, media_id
            FROM key_media
            WHERE ($1::uuid IS NULL OR key_id = $1)
            "#,
        )
        .bind(key_id)
        .fetch_all(&self.pool)
        .await
        .context("failed to fetch key media links")?;

        Ok(rows)
    }

    /// The whole group tree as an adjacency list, one row per localized name
    #[instrument(skip(self))]
    pub async fn group_hierarchy(&self) -> Result<Vec<GroupRow>> {
        let rows = sqlx::query_as::<_, GroupRow>(
            r#"
            SELECT
                g.id,
                gi.language_code,
                gi.name,
                gp.parent_id
            FROM key_groups g
            JOIN key_group_info gi ON gi.group_id = g.id
            LEFT JOIN key_group_parents gp ON gp.group_id = g.id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("failed to fetch group hierarchy")?;

        Ok(rows)
    }

    /// Content of one revision, optionally constrained to a status
    #[instrument(skip(self))]
    pub async fn revision_content(
        &self,
        revision_id: Uuid,
        status: Option<&str>,
    ) -> Result<Option<RevisionContentRow>> {
        let row = sqlx::query_as::<_, RevisionContentRow>(
            r#"
            SELECT content, media, mode
            FROM revisions
            WHERE id = $1
              AND ($2::text IS NULL OR status = $2)
            "#,
        )
        .bind(revision_id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
        .context("failed to fetch revision content")?;

        Ok(row)
    }

    /// The key a revision belongs to
    #[instrument(skip(self))]
    pub async fn revision_key_id(&self, revision_id: Uuid) -> Result<Option<Uuid>> {
        let key_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT key_id
            FROM key_revisions
            WHERE revision_id = $1
            "#,
        )
        .bind(revision_id)
        .fetch_optional(&self.pool)
        .await
        .context("failed to resolve revision key")?;

        Ok(key_id)
    }

    /// File path record for one media asset
    #[instrument(skip(self))]
    pub async fn media_file(&self, media_id: i64) -> Result<Option<MediaFileRow>> {
        let row = sqlx::query_as::<_, MediaFileRow>(
            r#"
            SELECT id, file_path, thumbnail_path
            FROM media
            WHERE id = $1
            "#,
        )
        .bind(media_id)
        .fetch_optional(&self.pool)
        .await
        .context("failed to fetch media record")?;

        Ok(row)
    }

    /// Localized titles for a set of media assets
    #[instrument(skip(self, media_ids))]
    pub async fn media_titles(&self, media_ids: &[i64]) -> Result<Vec<MediaTitleRow>> {
        let rows = sqlx::query_as::<_, MediaTitleRow>(
            r#"
            SELECT media_id, language_code, title
            FROM media_info
            WHERE media_id = ANY($1)
            "#,
        )
        .bind(media_ids)
        .fetch_all(&self.pool)
        .await
        .context("failed to fetch media titles")?;

        Ok(rows)
    }

    /// Organizations with their info for one language
    #[instrument(skip(self))]
    pub async fn organizations(&self, language: Language) -> Result<Vec<OrganizationRow>> {
        let rows = sqlx::query_as::<_, OrganizationRow>(
            r#"
            SELECT
                o.id,
                oi.full_name,
                oi.short_name,
                oi.description,
                oi.home_url
            FROM organizations o
            JOIN organization_info oi ON oi.organization_id = o.id
            WHERE oi.language_code = $1
            "#,
        )
        .bind(language.as_str())
        .fetch_all(&self.pool)
        .await
        .context("failed to list organizations")?;

        Ok(rows)
    }

    /// Key groups with their info for one language
    #[instrument(skip(self))]
    pub async fn group_listing(&self, language: Language) -> Result<Vec<GroupListingRow>> {
        let rows = sqlx::query_as::<_, GroupListingRow>(
            r#"
            SELECT
                g.id,
                gi.name,
                gi.description
            FROM key_groups g
            JOIN key_group_info gi ON gi.group_id = g.id
            WHERE gi.language_code = $1
            "#,
        )
        .bind(language.as_str())
        .fetch_all(&self.pool)
        .await
        .context("failed to list key groups")?;

        Ok(rows)
    }

    /// Collections with their info for one language
    #[instrument(skip(self))]
    pub async fn collection_listing(&self, language: Language) -> Result<Vec<CollectionListingRow>> {
        let rows = sqlx::query_as::<_, CollectionListingRow>(
            r#"
            SELECT
                c.id,
                ci.name,
                ci.description
            FROM collections c
            JOIN collection_info ci ON ci.collection_id = c.id
            WHERE ci.language_code = $1
            "#,
        )
        .bind(language.as_str())
        .fetch_all(&self.pool)
        .await
        .context("failed to list collections")?;

        Ok(rows)
    }
}
