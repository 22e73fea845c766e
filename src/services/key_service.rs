// KeyService - Query handler for the key endpoints
//
// Orchestrates the store fan-out and the shaping calls for the key list,
// by-id, by-revision and info lookups, and applies the revision resolution
// policy. All independent queries for a request run concurrently; only the
// revision-content fetch waits, because it needs the resolved revision id.

use std::sync::Arc;

use anyhow::Result;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::config::ApiConfig;
use crate::repository::KeyStore;
use crate::services::media_service::MediaService;
use crate::shaping::{
    shape_key_detail, shape_key_info, shape_key_list, KeyDetail, KeyInfo, KeyListEntry,
    MediaElement,
};
use crate::types::Language;

/// Revision status required when following a key's own revision pointer
const ACCEPTED_STATUS: &str = "ACCEPTED";

/// Reduced revision content merged into a key detail response
#[derive(Debug)]
struct RevisionContent {
    taxa: Option<JsonValue>,
    characters: Option<JsonValue>,
    statements: Option<JsonValue>,
    mode: Option<String>,
    media_elements: Option<Vec<MediaElement>>,
}

#[derive(Clone)]
pub struct KeyService {
    store: KeyStore,
    media: MediaService,
    config: Arc<ApiConfig>,
}

impl KeyService {
    pub fn new(store: KeyStore, media: MediaService, config: Arc<ApiConfig>) -> Self {
        Self {
            store,
            media,
            config,
        }
    }

    /// All publicly visible keys in list shape, newest first
    pub async fn list_keys(&self) -> Result<Vec<KeyListEntry>> {
        let (keys, languages, collections, media, groups) = tokio::try_join!(
            self.store.list_public_keys(),
            self.store.key_languages(),
            self.store.collection_links(None),
            self.store.key_media_links(None),
            self.store.group_hierarchy(),
        )?;

        Ok(shape_key_list(
            &keys,
            &languages,
            &collections,
            &media,
            &groups,
            &self.config.public_url,
        ))
    }

    /// One key in detail shape, with revision content resolved.
    ///
    /// Without an explicit revision the key's own pointer is followed and
    /// constrained to ACCEPTED; a miss leaves the key without content
    /// fields. An explicit revision widens the status filter to include
    /// PRIVATE keys and fetches the revision unconstrained.
    pub async fn key_by_id(
        &self,
        key_id: Uuid,
        explicit_revision: Option<Uuid>,
    ) -> Result<Option<KeyDetail>> {
        let include_private = explicit_revision.is_some();
        let (rows, collections, publishers, media, groups) = tokio::try_join!(
            self.store.key_rows(key_id, include_private, None),
            self.store.collection_links(Some(key_id)),
            self.store.publisher_links(key_id),
            self.store.key_media_links(Some(key_id)),
            self.store.group_hierarchy(),
        )?;

        let Some(mut detail) = shape_key_detail(
            &rows,
            &collections,
            &publishers,
            &media,
            &groups,
            &self.config.public_url,
        ) else {
            return Ok(None);
        };

        let content = if let Some(revision_id) = explicit_revision {
            self.revision_content(revision_id, None).await?
        } else if let Some(pointer) = detail.revision_id.take() {
            // The pointer is consumed here and stays out of the response
            self.revision_content(pointer, Some(ACCEPTED_STATUS)).await?
        } else {
            None
        };

        if let Some(content) = content {
            detail.taxa = content.taxa;
            detail.characters = content.characters;
            detail.statements = content.statements;
            detail.media_elements = content.media_elements;
            detail.mode = content.mode;
        }

        Ok(Some(detail))
    }

    /// One key in single-language info shape
    pub async fn key_info(&self, key_id: Uuid, language: Language) -> Result<Option<KeyInfo>> {
        let (rows, collections, publishers, media, groups) = tokio::try_join!(
            self.store.key_rows(key_id, false, Some(language)),
            self.store.collection_links(Some(key_id)),
            self.store.publisher_links(key_id),
            self.store.key_media_links(Some(key_id)),
            self.store.group_hierarchy(),
        )?;

        Ok(rows.first().map(|row| {
            shape_key_info(
                row,
                &collections,
                &publishers,
                &media,
                &groups,
                &self.config.public_url,
            )
        }))
    }

    /// The key a revision belongs to
    pub async fn revision_key_id(&self, revision_id: Uuid) -> Result<Option<Uuid>> {
        self.store.revision_key_id(revision_id).await
    }

    /// Fetch a revision and reduce it to the content fields the key shape
    /// carries. An absent row or a row without content is "no content
    /// yet", not an error.
    async fn revision_content(
        &self,
        revision_id: Uuid,
        required_status: Option<&str>,
    ) -> Result<Option<RevisionContent>> {
        let Some(row) = self
            .store
            .revision_content(revision_id, required_status)
            .await?
        else {
            return Ok(None);
        };
        let Some(content) = row.content else {
            return Ok(None);
        };

        let mut reduced = RevisionContent {
            taxa: content.get("taxa").cloned(),
            characters: content.get("characters").cloned(),
            statements: content.get("statements").cloned(),
            mode: row.mode,
            media_elements: None,
        };

        if let Some(elements) = row
            .media
            .as_ref()
            .and_then(|m| m.get("mediaElements"))
            .and_then(JsonValue::as_array)
        {
            let ids: Vec<i64> = elements
                .iter()
                .filter_map(|e| e.get("id").and_then(JsonValue::as_i64))
                .collect();
            reduced.media_elements = Some(self.media.media_elements(&ids).await?);
        }

        Ok(Some(reduced))
    }
}
