// Key Shaper
// The core of the service: turns raw joined key rows into the public Key
// shapes. Three variants share the same building blocks: the list shape
// (multi-language title map, one entry per key), the info shape (single
// language, scalar title/description) and the detail shape (by-id lookup,
// language-keyed maps, revision content merged in by the service layer).

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::warn;
use uuid::Uuid;

use crate::repository::{
    CollectionLinkRow, GroupRow, KeyDetailRow, KeyLanguageRow, KeyListRow, KeyMediaRow,
    PublisherLinkRow,
};
use crate::shaping::media::{media_references, MediaElement, MediaReference};

/// Upper bound on the classification walk. The group tree is shallow in
/// practice; anything deeper than this is malformed data.
pub const MAX_CLASSIFICATION_DEPTH: usize = 32;

/// One ancestor entry in a key's classification chain, root first
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub id: Uuid,
    #[serde(rename = "scientificName")]
    pub scientific_name: String,
}

/// Public list shape of a key
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyListEntry {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub status: String,
    pub languages: Vec<String>,
    pub title: BTreeMap<String, String>,
    pub collections: Vec<Uuid>,
    pub media: Vec<MediaReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<Vec<Classification>>,
    pub created: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

/// Public single-language shape of a key (the /keys/info endpoint)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyInfo {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creators: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contributors: Option<JsonValue>,
    #[serde(rename = "language_code")]
    pub language_code: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub publishers: Vec<Uuid>,
    pub collections: Vec<Uuid>,
    pub media: Vec<MediaReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<Vec<Classification>>,
    pub created: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

/// Public by-id shape of a key. Title and description are language-keyed
/// maps; the revision content fields stay empty until the service layer
/// resolves a revision for the key.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyDetail {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creators: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contributors: Option<JsonValue>,
    pub title: BTreeMap<String, String>,
    pub description: BTreeMap<String, String>,
    pub publishers: Vec<Uuid>,
    pub collections: Vec<Uuid>,
    pub media: Vec<MediaReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<Vec<Classification>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision_id: Option<Uuid>,
    pub created: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taxa: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub characters: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statements: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_elements: Option<Vec<MediaElement>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

/// Flatten a key's group ancestry into a root-to-leaf chain.
///
/// Walks the (group -> parent) adjacency list bottom-up, reading only the
/// English localized name at each level. A missing group or missing `en`
/// name row truncates the chain silently; a cycle or a chain deeper than
/// [`MAX_CLASSIFICATION_DEPTH`] truncates with a warning.
pub fn flatten_classification(group_id: Uuid, groups: &[GroupRow]) -> Vec<Classification> {
    let mut chain = Vec::new();
    let mut visited = HashSet::new();
    let mut current = Some(group_id);

    while let Some(id) = current {
        if !visited.insert(id) {
            warn!(group_id = %id, "cycle in group hierarchy, truncating classification");
            break;
        }
        if chain.len() >= MAX_CLASSIFICATION_DEPTH {
            warn!(group_id = %id, "group hierarchy exceeds depth bound, truncating");
            break;
        }
        let Some(group) = groups
            .iter()
            .find(|g| g.id == id && g.language_code == "en")
        else {
            break;
        };
        chain.push(Classification {
            id,
            scientific_name: group.name.clone(),
        });
        current = group.parent_id;
    }

    chain.reverse();
    chain
}

/// Shape the key list: one entry per distinct key id, store order
/// (created_at descending) preserved, localized titles merged into a map.
pub fn shape_key_list(
    keys: &[KeyListRow],
    languages: &[KeyLanguageRow],
    collections: &[CollectionLinkRow],
    media: &[KeyMediaRow],
    groups: &[GroupRow],
    base_url: &str,
) -> Vec<KeyListEntry> {
    // First occurrence wins; later rows for the same id only contribute
    // their alternate-language title.
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for row in keys {
        if !seen.insert(row.id) {
            continue;
        }

        let key_languages: Vec<String> = languages
            .iter()
            .filter(|l| l.key_id == row.id)
            .map(|l| l.language_code.clone())
            .collect();

        let mut title = BTreeMap::new();
        title.insert(row.language_code.clone(), row.title.clone());
        if key_languages.len() > 1 {
            // Best-effort merge: pick the other language variant of this key
            if let Some(alternate) = keys
                .iter()
                .find(|alt| alt.id == row.id && alt.language_code != row.language_code)
            {
                title.insert(alternate.language_code.clone(), alternate.title.clone());
            }
        }

        let key_collections = collections
            .iter()
            .filter(|c| c.key_id == row.id)
            .map(|c| c.collection_id)
            .collect();

        let media_ids: Vec<i64> = media
            .iter()
            .filter(|m| m.key_id == row.id)
            .map(|m| m.media_id)
            .collect();

        entries.push(KeyListEntry {
            id: row.id,
            version: row.version.clone(),
            status: row.status.clone(),
            languages: key_languages,
            title,
            collections: key_collections,
            media: media_references(&media_ids, base_url),
            classification: row.group_id.map(|g| flatten_classification(g, groups)),
            created: row.created_at,
            last_modified: row.updated_at,
        });
    }

    entries
}

fn linked_collections(key_id: Uuid, collections: &[CollectionLinkRow]) -> Vec<Uuid> {
    collections
        .iter()
        .filter(|c| c.key_id == key_id)
        .map(|c| c.collection_id)
        .collect()
}

fn linked_publishers(key_id: Uuid, publishers: &[PublisherLinkRow]) -> Vec<Uuid> {
    publishers
        .iter()
        .filter(|p| p.key_id == key_id)
        .map(|p| p.organization_id)
        .collect()
}

fn linked_media(key_id: Uuid, media: &[KeyMediaRow]) -> Vec<i64> {
    media
        .iter()
        .filter(|m| m.key_id == key_id)
        .map(|m| m.media_id)
        .collect()
}

/// Shape a single localized key row into the info shape
pub fn shape_key_info(
    row: &KeyDetailRow,
    collections: &[CollectionLinkRow],
    publishers: &[PublisherLinkRow],
    media: &[KeyMediaRow],
    groups: &[GroupRow],
    base_url: &str,
) -> KeyInfo {
    let media_ids = linked_media(row.id, media);

    KeyInfo {
        id: row.id,
        version: row.version.clone(),
        status: row.status.clone(),
        creators: row.creators.clone(),
        contributors: row.contributors.clone(),
        language_code: row.language_code.clone(),
        title: row.title.clone(),
        description: row.description.clone(),
        publishers: linked_publishers(row.id, publishers),
        collections: linked_collections(row.id, collections),
        media: media_references(&media_ids, base_url),
        classification: row.group_id.map(|g| flatten_classification(g, groups)),
        created: row.created_at,
        last_modified: row.updated_at,
    }
}

/// Shape the by-id lookup result. One row yields single-entry maps; more
/// rows merge every localized title and description into the maps. Zero
/// rows yield None; the caller maps that to a 404, never to `{}`.
pub fn shape_key_detail(
    rows: &[KeyDetailRow],
    collections: &[CollectionLinkRow],
    publishers: &[PublisherLinkRow],
    media: &[KeyMediaRow],
    groups: &[GroupRow],
    base_url: &str,
) -> Option<KeyDetail> {
    let base = rows.first()?;

    let mut title = BTreeMap::new();
    let mut description = BTreeMap::new();
    for row in rows {
        title.insert(row.language_code.clone(), row.title.clone());
        if let Some(text) = &row.description {
            description.insert(row.language_code.clone(), text.clone());
        }
    }

    let media_ids = linked_media(base.id, media);

    Some(KeyDetail {
        id: base.id,
        version: base.version.clone(),
        status: base.status.clone(),
        creators: base.creators.clone(),
        contributors: base.contributors.clone(),
        title,
        description,
        publishers: linked_publishers(base.id, publishers),
        collections: linked_collections(base.id, collections),
        media: media_references(&media_ids, base_url),
        classification: base.group_id.map(|g| flatten_classification(g, groups)),
        revision_id: base.revision_id,
        created: base.created_at,
        last_modified: base.updated_at,
        taxa: None,
        characters: None,
        statements: None,
        media_elements: None,
        mode: None,
    })
}
