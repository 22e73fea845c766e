// Tests for the key-shaping pipeline
// These drive the full shaping path over fixture rows, the way the query
// handlers do after their concurrent store fan-out, and assert on the
// serialized JSON contract.

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use pretty_assertions::assert_eq;
use uuid::Uuid;

use keyapi::repository::{
    CollectionLinkRow, GroupRow, KeyDetailRow, KeyLanguageRow, KeyListRow, KeyMediaRow,
    PublisherLinkRow,
};
use keyapi::{shape_key_detail, shape_key_list};

const BASE_URL: &str = "https://keys.test.org";

fn ts(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(seconds, 0).unwrap()
}

fn list_row(
    id: Uuid,
    group_id: Option<Uuid>,
    language: &str,
    title: &str,
    created: i64,
) -> KeyListRow {
    KeyListRow {
        id,
        group_id,
        version: Some("1.0".to_string()),
        status: "PUBLISHED".to_string(),
        created_at: ts(created),
        updated_at: ts(created + 60),
        title: title.to_string(),
        language_code: language.to_string(),
    }
}

fn language_row(key_id: Uuid, language: &str) -> KeyLanguageRow {
    KeyLanguageRow {
        key_id,
        language_code: language.to_string(),
    }
}

fn group_row(id: Uuid, language: &str, name: &str, parent_id: Option<Uuid>) -> GroupRow {
    GroupRow {
        id,
        language_code: language.to_string(),
        name: name.to_string(),
        parent_id,
    }
}

struct Fixture {
    fungi: Uuid,
    lichens: Uuid,
    kingdom: Uuid,
    phylum: Uuid,
    collection: Uuid,
    keys: Vec<KeyListRow>,
    languages: Vec<KeyLanguageRow>,
    collections: Vec<CollectionLinkRow>,
    media: Vec<KeyMediaRow>,
    groups: Vec<GroupRow>,
}

fn fixture() -> Fixture {
    let fungi = Uuid::new_v4();
    let lichens = Uuid::new_v4();
    let kingdom = Uuid::new_v4();
    let phylum = Uuid::new_v4();
    let collection = Uuid::new_v4();

    Fixture {
        fungi,
        lichens,
        kingdom,
        phylum,
        collection,
        // Store order: created_at descending, bilingual key first with one
        // row per language variant
        keys: vec![
            list_row(fungi, Some(phylum), "no", "Storsopper", 2_000),
            list_row(fungi, Some(phylum), "en", "Mushrooms", 2_000),
            list_row(lichens, None, "no", "Lav", 1_000),
        ],
        languages: vec![
            language_row(fungi, "no"),
            language_row(fungi, "en"),
            language_row(lichens, "no"),
        ],
        collections: vec![CollectionLinkRow {
            key_id: fungi,
            collection_id: collection,
        }],
        media: vec![
            KeyMediaRow {
                key_id: fungi,
                media_id: 11,
            },
            KeyMediaRow {
                key_id: fungi,
                media_id: 12,
            },
        ],
        groups: vec![
            group_row(kingdom, "en", "Fungi", None),
            group_row(kingdom, "no", "Sopper", None),
            group_row(phylum, "en", "Basidiomycota", Some(kingdom)),
            group_row(phylum, "no", "Stilksporesopper", Some(kingdom)),
        ],
    }
}

#[test]
fn test_list_pipeline_end_to_end() -> Result<()> {
    let f = fixture();
    let entries = shape_key_list(
        &f.keys,
        &f.languages,
        &f.collections,
        &f.media,
        &f.groups,
        BASE_URL,
    );

    // One entry per key id, store order preserved
    let ids: Vec<Uuid> = entries.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![f.fungi, f.lichens]);
    assert!(entries[0].created >= entries[1].created);

    // Bilingual key: merged title map, both language codes listed
    let fungi = &entries[0];
    assert_eq!(fungi.title.get("no").map(String::as_str), Some("Storsopper"));
    assert_eq!(fungi.title.get("en").map(String::as_str), Some("Mushrooms"));
    assert_eq!(fungi.languages, vec!["no".to_string(), "en".to_string()]);
    assert_eq!(fungi.collections, vec![f.collection]);

    // Media expanded inline with the two URL variants
    assert_eq!(fungi.media.len(), 2);
    assert_eq!(
        fungi.media[0].media_element[0].url,
        format!("{BASE_URL}/media/thumbnails/11")
    );
    assert_eq!(
        fungi.media[0].media_element[1].url,
        format!("{BASE_URL}/media/11")
    );

    // Classification walks to the root using English names only
    let classification = fungi.classification.as_ref().unwrap();
    assert_eq!(classification.len(), 2);
    assert_eq!(classification[0].id, f.kingdom);
    assert_eq!(classification[0].scientific_name, "Fungi");
    assert_eq!(classification[1].id, f.phylum);
    assert_eq!(classification[1].scientific_name, "Basidiomycota");

    // Monolingual key: single title entry, no classification field
    let lichens = &entries[1];
    assert_eq!(lichens.title.len(), 1);
    assert!(lichens.classification.is_none());

    Ok(())
}

#[test]
fn test_list_serialized_contract() -> Result<()> {
    let f = fixture();
    let entries = shape_key_list(
        &f.keys,
        &f.languages,
        &f.collections,
        &f.media,
        &f.groups,
        BASE_URL,
    );
    let json = serde_json::to_value(&entries)?;

    let first = &json[0];
    assert!(first.get("created").is_some());
    assert!(first.get("lastModified").is_some());
    assert!(first.get("created_at").is_none());
    assert!(first.get("updated_at").is_none());
    assert!(first.get("groupId").is_none());
    assert!(first.get("group_id").is_none());
    assert_eq!(
        first["classification"][0]["scientificName"],
        serde_json::json!("Fungi")
    );
    assert_eq!(first["media"][0]["mediaElement"][0]["width"], 128);
    assert_eq!(first["media"][0]["mediaElement"][0]["height"], 128);
    // Full-size variant carries no dimensions at all
    assert!(first["media"][0]["mediaElement"][1].get("width").is_none());

    // The second entry omits classification entirely
    assert!(json[1].get("classification").is_none());

    Ok(())
}

#[test]
fn test_list_shaping_is_idempotent() -> Result<()> {
    let f = fixture();
    let first = serde_json::to_string(&shape_key_list(
        &f.keys,
        &f.languages,
        &f.collections,
        &f.media,
        &f.groups,
        BASE_URL,
    ))?;
    let second = serde_json::to_string(&shape_key_list(
        &f.keys,
        &f.languages,
        &f.collections,
        &f.media,
        &f.groups,
        BASE_URL,
    ))?;
    assert_eq!(first, second);

    Ok(())
}

fn detail_row(
    id: Uuid,
    revision_id: Option<Uuid>,
    language: &str,
    title: &str,
    description: Option<&str>,
) -> KeyDetailRow {
    KeyDetailRow {
        id,
        group_id: None,
        revision_id,
        version: Some("3.2".to_string()),
        status: "PUBLISHED".to_string(),
        creators: Some(serde_json::json!(["Asker, A."])),
        contributors: None,
        created_at: ts(5_000),
        updated_at: ts(6_000),
        title: title.to_string(),
        description: description.map(str::to_string),
        language_code: language.to_string(),
    }
}

#[test]
fn test_detail_pipeline_multi_language() -> Result<()> {
    let key = Uuid::new_v4();
    let revision = Uuid::new_v4();
    let publisher = Uuid::new_v4();
    let rows = vec![
        detail_row(key, Some(revision), "no", "Storsopper", Some("Norske storsopper")),
        detail_row(key, Some(revision), "en", "Mushrooms", None),
    ];
    let publishers = vec![PublisherLinkRow {
        key_id: key,
        organization_id: publisher,
    }];
    let media = vec![KeyMediaRow {
        key_id: key,
        media_id: 7,
    }];

    let detail = shape_key_detail(&rows, &[], &publishers, &media, &[], BASE_URL).unwrap();

    assert_eq!(detail.title.len(), 2);
    assert_eq!(detail.description.len(), 1);
    assert_eq!(detail.publishers, vec![publisher]);
    assert_eq!(detail.revision_id, Some(revision));
    assert_eq!(detail.media[0].id, 7);

    // Content fields stay absent until a revision is resolved
    let json = serde_json::to_value(&detail)?;
    assert!(json.get("taxa").is_none());
    assert!(json.get("characters").is_none());
    assert!(json.get("statements").is_none());
    assert!(json.get("mediaElements").is_none());
    assert!(json.get("mode").is_none());
    assert!(json.get("created_at").is_none());
    assert_eq!(json["creators"], serde_json::json!(["Asker, A."]));

    Ok(())
}

#[test]
fn test_detail_absent_for_zero_rows() {
    // "Not found" is an absent result, never an empty object
    assert!(shape_key_detail(&[], &[], &[], &[], &[], BASE_URL).is_none());
}
