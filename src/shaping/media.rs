// Media Shaper
// Synthesizes the public media presentation: every asset is exposed as a
// pair of URL variants (a 128x128 thumbnail and the full file) built from
// the configured public base URL. Raw file paths never leave the store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::repository::MediaTitleRow;

/// Pixel size of the square thumbnail variant
pub const THUMBNAIL_SIZE: u32 = 128;

/// One URL variant of a media asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaVariant {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// Media reference as embedded in key shapes: id plus the two URL variants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaReference {
    pub id: i64,
    #[serde(rename = "mediaElement")]
    pub media_element: Vec<MediaVariant>,
}

/// Media element as embedded in revision content: reference plus an
/// optional per-language title map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaElement {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<BTreeMap<String, String>>,
    #[serde(rename = "mediaElement")]
    pub media_element: Vec<MediaVariant>,
}

fn media_variants(id: i64, base_url: &str) -> Vec<MediaVariant> {
    let base = base_url.trim_end_matches('/');
    vec![
        MediaVariant {
            url: format!("{base}/media/thumbnails/{id}"),
            width: Some(THUMBNAIL_SIZE),
            height: Some(THUMBNAIL_SIZE),
        },
        MediaVariant {
            url: format!("{base}/media/{id}"),
            width: None,
            height: None,
        },
    ]
}

/// Expand bare media ids into references with their URL variants,
/// preserving input order
pub fn media_references(ids: &[i64], base_url: &str) -> Vec<MediaReference> {
    ids.iter()
        .map(|&id| MediaReference {
            id,
            media_element: media_variants(id, base_url),
        })
        .collect()
}

/// Expand bare media ids into full elements with localized titles.
/// Ids without any title row still appear, just without a `title` field.
pub fn shape_media_elements(
    ids: &[i64],
    titles: &[MediaTitleRow],
    base_url: &str,
) -> Vec<MediaElement> {
    ids.iter()
        .map(|&id| {
            let mut title_map = BTreeMap::new();
            for row in titles.iter().filter(|t| t.media_id == id) {
                title_map.insert(row.language_code.clone(), row.title.clone());
            }
            MediaElement {
                id,
                title: (!title_map.is_empty()).then_some(title_map),
                media_element: media_variants(id, base_url),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn title_row(media_id: i64, language_code: &str, title: &str) -> MediaTitleRow {
        MediaTitleRow {
            media_id,
            language_code: language_code.to_string(),
            title: title.to_string(),
        }
    }

    #[test]
    fn test_references_have_exactly_two_variants() {
        let refs = media_references(&[7, 8], "https://api.test.org");
        assert_eq!(refs.len(), 2);
        for reference in &refs {
            assert_eq!(reference.media_element.len(), 2);
        }
        assert_eq!(
            refs[0].media_element[0].url,
            "https://api.test.org/media/thumbnails/7"
        );
        assert_eq!(refs[0].media_element[0].width, Some(128));
        assert_eq!(refs[0].media_element[0].height, Some(128));
        assert_eq!(refs[0].media_element[1].url, "https://api.test.org/media/7");
        assert_eq!(refs[0].media_element[1].width, None);
    }

    #[test]
    fn test_references_are_idempotent() {
        let first = media_references(&[1, 2, 3], "https://api.test.org/");
        let second = media_references(&[1, 2, 3], "https://api.test.org/");
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_elements_preserve_input_order() {
        let elements = shape_media_elements(&[9, 3, 5], &[], "https://api.test.org");
        let ids: Vec<i64> = elements.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![9, 3, 5]);
    }

    #[test]
    fn test_elements_attach_titles_per_language() {
        let titles = vec![
            title_row(3, "no", "Bjørk"),
            title_row(3, "en", "Birch"),
            title_row(5, "en", "Oak"),
        ];
        let elements = shape_media_elements(&[3, 5, 9], &titles, "https://api.test.org");

        let birch = elements[0].title.as_ref().unwrap();
        assert_eq!(birch.get("no").map(String::as_str), Some("Bjørk"));
        assert_eq!(birch.get("en").map(String::as_str), Some("Birch"));

        let oak = elements[1].title.as_ref().unwrap();
        assert_eq!(oak.len(), 1);

        // No title rows: element still present, title omitted entirely
        assert!(elements[2].title.is_none());
        let json = serde_json::to_value(&elements[2]).unwrap();
        assert!(json.get("title").is_none());
        assert_eq!(json["mediaElement"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_serialized_field_spelling() {
        let refs = media_references(&[1], "https://api.test.org");
        let json = serde_json::to_value(&refs[0]).unwrap();
        assert!(json.get("mediaElement").is_some());
        assert!(json.get("media_element").is_none());
        // Full variant omits the dimension fields rather than nulling them
        assert!(json["mediaElement"][1].get("width").is_none());
    }
}
