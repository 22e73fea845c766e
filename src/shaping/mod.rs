// Shaping Pipeline
// Pure functions that turn raw store rows into the public JSON contract.
// Nothing in this module touches the database or the environment; handlers
// fetch rows concurrently and hand them in as slices.

pub mod key;
pub mod media;

pub use key::{
    flatten_classification, shape_key_detail, shape_key_info, shape_key_list, Classification,
    KeyDetail, KeyInfo, KeyListEntry, MAX_CLASSIFICATION_DEPTH,
};
pub use media::{
    media_references, shape_media_elements, MediaElement, MediaReference, MediaVariant,
    THUMBNAIL_SIZE,
};
