// keyapi - Read-only JSON API for taxonomic identification keys
// Root library module

pub mod config;
pub mod http_server;
pub mod observability;
pub mod repository;
pub mod services;
pub mod shaping;
pub mod types;

// Re-export key types
pub use config::ApiConfig;

pub use observability::{init_logging, with_trace_id};

pub use repository::KeyStore;

pub use services::{
    KeyService, MediaFileError, MediaService, MediaVariantKind, MetadataService,
};

pub use shaping::{
    flatten_classification, media_references, shape_key_detail, shape_key_info, shape_key_list,
    shape_media_elements, Classification, KeyDetail, KeyInfo, KeyListEntry, MediaElement,
    MediaReference, MediaVariant,
};

pub use types::{
    KeyStatus, Language, ValidatedKeyId, ValidatedMediaId, ValidatedRevisionId,
};

pub use http_server::{create_server, start_server, AppState};
