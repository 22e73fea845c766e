// Services Layer - Query handlers between the HTTP surface and the store
//
// Each service owns the orchestration for one endpoint family: concurrent
// store fan-out, shaping calls, and the policies (revision resolution,
// media file staleness) the handlers rely on.

pub mod key_service;
pub mod media_service;
pub mod metadata_service;

pub use key_service::KeyService;
pub use media_service::{
    media_content_type, resolve_existing, MediaFileError, MediaService, MediaVariantKind,
};
pub use metadata_service::MetadataService;
