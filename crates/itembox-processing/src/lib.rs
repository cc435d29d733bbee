//! Photo processing pipeline.
//!
//! Bridges uploaded image bytes to durable resized images on disk, and keeps
//! filesystem state consistent with the item store: uploads are validated,
//! spooled to a temp file, resized to a fixed square, written under a fresh
//! UUID-derived filename, and the temporary original discarded. Removal of a
//! previously stored image is idempotent.

pub mod pipeline;
pub mod resize;
pub mod validator;

pub use pipeline::{PhotoError, PhotoPipeline, StoredPhoto};
pub use resize::{ResizeError, PHOTO_SIZE};
pub use validator::{PhotoValidator, ValidationError};
