//! Minimal S3-compatible object store client used for clinic file uploads.
//!
//! Speaks path-style `PUT`/`GET`/`DELETE` against a single bucket and signs
//! every request with AWS Signature Version 4, which Cloudflare R2 accepts
//! with region `auto`.

pub mod client;
pub mod error;
pub(crate) mod sigv4;

pub use client::{ObjectStore, ObjectStoreConfig, StoredObject};
pub use error::StorageError;
