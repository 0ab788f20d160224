//! Preview handles for files picked in forms.
//!
//! A selected image gets a local preview URL until it is replaced, removed,
//! or the form goes away. `PreviewField` owns that lifecycle; the allocator
//! behind it (`BlobStore` by default) hands the URLs out and takes them back.

pub mod blobs;
pub mod field;

pub use blobs::BlobStore;
pub use field::{
    FieldState, HandleOrigin, PreviewAllocator, PreviewField, PreviewHandle, SelectedFile, UploadError,
    UploadPolicy, DEFAULT_ACCEPTED_TYPES, DEFAULT_MAX_UPLOAD_BYTES,
};
