use std::fmt;

use thiserror::Error;
use tracing::debug;

use super::BlobStore;
use crate::utils::format_size;

/// Largest accepted upload: 1 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 1024 * 1024;

pub const DEFAULT_ACCEPTED_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/webp"];

/// A file the user picked, read into memory.
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

impl fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("Only image files (JPG, PNG, WEBP) are allowed.")]
    UnsupportedType { mime_type: String },

    #[error("Max file size is {}.", format_size(*max))]
    TooLarge { size: u64, max: u64 },
}

/// What a preview field accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    pub accepted_types: Vec<String>,
    pub max_bytes: u64,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            accepted_types: DEFAULT_ACCEPTED_TYPES.iter().map(|t| t.to_string()).collect(),
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl UploadPolicy {
    pub fn check(&self, file: &SelectedFile) -> Result<(), UploadError> {
        let accepted = self
            .accepted_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(&file.mime_type));
        if !accepted {
            return Err(UploadError::UnsupportedType {
                mime_type: file.mime_type.clone(),
            });
        }
        if file.size() > self.max_bytes {
            return Err(UploadError::TooLarge {
                size: file.size(),
                max: self.max_bytes,
            });
        }
        Ok(())
    }
}

/// Where a preview URL came from. Only local handles are ours to release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleOrigin {
    Local,
    Remote,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewHandle {
    pub url: String,
    pub origin: HandleOrigin,
}

impl PreviewHandle {
    /// Wrap an already-uploaded image URL.
    pub fn remote(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            origin: HandleOrigin::Remote,
        }
    }

    pub fn is_local(&self) -> bool {
        self.origin == HandleOrigin::Local
    }
}

/// Creates and frees local preview handles.
pub trait PreviewAllocator {
    fn create(&self, file: &SelectedFile) -> PreviewHandle;
    fn release(&self, handle: &PreviewHandle);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldState {
    #[default]
    Empty,
    Selected(PreviewHandle),
}

/// One image input on a form.
///
/// Holds at most one handle. Replacing the file releases the old handle
/// before the new one exists; removing it or dropping the field releases it
/// too. Handles wrapping a remote URL are never released.
pub struct PreviewField<A: PreviewAllocator = BlobStore> {
    allocator: A,
    policy: UploadPolicy,
    state: FieldState,
    error: Option<UploadError>,
}

impl<A: PreviewAllocator> PreviewField<A> {
    pub fn new(allocator: A, policy: UploadPolicy) -> Self {
        Self {
            allocator,
            policy,
            state: FieldState::Empty,
            error: None,
        }
    }

    /// Field showing an image that already lives on the server, as on an
    /// edit form.
    pub fn with_remote(allocator: A, policy: UploadPolicy, url: impl Into<String>) -> Self {
        let mut field = Self::new(allocator, policy);
        field.state = FieldState::Selected(PreviewHandle::remote(url));
        field
    }

    /// Take a newly picked file.
    ///
    /// A rejected file records a field error and leaves the current preview
    /// as it was, without allocating anything.
    pub fn select(&mut self, file: &SelectedFile) -> Result<PreviewHandle, UploadError> {
        if let Err(e) = self.policy.check(file) {
            debug!(name = %file.name, error = %e, "Rejected file selection");
            self.error = Some(e.clone());
            return Err(e);
        }

        self.error = None;
        self.release_current();
        let handle = self.allocator.create(file);
        self.state = FieldState::Selected(handle.clone());
        Ok(handle)
    }

    /// Clear the field, releasing its preview.
    pub fn remove(&mut self) {
        self.release_current();
        self.error = None;
    }

    pub fn state(&self) -> &FieldState {
        &self.state
    }

    pub fn handle(&self) -> Option<&PreviewHandle> {
        match &self.state {
            FieldState::Selected(handle) => Some(handle),
            FieldState::Empty => None,
        }
    }

    pub fn url(&self) -> Option<&str> {
        self.handle().map(|h| h.url.as_str())
    }

    pub fn error(&self) -> Option<&UploadError> {
        self.error.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.state == FieldState::Empty
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    fn release_current(&mut self) {
        if let FieldState::Selected(handle) = std::mem::take(&mut self.state) {
            if handle.is_local() {
                self.allocator.release(&handle);
            }
        }
    }
}

impl<A: PreviewAllocator> Drop for PreviewField<A> {
    fn drop(&mut self) {
        self.release_current();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Create(String),
        Release(String),
    }

    #[derive(Clone, Default)]
    struct RecordingAllocator {
        events: Arc<Mutex<Vec<Event>>>,
    }

    impl RecordingAllocator {
        fn events(&self) -> Vec<Event> {
            self.events.lock().unwrap().clone()
        }
    }

    impl PreviewAllocator for RecordingAllocator {
        fn create(&self, file: &SelectedFile) -> PreviewHandle {
            let url = format!("local:{}", file.name);
            self.events.lock().unwrap().push(Event::Create(url.clone()));
            PreviewHandle {
                url,
                origin: HandleOrigin::Local,
            }
        }

        fn release(&self, handle: &PreviewHandle) {
            self.events.lock().unwrap().push(Event::Release(handle.url.clone()));
        }
    }

    fn image(name: &str, size: usize) -> SelectedFile {
        SelectedFile::new(name, "image/png", vec![0; size])
    }

    fn field(allocator: &RecordingAllocator) -> PreviewField<RecordingAllocator> {
        PreviewField::new(allocator.clone(), UploadPolicy::default())
    }

    #[test]
    fn test_replacing_releases_old_before_creating_new() {
        let allocator = RecordingAllocator::default();
        let mut field = field(&allocator);

        field.select(&image("a.png", 10)).expect("a");
        field.select(&image("b.png", 10)).expect("b");
        assert_eq!(field.url(), Some("local:b.png"));
        assert_eq!(
            allocator.events(),
            vec![
                Event::Create("local:a.png".into()),
                Event::Release("local:a.png".into()),
                Event::Create("local:b.png".into()),
            ]
        );
    }

    #[test]
    fn test_remove_releases_and_empties() {
        let allocator = RecordingAllocator::default();
        let mut field = field(&allocator);
        field.select(&image("a.png", 10)).expect("a");

        field.remove();
        assert!(field.is_empty());
        assert_eq!(allocator.events().last(), Some(&Event::Release("local:a.png".into())));

        // Nothing left to release
        field.remove();
        assert_eq!(allocator.events().len(), 2);
    }

    #[test]
    fn test_drop_releases_held_handle() {
        let allocator = RecordingAllocator::default();
        {
            let mut field = field(&allocator);
            field.select(&image("a.png", 10)).expect("a");
        }
        assert_eq!(
            allocator.events(),
            vec![Event::Create("local:a.png".into()), Event::Release("local:a.png".into())]
        );
    }

    #[test]
    fn test_oversize_file_stays_empty_without_allocation() {
        let allocator = RecordingAllocator::default();
        let mut field = field(&allocator);

        let err = field
            .select(&image("huge.png", DEFAULT_MAX_UPLOAD_BYTES as usize + 1))
            .expect_err("too large");
        assert_eq!(err.to_string(), "Max file size is 1MB.");
        assert!(field.is_empty());
        assert_eq!(field.error(), Some(&err));
        assert!(allocator.events().is_empty());
    }

    #[test]
    fn test_disallowed_type_stays_empty_without_allocation() {
        let allocator = RecordingAllocator::default();
        let mut field = field(&allocator);

        let err = field
            .select(&SelectedFile::new("notes.pdf", "application/pdf", vec![1, 2, 3]))
            .expect_err("pdf");
        assert_eq!(err.to_string(), "Only image files (JPG, PNG, WEBP) are allowed.");
        assert!(field.is_empty());
        assert!(allocator.events().is_empty());
    }

    #[test]
    fn test_rejected_file_keeps_current_preview() {
        let allocator = RecordingAllocator::default();
        let mut field = field(&allocator);
        field.select(&image("a.png", 10)).expect("a");

        assert!(field.select(&SelectedFile::new("x.gif", "image/gif", vec![1])).is_err());
        assert_eq!(field.url(), Some("local:a.png"));
        assert!(field.error().is_some());
        assert_eq!(allocator.events().len(), 1);

        // A good file clears the error
        field.select(&image("b.png", 10)).expect("b");
        assert!(field.error().is_none());
    }

    #[test]
    fn test_remote_handle_is_never_released() {
        let allocator = RecordingAllocator::default();
        {
            let mut field = PreviewField::with_remote(
                allocator.clone(),
                UploadPolicy::default(),
                "https://cdn.example.com/cover.png",
            );
            assert_eq!(field.handle().map(|h| h.origin), Some(HandleOrigin::Remote));

            field.select(&image("a.png", 10)).expect("a");
        }
        assert_eq!(
            allocator.events(),
            vec![Event::Create("local:a.png".into()), Event::Release("local:a.png".into())]
        );

        let allocator = RecordingAllocator::default();
        let mut field = PreviewField::with_remote(allocator.clone(), UploadPolicy::default(), "https://x/y.png");
        field.remove();
        drop(field);
        assert!(allocator.events().is_empty());
    }

    #[test]
    fn test_blob_store_field_frees_on_drop() {
        let store = BlobStore::new();
        {
            let mut field: PreviewField = PreviewField::new(store.clone(), UploadPolicy::default());
            let url = field.select(&image("a.jpg", 4)).expect("a").url;
            assert!(store.get(&url).is_some());
            assert_eq!(store.live_count(), 1);
        }
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn test_mime_check_ignores_case() {
        let policy = UploadPolicy::default();
        assert!(policy.check(&SelectedFile::new("a.webp", "IMAGE/WEBP", vec![1])).is_ok());
    }
}
