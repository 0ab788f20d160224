use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use super::{HandleOrigin, PreviewAllocator, PreviewHandle, SelectedFile};

const BLOB_URL_PREFIX: &str = "blob:postdesk/";

#[derive(Default)]
struct Registry {
    next_id: u64,
    blobs: HashMap<String, Arc<[u8]>>,
}

/// In-memory registry of selected file contents, addressed by `blob:` URLs.
///
/// Clones share the same registry.
#[derive(Clone, Default)]
pub struct BlobStore {
    registry: Arc<Mutex<Registry>>,
}

impl BlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes behind a live URL.
    pub fn get(&self, url: &str) -> Option<Arc<[u8]>> {
        self.lock().blobs.get(url).cloned()
    }

    /// Number of URLs handed out and not yet released.
    pub fn live_count(&self) -> usize {
        self.lock().blobs.len()
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PreviewAllocator for BlobStore {
    fn create(&self, file: &SelectedFile) -> PreviewHandle {
        let mut registry = self.lock();
        let url = format!("{}{}", BLOB_URL_PREFIX, registry.next_id);
        registry.next_id += 1;
        registry.blobs.insert(url.clone(), Arc::from(file.bytes.as_slice()));
        debug!(url = %url, name = %file.name, size = file.bytes.len(), "Preview created");
        PreviewHandle {
            url,
            origin: HandleOrigin::Local,
        }
    }

    fn release(&self, handle: &PreviewHandle) {
        if self.lock().blobs.remove(&handle.url).is_some() {
            debug!(url = %handle.url, "Preview released");
        } else {
            warn!(url = %handle.url, "Released an unknown preview");
        }
    }
}
