use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

/// Binary object storage for uploaded files. The engine only ever sees
/// the returned URL; the bytes never touch application records.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn store(&self, bytes: &[u8], content_type: &str) -> anyhow::Result<String>;
}

/// Keeps blobs in process memory and hands back `memory://` URLs.
/// Tests and local development only.
#[derive(Default)]
pub struct MemoryBlobStore {
    objects: RwLock<HashMap<String, (Vec<u8>, String)>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn store(&self, bytes: &[u8], content_type: &str) -> anyhow::Result<String> {
        let url = format!("memory://{}", Uuid::new_v4());
        let mut objects = self
            .objects
            .write()
            .map_err(|_| anyhow::anyhow!("blob store lock poisoned"))?;
        objects.insert(url.clone(), (bytes.to_vec(), content_type.to_string()));
        Ok(url)
    }
}
