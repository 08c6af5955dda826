//! Comprehensive tests for the storage abstraction layer

#[cfg(test)]
mod integration_tests {
    use crate::config::StorageConfig;
    use crate::ingest::uploader::BlobUploader;
    use crate::storage::config::{create_store, StorageBackend};
    use crate::storage::local_store::LocalBlobStore;
    use crate::storage::mock_store::MockBlobStore;
    use crate::storage::{BlobStore, StoreError};
    use std::sync::Arc;
    use tokio::io::AsyncWriteExt;

    const KEY: &str = "images/raw/gallery/upload3/photo0.jpg";

    async fn write_through(store: &dyn BlobStore, key: &str, data: &[u8]) -> Result<(), StoreError> {
        let mut writer = store.open_writer(key).await?;
        writer.write_all(data).await?;
        writer.shutdown().await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_backends_reject_unsafe_keys() {
        let dir = tempfile::tempdir().unwrap();
        let stores: Vec<Arc<dyn BlobStore>> = vec![
            Arc::new(MockBlobStore::new()),
            Arc::new(LocalBlobStore::new(dir.path()).unwrap()),
        ];

        for store in stores {
            for key in ["", "/etc/passwd", "images/../../escape.jpg", "images//photo0.jpg", "./photo0.jpg"] {
                let result = store.open_writer(key).await;
                assert!(
                    matches!(result, Err(StoreError::InvalidKey(_))),
                    "{} accepted {:?}",
                    store.backend_name(),
                    key
                );
            }
        }
    }

    #[tokio::test]
    async fn test_mock_and_local_store_same_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let local = LocalBlobStore::new(dir.path()).unwrap();
        let mock = MockBlobStore::new();
        let data = b"identical bytes on every backend";

        write_through(&local, KEY, data).await.unwrap();
        write_through(&mock, KEY, data).await.unwrap();

        assert_eq!(std::fs::read(local.object_path(KEY)).unwrap(), data);
        assert_eq!(mock.get_object(KEY).unwrap(), data);
    }

    #[tokio::test]
    async fn test_uploader_checksum_matches_stored_object() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            backend: StorageBackend::Local,
            base_path: dir.path().to_string_lossy().into_owned(),
            ..StorageConfig::default()
        };
        let store = create_store(&config).unwrap();
        assert_eq!(store.backend_name(), "local");

        let uploader = BlobUploader::new(store);
        let receipt = uploader.upload(&mut &b"checksummed photo"[..], KEY).await.unwrap();

        let stored = std::fs::read(dir.path().join(KEY)).unwrap();
        assert_eq!(stored, b"checksummed photo");
        assert_eq!(receipt.bytes, stored.len() as u64);
        assert_eq!(receipt.md5, hex::encode(md5::compute(&stored).0));
    }

    #[tokio::test]
    async fn test_mock_store_verifies_uploader_checksum() {
        let mock = Arc::new(MockBlobStore::new());
        let uploader = BlobUploader::new(mock.clone());
        let receipt = uploader.upload(&mut &b"checksummed photo"[..], KEY).await.unwrap();

        assert!(mock.verify_object(KEY, &receipt.md5).unwrap());
        assert!(!mock.verify_object(KEY, "00000000000000000000000000000000").unwrap());
    }

    #[tokio::test]
    async fn test_rewriting_a_key_replaces_object() {
        let dir = tempfile::tempdir().unwrap();
        let local = LocalBlobStore::new(dir.path()).unwrap();

        write_through(&local, KEY, b"first attempt, longer").await.unwrap();
        write_through(&local, KEY, b"retry").await.unwrap();

        assert_eq!(std::fs::read(local.object_path(KEY)).unwrap(), b"retry");
    }
}
