use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::db::student_id_problem;

use super::ImageStore;

const FILE_SCHEME: &str = "file://";

fn image_file_name(taken_at: DateTime<Utc>, extension: &str) -> String {
    format!("{}.{extension}", taken_at.format("%Y%m%dT%H%M%S%6fZ"))
}

/// Keeps submissions under `<root>/<student>/<timestamp>.<ext>`.
pub struct FsImageStore {
    root: PathBuf,
}

impl FsImageStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[async_trait]
impl ImageStore for FsImageStore {
    async fn put_image(
        &self,
        student_id: &str,
        taken_at: DateTime<Utc>,
        extension: &str,
        bytes: &[u8],
    ) -> Result<String> {
        if let Some(problem) = student_id_problem(student_id) {
            bail!("refusing to store image for {student_id:?}: {problem}");
        }
        let dir = self.root.join(student_id);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("failed to create image directory {}", dir.display()))?;

        let path = dir.join(image_file_name(taken_at, extension));
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("failed to write image {}", path.display()))?;

        Ok(format!("{FILE_SCHEME}{}", path.display()))
    }

    async fn remove_image(&self, reference: &str) -> Result<()> {
        let path = reference
            .strip_prefix(FILE_SCHEME)
            .map(Path::new)
            .ok_or_else(|| anyhow!("not a file image reference: {reference}"))?;
        let escapes = path
            .components()
            .any(|part| matches!(part, std::path::Component::ParentDir));
        if escapes || !path.starts_with(&self.root) {
            bail!("image {} is outside {}", path.display(), self.root.display());
        }
        tokio::fs::remove_file(path)
            .await
            .with_context(|| format!("failed to remove image {}", path.display()))
    }
}

#[derive(Default)]
pub struct MemoryImageStore {
    images: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, reference: &str) -> Option<Vec<u8>> {
        self.images.lock().await.get(reference).cloned()
    }

    pub async fn len(&self) -> usize {
        self.images.lock().await.len()
    }
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn put_image(
        &self,
        student_id: &str,
        taken_at: DateTime<Utc>,
        extension: &str,
        bytes: &[u8],
    ) -> Result<String> {
        let reference = format!("memory://{student_id}/{}", image_file_name(taken_at, extension));
        self.images
            .lock()
            .await
            .insert(reference.clone(), bytes.to_vec());
        Ok(reference)
    }

    async fn remove_image(&self, reference: &str) -> Result<()> {
        match self.images.lock().await.remove(reference) {
            Some(_) => Ok(()),
            None => bail!("unknown image {reference}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fs_store_writes_under_student_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsImageStore::new(dir.path().to_path_buf());
        let reference = store
            .put_image("s1", Utc::now(), "png", b"fake-bytes")
            .await
            .unwrap();

        let path = reference.trim_start_matches("file://");
        assert!(path.contains("s1"));
        assert!(path.ends_with(".png"));
        assert_eq!(std::fs::read(path).unwrap(), b"fake-bytes");
    }

    #[tokio::test]
    async fn fs_store_refuses_ids_that_leave_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("images");
        let store = FsImageStore::new(root.clone());

        for id in ["../../escaped", "a/b", ".."] {
            assert!(store.put_image(id, Utc::now(), "png", b"x").await.is_err());
        }
        assert!(!dir.path().join("escaped").exists());
        assert!(!root.exists());
    }

    #[tokio::test]
    async fn removed_images_are_gone() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsImageStore::new(dir.path().to_path_buf());
        let reference = store.put_image("s1", Utc::now(), "png", b"x").await.unwrap();

        store.remove_image(&reference).await.unwrap();
        assert!(!Path::new(reference.trim_start_matches(FILE_SCHEME)).exists());
        assert!(store.remove_image("file:///etc/hosts").await.is_err());
        let sneaky = format!("{FILE_SCHEME}{}/../outside.png", dir.path().display());
        assert!(store.remove_image(&sneaky).await.is_err());

        let memory = MemoryImageStore::new();
        let reference = memory.put_image("s1", Utc::now(), "png", b"x").await.unwrap();
        memory.remove_image(&reference).await.unwrap();
        assert_eq!(memory.len().await, 0);
    }
}
