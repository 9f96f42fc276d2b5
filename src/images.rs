use crate::errors::{AppError, AppResult};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const IMAGE_DIR_NAME: &str = "journal_images";

/// Copies `source` into the managed image directory under `data_dir` and
/// returns the new path, which is what a journal entry stores.
pub fn store_journal_image(data_dir: &Path, source: &Path) -> AppResult<PathBuf> {
    if !source.is_file() {
        return Err(AppError::NotFound(format!("image {}", source.display())));
    }
    let image_dir = data_dir.join(IMAGE_DIR_NAME);
    fs::create_dir_all(&image_dir)?;

    let extension = source
        .extension()
        .and_then(|value| value.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| "jpg".to_string());
    let target = image_dir.join(format!("{}.{}", Uuid::new_v4(), extension));
    fs::copy(source, &target)?;
    tracing::debug!(source = %source.display(), target = %target.display(), "journal image stored");

    Ok(target)
}

/// Deletes `path` if it lives in the managed image directory. Paths elsewhere
/// belong to the user and are left alone.
pub fn remove_journal_image(data_dir: &Path, path: &Path) -> AppResult<bool> {
    let image_dir = data_dir.join(IMAGE_DIR_NAME);
    if path.parent() != Some(image_dir.as_path()) || !path.is_file() {
        return Ok(false);
    }
    fs::remove_file(path)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::{remove_journal_image, store_journal_image, IMAGE_DIR_NAME};
    use std::fs;

    #[test]
    fn stores_a_copy_under_the_image_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = dir.path().join("Picked.PNG");
        fs::write(&source, b"png-bytes").expect("write source");

        let stored = store_journal_image(dir.path(), &source).expect("store");
        assert_eq!(stored.parent(), Some(dir.path().join(IMAGE_DIR_NAME).as_path()));
        assert_eq!(stored.extension().and_then(|ext| ext.to_str()), Some("png"));
        assert_eq!(fs::read(&stored).expect("read copy"), b"png-bytes");
        assert!(source.exists());
    }

    #[test]
    fn missing_source_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let error = store_journal_image(dir.path(), &dir.path().join("nope.jpg")).expect_err("missing");
        assert_eq!(error.code(), "NOT_FOUND");
    }

    #[test]
    fn only_managed_images_are_removed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let outside = dir.path().join("mine.jpg");
        fs::write(&outside, b"x").expect("write");
        let stored = store_journal_image(dir.path(), &outside).expect("store");

        assert!(!remove_journal_image(dir.path(), &outside).expect("outside"));
        assert!(outside.exists());
        assert!(remove_journal_image(dir.path(), &stored).expect("managed"));
        assert!(!stored.exists());
    }
}
