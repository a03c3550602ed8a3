//! Filesystem side of the upload gateway.
//!
//! Uploaded bytes are streamed into a hidden part-file inside the upload
//! directory and renamed into place once the upload completes, so a failed or
//! oversized upload never leaves a partial file under its final name.
//! Filename sanitization is a pure function with a security contract: any
//! client-supplied string maps to a safe path component or to nothing.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::info;

static PART_SEQ: AtomicU64 = AtomicU64::new(0);

/// Map a client-supplied filename to a safe path component.
///
/// Strips directory components (both separator styles), drops control
/// characters, replaces anything outside `[alphanumeric . - _]` with `_`, and
/// trims leading dots so the result can be neither hidden nor a traversal
/// segment. Returns `None` when nothing usable remains; callers treat that
/// the same as an empty filename.
pub fn sanitize_filename(raw: &str) -> Option<String> {
    // Only the final path component may touch the filesystem.
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw);

    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() || cleaned.chars().all(|c| matches!(c, '.' | '-' | '_')) {
        return None;
    }

    Some(cleaned.to_string())
}

/// Create the upload directory if it does not exist.
///
/// Idempotent; called once during application startup, never from handlers.
pub async fn ensure_upload_dir(dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dir).await?;
    info!("Upload directory ready at {}", dir.display());
    Ok(())
}

/// An upload being streamed to disk, not yet visible under its final name.
pub struct PendingUpload {
    file: fs::File,
    part_path: PathBuf,
    dir: PathBuf,
}

impl PendingUpload {
    /// Open a fresh part-file inside `dir`.
    ///
    /// Part names carry the process id and a process-wide sequence number so
    /// concurrent uploads never collide with each other.
    pub async fn create(dir: &Path) -> std::io::Result<Self> {
        let part_name = format!(".part-{}-{}", std::process::id(), PART_SEQ.fetch_add(1, Ordering::Relaxed));
        let part_path = dir.join(part_name);
        let file = fs::File::create(&part_path).await?;

        Ok(Self {
            file,
            part_path,
            dir: dir.to_path_buf(),
        })
    }

    /// Append a chunk of the upload body.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> std::io::Result<()> {
        self.file.write_all(chunk).await
    }

    /// Move the completed upload to its final name, overwriting any existing
    /// file (last write wins). Returns the stored path.
    pub async fn persist(self, filename: &str) -> std::io::Result<PathBuf> {
        let Self { mut file, part_path, dir } = self;

        file.flush().await?;
        drop(file);

        let dest = dir.join(filename);
        if let Err(e) = fs::rename(&part_path, &dest).await {
            let _ = fs::remove_file(&part_path).await;
            return Err(e);
        }

        Ok(dest)
    }

    /// Abandon the upload and remove the part-file.
    pub async fn discard(self) {
        let Self { file, part_path, .. } = self;
        drop(file);

        if let Err(e) = fs::remove_file(&part_path).await {
            tracing::warn!("Failed to remove abandoned part-file {}: {}", part_path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_plain_names() {
        assert_eq!(sanitize_filename("scan.png"), Some("scan.png".to_string()));
        assert_eq!(sanitize_filename("invoice-2024_final.pdf"), Some("invoice-2024_final.pdf".to_string()));
        assert_eq!(sanitize_filename("résumé.pdf"), Some("résumé.pdf".to_string()));
    }

    #[test]
    fn test_sanitize_strips_directories() {
        assert_eq!(sanitize_filename("../../etc/passwd"), Some("passwd".to_string()));
        assert_eq!(sanitize_filename("/etc/shadow"), Some("shadow".to_string()));
        assert_eq!(sanitize_filename("..\\..\\windows\\system32\\cmd.exe"), Some("cmd.exe".to_string()));
        assert_eq!(sanitize_filename("C:\\secrets.txt"), Some("secrets.txt".to_string()));
        assert_eq!(sanitize_filename("uploads/../../../root/.ssh/authorized_keys"), Some("authorized_keys".to_string()));
    }

    #[test]
    fn test_sanitize_traversal_payloads_yield_nothing() {
        assert_eq!(sanitize_filename(""), None);
        assert_eq!(sanitize_filename(".."), None);
        assert_eq!(sanitize_filename("../"), None);
        assert_eq!(sanitize_filename("../../.."), None);
        assert_eq!(sanitize_filename("...."), None);
        assert_eq!(sanitize_filename("/"), None);
        assert_eq!(sanitize_filename("\\"), None);
        assert_eq!(sanitize_filename("././."), None);
    }

    #[test]
    fn test_sanitize_replaces_hostile_characters() {
        assert_eq!(sanitize_filename("my file.png"), Some("my_file.png".to_string()));
        assert_eq!(sanitize_filename("a;rm -rf.txt"), Some("a_rm_-rf.txt".to_string()));
        assert_eq!(sanitize_filename("q?a=b&c.png"), Some("q_a_b_c.png".to_string()));
        assert_eq!(sanitize_filename("pipe|name.txt"), Some("pipe_name.txt".to_string()));
    }

    #[test]
    fn test_sanitize_drops_control_characters() {
        assert_eq!(sanitize_filename("evil\0.png"), Some("evil.png".to_string()));
        assert_eq!(sanitize_filename("line\nbreak.txt"), Some("linebreak.txt".to_string()));
        assert_eq!(sanitize_filename("tab\there.txt"), Some("tabhere.txt".to_string()));
    }

    #[test]
    fn test_sanitize_no_hidden_files() {
        assert_eq!(sanitize_filename(".bashrc"), Some("bashrc".to_string()));
        assert_eq!(sanitize_filename("..config"), Some("config".to_string()));
        assert_eq!(sanitize_filename("...many.dots"), Some("many.dots".to_string()));
    }

    #[test]
    fn test_sanitize_result_is_a_fixed_point() {
        // Sanitizing twice never changes the result; the uploads route relies
        // on this to reject any name it would not itself have produced.
        for raw in ["../../etc/passwd", "my file.png", ".bashrc", "scan.png", "a;b|c?.txt"] {
            if let Some(once) = sanitize_filename(raw) {
                assert_eq!(sanitize_filename(&once), Some(once.clone()));
            }
        }
    }

    #[tokio::test]
    async fn test_ensure_upload_dir_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("uploads");

        ensure_upload_dir(&target).await.unwrap();
        assert!(target.is_dir());

        // Second call succeeds on the existing directory
        ensure_upload_dir(&target).await.unwrap();
        assert!(target.is_dir());
    }

    #[tokio::test]
    async fn test_pending_upload_persist() {
        let dir = tempfile::tempdir().unwrap();

        let mut pending = PendingUpload::create(dir.path()).await.unwrap();
        pending.write_chunk(b"hello ").await.unwrap();
        pending.write_chunk(b"world").await.unwrap();
        let stored = pending.persist("greeting.txt").await.unwrap();

        assert_eq!(stored, dir.path().join("greeting.txt"));
        assert_eq!(std::fs::read(&stored).unwrap(), b"hello world");

        // No part-files left behind
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(".part-"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_pending_upload_overwrites() {
        let dir = tempfile::tempdir().unwrap();

        let mut first = PendingUpload::create(dir.path()).await.unwrap();
        first.write_chunk(b"first contents").await.unwrap();
        first.persist("doc.txt").await.unwrap();

        let mut second = PendingUpload::create(dir.path()).await.unwrap();
        second.write_chunk(b"second").await.unwrap();
        let stored = second.persist("doc.txt").await.unwrap();

        assert_eq!(std::fs::read(&stored).unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_pending_upload_discard() {
        let dir = tempfile::tempdir().unwrap();

        let mut pending = PendingUpload::create(dir.path()).await.unwrap();
        pending.write_chunk(b"partial").await.unwrap();
        pending.discard().await;

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
