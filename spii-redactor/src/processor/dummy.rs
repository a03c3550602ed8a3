//! Dummy processing engine implementation
//!
//! This engine performs no real OCR or PII detection: it reads the stored file
//! back, masks digit runs, and echoes the stored filename as the image
//! reference. Useful for testing and development purposes.

use async_trait::async_trait;
use std::path::Path;

use crate::processor::{ProcessingOutcome, Processor, ProcessorError, Result};

/// Stub engine that stands in for the real redaction pipeline
pub struct DummyEngine;

impl DummyEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DummyEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Processor for DummyEngine {
    async fn extract_text(&self, path: &Path) -> Result<String> {
        let bytes = tokio::fs::read(path).await?;

        // Text files pass through as-is; anything else gets a placeholder the
        // way a real engine would emit OCR output.
        match String::from_utf8(bytes) {
            Ok(text) => Ok(text),
            Err(e) => Ok(format!("[scanned document, {} bytes]", e.as_bytes().len())),
        }
    }

    async fn redact_pii(&self, text: &str) -> Result<String> {
        // Placeholder redaction: mask every digit so account-number-shaped
        // content never reaches the rendered page verbatim.
        Ok(text.chars().map(|c| if c.is_ascii_digit() { '#' } else { c }).collect())
    }

    async fn process_image(&self, path: &Path) -> Result<ProcessingOutcome> {
        let original_image = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.to_string())
            .ok_or_else(|| ProcessorError::Engine(format!("stored path has no filename: {}", path.display())))?;

        tracing::info!("Dummy engine processing {}", path.display());

        let text = self.extract_text(path).await?;
        let redacted_text = self.redact_pii(&text).await?;

        Ok(ProcessingOutcome {
            redacted_text,
            original_image,
        })
    }
}
