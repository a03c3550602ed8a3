//! Processing engine abstraction layer
//!
//! This module defines the `Processor` trait which abstracts the document
//! pipeline (text extraction, PII redaction, image handling) behind the single
//! boundary the upload gateway depends on. Real OCR/redaction engines live out
//! of tree and are wired in through [`create_processor`].

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use crate::config::ProcessorConfig;

pub mod dummy;

/// Create a processing engine from configuration
///
/// This is the single point where we convert config into engine instances.
/// Adding a new engine requires adding a match arm here.
pub fn create_processor(config: &ProcessorConfig) -> Arc<dyn Processor> {
    match config {
        ProcessorConfig::Dummy => Arc::new(dummy::DummyEngine::new()),
        // Future engines:
        // ProcessorConfig::Ocr(ocr_config) => {
        //     Arc::new(ocr::OcrEngine::from(ocr_config))
        // }
    }
}

/// Result type for processing engine operations
pub type Result<T> = std::result::Result<T, ProcessorError>;

/// Errors that can occur while processing a stored document
#[derive(Debug, thiserror::Error)]
pub enum ProcessorError {
    #[error("processing engine error: {0}")]
    Engine(String),

    #[error("unsupported document type: {0}")]
    UnsupportedType(String),

    #[error("failed to read stored file: {0}")]
    Io(#[from] std::io::Error),
}

/// Output of a completed processing run.
///
/// The gateway treats this as opaque: `redacted_text` and `original_image` go
/// straight into the results view without interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingOutcome {
    /// Extracted document text with PII removed
    pub redacted_text: String,
    /// Reference to the stored original, resolvable under `/uploads/{name}`
    pub original_image: String,
}

/// Abstract processing engine interface
///
/// Implementors combine OCR-style text extraction with PII redaction.
/// The gateway only ever calls [`process_image`](Processor::process_image);
/// the other two methods document the engine's internal contract and let
/// callers drive the stages separately.
#[async_trait]
pub trait Processor: Send + Sync {
    /// Extract raw text from the stored file
    async fn extract_text(&self, path: &Path) -> Result<String>;

    /// Remove personally identifiable information from extracted text
    async fn redact_pii(&self, text: &str) -> Result<String>;

    /// Run the full pipeline against a stored file.
    ///
    /// Returns the redacted text together with a reference to the original
    /// image so the caller can render both.
    async fn process_image(&self, path: &Path) -> Result<ProcessingOutcome>;
}
