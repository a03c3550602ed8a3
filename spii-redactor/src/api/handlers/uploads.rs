//! HTTP handlers for file upload intake and stored-file serving.
//!
//! The upload handler is the gateway's core path: validate the multipart
//! `file` field, stream it into the upload directory under a sanitized name,
//! then hand the stored path to the processing engine and render its output.

use crate::AppState;
use crate::errors::{Error, Result};
use crate::storage::{self, PendingUpload};
use crate::templates;
use axum::{
    body::Body,
    extract::{
        Multipart, Path, State,
        multipart::{Field, MultipartError},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use minijinja::context;
use std::path::PathBuf;

/// 302 back to the upload form, matching the browser-facing contract: a
/// submission without a usable file is not an error, just a bounce.
fn back_to_form() -> Response {
    (StatusCode::FOUND, [(header::LOCATION, "/")]).into_response()
}

/// Classify a multipart read failure. The per-route body limit surfaces here
/// as a 413 from the multipart reader; everything else is a malformed body.
fn multipart_error(err: MultipartError, max_upload_bytes: u64) -> Error {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::PayloadTooLarge {
            message: format!(
                "File size exceeds maximum allowed size of {} bytes ({} MB)",
                max_upload_bytes,
                max_upload_bytes / (1024 * 1024)
            ),
        }
    } else {
        Error::BadRequest {
            message: format!("Failed to parse multipart data: {}", err),
        }
    }
}

/// Accept an uploaded file and render the processing result.
///
/// Validation, in order: a missing `file` field or an empty filename redirects
/// back to the form with no message and no file written. A usable upload is
/// stored under its sanitized name (overwriting any previous file of that
/// name), dispatched to the processing engine exactly once, and the engine's
/// output rendered into the results page.
pub async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Result<Response> {
    let max_upload_bytes = state.config.max_upload_bytes;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_upload_bytes))?
    {
        if field.name() != Some("file") {
            // Ignore unknown fields (forward compatibility)
            continue;
        }

        let raw_name = field.file_name().unwrap_or("").to_string();
        if raw_name.is_empty() {
            // Form submitted without choosing a file
            return Ok(back_to_form());
        }

        let Some(filename) = storage::sanitize_filename(&raw_name) else {
            tracing::warn!("Discarding upload with unusable filename {:?}", raw_name);
            return Ok(back_to_form());
        };

        let stored = store_field(field, &state.config, &filename).await?;

        tracing::info!(
            filename = %filename,
            path = %stored.display(),
            "Upload stored, dispatching to processing engine"
        );

        let outcome = state.processor.process_image(&stored).await?;

        let page = templates::render(
            "result.html",
            context! {
                redacted_text => outcome.redacted_text,
                original_image => outcome.original_image,
            },
        )?;

        return Ok(page.into_response());
    }

    // No `file` field in the request at all
    Ok(back_to_form())
}

/// Stream one multipart field into the upload directory.
///
/// Bytes go to a part-file first and are renamed into place at the end, so an
/// aborted or oversized upload never leaves anything under the final name.
async fn store_field(mut field: Field<'_>, config: &crate::Config, filename: &str) -> Result<PathBuf> {
    let max_upload_bytes = config.max_upload_bytes;
    let mut total_size = 0u64;

    let mut pending = PendingUpload::create(&config.upload_dir).await.map_err(|e| Error::Internal {
        operation: format!("open part-file in {}: {}", config.upload_dir.display(), e),
    })?;

    loop {
        let chunk = match field.chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(e) => {
                pending.discard().await;
                return Err(multipart_error(e, max_upload_bytes));
            }
        };

        total_size += chunk.len() as u64;

        // Check size limit incrementally to fail fast
        if total_size > max_upload_bytes {
            tracing::warn!(
                filename = %filename,
                total_size = total_size,
                max_upload_bytes = max_upload_bytes,
                "File size limit exceeded, aborting upload"
            );
            pending.discard().await;
            return Err(Error::PayloadTooLarge {
                message: format!(
                    "File size exceeds maximum allowed size of {} bytes ({} MB)",
                    max_upload_bytes,
                    max_upload_bytes / (1024 * 1024)
                ),
            });
        }

        if let Err(e) = pending.write_chunk(&chunk).await {
            pending.discard().await;
            return Err(Error::Internal {
                operation: format!("write upload chunk: {}", e),
            });
        }
    }

    pending.persist(filename).await.map_err(|e| Error::Internal {
        operation: format!("persist upload {}: {}", filename, e),
    })
}

/// Serve a stored original so the results page can display it.
///
/// Only names that round-trip through the sanitizer unchanged are served;
/// anything this service could not itself have written is a 404.
pub async fn serve_upload(State(state): State<AppState>, Path(filename): Path<String>) -> Result<Response> {
    let safe = match storage::sanitize_filename(&filename) {
        Some(safe) if safe == filename => safe,
        _ => {
            return Err(Error::NotFound {
                resource: "upload".to_string(),
                name: filename,
            });
        }
    };

    let path = state.config.upload_dir.join(&safe);
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::NotFound {
                resource: "upload".to_string(),
                name: safe,
            });
        }
        Err(e) => {
            return Err(Error::Internal {
                operation: format!("read stored upload {}: {}", path.display(), e),
            });
        }
    };

    let mime = mime_guess::from_path(&safe).first_or_octet_stream();

    Ok(Response::builder()
        .header(header::CONTENT_TYPE, mime.as_ref())
        .body(Body::from(bytes))
        .unwrap())
}
