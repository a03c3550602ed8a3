//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `SPII_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `SPII_` override YAML values
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `SPII_PROCESSOR__ENGINE=dummy` sets the `processor.engine` field.
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! # Override server port
//! SPII_PORT=8080
//!
//! # Point uploads at a different directory
//! SPII_UPLOAD_DIR=/var/lib/spii-redactor/uploads
//!
//! # Raise the upload limit to 32 MiB
//! SPII_MAX_UPLOAD_BYTES=33554432
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "SPII_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    /// Useful for CI/CD pipelines to catch config errors before deployment.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// Loaded from YAML and environment variables. All fields have defaults, so an
/// empty (or missing) config file yields a runnable development setup.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Directory where uploaded files are stored, created at startup if absent
    pub upload_dir: PathBuf,
    /// Maximum accepted request body size in bytes. Uploads beyond this are
    /// rejected at the transport layer with 413 before handler logic runs.
    pub max_upload_bytes: u64,
    /// Processing engine the gateway dispatches stored files to
    pub processor: ProcessorConfig,
    /// Enable OpenTelemetry OTLP export for distributed tracing
    pub enable_otel_export: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: 16 * 1024 * 1024,
            processor: ProcessorConfig::default(),
            enable_otel_export: false,
        }
    }
}

/// Processing engine configuration.
///
/// The gateway only knows the [`crate::processor::Processor`] boundary; this
/// enum selects which implementation backs it. Adding an engine requires a
/// variant here and a match arm in [`crate::processor::create_processor`].
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(tag = "engine", rename_all = "lowercase")]
pub enum ProcessorConfig {
    /// Deterministic stub engine for development and tests. Performs no real
    /// OCR or PII detection.
    #[default]
    Dummy,
    // Future engines:
    // Ocr(OcrEngineConfig),
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.max_upload_bytes == 0 {
            return Err(Error::Internal {
                operation: "Config validation: max_upload_bytes cannot be 0. Set a positive byte count (default: 16777216 = 16 MiB)."
                    .to_string(),
            });
        }

        if self.upload_dir.as_os_str().is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: upload_dir cannot be empty. Set a directory path (default: uploads).".to_string(),
            });
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables can still override specific values
            .merge(Env::prefixed("SPII_").split("__"))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
