//! Trained artifact store
//!
//! Loads the regression model and the encoder table from the configured
//! directory. A file missing locally is downloaded from the remote base URL
//! when one is configured. Optional SHA-256 digests are checked against the
//! bytes actually loaded, and a download is only saved once it has passed the
//! checksum and parsed.

use std::path::{Path, PathBuf};

use reqwest::Client;
use sha2::{Digest, Sha256};
use shared::{EncodeError, EncoderClasses, EncoderTable};
use thiserror::Error;

use super::ExternalError;
use crate::config::ModelConfig;
use crate::services::predictor::{ForestArtifact, ModelError, RandomForestRegressor};

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("artifact {0} not found and no remote_base_url configured")]
    Missing(PathBuf),

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to download {file}: {source}")]
    Download {
        file: String,
        source: ExternalError,
    },

    #[error("checksum mismatch for {file}: expected {expected}, got {actual}")]
    Checksum {
        file: String,
        expected: String,
        actual: String,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid model: {0}")]
    Model(#[from] ModelError),

    #[error("invalid encoders: {0}")]
    Encoder(#[from] EncodeError),
}

/// Model and encoders, ready to serve
pub struct LoadedArtifacts {
    pub model: RandomForestRegressor,
    pub encoders: EncoderTable,
}

pub struct ArtifactStore {
    config: ModelConfig,
    client: Client,
}

impl ArtifactStore {
    pub fn new(config: ModelConfig, client: Client) -> Self {
        Self { config, client }
    }

    /// Load both artifacts, fetching missing ones first.
    ///
    /// Downloaded bytes are checksummed and parsed before they are written to
    /// `dir`, so a bad download never lands on disk.
    pub async fn load(&self) -> Result<LoadedArtifacts, ArtifactError> {
        let model_path = self.config.model_path();
        let (model_bytes, model_downloaded) = self
            .obtain(
                &self.config.model_file,
                &model_path,
                self.config.model_sha256.as_deref(),
            )
            .await?;
        let artifact: ForestArtifact = parse_json(&model_path, &model_bytes)?;
        let model = RandomForestRegressor::from_artifact(artifact)?;

        let encoders_path = self.config.encoders_path();
        let (encoder_bytes, encoders_downloaded) = self
            .obtain(
                &self.config.encoders_file,
                &encoders_path,
                self.config.encoders_sha256.as_deref(),
            )
            .await?;
        let classes: EncoderClasses = parse_json(&encoders_path, &encoder_bytes)?;
        let encoders = EncoderTable::from_classes(classes)?;

        if model_downloaded {
            self.persist(&model_path, &model_bytes).await?;
        }
        if encoders_downloaded {
            self.persist(&encoders_path, &encoder_bytes).await?;
        }

        Ok(LoadedArtifacts { model, encoders })
    }

    /// Checksummed bytes of one artifact, and whether they were downloaded
    async fn obtain(
        &self,
        file: &str,
        path: &Path,
        expected: Option<&str>,
    ) -> Result<(Vec<u8>, bool), ArtifactError> {
        let (bytes, downloaded) = if path.exists() {
            (read(path).await?, false)
        } else {
            let Some(base_url) = self.config.remote_base_url.as_deref() else {
                return Err(ArtifactError::Missing(path.to_path_buf()));
            };
            let url = format!("{}/{}", base_url.trim_end_matches('/'), file);
            tracing::info!("Downloading {} from {}", file, url);
            let bytes = self.download(&url).await.map_err(|source| ArtifactError::Download {
                file: file.to_string(),
                source,
            })?;
            (bytes, true)
        };

        verify_checksum(file, &bytes, expected)?;
        Ok((bytes, downloaded))
    }

    /// Write through a temporary file in the same directory, then rename
    async fn persist(&self, path: &Path, bytes: &[u8]) -> Result<(), ArtifactError> {
        tokio::fs::create_dir_all(&self.config.dir)
            .await
            .map_err(|source| ArtifactError::Io {
                path: self.config.dir.clone(),
                source,
            })?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let partial = path.with_file_name(format!(".{}.{}.part", file_name, uuid::Uuid::new_v4()));

        if let Err(source) = tokio::fs::write(&partial, bytes).await {
            tokio::fs::remove_file(&partial).await.ok();
            return Err(ArtifactError::Io {
                path: partial,
                source,
            });
        }
        if let Err(source) = tokio::fs::rename(&partial, path).await {
            tokio::fs::remove_file(&partial).await.ok();
            return Err(ArtifactError::Io {
                path: path.to_path_buf(),
                source,
            });
        }

        tracing::info!("Saved {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, ExternalError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ExternalError::Status {
                service: "artifact store",
                status,
                body,
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

async fn read(path: &Path) -> Result<Vec<u8>, ArtifactError> {
    tokio::fs::read(path).await.map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_json<T: serde::de::DeserializeOwned>(path: &Path, bytes: &[u8]) -> Result<T, ArtifactError> {
    serde_json::from_slice(bytes).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Lowercase hex SHA-256 of `bytes`
pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

fn verify_checksum(file: &str, bytes: &[u8], expected: Option<&str>) -> Result<(), ArtifactError> {
    let Some(expected) = expected else {
        return Ok(());
    };
    let actual = sha256_hex(bytes);
    if !actual.eq_ignore_ascii_case(expected.trim()) {
        return Err(ArtifactError::Checksum {
            file: file.to_string(),
            expected: expected.to_string(),
            actual,
        });
    }
    Ok(())
}
