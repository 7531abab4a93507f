//! Export of the preview state as a JSON document.

use std::path::{Path, PathBuf};

use base64::Engine as _;
use chrono::{DateTime, SecondsFormat, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::snippet::{CharacterBudget, DeviceMode, FieldKind, SnippetModel};
use crate::{Error, Result};

pub const EXPORT_LABEL: &str = "SERP Preview Export";
pub const EXPORT_NOTE: &str = "Text export of the snippet preview state; no image is rendered.";
pub const EXPORT_MIME: &str = "application/json";

/// One field as exported
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedField {
    pub value: String,
    pub pixel_width: f32,
    pub max_pixel_width: Option<f32>,
    pub overflow: bool,
}

/// Point-in-time copy of everything visible in the preview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnippetSnapshot {
    pub url: ExportedField,
    pub title: ExportedField,
    pub description: ExportedField,
    pub search_query: ExportedField,
    pub device: DeviceMode,
    pub show_date: bool,
    pub show_rating: bool,
    pub show_favicon: bool,
    pub favicon_url: Option<String>,
    pub title_chars: CharacterBudget,
    pub description_chars: CharacterBudget,
}

impl SnippetSnapshot {
    pub fn capture(model: &SnippetModel) -> Self {
        let field = |kind| {
            let f = model.field(kind);
            ExportedField {
                value: f.value().to_string(),
                pixel_width: f.pixel_width(),
                max_pixel_width: f.max_pixel_width(),
                overflow: f.overflow(),
            }
        };
        let s = model.state();
        Self {
            url: field(FieldKind::Url),
            title: field(FieldKind::Title),
            description: field(FieldKind::Description),
            search_query: field(FieldKind::SearchQuery),
            device: s.device,
            show_date: s.show_date,
            show_rating: s.show_rating,
            show_favicon: s.show_favicon,
            favicon_url: s.favicon_url.clone(),
            title_chars: model.title_chars(),
            description_chars: model.description_chars(),
        }
    }

    /// SHA-256 over the compact JSON form, hex encoded.
    pub fn digest(&self) -> Result<String> {
        let bytes = serde_json::to_vec(self)?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }
}

/// Document written by the export action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportPayload {
    /// RFC 3339 timestamp in UTC
    pub timestamp: String,
    pub preview: String,
    pub note: String,
    pub snippet: SnippetSnapshot,
    pub digest: String,
}

impl ExportPayload {
    pub fn timestamp(&self) -> Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| Error::Export(format!("bad timestamp '{}': {}", self.timestamp, e)))
    }
}

/// A serialized export ready to be saved
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub mime: &'static str,
    pub contents: String,
}

impl ExportArtifact {
    /// Write the artifact into `dir` and return the full path.
    pub fn write_to(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)
            .map_err(|e| Error::Export(format!("{}: {}", dir.display(), e)))?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.contents)
            .map_err(|e| Error::Export(format!("{}: {}", path.display(), e)))?;
        info!("Exported preview to {}", path.display());
        Ok(path)
    }

    /// `data:` URI suitable for a browser download link.
    pub fn data_uri(&self) -> String {
        format!(
            "data:{};charset=utf-8;base64,{}",
            self.mime,
            base64::engine::general_purpose::STANDARD.encode(self.contents.as_bytes())
        )
    }

    pub fn payload(&self) -> Result<ExportPayload> {
        Ok(serde_json::from_str(&self.contents)?)
    }
}

/// Serialize `snapshot` taken at `now`.
pub fn export_snapshot(snapshot: &SnippetSnapshot, now: DateTime<Utc>) -> Result<ExportArtifact> {
    let payload = ExportPayload {
        timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        preview: EXPORT_LABEL.to_string(),
        note: EXPORT_NOTE.to_string(),
        snippet: snapshot.clone(),
        digest: snapshot.digest()?,
    };
    let contents = serde_json::to_string_pretty(&payload)?;
    Ok(ExportArtifact {
        file_name: format!("serp-preview-{}.json", now.timestamp_millis()),
        mime: EXPORT_MIME,
        contents,
    })
}
