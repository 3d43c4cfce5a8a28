//! Attachment intake for images and tables
//!
//! The kind is decided by file extension against a fixed allow-list. Images
//! travel to the model as an opaque binary part; tables are decoded and
//! rendered into the prompt text.

mod table;

use std::path::Path;

use crate::llm::Part;
use crate::{Error, Result};

pub use table::{MAX_TABLE_ROWS, Table};

/// Supported image formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    /// MIME type sent with the image bytes
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }
}

/// Supported tabular formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Xls,
    Xlsx,
}

/// Attachment kind derived from a file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Image(ImageFormat),
    Table(TableFormat),
}

impl AttachmentKind {
    /// Match an extension (without dot, any case) against the allow-list
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Image(ImageFormat::Png)),
            "jpg" | "jpeg" => Some(Self::Image(ImageFormat::Jpeg)),
            "csv" => Some(Self::Table(TableFormat::Csv)),
            "xls" => Some(Self::Table(TableFormat::Xls)),
            "xlsx" => Some(Self::Table(TableFormat::Xlsx)),
            _ => None,
        }
    }

    /// Kind for a file name, by its extension
    #[must_use]
    pub fn from_filename(name: &str) -> Option<Self> {
        Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// A user-supplied attachment, scoped to a single resolve call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attachment {
    /// Image passed through to the model as binary
    Image {
        name: String,
        format: ImageFormat,
        data: Vec<u8>,
    },
    /// Spreadsheet or CSV rendered into the prompt
    Table {
        name: String,
        format: TableFormat,
        data: Vec<u8>,
    },
}

impl Attachment {
    /// Build an attachment from a file name and its bytes
    ///
    /// # Errors
    ///
    /// Returns error if the extension is not on the allow-list
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Result<Self> {
        let name = name.into();
        match AttachmentKind::from_filename(&name) {
            Some(AttachmentKind::Image(format)) => Ok(Self::Image { name, format, data }),
            Some(AttachmentKind::Table(format)) => Ok(Self::Table { name, format, data }),
            None => Err(Error::Attachment(format!("unsupported file type: {name}"))),
        }
    }

    /// Read an attachment from disk
    ///
    /// # Errors
    ///
    /// Returns error if the type is unsupported or the file cannot be read
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::Attachment(format!("invalid file name: {}", path.display())))?
            .to_string();

        if AttachmentKind::from_filename(&name).is_none() {
            return Err(Error::Attachment(format!("unsupported file type: {name}")));
        }

        let data = std::fs::read(path)?;
        tracing::debug!(name = %name, bytes = data.len(), "attachment loaded");
        Self::from_bytes(name, data)
    }

    /// Original file name
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Image { name, .. } | Self::Table { name, .. } => name,
        }
    }

    /// Build the message parts for `prompt` plus this attachment
    ///
    /// Tables are decoded here; a decode failure becomes an inline note in
    /// the prompt text rather than an error.
    #[must_use]
    pub fn message_parts(&self, prompt: &str) -> Vec<Part> {
        match self {
            Self::Image { format, data, .. } => vec![
                Part::Text(prompt.to_string()),
                Part::InlineData {
                    mime_type: format.mime_type().to_string(),
                    data: data.clone(),
                },
            ],
            Self::Table { name, format, data } => {
                let appendix = match Table::decode(*format, data) {
                    Ok(table) => format!("[Attached table: {name}]\n{}", table.render()),
                    Err(e) => {
                        tracing::warn!(name = %name, error = %e, "failed to decode table attachment");
                        format!("[Attached table: {name} could not be read: {e}]")
                    }
                };
                vec![Part::Text(format!("{prompt}\n\n{appendix}"))]
            }
        }
    }
}
