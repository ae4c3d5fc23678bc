// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Report photo selected by the user, with client-side validation.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use bytes::Bytes;

/// Largest accepted photo, in megabytes.
pub const MAX_IMAGE_SIZE_MB: usize = 3;
/// Largest accepted photo, in bytes.
pub const MAX_IMAGE_BYTES: usize = MAX_IMAGE_SIZE_MB * 1024 * 1024;
/// Accepted MIME types. `image/jpg` is not registered but browsers send it.
pub const ALLOWED_CONTENT_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/jpg"];

/// Errors caught before anything reaches the network.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Only JPG and PNG images are allowed.")]
    UnsupportedType,

    #[error("Image size must be less than {}MB.", MAX_IMAGE_SIZE_MB)]
    TooLarge,

    #[error("Please upload an image of the pollution.")]
    MissingImage,

    #[error("Description must be at most {max} characters.")]
    DescriptionTooLong { max: usize },
}

/// An image file chosen for upload.
#[derive(Debug, Clone)]
pub struct ImageFile {
    /// Original file name (used only for its extension)
    pub name: String,
    /// MIME type as reported by the client
    pub content_type: String,
    pub bytes: Bytes,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Bytes) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Check the MIME whitelist, then the size cap.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let content_type = self.content_type.trim().to_ascii_lowercase();
        if !ALLOWED_CONTENT_TYPES.contains(&content_type.as_str()) {
            return Err(ValidationError::UnsupportedType);
        }
        if self.size() > MAX_IMAGE_BYTES {
            return Err(ValidationError::TooLarge);
        }
        Ok(())
    }

    /// File extension for the storage key.
    ///
    /// Taken from the file name; falls back to the MIME type when the name
    /// has no extension.
    pub fn extension(&self) -> String {
        match self.name.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
                ext.to_ascii_lowercase()
            }
            _ => match self.content_type.trim().to_ascii_lowercase().as_str() {
                "image/png" => "png".to_string(),
                _ => "jpg".to_string(),
            },
        }
    }

    /// Inline `data:` URL for previewing the selection.
    pub fn preview_data_url(&self) -> String {
        format!("data:{};base64,{}", self.content_type, BASE64.encode(&self.bytes))
    }
}
