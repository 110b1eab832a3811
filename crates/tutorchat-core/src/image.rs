//! Image attachment validation and encoding.
//!
//! Images travel to the service as base64 data URLs. Validation happens
//! entirely on the client: non-image files and files over the 16 MiB limit
//! are rejected with a user-facing alert message and never uploaded.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::error::{ChatClientError, Result};

/// Upper bound for an attached image file.
pub const MAX_IMAGE_BYTES: u64 = 16 * 1024 * 1024;

/// Alert text for a file that is not an image.
pub const MSG_NOT_AN_IMAGE: &str = "请选择图片文件！";
/// Alert text for an image over the size limit.
pub const MSG_IMAGE_TOO_LARGE: &str = "图片文件过大，请选择小于16MB的图片！";

/// An image ready for upload, encoded as a data URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAttachment {
    /// MIME type derived from the file name (e.g. "image/png").
    pub mime: String,
    /// `data:<mime>;base64,<payload>`
    pub data_url: String,
}

impl ImageAttachment {
    /// Validates and encodes raw file bytes into an attachment.
    ///
    /// # Errors
    ///
    /// Returns `InvalidImage` with the user-facing alert text when the file
    /// name does not look like an image or the payload exceeds
    /// [`MAX_IMAGE_BYTES`].
    pub fn from_bytes(file_name: &str, bytes: &[u8]) -> Result<Self> {
        let mime = mime_for_file(file_name)
            .ok_or_else(|| ChatClientError::invalid_image(MSG_NOT_AN_IMAGE))?;
        if bytes.len() as u64 > MAX_IMAGE_BYTES {
            return Err(ChatClientError::invalid_image(MSG_IMAGE_TOO_LARGE));
        }
        let data_url = format!("data:{};base64,{}", mime, STANDARD.encode(bytes));
        Ok(Self {
            mime: mime.to_string(),
            data_url,
        })
    }
}

/// Checks a file size against the limit without reading the file.
///
/// # Errors
///
/// Returns `InvalidImage` with the oversize alert text.
pub fn check_image_size(len: u64) -> Result<()> {
    if len > MAX_IMAGE_BYTES {
        return Err(ChatClientError::invalid_image(MSG_IMAGE_TOO_LARGE));
    }
    Ok(())
}

/// Maps a file name to an image MIME type by extension.
///
/// Returns `None` for anything that is not a recognized image format.
pub fn mime_for_file(name: &str) -> Option<&'static str> {
    let ext = std::path::Path::new(name)
        .extension()
        .and_then(|e| e.to_str())?
        .to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}
