use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::ImageFormat;
use log::{debug, info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

// ===================================
//         UTILITY FUNCTIONS
// ===================================

fn extension_for(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Jpeg => "jpg",
        ImageFormat::Png => "png",
        ImageFormat::Gif => "gif",
        ImageFormat::WebP => "webp",
        ImageFormat::Bmp => "bmp",
        ImageFormat::Tiff => "tiff",
        _ => "png", // fallback
    }
}

/// Decodes `data:image/<ext>;base64,<payload>` into raw bytes and the
/// detected image format
pub fn decode_data_uri(field: &str, data: &str) -> AppResult<(Vec<u8>, ImageFormat)> {
    let invalid = |reason: &str| AppError::validation(field, reason);

    let payload = data
        .trim()
        .strip_prefix("data:image/")
        .and_then(|rest| rest.split_once(";base64,"))
        .map(|(_, payload)| payload)
        .ok_or_else(|| invalid("Expected a base64 encoded image."))?;

    let bytes = STANDARD
        .decode(payload)
        .map_err(|_| invalid("Image payload is not valid base64."))?;

    let format = image::guess_format(&bytes).map_err(|_| invalid("Upload a valid image."))?;

    Ok((bytes, format))
}

/// Writes the image under `<media_root>/<subdir>/` and returns its path
/// relative to the media root
pub async fn store_data_uri(
    media_root: &Path,
    subdir: &str,
    field: &str,
    data: &str,
) -> AppResult<String> {
    let (bytes, format) = decode_data_uri(field, data)?;

    let dir = media_root.join(subdir);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?;

    let file_name = format!("{}.{}", Uuid::new_v4().simple(), extension_for(format));
    tokio::fs::write(dir.join(&file_name), &bytes)
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?;

    let relative = format!("{subdir}/{file_name}");
    info!("Stored image {} ({} bytes)", relative, bytes.len());
    Ok(relative)
}

/// Best-effort removal of a stored file
pub async fn discard(media_root: &Path, relative: &str) {
    let path = media_root.join(relative);
    match tokio::fs::remove_file(&path).await {
        Ok(()) => debug!("Removed {}", path.display()),
        Err(e) => warn!("Could not remove {}: {}", path.display(), e),
    }
}
