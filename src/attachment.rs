/// Attachment intake: selected image files become self-contained,
/// re-displayable blobs before they reach the annotation store
///
/// Each file is read fully into memory (one read per file, selection
/// order preserved), validated as a decodable image, and re-encoded to a
/// bounded JPEG when it is larger than the attachment edge limit. The
/// bound keeps a handful of phone photos from blowing up the annotation
/// database.

use std::io::Cursor;
use std::path::PathBuf;

use base64::Engine;
use chrono::Utc;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use tracing::warn;

use crate::state::annotations::ContributionImage;

/// Longest allowed edge for a stored attachment (pixels)
pub const MAX_ATTACHMENT_EDGE: u32 = 1600;

/// Read the selected files into contribution images. Files that cannot
/// be read or decoded are skipped with a log line; the rest keep their
/// selection order.
pub async fn read_images(paths: Vec<PathBuf>) -> Vec<ContributionImage> {
    let mut images = Vec::with_capacity(paths.len());

    for path in paths {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("could not read image {}: {e}", path.display());
                continue;
            }
        };

        // Decoding and re-encoding are CPU-bound
        let encoded = tokio::task::spawn_blocking(move || encode_attachment(&bytes)).await;
        match encoded {
            Ok(Some(data_url)) => images.push(ContributionImage {
                data_url: Some(data_url),
                url: None,
                filename,
                upload_date: Utc::now().to_rfc3339(),
            }),
            Ok(None) => warn!("{} is not a decodable image, skipping", path.display()),
            Err(e) => warn!("image task failed for {}: {e}", path.display()),
        }
    }

    images
}

/// Validate and encode one attachment as a data URL. Oversized images
/// are resized and re-encoded as JPEG; everything else is stored as-is
/// under its sniffed MIME type.
fn encode_attachment(bytes: &[u8]) -> Option<String> {
    let format = image::guess_format(bytes).ok()?;
    let decoded = image::load_from_memory_with_format(bytes, format).ok()?;

    let (mime, payload) = if decoded.width().max(decoded.height()) > MAX_ATTACHMENT_EDGE {
        let resized = decoded.resize(MAX_ATTACHMENT_EDGE, MAX_ATTACHMENT_EDGE, FilterType::Lanczos3);
        // JPEG has no alpha channel
        let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());
        let mut out = Vec::new();
        rgb.write_to(&mut Cursor::new(&mut out), ImageFormat::Jpeg).ok()?;
        ("image/jpeg", out)
    } else {
        (format.to_mime_type(), bytes.to_vec())
    };

    let encoded = base64::engine::general_purpose::STANDARD.encode(&payload);
    Some(format!("data:{mime};base64,{encoded}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let buffer = ImageBuffer::from_pixel(width, height, Rgb::<u8>([120, 90, 60]));
        let mut out = Vec::new();
        DynamicImage::ImageRgb8(buffer)
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn test_small_image_keeps_original_bytes() {
        let bytes = png_bytes(4, 4);
        let data_url = encode_attachment(&bytes).unwrap();
        assert!(data_url.starts_with("data:image/png;base64,"));

        let encoded = data_url.split_once(";base64,").unwrap().1;
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .unwrap();
        assert_eq!(decoded, bytes);
    }

    #[test]
    fn test_oversized_image_is_bounded_and_reencoded() {
        let bytes = png_bytes(MAX_ATTACHMENT_EDGE * 2, 100);
        let data_url = encode_attachment(&bytes).unwrap();
        assert!(data_url.starts_with("data:image/jpeg;base64,"));

        let encoded = data_url.split_once(";base64,").unwrap().1;
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .unwrap();
        let reloaded = image::load_from_memory(&decoded).unwrap();
        assert!(reloaded.width() <= MAX_ATTACHMENT_EDGE);
        assert!(reloaded.height() <= MAX_ATTACHMENT_EDGE);
    }

    #[test]
    fn test_non_image_is_rejected() {
        assert!(encode_attachment(b"definitely not an image").is_none());
    }

    #[tokio::test]
    async fn test_read_images_preserves_selection_order_and_skips_failures() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.png");
        let second = dir.path().join("second.png");
        let broken = dir.path().join("broken.png");
        std::fs::write(&first, png_bytes(2, 2)).unwrap();
        std::fs::write(&second, png_bytes(3, 3)).unwrap();
        std::fs::write(&broken, b"garbage").unwrap();

        let images = read_images(vec![
            first,
            broken,
            dir.path().join("missing.png"),
            second,
        ])
        .await;

        let filenames: Vec<_> = images.iter().map(|img| img.filename.clone()).collect();
        assert_eq!(filenames, vec!["first.png", "second.png"]);
        assert!(images.iter().all(|img| img.data_url.is_some()));
    }
}
