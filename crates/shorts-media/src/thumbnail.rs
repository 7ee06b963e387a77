//! Thumbnail helpers.

use std::io::Cursor;
use std::path::Path;
use std::time::Duration;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ColorType, DynamicImage, Rgb, RgbImage};
use tracing::debug;

use shorts_models::encoding::{
    THUMBNAIL_HEIGHT, THUMBNAIL_JPEG_QUALITY, THUMBNAIL_TIMESTAMP, THUMBNAIL_WIDTH,
};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Grab one frame from an encoded video and return it as a normalized JPEG.
pub async fn extract_frame_jpeg(video: &[u8], work_dir: &Path, timeout: Duration) -> MediaResult<Vec<u8>> {
    if video.is_empty() {
        return Err(MediaError::invalid_media("video payload is empty"));
    }

    tokio::fs::create_dir_all(work_dir).await?;
    let temp_dir = tempfile::Builder::new().prefix("thumb-").tempdir_in(work_dir)?;
    let input = temp_dir.path().join("video.mp4");
    let output = temp_dir.path().join("frame.jpg");
    tokio::fs::write(&input, video).await?;

    let cmd = FfmpegCommand::with_output(&output)
        .input_args(["-ss", THUMBNAIL_TIMESTAMP])
        .input(&input)
        .single_frame()
        .output_args(["-q:v", "2"]);

    FfmpegRunner::new().with_timeout(timeout).run(&cmd).await?;

    if !output.exists() {
        return Err(MediaError::FileNotFound(output));
    }
    let frame = tokio::fs::read(&output).await?;
    debug!(bytes = frame.len(), "Extracted thumbnail frame");

    normalize_to_jpeg(&frame)
}

/// Decode any supported image and re-encode it as a 1080x1920 JPEG.
///
/// Images with another aspect ratio are scaled to cover the frame and
/// center-cropped.
pub fn normalize_to_jpeg(bytes: &[u8]) -> MediaResult<Vec<u8>> {
    if bytes.is_empty() {
        return Err(MediaError::invalid_media("image payload is empty"));
    }

    let img = image::load_from_memory(bytes)?;
    let img = if img.width() == THUMBNAIL_WIDTH && img.height() == THUMBNAIL_HEIGHT {
        img
    } else {
        img.resize_to_fill(THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT, FilterType::Lanczos3)
    };

    encode_jpeg(&img.to_rgb8())
}

/// Branded placeholder used when no thumbnail could be produced.
///
/// Always returns the same bytes.
pub fn placeholder_thumbnail() -> MediaResult<Vec<u8>> {
    const TOP: [f32; 3] = [24.0, 20.0, 64.0];
    const BOTTOM: [f32; 3] = [196.0, 38.0, 112.0];

    let (w, h) = (THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT);
    let (cx, cy) = (w as f32 / 2.0, h as f32 / 2.0);
    let size = w as f32 / 6.0;

    let img = RgbImage::from_fn(w, h, |x, y| {
        let t = y as f32 / (h - 1) as f32;
        let mut px = [0u8; 3];
        for (i, c) in px.iter_mut().enumerate() {
            *c = (TOP[i] + (BOTTOM[i] - TOP[i]) * t).round() as u8;
        }

        // Play triangle pointing right
        let (dx, dy) = (x as f32 - (cx - size / 2.0), (y as f32 - cy).abs());
        if dx >= 0.0 && dx <= size && dy <= (size - dx) * 0.6 {
            px = [245, 245, 250];
        }

        Rgb(px)
    });

    encode_jpeg(&img)
}

fn encode_jpeg(img: &RgbImage) -> MediaResult<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut buf, THUMBNAIL_JPEG_QUALITY).encode(
        img.as_raw(),
        img.width(),
        img.height(),
        ColorType::Rgb8,
    )?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageOutputFormat;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([10, 200, 30])));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageOutputFormat::Png).unwrap();
        buf.into_inner()
    }

    fn is_thumbnail_sized(bytes: &[u8]) -> bool {
        image::load_from_memory(bytes)
            .map(|img| img.width() == THUMBNAIL_WIDTH && img.height() == THUMBNAIL_HEIGHT)
            .unwrap_or(false)
    }

    #[test]
    fn test_placeholder_is_deterministic_jpeg() {
        let a = placeholder_thumbnail().unwrap();
        let b = placeholder_thumbnail().unwrap();
        assert_eq!(a, b);
        assert_eq!(&a[..2], &[0xFF, 0xD8]);
        assert!(is_thumbnail_sized(&a));
    }

    #[test]
    fn test_normalize_fills_vertical_frame() {
        // Landscape 1536x1024 input is cropped to portrait
        let jpeg = normalize_to_jpeg(&png(1536, 1024)).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
        assert!(is_thumbnail_sized(&jpeg));
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        assert!(matches!(normalize_to_jpeg(b"not an image"), Err(MediaError::Image(_))));
        assert!(matches!(normalize_to_jpeg(&[]), Err(MediaError::InvalidMedia(_))));
    }

    #[tokio::test]
    async fn test_extract_rejects_empty_video() {
        let err = extract_frame_jpeg(&[], &std::env::temp_dir(), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::InvalidMedia(_)));
    }
}
