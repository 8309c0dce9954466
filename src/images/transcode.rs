//! Card artwork transcoding: decode whatever the source serves, normalize to
//! the catalog's fixed canvas, re-encode as JPEG.

use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{Rgb, RgbImage};

/// Catalog canvas: standard portrait card at 480x672 (5:7).
pub const CANVAS_W: u32 = 480;
pub const CANVAS_H: u32 = 672;
const JPEG_QUALITY: u8 = 85;

/// How a source image is mapped onto the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fit {
    /// Scale to fill and crop overflow. For straight card scans.
    Cover,
    /// Scale to fit and pad the remainder. For sources with borders or
    /// non-uniform aspect ratios.
    Contain,
}

/// Pick a fit from the decoded dimensions: anything already close to the
/// card aspect gets cropped to fill, everything else is letterboxed.
pub fn fit_for_dimensions(width: u32, height: u32) -> Fit {
    if height == 0 {
        return Fit::Contain;
    }
    let ratio = width as f64 / height as f64;
    let target = CANVAS_W as f64 / CANVAS_H as f64;
    if (ratio - target).abs() <= 0.08 {
        Fit::Cover
    } else {
        Fit::Contain
    }
}

/// Decode, resize to the canvas with the given fit, encode JPEG.
pub fn transcode_card(bytes: &[u8], fit: Fit) -> Result<Vec<u8>> {
    let img = image::load_from_memory(bytes).context("decoding source image")?;

    let canvas: RgbImage = match fit {
        Fit::Cover => img
            .resize_to_fill(CANVAS_W, CANVAS_H, FilterType::Lanczos3)
            .to_rgb8(),
        Fit::Contain => {
            let scaled = img.resize(CANVAS_W, CANVAS_H, FilterType::Lanczos3);
            let mut canvas = RgbImage::from_pixel(CANVAS_W, CANVAS_H, Rgb([255, 255, 255]));
            let x = (CANVAS_W - scaled.width()) / 2;
            let y = (CANVAS_H - scaled.height()) / 2;
            image::imageops::overlay(&mut canvas, &scaled.to_rgb8(), i64::from(x), i64::from(y));
            canvas
        }
    };

    let mut buf: Vec<u8> = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY);
    canvas
        .write_with_encoder(encoder)
        .context("encoding jpeg")?;
    Ok(buf)
}

/// Decode once to pick the fit, then transcode.
pub fn transcode_card_auto(bytes: &[u8]) -> Result<Vec<u8>> {
    let reader = image::ImageReader::new(std::io::Cursor::new(bytes))
        .with_guessed_format()
        .context("sniffing source image format")?;
    let (w, h) = reader
        .into_dimensions()
        .context("reading source image dimensions")?;
    transcode_card(bytes, fit_for_dimensions(w, h))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(w, h, Rgb([40, 90, 200]));
        let mut buf = Vec::new();
        img.write_to(
            &mut std::io::Cursor::new(&mut buf),
            image::ImageFormat::Png,
        )
        .unwrap();
        buf
    }

    #[test]
    fn cover_produces_exact_canvas() {
        let out = transcode_card(&png_bytes(100, 140), Fit::Cover).unwrap();
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (CANVAS_W, CANVAS_H));
    }

    #[test]
    fn contain_pads_to_exact_canvas() {
        let out = transcode_card(&png_bytes(100, 100), Fit::Contain).unwrap();
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (CANVAS_W, CANVAS_H));
    }

    #[test]
    fn fit_picks_cover_for_card_aspect() {
        assert_eq!(fit_for_dimensions(480, 672), Fit::Cover);
        assert_eq!(fit_for_dimensions(500, 700), Fit::Cover);
        assert_eq!(fit_for_dimensions(1000, 1000), Fit::Contain);
        assert_eq!(fit_for_dimensions(672, 480), Fit::Contain);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(transcode_card(b"not an image", Fit::Cover).is_err());
    }
}
