//! Upload decoding with EXIF orientation handling.

use std::io::Cursor;

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageReader};
use tracing::debug;

use super::{DecodeError, Orientation, PixelLayout, SourceFormat, SourceImage};

/// Decode an uploaded JPEG or PNG into a [`SourceImage`].
///
/// The format is sniffed from the magic bytes, not from a file name. JPEG
/// sources get their EXIF orientation applied so the raster matches what a
/// browser would draw; PNG sources keep their alpha channel when they have one.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if the bytes are not a recognizable image,
/// `DecodeError::UnsupportedFormat` for images other than JPEG/PNG, and
/// `DecodeError::CorruptedFile` if decoding fails.
pub fn decode_image(bytes: &[u8]) -> Result<SourceImage, DecodeError> {
    let format = detect_format(bytes)?;

    let img = ImageReader::with_format(Cursor::new(bytes), image_format(format))
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    let img = match format {
        SourceFormat::Jpeg => apply_orientation(img, extract_orientation(bytes)),
        SourceFormat::Png => img,
    };

    let (width, height) = (img.width(), img.height());
    let (layout, pixels) = if format.supports_alpha() && img.color().has_alpha() {
        (PixelLayout::Rgba8, img.into_rgba8().into_raw())
    } else {
        (PixelLayout::Rgb8, img.into_rgb8().into_raw())
    };

    debug!(
        ?format,
        ?layout,
        width,
        height,
        original_size = bytes.len(),
        "decoded source image"
    );

    SourceImage::new(width, height, layout, pixels, bytes.len() as u64, format)
}

/// Detect the source format from magic bytes.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if nothing is recognized and
/// `DecodeError::UnsupportedFormat` if the image is not JPEG or PNG.
pub fn detect_format(bytes: &[u8]) -> Result<SourceFormat, DecodeError> {
    let detected = image::guess_format(bytes).map_err(|_| DecodeError::InvalidFormat)?;
    SourceFormat::from_image_format(detected)
        .ok_or_else(|| DecodeError::UnsupportedFormat(format!("{detected:?}")))
}

/// Extract EXIF orientation from JPEG bytes.
///
/// Returns `Orientation::Normal` if no EXIF data is found or orientation
/// cannot be determined.
pub fn get_orientation(bytes: &[u8]) -> Orientation {
    extract_orientation(bytes)
}

fn image_format(format: SourceFormat) -> image::ImageFormat {
    match format {
        SourceFormat::Jpeg => image::ImageFormat::Jpeg,
        SourceFormat::Png => image::ImageFormat::Png,
    }
}

fn extract_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);
    match Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Orientation::from)
            .unwrap_or_default(),
        Err(_) => Orientation::Normal,
    }
}

/// Apply EXIF orientation transformation to an image.
fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}
