//! Image loading for OCR uploads.
//!
//! Files are decoded to make sure they are real images before anything is
//! sent over the wire. Formats the API accepts are forwarded untouched, the
//! rest are re-encoded as PNG.

use std::io::Cursor;
use std::path::Path;

use image::ImageFormat;

use crate::domain::{ClientError, ImagePayload};

/// Read, validate and prepare the image at `path` for upload.
pub fn load_image(path: impl AsRef<Path>) -> Result<ImagePayload, ClientError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|err| {
        ClientError::image(format!("cannot read `{}`: {err}", path.display()))
    })?;
    decode_payload(bytes)
        .map_err(|err| ClientError::image(format!("cannot decode `{}`: {err}", path.display())))
}

fn decode_payload(bytes: Vec<u8>) -> Result<ImagePayload, image::ImageError> {
    let format = image::guess_format(&bytes)?;
    let decoded = image::load_from_memory_with_format(&bytes, format)?;

    if is_natively_supported(format) {
        return Ok(ImagePayload::new(format.to_mime_type(), bytes));
    }

    let mut png = Cursor::new(Vec::new());
    decoded.write_to(&mut png, ImageFormat::Png)?;
    Ok(ImagePayload::new(
        ImageFormat::Png.to_mime_type(),
        png.into_inner(),
    ))
}

fn is_natively_supported(format: ImageFormat) -> bool {
    matches!(
        format,
        ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::WebP
    )
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};

    use super::*;

    fn encoded(format: ImageFormat) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(3, 2, Rgb([10, 20, 30])));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, format).unwrap();
        out.into_inner()
    }

    fn write_temp(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file
    }

    #[test]
    fn png_is_forwarded_untouched() {
        let bytes = encoded(ImageFormat::Png);
        let file = write_temp(&bytes);

        let payload = load_image(file.path()).unwrap();
        assert_eq!(payload.mime_type, "image/png");
        assert_eq!(payload.bytes, bytes);
    }

    #[test]
    fn jpeg_keeps_its_mime_type() {
        let file = write_temp(&encoded(ImageFormat::Jpeg));
        assert_eq!(load_image(file.path()).unwrap().mime_type, "image/jpeg");
    }

    #[test]
    fn gif_is_reencoded_as_png() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 255])));
        let mut gif = Cursor::new(Vec::new());
        img.write_to(&mut gif, ImageFormat::Gif).unwrap();
        let file = write_temp(&gif.into_inner());

        let payload = load_image(file.path()).unwrap();
        assert_eq!(payload.mime_type, "image/png");
        assert_eq!(
            image::guess_format(&payload.bytes).unwrap(),
            ImageFormat::Png
        );
        let roundtrip = image::load_from_memory_with_format(&payload.bytes, ImageFormat::Png)
            .unwrap();
        assert_eq!((roundtrip.width(), roundtrip.height()), (3, 2));
    }

    #[test]
    fn corrupt_data_is_an_image_error() {
        let file = write_temp(b"plain text, not pixels");
        assert!(matches!(
            load_image(file.path()),
            Err(ClientError::ImageLoad(_))
        ));
    }

    #[test]
    fn truncated_png_is_an_image_error() {
        let bytes = encoded(ImageFormat::Png);
        let file = write_temp(&bytes[..bytes.len() / 2]);
        assert!(matches!(
            load_image(file.path()),
            Err(ClientError::ImageLoad(_))
        ));
    }

    #[test]
    fn missing_file_is_an_image_error() {
        let err = load_image("/definitely/not/here.png").unwrap_err();
        assert!(matches!(err, ClientError::ImageLoad(_)));
        assert!(err.to_string().contains("/definitely/not/here.png"));
    }
}
