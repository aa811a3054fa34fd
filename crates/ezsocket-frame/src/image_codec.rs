use crate::error::Result;

/// Compresses images to bytes and back.
///
/// The compressed format is agreed out of band; nothing on the wire names it.
pub trait ImageCodec {
    type Image;

    fn encode(&self, image: &Self::Image) -> Result<Vec<u8>>;

    fn decode(&self, bytes: &[u8]) -> Result<Self::Image>;

    fn format_name(&self) -> &'static str;
}

#[cfg(feature = "image")]
pub use self::jpeg::{JpegCodec, DEFAULT_JPEG_QUALITY};

#[cfg(feature = "image")]
mod jpeg {
    use image::codecs::jpeg::JpegEncoder;
    use image::{DynamicImage, ExtendedColorType, ImageFormat};

    use super::ImageCodec;
    use crate::error::{FrameError, Result};

    pub const DEFAULT_JPEG_QUALITY: u8 = 95;

    /// JPEG via the `image` crate. Images are flattened to 8-bit RGB.
    #[derive(Debug, Clone, Copy)]
    pub struct JpegCodec {
        pub quality: u8,
    }

    impl Default for JpegCodec {
        fn default() -> Self {
            Self {
                quality: DEFAULT_JPEG_QUALITY,
            }
        }
    }

    impl ImageCodec for JpegCodec {
        type Image = DynamicImage;

        fn encode(&self, image: &DynamicImage) -> Result<Vec<u8>> {
            let rgb = image.to_rgb8();
            let mut out = Vec::new();
            JpegEncoder::new_with_quality(&mut out, self.quality.clamp(1, 100))
                .encode(
                    rgb.as_raw(),
                    rgb.width(),
                    rgb.height(),
                    ExtendedColorType::Rgb8,
                )
                .map_err(|err| FrameError::Codec(format!("jpeg encode failed: {err}")))?;
            Ok(out)
        }

        fn decode(&self, bytes: &[u8]) -> Result<DynamicImage> {
            image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)
                .map_err(|err| FrameError::Codec(format!("jpeg decode failed: {err}")))
        }

        fn format_name(&self) -> &'static str {
            "jpeg"
        }
    }

}
