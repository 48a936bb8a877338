//! Clipboard content and captured job input

use base64::{engine::general_purpose::STANDARD, Engine};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use thiserror::Error;

/// Raw RGBA8 image as exchanged with the platform clipboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaImage {
    pub width: usize,
    pub height: usize,
    pub bytes: Vec<u8>,
}

/// Error when a clipboard image cannot be encoded
#[derive(Debug, Clone, Error)]
pub enum ImageEncodeError {
    #[error("Image buffer holds {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    BufferSize {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },

    #[error("PNG encoding failed: {0}")]
    Encode(String),
}

impl RgbaImage {
    pub fn new(width: usize, height: usize, bytes: Vec<u8>) -> Self {
        Self {
            width,
            height,
            bytes,
        }
    }

    /// Encode as PNG for provider upload
    pub fn to_png(&self) -> Result<EncodedImage, ImageEncodeError> {
        let expected = self.width * self.height * 4;
        if self.bytes.len() != expected || expected == 0 {
            return Err(ImageEncodeError::BufferSize {
                width: self.width,
                height: self.height,
                expected,
                actual: self.bytes.len(),
            });
        }

        let mut out = Vec::new();
        PngEncoder::new(&mut out)
            .write_image(
                &self.bytes,
                self.width as u32,
                self.height as u32,
                ExtendedColorType::Rgba8,
            )
            .map_err(|e| ImageEncodeError::Encode(e.to_string()))?;

        Ok(EncodedImage::png(out))
    }
}

/// A full clipboard snapshot.
///
/// Restoring a snapshot writes back exactly these bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ClipboardContent {
    #[default]
    Empty,
    Text(String),
    Image(RgbaImage),
}

impl ClipboardContent {
    /// Empty clipboard, or whitespace-only text
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(text) => text.trim().is_empty(),
            Self::Image(image) => image.bytes.is_empty(),
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Self::Image(_))
    }

    /// Short description for logs; never includes the content itself
    pub fn describe(&self) -> String {
        match self {
            Self::Empty => "empty".to_string(),
            Self::Text(text) => format!("text ({} chars)", text.chars().count()),
            Self::Image(image) => format!("image ({}x{})", image.width, image.height),
        }
    }
}

/// Encoded image bytes plus MIME type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    bytes: Vec<u8>,
    mime_type: &'static str,
}

impl EncodedImage {
    pub fn png(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            mime_type: "image/png",
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    /// Base64 encode for JSON request bodies
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// `data:` URL form used by chat-completions image parts
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }
}

/// What a job captured from the user's selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapturedInput {
    Text(String),
    Image(EncodedImage),
}

impl CapturedInput {
    /// Convert a non-empty clipboard read into job input.
    ///
    /// Returns `Ok(None)` for empty content.
    pub fn from_clipboard(content: &ClipboardContent) -> Result<Option<Self>, ImageEncodeError> {
        if content.is_empty() {
            return Ok(None);
        }
        match content {
            ClipboardContent::Empty => Ok(None),
            ClipboardContent::Text(text) => Ok(Some(Self::Text(text.clone()))),
            ClipboardContent::Image(image) => Ok(Some(Self::Image(image.to_png()?))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel_image() -> RgbaImage {
        RgbaImage::new(2, 1, vec![255, 0, 0, 255, 0, 255, 0, 255])
    }

    #[test]
    fn whitespace_text_is_empty() {
        assert!(ClipboardContent::Text("  \n\t".to_string()).is_empty());
        assert!(ClipboardContent::Empty.is_empty());
        assert!(!ClipboardContent::Text("hi".to_string()).is_empty());
    }

    #[test]
    fn png_encoding_has_signature() {
        let png = pixel_image().to_png().unwrap();
        assert_eq!(&png.bytes()[..4], &[0x89, b'P', b'N', b'G']);
        assert_eq!(png.mime_type(), "image/png");
    }

    #[test]
    fn png_encoding_rejects_bad_buffer() {
        let image = RgbaImage::new(4, 4, vec![0; 3]);
        assert!(matches!(
            image.to_png(),
            Err(ImageEncodeError::BufferSize { expected: 64, actual: 3, .. })
        ));
    }

    #[test]
    fn data_url_prefix() {
        let encoded = EncodedImage::png(vec![1, 2, 3]);
        assert_eq!(encoded.to_data_url(), "data:image/png;base64,AQID");
    }

    #[test]
    fn captured_input_from_clipboard() {
        assert_eq!(
            CapturedInput::from_clipboard(&ClipboardContent::Empty).unwrap(),
            None
        );
        assert_eq!(
            CapturedInput::from_clipboard(&ClipboardContent::Text("x".into())).unwrap(),
            Some(CapturedInput::Text("x".into()))
        );
        let image = CapturedInput::from_clipboard(&ClipboardContent::Image(pixel_image()))
            .unwrap()
            .unwrap();
        assert!(matches!(image, CapturedInput::Image(_)));
    }

    #[test]
    fn describe_does_not_leak_text() {
        let content = ClipboardContent::Text("secret".to_string());
        assert_eq!(content.describe(), "text (6 chars)");
    }
}
