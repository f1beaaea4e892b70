//! QR rendering of ticket payloads.
//!
//! The payload JSON is encoded as a byte-mode QR symbol, rasterised onto a
//! square greyscale canvas of a fixed pixel size with a fixed light margin
//! measured in modules, and packed as a PNG data URI.

use crate::payload::TicketPayload;
use base64::Engine;
use image::{GrayImage, ImageFormat, Luma};
use qrcode::{Color, EcLevel, QrCode};
use std::fmt;
use std::future::Future;
use std::io::Cursor;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Largest canvas the encoder will allocate, in pixels per side.
pub const MAX_SIZE_PX: u32 = 4096;

/// Error correction level of the QR symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorCorrection {
    /// ~7% recovery
    Low,
    /// ~15% recovery
    #[default]
    Medium,
    /// ~25% recovery
    Quartile,
    /// ~30% recovery
    High,
}

impl From<ErrorCorrection> for EcLevel {
    fn from(level: ErrorCorrection) -> Self {
        match level {
            ErrorCorrection::Low => Self::L,
            ErrorCorrection::Medium => Self::M,
            ErrorCorrection::Quartile => Self::Q,
            ErrorCorrection::High => Self::H,
        }
    }
}

impl FromStr for ErrorCorrection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "L" => Ok(Self::Low),
            "M" => Ok(Self::Medium),
            "Q" => Ok(Self::Quartile),
            "H" => Ok(Self::High),
            other => Err(format!("unknown error correction level {other:?}, expected L, M, Q or H")),
        }
    }
}

/// Rendering parameters, fixed for the lifetime of an issuer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Width and height of the output image in pixels
    pub size_px: u32,
    /// Light border around the symbol, in modules
    pub margin_modules: u32,
    /// QR error correction level
    pub error_correction: ErrorCorrection,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            size_px: 256,
            margin_modules: 1,
            error_correction: ErrorCorrection::Medium,
        }
    }
}

/// Why a ticket image could not be produced.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The payload could not be serialized
    #[error("ticket payload could not be serialized: {0}")]
    Payload(#[from] serde_json::Error),

    /// No QR symbol can hold the data (e.g. it is too long)
    #[error("QR symbol could not be built: {0}")]
    Symbol(String),

    /// The requested canvas cannot fit one pixel per module
    #[error("{size_px}px canvas is smaller than the {required} modules the symbol needs")]
    CanvasTooSmall {
        /// Requested canvas size
        size_px: u32,
        /// Modules across, including margins
        required: u32,
    },

    /// The requested canvas exceeds [`MAX_SIZE_PX`]
    #[error("{size_px}px canvas exceeds the {max}px limit")]
    CanvasTooLarge {
        /// Requested canvas size
        size_px: u32,
        /// Largest accepted size
        max: u32,
    },

    /// The render task panicked or was cancelled
    #[error("ticket render task failed: {0}")]
    Render(String),

    /// PNG encoding failed
    #[error("ticket image could not be encoded: {0}")]
    Image(#[from] image::ImageError),

    /// Failure injected by a test double
    #[error("injected encoder fault: {0}")]
    Injected(String),
}

/// A rendered ticket image.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedTicketImage {
    png: Arc<[u8]>,
    size_px: u32,
    modules: u32,
}

impl EncodedTicketImage {
    /// Raw PNG bytes
    #[must_use]
    pub fn png_bytes(&self) -> &[u8] {
        &self.png
    }

    /// Width and height in pixels
    #[must_use]
    pub const fn size_px(&self) -> u32 {
        self.size_px
    }

    /// Modules across the QR symbol, margins excluded
    #[must_use]
    pub const fn modules(&self) -> u32 {
        self.modules
    }

    /// `data:image/png;base64,...` URI, embeddable in an `<img>` tag.
    #[must_use]
    pub fn data_uri(&self) -> String {
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&self.png)
        )
    }
}

impl fmt::Debug for EncodedTicketImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedTicketImage")
            .field("png_len", &self.png.len())
            .field("size_px", &self.size_px)
            .field("modules", &self.modules)
            .finish()
    }
}

/// Future returned by [`TicketEncoder::encode`].
pub type EncodeFuture = Pin<Box<dyn Future<Output = Result<EncodedTicketImage, EncodeError>> + Send>>;

/// Turns a payload into a scannable image.
pub trait TicketEncoder: Send + Sync {
    /// Render `payload` with `options`.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError`] if no image could be produced.
    fn encode(&self, payload: &TicketPayload, options: &EncodeOptions) -> EncodeFuture;
}

/// Production encoder: QR symbol rendered to PNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct QrTicketEncoder;

impl QrTicketEncoder {
    /// Creates an Arc-wrapped instance for sharing
    #[must_use]
    pub fn shared() -> Arc<dyn TicketEncoder> {
        Arc::new(Self)
    }

    /// Render synchronously.
    ///
    /// # Errors
    ///
    /// See [`EncodeError`].
    pub fn render(payload: &TicketPayload, options: &EncodeOptions) -> Result<EncodedTicketImage, EncodeError> {
        if options.size_px > MAX_SIZE_PX {
            return Err(EncodeError::CanvasTooLarge {
                size_px: options.size_px,
                max: MAX_SIZE_PX,
            });
        }

        let json = payload.to_json()?;
        let code = QrCode::with_error_correction_level(json.as_bytes(), options.error_correction.into())
            .map_err(|e| EncodeError::Symbol(e.to_string()))?;

        let modules = code.width();
        let margin = options.margin_modules as usize;
        let span = modules + 2 * margin;
        let size = options.size_px as usize;
        if size < span {
            return Err(EncodeError::CanvasTooSmall {
                size_px: options.size_px,
                required: u32::try_from(span).unwrap_or(u32::MAX),
            });
        }

        let colors = code.to_colors();
        let module_index = |px: u32| -> Option<usize> {
            // Nearest-neighbour mapping from pixel to module coordinate.
            let module = px as usize * span / size;
            (margin..margin + modules).contains(&module).then(|| module - margin)
        };

        let canvas = GrayImage::from_fn(options.size_px, options.size_px, |x, y| {
            let dark = match (module_index(x), module_index(y)) {
                (Some(mx), Some(my)) => colors[my * modules + mx] == Color::Dark,
                _ => false,
            };
            Luma([if dark { 0 } else { 255 }])
        });

        let mut png = Vec::new();
        canvas.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

        Ok(EncodedTicketImage {
            png: png.into(),
            size_px: options.size_px,
            modules: u32::try_from(modules).unwrap_or(u32::MAX),
        })
    }
}

impl TicketEncoder for QrTicketEncoder {
    fn encode(&self, payload: &TicketPayload, options: &EncodeOptions) -> EncodeFuture {
        let payload = payload.clone();
        let options = options.clone();
        Box::pin(render_blocking(move || Self::render(&payload, &options)))
    }
}

/// Run a render on the blocking pool; a panic there becomes [`EncodeError::Render`].
async fn render_blocking<F>(render: F) -> Result<EncodedTicketImage, EncodeError>
where
    F: FnOnce() -> Result<EncodedTicketImage, EncodeError> + Send + 'static,
{
    tokio::task::spawn_blocking(render)
        .await
        .map_err(|e| EncodeError::Render(e.to_string()))?
}

/// Encode a ticket, absorbing failures.
///
/// The request is handed to `encoder` immediately; the returned future
/// resolves to `None` when it fails. The failure is logged and counted but
/// never returned, so the caller can show its placeholder.
pub fn encode_ticket(
    encoder: &dyn TicketEncoder,
    payload: &TicketPayload,
    options: &EncodeOptions,
) -> impl Future<Output = Option<EncodedTicketImage>> + Send + use<> {
    let request = encoder.encode(payload, options);
    let order_code = payload.order_code().clone();

    async move {
        match request.await {
            Ok(image) => {
                metrics::counter!("tickets.encode.succeeded").increment(1);
                tracing::debug!(
                    %order_code,
                    size_px = image.size_px(),
                    modules = image.modules(),
                    png_len = image.png_bytes().len(),
                    "Ticket image encoded"
                );
                Some(image)
            }
            Err(error) => {
                metrics::counter!("tickets.encode.failed").increment(1);
                tracing::warn!(
                    %order_code,
                    error = %error,
                    "Ticket image encoding failed, showing placeholder"
                );
                None
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)] // Test code
mod tests {
    use super::*;
    use crate::order_code::OrderCode;

    fn payload(title: &str) -> TicketPayload {
        TicketPayload::build(
            OrderCode::parse("AB12CD34").unwrap(),
            title,
            "Dec 28, 2024",
            "Cape Town Stadium",
        )
    }

    #[test]
    fn test_render_produces_png_of_requested_size() {
        let image = QrTicketEncoder::render(&payload("Amapiano Festival"), &EncodeOptions::default()).unwrap();

        assert_eq!(image.size_px(), 256);
        assert!(image.modules() >= 21);
        assert_eq!(&image.png_bytes()[..8], b"\x89PNG\r\n\x1a\n");

        let decoded = image::load_from_memory(image.png_bytes()).unwrap();
        assert_eq!(decoded.width(), 256);
        assert_eq!(decoded.height(), 256);
    }

    #[test]
    fn test_margin_is_light() {
        let image = QrTicketEncoder::render(&payload("Amapiano Festival"), &EncodeOptions::default()).unwrap();
        let gray = image::load_from_memory(image.png_bytes()).unwrap().to_luma8();

        // Corner pixel sits in the one-module margin.
        assert_eq!(gray.get_pixel(0, 0).0, [255]);
        assert_eq!(gray.get_pixel(255, 255).0, [255]);
        // The top-left finder pattern starts right after the margin.
        let module_px = 256 / (image.modules() + 2);
        assert_eq!(gray.get_pixel(module_px + 1, module_px + 1).0, [0]);
    }

    #[test]
    fn test_data_uri_prefix() {
        let image = QrTicketEncoder::render(&payload("Amapiano Festival"), &EncodeOptions::default()).unwrap();
        assert!(image.data_uri().starts_with("data:image/png;base64,iVBORw0KGgo"));
    }

    #[test]
    fn test_oversized_payload_is_symbol_error() {
        let huge = "x".repeat(4000);
        let result = QrTicketEncoder::render(&payload(&huge), &EncodeOptions::default());
        assert!(matches!(result, Err(EncodeError::Symbol(_))));
    }

    #[test]
    fn test_tiny_canvas_is_rejected() {
        let options = EncodeOptions {
            size_px: 16,
            ..EncodeOptions::default()
        };
        let result = QrTicketEncoder::render(&payload("Amapiano Festival"), &options);
        assert!(matches!(result, Err(EncodeError::CanvasTooSmall { size_px: 16, .. })));
    }

    #[test]
    fn test_oversized_canvas_is_rejected_before_allocating() {
        let options = EncodeOptions {
            size_px: 4_000_000_000,
            ..EncodeOptions::default()
        };
        let result = QrTicketEncoder::render(&payload("Amapiano Festival"), &options);
        assert!(matches!(
            result,
            Err(EncodeError::CanvasTooLarge { size_px: 4_000_000_000, max: MAX_SIZE_PX })
        ));
    }

    #[test]
    fn test_canvas_limit() {
        let just_over = EncodeOptions {
            size_px: MAX_SIZE_PX + 1,
            ..EncodeOptions::default()
        };
        assert!(matches!(
            QrTicketEncoder::render(&payload("Amapiano Festival"), &just_over),
            Err(EncodeError::CanvasTooLarge { .. })
        ));

        let within = EncodeOptions {
            size_px: 1024,
            ..EncodeOptions::default()
        };
        assert!(QrTicketEncoder::render(&payload("Amapiano Festival"), &within).is_ok());
    }

    #[tokio::test]
    async fn test_render_panic_becomes_encode_error() {
        let result = render_blocking(|| panic!("rasteriser blew up")).await;
        assert!(matches!(result, Err(EncodeError::Render(_))));
    }

    #[tokio::test]
    async fn test_encode_ticket_absorbs_oversized_canvas() {
        let options = EncodeOptions {
            size_px: 4_000_000_000,
            ..EncodeOptions::default()
        };
        let image = encode_ticket(&QrTicketEncoder, &payload("Amapiano Festival"), &options).await;
        assert!(image.is_none());
    }

    #[test]
    fn test_error_correction_parsing() {
        assert_eq!("h".parse::<ErrorCorrection>(), Ok(ErrorCorrection::High));
        assert_eq!(" Q ".parse::<ErrorCorrection>(), Ok(ErrorCorrection::Quartile));
        assert!("Z".parse::<ErrorCorrection>().is_err());
    }

    #[tokio::test]
    async fn test_encode_ticket_absorbs_failure() {
        let huge = "x".repeat(4000);
        let image = encode_ticket(&QrTicketEncoder, &payload(&huge), &EncodeOptions::default()).await;
        assert!(image.is_none());
    }
}
