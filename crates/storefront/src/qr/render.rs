//! SVG rendering of QR payloads.

use qrcode::render::svg;
use qrcode::{EcLevel, QrCode};

use super::QrError;

/// Default edge length in pixels.
pub const DEFAULT_SIZE: u32 = 100;

const DARK: &str = "#8B4513";
const LIGHT: &str = "#FFFFFF";

/// Render a payload as an SVG QR image at least `size` pixels square.
///
/// Uses error-correction level M.
///
/// # Errors
///
/// Returns `QrError::Render` if the payload does not fit in a QR code.
pub fn render_svg(payload: &str, size: u32) -> Result<String, QrError> {
    let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::M)
        .map_err(|e| QrError::Render(e.to_string()))?;

    Ok(code
        .render::<svg::Color<'_>>()
        .min_dimensions(size, size)
        .dark_color(svg::Color(DARK))
        .light_color(svg::Color(LIGHT))
        .build())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cafe_core::ProductId;

    use super::*;
    use crate::qr::encode;

    #[test]
    fn test_renders_brown_svg() {
        let svg = render_svg(&encode(&ProductId::new("p1"), "Latte"), DEFAULT_SIZE).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains(DARK));
    }

    #[test]
    fn test_oversized_payload_fails() {
        let payload = "x".repeat(8_000);
        assert!(matches!(
            render_svg(&payload, DEFAULT_SIZE),
            Err(QrError::Render(_))
        ));
    }
}
