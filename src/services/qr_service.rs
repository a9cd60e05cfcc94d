//! QR image rendering. The actual drawing is delegated to the
//! `qrcode` crate; this service only decides what goes into the code
//! (the public short URL) and how big the image is.

use std::sync::Arc;

use qrcode::{render::svg, QrCode};

use crate::{
    config::Config,
    error::{AppError, Result, ResultExt},
};

/// Minimum edge length of the rendered SVG, in pixels. Large enough to
/// scan from a printed flyer.
const MIN_DIMENSIONS: u32 = 240;

#[derive(Debug, Clone)]
pub struct QrService {
    config: Arc<Config>,
}

impl QrService {
    #[must_use]
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Render the QR image for a short code as an SVG document.
    ///
    /// The QR encodes the short URL, not the destination, so scans go
    /// through the redirect handler and are counted like any other
    /// click.
    pub fn render_svg(&self, code: &str) -> Result<String> {
        let short_url = self.config.short_url(code);

        let qr = QrCode::new(short_url.as_bytes())
            .map_app_err(|e| AppError::Qr(e.to_string()))?;

        Ok(qr
            .render::<svg::Color>()
            .min_dimensions(MIN_DIMENSIONS, MIN_DIMENSIONS)
            .build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;

    fn service() -> QrService {
        QrService::new(Arc::new(
            ConfigBuilder::new().base_url("https://sl.example").build(),
        ))
    }

    #[test]
    fn renders_svg_document() {
        let svg = service().render_svg("aZ3kq1").unwrap();

        assert!(svg.contains("<svg"));
        assert!(svg.contains("</svg>"));
    }

    #[test]
    fn different_codes_render_differently() {
        let service = service();

        let a = service.render_svg("aZ3kq1").unwrap();
        let b = service.render_svg("bY4lr2").unwrap();
        assert_ne!(a, b);
    }
}
