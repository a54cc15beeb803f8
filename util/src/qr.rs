//! QR artifact rendering.
//!
//! The scannable payload string is owned by the session model; this module
//! only turns it into a displayable image. Artifacts are cosmetic and can be
//! regenerated at any time, so failures here are logged and swallowed rather
//! than failing the request that produced the session.

use std::fs;
use std::path::PathBuf;

use qrcode::QrCode;
use qrcode::render::svg;
use qrcode::types::QrError;

use crate::config;

/// Renders a payload into an SVG document.
pub fn render_svg(payload: &str) -> Result<String, QrError> {
    let code = QrCode::new(payload.as_bytes())?;
    Ok(code
        .render::<svg::Color>()
        .min_dimensions(240, 240)
        .build())
}

/// Renders and writes an artifact under `QR_STORAGE_ROOT`.
///
/// Returns the written path, or `None` if rendering or writing failed.
pub fn save_artifact(payload: &str, file_stem: &str) -> Option<PathBuf> {
    let svg = match render_svg(payload) {
        Ok(svg) => svg,
        Err(e) => {
            tracing::warn!(error = ?e, "Failed to render QR artifact");
            return None;
        }
    };

    let root = PathBuf::from(config::qr_storage_root());
    if let Err(e) = fs::create_dir_all(&root) {
        tracing::warn!(error = %e, "Failed to create QR storage directory");
        return None;
    }

    let path = root.join(format!("{file_stem}.svg"));
    match fs::write(&path, svg) {
        Ok(()) => Some(path),
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "Failed to write QR artifact");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_payload_to_svg() {
        let svg = render_svg("3f2a1c9e|2026-03-01T10:00:00+00:00").unwrap();
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn save_writes_under_storage_root() {
        let tmp = tempfile::tempdir().unwrap();
        crate::config::AppConfig::set_qr_storage_root(tmp.path().to_string_lossy().to_string());

        let path = save_artifact("abc|2026-03-01T10:00:00+00:00", "qr_class_7").unwrap();
        assert!(path.exists());
        assert_eq!(path.extension().unwrap(), "svg");
    }
}
