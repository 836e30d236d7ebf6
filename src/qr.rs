//! Terminal QR code rendering
//!
//! Two module rows share one text line using half block characters, which
//! keeps the code roughly square. Dark modules are drawn as blanks, so the
//! code reads correctly on a dark terminal background.

use qrcode::{Color, EcLevel, QrCode};

/// Quiet zone around the code, in modules
const MARGIN: usize = 3;

const FULL: char = '\u{2588}';
const UPPER_HALF: char = '\u{2580}';
const LOWER_HALF: char = '\u{2584}';

/// Renders text as a QR code for the terminal
pub trait QrRenderer {
    /// Lines to print, or `None` when the text cannot be encoded
    fn render(&self, data: &str) -> Option<Vec<String>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalQr;

impl QrRenderer for TerminalQr {
    fn render(&self, data: &str) -> Option<Vec<String>> {
        match QrCode::with_error_correction_level(data.as_bytes(), EcLevel::L) {
            Ok(code) => {
                let width = code.width();
                Some(render_modules(width, |x, y| code[(x, y)] == Color::Dark))
            }
            Err(e) => {
                crate::logger::log_warning(&format!("Unable to encode QR code: {e}"));
                None
            }
        }
    }
}

/// Draw a `width` x `width` module grid with a quiet zone
fn render_modules(width: usize, dark: impl Fn(usize, usize) -> bool) -> Vec<String> {
    let margin_line: String = std::iter::repeat(FULL).take(width + 2 * MARGIN).collect();
    let side: String = std::iter::repeat(FULL).take(MARGIN).collect();

    let mut lines = Vec::new();
    lines.extend(std::iter::repeat(margin_line.clone()).take((MARGIN + 1) / 2));

    for y in (0..width).step_by(2) {
        let mut line = side.clone();
        for x in 0..width {
            let top = dark(x, y);
            let bottom = y + 1 < width && dark(x, y + 1);
            line.push(match (top, bottom) {
                (true, true) => ' ',
                (true, false) => LOWER_HALF,
                (false, true) => UPPER_HALF,
                (false, false) => FULL,
            });
        }
        line.push_str(&side);
        lines.push(line);
    }

    // An odd width already leaves a blank half line at the bottom
    lines.extend(std::iter::repeat(margin_line).take((MARGIN + 1 - width % 2) / 2));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_url() {
        let lines = TerminalQr.render("http://192.168.1.5:8080/").unwrap();
        // Version 2 code: 25 modules wide
        let width = 25 + 2 * MARGIN;
        assert!(lines.iter().all(|l| l.chars().count() == width));
        assert_eq!(lines.len(), 2 + 13 + 1);
        assert!(lines[0].chars().all(|c| c == FULL));
    }

    #[test]
    fn test_half_blocks() {
        // 2x2 grid: top-left dark, bottom-right dark
        let lines = render_modules(2, |x, y| x == y);
        let body: Vec<char> = lines[2].chars().collect();
        assert_eq!(body[MARGIN], LOWER_HALF);
        assert_eq!(body[MARGIN + 1], UPPER_HALF);
        assert_eq!(lines.len(), 2 + 1 + 2);
    }

    #[test]
    fn test_all_dark_pair_is_blank() {
        let lines = render_modules(2, |_, _| true);
        assert_eq!(lines[2], format!("{FULL}{FULL}{FULL}  {FULL}{FULL}{FULL}"));
    }
}
