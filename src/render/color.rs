use ratatui::style::Color;
use serde::{Deserialize, Serialize};

/// An 8-bit-per-channel color with no alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Reduces a sample channel to 8 bits.
///
/// Wider integer channels keep their high byte; float channels are treated as
/// normalized `[0.0, 1.0]` values.
pub trait Channel: Copy {
    fn to_u8(self) -> u8;
}

impl Channel for u8 {
    fn to_u8(self) -> u8 {
        self
    }
}

impl Channel for u16 {
    fn to_u8(self) -> u8 {
        (self >> 8) as u8
    }
}

impl Channel for f32 {
    fn to_u8(self) -> u8 {
        (self.clamp(0.0, 1.0) * 255.0).round() as u8
    }
}

/// How RGB cells are written to the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Auto,
    TrueColor,
    Ansi256,
}

impl ColorMode {
    /// Replaces `Auto` with whatever the current terminal advertises.
    pub fn resolve(self) -> ColorMode {
        match self {
            ColorMode::Auto if supports_truecolor() => ColorMode::TrueColor,
            ColorMode::Auto => ColorMode::Ansi256,
            mode => mode,
        }
    }

    pub fn to_color(self, rgb: Rgb) -> Color {
        match self {
            ColorMode::Ansi256 => Color::Indexed(rgb_to_ansi256(rgb)),
            ColorMode::Auto | ColorMode::TrueColor => Color::Rgb(rgb.r, rgb.g, rgb.b),
        }
    }
}

pub fn supports_truecolor() -> bool {
    supports_truecolor_from_env(
        std::env::var("COLORTERM").ok().as_deref(),
        std::env::var("TERM").ok().as_deref(),
    )
}

fn supports_truecolor_from_env(colorterm: Option<&str>, term: Option<&str>) -> bool {
    if let Some(ct) = colorterm {
        let lower = ct.to_ascii_lowercase();
        if lower.contains("truecolor") || lower.contains("24bit") {
            return true;
        }
    }
    if let Some(t) = term {
        let lower = t.to_ascii_lowercase();
        if lower.contains("direct") || lower.contains("truecolor") {
            return true;
        }
    }
    false
}

/// Maps a color onto the xterm 6x6x6 color cube (indices 16..=231).
pub fn rgb_to_ansi256(rgb: Rgb) -> u8 {
    let to_cube = |v: u8| ((v as u16 * 5) / 255) as u8;
    16 + 36 * to_cube(rgb.r) + 6 * to_cube(rgb.g) + to_cube(rgb.b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_reduction_takes_high_byte() {
        assert_eq!(0xABCDu16.to_u8(), 0xAB);
        assert_eq!(0x00FFu16.to_u8(), 0x00);
        assert_eq!(200u8.to_u8(), 200);
        assert_eq!(1.0f32.to_u8(), 255);
        assert_eq!((-3.0f32).to_u8(), 0);
    }

    #[test]
    fn test_truecolor_detection() {
        assert!(supports_truecolor_from_env(Some("truecolor"), Some("xterm-256color")));
        assert!(supports_truecolor_from_env(Some("24BIT"), None));
        assert!(supports_truecolor_from_env(None, Some("xterm-direct")));
        assert!(!supports_truecolor_from_env(None, Some("xterm-256color")));
        assert!(!supports_truecolor_from_env(None, None));
    }

    #[test]
    fn test_ansi256_cube_corners() {
        assert_eq!(rgb_to_ansi256(Rgb::new(0, 0, 0)), 16);
        assert_eq!(rgb_to_ansi256(Rgb::new(255, 255, 255)), 231);
        assert_eq!(rgb_to_ansi256(Rgb::new(255, 0, 0)), 196);
    }

    #[test]
    fn test_explicit_modes_are_not_rewritten() {
        assert_eq!(ColorMode::TrueColor.resolve(), ColorMode::TrueColor);
        assert_eq!(ColorMode::Ansi256.resolve(), ColorMode::Ansi256);
        assert_ne!(ColorMode::Auto.resolve(), ColorMode::Auto);
    }

    #[test]
    fn test_to_color() {
        let rgb = Rgb::new(1, 2, 3);
        assert_eq!(ColorMode::TrueColor.to_color(rgb), Color::Rgb(1, 2, 3));
        assert_eq!(ColorMode::Ansi256.to_color(rgb), Color::Indexed(16));
    }
}
