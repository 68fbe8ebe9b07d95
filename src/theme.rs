//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Four-shade handheld palette plus UI roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    /// Playfield and screen background (lightest shade).
    pub bg: Color,
    /// Locked cells, active piece and rocket (darkest shade).
    pub block: Color,
    /// Grid border and launch pad.
    pub border: Color,
    /// Text (score, level).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Exhaust smoke.
    pub smoke: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}

impl Theme {
    /// Green LCD shades: #9BBC0F, #8BAC0F, #306230, #0F380F.
    pub fn classic() -> Self {
        Self {
            bg: Color::Rgb(0x9B, 0xBC, 0x0F),
            block: Color::Rgb(0x0F, 0x38, 0x0F),
            border: Color::Rgb(0x30, 0x62, 0x30),
            main_fg: Color::Rgb(0x0F, 0x38, 0x0F),
            title: Color::Rgb(0x30, 0x62, 0x30),
            smoke: Color::Rgb(0x8B, 0xAC, 0x0F),
        }
    }

    /// Grey pocket-model shades.
    pub fn pocket() -> Self {
        Self {
            bg: Color::Rgb(0xC4, 0xCF, 0xA1),
            block: Color::Rgb(0x1F, 0x1F, 0x1F),
            border: Color::Rgb(0x4D, 0x53, 0x3C),
            main_fg: Color::Rgb(0x1F, 0x1F, 0x1F),
            title: Color::Rgb(0x4D, 0x53, 0x3C),
            smoke: Color::Rgb(0x8B, 0x95, 0x6D),
        }
    }

    pub fn high_contrast() -> Self {
        Self {
            bg: Color::Black,
            block: Color::White,
            border: Color::Yellow,
            main_fg: Color::White,
            title: Color::Yellow,
            smoke: Color::Gray,
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to the palette defaults if path is None or the file is missing;
    /// keys absent from the file keep the palette colour.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let base = Self::for_palette(palette);
        let path = match path {
            Some(p) if p.exists() => p,
            _ => return Ok(base),
        };
        let s = std::fs::read_to_string(path)?;
        let map = parse_theme_file(&s);
        Ok(Self::from_map(&map, base))
    }

    pub fn for_palette(palette: crate::Palette) -> Self {
        match palette {
            crate::Palette::Classic => Self::classic(),
            crate::Palette::Pocket => Self::pocket(),
            crate::Palette::HighContrast => Self::high_contrast(),
        }
    }

    fn from_map(map: &HashMap<String, String>, base: Self) -> Self {
        let get = |key: &str| map.get(key).and_then(|v| parse_hex(v).ok());
        // Own keys first, then the nearest btop key.
        Self {
            bg: get("bg").or_else(|| get("main_bg")).unwrap_or(base.bg),
            block: get("block").or_else(|| get("hi_fg")).unwrap_or(base.block),
            border: get("border").or_else(|| get("div_line")).unwrap_or(base.border),
            main_fg: get("main_fg").unwrap_or(base.main_fg),
            title: get("title").unwrap_or(base.title),
            smoke: get("smoke").or_else(|| get("inactive_fg")).unwrap_or(base.smoke),
        }
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some(end) = stripped.find(']') else {
            continue;
        };
        let key = stripped[..end].trim();
        let rest = stripped[end + 1..].trim();
        if let Some(value) = rest.strip_prefix('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if !value.is_empty() {
                map.insert(key.to_string(), value.to_string());
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    let channel = |digits: &str, scale: u8| {
        u8::from_str_radix(digits, 16)
            .map(|v| v * scale)
            .map_err(|_| invalid())
    };
    let (r, g, b) = match s.len() {
        6 if s.is_ascii() => (channel(&s[0..2], 1)?, channel(&s[2..4], 1)?, channel(&s[4..6], 1)?),
        3 if s.is_ascii() => (channel(&s[0..1], 17)?, channel(&s[1..2], 17)?, channel(&s[2..3], 17)?),
        _ => return Err(invalid()),
    };
    Ok(Color::Rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_6() {
        let c = parse_hex("#9BBC0F").unwrap();
        assert!(matches!(c, Color::Rgb(0x9B, 0xBC, 0x0F)));
    }

    #[test]
    fn test_parse_hex_3() {
        let c = parse_hex("#FFF").unwrap();
        assert!(matches!(c, Color::Rgb(255, 255, 255)));
    }

    #[test]
    fn test_parse_hex_rejects_garbage() {
        assert!(matches!(parse_hex("#12"), Err(ThemeError::InvalidHex(_))));
        assert!(parse_hex("#GGGGGG").is_err());
    }

    #[test]
    fn test_parse_theme_line() {
        let map = parse_theme_file(r##"theme[block]="#0F380F""##);
        assert_eq!(map.get("block"), Some(&"#0F380F".to_string()));
    }

    #[test]
    fn test_map_overrides_palette() {
        let map = parse_theme_file("theme[div_line]='#000000'\n# comment\ntheme[bg]=\"#FFFFFF\"");
        let theme = Theme::from_map(&map, Theme::classic());
        assert_eq!(theme.border, Color::Rgb(0, 0, 0));
        assert_eq!(theme.bg, Color::Rgb(255, 255, 255));
        assert_eq!(theme.block, Theme::classic().block);
    }

    #[test]
    fn test_missing_file_uses_palette() {
        let theme = Theme::load(
            Some(Path::new("/nonexistent/rocketris.theme")),
            crate::Palette::Pocket,
        )
        .unwrap();
        assert_eq!(theme, Theme::pocket());
    }
}
