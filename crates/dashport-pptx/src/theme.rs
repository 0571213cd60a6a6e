//! Deck colours and fonts

use dashport_ir::resources::StyleDefinitions;

/// Colours as RGB hex without `#`
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
    pub font: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary: "9E1F63".to_string(),
            secondary: "424046".to_string(),
            accent: "005B8C".to_string(),
            font: "Verdana".to_string(),
        }
    }
}

impl Theme {
    /// Take the palette from the document's style registry
    pub fn from_styles(styles: &StyleDefinitions) -> Self {
        let defaults = Self::default();
        Self {
            primary: hex_color(styles.primary()).unwrap_or(defaults.primary),
            secondary: hex_color(styles.secondary()).unwrap_or(defaults.secondary),
            accent: hex_color(styles.accent()).unwrap_or(defaults.accent),
            font: styles.font().to_string(),
        }
    }

    /// Series colours for native charts
    pub fn chart_colors(&self) -> Vec<String> {
        vec![
            self.primary.clone(),
            self.secondary.clone(),
            self.accent.clone(),
            "E05E3D".to_string(),
            "6B7280".to_string(),
            "10B981".to_string(),
        ]
    }
}

/// Convert a CSS colour (`#rgb`, `#rrggbb`, `rgb(r, g, b)`, `rgba(...)`)
/// to upper-case RGB hex
pub fn hex_color(css: &str) -> Option<String> {
    let css = css.trim();
    if let Some(hex) = css.strip_prefix('#') {
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        return match hex.len() {
            6 => Some(hex.to_ascii_uppercase()),
            3 => Some(
                hex.chars()
                    .flat_map(|c| [c, c])
                    .collect::<String>()
                    .to_ascii_uppercase(),
            ),
            _ => None,
        };
    }

    let inner = css
        .strip_prefix("rgba(")
        .or_else(|| css.strip_prefix("rgb("))?
        .strip_suffix(')')?;
    let channels: Vec<u8> = inner
        .split(',')
        .take(3)
        .map(|part| part.trim().parse::<u8>().ok())
        .collect::<Option<_>>()?;
    if channels.len() != 3 {
        return None;
    }
    Some(format!(
        "{:02X}{:02X}{:02X}",
        channels[0], channels[1], channels[2]
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_color() {
        assert_eq!(hex_color("#9e1f63").as_deref(), Some("9E1F63"));
        assert_eq!(hex_color("#abc").as_deref(), Some("AABBCC"));
        assert_eq!(hex_color("rgb(22, 163, 74)").as_deref(), Some("16A34A"));
        assert_eq!(hex_color("rgba(0,0,0,0.1)").as_deref(), Some("000000"));
        assert_eq!(hex_color("teal"), None);
        assert_eq!(hex_color("#12345"), None);
    }

    #[test]
    fn test_theme_from_default_styles() {
        let theme = Theme::from_styles(&StyleDefinitions::default());
        assert_eq!(theme, Theme::default());
        assert_eq!(theme.chart_colors().len(), 6);
        assert_eq!(theme.chart_colors()[3], "E05E3D");
    }
}
