use std::fmt;

/// 24-bit RGB color used for fills, strokes and text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a strict `#RRGGBB` hex string. Anything else is rejected.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let r = u8::from_str_radix(&digits[0..2], 16).ok()?;
        let g = u8::from_str_radix(&digits[2..4], 16).ok()?;
        let b = u8::from_str_radix(&digits[4..6], 16).ok()?;
        Some(Self { r, g, b })
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::Color;

    #[test]
    fn parses_full_hex() {
        assert_eq!(Color::from_hex("#2C2C2C"), Some(Color::rgb(44, 44, 44)));
        assert_eq!(Color::from_hex("#ff0000"), Some(Color::rgb(255, 0, 0)));
        assert_eq!(Color::from_hex("#1E4C7C"), Some(Color::rgb(30, 76, 124)));
    }

    #[test]
    fn rejects_malformed_hex() {
        assert_eq!(Color::from_hex("2C2C2C"), None);
        assert_eq!(Color::from_hex("#2C2C"), None);
        assert_eq!(Color::from_hex("#2C2C2C2C"), None);
        assert_eq!(Color::from_hex("#ZZZZZZ"), None);
        assert_eq!(Color::from_hex("#12 456"), None);
        assert_eq!(Color::from_hex(""), None);
    }

    #[test]
    fn hex_roundtrip_is_identity() {
        for hex in ["#000000", "#FFFFFF", "#1C1C1C", "#A0B1C2"] {
            let color = Color::from_hex(hex).unwrap();
            assert_eq!(color.to_hex(), hex);
        }
    }

    #[test]
    fn display_matches_to_hex() {
        let color = Color::rgb(64, 64, 64);
        assert_eq!(color.to_string(), "#404040");
    }
}
