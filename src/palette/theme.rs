use serde::{Deserialize, Serialize};

/// Opaque 8-bit sRGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `#rrggbb`, as used in SVG fill attributes.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Named board theme.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Brown,
    Blue,
    Green,
    Purple,
}

/// Square colors for one theme.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThemeColors {
    pub dark: Rgb8,
    pub light: Rgb8,
}

impl Theme {
    pub const ALL: [Theme; 4] = [Theme::Brown, Theme::Blue, Theme::Green, Theme::Purple];

    /// Resolve a theme by name. Unknown names fall back to [`Theme::Brown`].
    pub fn from_name(name: &str) -> Self {
        Self::lookup(name).unwrap_or_default()
    }

    /// Strict lookup; `None` for unknown names.
    pub fn lookup(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(name.trim()))
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Brown => "brown",
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Purple => "purple",
        }
    }

    pub fn colors(self) -> ThemeColors {
        let (dark, light) = match self {
            Self::Brown => (Rgb8::new(181, 136, 99), Rgb8::new(240, 217, 181)),
            Self::Blue => (Rgb8::new(70, 130, 180), Rgb8::new(173, 216, 230)),
            Self::Green => (Rgb8::new(119, 149, 86), Rgb8::new(235, 236, 208)),
            Self::Purple => (Rgb8::new(128, 70, 153), Rgb8::new(218, 185, 234)),
        };
        ThemeColors { dark, light }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
