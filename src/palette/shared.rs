use crate::palette::theme::{Rgb8, ThemeColors};

/// Number of entries in the web-safe color cube.
pub const WEB_SAFE_LEN: usize = 216;

const WEB_SAFE_STEP: u8 = 0x33;

/// Read-only color table shared by every encode job of one run.
///
/// Layout: the 216-entry web-safe cube (blue varies fastest), followed by the theme's light and
/// dark square colors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SharedPalette {
    colors: Vec<Rgb8>,
    theme: ThemeColors,
}

impl SharedPalette {
    pub fn new(theme: ThemeColors) -> Self {
        let mut colors = Vec::with_capacity(WEB_SAFE_LEN + 2);
        for r in 0..6u8 {
            for g in 0..6u8 {
                for b in 0..6u8 {
                    colors.push(Rgb8::new(
                        r * WEB_SAFE_STEP,
                        g * WEB_SAFE_STEP,
                        b * WEB_SAFE_STEP,
                    ));
                }
            }
        }
        colors.push(theme.light);
        colors.push(theme.dark);
        Self { colors, theme }
    }

    pub fn colors(&self) -> &[Rgb8] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn theme(&self) -> ThemeColors {
        self.theme
    }

    /// Flat `rgbrgb...` table for GIF color maps.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        self.colors.iter().flat_map(|c| [c.r, c.g, c.b]).collect()
    }

    /// Index of the closest palette entry (squared Euclidean distance, first entry wins ties).
    pub fn nearest_index(&self, c: Rgb8) -> u8 {
        // The cube is a separable grid, so rounding each channel finds its closest entry.
        let q = |v: u8| (u16::from(v) + 25) / u16::from(WEB_SAFE_STEP);
        let (qr, qg, qb) = (q(c.r), q(c.g), q(c.b));
        let mut best = (qr * 36 + qg * 6 + qb) as usize;
        let mut best_dist = dist2(c, self.colors[best]);

        for (i, &candidate) in self.colors.iter().enumerate().skip(WEB_SAFE_LEN) {
            let d = dist2(c, candidate);
            if d < best_dist {
                best = i;
                best_dist = d;
            }
        }
        best as u8
    }
}

fn dist2(a: Rgb8, b: Rgb8) -> u32 {
    let d = |x: u8, y: u8| {
        let v = i32::from(x) - i32::from(y);
        (v * v) as u32
    };
    d(a.r, b.r) + d(a.g, b.g) + d(a.b, b.b)
}
