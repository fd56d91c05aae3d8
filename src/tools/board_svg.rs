use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context as _, anyhow, bail};

use crate::foundation::core::Orientation;
use crate::game::model::BoardState;
use crate::palette::theme::ThemeColors;
use crate::tools::traits::{Renderer, ToolResult};

/// Built-in renderer drawing an 8x8 board with Unicode piece glyphs.
#[derive(Clone, Copy, Debug)]
pub struct SvgBoardRenderer {
    /// Edge length of one square in SVG user units (= output pixels with the default converter).
    pub square_px: u32,
}

impl Default for SvgBoardRenderer {
    fn default() -> Self {
        Self { square_px: 45 }
    }
}

/// Piece placement indexed `[rank][file]`, rank 0 = rank 8 (top for white), file 0 = a-file.
type Placement = [[Option<char>; 8]; 8];

fn parse_placement(fen: &str) -> anyhow::Result<Placement> {
    let field = fen
        .split_whitespace()
        .next()
        .ok_or_else(|| anyhow!("empty board description"))?;
    let ranks: Vec<&str> = field.split('/').collect();
    if ranks.len() != 8 {
        bail!("expected 8 ranks, found {} in '{field}'", ranks.len());
    }

    let mut out: Placement = [[None; 8]; 8];
    for (r, rank) in ranks.iter().enumerate() {
        let mut file = 0usize;
        for c in rank.chars() {
            if let Some(skip) = c.to_digit(10) {
                file += skip as usize;
            } else if "prnbqkPRNBQK".contains(c) {
                if file < 8 {
                    out[r][file] = Some(c);
                }
                file += 1;
            } else {
                bail!("invalid piece '{c}' in rank {}", 8 - r);
            }
            if file > 8 {
                bail!("rank {} overflows 8 files", 8 - r);
            }
        }
        if file != 8 {
            bail!("rank {} has {file} files, expected 8", 8 - r);
        }
    }
    Ok(out)
}

fn glyph(piece: char) -> char {
    match piece.to_ascii_lowercase() {
        'k' => '\u{265A}',
        'q' => '\u{265B}',
        'r' => '\u{265C}',
        'b' => '\u{265D}',
        'n' => '\u{265E}',
        _ => '\u{265F}',
    }
}

impl SvgBoardRenderer {
    /// Build the SVG document for one position.
    pub fn to_svg(
        &self,
        state: &BoardState,
        orientation: Orientation,
        colors: ThemeColors,
    ) -> anyhow::Result<String> {
        let placement = parse_placement(&state.fen)?;
        let sq = self.square_px.max(1);
        let size = sq * 8;
        let light = colors.light.to_hex();
        let dark = colors.dark.to_hex();

        let mut svg = String::with_capacity(16 * 1024);
        writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{size}" height="{size}" viewBox="0 0 {size} {size}">"#
        )?;
        for (r, row) in placement.iter().enumerate() {
            for (f, piece) in row.iter().enumerate() {
                let (col, line) = match orientation {
                    Orientation::WhiteBottom => (f, r),
                    Orientation::BlackBottom => (7 - f, 7 - r),
                };
                let (x, y) = (col as u32 * sq, line as u32 * sq);
                // a1 (file 0, rank index 7) is a dark square.
                let fill = if (f + (7 - r)) % 2 == 0 { &dark } else { &light };
                writeln!(
                    svg,
                    r#"<rect x="{x}" y="{y}" width="{sq}" height="{sq}" fill="{fill}"/>"#
                )?;

                if let Some(p) = piece {
                    let (fill, stroke) = if p.is_ascii_uppercase() {
                        ("#ffffff", "#000000")
                    } else {
                        ("#000000", "#ffffff")
                    };
                    writeln!(
                        svg,
                        r#"<text x="{cx}" y="{cy}" font-size="{fs}" text-anchor="middle" fill="{fill}" stroke="{stroke}" stroke-width="1">{g}</text>"#,
                        cx = x + sq / 2,
                        cy = y + sq * 4 / 5,
                        fs = sq * 4 / 5,
                        g = glyph(*p),
                    )?;
                }
            }
        }
        svg.push_str("</svg>\n");
        Ok(svg)
    }
}

impl Renderer for SvgBoardRenderer {
    fn render(
        &self,
        state: &BoardState,
        orientation: Orientation,
        colors: ThemeColors,
        dest: &Path,
    ) -> ToolResult {
        let svg = self.to_svg(state, orientation, colors)?;
        std::fs::write(dest, svg)
            .with_context(|| format!("write board svg '{}'", dest.display()))?;
        Ok(())
    }
}
