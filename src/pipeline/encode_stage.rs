use crate::foundation::error::{BoardgifError, BoardgifResult};
use crate::palette::shared::SharedPalette;
use crate::palette::theme::Rgb8;
use crate::pipeline::scratch::StagedArtifact;

/// One decoded frame quantized to the run's [`SharedPalette`]. Never mutated after creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PalettedFrame {
    pub index: usize,
    pub width: u16,
    pub height: u16,
    /// Row-major palette indices, `width * height` long.
    pub indices: Vec<u8>,
}

/// Decode a staged raster and quantize it.
#[tracing::instrument(level = "trace", skip_all, fields(index = artifact.index))]
pub fn encode_frame(
    artifact: &StagedArtifact,
    palette: &SharedPalette,
) -> BoardgifResult<PalettedFrame> {
    let index = artifact.index;
    let img = image::open(&artifact.raster_path)
        .map_err(|e| {
            BoardgifError::encode(
                index,
                format!("decode '{}': {e}", artifact.raster_path.display()),
            )
        })?
        .to_rgba8();

    let (w, h) = img.dimensions();
    let (width, height) = match (u16::try_from(w), u16::try_from(h)) {
        (Ok(w), Ok(h)) if w > 0 && h > 0 => (w, h),
        _ => {
            return Err(BoardgifError::encode(
                index,
                format!("raster size {w}x{h} does not fit a gif frame"),
            ));
        }
    };

    let indices = img
        .pixels()
        .map(|px| palette.nearest_index(over_black(px.0)))
        .collect();

    Ok(PalettedFrame {
        index,
        width,
        height,
        indices,
    })
}

/// Composite a straight-alpha pixel over the paletted canvas' zero color (opaque black).
fn over_black([r, g, b, a]: [u8; 4]) -> Rgb8 {
    if a == 255 {
        return Rgb8::new(r, g, b);
    }
    let mul = |c: u8| ((u16::from(c) * u16::from(a) + 127) / 255) as u8;
    Rgb8::new(mul(r), mul(g), mul(b))
}
