use std::borrow::Cow;
use std::io::Write;

use crate::foundation::core::FrameDelay;
use crate::foundation::error::{BoardgifError, BoardgifResult};
use crate::palette::shared::SharedPalette;
use crate::pipeline::encode_stage::PalettedFrame;

/// Encode ordered frames into one GIF and write it to `out`.
///
/// The whole stream is built in memory first and written with a single `write_all`, so a
/// failure before that point leaves the sink untouched. Returns the number of bytes written.
#[tracing::instrument(level = "debug", skip_all, fields(frames = frames.len()))]
pub fn assemble<W: Write + ?Sized>(
    frames: &[PalettedFrame],
    delays: &[FrameDelay],
    palette: &SharedPalette,
    out: &mut W,
) -> BoardgifResult<u64> {
    if frames.is_empty() {
        return Err(BoardgifError::assembly("no frames to assemble"));
    }
    if frames.len() != delays.len() {
        return Err(BoardgifError::assembly(format!(
            "{} frames but {} delays",
            frames.len(),
            delays.len()
        )));
    }
    if let Some((i, f)) = frames.iter().enumerate().find(|(i, f)| f.index != *i) {
        return Err(BoardgifError::assembly(format!(
            "frame at position {i} has index {}",
            f.index
        )));
    }
    for f in frames {
        if f.indices.len() != usize::from(f.width) * usize::from(f.height) {
            return Err(BoardgifError::assembly(format!(
                "frame {} has {} pixels, expected {}x{}",
                f.index,
                f.indices.len(),
                f.width,
                f.height
            )));
        }
        if let Some(&bad) = f.indices.iter().find(|&&p| usize::from(p) >= palette.len()) {
            return Err(BoardgifError::assembly(format!(
                "frame {} uses palette index {bad} outside a {}-entry palette",
                f.index,
                palette.len()
            )));
        }
    }

    let width = frames.iter().map(|f| f.width).max().unwrap_or(1);
    let height = frames.iter().map(|f| f.height).max().unwrap_or(1);

    let encoded = encode_gif(frames, delays, palette, width, height)
        .map_err(|e| BoardgifError::assembly(format!("gif encode: {e}")))?;

    out.write_all(&encoded)
        .and_then(|()| out.flush())
        .map_err(|e| BoardgifError::assembly(format!("write output: {e}")))?;

    tracing::debug!(bytes = encoded.len(), width, height, "animation assembled");
    Ok(encoded.len() as u64)
}

fn encode_gif(
    frames: &[PalettedFrame],
    delays: &[FrameDelay],
    palette: &SharedPalette,
    width: u16,
    height: u16,
) -> Result<Vec<u8>, gif::EncodingError> {
    let mut buf = Vec::new();
    {
        let mut enc = gif::Encoder::new(&mut buf, width, height, &palette.to_rgb_bytes())?;
        if frames.len() > 1 {
            enc.set_repeat(gif::Repeat::Infinite)?;
        }
        for (f, d) in frames.iter().zip(delays) {
            let frame = gif::Frame {
                width: f.width,
                height: f.height,
                delay: d.centis(),
                buffer: Cow::Borrowed(&f.indices),
                ..gif::Frame::default()
            };
            enc.write_frame(&frame)?;
        }
        enc.into_inner()?;
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::theme::Theme;

    fn frame(index: usize, color: u8) -> PalettedFrame {
        PalettedFrame {
            index,
            width: 2,
            height: 2,
            indices: vec![color; 4],
        }
    }

    fn decode(bytes: &[u8]) -> Vec<(u16, Vec<u8>)> {
        let mut opts = gif::DecodeOptions::new();
        opts.set_color_output(gif::ColorOutput::Indexed);
        let mut dec = opts.read_info(bytes).unwrap();
        let mut out = Vec::new();
        while let Some(f) = dec.read_next_frame().unwrap() {
            out.push((f.delay, f.buffer.to_vec()));
        }
        out
    }

    #[test]
    fn writes_frames_in_order_with_delays() {
        let palette = SharedPalette::new(Theme::Purple.colors());
        let frames = vec![frame(0, 3), frame(1, 216), frame(2, 217)];
        let delays = vec![FrameDelay(50), FrameDelay(120), FrameDelay(450)];
        let mut out = Vec::new();

        let n = assemble(&frames, &delays, &palette, &mut out).unwrap();
        assert_eq!(n as usize, out.len());
        assert!(out.starts_with(b"GIF89a"));

        let decoded = decode(&out);
        assert_eq!(decoded.len(), 3);
        assert_eq!(decoded[0], (50, vec![3; 4]));
        assert_eq!(decoded[1], (120, vec![216; 4]));
        assert_eq!(decoded[2], (450, vec![217; 4]));
    }

    #[test]
    fn rejects_misaligned_input_without_writing() {
        let palette = SharedPalette::new(Theme::Brown.colors());
        let mut out = Vec::new();

        assert!(assemble(&[], &[], &palette, &mut out).is_err());
        assert!(assemble(&[frame(0, 0)], &[], &palette, &mut out).is_err());
        assert!(
            assemble(
                &[frame(1, 0), frame(0, 0)],
                &[FrameDelay(5), FrameDelay(5)],
                &palette,
                &mut out
            )
            .is_err()
        );
        let mut short = frame(0, 0);
        short.indices.pop();
        assert!(assemble(&[short], &[FrameDelay(5)], &palette, &mut out).is_err());
        assert!(assemble(&[frame(0, 250)], &[FrameDelay(5)], &palette, &mut out).is_err());
        assert!(out.is_empty());
    }

    #[test]
    fn sink_failure_is_assembly_error() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("pipe closed"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }
        let palette = SharedPalette::new(Theme::Brown.colors());
        let err = assemble(&[frame(0, 1)], &[FrameDelay(450)], &palette, &mut Broken).unwrap_err();
        assert!(err.to_string().starts_with("assembly error:"));
    }
}
