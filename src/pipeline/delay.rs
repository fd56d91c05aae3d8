use crate::foundation::core::{FrameDelay, Speed};

/// Hold on the final position, long enough to read the result.
pub const FINAL_FRAME_CENTIS: u16 = 450;
/// Opening moves.
pub const OPENING_FRAME_CENTIS: u16 = 50;
pub const NORMAL_FRAME_CENTIS: u16 = 120;
/// Number of leading frames paced as opening moves.
pub const OPENING_FRAMES: usize = 10;
pub const MIN_FRAME_CENTIS: u16 = 5;

/// Display duration of frame `index` out of `total`, scaled by `speed`.
pub fn delay(index: usize, total: usize, speed: Speed) -> FrameDelay {
    let base = if index + 1 == total {
        FINAL_FRAME_CENTIS
    } else if index < OPENING_FRAMES {
        OPENING_FRAME_CENTIS
    } else {
        NORMAL_FRAME_CENTIS
    };
    let adjusted = (f64::from(base) / speed.get()).floor();
    // `speed` is bounded below only by zero, so very small values saturate.
    let centis = if adjusted >= f64::from(u16::MAX) {
        u16::MAX
    } else {
        adjusted as u16
    };
    FrameDelay(centis.max(MIN_FRAME_CENTIS))
}

/// Delays for every frame of a `total`-frame sequence.
pub fn schedule(total: usize, speed: Speed) -> Vec<FrameDelay> {
    (0..total).map(|i| delay(i, total, speed)).collect()
}
