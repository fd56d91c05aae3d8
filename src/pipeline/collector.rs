use std::sync::{Mutex, PoisonError};

use crate::exec::latch::FirstFailure;
use crate::foundation::error::{BoardgifError, BoardgifResult};
use crate::pipeline::encode_stage::PalettedFrame;

/// Fixed-size arena of encode results keyed by sequence index.
///
/// Jobs call [`deliver`](Self::deliver) before returning, so a slot is written before the job's
/// executor permit is released. Once the encode phase has drained, [`finish`](Self::finish)
/// sees every result.
#[derive(Debug)]
pub struct OrderedCollector {
    slots: Mutex<Vec<Option<PalettedFrame>>>,
    failure: FirstFailure,
}

impl OrderedCollector {
    pub fn new(len: usize) -> Self {
        Self {
            slots: Mutex::new(vec![None; len]),
            failure: FirstFailure::new(),
        }
    }

    /// Store one job's result. Successful frames arriving after a failure are discarded.
    pub fn deliver(&self, index: usize, result: BoardgifResult<PalettedFrame>) {
        let frame = match result {
            Ok(frame) => frame,
            Err(err) => {
                self.failure.record(err);
                return;
            }
        };
        if self.failure.is_tripped() {
            return;
        }
        if frame.index != index {
            self.failure.record(BoardgifError::encode(
                index,
                format!("job produced frame for index {}", frame.index),
            ));
            return;
        }

        let rejected = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            let len = slots.len();
            match slots.get_mut(index) {
                Some(slot) if slot.is_none() => {
                    *slot = Some(frame);
                    None
                }
                Some(_) => Some("frame delivered twice".to_owned()),
                None => Some(format!("index out of range for {len} frames")),
            }
        };
        if let Some(msg) = rejected {
            self.failure.record(BoardgifError::encode(index, msg));
        }
    }

    /// Record a failure that did not come from an encode job (e.g. a rejected submission).
    pub fn fail(&self, err: BoardgifError) {
        self.failure.record(err);
    }

    pub fn has_failed(&self) -> bool {
        self.failure.is_tripped()
    }

    pub fn delivered(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|s| s.is_some())
            .count()
    }

    /// Frames in sequence order, or the first recorded error.
    ///
    /// Call only after the encode phase has drained. A slot nobody filled is reported as an
    /// error rather than assembled around.
    pub fn finish(&self) -> BoardgifResult<Vec<PalettedFrame>> {
        if let Some(err) = self.failure.take() {
            return Err(err);
        }
        if self.failure.is_tripped() {
            return Err(BoardgifError::assembly("encode phase already failed"));
        }

        let slots = std::mem::take(&mut *self.slots.lock().unwrap_or_else(PoisonError::into_inner));
        let mut frames = Vec::with_capacity(slots.len());
        for (i, slot) in slots.into_iter().enumerate() {
            match slot {
                Some(frame) => frames.push(frame),
                None => {
                    return Err(BoardgifError::encode(i, "no frame delivered"));
                }
            }
        }
        Ok(frames)
    }
}
