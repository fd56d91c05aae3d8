use std::sync::atomic::{AtomicU64, Ordering};

use crate::foundation::error::{BoardgifError, BoardgifResult};

/// Identifier namespacing one pipeline run's scratch files.
///
/// Only ASCII alphanumerics, `-` and `_` are allowed so the id can be embedded in file names.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RunId(String);

static RUN_SEQ: AtomicU64 = AtomicU64::new(0);

impl RunId {
    /// Create a run id from an explicit string.
    pub fn new(id: impl Into<String>) -> BoardgifResult<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(BoardgifError::validation("run id must be non-empty"));
        }
        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(BoardgifError::validation(format!(
                "run id '{id}' may only contain [A-Za-z0-9_-]"
            )));
        }
        Ok(Self(id))
    }

    /// Generate a process-unique run id derived from `label` (usually the game id).
    ///
    /// Two runs for the same game never share an id, even when they overlap in time.
    pub fn generate(label: &str) -> Self {
        let mut base: String = label
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .take(32)
            .collect();
        if base.is_empty() {
            base.push_str("run");
        }
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let seq = RUN_SEQ.fetch_add(1, Ordering::Relaxed);
        Self(format!("{base}-{}-{nanos}-{seq}", std::process::id()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which side of the board is drawn at the bottom.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    WhiteBottom,
    BlackBottom,
}

impl Orientation {
    pub fn from_reversed(reversed: bool) -> Self {
        if reversed {
            Self::BlackBottom
        } else {
            Self::WhiteBottom
        }
    }

    pub fn is_reversed(self) -> bool {
        self == Self::BlackBottom
    }
}

/// Playback speed multiplier, validated to lie in `(0, 10]`.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, serde::Serialize)]
pub struct Speed(f64);

impl Speed {
    pub const MAX: f64 = 10.0;
    pub const DEFAULT: Speed = Speed(1.0);

    pub fn new(v: f64) -> BoardgifResult<Self> {
        if !v.is_finite() || v <= 0.0 || v > Self::MAX {
            return Err(BoardgifError::validation(format!(
                "speed must be in (0, {}], got {v}",
                Self::MAX
            )));
        }
        Ok(Self(v))
    }

    /// Lenient constructor used at the request boundary: anything invalid becomes `1.0`.
    pub fn or_default(v: Option<f64>) -> Self {
        v.and_then(|v| Self::new(v).ok()).unwrap_or(Self::DEFAULT)
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

impl Default for Speed {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Per-frame display duration in hundredths of a second.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameDelay(pub u16);

impl FrameDelay {
    pub fn centis(self) -> u16 {
        self.0
    }
}
