//! Request-facing surface: lenient parameter normalization and error classification.

use serde::{Deserialize, Serialize};

use crate::foundation::core::{Orientation, Speed};
use crate::foundation::error::{BoardgifError, BoardgifResult};
use crate::game::provider::CANONICAL_ID_LEN;
use crate::palette::theme::Theme;
use crate::pipeline::run::RunSettings;

/// Raw request parameters, as they arrive from a query string or JSON body.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationRequest {
    pub id: String,
    pub reversed: Option<String>,
    pub speed: Option<String>,
    pub theme: Option<String>,
}

/// A request after defaults have been applied.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationParams {
    pub game_id: String,
    pub settings: RunSettings,
}

impl AnimationRequest {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Apply the boundary rules.
    ///
    /// Only the id can make a request invalid; every other parameter silently falls back to its
    /// default (`reversed` only for the literal `true`, speed outside `(0, 10]` becomes `1.0`,
    /// unknown themes become brown).
    pub fn normalize(&self) -> BoardgifResult<AnimationParams> {
        let id = self.id.trim();
        if id.chars().count() < CANONICAL_ID_LEN {
            return Err(BoardgifError::validation(format!(
                "game id must have at least {CANONICAL_ID_LEN} characters, example: bR4b8jno"
            )));
        }

        let reversed = self.reversed.as_deref() == Some("true");
        let speed = Speed::or_default(
            self.speed
                .as_deref()
                .and_then(|s| s.trim().parse::<f64>().ok()),
        );
        let theme = self
            .theme
            .as_deref()
            .map(Theme::from_name)
            .unwrap_or_default();

        Ok(AnimationParams {
            game_id: id.to_owned(),
            settings: RunSettings {
                theme,
                speed,
                orientation: Orientation::from_reversed(reversed),
            },
        })
    }
}

/// What the boundary layer should answer when a request fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FailureResponse {
    pub status: u16,
    pub message: String,
}

impl FailureResponse {
    pub fn from_error(err: &BoardgifError) -> Self {
        let status = match err {
            BoardgifError::Validation(_) => 400,
            BoardgifError::GameNotFound(_) => 404,
            BoardgifError::Provider(_) => 502,
            _ => 500,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

/// `Content-Disposition` value for a rendered game.
pub fn attachment_disposition(game_id: &str) -> String {
    format!("attachment; filename=\"{game_id}.gif\"")
}
