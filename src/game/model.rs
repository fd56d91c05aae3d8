use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::foundation::error::{BoardgifError, BoardgifResult};

/// One board position, described in Forsyth-Edwards notation.
///
/// The pipeline never looks inside; only the renderer interprets it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoardState {
    pub fen: String,
}

impl BoardState {
    pub fn new(fen: impl Into<String>) -> Self {
        Self { fen: fen.into() }
    }

    /// The standard initial position.
    pub fn initial() -> Self {
        Self::new("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1")
    }
}

/// Final result of a recorded game.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    #[serde(rename = "1-0")]
    WhiteWon,
    #[serde(rename = "0-1")]
    BlackWon,
    #[serde(rename = "1/2-1/2")]
    Draw,
    #[default]
    #[serde(rename = "*")]
    NoOutcome,
}

impl Outcome {
    pub fn label(self) -> &'static str {
        match self {
            Self::WhiteWon => "1-0",
            Self::BlackWon => "0-1",
            Self::Draw => "1/2-1/2",
            Self::NoOutcome => "*",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Display identity of one side.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Player {
    pub name: Option<String>,
    pub elo: Option<String>,
}

impl Player {
    /// `"Name (Elo)"`, `"Name"`, or `"unknown"`.
    pub fn label(&self) -> String {
        match (self.name.as_deref(), self.elo.as_deref()) {
            (Some(name), Some(elo)) => format!("{name} ({elo})"),
            (Some(name), None) => name.to_owned(),
            _ => "unknown".to_owned(),
        }
    }
}

/// A recorded game: its ordered positions plus metadata.
///
/// Positions are immutable once obtained and always non-empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GameDef", into = "GameDef")]
pub struct Game {
    id: String,
    positions: Vec<BoardState>,
    tags: BTreeMap<String, String>,
    outcome: Outcome,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct GameDef {
    id: String,
    positions: Vec<BoardState>,
    #[serde(default)]
    tags: BTreeMap<String, String>,
    #[serde(default)]
    outcome: Outcome,
}

impl TryFrom<GameDef> for Game {
    type Error = BoardgifError;

    fn try_from(def: GameDef) -> BoardgifResult<Self> {
        Game::new(def.id, def.positions, def.tags, def.outcome)
    }
}

impl From<Game> for GameDef {
    fn from(g: Game) -> Self {
        Self {
            id: g.id,
            positions: g.positions,
            tags: g.tags,
            outcome: g.outcome,
        }
    }
}

impl Game {
    pub fn new(
        id: impl Into<String>,
        positions: Vec<BoardState>,
        tags: BTreeMap<String, String>,
        outcome: Outcome,
    ) -> BoardgifResult<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(BoardgifError::validation("game id must be non-empty"));
        }
        if positions.is_empty() {
            return Err(BoardgifError::validation(format!(
                "game '{id}' has no positions"
            )));
        }
        Ok(Self {
            id,
            positions,
            tags,
            outcome,
        })
    }

    /// Canonical game id.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn positions(&self) -> &[BoardState] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Case-insensitive tag lookup.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.is_empty())
    }

    pub fn white(&self) -> Player {
        self.player("White", "WhiteElo")
    }

    pub fn black(&self) -> Player {
        self.player("Black", "BlackElo")
    }

    fn player(&self, name_key: &str, elo_key: &str) -> Player {
        Player {
            name: self.tag(name_key).map(str::to_owned),
            elo: self.tag(elo_key).map(str::to_owned),
        }
    }
}
