use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::foundation::error::{BoardgifError, BoardgifResult};
use crate::game::model::Game;

/// Length of a canonical game id. Longer ids carry a player suffix that is dropped on lookup.
pub const CANONICAL_ID_LEN: usize = 8;

/// Source of recorded games.
///
/// `fetch` returns [`BoardgifError::GameNotFound`] for unknown ids and
/// [`BoardgifError::Provider`] for every other failure to obtain the game.
pub trait GameProvider: Send + Sync {
    fn fetch(&self, id: &str) -> BoardgifResult<Game>;
}

/// Provider backed by a directory of `<id>.json` game records.
#[derive(Clone, Debug)]
pub struct JsonGameProvider {
    root: PathBuf,
}

impl JsonGameProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn candidates(id: &str) -> Vec<&str> {
        let mut out = vec![id];
        if id.len() > CANONICAL_ID_LEN && id.is_char_boundary(CANONICAL_ID_LEN) {
            out.push(&id[..CANONICAL_ID_LEN]);
        }
        out
    }

    fn read(&self, path: &Path) -> BoardgifResult<Option<Game>> {
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(BoardgifError::provider(format!(
                    "read '{}': {e}",
                    path.display()
                )));
            }
        };
        let game: Game = serde_json::from_slice(&bytes).map_err(|e| {
            BoardgifError::provider(format!("parse game '{}': {e}", path.display()))
        })?;
        Ok(Some(game))
    }
}

impl GameProvider for JsonGameProvider {
    fn fetch(&self, id: &str) -> BoardgifResult<Game> {
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(BoardgifError::not_found(id));
        }
        for candidate in Self::candidates(id) {
            let path = self.root.join(format!("{candidate}.json"));
            if let Some(game) = self.read(&path)? {
                tracing::debug!(requested = id, canonical = game.id(), "loaded game");
                return Ok(game);
            }
        }
        Err(BoardgifError::not_found(id))
    }
}

/// Provider holding games in memory, keyed by canonical id.
#[derive(Clone, Debug, Default)]
pub struct InMemoryProvider {
    games: HashMap<String, Game>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, game: Game) {
        self.games.insert(game.id().to_owned(), game);
    }

    pub fn with_game(mut self, game: Game) -> Self {
        self.insert(game);
        self
    }
}

impl GameProvider for InMemoryProvider {
    fn fetch(&self, id: &str) -> BoardgifResult<Game> {
        JsonGameProvider::candidates(id)
            .into_iter()
            .find_map(|c| self.games.get(c))
            .cloned()
            .ok_or_else(|| BoardgifError::not_found(id))
    }
}
