use std::process::ExitStatus;

pub type BoardgifResult<T> = Result<T, BoardgifError>;

/// Failure reported by an external collaborator (renderer, converter, annotator, stamper).
#[derive(thiserror::Error, Debug)]
pub enum ToolError {
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum BoardgifError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("game not found: {0}")]
    GameNotFound(String),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("render error (frame {index}): {source}")]
    Render {
        index: usize,
        #[source]
        source: ToolError,
    },

    #[error("convert error (frame {index}): {source}")]
    Convert {
        index: usize,
        #[source]
        source: ToolError,
    },

    #[error("annotate error (frame {index}): {source}")]
    Annotate {
        index: usize,
        #[source]
        source: ToolError,
    },

    #[error("stamp error: {0}")]
    Stamp(#[source] ToolError),

    #[error("encode error (frame {index}): {message}")]
    Encode { index: usize, message: String },

    #[error("assembly error: {0}")]
    Assembly(String),

    #[error("scratch error: {0}")]
    Scratch(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BoardgifError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        Self::GameNotFound(id.into())
    }

    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    pub fn encode(index: usize, msg: impl Into<String>) -> Self {
        Self::Encode {
            index,
            message: msg.into(),
        }
    }

    pub fn assembly(msg: impl Into<String>) -> Self {
        Self::Assembly(msg.into())
    }

    pub fn scratch(msg: impl Into<String>) -> Self {
        Self::Scratch(msg.into())
    }

    /// Return `true` when the game data itself could not be obtained.
    pub fn is_provider_error(&self) -> bool {
        matches!(self, Self::GameNotFound(_) | Self::Provider(_))
    }

    /// Frame index the failure is attributed to, if it came from a per-frame job.
    pub fn frame_index(&self) -> Option<usize> {
        match self {
            Self::Render { index, .. }
            | Self::Convert { index, .. }
            | Self::Annotate { index, .. }
            | Self::Encode { index, .. } => Some(*index),
            _ => None,
        }
    }
}
