use backend::{BackendError, ErrorCode};
use std::{
    error::Error as StdError,
    fmt::{Display, Formatter, Result as FmtResult},
};

/// The failure of a resource manager operation
#[derive(Debug)]
pub enum ResourceError {
    /// The authority could not be reached or answered something unreadable
    Transport(BackendError),
    /// The authority refused the operation with a structured error
    Domain { code: ErrorCode, message: String },
}

impl ResourceError {
    pub fn code(&self) -> Option<&ErrorCode> {
        match self {
            ResourceError::Domain { code, .. } => Some(code),
            ResourceError::Transport(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.code().map_or(false, ErrorCode::is_not_found)
    }

    pub const fn is_transport(&self) -> bool {
        matches!(self, ResourceError::Transport(_))
    }
}

impl Display for ResourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ResourceError::Transport(err) => write!(f, "Transport Error - {}", err),
            ResourceError::Domain { code, message } => {
                write!(f, "Domain Error - {}: {}", code, message)
            }
        }
    }
}

impl From<BackendError> for ResourceError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Api(api) => ResourceError::Domain {
                code: api.code,
                message: api.message,
            },
            err => ResourceError::Transport(err),
        }
    }
}

impl From<serde_json::Error> for ResourceError {
    fn from(err: serde_json::Error) -> Self {
        ResourceError::Transport(BackendError::Parsing(err))
    }
}

impl StdError for ResourceError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ResourceError::Transport(err) => Some(err),
            ResourceError::Domain { .. } => None,
        }
    }
}
