use hyper::{http::Error as HttpError, Error as HyperError, StatusCode};
use serde_json::Error as SerdeError;
use std::{
    error::Error as StdError,
    fmt::{Display, Formatter, Result as FmtResult},
    time::Duration,
};

/// Machine readable codes carried by the authority's error envelope
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ErrorCode {
    GuildNotFound,
    LobbyNotFound,
    LobbyAlreadyExists,
    LobbyIsActiveRoom,
    RoomNotFound,
    RoomAlreadyExists,
    RoomAlreadyReclaimed,
    MemberNotFound,
    Other(String),
}

impl ErrorCode {
    pub fn as_str(&self) -> &str {
        match self {
            ErrorCode::GuildNotFound => "guild_not_found",
            ErrorCode::LobbyNotFound => "lobby_not_found",
            ErrorCode::LobbyAlreadyExists => "lobby_already_exists",
            ErrorCode::LobbyIsActiveRoom => "lobby_is_active_room",
            ErrorCode::RoomNotFound => "room_not_found",
            ErrorCode::RoomAlreadyExists => "room_already_exists",
            ErrorCode::RoomAlreadyReclaimed => "room_already_reclaimed",
            ErrorCode::MemberNotFound => "member_not_found",
            ErrorCode::Other(code) => code,
        }
    }

    /// Whether the code says the addressed resource does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ErrorCode::GuildNotFound
                | ErrorCode::LobbyNotFound
                | ErrorCode::RoomNotFound
                | ErrorCode::MemberNotFound
        )
    }
}

impl From<&str> for ErrorCode {
    fn from(code: &str) -> Self {
        match code {
            "guild_not_found" => ErrorCode::GuildNotFound,
            "lobby_not_found" => ErrorCode::LobbyNotFound,
            "lobby_already_exists" => ErrorCode::LobbyAlreadyExists,
            "lobby_is_active_room" => ErrorCode::LobbyIsActiveRoom,
            "room_not_found" => ErrorCode::RoomNotFound,
            "room_already_exists" => ErrorCode::RoomAlreadyExists,
            "room_already_reclaimed" => ErrorCode::RoomAlreadyReclaimed,
            "member_not_found" => ErrorCode::MemberNotFound,
            other => ErrorCode::Other(other.to_string()),
        }
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// A well formed error answer of the authority
#[derive(Clone, Debug)]
pub struct ApiError {
    pub status: u16,
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug)]
pub enum BackendError {
    BuildingRequest(HttpError),
    Request(HyperError),
    Timeout(Duration),
    Parsing(SerdeError),
    Unreadable(StatusCode),
    MissingBody,
    Api(ApiError),
}

impl BackendError {
    /// Everything except a structured error answer counts as a transport failure
    pub const fn is_transport(&self) -> bool {
        !matches!(self, BackendError::Api(_))
    }

    pub fn code(&self) -> Option<&ErrorCode> {
        match self {
            BackendError::Api(err) => Some(&err.code),
            _ => None,
        }
    }

    pub fn api(status: u16, code: ErrorCode, message: impl Into<String>) -> Self {
        BackendError::Api(ApiError {
            status,
            code,
            message: message.into(),
        })
    }
}

impl Display for BackendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            BackendError::BuildingRequest(err) => write!(f, "Building Request Error - {}", err),
            BackendError::Request(err) => write!(f, "Request Error - {}", err),
            BackendError::Timeout(after) => write!(f, "Timed out after {:?}", after),
            BackendError::Parsing(err) => write!(f, "Parsing Error - {}", err),
            BackendError::Unreadable(status) => write!(f, "Unreadable answer - {}", status),
            BackendError::MissingBody => f.write_str("Answer carried no entity"),
            BackendError::Api(err) => {
                write!(f, "API Error - {} {}: {}", err.status, err.code, err.message)
            }
        }
    }
}

impl From<HttpError> for BackendError {
    fn from(err: HttpError) -> Self {
        BackendError::BuildingRequest(err)
    }
}

impl From<HyperError> for BackendError {
    fn from(err: HyperError) -> Self {
        BackendError::Request(err)
    }
}

impl From<SerdeError> for BackendError {
    fn from(err: SerdeError) -> Self {
        BackendError::Parsing(err)
    }
}

impl StdError for BackendError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            BackendError::BuildingRequest(err) => Some(err),
            BackendError::Request(err) => Some(err),
            BackendError::Parsing(err) => Some(err),
            _ => None,
        }
    }
}
