use backend::ErrorCode;
use std::{
    error::Error as StdError,
    fmt::{Display, Formatter, Result as FmtResult},
    time::Duration,
};
use tempvoice_models::room::{RoomAction, MAX_USER_LIMIT};
use tempvoice_resources::ResourceError;
use twilight_http::{
    api_error::ApiError as DiscordApiError, error::ErrorType, response::DeserializeBodyError,
    Error as DiscordHttpError,
};
use twilight_validate::{channel::ChannelValidationError, message::MessageValidationError};

/// Discord's json error code for a channel that no longer exists
const UNKNOWN_CHANNEL: u64 = 10003;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PlatformErrorKind {
    /// The channel was already deleted
    UnknownChannel,
    /// Discord refused or failed the request
    Request,
    /// The request was rejected locally before being sent
    Validation,
}

/// A failed call to the channel provisioning api
#[derive(Debug)]
pub struct PlatformError {
    pub(crate) kind: PlatformErrorKind,
    pub(crate) source: Option<Box<dyn StdError + Send + Sync>>,
}

impl PlatformError {
    pub fn new(kind: PlatformErrorKind) -> Self {
        Self { kind, source: None }
    }

    pub const fn kind(&self) -> PlatformErrorKind {
        self.kind
    }

    pub fn is_unknown_channel(&self) -> bool {
        self.kind == PlatformErrorKind::UnknownChannel
    }
}

impl Display for PlatformError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self.kind {
            PlatformErrorKind::UnknownChannel => f.write_str("Discord Error - unknown channel")?,
            PlatformErrorKind::Request => f.write_str("Discord Error - request failed")?,
            PlatformErrorKind::Validation => f.write_str("Discord Error - invalid request")?,
        }
        if let Some(source) = &self.source {
            write!(f, ": {}", source)?;
        }
        Ok(())
    }
}

impl StdError for PlatformError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| &**source as &(dyn StdError + 'static))
    }
}

impl From<DiscordHttpError> for PlatformError {
    fn from(err: DiscordHttpError) -> Self {
        let kind = match err.kind() {
            ErrorType::Response {
                error: DiscordApiError::General(general),
                ..
            } if general.code == UNKNOWN_CHANNEL => PlatformErrorKind::UnknownChannel,
            _ => PlatformErrorKind::Request,
        };
        Self {
            kind,
            source: Some(Box::new(err)),
        }
    }
}

impl From<DeserializeBodyError> for PlatformError {
    fn from(err: DeserializeBodyError) -> Self {
        Self {
            kind: PlatformErrorKind::Request,
            source: Some(Box::new(err)),
        }
    }
}

impl From<ChannelValidationError> for PlatformError {
    fn from(err: ChannelValidationError) -> Self {
        Self {
            kind: PlatformErrorKind::Validation,
            source: Some(Box::new(err)),
        }
    }
}

impl From<MessageValidationError> for PlatformError {
    fn from(err: MessageValidationError) -> Self {
        Self {
            kind: PlatformErrorKind::Validation,
            source: Some(Box::new(err)),
        }
    }
}

/// A request refused before anything was sent anywhere
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Rejection {
    NotInRoom,
    NotOwner,
    NotCreator,
    AlreadyOwner,
    ActionDisabled(RoomAction),
    Locked,
    LimitTooLow,
    LimitTooHigh { ceiling: u16 },
    InvalidName,
    LobbyMissing,
    Cooldown(Duration),
    InvalidLobbyLimit,
    ChannelIsRoom,
    NotALobby,
    NotVoiceChannel,
}

impl Display for Rejection {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Rejection::NotInRoom => f.write_str("You need to be inside a voice room to use this."),
            Rejection::NotOwner => f.write_str("Only the owner of this room can do that."),
            Rejection::NotCreator => {
                f.write_str("Only the member who created this room can reclaim it.")
            }
            Rejection::AlreadyOwner => f.write_str("You already own this room."),
            Rejection::ActionDisabled(RoomAction::Rename) => {
                f.write_str("Renaming rooms is disabled for this lobby.")
            }
            Rejection::ActionDisabled(RoomAction::Lock) => {
                f.write_str("Locking rooms is disabled for this lobby.")
            }
            Rejection::ActionDisabled(RoomAction::AdjustLimit) => {
                f.write_str("Changing the member limit is disabled for this lobby.")
            }
            Rejection::Locked => f.write_str("Unlock the room before changing its member limit."),
            Rejection::LimitTooLow => f.write_str("The member limit must be at least 2."),
            Rejection::LimitTooHigh { ceiling } => write!(
                f,
                "The member limit cannot be higher than this lobby's limit of {}.",
                ceiling
            ),
            Rejection::InvalidName => {
                f.write_str("Room names must be between 1 and 100 characters long.")
            }
            Rejection::LobbyMissing => f.write_str(
                "The lobby of this room no longer exists, so the room has been closed.",
            ),
            Rejection::Cooldown(remaining) => write!(
                f,
                "You are creating rooms too quickly. Try again in {} seconds.",
                remaining.as_secs().max(1)
            ),
            Rejection::InvalidLobbyLimit => write!(
                f,
                "The member limit of a lobby must be between 1 and {}.",
                MAX_USER_LIMIT
            ),
            Rejection::ChannelIsRoom => f.write_str("A voice room cannot be used as a lobby."),
            Rejection::NotALobby => f.write_str("This channel is not a lobby."),
            Rejection::NotVoiceChannel => f.write_str("Lobbies must be voice channels."),
        }
    }
}

/// The step that failed after earlier steps had already succeeded
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Stage {
    RegisterRoom,
    MoveMember,
    ApplyLock,
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Stage::RegisterRoom => f.write_str("registering the room"),
            Stage::MoveMember => f.write_str("moving the member"),
            Stage::ApplyLock => f.write_str("applying the lock"),
        }
    }
}

#[derive(Debug)]
pub enum RoomError {
    Resource(ResourceError),
    Platform(PlatformError),
    Rejected(Rejection),
    /// A step failed midway and the steps before it were rolled back
    Partial {
        stage: Stage,
        source: Box<RoomError>,
    },
}

impl RoomError {
    pub fn partial(stage: Stage, source: impl Into<RoomError>) -> Self {
        RoomError::Partial {
            stage,
            source: Box::new(source.into()),
        }
    }

    pub const fn rejection(&self) -> Option<Rejection> {
        match self {
            RoomError::Rejected(rejection) => Some(*rejection),
            _ => None,
        }
    }

    /// The message shown to the member whose action failed
    pub fn user_message(&self) -> String {
        match self {
            RoomError::Rejected(rejection) => rejection.to_string(),
            RoomError::Resource(err) => resource_message(err).into(),
            RoomError::Platform(_) => {
                "Discord refused to update the channel. Please try again later.".into()
            }
            RoomError::Partial {
                stage: Stage::ApplyLock,
                ..
            } => "Discord refused to change the room's capacity, so its lock state was left as it was. Please try again later.".into(),
            RoomError::Partial { .. } => {
                "Your room could not be set up and has been cleaned up. Please try again.".into()
            }
        }
    }
}

fn resource_message(err: &ResourceError) -> &'static str {
    match err {
        ResourceError::Transport(_) => {
            "The voice room service is unavailable right now. Please try again later."
        }
        ResourceError::Domain { code, .. } => match code {
            ErrorCode::GuildNotFound => "This server is not set up for voice rooms.",
            ErrorCode::LobbyNotFound => "This lobby no longer exists.",
            ErrorCode::LobbyAlreadyExists => "This channel is already a lobby.",
            ErrorCode::LobbyIsActiveRoom => "A voice room cannot be used as a lobby.",
            ErrorCode::RoomNotFound => "This voice room no longer exists.",
            ErrorCode::RoomAlreadyExists => "This channel is already a voice room.",
            ErrorCode::RoomAlreadyReclaimed => "This room has already been reclaimed.",
            ErrorCode::MemberNotFound => "Your member profile could not be found.",
            ErrorCode::Other(_) => "The voice room service refused the request.",
        },
    }
}

impl Display for RoomError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            RoomError::Resource(err) => write!(f, "Resource Error - {}", err),
            RoomError::Platform(err) => write!(f, "Platform Error - {}", err),
            RoomError::Rejected(rejection) => write!(f, "Rejected - {:?}", rejection),
            RoomError::Partial { stage, source } => {
                write!(f, "Partial Failure while {} - {}", stage, source)
            }
        }
    }
}

impl StdError for RoomError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            RoomError::Resource(err) => Some(err),
            RoomError::Platform(err) => Some(err),
            RoomError::Partial { source, .. } => Some(&**source),
            RoomError::Rejected(_) => None,
        }
    }
}

impl From<ResourceError> for RoomError {
    fn from(err: ResourceError) -> Self {
        RoomError::Resource(err)
    }
}

impl From<PlatformError> for RoomError {
    fn from(err: PlatformError) -> Self {
        RoomError::Platform(err)
    }
}

impl From<Rejection> for RoomError {
    fn from(rejection: Rejection) -> Self {
        RoomError::Rejected(rejection)
    }
}
