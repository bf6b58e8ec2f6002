use thiserror::Error;

/// Coarse classification of an [`AppError`], used by the HTTP layer to pick a
/// status code and by callers that only care about the failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    BadRequest,
    Internal,
}

/// Errors surfaced by application-level operations.
///
/// Every variant names the operation that failed (`op`) so a caller that
/// receives the error from deep inside a batch can tell where it came from.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error("{op}: {what} not found")]
    NotFound { op: &'static str, what: String },

    /// Non-guest accounts cannot leave the default channel.
    #[error("{op}: cannot remove user from the default channel {channel}")]
    DefaultChannel { op: &'static str, channel: String },

    #[error("{op}: channel {channel_id} has been archived")]
    ChannelArchived { op: &'static str, channel_id: String },

    #[error("{op}: channel {channel_id} does not accept direct membership changes")]
    UnsupportedChannelType { op: &'static str, channel_id: String },

    #[error("{op}: {context}: {cause}")]
    Internal {
        op: &'static str,
        context: &'static str,
        cause: String,
    },
}

impl AppError {
    pub fn internal(op: &'static str, context: &'static str, cause: impl ToString) -> Self {
        Self::Internal {
            op,
            context,
            cause: cause.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::NotFound { .. } => ErrorKind::NotFound,
            AppError::DefaultChannel { .. }
            | AppError::ChannelArchived { .. }
            | AppError::UnsupportedChannelType { .. } => ErrorKind::BadRequest,
            AppError::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// The operation that produced this error.
    pub fn op(&self) -> &'static str {
        match self {
            AppError::NotFound { op, .. }
            | AppError::DefaultChannel { op, .. }
            | AppError::ChannelArchived { op, .. }
            | AppError::UnsupportedChannelType { op, .. }
            | AppError::Internal { op, .. } => *op,
        }
    }
}
