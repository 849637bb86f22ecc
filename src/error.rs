use thiserror::Error;

/// What every failure looks like to the person at the terminal.
pub const GENERIC_MESSAGE: &str = "Something bad happened; please try again later.";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request rejected with status {status}: {body}")]
    Client { status: u16, body: String },

    #[error("Server failed with status {status}: {body}")]
    Server { status: u16, body: String },

    #[error("No active session, log in first")]
    Unauthenticated,

    #[error("Unexpected response body: {0}")]
    Decode(String),

    #[error("Invalid path segment: {0:?}")]
    InvalidPath(String),
}

impl ApiError {
    pub fn from_status(status: u16, body: String) -> Self {
        if (400..500).contains(&status) {
            ApiError::Client { status, body }
        } else {
            ApiError::Server { status, body }
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Client { status, .. } | ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Transport failures and server faults may go away on their own.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Network(_) | ApiError::Server { .. } => true,
            _ => false,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            ApiError::Unauthenticated => "Please log in first.",
            _ => GENERIC_MESSAGE,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },

    #[error("Invalid API url: {0}")]
    Url(#[from] url::ParseError),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Session store error: {0}")]
    Sled(#[from] sled::Error),

    #[error("Session store holds non UTF-8 data under {0}")]
    Encoding(String),
}

/// A front-end action failed on the wire or while saving the session.
#[derive(Error, Debug)]
pub enum FlowError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Could not print response: {0}")]
    Output(serde_json::Error),
}

impl FlowError {
    pub fn user_message(&self) -> &'static str {
        match self {
            FlowError::Api(err) => err.user_message(),
            FlowError::Store(_) => "Could not access the saved session.",
            FlowError::Output(_) => GENERIC_MESSAGE,
        }
    }
}
