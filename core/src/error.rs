//! Error types for the todo client.
//!
//! # Design
//! Three failure categories reach callers of `TodoStore`:
//! - `ValidationError`: rejected locally, no request was sent.
//! - `TransportError`: the request never produced an HTTP response.
//! - `ApiError`: the server answered, but not with a usable success.
//!
//! `NotFound` keeps a dedicated variant because callers frequently
//! distinguish "the resource does not exist" from "the server returned an
//! unexpected status."

use thiserror::Error;

use crate::types::TodoId;

/// Errors returned by `TodoClient` build and parse methods.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned 404; the requested todo does not exist.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),
}

/// Failures below HTTP: nothing came back from the server.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("transport failure: {0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else {
            Self::Other(e.to_string())
        }
    }
}

/// Input rejected before any request is built.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("description must not be empty")]
    EmptyDescription,

    #[error("update must change at least one field")]
    EmptyPatch,

    #[error("no todo with id {0}")]
    UnknownTodo(TodoId),

    #[error("no todo is being edited")]
    NotEditing,
}

/// Errors surfaced by `TodoStore` operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Server(#[from] ApiError),
}

impl StoreError {
    /// True when the request never left the client.
    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::Validation(_))
    }
}
