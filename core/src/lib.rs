//! Client core for the todo service.
//!
//! # Overview
//! `TodoStore` holds the todos on display and keeps them in step with the
//! remote collection behind four endpoints (list, add, delete, update).
//! Underneath it, `TodoClient` builds `HttpRequest` values and parses
//! `HttpResponse` values without touching the network, and a `Transport`
//! performs the round-trip.
//!
//! # Design
//! - `TodoClient` is stateless; each endpoint is split into `build_*` and
//!   `parse_*` so the I/O boundary is explicit.
//! - `Transport` is the async seam. `ReqwestTransport` is the production
//!   implementation; hosts may also drive `TodoClient` with their own I/O.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod store;
pub mod transport;
pub mod types;

pub use client::TodoClient;
pub use config::ClientConfig;
pub use error::{ApiError, StoreError, TransportError, ValidationError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use store::{EditSession, Notice, NoticeLevel, TodoState, TodoStore};
pub use transport::{ReqwestTransport, Transport};
pub use types::{AddTodo, TodoId, TodoItem, TodoPatch, UpdateTodo};
