//! Client core for the bus booking service.
//!
//! # Overview
//! Everything a passenger-facing UI needs short of rendering: route search,
//! booking creation, phone-scoped lookup, cancellation, and free-text
//! questions against the knowledge endpoint. [`BookingManager`] owns the
//! session's booking state; the stateless clients underneath it build
//! requests and parse responses as plain data, with all I/O behind the
//! [`Transport`] seam.
//!
//! # Design
//! - One canonical schema per entity ([`types`]); backend spelling drift is
//!   absorbed with serde attributes, never with parallel type definitions.
//! - Errors split by who can fix them: [`ApiError::Validation`] never cost a
//!   network call, [`ApiError::Remote`] carries the server's message
//!   verbatim, [`ApiError::Network`] means no response at all.
//! - No ambient singletons: the transport and clients are constructed once
//!   and handed to the manager.
//! - No silent retries anywhere; a failed operation waits for the user.

pub mod client;
pub mod error;
pub mod http;
pub mod manager;
pub mod search;
pub mod types;

pub use client::{BookingClient, CancelRequest};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
pub use manager::{BookingManager, Reconcile};
pub use search::SearchClient;
pub use types::{
    Booking, BookingDraft, BookingStatus, CancellationKey, DepartureTime, QueryAnswer, Route,
    RouteResult, SearchRequest, SearchResponse,
};
