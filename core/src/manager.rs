//! Session-scoped booking state and create/search/cancel orchestration.
//!
//! # Design
//! `BookingManager` exclusively owns the in-memory booking collection for
//! the current session; the backend owns durable state, and the local
//! collection is only a cache of the last phone-scoped view. Every failure
//! is caught at this boundary and converted into `last_error`; nothing
//! propagates as an unhandled fault. `loading` is false again on every exit
//! path, success or not.
//!
//! Cancellation prefers the server-issued id whenever a [`Booking`] is held;
//! the composite-key path exists for callers that never had one, and always
//! re-fetches to confirm because the key is not guaranteed unique.

use tracing::{debug, warn};

use crate::client::{BookingClient, CancelRequest};
use crate::error::ApiError;
use crate::http::Transport;
use crate::search::SearchClient;
use crate::types::{Booking, BookingDraft, CancellationKey, QueryAnswer, Route};

/// How the local collection is brought back in line after a successful
/// cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconcile {
    /// Re-fetch the phone's bookings from the server. The default: the
    /// server decided what the cancellation actually resolved to, so ask it.
    Refetch,
    /// Drop local entries matched by the cancellation key without a second
    /// round-trip. Opt-in; diverges if the key matched a different booking
    /// server-side.
    PruneLocal,
}

/// Owns the current session's booking view and runs the booking lifecycle.
pub struct BookingManager<T: Transport> {
    transport: T,
    booking: BookingClient,
    search: SearchClient,
    reconcile: Reconcile,
    bookings: Vec<Booking>,
    loading: bool,
    last_error: Option<String>,
}

impl<T: Transport> BookingManager<T> {
    pub fn new(base_url: &str, transport: T) -> Self {
        Self {
            transport,
            booking: BookingClient::new(base_url),
            search: SearchClient::new(base_url),
            reconcile: Reconcile::Refetch,
            bookings: Vec::new(),
            loading: false,
            last_error: None,
        }
    }

    pub fn with_reconcile(mut self, reconcile: Reconcile) -> Self {
        self.reconcile = reconcile;
        self
    }

    /// Snapshot of the current phone-scoped view, for rendering only.
    pub fn bookings(&self) -> &[Booking] {
        &self.bookings
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Submit a draft; on success the confirmed booking joins the local
    /// view. An invalid draft fails before any network call.
    pub fn create(&mut self, draft: &BookingDraft) -> Result<Booking, ApiError> {
        self.loading = true;
        let result = self.booking.create(&self.transport, draft);
        self.loading = false;
        let result = result.map(|booking| {
            debug!(id = %booking.id, "booking confirmed");
            self.bookings.push(booking.clone());
            booking
        });
        self.finish(result)
    }

    /// Replace the view wholesale with the given phone's bookings. Results
    /// for a previous phone never leak into the new view; on failure the
    /// previous view is left as it was.
    pub fn search_by_phone(&mut self, phone: &str) -> Result<&[Booking], ApiError> {
        self.loading = true;
        let result = self.booking.list_by_phone(&self.transport, phone);
        self.loading = false;
        match self.finish(result) {
            Ok(list) => {
                self.bookings = list;
                Ok(&self.bookings)
            }
            Err(err) => Err(err),
        }
    }

    /// Cancel a booking held locally, by its server-issued id.
    pub fn cancel(&mut self, booking: &Booking) -> Result<(), ApiError> {
        self.loading = true;
        let result = self.cancel_and_reconcile(booking);
        self.loading = false;
        self.finish(result)
    }

    fn cancel_and_reconcile(&mut self, booking: &Booking) -> Result<(), ApiError> {
        self.booking
            .cancel(&self.transport, &CancelRequest::ById(booking.id))?;
        match self.reconcile {
            Reconcile::Refetch => {
                self.bookings = self.booking.list_by_phone(&self.transport, &booking.phone)?;
            }
            Reconcile::PruneLocal => {
                let key = booking.cancellation_key();
                self.bookings.retain(|b| !key.matches(b));
            }
        }
        Ok(())
    }

    /// Cancel by composite key, for callers that never held a [`Booking`].
    ///
    /// Best-effort: the key may in principle match more than one booking
    /// server-side, so this path always re-fetches afterwards regardless of
    /// the configured reconcile strategy.
    pub fn cancel_by_key(&mut self, key: &CancellationKey) -> Result<(), ApiError> {
        self.loading = true;
        let result = self.cancel_by_key_inner(key);
        self.loading = false;
        self.finish(result)
    }

    fn cancel_by_key_inner(&mut self, key: &CancellationKey) -> Result<(), ApiError> {
        self.booking
            .cancel(&self.transport, &CancelRequest::ByDetails(key.clone()))?;
        self.bookings = self.booking.list_by_phone(&self.transport, &key.phone)?;
        Ok(())
    }

    // Search delegations feeding the draft-construction flow. Pure reads:
    // they touch neither `loading` nor `last_error`.

    pub fn routes(
        &self,
        from_district: &str,
        to_district: &str,
        max_price: Option<u32>,
    ) -> Result<Vec<Route>, ApiError> {
        self.search
            .search(&self.transport, from_district, to_district, max_price)
    }

    pub fn districts(&self) -> Result<Vec<String>, ApiError> {
        self.search.districts(&self.transport)
    }

    pub fn providers(&self) -> Result<Vec<String>, ApiError> {
        self.search.providers(&self.transport)
    }

    pub fn ask(&self, query: &str) -> Result<QueryAnswer, ApiError> {
        self.search.ask(&self.transport, query)
    }

    fn finish<V>(&mut self, result: Result<V, ApiError>) -> Result<V, ApiError> {
        match &result {
            Ok(_) => self.last_error = None,
            Err(err) => {
                warn!(error = %err, "booking operation failed");
                self.last_error = Some(err.to_string());
            }
        }
        result
    }
}
