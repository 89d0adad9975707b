//! Typed operations against the booking endpoints.
//!
//! # Design
//! `BookingClient` holds only a `base_url` and carries no mutable state
//! between calls. Each operation is split into a `build_*` method producing
//! an `HttpRequest` and a `parse_*` method consuming an `HttpResponse`, with
//! a convenience method running the pair through a [`Transport`]. Draft
//! validation happens before the request is even built, so a bad draft never
//! costs a round-trip.

use chrono::Utc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::http::{check_status, HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::types::{normalize_phone, Booking, BookingDraft, CancellationKey};

/// The two shapes a cancellation can take. The list view only ever holds a
/// [`CancellationKey`]; flows that hold a [`Booking`] should use the
/// server-issued id.
#[derive(Debug, Clone)]
pub enum CancelRequest {
    ById(Uuid),
    ByDetails(CancellationKey),
}

/// Stateless client for the booking repository endpoints.
#[derive(Debug, Clone)]
pub struct BookingClient {
    base_url: String,
}

impl BookingClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Validate, submit and confirm a booking in one call.
    pub fn create<T: Transport>(
        &self,
        transport: &T,
        draft: &BookingDraft,
    ) -> Result<Booking, ApiError> {
        draft.validate(Utc::now().date_naive())?;
        let request = self.build_create(draft)?;
        let response = transport.execute(request)?;
        self.parse_create(response)
    }

    /// All bookings for a phone number, any status. Empty is a valid result.
    pub fn list_by_phone<T: Transport>(
        &self,
        transport: &T,
        phone: &str,
    ) -> Result<Vec<Booking>, ApiError> {
        let response = transport.execute(self.build_list_by_phone(phone))?;
        self.parse_list(response)
    }

    /// Cancel by id or by composite key; the server flips the booking's
    /// status either way.
    pub fn cancel<T: Transport>(
        &self,
        transport: &T,
        request: &CancelRequest,
    ) -> Result<(), ApiError> {
        let response = transport.execute(self.build_cancel(request)?)?;
        self.parse_cancel(response)
    }

    pub fn build_create(&self, draft: &BookingDraft) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(&draft.normalized())
            .map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}/bookings", self.base_url),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
        })
    }

    pub fn build_list_by_phone(&self, phone: &str) -> HttpRequest {
        let phone = normalize_phone(phone);
        HttpRequest {
            method: HttpMethod::Get,
            path: format!(
                "{}/bookings?phone={}",
                self.base_url,
                urlencoding::encode(&phone)
            ),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn build_cancel(&self, request: &CancelRequest) -> Result<HttpRequest, ApiError> {
        match request {
            CancelRequest::ById(id) => Ok(HttpRequest {
                method: HttpMethod::Delete,
                path: format!("{}/bookings/{id}", self.base_url),
                headers: Vec::new(),
                body: None,
            }),
            CancelRequest::ByDetails(key) => {
                let body = serde_json::to_string(key)
                    .map_err(|e| ApiError::Serialization(e.to_string()))?;
                Ok(HttpRequest {
                    method: HttpMethod::Post,
                    path: format!("{}/bookings/cancel-by-details", self.base_url),
                    headers: vec![("content-type".to_string(), "application/json".to_string())],
                    body: Some(body),
                })
            }
        }
    }

    pub fn parse_create(&self, response: HttpResponse) -> Result<Booking, ApiError> {
        check_status(&response, 201)?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    pub fn parse_list(&self, response: HttpResponse) -> Result<Vec<Booking>, ApiError> {
        check_status(&response, 200)?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    pub fn parse_cancel(&self, _response: HttpResponse) -> Result<(), ApiError> {
        // 2xx ack; the body (if any) carries nothing the client needs.
        Ok(())
    }
}
