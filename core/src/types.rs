//! Canonical domain types for the bus booking API.
//!
//! # Design
//! One schema per entity. The backend has drifted spellings and wrapper
//! shapes in places; those are absorbed here with serde attributes (e.g.
//! the `canceled` alias) rather than with parallel type definitions.
//! These types mirror the mock-server's schema but are defined
//! independently; integration tests catch any drift between the two crates.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

/// A priced bus itinerary between two districts, offered by a provider.
///
/// Routes carry no identity: two routes with identical fields are
/// interchangeable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Route {
    pub provider: String,
    pub from_district: String,
    pub to_district: String,
    pub dropping_point: String,
    pub price: u32,
}

/// The fixed set of departure slots buses leave on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DepartureTime {
    #[serde(rename = "06:00")]
    Six,
    #[serde(rename = "08:00")]
    Eight,
    #[serde(rename = "10:00")]
    Ten,
    #[serde(rename = "12:00")]
    Noon,
    #[serde(rename = "14:00")]
    Two,
    #[serde(rename = "16:00")]
    Four,
    #[serde(rename = "18:00")]
    SixPm,
    #[serde(rename = "20:00")]
    EightPm,
    #[serde(rename = "22:00")]
    TenPm,
}

impl DepartureTime {
    pub const ALL: [DepartureTime; 9] = [
        DepartureTime::Six,
        DepartureTime::Eight,
        DepartureTime::Ten,
        DepartureTime::Noon,
        DepartureTime::Two,
        DepartureTime::Four,
        DepartureTime::SixPm,
        DepartureTime::EightPm,
        DepartureTime::TenPm,
    ];

    /// The wire representation, e.g. `"08:00"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            DepartureTime::Six => "06:00",
            DepartureTime::Eight => "08:00",
            DepartureTime::Ten => "10:00",
            DepartureTime::Noon => "12:00",
            DepartureTime::Two => "14:00",
            DepartureTime::Four => "16:00",
            DepartureTime::SixPm => "18:00",
            DepartureTime::EightPm => "20:00",
            DepartureTime::TenPm => "22:00",
        }
    }
}

impl std::str::FromStr for DepartureTime {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DepartureTime::ALL
            .into_iter()
            .find(|slot| slot.as_str() == s)
            .ok_or_else(|| ApiError::Validation(format!("{s} is not a departure slot")))
    }
}

impl std::fmt::Display for DepartureTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a confirmed reservation. The only legal transition is
/// confirmed -> cancelled, performed by the cancel operation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    // One backend tree spells this with a single l.
    #[serde(alias = "canceled")]
    Cancelled,
}

/// Unconfirmed passenger + travel intent, pre server acceptance.
///
/// Built from a selected [`Route`] plus passenger details; submitting it via
/// the booking client is the only path to a [`Booking`]. A draft has no
/// identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookingDraft {
    pub name: String,
    pub phone: String,
    pub bus_provider: String,
    pub from_district: String,
    pub to_district: String,
    pub dropping_point: String,
    pub price: u32,
    pub travel_date: NaiveDate,
    pub travel_time: DepartureTime,
}

impl BookingDraft {
    /// Copy the route fields into a draft at submission time.
    pub fn from_route(
        route: &Route,
        name: &str,
        phone: &str,
        travel_date: NaiveDate,
        travel_time: DepartureTime,
    ) -> Self {
        Self {
            name: name.to_string(),
            phone: phone.to_string(),
            bus_provider: route.provider.clone(),
            from_district: route.from_district.clone(),
            to_district: route.to_district.clone(),
            dropping_point: route.dropping_point.clone(),
            price: route.price,
            travel_date,
            travel_time,
        }
    }

    /// Local pre-submission checks. Runs before any network call so an
    /// invalid draft never costs a round-trip.
    pub fn validate(&self, today: NaiveDate) -> Result<(), ApiError> {
        if self.name.trim().chars().count() < 2 {
            return Err(ApiError::Validation(
                "name must be at least 2 characters".to_string(),
            ));
        }
        if !is_valid_phone(&normalize_phone(&self.phone)) {
            return Err(ApiError::Validation(
                "invalid phone number (expected 01XXXXXXXXX)".to_string(),
            ));
        }
        if self.travel_date < today {
            return Err(ApiError::Validation(
                "travel date must not be in the past".to_string(),
            ));
        }
        if self.price == 0 {
            return Err(ApiError::Validation("price must be positive".to_string()));
        }
        Ok(())
    }

    /// Same draft with the phone number reduced to digits, ready for the
    /// wire.
    pub(crate) fn normalized(&self) -> BookingDraft {
        BookingDraft {
            phone: normalize_phone(&self.phone),
            ..self.clone()
        }
    }
}

/// Server-confirmed reservation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Booking {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub bus_provider: String,
    pub from_district: String,
    pub to_district: String,
    pub dropping_point: String,
    pub price: u32,
    pub travel_date: NaiveDate,
    pub travel_time: DepartureTime,
    pub booking_date: DateTime<Utc>,
    pub status: BookingStatus,
}

impl Booking {
    /// The composite key used by cancel flows that do not hold the id.
    pub fn cancellation_key(&self) -> CancellationKey {
        CancellationKey {
            phone: normalize_phone(&self.phone),
            travel_date: self.travel_date,
            travel_time: self.travel_time,
            bus_provider: self.bus_provider.clone(),
            from_district: self.from_district.clone(),
            to_district: self.to_district.clone(),
            dropping_point: self.dropping_point.clone(),
        }
    }
}

/// Composite tuple identifying a booking for cancellation when no server id
/// is available to the caller.
///
/// The backend does not enforce uniqueness of this tuple, so key-based
/// cancellation is best-effort; callers holding a [`Booking`] should cancel
/// by id instead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CancellationKey {
    pub phone: String,
    pub travel_date: NaiveDate,
    pub travel_time: DepartureTime,
    pub bus_provider: String,
    pub from_district: String,
    pub to_district: String,
    pub dropping_point: String,
}

impl CancellationKey {
    /// The single matching predicate shared by the wire payload and the
    /// optional local prune, so the two cannot diverge.
    pub fn matches(&self, booking: &Booking) -> bool {
        self.phone == normalize_phone(&booking.phone)
            && self.travel_date == booking.travel_date
            && self.travel_time == booking.travel_time
            && self.bus_provider == booking.bus_provider
            && self.from_district == booking.from_district
            && self.to_district == booking.to_district
            && self.dropping_point == booking.dropping_point
    }
}

/// Body of `POST /search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub from_district: String,
    pub to_district: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<u32>,
}

/// Response wrapper of `POST /search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub routes: Vec<Route>,
    pub total: usize,
}

/// Answer from the free-text query backend.
///
/// Only `answer` and `query_type` are always present; the rest depends on
/// what kind of question was asked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryAnswer {
    pub answer: String,
    pub query_type: String,
    #[serde(default)]
    pub results: Vec<RouteResult>,
    #[serde(default)]
    pub providers: Vec<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub contact_info: Option<ContactInfo>,
}

/// A route candidate inside a [`QueryAnswer`]; leaner than [`Route`] because
/// the answer carries the districts once at the top level.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RouteResult {
    pub provider: String,
    pub price: u32,
    #[serde(default)]
    pub dropping_point: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactInfo {
    pub provider: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}

impl QueryAnswer {
    /// Lower `results[]` into bookable [`Route`]s so a booking can start
    /// from a free-text answer. Empty when the answer did not name both
    /// districts or carried no results with a dropping point.
    pub fn suggested_routes(&self) -> Vec<Route> {
        let (Some(from), Some(to)) = (&self.from, &self.to) else {
            return Vec::new();
        };
        self.results
            .iter()
            .filter_map(|result| {
                let dropping_point = result.dropping_point.clone()?;
                Some(Route {
                    provider: result.provider.clone(),
                    from_district: from.clone(),
                    to_district: to.clone(),
                    dropping_point,
                    price: result.price,
                })
            })
            .collect()
    }
}

/// Strip the separators users type into phone numbers.
pub fn normalize_phone(phone: &str) -> String {
    phone
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

/// Local mobile format: `01`, an operator digit 3-9, then 8 digits.
pub fn is_valid_phone(phone: &str) -> bool {
    let bytes = phone.as_bytes();
    bytes.len() == 11
        && bytes.starts_with(b"01")
        && (b'3'..=b'9').contains(&bytes[2])
        && phone.chars().all(|c| c.is_ascii_digit())
}
