use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// A bookable itinerary in the seed table. `seats` caps how many confirmed
/// bookings one departure (route + date + time) can hold.
#[derive(Clone, Debug)]
pub struct SeedRoute {
    pub provider: &'static str,
    pub from_district: &'static str,
    pub to_district: &'static str,
    pub dropping_point: &'static str,
    pub price: u32,
    pub seats: usize,
}

/// Route shape returned by `/search`, without the seat count.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RouteView {
    pub provider: String,
    pub from_district: String,
    pub to_district: String,
    pub dropping_point: String,
    pub price: u32,
}

impl From<&SeedRoute> for RouteView {
    fn from(route: &SeedRoute) -> Self {
        RouteView {
            provider: route.provider.to_string(),
            from_district: route.from_district.to_string(),
            to_district: route.to_district.to_string(),
            dropping_point: route.dropping_point.to_string(),
            price: route.price,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
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
    pub travel_time: String,
    pub booking_date: DateTime<Utc>,
    pub status: String,
}

#[derive(Deserialize)]
pub struct CreateBooking {
    pub name: String,
    pub phone: String,
    pub bus_provider: String,
    pub from_district: String,
    pub to_district: String,
    pub dropping_point: String,
    pub price: u32,
    pub travel_date: NaiveDate,
    pub travel_time: String,
}

#[derive(Deserialize)]
pub struct CancelDetails {
    pub phone: String,
    pub travel_date: NaiveDate,
    pub travel_time: String,
    pub bus_provider: String,
    pub from_district: String,
    pub to_district: String,
    pub dropping_point: String,
}

#[derive(Deserialize)]
pub struct SearchBody {
    pub from_district: String,
    pub to_district: String,
    #[serde(default)]
    pub max_price: Option<u32>,
}

#[derive(Serialize)]
pub struct SearchResult {
    pub routes: Vec<RouteView>,
    pub total: usize,
}

#[derive(Deserialize)]
pub struct QueryBody {
    pub query: String,
}

#[derive(Serialize)]
pub struct QueryReply {
    pub answer: String,
    pub query_type: String,
    pub results: Vec<QueryRouteResult>,
    pub providers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
}

#[derive(Serialize)]
pub struct QueryRouteResult {
    pub provider: String,
    pub price: u32,
    pub dropping_point: Option<String>,
}

/// Error body in the backend's convention.
#[derive(Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

#[derive(Deserialize)]
pub struct PhoneParam {
    pub phone: String,
}

pub struct AppState {
    pub routes: Vec<SeedRoute>,
    pub bookings: RwLock<Vec<Booking>>,
}

pub type Db = Arc<AppState>;

pub fn seed_routes() -> Vec<SeedRoute> {
    let route = |provider, from_district, to_district, dropping_point, price, seats| SeedRoute {
        provider,
        from_district,
        to_district,
        dropping_point,
        price,
        seats,
    };
    vec![
        route("Hanif", "Dhaka", "Sylhet", "Sylhet Bus Stand", 650, 40),
        route("Green Line", "Dhaka", "Sylhet", "Kadamtali", 850, 40),
        route("Hanif", "Sylhet", "Dhaka", "Sayedabad", 650, 40),
        route("Shyamoli", "Dhaka", "Chittagong", "GEC Circle", 700, 40),
        route("Hanif", "Dhaka", "Chittagong", "Dampara", 750, 40),
        route("Green Line", "Dhaka", "Rajshahi", "Rajshahi Terminal", 600, 40),
        // Single-seat departure, lets tests run a route out of capacity.
        route("Ena", "Dhaka", "Cox's Bazar", "Kolatoli", 1200, 1),
    ]
}

pub fn app() -> Router {
    let state: Db = Arc::new(AppState {
        routes: seed_routes(),
        bookings: RwLock::new(Vec::new()),
    });
    Router::new()
        .route("/bookings", get(list_bookings).post(create_booking))
        .route("/bookings/{id}", axum::routing::delete(cancel_booking))
        .route("/bookings/cancel-by-details", post(cancel_by_details))
        .route("/search", post(search_routes))
        .route("/search/districts", get(list_districts))
        .route("/search/providers", get(list_providers))
        .route("/query", post(answer_query))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn reject(status: StatusCode, detail: &str) -> (StatusCode, Json<ErrorBody>) {
    (
        status,
        Json(ErrorBody {
            detail: detail.to_string(),
        }),
    )
}

async fn create_booking(
    State(db): State<Db>,
    Json(input): Json<CreateBooking>,
) -> Result<(StatusCode, Json<Booking>), (StatusCode, Json<ErrorBody>)> {
    if input.name.trim().len() < 2 {
        return Err(reject(
            StatusCode::BAD_REQUEST,
            "name must be at least 2 characters",
        ));
    }
    if input.phone.len() < 11 {
        return Err(reject(StatusCode::BAD_REQUEST, "Invalid phone number!"));
    }
    let route = db
        .routes
        .iter()
        .find(|r| {
            r.provider == input.bus_provider
                && r.from_district == input.from_district
                && r.to_district == input.to_district
                && r.dropping_point == input.dropping_point
        })
        .ok_or_else(|| reject(StatusCode::BAD_REQUEST, "unknown route for the given provider"))?;

    let mut bookings = db.bookings.write().await;
    let taken = bookings
        .iter()
        .filter(|b| {
            b.status == "confirmed"
                && b.bus_provider == input.bus_provider
                && b.from_district == input.from_district
                && b.to_district == input.to_district
                && b.dropping_point == input.dropping_point
                && b.travel_date == input.travel_date
                && b.travel_time == input.travel_time
        })
        .count();
    if taken >= route.seats {
        return Err(reject(
            StatusCode::INTERNAL_SERVER_ERROR,
            "no seats available",
        ));
    }

    let booking = Booking {
        id: Uuid::new_v4(),
        name: input.name,
        phone: input.phone,
        bus_provider: input.bus_provider,
        from_district: input.from_district,
        to_district: input.to_district,
        dropping_point: input.dropping_point,
        price: input.price,
        travel_date: input.travel_date,
        travel_time: input.travel_time,
        booking_date: Utc::now(),
        status: "confirmed".to_string(),
    };
    bookings.push(booking.clone());
    Ok((StatusCode::CREATED, Json(booking)))
}

async fn list_bookings(
    State(db): State<Db>,
    Query(params): Query<PhoneParam>,
) -> Json<Vec<Booking>> {
    let bookings = db.bookings.read().await;
    Json(
        bookings
            .iter()
            .filter(|b| b.phone == params.phone)
            .cloned()
            .collect(),
    )
}

async fn cancel_booking(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorBody>)> {
    let mut bookings = db.bookings.write().await;
    let booking = bookings
        .iter_mut()
        .find(|b| b.id == id)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "booking not found"))?;
    if booking.status == "cancelled" {
        return Err(reject(StatusCode::BAD_REQUEST, "booking already cancelled"));
    }
    booking.status = "cancelled".to_string();
    Ok(Json(serde_json::json!({
        "message": "booking cancelled",
        "booking_id": id,
    })))
}

async fn cancel_by_details(
    State(db): State<Db>,
    Json(details): Json<CancelDetails>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorBody>)> {
    let mut bookings = db.bookings.write().await;
    // Only active bookings resolve through this path; an already-cancelled
    // booking is indistinguishable from one that never existed.
    let booking = bookings
        .iter_mut()
        .find(|b| {
            b.status == "confirmed"
                && b.phone == details.phone
                && b.travel_date == details.travel_date
                && b.travel_time == details.travel_time
                && b.bus_provider == details.bus_provider
                && b.from_district == details.from_district
                && b.to_district == details.to_district
                && b.dropping_point == details.dropping_point
        })
        .ok_or_else(|| {
            reject(
                StatusCode::NOT_FOUND,
                "no active booking matches the given details",
            )
        })?;
    booking.status = "cancelled".to_string();
    Ok(Json(serde_json::json!({ "message": "booking cancelled" })))
}

async fn search_routes(State(db): State<Db>, Json(body): Json<SearchBody>) -> Json<SearchResult> {
    let routes: Vec<RouteView> = db
        .routes
        .iter()
        .filter(|r| {
            r.from_district == body.from_district
                && r.to_district == body.to_district
                && body.max_price.map_or(true, |cap| r.price <= cap)
        })
        .map(RouteView::from)
        .collect();
    let total = routes.len();
    Json(SearchResult { routes, total })
}

fn districts(routes: &[SeedRoute]) -> Vec<String> {
    let mut names: Vec<String> = routes
        .iter()
        .flat_map(|r| [r.from_district.to_string(), r.to_district.to_string()])
        .collect();
    names.sort();
    names.dedup();
    names
}

fn providers(routes: &[SeedRoute]) -> Vec<String> {
    let mut names: Vec<String> = routes.iter().map(|r| r.provider.to_string()).collect();
    names.sort();
    names.dedup();
    names
}

async fn list_districts(State(db): State<Db>) -> Json<Vec<String>> {
    Json(districts(&db.routes))
}

async fn list_providers(State(db): State<Db>) -> Json<Vec<String>> {
    Json(providers(&db.routes))
}

async fn answer_query(State(db): State<Db>, Json(body): Json<QueryBody>) -> Json<QueryReply> {
    let query = body.query.to_lowercase();

    // Two district names in the question means a route search; their order
    // of appearance decides the direction.
    let mut mentioned: Vec<(usize, String)> = districts(&db.routes)
        .into_iter()
        .filter_map(|d| query.find(&d.to_lowercase()).map(|pos| (pos, d)))
        .collect();
    mentioned.sort_by_key(|(pos, _)| *pos);

    if mentioned.len() >= 2 {
        let from = mentioned[0].1.clone();
        let to = mentioned[1].1.clone();
        let results: Vec<QueryRouteResult> = db
            .routes
            .iter()
            .filter(|r| r.from_district == from && r.to_district == to)
            .map(|r| QueryRouteResult {
                provider: r.provider.to_string(),
                price: r.price,
                dropping_point: Some(r.dropping_point.to_string()),
            })
            .collect();
        let answer = format!("Found {} buses from {from} to {to}", results.len());
        return Json(QueryReply {
            answer,
            query_type: "route_search".to_string(),
            results,
            providers: Vec::new(),
            from: Some(from),
            to: Some(to),
        });
    }

    if query.contains("provider") || query.contains("compan") {
        let names = providers(&db.routes);
        let answer = format!("We work with {} providers: {}", names.len(), names.join(", "));
        return Json(QueryReply {
            answer,
            query_type: "provider_list".to_string(),
            results: Vec::new(),
            providers: names,
            from: None,
            to: None,
        });
    }

    Json(QueryReply {
        answer: "I can help you search routes, book tickets and cancel bookings.".to_string(),
        query_type: "general".to_string(),
        results: Vec::new(),
        providers: Vec::new(),
        from: None,
        to: None,
    })
}
