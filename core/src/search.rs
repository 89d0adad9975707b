//! Route search and reference-data lookups, plus the free-text query
//! endpoint.
//!
//! Pure read operations feeding the draft-construction step of the booking
//! flow; no state machine of their own. Same `build_*`/`parse_*` split as
//! the booking client.

use serde::Serialize;

use crate::error::ApiError;
use crate::http::{check_status, HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::types::{QueryAnswer, Route, SearchRequest, SearchResponse};

#[derive(Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
}

/// Stateless client for the search and query endpoints.
#[derive(Debug, Clone)]
pub struct SearchClient {
    base_url: String,
}

impl SearchClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Routes between two districts, optionally capped at a maximum price.
    pub fn search<T: Transport>(
        &self,
        transport: &T,
        from_district: &str,
        to_district: &str,
        max_price: Option<u32>,
    ) -> Result<Vec<Route>, ApiError> {
        let request = self.build_search(from_district, to_district, max_price)?;
        let response = transport.execute(request)?;
        Ok(self.parse_search(response)?.routes)
    }

    pub fn districts<T: Transport>(&self, transport: &T) -> Result<Vec<String>, ApiError> {
        let response = transport.execute(self.build_districts())?;
        self.parse_string_list(response)
    }

    pub fn providers<T: Transport>(&self, transport: &T) -> Result<Vec<String>, ApiError> {
        let response = transport.execute(self.build_providers())?;
        self.parse_string_list(response)
    }

    /// Free-text question against the external knowledge service.
    pub fn ask<T: Transport>(&self, transport: &T, query: &str) -> Result<QueryAnswer, ApiError> {
        let request = self.build_query(query)?;
        let response = transport.execute(request)?;
        self.parse_query(response)
    }

    pub fn build_search(
        &self,
        from_district: &str,
        to_district: &str,
        max_price: Option<u32>,
    ) -> Result<HttpRequest, ApiError> {
        if from_district.trim().is_empty() || to_district.trim().is_empty() {
            return Err(ApiError::Validation(
                "both districts are required".to_string(),
            ));
        }
        let body = serde_json::to_string(&SearchRequest {
            from_district: from_district.trim().to_string(),
            to_district: to_district.trim().to_string(),
            max_price,
        })
        .map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}/search", self.base_url),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
        })
    }

    pub fn build_districts(&self) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}/search/districts", self.base_url),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn build_providers(&self) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}/search/providers", self.base_url),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn build_query(&self, query: &str) -> Result<HttpRequest, ApiError> {
        if query.trim().is_empty() {
            return Err(ApiError::Validation("query must not be empty".to_string()));
        }
        let body = serde_json::to_string(&QueryRequest { query: query.trim() })
            .map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}/query", self.base_url),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
        })
    }

    pub fn parse_search(&self, response: HttpResponse) -> Result<SearchResponse, ApiError> {
        check_status(&response, 200)?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    pub fn parse_string_list(&self, response: HttpResponse) -> Result<Vec<String>, ApiError> {
        check_status(&response, 200)?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    pub fn parse_query(&self, response: HttpResponse) -> Result<QueryAnswer, ApiError> {
        check_status(&response, 200)?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> SearchClient {
        SearchClient::new("http://localhost:8000")
    }

    #[test]
    fn build_search_posts_districts_and_cap() {
        let req = client().build_search("Dhaka", "Sylhet", Some(800)).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "http://localhost:8000/search");
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["from_district"], "Dhaka");
        assert_eq!(body["to_district"], "Sylhet");
        assert_eq!(body["max_price"], 800);
    }

    #[test]
    fn build_search_omits_absent_cap() {
        let req = client().build_search("Dhaka", "Sylhet", None).unwrap();
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert!(body.get("max_price").is_none());
    }

    #[test]
    fn build_search_requires_both_districts() {
        let err = client().build_search("Dhaka", "  ", None).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn build_search_sends_a_zero_cap() {
        // A zero cap is valid input; it just matches nothing, since prices
        // are positive. The server decides that, not the client.
        let req = client().build_search("Dhaka", "Sylhet", Some(0)).unwrap();
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["max_price"], 0);
    }

    #[test]
    fn build_reference_lookups() {
        assert_eq!(
            client().build_districts().path,
            "http://localhost:8000/search/districts"
        );
        assert_eq!(
            client().build_providers().path,
            "http://localhost:8000/search/providers"
        );
    }

    #[test]
    fn build_query_rejects_empty_text() {
        let err = client().build_query("   ").unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn parse_search_reads_wrapper() {
        let response = HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: r#"{"routes":[{"provider":"Hanif","from_district":"Dhaka","to_district":"Sylhet","dropping_point":"Sylhet Bus Stand","price":650}],"total":1}"#.to_string(),
        };
        let parsed = client().parse_search(response).unwrap();
        assert_eq!(parsed.total, 1);
        assert_eq!(parsed.routes[0].provider, "Hanif");
    }

    #[test]
    fn parse_query_tolerates_sparse_answer() {
        let response = HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: r#"{"answer":"I can help you find buses.","query_type":"general"}"#.to_string(),
        };
        let answer = client().parse_query(response).unwrap();
        assert_eq!(answer.query_type, "general");
        assert!(answer.results.is_empty());
        assert!(answer.suggested_routes().is_empty());
    }
}
