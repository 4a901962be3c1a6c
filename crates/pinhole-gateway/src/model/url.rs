use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct ShortenRequest {
    pub url: String,
}

#[derive(Serialize, Deserialize)]
pub struct ShortenResponse {
    pub short_id: String,
    pub short_url: String,
}

#[derive(Deserialize)]
pub struct BatchShortenItem {
    /// Opaque caller-chosen id echoed back in the matching result.
    pub correlation_id: String,
    pub original_url: String,
}

#[derive(Serialize, Deserialize)]
pub struct BatchShortenResult {
    pub correlation_id: String,
    pub short_url: String,
}

#[derive(Serialize, Deserialize)]
pub struct UserUrlResponse {
    pub short_id: String,
    pub short_url: String,
    pub original_url: String,
}

#[derive(Serialize, Deserialize)]
pub struct DeleteUserUrlsRequest {
    pub short_ids: Vec<String>,
}

#[derive(Serialize, Deserialize)]
pub struct StatsResponse {
    pub urls: u64,
    pub users: u64,
}

#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
