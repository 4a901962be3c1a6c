mod url;

pub use url::{
    BatchShortenItem, BatchShortenResult, DeleteUserUrlsRequest, ErrorResponse, HealthResponse,
    ShortenRequest, ShortenResponse, StatsResponse, UserUrlResponse,
};
