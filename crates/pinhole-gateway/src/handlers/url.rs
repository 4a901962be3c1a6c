use crate::error::{AppError, Result};
use crate::model::{
    BatchShortenItem, BatchShortenResult, DeleteUserUrlsRequest, ErrorResponse, ShortenRequest,
    ShortenResponse, UserUrlResponse,
};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use pinhole_shortener::{BatchItem, Resolution};

/// Pulls the opaque, already-authenticated user id out of the request
/// headers. Identity resolution happens upstream.
fn user_id(headers: &HeaderMap) -> Result<String> {
    let value = headers.get("x-user-id").ok_or(AppError::MissingUserId)?;
    let user_id = value.to_str().map_err(|_| AppError::MissingUserId)?;

    if user_id.is_empty() {
        return Err(AppError::MissingUserId);
    }

    Ok(user_id.to_owned())
}

/// `POST /api/shorten`. 201 for a fresh mapping, 409 when the URL was
/// already shortened; both carry the mapping in the body.
pub async fn create_url_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ShortenRequest>,
) -> Result<Response> {
    let user_id = user_id(&headers)?;
    let created = state.service().create(&request.url, &user_id).await?;

    let status = if created.existed {
        StatusCode::CONFLICT
    } else {
        StatusCode::CREATED
    };

    Ok((
        status,
        Json(ShortenResponse {
            short_id: created.short_id,
            short_url: created.short_url,
        }),
    )
        .into_response())
}

/// `POST /api/shorten/batch`. 201 with one result per accepted item;
/// invalid items are skipped rather than failing the batch, and an item
/// whose URL is already shortened gets the existing mapping.
pub async fn create_url_batch_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<Vec<BatchShortenItem>>,
) -> Result<Response> {
    let user_id = user_id(&headers)?;

    let items = request
        .into_iter()
        .map(|item| BatchItem {
            correlation_id: item.correlation_id,
            original_url: item.original_url,
        })
        .collect();

    let results: Vec<_> = state
        .service()
        .create_batch(items, &user_id)
        .await?
        .into_iter()
        .map(|result| BatchShortenResult {
            correlation_id: result.correlation_id,
            short_url: result.short_url,
        })
        .collect();

    Ok((StatusCode::CREATED, Json(results)).into_response())
}

/// `GET /{short_id}`. 307 to the original URL; 410 for a deleted
/// mapping; 404 for an id that never existed.
pub async fn redirect_handler(
    Path(short_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Response> {
    match state.service().resolve(&short_id).await? {
        Resolution::Found(original_url) => Ok(Redirect::temporary(&original_url).into_response()),
        Resolution::Gone => Ok((
            StatusCode::GONE,
            Json(ErrorResponse {
                error: format!("short url deleted: {short_id}"),
            }),
        )
            .into_response()),
        Resolution::NotFound => Ok((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("short url not found: {short_id}"),
            }),
        )
            .into_response()),
    }
}

/// `GET /api/user/urls`. 204 when the caller owns nothing.
pub async fn user_urls_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response> {
    let user_id = user_id(&headers)?;
    let urls = state.service().user_urls(&user_id).await?;

    if urls.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let urls: Vec<_> = urls
        .into_iter()
        .map(|u| UserUrlResponse {
            short_id: u.short_id,
            short_url: u.short_url,
            original_url: u.original_url,
        })
        .collect();

    Ok(Json(urls).into_response())
}

/// `DELETE /api/user/urls`. 202: the batch is accepted, not applied;
/// deletion is asynchronous and best-effort.
pub async fn delete_user_urls_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<DeleteUserUrlsRequest>,
) -> Result<StatusCode> {
    let user_id = user_id(&headers)?;
    state
        .service()
        .delete_user_urls(&user_id, request.short_ids)?;

    Ok(StatusCode::ACCEPTED)
}
