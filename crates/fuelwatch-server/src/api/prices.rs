use std::collections::BTreeMap;

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use fuelwatch_core::{rank, Brand, BrandRecord, Payload, Station};
use serde::{Deserialize, Serialize};

use crate::cache::CacheError;
use crate::middleware::RequestId;

use super::{ApiError, AppState};

/// Body accepted by `POST /ingest`.
///
/// Only `byBrand` is required. A missing `at` means now; a missing `ranked`
/// is derived from `byBrand`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct IngestPayload {
    at: Option<DateTime<Utc>>,
    #[serde(default)]
    stations: Vec<Station>,
    by_brand: BTreeMap<Brand, BrandRecord>,
    ranked: Option<Vec<BrandRecord>>,
}

impl IngestPayload {
    fn into_payload(self) -> Payload {
        let ranked = self.ranked.unwrap_or_else(|| rank(&self.by_brand));
        Payload {
            at: self.at.unwrap_or_else(Utc::now),
            stations: self.stations,
            by_brand: self.by_brand,
            ranked,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct IngestAck {
    ok: bool,
    updated: DateTime<Utc>,
}

fn map_cache_error(req_id: &RequestId, error: &CacheError) -> ApiError {
    match error {
        CacheError::InvalidPayload(_) => {
            tracing::warn!(request_id = %req_id.0, error = %error, "ingest rejected");
            ApiError::bad_request(error.to_string())
        }
        CacheError::Refresh(_) => {
            tracing::error!(request_id = %req_id.0, error = %error, "read failed");
            ApiError::internal(error.to_string())
        }
    }
}

pub(super) async fn read_prices(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<Payload>, ApiError> {
    let payload = state
        .cache
        .read()
        .await
        .map_err(|e| map_cache_error(&req_id, &e))?;
    Ok(Json(Payload::clone(&payload)))
}

pub(super) async fn ingest_prices(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<IngestPayload>, JsonRejection>,
) -> Result<Json<IngestAck>, ApiError> {
    let Json(body) = body.map_err(|rejection| {
        tracing::warn!(request_id = %req_id.0, error = %rejection, "malformed ingest body");
        ApiError::bad_request(rejection.body_text())
    })?;

    let updated = state
        .cache
        .ingest(body.into_payload())
        .map_err(|e| map_cache_error(&req_id, &e))?;

    Ok(Json(IngestAck { ok: true, updated }))
}
