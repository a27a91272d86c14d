//! Debtor lookup endpoint
//!
//! Phone enrichment runs as a side effect of every lookup. It is best
//! effort: a failed enrichment yields `phone: null` and still returns 200.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::db::debtors::{self, Debtor};
use crate::error::{ApiError, ApiResult};
use crate::types::PhoneEnrichment;
use crate::AppState;

/// Debtor with merged phone enrichment
#[derive(Debug, Serialize)]
pub struct DebtorResponse {
    pub id: i64,
    pub name: String,
    pub identification: String,
    pub debts: BTreeMap<String, f64>,
    pub phone: Option<Vec<String>>,
    pub phone_count: usize,
}

impl DebtorResponse {
    fn new(debtor: Debtor, enrichment: PhoneEnrichment) -> Self {
        Self {
            id: debtor.id,
            name: debtor.name,
            identification: debtor.identification,
            debts: debtor.debts,
            phone: enrichment.phone,
            phone_count: enrichment.phone_count,
        }
    }
}

/// GET /debtors/:id
pub async fn get_debtor(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<DebtorResponse>> {
    if id <= 0 {
        return Err(ApiError::BadRequest(format!("Invalid debtor id: {}", id)));
    }

    let debtor = debtors::load_debtor(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Debtor {}", id)))?;

    let enrichment = state.enricher.enrich(&debtor.identity()).await;
    debug!(debtor_id = id, phone_count = enrichment.phone_count, "Debtor lookup");

    Ok(Json(DebtorResponse::new(debtor, enrichment)))
}

/// Build debtor routes
pub fn debtor_routes() -> Router<AppState> {
    Router::new().route("/debtors/:id", get(get_debtor))
}
