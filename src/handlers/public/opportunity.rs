use axum::extract::{Path, State};
use axum::Json;

use crate::database::bounded;
use crate::database::models::{Opportunity, OpportunityId};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// GET /opportunity/:id - Fetch a single opportunity by id
///
/// Unauthenticated. A malformed id is a 400, an unknown id a 404.
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Opportunity>> {
    let id: OpportunityId = id.parse()?;

    let found = bounded(state.config.request_timeout(), state.opportunities.find_one(id)).await?;

    found
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("No opportunity with id : {} was found.", id)))
}
