use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use serde_json::{json, Value};

use crate::database::bounded;
use crate::database::models::{Opportunity, OpportunityId, OpportunityInput};
use crate::error::{ApiError, ApiResult};
use crate::middleware::Session;
use crate::state::AppState;

/// GET /opportunities/:userid - List every opportunity owned by the session user
pub async fn list(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(userid): Path<String>,
) -> ApiResult<Json<Vec<Opportunity>>> {
    let owner = session.authorize_owner(&userid)?;
    list_for(&state, owner).await
}

/// GET /opportunities - Same as `list`, with the owner taken from the session alone
pub async fn list_mine(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> ApiResult<Json<Vec<Opportunity>>> {
    list_for(&state, &session.user_id).await
}

async fn list_for(state: &AppState, owner: &str) -> ApiResult<Json<Vec<Opportunity>>> {
    let opportunities = bounded(state.config.request_timeout(), state.opportunities.find_many(owner)).await?;
    Ok(Json(opportunities))
}

/// POST /opportunity/:userid - Create an opportunity
///
/// The id is generated here and the owner is the session user; either one
/// supplied in the body is ignored. Responds with `{"insertedId": ...}`.
pub async fn add(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(userid): Path<String>,
    payload: Result<Json<OpportunityInput>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let owner = session.authorize_owner(&userid)?;
    let Json(input) = payload?;

    let opportunity = Opportunity::from_input(OpportunityId::new(), owner, input);
    let inserted_id = bounded(state.config.request_timeout(), state.opportunities.insert_one(&opportunity)).await?;

    tracing::info!("Opportunity {} created for user {}", inserted_id, owner);
    Ok(Json(json!({ "insertedId": inserted_id })))
}

/// PUT /opportunity - Replace an existing opportunity
///
/// The body is a full record including `id`. An empty `user_id` is taken as
/// the session user; any other owner is refused. Updating a record that does
/// not exist for this owner is a 404 and never creates one.
pub async fn update(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    payload: Result<Json<Opportunity>, JsonRejection>,
) -> ApiResult<Json<Opportunity>> {
    let Json(mut opportunity) = payload?;

    if opportunity.user_id.is_empty() {
        opportunity.user_id = session.user_id.clone();
    }
    session.authorize_owner(&opportunity.user_id)?;

    let matched = bounded(state.config.request_timeout(), state.opportunities.update_one(&opportunity)).await?;
    if matched == 0 {
        return Err(ApiError::not_found(format!(
            "No opportunity with id : {} was found, no update occurred.",
            opportunity.id
        )));
    }

    tracing::info!("Opportunity {} updated", opportunity.id);
    Ok(Json(opportunity))
}

/// DELETE /opportunity/:userid/:id - Delete one opportunity
///
/// Deleting nothing is reported as a 400 naming the id.
pub async fn delete_one(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path((userid, id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let owner = session.authorize_owner(&userid)?;
    let parsed: OpportunityId = id.parse()?;

    let deleted = bounded(state.config.request_timeout(), state.opportunities.delete_one(parsed, owner)).await?;
    if deleted == 0 {
        return Err(ApiError::bad_request(format!(
            "No opportunity with id : {} was found, no deletion occurred.",
            id
        )));
    }

    tracing::info!("Opportunity {} deleted", parsed);
    Ok(Json(json!({
        "success": format!("opportunity with id : {} was deleted successfully.", id)
    })))
}

/// DELETE /opportunities/:userid - Delete every opportunity of the session user
///
/// Idempotent: deleting from an empty list still succeeds.
pub async fn delete_all(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(userid): Path<String>,
) -> ApiResult<Json<Value>> {
    let owner = session.authorize_owner(&userid)?;

    let deleted = bounded(state.config.request_timeout(), state.opportunities.delete_many(owner)).await?;

    tracing::info!("Deleted {} opportunities for user {}", deleted, owner);
    Ok(Json(json!({
        "success": "All opportunities deleted.",
        "deletedCount": deleted
    })))
}
