//! Account assurance handlers

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use tracing::{info, instrument};
use validator::Validate;

use domain_admission::{AssuranceInput, AssuranceResult};

use crate::dto::admission::{AssureAccountRequest, AssureAccountResponse};
use crate::{error::ApiError, AppState};

/// Ensures the episode is linked to an active billing account
///
/// Not-applicable and linked outcomes answer 200; a settlement refusal
/// answers 500 with the procedure's message.
#[instrument(skip_all, fields(episode_id = %episode_id))]
pub async fn assure_account(
    State(state): State<AppState>,
    Path(episode_id): Path<String>,
    payload: Result<Json<AssureAccountRequest>, JsonRejection>,
) -> Result<Json<AssureAccountResponse>, ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    let input = AssuranceInput::from(request);
    let result = state.assurance.assure_account(&episode_id, &input).await?;

    info!(outcome = result.tag(), "Account assurance finished");
    match result {
        AssuranceResult::Failed { message } => Err(ApiError::SettlementFailed(message)),
        other => Ok(Json(AssureAccountResponse::from(&other))),
    }
}
