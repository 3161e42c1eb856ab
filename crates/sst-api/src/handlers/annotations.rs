//! Latest frame annotations for renderers that poll.

use axum::extract::State;
use axum::Json;
use sst_models::FrameAnnotations;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Draw directives and counts of the most recently processed frame.
pub async fn latest_annotations(State(state): State<AppState>) -> ApiResult<Json<FrameAnnotations>> {
    let latest = state
        .latest_frame()
        .ok_or_else(|| ApiError::not_found("No frame has been processed yet"))?;
    Ok(Json(FrameAnnotations::clone(&latest)))
}
