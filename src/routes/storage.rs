use axum::extract::State;
use axum::{Extension, Json};
use serde_json::{json, Value};

use crate::error::AppError;
use crate::models::user::Principal;
use crate::services::accounting;
use crate::state::AppState;

pub async fn summary(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Value>, AppError> {
    let summary = accounting::compute_storage_summary(&state, &principal).await?;

    Ok(Json(json!({
        "data": {
            "summary": summary,
            "remaining": summary.remaining(),
        },
        "error": null
    })))
}
