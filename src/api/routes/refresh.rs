use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::state::AppState;
use crate::refresh::Submitted;

#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    #[serde(default)]
    pub key: String,
}

#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    pub success: bool,
}

/// `POST /update`. The answer never depends on the key, so callers cannot
/// tell whether it matched.
pub async fn update(State(state): State<AppState>, body: Bytes) -> (StatusCode, Json<UpdateResponse>) {
    let key = serde_json::from_slice::<UpdateRequest>(&body)
        .map(|r| r.key)
        .unwrap_or_default();

    if state.refresh_key.verify(&key) {
        match state.refresh.submit() {
            Submitted::Started => debug!("Refresh submitted"),
            Submitted::Coalesced => debug!("Refresh coalesced into running one"),
        }
    } else {
        debug!("Refresh trigger ignored");
    }

    (StatusCode::ACCEPTED, Json(UpdateResponse { success: true }))
}
