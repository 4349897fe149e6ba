use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::{Floor, MatchupMatrix, PlayRateEntry, WinRateEntry};
use crate::query::{query_matchups, query_play_rates, query_win_rates, QueryError};

// ── Types ────────────────────────────────────────────────────────

/// Horizontal bar series with error bars.
#[derive(Debug, Serialize)]
pub struct WinRateSeries {
    pub y: Vec<String>,
    pub x: Vec<f64>,
    pub error_x: Vec<f64>,
}

/// Pie series.
#[derive(Debug, Serialize)]
pub struct PlayRateSeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

/// Annotated heatmap. Rows run bottom to top, so `y` and `z` are reversed
/// relative to roster order.
#[derive(Debug, Serialize)]
pub struct MatchupHeatmap {
    pub x: Vec<String>,
    pub y: Vec<String>,
    pub z: Vec<Vec<f64>>,
    /// `z` on a 0-10 scale, one decimal
    pub annotations: Vec<Vec<f64>>,
}

#[derive(Debug, Serialize)]
pub struct StatsPayload {
    pub floor: Floor,
    pub label: String,
    pub win_rates: WinRateSeries,
    pub play_rates: PlayRateSeries,
    pub matchups: MatchupHeatmap,
}

#[derive(Debug, Serialize)]
pub struct FloorInfo {
    pub code: u8,
    pub label: String,
}

// ── Presentation ─────────────────────────────────────────────────

fn win_rate_series(entries: Vec<WinRateEntry>) -> WinRateSeries {
    let mut series = WinRateSeries {
        y: Vec::with_capacity(entries.len()),
        x: Vec::with_capacity(entries.len()),
        error_x: Vec::with_capacity(entries.len()),
    };
    for entry in entries {
        series.y.push(entry.character);
        series.x.push(entry.win_rate);
        series.error_x.push(entry.confidence);
    }
    series
}

fn play_rate_series(entries: Vec<PlayRateEntry>) -> PlayRateSeries {
    let (labels, values) = entries
        .into_iter()
        .map(|e| (e.character, e.play_rate))
        .unzip();
    PlayRateSeries { labels, values }
}

fn annotate(rate: f64) -> f64 {
    (rate * 100.0).round() / 10.0
}

fn matchup_heatmap(matrix: MatchupMatrix) -> MatchupHeatmap {
    let x = matrix.characters.clone();
    let y = matrix.characters.into_iter().rev().collect();
    let z: Vec<Vec<f64>> = matrix.cells.into_iter().rev().collect();
    let annotations = z
        .iter()
        .map(|row| row.iter().copied().map(annotate).collect())
        .collect();
    MatchupHeatmap {
        x,
        y,
        z,
        annotations,
    }
}

// ── Handlers ─────────────────────────────────────────────────────

pub async fn all_stats(
    State(state): State<AppState>,
    Path(raw_floor): Path<String>,
) -> Result<Json<StatsPayload>, ApiError> {
    let floor: Floor = raw_floor.parse().map_err(QueryError::from)?;
    let store = state.tables.as_ref();

    let win_rates = query_win_rates(store, &raw_floor)?;
    let play_rates = query_play_rates(store, &raw_floor)?;
    let matchups = query_matchups(store, &raw_floor)?;

    Ok(Json(StatsPayload {
        floor,
        label: floor.label(),
        win_rates: win_rate_series(win_rates),
        play_rates: play_rate_series(play_rates),
        matchups: matchup_heatmap(matchups),
    }))
}

pub async fn floors() -> Json<Vec<FloorInfo>> {
    Json(
        Floor::all()
            .into_iter()
            .map(|f| FloorInfo {
                code: f.code(),
                label: f.label(),
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::routes::test_support::*;
    use crate::calculate::aggregate;
    use crate::models::{Character, CleanedMatch};
    use crate::refresh::test_support::FailingSource;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::util::ServiceExt;

    fn win(f: u8, winner: &str, loser: &str) -> CleanedMatch {
        CleanedMatch::won(
            Floor::from_code(f).unwrap(),
            Character::from_name(winner).unwrap(),
            Character::from_name(loser).unwrap(),
        )
    }

    fn built_state(dir: &std::path::Path) -> AppState {
        let state = setup_test_state(dir, Arc::new(FailingSource));
        let matches = [
            win(3, "Sol", "Ky"),
            win(3, "Sol", "Ky"),
            win(3, "Ky", "Sol"),
            win(99, "Baiken", "Testament"),
        ];
        state
            .tables
            .write_tables(&aggregate(&matches).into_batch())
            .unwrap();
        state
    }

    #[test]
    fn test_annotate_scale() {
        assert_eq!(annotate(2.0 / 3.0), 6.7);
        assert_eq!(annotate(1.0), 10.0);
        assert_eq!(annotate(0.0), 0.0);
    }

    #[test]
    fn test_matchup_heatmap_reverses_rows() {
        let matrix = MatchupMatrix {
            characters: vec!["A".to_string(), "B".to_string()],
            cells: vec![vec![0.0, 0.25], vec![0.75, 0.0]],
        };
        let heatmap = matchup_heatmap(matrix);

        assert_eq!(heatmap.x, vec!["A", "B"]);
        assert_eq!(heatmap.y, vec!["B", "A"]);
        assert_eq!(heatmap.z, vec![vec![0.75, 0.0], vec![0.0, 0.25]]);
        assert_eq!(heatmap.annotations, vec![vec![7.5, 0.0], vec![0.0, 2.5]]);
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        let tmp = tempfile::tempdir().unwrap();
        let app = app(built_state(tmp.path()));

        let (status, json) = get_json(app, "/stats/all/3").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["floor"], 3);
        assert_eq!(json["label"], "Floor 3");

        let names = json["win_rates"]["y"].as_array().unwrap();
        assert_eq!(names.len(), Character::COUNT);
        assert_eq!(names[names.len() - 1], "Sol");
        assert_eq!(names[names.len() - 2], "Ky");
        assert_eq!(json["win_rates"]["x"].as_array().unwrap().len(), Character::COUNT);
        assert_eq!(json["win_rates"]["error_x"].as_array().unwrap().len(), Character::COUNT);

        let labels = json["play_rates"]["labels"].as_array().unwrap();
        assert_eq!(labels.len(), Character::COUNT);
        assert_eq!(json["play_rates"]["values"][Character::COUNT - 1], 0.5);

        let heatmap = &json["matchups"];
        assert_eq!(heatmap["x"][0], "Sol");
        assert_eq!(heatmap["y"][0], "Bridget");
        assert_eq!(heatmap["y"][Character::COUNT - 1], "Sol");
        // Last heatmap row is Sol's, second column is Ky
        assert_eq!(heatmap["annotations"][Character::COUNT - 1][1], 6.7);
        assert_eq!(heatmap["z"][Character::COUNT - 1][0], 0.0);
    }

    #[tokio::test]
    async fn test_stats_celestial_by_name() {
        let tmp = tempfile::tempdir().unwrap();
        let app = app(built_state(tmp.path()));

        let (status, json) = get_json(app, "/stats/all/celestial").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["floor"], 99);
        assert_eq!(json["label"], "Celestial");
    }

    #[tokio::test]
    async fn test_stats_unknown_floor() {
        let tmp = tempfile::tempdir().unwrap();
        let app = app(built_state(tmp.path()));

        let (status, json) = get_json(app, "/stats/all/999").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "UNKNOWN_FLOOR");
    }

    #[tokio::test]
    async fn test_stats_not_ready() {
        let tmp = tempfile::tempdir().unwrap();
        let app = app(setup_test_state(tmp.path(), Arc::new(FailingSource)));

        let (status, json) = get_json(app, "/stats/all/1").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["error"]["code"], "NOT_READY");
    }

    #[tokio::test]
    async fn test_floors_endpoint() {
        let tmp = tempfile::tempdir().unwrap();
        let app = app(setup_test_state(tmp.path(), Arc::new(FailingSource)));

        let (status, json) = get_json(app, "/floors").await;

        assert_eq!(status, StatusCode::OK);
        let floors = json.as_array().unwrap();
        assert_eq!(floors.len(), 11);
        assert_eq!(floors[0]["code"], 1);
        assert_eq!(floors[0]["label"], "Floor 1");
        assert_eq!(floors[10]["code"], 99);
        assert_eq!(floors[10]["label"], "Celestial");
    }

    #[tokio::test]
    async fn test_cors_header_present() {
        let tmp = tempfile::tempdir().unwrap();
        let app = app(built_state(tmp.path()));

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/stats/all/3")
                    .header("origin", "https://dashboard.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()
                .get("access-control-allow-origin")
                .map(|v| v.to_str().unwrap()),
            Some("*")
        );
    }
}
