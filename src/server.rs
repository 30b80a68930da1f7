//! HTTP surface: the prediction page plus a JSON API for the same pipeline.
//!
//! - `GET /` -- form with default values
//! - `POST /predict` -- urlencoded form, re-renders the page with the result
//! - `POST /api/v1/predict` -- JSON in, JSON out
//! - `GET /api/v1/options` -- accepted codes and numeric bounds
//! - `GET /health` -- liveness

use std::collections::HashMap;
use std::sync::Arc;

use askama::Template;
use axum::extract::rejection::{FormRejection, JsonRejection};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::Serialize;
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::error::PredictError;
use crate::model::{ModelMeta, Predictor};
use crate::page::IndexPage;
use crate::present::{DisplayedPrediction, Prediction};
use crate::types::{
    Airport, Carrier, FeatureInput, IntDomain, Season, ARR_CANCELLED, ARR_DIVERTED, ARR_FLIGHTS,
    DELAY_RATE_MAX, DELAY_RATE_MIN, MONTH, TOTAL_DELAY_CAUSES, YEAR,
};

// ---------- Server state ----------

/// Shared by every handler. The predictor is immutable after startup, so
/// cloning the state only bumps reference counts.
#[derive(Clone)]
pub struct AppState {
    predictor: Arc<dyn Predictor>,
    about: Arc<ModelMeta>,
    log_predictions: bool,
}

impl AppState {
    pub fn new(predictor: Arc<dyn Predictor>, about: ModelMeta) -> Self {
        Self {
            predictor,
            about: Arc::new(about),
            log_predictions: false,
        }
    }

    pub fn log_predictions(mut self, enabled: bool) -> Self {
        self.log_predictions = enabled;
        self
    }

    /// Validate, predict, convert. Each call is independent of every other.
    pub fn run(&self, input: &FeatureInput) -> Result<Prediction, PredictError> {
        let features = input.validate()?;
        let minutes = self.predictor.predict(&features)?;

        if self.log_predictions {
            let summary: Vec<String> = features
                .fields()
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect();
            tracing::info!("predict [{}] -> {:.2} min", summary.join(", "), minutes);
        }
        if minutes < 0.0 {
            tracing::warn!(
                carrier = %features.carrier(),
                airport = %features.airport(),
                "model returned negative delay minutes: {:.2}",
                minutes
            );
        }

        Ok(Prediction::from_minutes(minutes))
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/predict", post(predict_form))
        .route("/api/v1/predict", post(predict_json))
        .route("/api/v1/options", get(options))
        .route("/health", get(liveness))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------- Page handlers ----------

fn render(status: StatusCode, page: IndexPage<'_>) -> Response {
    match page.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!("failed to render page: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to render page").into_response()
        }
    }
}

async fn index(State(state): State<AppState>) -> Response {
    render(StatusCode::OK, IndexPage::new(&state.about, &FeatureInput::default()))
}

async fn predict_form(
    State(state): State<AppState>,
    form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> Response {
    let fields = match form {
        Ok(Form(fields)) => fields,
        Err(rejection) => {
            tracing::warn!("rejected form submission: {rejection}");
            let page = IndexPage::new(&state.about, &FeatureInput::default())
                .with_error(rejection.body_text());
            return render(StatusCode::UNPROCESSABLE_ENTITY, page);
        }
    };

    // Controls show exactly what was submitted, even when it fails to parse.
    let page = IndexPage::new(&state.about, &FeatureInput::default()).with_submitted(&fields);
    let outcome = FeatureInput::from_form(&fields)
        .map_err(PredictError::from)
        .and_then(|input| state.run(&input));
    match outcome {
        Ok(prediction) => render(StatusCode::OK, page.with_result(&prediction)),
        Err(e) => {
            tracing::warn!("prediction failed: {e}");
            render(e.status(), page.with_error(e.to_string()))
        }
    }
}

// ---------- JSON API ----------

#[derive(Serialize)]
struct PredictOut {
    minutes: f64,
    hours: f64,
    days: f64,
    display: DisplayedPrediction,
}

type ApiError = (StatusCode, Json<serde_json::Value>);

fn api_error(status: StatusCode, message: impl ToString) -> ApiError {
    (status, Json(json!({ "error": message.to_string() })))
}

async fn predict_json(
    State(state): State<AppState>,
    payload: Result<Json<FeatureInput>, JsonRejection>,
) -> Result<Json<PredictOut>, ApiError> {
    let Json(input) = payload.map_err(|e| api_error(StatusCode::UNPROCESSABLE_ENTITY, e.body_text()))?;

    let prediction = state.run(&input).map_err(|e| {
        tracing::warn!("prediction failed: {e}");
        api_error(e.status(), e)
    })?;

    Ok(Json(PredictOut {
        minutes: prediction.minutes,
        hours: prediction.hours,
        days: prediction.days,
        display: prediction.display(),
    }))
}

#[derive(Serialize)]
struct Options {
    carriers: Vec<&'static str>,
    airports: Vec<&'static str>,
    seasons: Vec<&'static str>,
    numeric: [IntDomain; 6],
    delay_rate: [f64; 2],
}

async fn options() -> Json<Options> {
    Json(Options {
        carriers: Carrier::ALL.iter().map(|c| c.code()).collect(),
        airports: Airport::sorted().into_iter().map(|a| a.code()).collect(),
        seasons: Season::ALL.iter().map(|s| s.code()).collect(),
        numeric: [YEAR, MONTH, ARR_FLIGHTS, ARR_CANCELLED, ARR_DIVERTED, TOTAL_DELAY_CAUSES],
        delay_rate: [DELAY_RATE_MIN, DELAY_RATE_MAX],
    })
}

async fn liveness() -> impl IntoResponse {
    Json(json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
