//! HTTP binding for the controller
//!
//! | method | path | result |
//! |---|---|---|
//! | `POST` | `/{version}/data-products` | 201 + record |
//! | `GET` | `/{version}/data-products/{id}` | 200 + record |
//! | `PUT` | `/{version}/data-products/{id}` | 200 + record |
//! | `DELETE` | `/{version}/data-products/{id}` | 204 |
//! | `GET` | `/health`, `/ready` | probes |
//!
//! The version segment is passed to the controller as-is; an unknown version is
//! rejected by the strategy factory, not by routing.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::error::{Error, Result};
use crate::health::{health, readiness};
use crate::middleware::deprecation_headers;
use crate::model::{DataProductDto, DataProductId};
use crate::state::AppState;

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/{version}/data-products", post(create))
        .route(
            "/{version}/data-products/{id}",
            get(fetch).put(update).delete(remove),
        )
        .route("/health", get(health))
        .route("/ready", get(readiness))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            deprecation_headers,
        ))
        .with_state(state)
}

fn parse_id(raw: &str) -> Result<DataProductId> {
    raw.parse()
        .map_err(|_| Error::validation(format!("'{}' is not a valid identifier", raw)))
}

fn body(payload: std::result::Result<Json<DataProductDto>, JsonRejection>) -> Result<DataProductDto> {
    payload
        .map(|Json(dto)| dto)
        .map_err(|rejection| Error::validation(rejection.body_text()))
}

async fn create(
    State(state): State<AppState>,
    Path(version): Path<String>,
    payload: std::result::Result<Json<DataProductDto>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let record = state.controller().create(&version, body(payload)?).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn fetch(
    State(state): State<AppState>,
    Path((version, id)): Path<(String, String)>,
) -> Result<impl IntoResponse> {
    let record = state.controller().get(&version, parse_id(&id)?).await?;
    Ok(Json(record))
}

async fn update(
    State(state): State<AppState>,
    Path((version, id)): Path<(String, String)>,
    payload: std::result::Result<Json<DataProductDto>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let id = parse_id(&id)?;
    let record = state
        .controller()
        .update(&version, id, body(payload)?)
        .await?;
    Ok(Json(record))
}

async fn remove(
    State(state): State<AppState>,
    Path((version, id)): Path<(String, String)>,
) -> Result<StatusCode> {
    state.controller().delete(&version, parse_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}
