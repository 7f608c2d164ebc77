use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::admission::AdmissionController;
use crate::auth::ApiKeys;
use crate::club::Club;
use crate::directory::Directory;
use crate::error::ClubsResult;
use crate::response::HealthResponse;
use crate::validation::RequestValidator;

/// Shared application state
pub type SharedState = Arc<AppState>;

/// Application state. Each component synchronizes itself.
pub struct AppState {
    pub directory: Arc<Directory>,
    pub admission: AdmissionController,
    pub api_keys: ApiKeys,
}

#[derive(Debug, Deserialize)]
pub struct NationQuery {
    pub nation: Option<String>,
}

/// List every club
pub async fn list_clubs(State(state): State<SharedState>) -> ClubsResult<Json<Vec<Club>>> {
    Ok(Json(state.directory.list()?))
}

/// Create a club from a `{name, nation}` body
pub async fn create_club(
    State(state): State<SharedState>,
    body: Bytes,
) -> ClubsResult<impl IntoResponse> {
    let new = RequestValidator::validate_create_club_request(&body)?;
    let club = state.directory.create(&new.name, &new.nation)?;

    tracing::info!(id = %club.id, name = %club.name, nation = %club.nation, "Created club");
    Ok((StatusCode::CREATED, Json(club)))
}

/// Delete a club. Absent ids still succeed.
pub async fn delete_club(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ClubsResult<StatusCode> {
    match state.directory.delete(&id)? {
        Some(club) => tracing::info!(id = %club.id, "Deleted club"),
        None => tracing::debug!(id = %id, "Delete of absent club"),
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Clubs of one nation, read through the nation index
pub async fn filter_by_nation(
    State(state): State<SharedState>,
    query: Result<Query<NationQuery>, QueryRejection>,
) -> ClubsResult<Json<Vec<Club>>> {
    let Query(query) = query?;
    let nation = RequestValidator::validate_nation_param(query.nation.as_deref())?;
    Ok(Json(state.directory.by_nation(&nation)?))
}

/// Health check endpoint
pub async fn health_check(State(state): State<SharedState>) -> impl IntoResponse {
    Json(HealthResponse::healthy(
        state.directory.len(),
        state.directory.index_pending(),
        state.admission.tracked_keys(),
    ))
}
