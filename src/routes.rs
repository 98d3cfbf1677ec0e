use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};

use crate::{
    AppState,
    error::AppResult,
    extract::{ValidJson, ValidPath},
    repository::{self, Links, Movies, Ratings, Resource, Tags},
};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(resource::<Movies>())
        .merge(resource::<Links>())
        .merge(resource::<Ratings>())
        .merge(resource::<Tags>())
        .with_state(state)
}

fn resource<R: Resource>() -> Router<Arc<AppState>> {
    let item = format!("{}/{{key}}", R::PATH);
    Router::new()
        .route(R::PATH, get(list::<R>).post(create::<R>))
        .route(&item, get(fetch::<R>).put(update::<R>).delete(remove::<R>))
}

async fn list<R: Resource>(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<R::Output>>> {
    Ok(Json(repository::list::<R>(&state.store).await?))
}

async fn create<R: Resource>(
    State(state): State<Arc<AppState>>,
    ValidJson(input): ValidJson<R::Input>,
) -> AppResult<(StatusCode, Json<R::Output>)> {
    let created = repository::create::<R>(&state.store, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn fetch<R: Resource>(
    State(state): State<Arc<AppState>>,
    ValidPath(key): ValidPath<R::Key>,
) -> AppResult<Json<R::Output>> {
    Ok(Json(repository::get::<R>(&state.store, key).await?))
}

async fn update<R: Resource>(
    State(state): State<Arc<AppState>>,
    ValidPath(key): ValidPath<R::Key>,
    ValidJson(input): ValidJson<R::Input>,
) -> AppResult<Json<R::Output>> {
    Ok(Json(repository::update::<R>(&state.store, key, input).await?))
}

async fn remove<R: Resource>(
    State(state): State<Arc<AppState>>,
    ValidPath(key): ValidPath<R::Key>,
) -> AppResult<StatusCode> {
    repository::delete::<R>(&state.store, key).await?;
    Ok(StatusCode::NO_CONTENT)
}
