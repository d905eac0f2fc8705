use std::sync::Arc;

use axum::{extract::State, Json};

use crate::{models::CatalogSummary, routes::AppState};

/// Handler listing every catalog title in catalog order
pub async fn list(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    let titles = state
        .recommender
        .store()
        .titles()
        .iter()
        .map(|t| t.title.clone())
        .collect();
    Json(titles)
}

/// Handler describing the loaded catalog
pub async fn summary(State(state): State<Arc<AppState>>) -> Json<CatalogSummary> {
    let store = state.recommender.store();
    Json(CatalogSummary {
        titles: store.len(),
        loaded_at: store.loaded_at(),
    })
}
