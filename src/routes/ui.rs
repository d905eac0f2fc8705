use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use minijinja::{context, Environment};
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::{Recommendation, Title},
    routes::AppState,
};

/// Rendered thumbnail width in pixels
const IMAGE_WIDTH: u32 = 150;
const GRID_COLUMNS: usize = 2;

const INDEX_TEMPLATE_NAME: &str = "index.html";
const INDEX_TEMPLATE: &str = include_str!("../../templates/index.html");

#[derive(Debug, Deserialize)]
pub struct IndexQuery {
    title: Option<String>,
}

/// Interactive page: a title picker and, once submitted, the recommendation grid
pub async fn index(
    State(state): State<Arc<AppState>>,
    Query(params): Query<IndexQuery>,
) -> Response {
    let titles = state.recommender.store().titles();

    let selected = params.title.filter(|t| !t.is_empty());
    let Some(selected) = selected else {
        return into_page(StatusCode::OK, render_page(titles, None, None));
    };

    match state.recommender.recommend(&selected).await {
        Ok(recommendations) => into_page(
            StatusCode::OK,
            render_page(titles, Some(&selected), Some(Ok(recommendations.as_slice()))),
        ),
        Err(AppError::NotFound(message)) => into_page(
            StatusCode::NOT_FOUND,
            render_page(titles, Some(&selected), Some(Err(message.as_str()))),
        ),
        Err(e) => {
            tracing::error!(error = %e, title = %selected, "Failed to render recommendations");
            e.into_response()
        }
    }
}

fn into_page(status: StatusCode, page: AppResult<String>) -> Response {
    match page {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to render index page");
            e.into_response()
        }
    }
}

fn render_page(
    titles: &[Title],
    selected: Option<&str>,
    outcome: Option<Result<&[Recommendation], &str>>,
) -> AppResult<String> {
    let mut env = Environment::new();
    env.add_template(INDEX_TEMPLATE_NAME, INDEX_TEMPLATE)
        .map_err(|e| AppError::Internal(format!("Invalid page template: {}", e)))?;

    let template = env
        .get_template(INDEX_TEMPLATE_NAME)
        .map_err(|e| AppError::Internal(format!("Page template missing: {}", e)))?;

    let names: Vec<&str> = titles.iter().map(|t| t.title.as_str()).collect();
    let (rows, error) = match outcome {
        Some(Ok(recommendations)) => (
            Some(recommendations.chunks(GRID_COLUMNS).collect::<Vec<_>>()),
            None,
        ),
        Some(Err(message)) => (None, Some(message)),
        None => (None, None),
    };

    template
        .render(context!(
            titles => names,
            selected => selected,
            rows => rows,
            error => error,
            image_width => IMAGE_WIDTH
        ))
        .map_err(|e| AppError::Internal(format!("Failed to render page: {}", e)))
}
