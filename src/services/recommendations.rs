use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::Recommendation,
    services::images::ImageResolver,
    store::ArtifactStore,
};

/// Number of recommendations returned per query unless configured otherwise
pub const DEFAULT_RECOMMENDATION_COUNT: usize = 20;

/// Ranks catalog titles by precomputed similarity and attaches images
///
/// Ranking is a stable descending sort of the query's matrix row, so equal
/// scores keep catalog order. The queried title, and any duplicate entry with
/// the same name, is never part of its own result.
pub struct Recommender {
    store: Arc<ArtifactStore>,
    images: Arc<dyn ImageResolver>,
    count: usize,
}

impl Recommender {
    pub fn new(store: Arc<ArtifactStore>, images: Arc<dyn ImageResolver>, count: usize) -> Self {
        Self {
            store,
            images,
            count,
        }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Top catalog indices and scores for `title`, best first
    ///
    /// Performs no network calls.
    pub fn rank(&self, title: &str) -> AppResult<Vec<(usize, f32)>> {
        let index = self
            .store
            .index_of(title)
            .ok_or_else(|| AppError::NotFound(format!("Title '{}' is not in the catalog", title)))?;

        let row = self
            .store
            .row(index)
            .ok_or_else(|| AppError::Internal(format!("No similarity row for index {}", index)))?;

        let mut scored: Vec<(usize, f32)> = row.iter().copied().enumerate().collect();
        // Stable: ties keep catalog order. Scores are finite, checked at load.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        // Duplicate catalog names count as the query too
        Ok(scored
            .into_iter()
            .filter(|(j, _)| *j != index && self.store.title(*j).map_or(true, |t| t.title != title))
            .take(self.count)
            .collect())
    }

    /// Recommendations for `title`, images resolved one at a time
    pub async fn recommend(&self, title: &str) -> AppResult<Vec<Recommendation>> {
        let ranked = self.rank(title)?;

        tracing::info!(
            query = %title,
            results = ranked.len(),
            "Resolving images for recommendations"
        );

        let mut recommendations = Vec::with_capacity(ranked.len());
        for (index, score) in ranked {
            let name = self
                .store
                .title(index)
                .map(|t| t.title.clone())
                .ok_or_else(|| AppError::Internal(format!("No catalog entry at index {}", index)))?;

            let image_url = self.images.resolve(&name).await;

            recommendations.push(Recommendation {
                name,
                image_url,
                score,
            });
        }

        Ok(recommendations)
    }
}
