use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod title;

pub use title::Title;

/// A single ranked recommendation returned to the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub name: String,
    pub image_url: String,
    pub score: f32,
}

/// Request body for the recommendations endpoint
#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    pub title: String,
}

/// Response for the recommendations endpoint, ordered by descending score
#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub query: String,
    pub recommendations: Vec<Recommendation>,
}

/// Summary of the loaded catalog
#[derive(Debug, Serialize, Deserialize)]
pub struct CatalogSummary {
    pub titles: usize,
    pub loaded_at: DateTime<Utc>,
}

// ============================================================================
// MyAnimeList API Types
// ============================================================================

/// Response from GET /anime?q=...&limit=1
#[derive(Debug, Clone, Deserialize)]
pub struct MalSearchResponse {
    #[serde(default)]
    pub data: Vec<MalSearchEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MalSearchEntry {
    pub node: MalAnimeNode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MalAnimeNode {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub main_picture: Option<MalPicture>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MalPicture {
    #[serde(default)]
    pub medium: Option<String>,
    #[serde(default)]
    pub large: Option<String>,
}

impl MalSearchResponse {
    /// Thumbnail of the first result, preferring the medium size
    pub fn thumbnail(self) -> Option<String> {
        let picture = self.data.into_iter().next()?.node.main_picture?;
        picture.medium.or(picture.large)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thumbnail_medium() {
        let json = r#"{
            "data": [
                {
                    "node": {
                        "id": 1,
                        "title": "Cowboy Bebop",
                        "main_picture": {
                            "medium": "https://cdn.myanimelist.net/images/anime/4/19644.jpg",
                            "large": "https://cdn.myanimelist.net/images/anime/4/19644l.jpg"
                        }
                    }
                }
            ]
        }"#;

        let response: MalSearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            response.thumbnail(),
            Some("https://cdn.myanimelist.net/images/anime/4/19644.jpg".to_string())
        );
    }

    #[test]
    fn test_thumbnail_large_only() {
        let json = r#"{"data": [{"node": {"id": 1, "main_picture": {"large": "https://l.jpg"}}}]}"#;
        let response: MalSearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.thumbnail(), Some("https://l.jpg".to_string()));
    }

    #[test]
    fn test_thumbnail_missing_picture() {
        let json = r#"{"data": [{"node": {"id": 1, "title": "Obscure OVA"}}]}"#;
        let response: MalSearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.thumbnail(), None);
    }

    #[test]
    fn test_thumbnail_empty_data() {
        let response: MalSearchResponse = serde_json::from_str(r#"{"data": []}"#).unwrap();
        assert_eq!(response.thumbnail(), None);
    }

    #[test]
    fn test_thumbnail_missing_data_field() {
        let response: MalSearchResponse = serde_json::from_str(r#"{"paging": {}}"#).unwrap();
        assert_eq!(response.thumbnail(), None);
    }

    #[test]
    fn test_recommendation_serialization() {
        let rec = Recommendation {
            name: "Naruto".to_string(),
            image_url: "https://img/naruto.jpg".to_string(),
            score: 0.5,
        };
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["name"], "Naruto");
        assert_eq!(json["image_url"], "https://img/naruto.jpg");
        assert_eq!(json["score"], 0.5);
    }
}
