use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{PublicProfile, UserId};

/// Catalog item referenced by a recommendation; a show, a movie, or both
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedItem {
    pub show_id: Option<String>,
    pub show_name: Option<String>,
    pub movie_id: Option<String>,
    pub movie_name: Option<String>,
    pub image: Option<serde_json::Value>,
}

impl RecommendedItem {
    /// True when neither a show nor a movie id is present
    pub fn is_empty(&self) -> bool {
        fn blank(id: &Option<String>) -> bool {
            id.as_deref().map_or(true, |s| s.trim().is_empty())
        }
        blank(&self.show_id) && blank(&self.movie_id)
    }
}

/// A one-way suggestion from `from` to `to`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub id: Uuid,
    pub from: UserId,
    pub to: UserId,
    #[serde(flatten)]
    pub item: RecommendedItem,
    pub note: Option<String>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl Recommendation {
    pub fn new(from: UserId, to: UserId, item: RecommendedItem, note: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            from,
            to,
            item,
            note,
            read: false,
            created_at: Utc::now(),
            read_at: None,
        }
    }
}

/// Incoming recommendation with the sender's public profile
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IncomingRecommendation {
    #[serde(flatten)]
    pub recommendation: Recommendation,
    pub sender: Option<PublicProfile>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_without_ids_is_empty() {
        let item = RecommendedItem {
            show_name: Some("X12".to_string()),
            ..Default::default()
        };
        assert!(item.is_empty());

        let blank = RecommendedItem {
            show_id: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(blank.is_empty());
    }

    #[test]
    fn test_item_with_movie_id_is_not_empty() {
        let item = RecommendedItem {
            movie_id: Some("603".to_string()),
            ..Default::default()
        };
        assert!(!item.is_empty());
    }

    #[test]
    fn test_recommendation_serializes_flat_camel_case() {
        let rec = Recommendation::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            RecommendedItem {
                show_id: Some("12".to_string()),
                show_name: Some("X12".to_string()),
                ..Default::default()
            },
            Some("watch this!".to_string()),
        );

        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["showName"], "X12");
        assert_eq!(json["note"], "watch this!");
        assert_eq!(json["read"], false);
    }
}
