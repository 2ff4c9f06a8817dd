//! Recommendation mailbox.
//!
//! A recommendation is delivered unread to a friend's mailbox, may be marked
//! read, and is removed either by the recipient or by cleanup. Listing is
//! side-effect free; read records are only removed by [`purge_read`] or the
//! background sweeper.
//!
//! [`purge_read`]: RecommendationService::purge_read

use chrono::{DateTime, Utc};
use std::{collections::HashMap, sync::Arc};
use uuid::Uuid;

use crate::{
    db::RecommendationRepository,
    error::{AppError, AppResult},
    models::{IncomingRecommendation, Recommendation, RecommendedItem, UserId},
    services::users::UserService,
};

#[derive(Clone)]
pub struct RecommendationService {
    recommendations: Arc<dyn RecommendationRepository>,
    directory: UserService,
}

impl RecommendationService {
    pub fn new(recommendations: Arc<dyn RecommendationRepository>, directory: UserService) -> Self {
        Self {
            recommendations,
            directory,
        }
    }

    pub async fn recommend(
        &self,
        from: UserId,
        to: UserId,
        item: RecommendedItem,
        note: Option<String>,
    ) -> AppResult<Recommendation> {
        if item.is_empty() {
            return Err(AppError::InvalidInput(
                "A show or movie id is required".to_string(),
            ));
        }
        if !self.directory.exists(to).await? {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        if !self.directory.are_friends(from, to).await? {
            return Err(AppError::Forbidden(
                "You can only recommend to friends".to_string(),
            ));
        }

        let note = note.filter(|n| !n.trim().is_empty());
        let rec = self
            .recommendations
            .insert_recommendation(Recommendation::new(from, to, item, note))
            .await?;

        tracing::info!(recommendation_id = %rec.id, %from, %to, "Recommendation sent");
        Ok(rec)
    }

    /// Mailbox of `user`, newest first, with each sender's profile
    pub async fn incoming(&self, user: UserId) -> AppResult<Vec<IncomingRecommendation>> {
        let recommendations = self.recommendations.recommendations_to(user).await?;

        let senders: Vec<UserId> = recommendations.iter().map(|r| r.from).collect();
        let profiles: HashMap<UserId, _> = self
            .directory
            .profiles(&senders)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        Ok(recommendations
            .into_iter()
            .map(|recommendation| IncomingRecommendation {
                sender: profiles.get(&recommendation.from).cloned(),
                recommendation,
            })
            .collect())
    }

    pub async fn mark_read(&self, id: Uuid, caller: UserId) -> AppResult<Recommendation> {
        self.owned_by(id, caller).await?;
        self.recommendations
            .mark_recommendation_read(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Recommendation not found".to_string()))
    }

    pub async fn delete(&self, id: Uuid, caller: UserId) -> AppResult<()> {
        self.owned_by(id, caller).await?;
        if !self.recommendations.delete_recommendation(id).await? {
            return Err(AppError::NotFound("Recommendation not found".to_string()));
        }
        tracing::info!(recommendation_id = %id, to = %caller, "Recommendation deleted");
        Ok(())
    }

    /// Deletes every read recommendation in the caller's mailbox
    pub async fn purge_read(&self, caller: UserId) -> AppResult<u64> {
        let deleted = self
            .recommendations
            .delete_read_recommendations_to(caller)
            .await?;
        tracing::info!(to = %caller, deleted, "Read recommendations purged");
        Ok(deleted)
    }

    /// Deletes read recommendations that were read before `cutoff`
    pub async fn sweep(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        self.recommendations
            .delete_read_recommendations_before(cutoff)
            .await
    }

    async fn owned_by(&self, id: Uuid, caller: UserId) -> AppResult<Recommendation> {
        let rec = self
            .recommendations
            .find_recommendation(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Recommendation not found".to_string()))?;
        if rec.to != caller {
            return Err(AppError::Forbidden(
                "Not the recipient of this recommendation".to_string(),
            ));
        }
        Ok(rec)
    }
}
