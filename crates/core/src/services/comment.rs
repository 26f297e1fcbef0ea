//! Tutorial comment service.

use std::collections::HashMap;

use serde::Serialize;
use tracing::info;
use tutorhub_common::{AppError, AppResult, AuthContext, IdGenerator};
use tutorhub_db::{
    entities::tutorial_comment,
    repositories::{CommentRepository, ProfileRepository},
};

use super::profile::ProfileResponse;

/// Maximum comment length in characters, after trimming.
pub const MAX_COMMENT_LENGTH: usize = 2000;

/// Response for a comment, with its author.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: String,
    pub tutorial_id: String,
    pub user_id: String,
    pub content: String,
    pub created_at: String,
    pub author: Option<ProfileResponse>,
}

impl From<tutorial_comment::Model> for CommentResponse {
    fn from(c: tutorial_comment::Model) -> Self {
        Self {
            id: c.id,
            tutorial_id: c.tutorial_id,
            user_id: c.user_id,
            content: c.content,
            created_at: c.created_at.to_rfc3339(),
            author: None,
        }
    }
}

/// Service for tutorial comments.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    profile_repo: ProfileRepository,
    id_gen: IdGenerator,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub const fn new(comment_repo: CommentRepository, profile_repo: ProfileRepository) -> Self {
        Self {
            comment_repo,
            profile_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Comment on a tutorial as the caller.
    pub async fn create(
        &self,
        ctx: &AuthContext,
        tutorial_id: &str,
        content: &str,
    ) -> AppResult<CommentResponse> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::Validation("Comment cannot be empty".to_string()));
        }
        if content.chars().count() > MAX_COMMENT_LENGTH {
            return Err(AppError::Validation(format!(
                "Comment cannot exceed {MAX_COMMENT_LENGTH} characters"
            )));
        }

        let comment = self
            .comment_repo
            .create(ctx, &self.id_gen.generate(), tutorial_id, content)
            .await?;
        info!(comment_id = %comment.id, tutorial_id = %tutorial_id, "Created comment");

        let author = self.profile_repo.find_by_id(&comment.user_id).await?;
        let mut response = CommentResponse::from(comment);
        response.author = author.map(Into::into);
        Ok(response)
    }

    /// Delete one of the caller's comments.
    pub async fn delete(&self, ctx: &AuthContext, comment_id: &str) -> AppResult<()> {
        self.comment_repo.delete(ctx, comment_id).await
    }

    /// Comments on a tutorial, oldest first, with authors.
    pub async fn list(
        &self,
        tutorial_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<CommentResponse>> {
        let comments = self
            .comment_repo
            .find_by_tutorial(tutorial_id, limit, offset)
            .await?;

        let mut author_ids: Vec<String> = comments.iter().map(|c| c.user_id.clone()).collect();
        author_ids.sort();
        author_ids.dedup();

        let authors: HashMap<String, ProfileResponse> = self
            .profile_repo
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|p| (p.id.clone(), p.into()))
            .collect();

        Ok(comments
            .into_iter()
            .map(|c| {
                let author = authors.get(&c.user_id).cloned();
                let mut response = CommentResponse::from(c);
                response.author = author;
                response
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tutorhub_db::test_utils::{TestDatabase, seed_identity, seed_tutorial};

    async fn service() -> CommentService {
        let db = TestDatabase::in_memory().await.unwrap();
        let conn = Arc::new(db.conn);
        seed_identity(conn.as_ref(), "alice", "Alice").await.unwrap();
        seed_identity(conn.as_ref(), "bob", "Bob").await.unwrap();
        seed_tutorial(conn.as_ref(), "t1", "alice").await.unwrap();
        CommentService::new(
            CommentRepository::new(Arc::clone(&conn)),
            ProfileRepository::new(conn),
        )
    }

    #[tokio::test]
    async fn test_create_trims_and_attaches_author() {
        let service = service().await;
        let bob = AuthContext::new("bob", "t");

        let comment = service.create(&bob, "t1", "  Great tutorial!  ").await.unwrap();
        assert_eq!(comment.content, "Great tutorial!");
        assert_eq!(comment.author.unwrap().full_name, "Bob");
    }

    #[tokio::test]
    async fn test_create_rejects_blank_and_oversize() {
        let service = service().await;
        let bob = AuthContext::new("bob", "t");

        assert!(matches!(
            service.create(&bob, "t1", "   ").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service.create(&bob, "t1", &"x".repeat(MAX_COMMENT_LENGTH + 1)).await,
            Err(AppError::Validation(_))
        ));
        assert!(service.list("t1", 10, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_oldest_first_with_authors() {
        let service = service().await;
        let alice = AuthContext::new("alice", "t");
        let bob = AuthContext::new("bob", "t");

        service.create(&bob, "t1", "first").await.unwrap();
        service.create(&alice, "t1", "second").await.unwrap();

        let comments = service.list("t1", 10, 0).await.unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].content, "first");
        assert_eq!(comments[0].author.as_ref().unwrap().full_name, "Bob");
        assert_eq!(comments[1].author.as_ref().unwrap().full_name, "Alice");
    }

    #[tokio::test]
    async fn test_comment_on_missing_tutorial() {
        let service = service().await;
        let result = service
            .create(&AuthContext::new("bob", "t"), "missing", "hello")
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
