//! Tutorial repository.

use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
    sea_query::{Expr, Func, LikeExpr},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use tutorhub_common::{AppError, AppResult, AuthContext};

use super::{insert_error, required};
use crate::entities::{
    Tutorial,
    tutorial::{self, Category, Difficulty},
};
use crate::policy::{Operation, Table, authorize};

/// Browse ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TutorialSort {
    /// Most recently created first.
    #[default]
    Newest,
    /// Oldest first.
    Oldest,
    /// Most liked first.
    Popular,
    /// Most enrolled first.
    MostEnrolled,
}

/// Search and filter options for listing tutorials.
#[derive(Debug, Clone, Default)]
pub struct TutorialFilter {
    /// Case-insensitive substring matched against title and description.
    pub query: Option<String>,
    pub category: Option<Category>,
    pub difficulty: Option<Difficulty>,
    /// Restrict to one author.
    pub user_id: Option<String>,
    pub sort: TutorialSort,
    pub limit: u64,
    pub offset: u64,
}

/// Sum of the counters over all of a user's tutorials.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterTotals {
    pub likes: i64,
    pub comments: i64,
    pub enrollments: i64,
}

/// Tutorial repository for database operations.
#[derive(Clone)]
pub struct TutorialRepository {
    db: Arc<DatabaseConnection>,
}

impl TutorialRepository {
    /// Create a new tutorial repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a tutorial by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<tutorial::Model>> {
        Tutorial::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a tutorial by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<tutorial::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tutorial not found: {id}")))
    }

    /// Find tutorials by IDs. Order is unspecified.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<tutorial::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Tutorial::find()
            .filter(tutorial::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Search, filter and sort tutorials.
    pub async fn search(&self, filter: &TutorialFilter) -> AppResult<Vec<tutorial::Model>> {
        apply_sort(filtered(filter), filter.sort)
            .offset(filter.offset)
            .limit(filter.limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Number of tutorials matching a filter, ignoring sort and paging.
    pub async fn count(&self, filter: &TutorialFilter) -> AppResult<u64> {
        filtered(filter)
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Tutorials by an author, newest first.
    pub async fn find_by_user_id(
        &self,
        user_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<tutorial::Model>> {
        self.search(&TutorialFilter {
            user_id: Some(user_id.to_string()),
            limit,
            offset,
            ..Default::default()
        })
        .await
    }

    /// Number of tutorials by an author.
    pub async fn count_by_user(&self, user_id: &str) -> AppResult<u64> {
        Tutorial::find()
            .filter(tutorial::Column::UserId.eq(user_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Number of tutorials whose thumbnail points at `url`.
    pub async fn count_by_thumbnail_url(&self, url: &str) -> AppResult<u64> {
        Tutorial::find()
            .filter(tutorial::Column::ThumbnailUrl.eq(url))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Likes, comments and enrollments received across an author's tutorials.
    pub async fn received_totals(&self, user_id: &str) -> AppResult<CounterTotals> {
        let row: Option<(Option<i64>, Option<i64>, Option<i64>)> = Tutorial::find()
            .select_only()
            .column_as(
                Expr::expr(Func::sum(Expr::col(tutorial::Column::LikesCount))),
                "likes",
            )
            .column_as(
                Expr::expr(Func::sum(Expr::col(tutorial::Column::CommentsCount))),
                "comments",
            )
            .column_as(
                Expr::expr(Func::sum(Expr::col(tutorial::Column::EnrollmentsCount))),
                "enrollments",
            )
            .filter(tutorial::Column::UserId.eq(user_id))
            .into_tuple()
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let (likes, comments, enrollments) = row.unwrap_or_default();
        Ok(CounterTotals {
            likes: likes.unwrap_or(0),
            comments: comments.unwrap_or(0),
            enrollments: enrollments.unwrap_or(0),
        })
    }

    /// Create a tutorial owned by the caller.
    ///
    /// Counters always start at zero regardless of what the model carries.
    pub async fn create(
        &self,
        ctx: &AuthContext,
        model: tutorial::ActiveModel,
    ) -> AppResult<tutorial::Model> {
        let owner = required(&model.user_id, "user_id")?.to_string();
        authorize(Some(ctx), Table::Tutorial, Operation::Insert, &owner)?;

        let mut model = model;
        model.likes_count = Set(0);
        model.comments_count = Set(0);
        model.enrollments_count = Set(0);
        if model.resources.is_not_set() {
            model.resources = Set(serde_json::json!([]));
        }

        let tutorial = model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| insert_error(e, "Tutorial already exists"))?;

        info!(tutorial_id = %tutorial.id, user_id = %tutorial.user_id, "Created tutorial");
        Ok(tutorial)
    }

    /// Update a tutorial owned by the caller.
    ///
    /// The owner and the counters cannot be changed through this path.
    pub async fn update(
        &self,
        ctx: &AuthContext,
        model: tutorial::ActiveModel,
    ) -> AppResult<tutorial::Model> {
        let id = required(&model.id, "id")?.to_string();
        let existing = self.get_by_id(&id).await?;
        authorize(Some(ctx), Table::Tutorial, Operation::Update, &existing.user_id)?;

        if let ActiveValue::Set(new_owner) = &model.user_id {
            if *new_owner != existing.user_id {
                return Err(AppError::Forbidden(
                    "Tutorials cannot be transferred".to_string(),
                ));
            }
        }

        let mut model = model;
        model.id = ActiveValue::Unchanged(existing.id);
        model.user_id = ActiveValue::NotSet;
        model.likes_count = ActiveValue::NotSet;
        model.comments_count = ActiveValue::NotSet;
        model.enrollments_count = ActiveValue::NotSet;
        model.created_at = ActiveValue::NotSet;

        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a tutorial owned by the caller, returning the removed row.
    ///
    /// Likes, comments and enrollments go with it by cascade.
    pub async fn delete(&self, ctx: &AuthContext, id: &str) -> AppResult<tutorial::Model> {
        let existing = self.get_by_id(id).await?;
        authorize(Some(ctx), Table::Tutorial, Operation::Delete, &existing.user_id)?;

        Tutorial::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        info!(tutorial_id = %id, "Deleted tutorial");
        Ok(existing)
    }
}

fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn filtered(filter: &TutorialFilter) -> Select<Tutorial> {
    let mut query = Tutorial::find();

    if let Some(text) = filter.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let pattern = format!("%{}%", escape_like(&text.to_lowercase()));
        query = query.filter(
            Condition::any()
                .add(
                    Expr::expr(Func::lower(Expr::col(tutorial::Column::Title)))
                        .like(LikeExpr::new(pattern.clone()).escape('\\')),
                )
                .add(
                    Expr::expr(Func::lower(Expr::col(tutorial::Column::Description)))
                        .like(LikeExpr::new(pattern).escape('\\')),
                ),
        );
    }

    if let Some(category) = filter.category {
        query = query.filter(tutorial::Column::Category.eq(category));
    }
    if let Some(difficulty) = filter.difficulty {
        query = query.filter(tutorial::Column::Difficulty.eq(difficulty));
    }
    if let Some(user_id) = &filter.user_id {
        query = query.filter(tutorial::Column::UserId.eq(user_id.as_str()));
    }

    query
}

fn apply_sort(query: Select<Tutorial>, sort: TutorialSort) -> Select<Tutorial> {
    let query = match sort {
        TutorialSort::Newest => query.order_by_desc(tutorial::Column::CreatedAt),
        TutorialSort::Oldest => {
            return query
                .order_by_asc(tutorial::Column::CreatedAt)
                .order_by_asc(tutorial::Column::Id);
        }
        TutorialSort::Popular => query
            .order_by_desc(tutorial::Column::LikesCount)
            .order_by_desc(tutorial::Column::CreatedAt),
        TutorialSort::MostEnrolled => query
            .order_by_desc(tutorial::Column::EnrollmentsCount)
            .order_by_desc(tutorial::Column::CreatedAt),
    };
    query.order_by_desc(tutorial::Column::Id)
}
