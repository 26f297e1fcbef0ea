//! Tutorial service: publishing, browsing, detail and dashboard views.

use std::collections::HashMap;

use bytes::Bytes;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use tracing::info;
use tutorhub_common::{AppError, AppResult, AuthContext, IdGenerator};
use tutorhub_db::{
    entities::tutorial::{self, Category, Difficulty, Resource},
    policy::{Operation, Table, authorize},
    repositories::{
        CounterTotals, EnrollmentRepository, LikeRepository, ProfileRepository, TutorialFilter,
        TutorialRepository, TutorialSort,
    },
};
use validator::Validate;

use super::comment::{CommentResponse, CommentService};
use super::enrollment::EnrollmentService;
use super::like::LikeService;
use super::profile::ProfileResponse;
use super::thumbnail::ThumbnailService;
use crate::validation::{clamp_limit, normalize_optional, trim_in_place, validate_http_url};

/// Default browse page size.
pub const DEFAULT_BROWSE_LIMIT: u64 = 20;
/// Largest browse page size.
pub const MAX_BROWSE_LIMIT: u64 = 100;
/// Tutorials per home page section.
pub const HOME_SECTION_SIZE: u64 = 6;
/// Comments shown on the detail page.
pub const DETAIL_COMMENT_LIMIT: u64 = 100;
/// Rows per dashboard section.
pub const DASHBOARD_SECTION_LIMIT: u64 = 100;

/// One resource link as submitted by the client.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResourceInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[validate(length(max = 512), custom(function = "validate_http_url"))]
    pub url: String,

    #[validate(length(max = 32))]
    #[serde(default)]
    pub kind: Option<String>,
}

impl ResourceInput {
    fn normalize(&mut self) {
        trim_in_place(&mut self.title);
        trim_in_place(&mut self.url);
        self.kind = normalize_optional(self.kind.take());
    }

    fn into_resource(self) -> Resource {
        Resource {
            title: self.title,
            url: self.url,
            kind: self.kind,
        }
    }
}

/// Input for creating a tutorial.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTutorialInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[validate(length(min = 1, max = 5000))]
    pub description: String,

    pub category: Category,

    pub difficulty: Difficulty,

    /// Previously uploaded or external thumbnail. Ignored when a file is
    /// uploaded with the request.
    #[validate(length(max = 512))]
    #[serde(default)]
    pub thumbnail_url: Option<String>,

    #[validate(length(max = 512), custom(function = "validate_http_url"))]
    #[serde(default)]
    pub video_url: Option<String>,

    #[validate(length(max = 50), nested)]
    #[serde(default)]
    pub resources: Vec<ResourceInput>,
}

impl CreateTutorialInput {
    fn normalize(&mut self) {
        trim_in_place(&mut self.title);
        trim_in_place(&mut self.description);
        self.thumbnail_url = normalize_optional(self.thumbnail_url.take());
        self.video_url = normalize_optional(self.video_url.take());
        self.resources.iter_mut().for_each(ResourceInput::normalize);
    }
}

/// Input for updating a tutorial. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTutorialInput {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 5000))]
    pub description: Option<String>,

    pub category: Option<Category>,

    pub difficulty: Option<Difficulty>,

    #[validate(length(max = 512))]
    pub thumbnail_url: Option<String>,

    /// Drop the current thumbnail.
    #[serde(default)]
    pub remove_thumbnail: bool,

    /// An empty string clears the video.
    #[validate(length(max = 512), custom(function = "validate_http_url"))]
    pub video_url: Option<String>,

    #[validate(length(max = 50), nested)]
    pub resources: Option<Vec<ResourceInput>>,
}

impl UpdateTutorialInput {
    fn normalize(&mut self) {
        if let Some(title) = self.title.as_mut() {
            trim_in_place(title);
        }
        if let Some(description) = self.description.as_mut() {
            trim_in_place(description);
        }
        self.thumbnail_url = normalize_optional(self.thumbnail_url.take());
        if let Some(resources) = self.resources.as_mut() {
            resources.iter_mut().for_each(ResourceInput::normalize);
        }
    }
}

/// Browse query.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseQuery {
    /// Free-text search over title and description.
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub sort: Option<TutorialSort>,
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub offset: Option<u64>,
}

impl BrowseQuery {
    fn into_filter(self) -> TutorialFilter {
        TutorialFilter {
            query: normalize_optional(self.query),
            category: self.category,
            difficulty: self.difficulty,
            user_id: self.user_id,
            sort: self.sort.unwrap_or_default(),
            limit: clamp_limit(self.limit, DEFAULT_BROWSE_LIMIT, MAX_BROWSE_LIMIT),
            offset: self.offset.unwrap_or(0),
        }
    }
}

/// Response for a tutorial.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorialResponse {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub difficulty: Difficulty,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
    pub resources: Vec<Resource>,
    pub likes_count: i32,
    pub comments_count: i32,
    pub enrollments_count: i32,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<ProfileResponse>,
}

impl From<tutorial::Model> for TutorialResponse {
    fn from(t: tutorial::Model) -> Self {
        let resources = t.resource_list();
        Self {
            id: t.id,
            user_id: t.user_id,
            title: t.title,
            description: t.description,
            category: t.category,
            difficulty: t.difficulty,
            thumbnail_url: t.thumbnail_url,
            video_url: t.video_url,
            resources,
            likes_count: t.likes_count,
            comments_count: t.comments_count,
            enrollments_count: t.enrollments_count,
            created_at: t.created_at.to_rfc3339(),
            updated_at: t.updated_at.to_rfc3339(),
            author: None,
        }
    }
}

/// Detail page: the tutorial, its author and comments, and the viewer's state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorialDetailResponse {
    #[serde(flatten)]
    pub tutorial: TutorialResponse,
    pub comments: Vec<CommentResponse>,
    pub is_liked: bool,
    pub is_enrolled: bool,
    pub is_owner: bool,
}

/// Home page sections.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeResponse {
    /// Most liked.
    pub featured: Vec<TutorialResponse>,
    /// Newest.
    pub recent: Vec<TutorialResponse>,
}

/// One page of browse results.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseResponse {
    pub items: Vec<TutorialResponse>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

/// The caller's dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub profile: ProfileResponse,
    pub tutorials: Vec<TutorialResponse>,
    pub tutorial_count: u64,
    pub enrolled: Vec<TutorialResponse>,
    pub liked: Vec<TutorialResponse>,
    pub received: CounterTotals,
}

/// Tutorial service for business logic.
#[derive(Clone)]
pub struct TutorialService {
    tutorial_repo: TutorialRepository,
    profile_repo: ProfileRepository,
    like_repo: LikeRepository,
    enrollment_repo: EnrollmentRepository,
    comments: CommentService,
    likes: LikeService,
    enrollments: EnrollmentService,
    thumbnails: ThumbnailService,
    id_gen: IdGenerator,
}

impl TutorialService {
    /// Create a new tutorial service.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        tutorial_repo: TutorialRepository,
        profile_repo: ProfileRepository,
        like_repo: LikeRepository,
        enrollment_repo: EnrollmentRepository,
        comments: CommentService,
        likes: LikeService,
        enrollments: EnrollmentService,
        thumbnails: ThumbnailService,
    ) -> Self {
        Self {
            tutorial_repo,
            profile_repo,
            like_repo,
            enrollment_repo,
            comments,
            likes,
            enrollments,
            thumbnails,
            id_gen: IdGenerator::new(),
        }
    }

    /// Publish a tutorial as the caller.
    ///
    /// A thumbnail file is uploaded before the row is written, so a rejected
    /// upload leaves nothing behind. If the row write fails afterwards, the
    /// uploaded object is removed again.
    pub async fn create(
        &self,
        ctx: &AuthContext,
        input: CreateTutorialInput,
        thumbnail: Option<Bytes>,
    ) -> AppResult<TutorialResponse> {
        let mut input = input;
        input.normalize();
        input.validate()?;
        if thumbnail.is_none() {
            if let Some(url) = &input.thumbnail_url {
                self.thumbnails.check_attachable(ctx, url)?;
            }
        }

        let uploaded = match thumbnail {
            Some(data) => Some(self.thumbnails.upload(ctx, &data).await?),
            None => None,
        };
        let thumbnail_url = uploaded
            .as_ref()
            .map(|f| f.url.clone())
            .or(input.thumbnail_url);

        let model = tutorial::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(ctx.identity_id.clone()),
            title: Set(input.title),
            description: Set(input.description),
            category: Set(input.category),
            difficulty: Set(input.difficulty),
            thumbnail_url: Set(thumbnail_url),
            video_url: Set(input.video_url),
            resources: Set(resources_json(input.resources)?),
            ..Default::default()
        };

        let created = match self.tutorial_repo.create(ctx, model).await {
            Ok(created) => created,
            Err(e) => {
                if let Some(file) = uploaded {
                    self.thumbnails.discard(ctx, &file.url).await;
                }
                return Err(e);
            }
        };

        let author = self.profile_repo.find_by_id(&created.user_id).await?;
        let mut response = TutorialResponse::from(created);
        response.author = author.map(Into::into);
        Ok(response)
    }

    /// Update one of the caller's tutorials.
    ///
    /// A replaced thumbnail in our storage is removed once the row is saved
    /// and no other tutorial uses it.
    pub async fn update(
        &self,
        ctx: &AuthContext,
        id: &str,
        input: UpdateTutorialInput,
        thumbnail: Option<Bytes>,
    ) -> AppResult<TutorialResponse> {
        let mut input = input;
        input.normalize();
        let clear_video = input.video_url.as_deref().is_some_and(|v| v.trim().is_empty());
        input.video_url = normalize_optional(input.video_url.take());
        input.validate()?;

        let existing = self.tutorial_repo.get_by_id(id).await?;
        // Checked here as well so a non-owner cannot trigger an upload
        authorize(Some(ctx), Table::Tutorial, Operation::Update, &existing.user_id)?;
        if thumbnail.is_none() {
            if let Some(url) = &input.thumbnail_url {
                self.thumbnails.check_attachable(ctx, url)?;
            }
        }

        let uploaded = match thumbnail {
            Some(data) => Some(self.thumbnails.upload(ctx, &data).await?),
            None => None,
        };

        let mut model = tutorial::ActiveModel {
            id: Set(existing.id.clone()),
            ..Default::default()
        };
        if let Some(title) = input.title {
            model.title = Set(title);
        }
        if let Some(description) = input.description {
            model.description = Set(description);
        }
        if let Some(category) = input.category {
            model.category = Set(category);
        }
        if let Some(difficulty) = input.difficulty {
            model.difficulty = Set(difficulty);
        }
        if clear_video {
            model.video_url = Set(None);
        } else if let Some(video_url) = input.video_url {
            model.video_url = Set(Some(video_url));
        }
        if let Some(resources) = input.resources {
            model.resources = Set(resources_json(resources)?);
        }

        let new_thumbnail = if let Some(file) = &uploaded {
            Some(Some(file.url.clone()))
        } else if input.remove_thumbnail {
            Some(None)
        } else {
            input.thumbnail_url.map(Some)
        };
        if let Some(url) = &new_thumbnail {
            model.thumbnail_url = Set(url.clone());
        }

        let updated = match self.tutorial_repo.update(ctx, model).await {
            Ok(updated) => updated,
            Err(e) => {
                if let Some(file) = uploaded {
                    self.thumbnails.discard(ctx, &file.url).await;
                }
                return Err(e);
            }
        };

        if new_thumbnail.is_some() {
            if let Some(old) = existing.thumbnail_url.as_deref() {
                if updated.thumbnail_url.as_deref() != Some(old) {
                    self.discard_thumbnail_if_unused(ctx, old).await?;
                }
            }
        }

        info!(tutorial_id = %updated.id, "Updated tutorial");

        let author = self.profile_repo.find_by_id(&updated.user_id).await?;
        let mut response = TutorialResponse::from(updated);
        response.author = author.map(Into::into);
        Ok(response)
    }

    /// Delete one of the caller's tutorials and its stored thumbnail, unless
    /// another tutorial still uses it.
    pub async fn delete(&self, ctx: &AuthContext, id: &str) -> AppResult<()> {
        let removed = self.tutorial_repo.delete(ctx, id).await?;
        if let Some(url) = removed.thumbnail_url.as_deref() {
            self.discard_thumbnail_if_unused(ctx, url).await?;
        }
        Ok(())
    }

    /// Remove a stored thumbnail once no tutorial points at it any more.
    async fn discard_thumbnail_if_unused(&self, ctx: &AuthContext, url: &str) -> AppResult<()> {
        if self.tutorial_repo.count_by_thumbnail_url(url).await? == 0 {
            self.thumbnails.discard(ctx, url).await;
        }
        Ok(())
    }

    /// Detail view of a tutorial.
    pub async fn get(
        &self,
        id: &str,
        viewer: Option<&AuthContext>,
    ) -> AppResult<TutorialDetailResponse> {
        let tutorial = self.tutorial_repo.get_by_id(id).await?;
        let author = self.profile_repo.find_by_id(&tutorial.user_id).await?;
        let comments = self.comments.list(id, DETAIL_COMMENT_LIMIT, 0).await?;

        let (is_liked, is_enrolled, is_owner) = match viewer {
            Some(ctx) => (
                self.like_repo.exists(&ctx.identity_id, id).await?,
                self.enrollment_repo.find_mine(ctx, id).await?.is_some(),
                ctx.is(&tutorial.user_id),
            ),
            None => (false, false, false),
        };

        let mut response = TutorialResponse::from(tutorial);
        response.author = author.map(Into::into);

        Ok(TutorialDetailResponse {
            tutorial: response,
            comments,
            is_liked,
            is_enrolled,
            is_owner,
        })
    }

    /// Search, filter and sort tutorials.
    pub async fn browse(&self, query: BrowseQuery) -> AppResult<BrowseResponse> {
        let filter = query.into_filter();
        let total = self.tutorial_repo.count(&filter).await?;
        let tutorials = self.tutorial_repo.search(&filter).await?;

        Ok(BrowseResponse {
            items: with_authors(&self.profile_repo, tutorials).await?,
            total,
            limit: filter.limit,
            offset: filter.offset,
        })
    }

    /// Home page: most liked and newest tutorials.
    pub async fn home(&self) -> AppResult<HomeResponse> {
        let featured = self
            .tutorial_repo
            .search(&TutorialFilter {
                sort: TutorialSort::Popular,
                limit: HOME_SECTION_SIZE,
                ..Default::default()
            })
            .await?;
        let recent = self
            .tutorial_repo
            .search(&TutorialFilter {
                sort: TutorialSort::Newest,
                limit: HOME_SECTION_SIZE,
                ..Default::default()
            })
            .await?;

        Ok(HomeResponse {
            featured: with_authors(&self.profile_repo, featured).await?,
            recent: with_authors(&self.profile_repo, recent).await?,
        })
    }

    /// Tutorials published by a user, newest first.
    pub async fn list_by_user(
        &self,
        user_id: &str,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> AppResult<Vec<TutorialResponse>> {
        let limit = clamp_limit(limit, DEFAULT_BROWSE_LIMIT, MAX_BROWSE_LIMIT);
        let tutorials = self
            .tutorial_repo
            .find_by_user_id(user_id, limit, offset.unwrap_or(0))
            .await?;
        with_authors(&self.profile_repo, tutorials).await
    }

    /// The caller's own tutorials, enrollments, likes and received totals.
    pub async fn dashboard(&self, ctx: &AuthContext) -> AppResult<DashboardResponse> {
        let profile = self.profile_repo.get_by_id(&ctx.identity_id).await?;
        let tutorials = self
            .tutorial_repo
            .find_by_user_id(&ctx.identity_id, DASHBOARD_SECTION_LIMIT, 0)
            .await?;
        let tutorial_count = self.tutorial_repo.count_by_user(&ctx.identity_id).await?;
        let received = self.tutorial_repo.received_totals(&ctx.identity_id).await?;
        let enrolled = self
            .enrollments
            .my_enrollments(ctx, Some(DASHBOARD_SECTION_LIMIT), None)
            .await?;
        let liked = self
            .likes
            .liked_by(ctx, Some(DASHBOARD_SECTION_LIMIT), None)
            .await?;

        let profile = ProfileResponse::from(profile);
        let tutorials = tutorials
            .into_iter()
            .map(|t| {
                let mut response = TutorialResponse::from(t);
                response.author = Some(profile.clone());
                response
            })
            .collect();

        Ok(DashboardResponse {
            profile,
            tutorials,
            tutorial_count,
            enrolled,
            liked,
            received,
        })
    }
}

fn resources_json(resources: Vec<ResourceInput>) -> AppResult<serde_json::Value> {
    let resources: Vec<Resource> = resources
        .into_iter()
        .map(ResourceInput::into_resource)
        .collect();
    serde_json::to_value(resources)
        .map_err(|e| AppError::Internal(format!("Failed to encode resources: {e}")))
}

/// Attach author profiles to tutorials, keeping the input order.
pub(crate) async fn with_authors(
    profile_repo: &ProfileRepository,
    tutorials: Vec<tutorial::Model>,
) -> AppResult<Vec<TutorialResponse>> {
    let mut author_ids: Vec<String> = tutorials.iter().map(|t| t.user_id.clone()).collect();
    author_ids.sort();
    author_ids.dedup();

    let authors: HashMap<String, ProfileResponse> = profile_repo
        .find_by_ids(&author_ids)
        .await?
        .into_iter()
        .map(|p| (p.id.clone(), p.into()))
        .collect();

    Ok(tutorials
        .into_iter()
        .map(|t| {
            let author = authors.get(&t.user_id).cloned();
            let mut response = TutorialResponse::from(t);
            response.author = author;
            response
        })
        .collect())
}

/// Reorder tutorials to follow `ids`, dropping IDs with no row.
pub(crate) fn in_order(ids: &[String], tutorials: Vec<tutorial::Model>) -> Vec<tutorial::Model> {
    let mut by_id: HashMap<String, tutorial::Model> =
        tutorials.into_iter().map(|t| (t.id.clone(), t)).collect();
    ids.iter().filter_map(|id| by_id.remove(id)).collect()
}
