//! Business logic services.

#![allow(missing_docs)]

pub mod auth;
pub mod comment;
pub mod enrollment;
pub mod like;
pub mod profile;
pub mod thumbnail;
pub mod tutorial;

pub use auth::{AuthService, SessionResponse, SignInInput, SignUpInput};
pub use comment::{CommentResponse, CommentService, MAX_COMMENT_LENGTH};
pub use enrollment::EnrollmentService;
pub use like::LikeService;
pub use profile::{ProfileResponse, ProfileService, UpdateProfileInput};
pub use thumbnail::{ThumbnailResponse, ThumbnailService};
pub use tutorial::{
    BrowseQuery, BrowseResponse, CreateTutorialInput, DashboardResponse, HomeResponse,
    ResourceInput, TutorialDetailResponse, TutorialResponse, TutorialService,
    UpdateTutorialInput,
};
