//! Database entities.

pub mod enrollment;
pub mod identity;
pub mod profile;
pub mod tutorial;
pub mod tutorial_comment;
pub mod tutorial_like;

pub use enrollment::Entity as Enrollment;
pub use identity::Entity as Identity;
pub use profile::Entity as Profile;
pub use tutorial::Entity as Tutorial;
pub use tutorial_comment::Entity as TutorialComment;
pub use tutorial_like::Entity as TutorialLike;
