pub mod coordinator;
pub mod error;

pub use coordinator::{AchievementCoordinator, AchievementList, AchievementSummary, ListQuery};
pub use error::AchievementError;
