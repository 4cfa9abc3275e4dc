pub mod actor;
pub mod detail;
pub mod page;
pub mod reference;
pub mod status;

pub use actor::{Actor, Role};
pub use detail::{AchievementContent, AchievementDetail, AchievementKind, Attachment};
pub use page::Page;
pub use reference::{AchievementReference, NewReference, StatusChange};
pub use status::AchievementStatus;
