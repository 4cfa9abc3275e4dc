pub mod detail;
pub mod directory;
pub mod error;
pub mod files;
pub mod mongo;
pub mod postgres;
pub mod reference;

pub use detail::{DetailStore, MongoDetailStore};
pub use directory::{AdvisorDirectory, PgAdvisorDirectory};
pub use error::StoreError;
pub use files::{FileStorage, LocalFileStorage, StoredFile};
pub use reference::{PgReferenceStore, ReferenceStore};
