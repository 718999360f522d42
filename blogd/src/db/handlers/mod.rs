pub mod posts;
pub mod repository;
pub mod users;

pub use posts::{PostRepository, Posts};
pub use repository::Repository;
pub use users::{UserRepository, Users};
