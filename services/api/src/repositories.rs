//! Repositories for database operations

pub mod subscription;
pub mod video;

pub use subscription::SubscriptionRepository;
pub use video::VideoRepository;
