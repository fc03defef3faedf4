pub mod stats;
pub mod user;

pub use stats::{StatsResponse, SystemStats, UsageStats};
pub use user::{UserCreate, UserResponse, UsersListResponse};
