mod health;
mod read;
mod write;

pub use health::{health_check, liveness_check, readiness_check};
pub use read::{
    optimized_around, optimized_rank, optimized_top, repository_around, repository_rank,
    repository_top,
};
pub use write::{write_score, write_user_score};
