pub mod assistant;
pub mod indicators;
pub mod messages;
pub mod provider;
pub mod queue;
pub mod traits;
