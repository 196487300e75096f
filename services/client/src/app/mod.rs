pub mod gamification;
pub mod insights;
pub mod opportunities;
pub mod profile;
pub mod session;
pub mod state;
pub mod tracker;

pub use state::{mount, AppState};
