pub mod state;
pub mod storage;
pub mod types;

pub use state::AppState;
