pub mod cover;
pub mod delete;
pub mod reorder;
pub mod types;
pub mod upload;
