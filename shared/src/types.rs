// ========== LISTING ==========
pub use nestly_atoms::listings::model::{CreateListingPayload, Listing, UpdateListingPayload};

// ========== PHOTO ==========
pub use nestly_atoms::photos::model::Photo;
