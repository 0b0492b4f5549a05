use serde::{Deserialize, Serialize};

/// Listing domain model - the property record that owns a photo gallery
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Listing {
    pub listing_id: String,
    pub address: String,
    pub suburb: String,
    pub price: Option<i64>,
    pub listing_state: String, // "draft" | "listed" | "under_offer" | "sold"

    /// Denormalized copy of the cover photo's URL, kept for cheap card
    /// rendering. Written only through the photo-set update in the
    /// listings service, always in the same transaction as the
    /// is_cover flag change.
    pub cover_photo_url: Option<String>,

    pub photo_count: u32,

    /// Version counter over the photo set. Bumped by every photo
    /// mutation; the reorder path conditions on it to reject a racing
    /// writer.
    pub photo_rev: i64,

    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateListingPayload {
    pub address: String,
    pub suburb: String,
    pub price: Option<i64>,
    pub listing_state: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateListingPayload {
    pub address: Option<String>,
    pub suburb: Option<String>,
    pub price: Option<i64>,
    pub listing_state: Option<String>,
}
