use serde::{Deserialize, Serialize};

/// Photo domain model - one image in a listing's gallery
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Photo {
    pub photo_id: String,
    pub listing_id: String,

    /// Public URL in the blob store, what the frontend renders
    pub url: String,

    /// S3 key, kept so deletion can remove the blob without parsing the URL
    pub storage_key: String,

    /// Zero-based rank within the gallery. Unique per listing; may gap
    /// after a delete until the next reorder rewrites the sequence.
    pub order: i32,

    pub is_cover: bool,

    pub width: Option<u32>,
    pub height: Option<u32>,

    pub uploaded_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn photo_serializes_with_snake_case_fields() {
        let photo = Photo {
            photo_id: "p1".to_string(),
            listing_id: "l1".to_string(),
            url: "https://bucket.s3.amazonaws.com/listings/l1/photos/1-a.jpg".to_string(),
            storage_key: "listings/l1/photos/1-a.jpg".to_string(),
            order: 0,
            is_cover: true,
            width: Some(1920),
            height: Some(1080),
            uploaded_at: "2026-08-29T00:00:00Z".to_string(),
        };

        let value = serde_json::to_value(&photo).unwrap();
        assert_eq!(value["photo_id"], "p1");
        assert_eq!(value["is_cover"], true);
        assert_eq!(value["order"], 0);
    }
}
