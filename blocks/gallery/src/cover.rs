use aws_sdk_dynamodb::Client as DynamoClient;
use lambda_http::{http::StatusCode, Body, Error as LambdaError, Response};

use nestly_atoms::listings::http::error_response;
use nestly_atoms::listings::service::{photo_set_update_item, CoverPointer};
use nestly_atoms::photos::model::Photo;
use nestly_atoms::photos::service as photos;

/// What a make-cover action has to write: clear the old flag (if any
/// record holds it) and set the new one.
#[derive(Debug, PartialEq)]
pub struct CoverChange {
    pub clear_photo_id: Option<String>,
    pub set_photo_id: String,
    pub cover_url: String,
}

/// Plan the flag moves for making `target_id` the cover. Ok(None) when
/// the target already is the cover (no writes).
pub fn plan_cover_change(gallery: &[Photo], target_id: &str) -> Result<Option<CoverChange>, String> {
    let target = gallery
        .iter()
        .find(|p| p.photo_id == target_id)
        .ok_or_else(|| "Photo not found".to_string())?;

    if target.is_cover {
        return Ok(None);
    }

    Ok(Some(CoverChange {
        clear_photo_id: gallery
            .iter()
            .find(|p| p.is_cover)
            .map(|p| p.photo_id.clone()),
        set_photo_id: target.photo_id.clone(),
        cover_url: target.url.clone(),
    }))
}

/// Cover Selection: flag moves and the listing's denormalized pointer
/// in one transaction, so there is never a zero-cover window.
pub async fn set_cover(
    dynamo: &DynamoClient,
    table_name: &str,
    listing_id: &str,
    photo_id: &str,
) -> Result<Vec<Photo>, String> {
    let mut gallery = photos::load_photos_for_listing(dynamo, table_name, listing_id).await?;

    let change = match plan_cover_change(&gallery, photo_id)? {
        Some(change) => change,
        None => return Ok(gallery),
    };

    let mut items = Vec::new();
    if let Some(old_id) = &change.clear_photo_id {
        items.push(photos::set_cover_flag_txn_item(table_name, listing_id, old_id, false)?);
    }
    items.push(photos::set_cover_flag_txn_item(
        table_name,
        listing_id,
        &change.set_photo_id,
        true,
    )?);
    items.push(photo_set_update_item(
        table_name,
        listing_id,
        0,
        CoverPointer::Set(change.cover_url.clone()),
        None,
    )?);

    photos::commit_photo_txn(dynamo, items)
        .await
        .map_err(|e| e.to_string())?;

    for photo in gallery.iter_mut() {
        photo.is_cover = photo.photo_id == change.set_photo_id;
    }

    Ok(gallery)
}

/// HTTP Handler: POST /listings/{id}/photos/{photo_id}/cover
pub async fn set_cover_handler(
    dynamo: &DynamoClient,
    table_name: &str,
    listing_id: &str,
    photo_id: &str,
) -> Result<Response<Body>, LambdaError> {
    match set_cover(dynamo, table_name, listing_id, photo_id).await {
        Ok(photos) => Ok(Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(serde_json::to_string(&photos)?.into())
            .map_err(Box::new)?),
        Err(e) if e == "Photo not found" => error_response(StatusCode::NOT_FOUND, &e),
        Err(e) => {
            tracing::error!(
                "set_cover_handler failed: listing_id={}, photo_id={}, error={}",
                listing_id,
                photo_id,
                e
            );
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo(id: &str, order: i32, is_cover: bool) -> Photo {
        Photo {
            photo_id: id.to_string(),
            listing_id: "l1".to_string(),
            url: format!("https://bucket.s3.amazonaws.com/{}.jpg", id),
            storage_key: format!("{}.jpg", id),
            order,
            is_cover,
            width: None,
            height: None,
            uploaded_at: "2026-08-29T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn moves_the_flag_from_old_cover_to_target() {
        let gallery = vec![photo("a", 0, true), photo("b", 1, false)];
        let change = plan_cover_change(&gallery, "b").unwrap().unwrap();

        assert_eq!(change.clear_photo_id.as_deref(), Some("a"));
        assert_eq!(change.set_photo_id, "b");
        assert_eq!(change.cover_url, "https://bucket.s3.amazonaws.com/b.jpg");
    }

    #[test]
    fn making_the_cover_the_cover_is_a_no_op() {
        let gallery = vec![photo("a", 0, true), photo("b", 1, false)];
        assert_eq!(plan_cover_change(&gallery, "a").unwrap(), None);
    }

    #[test]
    fn repairs_a_gallery_with_no_cover() {
        // drifted state: no record holds the flag
        let gallery = vec![photo("a", 0, false), photo("b", 1, false)];
        let change = plan_cover_change(&gallery, "b").unwrap().unwrap();

        assert_eq!(change.clear_photo_id, None);
        assert_eq!(change.set_photo_id, "b");
    }

    #[test]
    fn unknown_target_is_an_error() {
        let gallery = vec![photo("a", 0, true)];
        assert!(plan_cover_change(&gallery, "zzz").is_err());
    }
}
