use aws_sdk_dynamodb::Client as DynamoClient;
use aws_sdk_s3::Client as S3Client;
use lambda_http::{http::StatusCode, Body, Error as LambdaError, Response};

use nestly_atoms::listings::http::error_response;
use nestly_atoms::listings::service::{self as listings, photo_set_update_item, CoverPointer};
use nestly_atoms::photos::model::Photo;
use nestly_atoms::photos::service as photos;

use nestly_shared::storage;

/// The deterministic cover replacement: lowest surviving order.
/// Callers pass the gallery sorted ascending, so this is the first
/// record that is not the one being deleted.
pub fn promotion_candidate<'a>(gallery: &'a [Photo], deleted_id: &str) -> Option<&'a Photo> {
    gallery.iter().find(|p| p.photo_id != deleted_id)
}

/// Deletion Handler: blob first (best-effort), then record, cover
/// promotion and listing bookkeeping in one transaction. Order values
/// may gap at the deleted index; the next reorder closes them.
pub async fn delete_photo(
    dynamo: &DynamoClient,
    s3: &S3Client,
    table_name: &str,
    bucket: &str,
    listing_id: &str,
    photo_id: &str,
) -> Result<(), String> {
    let gallery = photos::load_photos_for_listing(dynamo, table_name, listing_id).await?;
    let photo = gallery
        .iter()
        .find(|p| p.photo_id == photo_id)
        .ok_or_else(|| "Photo not found".to_string())?;

    // Orphaned blobs are less harmful than dangling records, so a
    // storage failure only warns and the record delete proceeds.
    if !photo.storage_key.is_empty() {
        if let Err(e) =
            storage::remove_objects(s3, bucket, std::slice::from_ref(&photo.storage_key)).await
        {
            tracing::warn!(
                "delete_photo: failed to remove blob {} for photo {}: {}",
                photo.storage_key,
                photo_id,
                e
            );
        }
    }

    let mut items = vec![photos::delete_photo_txn_item(table_name, listing_id, photo_id)?];

    let cover = if photo.is_cover {
        match promotion_candidate(&gallery, photo_id) {
            Some(next) => {
                items.push(photos::set_cover_flag_txn_item(
                    table_name,
                    listing_id,
                    &next.photo_id,
                    true,
                )?);
                tracing::info!(
                    "delete_photo: promoting photo {} (order {}) to cover of listing {}",
                    next.photo_id,
                    next.order,
                    listing_id
                );
                CoverPointer::Set(next.url.clone())
            }
            None => CoverPointer::Clear,
        }
    } else {
        CoverPointer::Unchanged
    };

    items.push(photo_set_update_item(table_name, listing_id, -1, cover, None)?);

    photos::commit_photo_txn(dynamo, items)
        .await
        .map_err(|e| e.to_string())
}

/// HTTP Handler: DELETE /listings/{id}/photos/{photo_id}
pub async fn delete_photo_handler(
    dynamo: &DynamoClient,
    s3: &S3Client,
    table_name: &str,
    bucket: &str,
    listing_id: &str,
    photo_id: &str,
) -> Result<Response<Body>, LambdaError> {
    match delete_photo(dynamo, s3, table_name, bucket, listing_id, photo_id).await {
        Ok(()) => Ok(Response::builder()
            .status(StatusCode::NO_CONTENT)
            .header("Access-Control-Allow-Origin", "*")
            .body(Body::Empty)
            .map_err(Box::new)?),
        Err(e) if e == "Photo not found" => error_response(StatusCode::NOT_FOUND, &e),
        Err(e) => {
            tracing::error!(
                "delete_photo_handler failed: listing_id={}, photo_id={}, error={}",
                listing_id,
                photo_id,
                e
            );
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e)
        }
    }
}

/// Tear down a listing: blobs (best-effort), photo records, then the
/// listing item itself.
pub async fn delete_listing_cascade(
    dynamo: &DynamoClient,
    s3: &S3Client,
    table_name: &str,
    bucket: &str,
    listing_id: &str,
) -> Result<(), String> {
    let gallery = photos::load_photos_for_listing(dynamo, table_name, listing_id).await?;

    let keys: Vec<String> = gallery
        .iter()
        .map(|p| p.storage_key.clone())
        .filter(|k| !k.is_empty())
        .collect();
    if let Err(e) = storage::remove_objects(s3, bucket, &keys).await {
        tracing::warn!(
            "delete_listing_cascade: failed to remove {} blobs for listing {}: {}",
            keys.len(),
            listing_id,
            e
        );
    }

    for photo in &gallery {
        photos::delete_photo_record(dynamo, table_name, listing_id, &photo.photo_id).await?;
    }

    listings::delete_listing_record(dynamo, table_name, listing_id).await
}

/// HTTP Handler: DELETE /listings/{id}
pub async fn delete_listing_handler(
    dynamo: &DynamoClient,
    s3: &S3Client,
    table_name: &str,
    bucket: &str,
    listing_id: &str,
) -> Result<Response<Body>, LambdaError> {
    match delete_listing_cascade(dynamo, s3, table_name, bucket, listing_id).await {
        Ok(()) => Ok(Response::builder()
            .status(StatusCode::NO_CONTENT)
            .header("Access-Control-Allow-Origin", "*")
            .body(Body::Empty)
            .map_err(Box::new)?),
        Err(e) => {
            tracing::error!(
                "delete_listing_handler failed: listing_id={}, error={}",
                listing_id,
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
    fn promotes_lowest_order_survivor() {
        // A(0, cover), B(1), C(2); deleting A promotes B
        let gallery = vec![photo("a", 0, true), photo("b", 1, false), photo("c", 2, false)];
        let next = promotion_candidate(&gallery, "a").unwrap();
        assert_eq!(next.photo_id, "b");
    }

    #[test]
    fn promotes_across_gaps() {
        // orders gapped after earlier deletes; lowest survivor still wins
        let gallery = vec![photo("a", 1, true), photo("c", 4, false)];
        let next = promotion_candidate(&gallery, "a").unwrap();
        assert_eq!(next.photo_id, "c");
    }

    #[test]
    fn last_photo_has_no_replacement() {
        let gallery = vec![photo("a", 0, true)];
        assert!(promotion_candidate(&gallery, "a").is_none());
    }
}
