use aws_sdk_dynamodb::Client as DynamoClient;
use lambda_http::{http::StatusCode, Body, Error as LambdaError, Response};

use crate::listings::http::error_response;
use super::service::{get_photo, load_photos_for_listing};

/// HTTP Handler: GET /listings/{id}/photos
/// The ordered gallery; also what the read-only lightbox consumes.
pub async fn list_photos_handler(
    client: &DynamoClient,
    table_name: &str,
    listing_id: &str,
) -> Result<Response<Body>, LambdaError> {
    match load_photos_for_listing(client, table_name, listing_id).await {
        Ok(photos) => Ok(Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(serde_json::to_string(&photos)?.into())
            .map_err(Box::new)?),
        Err(e) => {
            tracing::error!("list_photos_handler failed: listing_id={}, error={}", listing_id, e);
            Ok(error_response(StatusCode::INTERNAL_SERVER_ERROR, &e)?)
        }
    }
}

/// HTTP Handler: GET /listings/{id}/photos/{photo_id}
pub async fn get_photo_handler(
    client: &DynamoClient,
    table_name: &str,
    listing_id: &str,
    photo_id: &str,
) -> Result<Response<Body>, LambdaError> {
    match get_photo(client, table_name, listing_id, photo_id).await {
        Ok(photo) => Ok(Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(serde_json::to_string(&photo)?.into())
            .map_err(Box::new)?),
        Err(e) if e == "Photo not found" => Ok(error_response(StatusCode::NOT_FOUND, &e)?),
        Err(e) => {
            tracing::error!(
                "get_photo_handler failed: listing_id={}, photo_id={}, error={}",
                listing_id,
                photo_id,
                e
            );
            Ok(error_response(StatusCode::INTERNAL_SERVER_ERROR, &e)?)
        }
    }
}
