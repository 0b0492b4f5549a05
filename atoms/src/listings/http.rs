use aws_sdk_dynamodb::Client as DynamoClient;
use lambda_http::{http::StatusCode, Body, Error as LambdaError, Response};

use super::model::{CreateListingPayload, UpdateListingPayload};
use super::service::{create_listing, get_listing, list_listings, update_listing};

/// HTTP Handler: POST /listings
pub async fn create_listing_handler(
    client: &DynamoClient,
    table_name: &str,
    body: &[u8],
) -> Result<Response<Body>, LambdaError> {
    let payload: CreateListingPayload = serde_json::from_slice(body)?;

    match create_listing(client, table_name, payload).await {
        Ok(listing) => Ok(Response::builder()
            .status(StatusCode::CREATED)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(serde_json::to_string(&listing)?.into())
            .map_err(Box::new)?),
        Err(e) => {
            tracing::error!("create_listing_handler failed: {}", e);
            Ok(error_response(StatusCode::INTERNAL_SERVER_ERROR, &e)?)
        }
    }
}

/// HTTP Handler: GET /listings
pub async fn list_listings_handler(
    client: &DynamoClient,
    table_name: &str,
) -> Result<Response<Body>, LambdaError> {
    match list_listings(client, table_name).await {
        Ok(listings) => Ok(Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(serde_json::to_string(&listings)?.into())
            .map_err(Box::new)?),
        Err(e) => {
            tracing::error!("list_listings_handler failed: {}", e);
            Ok(error_response(StatusCode::INTERNAL_SERVER_ERROR, &e)?)
        }
    }
}

/// HTTP Handler: GET /listings/{id}
pub async fn get_listing_handler(
    client: &DynamoClient,
    table_name: &str,
    listing_id: &str,
) -> Result<Response<Body>, LambdaError> {
    match get_listing(client, table_name, listing_id).await {
        Ok(listing) => Ok(Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(serde_json::to_string(&listing)?.into())
            .map_err(Box::new)?),
        Err(e) if e == "Listing not found" => Ok(error_response(StatusCode::NOT_FOUND, &e)?),
        Err(e) => {
            tracing::error!("get_listing_handler failed: listing_id={}, error={}", listing_id, e);
            Ok(error_response(StatusCode::INTERNAL_SERVER_ERROR, &e)?)
        }
    }
}

/// HTTP Handler: PATCH /listings/{id}
pub async fn update_listing_handler(
    client: &DynamoClient,
    table_name: &str,
    listing_id: &str,
    body: &[u8],
) -> Result<Response<Body>, LambdaError> {
    let payload: UpdateListingPayload = serde_json::from_slice(body)?;

    match update_listing(client, table_name, listing_id, payload).await {
        Ok(listing) => Ok(Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(serde_json::to_string(&listing)?.into())
            .map_err(Box::new)?),
        Err(e) if e == "Listing not found" => Ok(error_response(StatusCode::NOT_FOUND, &e)?),
        Err(e) => {
            tracing::error!("update_listing_handler failed: listing_id={}, error={}", listing_id, e);
            Ok(error_response(StatusCode::INTERNAL_SERVER_ERROR, &e)?)
        }
    }
}

pub fn error_response(status: StatusCode, message: &str) -> Result<Response<Body>, LambdaError> {
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(serde_json::json!({ "error": message }).to_string().into())
        .map_err(Box::new)?)
}
