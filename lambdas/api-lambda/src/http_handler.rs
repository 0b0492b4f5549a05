use gallery_block::{cover, delete, reorder, upload};
use lambda_http::{
    http::{header::HeaderValue, Method, StatusCode},
    Body, Error, Request, Response,
};
use nestly_atoms as atoms;
use nestly_shared::AppState;
use std::env;
use std::sync::Arc;

fn with_cors_headers(mut resp: Response<Body>) -> Response<Body> {
    let headers = resp.headers_mut();
    headers.insert("Access-Control-Allow-Origin", HeaderValue::from_static("*"));
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET,POST,PUT,PATCH,DELETE,OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Content-Type,Authorization"),
    );
    resp
}

fn finalize_response(resp: Result<Response<Body>, Error>) -> Result<Response<Body>, Error> {
    resp.map(with_cors_headers)
}

/// Main Lambda handler - routes listing and gallery requests.
/// Authentication is handled upstream by the API gateway authorizer.
pub(crate) async fn function_handler(
    event: Request,
    state: Arc<AppState>,
) -> Result<Response<Body>, Error> {
    let method = event.method();
    let path = event.uri().path();
    let body = event.body();
    tracing::info!("API Lambda invoked - Method: {} Path: {}", method, path);

    // Handle CORS preflight
    if method == "OPTIONS" {
        let resp = Response::builder()
            .status(StatusCode::OK)
            .body(Body::Empty)
            .map_err(Box::new)?;
        return Ok(with_cors_headers(resp));
    }

    let table_name = env::var("TABLE_NAME").unwrap_or_else(|_| "nestly".to_string());
    let bucket_name = env::var("S3_BUCKET_NAME").unwrap_or_else(|_| "nestly-app".to_string());

    if path.starts_with("/listings") {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let resp = match (method, parts.as_slice()) {
            // --- LISTINGS ---
            // GET /listings - list all listings
            (&Method::GET, ["listings"]) => {
                atoms::listings::list_listings_handler(&state.dynamo_client, &table_name).await
            }
            // POST /listings - create listing
            (&Method::POST, ["listings"]) => {
                atoms::listings::create_listing_handler(&state.dynamo_client, &table_name, body)
                    .await
            }
            // GET /listings/{id} - get specific listing
            (&Method::GET, ["listings", listing_id]) => {
                atoms::listings::get_listing_handler(&state.dynamo_client, &table_name, listing_id)
                    .await
            }
            // PATCH /listings/{id} - update listing fields
            (&Method::PATCH, ["listings", listing_id]) => {
                atoms::listings::update_listing_handler(
                    &state.dynamo_client,
                    &table_name,
                    listing_id,
                    body,
                )
                .await
            }
            // DELETE /listings/{id} - delete listing, photos and blobs
            (&Method::DELETE, ["listings", listing_id]) => {
                delete::delete_listing_handler(
                    &state.dynamo_client,
                    &state.s3_client,
                    &table_name,
                    &bucket_name,
                    listing_id,
                )
                .await
            }

            // --- GALLERY ---
            // GET /listings/{id}/photos - ordered gallery
            (&Method::GET, ["listings", listing_id, "photos"]) => {
                atoms::photos::list_photos_handler(&state.dynamo_client, &table_name, listing_id)
                    .await
            }
            // POST /listings/{id}/photos - batch upload
            (&Method::POST, ["listings", listing_id, "photos"]) => {
                upload::upload_photos_handler(
                    &state.dynamo_client,
                    &state.s3_client,
                    &table_name,
                    &bucket_name,
                    listing_id,
                    body,
                )
                .await
            }
            // PUT /listings/{id}/photos/order - apply one drag gesture
            (&Method::PUT, ["listings", listing_id, "photos", "order"]) => {
                reorder::reorder_photos_handler(&state.dynamo_client, &table_name, listing_id, body)
                    .await
            }
            // GET /listings/{id}/photos/{pid} - get photo
            (&Method::GET, ["listings", listing_id, "photos", photo_id]) => {
                atoms::photos::get_photo_handler(
                    &state.dynamo_client,
                    &table_name,
                    listing_id,
                    photo_id,
                )
                .await
            }
            // DELETE /listings/{id}/photos/{pid} - delete photo
            (&Method::DELETE, ["listings", listing_id, "photos", photo_id]) => {
                delete::delete_photo_handler(
                    &state.dynamo_client,
                    &state.s3_client,
                    &table_name,
                    &bucket_name,
                    listing_id,
                    photo_id,
                )
                .await
            }
            // POST /listings/{id}/photos/{pid}/cover - make cover
            (&Method::POST, ["listings", listing_id, "photos", photo_id, "cover"]) => {
                cover::set_cover_handler(&state.dynamo_client, &table_name, listing_id, photo_id)
                    .await
            }

            _ => not_found(),
        };

        return finalize_response(resp);
    }

    // No matching route
    tracing::warn!("No route matched - Method: {} Path: {}", method, path);
    finalize_response(not_found())
}

fn not_found() -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(serde_json::json!({"error": "Not found"}).to_string().into())
        .map_err(Box::new)?)
}
