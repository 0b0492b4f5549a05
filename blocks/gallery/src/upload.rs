use aws_sdk_dynamodb::Client as DynamoClient;
use aws_sdk_s3::Client as S3Client;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use lambda_http::{http::StatusCode, Body, Error as LambdaError, Response};

use nestly_atoms::listings::http::error_response;
use nestly_atoms::listings::service::{get_listing, photo_set_update_item, CoverPointer};
use nestly_atoms::photos::model::Photo;
use nestly_atoms::photos::service as photos;
use nestly_shared::storage;

use crate::types::{UploadFile, UploadPhotosPayload};

/// Advisory per-file cap. The reference frontend caps picks at 10MB;
/// oversized files are logged, not rejected.
const MAX_PHOTO_BYTES: usize = 10 * 1024 * 1024;

pub(crate) fn is_image(content_type: &str) -> bool {
    content_type.starts_with("image/")
}

/// Orders append after the current maximum, so a gallery that gapped
/// after a delete keeps its values unique without a rewrite.
pub(crate) fn next_order_base(existing: &[Photo]) -> i32 {
    existing.iter().map(|p| p.order).max().map_or(0, |max| max + 1)
}

#[derive(Debug, PartialEq)]
pub(crate) struct UploadPlan {
    pub file_index: usize,
    pub order: i32,
    pub becomes_cover: bool,
}

/// Decide, before any I/O, what each batch entry gets: non-images are
/// skipped silently, orders follow user pick order, and the first
/// accepted file of a previously-empty gallery becomes the cover.
pub(crate) fn plan_uploads(existing: &[Photo], files: &[UploadFile]) -> Vec<UploadPlan> {
    let base = next_order_base(existing);
    let collection_was_empty = existing.is_empty();

    let mut plans = Vec::new();
    for (file_index, file) in files.iter().enumerate() {
        if !is_image(&file.content_type) {
            continue;
        }
        let accepted = plans.len();
        plans.push(UploadPlan {
            file_index,
            order: base + accepted as i32,
            becomes_cover: collection_was_empty && accepted == 0,
        });
    }
    plans
}

fn sniff_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    image::io::Reader::new(std::io::Cursor::new(data))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

/// Upload Pipeline: store each file, create its record, first photo of
/// an empty gallery becomes cover. Strictly sequential so the resulting
/// orders match the user's file-selection order. A failure aborts the
/// rest of the batch; files already committed stay committed.
pub async fn upload_photos(
    dynamo: &DynamoClient,
    s3: &S3Client,
    table_name: &str,
    bucket: &str,
    listing_id: &str,
    mut files: Vec<UploadFile>,
) -> Result<Vec<Photo>, String> {
    // unknown listing must fail here, before any blob is stored
    get_listing(dynamo, table_name, listing_id).await?;

    let existing = photos::load_photos_for_listing(dynamo, table_name, listing_id).await?;
    let plans = plan_uploads(&existing, &files);

    let mut created: Vec<Photo> = Vec::new();
    for plan in &plans {
        let file = &mut files[plan.file_index];
        let data = std::mem::take(&mut file.data);

        if data.len() > MAX_PHOTO_BYTES {
            tracing::warn!(
                "upload_photos: {} is {} bytes, over the {}MB advisory cap",
                file.file_name,
                data.len(),
                MAX_PHOTO_BYTES / (1024 * 1024)
            );
        }

        let dimensions = sniff_dimensions(&data);
        let key = storage::photo_key(listing_id, &file.file_name);
        let stored = storage::upload_object(s3, bucket, &key, data, &file.content_type).await?;

        let photo = Photo {
            photo_id: uuid::Uuid::new_v4().to_string(),
            listing_id: listing_id.to_string(),
            url: stored.public_url,
            storage_key: stored.key,
            order: plan.order,
            is_cover: plan.becomes_cover,
            width: dimensions.map(|(w, _)| w),
            height: dimensions.map(|(_, h)| h),
            uploaded_at: chrono::Utc::now().to_rfc3339(),
        };

        let cover = if photo.is_cover {
            CoverPointer::Set(photo.url.clone())
        } else {
            CoverPointer::Unchanged
        };

        let items = vec![
            photos::create_photo_txn_item(table_name, &photo)?,
            photo_set_update_item(table_name, listing_id, 1, cover, None)?,
        ];
        photos::commit_photo_txn(dynamo, items)
            .await
            .map_err(|e| e.to_string())?;

        tracing::info!(
            "upload_photos: stored {} as photo {} (order {}, cover {})",
            photo.storage_key,
            photo.photo_id,
            photo.order,
            photo.is_cover
        );
        created.push(photo);
    }

    Ok(created)
}

/// HTTP Handler: POST /listings/{id}/photos
pub async fn upload_photos_handler(
    dynamo: &DynamoClient,
    s3: &S3Client,
    table_name: &str,
    bucket: &str,
    listing_id: &str,
    body: &[u8],
) -> Result<Response<Body>, LambdaError> {
    let payload: UploadPhotosPayload = serde_json::from_slice(body)?;

    let mut files = Vec::new();
    for entry in payload.files {
        let data = match BASE64.decode(&entry.data_base64) {
            Ok(data) => data,
            Err(e) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    &format!("invalid base64 for {}: {}", entry.file_name, e),
                );
            }
        };
        files.push(UploadFile {
            file_name: entry.file_name,
            content_type: entry.content_type,
            data,
        });
    }

    match upload_photos(dynamo, s3, table_name, bucket, listing_id, files).await {
        Ok(photos) => Ok(Response::builder()
            .status(StatusCode::CREATED)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(serde_json::to_string(&photos)?.into())
            .map_err(Box::new)?),
        Err(e) if e == "Listing not found" => error_response(StatusCode::NOT_FOUND, &e),
        Err(e) => {
            tracing::error!("upload_photos_handler failed: listing_id={}, error={}", listing_id, e);
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

    fn file(name: &str, content_type: &str) -> UploadFile {
        UploadFile {
            file_name: name.to_string(),
            content_type: content_type.to_string(),
            data: vec![],
        }
    }

    #[test]
    fn empty_gallery_starts_at_zero_and_covers_first_file() {
        let files = vec![
            file("x.jpg", "image/jpeg"),
            file("y.jpg", "image/jpeg"),
            file("z.jpg", "image/jpeg"),
        ];
        let plans = plan_uploads(&[], &files);

        assert_eq!(plans.len(), 3);
        assert_eq!((plans[0].order, plans[0].becomes_cover), (0, true));
        assert_eq!((plans[1].order, plans[1].becomes_cover), (1, false));
        assert_eq!((plans[2].order, plans[2].becomes_cover), (2, false));
    }

    #[test]
    fn non_image_entries_are_skipped_silently() {
        let files = vec![
            file("notes.pdf", "application/pdf"),
            file("x.jpg", "image/jpeg"),
        ];
        let plans = plan_uploads(&[], &files);

        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].file_index, 1);
        // cover still goes to the first record actually created
        assert!(plans[0].becomes_cover);
    }

    #[test]
    fn appends_after_current_max_even_with_gaps() {
        let existing = vec![photo("a", 0, true), photo("c", 2, false)];
        let plans = plan_uploads(&existing, &[file("d.png", "image/png")]);

        assert_eq!(plans[0].order, 3);
        assert!(!plans[0].becomes_cover);
    }

    #[test]
    fn next_order_base_on_empty_is_zero() {
        assert_eq!(next_order_base(&[]), 0);
    }

    #[test]
    fn sniffs_png_dimensions() {
        let img = image::RgbaImage::new(2, 3);
        let mut bytes = std::io::Cursor::new(Vec::new());
        img.write_to(&mut bytes, image::ImageOutputFormat::Png).unwrap();

        assert_eq!(sniff_dimensions(bytes.get_ref()), Some((2, 3)));
        assert_eq!(sniff_dimensions(b"not an image"), None);
    }
}
