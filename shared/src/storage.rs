use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use aws_sdk_s3::Client as S3Client;

/// A stored blob: the S3 key plus the URL the frontend renders.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub key: String,
    pub public_url: String,
}

/// Public URL format: https://{bucket}.s3.amazonaws.com/{key}
pub fn public_url(bucket: &str, key: &str) -> String {
    format!("https://{}.s3.amazonaws.com/{}", bucket, key)
}

/// Build the S3 key for a listing photo.
/// Millisecond timestamp + uuid token so re-uploads of the same
/// file name never collide.
pub fn photo_key(listing_id: &str, file_name: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let token = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "listings/{}/photos/{}-{}.{}",
        listing_id,
        millis,
        &token[..8],
        extension_of(file_name)
    )
}

// Only alphanumeric extensions make it into the key; anything else
// (path separators, query characters) falls back to jpg.
fn extension_of(file_name: &str) -> String {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .unwrap_or_else(|| "jpg".to_string())
}

/// Upload a single object and return its key + public URL.
pub async fn upload_object(
    s3: &S3Client,
    bucket: &str,
    key: &str,
    bytes: Vec<u8>,
    content_type: &str,
) -> Result<StoredObject, String> {
    s3.put_object()
        .bucket(bucket)
        .key(key)
        .body(ByteStream::from(bytes))
        .content_type(content_type)
        .send()
        .await
        .map_err(|e| format!("S3 put_object error: {}", e))?;

    Ok(StoredObject {
        key: key.to_string(),
        public_url: public_url(bucket, key),
    })
}

/// Remove a batch of objects by key.
pub async fn remove_objects(s3: &S3Client, bucket: &str, keys: &[String]) -> Result<(), String> {
    if keys.is_empty() {
        return Ok(());
    }

    let mut objects = Vec::new();
    for key in keys {
        let id = ObjectIdentifier::builder()
            .key(key)
            .build()
            .map_err(|e| format!("S3 object identifier error: {}", e))?;
        objects.push(id);
    }

    let delete = Delete::builder()
        .set_objects(Some(objects))
        .build()
        .map_err(|e| format!("S3 delete builder error: {}", e))?;

    s3.delete_objects()
        .bucket(bucket)
        .delete(delete)
        .send()
        .await
        .map_err(|e| format!("S3 delete_objects error: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn photo_key_is_scoped_to_listing() {
        let key = photo_key("abc-123", "kitchen.JPG");
        assert!(key.starts_with("listings/abc-123/photos/"));
        assert!(key.ends_with(".jpg"));
    }

    #[test]
    fn photo_key_defaults_extension() {
        let key = photo_key("abc-123", "no-extension");
        assert!(key.ends_with(".jpg"));
    }

    #[test]
    fn photo_key_rejects_non_alphanumeric_extensions() {
        // a file name like photo.a/b must not add a path segment
        let key = photo_key("abc-123", "photo.a/b");
        assert!(key.ends_with(".jpg"));
        assert_eq!(key.matches('/').count(), 3);

        let key = photo_key("abc-123", "shot.png?x=1");
        assert!(key.ends_with(".jpg"));
    }

    #[test]
    fn photo_keys_do_not_collide_for_same_file_name() {
        let a = photo_key("abc", "front.png");
        let b = photo_key("abc", "front.png");
        assert_ne!(a, b);
    }

    #[test]
    fn public_url_uses_virtual_hosted_style() {
        assert_eq!(
            public_url("nestly-app", "listings/a/photos/1-x.jpg"),
            "https://nestly-app.s3.amazonaws.com/listings/a/photos/1-x.jpg"
        );
    }
}
