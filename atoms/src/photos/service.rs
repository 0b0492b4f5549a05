use aws_sdk_dynamodb::operation::transact_write_items::TransactWriteItemsError;
use aws_sdk_dynamodb::types::error::TransactionCanceledException;
use aws_sdk_dynamodb::types::{AttributeValue, Delete, Put, TransactWriteItem, Update};
use aws_sdk_dynamodb::Client as DynamoClient;
use std::collections::HashMap;

use super::model::Photo;

/// Failure mode of a photo-set transaction. Conflict means a condition
/// check failed, i.e. another writer bumped photo_rev first.
#[derive(Debug)]
pub enum TxnError {
    Conflict,
    Other(String),
}

impl std::fmt::Display for TxnError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TxnError::Conflict => write!(f, "photo set changed concurrently"),
            TxnError::Other(e) => write!(f, "{}", e),
        }
    }
}

fn photo_from_item(listing_id: &str, item: &HashMap<String, AttributeValue>) -> Option<Photo> {
    let sk = item.get("SK").and_then(|v| v.as_s().ok())?;
    let photo_id = sk.strip_prefix("PHOTO#")?;

    Some(Photo {
        photo_id: photo_id.to_string(),
        listing_id: listing_id.to_string(),
        url: item.get("url").and_then(|v| v.as_s().ok()).map(|s| s.to_string()).unwrap_or_default(),
        storage_key: item.get("storage_key").and_then(|v| v.as_s().ok()).map(|s| s.to_string()).unwrap_or_default(),
        order: item.get("order").and_then(|v| v.as_n().ok()).and_then(|n| n.parse().ok()).unwrap_or(0),
        is_cover: item.get("is_cover").and_then(|v| v.as_bool().ok()).copied().unwrap_or(false),
        width: item.get("width").and_then(|v| v.as_n().ok()).and_then(|n| n.parse().ok()),
        height: item.get("height").and_then(|v| v.as_n().ok()).and_then(|n| n.parse().ok()),
        uploaded_at: item.get("uploaded_at").and_then(|v| v.as_s().ok()).map(|s| s.to_string()).unwrap_or_default(),
    })
}

/// Load all photos for a listing, sorted ascending by order.
pub async fn load_photos_for_listing(
    client: &DynamoClient,
    table_name: &str,
    listing_id: &str,
) -> Result<Vec<Photo>, String> {
    let pk = format!("LISTING#{}", listing_id);

    let result = client
        .query()
        .table_name(table_name)
        .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
        .expression_attribute_values(":pk", AttributeValue::S(pk))
        .expression_attribute_values(":sk_prefix", AttributeValue::S("PHOTO#".to_string()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB query error: {}", e))?;

    let mut photos: Vec<Photo> = result
        .items()
        .iter()
        .filter_map(|item| photo_from_item(listing_id, item))
        .collect();

    photos.sort_by(|a, b| {
        a.order
            .cmp(&b.order)
            .then_with(|| a.uploaded_at.cmp(&b.uploaded_at))
    });

    Ok(photos)
}

/// Get a specific photo
pub async fn get_photo(
    client: &DynamoClient,
    table_name: &str,
    listing_id: &str,
    photo_id: &str,
) -> Result<Photo, String> {
    let result = client
        .get_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(format!("LISTING#{}", listing_id)))
        .key("SK", AttributeValue::S(format!("PHOTO#{}", photo_id)))
        .send()
        .await
        .map_err(|e| format!("DynamoDB get_item error: {}", e))?;

    result
        .item()
        .and_then(|item| photo_from_item(listing_id, item))
        .ok_or_else(|| "Photo not found".to_string())
}

/// Plain delete of one photo record, used by the listing teardown
/// where no bookkeeping needs to move with it.
pub async fn delete_photo_record(
    client: &DynamoClient,
    table_name: &str,
    listing_id: &str,
    photo_id: &str,
) -> Result<(), String> {
    client
        .delete_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(format!("LISTING#{}", listing_id)))
        .key("SK", AttributeValue::S(format!("PHOTO#{}", photo_id)))
        .send()
        .await
        .map_err(|e| format!("DynamoDB delete_item error: {}", e))?;

    Ok(())
}

/// Transact item: insert a photo record.
pub fn create_photo_txn_item(table_name: &str, photo: &Photo) -> Result<TransactWriteItem, String> {
    let mut builder = Put::builder()
        .table_name(table_name)
        .item("PK", AttributeValue::S(format!("LISTING#{}", photo.listing_id)))
        .item("SK", AttributeValue::S(format!("PHOTO#{}", photo.photo_id)))
        .item("url", AttributeValue::S(photo.url.clone()))
        .item("storage_key", AttributeValue::S(photo.storage_key.clone()))
        .item("order", AttributeValue::N(photo.order.to_string()))
        .item("is_cover", AttributeValue::Bool(photo.is_cover))
        .item("uploaded_at", AttributeValue::S(photo.uploaded_at.clone()));

    if let Some(width) = photo.width {
        builder = builder.item("width", AttributeValue::N(width.to_string()));
    }
    if let Some(height) = photo.height {
        builder = builder.item("height", AttributeValue::N(height.to_string()));
    }

    let put = builder
        .build()
        .map_err(|e| format!("DynamoDB put builder error: {}", e))?;

    Ok(TransactWriteItem::builder().put(put).build())
}

/// Transact item: rewrite one photo's order.
pub fn update_order_txn_item(
    table_name: &str,
    listing_id: &str,
    photo_id: &str,
    order: i32,
) -> Result<TransactWriteItem, String> {
    let update = Update::builder()
        .table_name(table_name)
        .key("PK", AttributeValue::S(format!("LISTING#{}", listing_id)))
        .key("SK", AttributeValue::S(format!("PHOTO#{}", photo_id)))
        .update_expression("SET #order = :order")
        .expression_attribute_names("#order", "order")
        .expression_attribute_values(":order", AttributeValue::N(order.to_string()))
        .build()
        .map_err(|e| format!("DynamoDB update builder error: {}", e))?;

    Ok(TransactWriteItem::builder().update(update).build())
}

/// Transact item: flip a photo's is_cover flag.
pub fn set_cover_flag_txn_item(
    table_name: &str,
    listing_id: &str,
    photo_id: &str,
    is_cover: bool,
) -> Result<TransactWriteItem, String> {
    let update = Update::builder()
        .table_name(table_name)
        .key("PK", AttributeValue::S(format!("LISTING#{}", listing_id)))
        .key("SK", AttributeValue::S(format!("PHOTO#{}", photo_id)))
        .update_expression("SET is_cover = :is_cover")
        .expression_attribute_values(":is_cover", AttributeValue::Bool(is_cover))
        .build()
        .map_err(|e| format!("DynamoDB update builder error: {}", e))?;

    Ok(TransactWriteItem::builder().update(update).build())
}

/// Transact item: delete a photo record.
pub fn delete_photo_txn_item(
    table_name: &str,
    listing_id: &str,
    photo_id: &str,
) -> Result<TransactWriteItem, String> {
    let delete = Delete::builder()
        .table_name(table_name)
        .key("PK", AttributeValue::S(format!("LISTING#{}", listing_id)))
        .key("SK", AttributeValue::S(format!("PHOTO#{}", photo_id)))
        .build()
        .map_err(|e| format!("DynamoDB delete builder error: {}", e))?;

    Ok(TransactWriteItem::builder().delete(delete).build())
}

/// Commit a photo-set mutation as one transaction. The gallery always
/// pairs record writes with the listing's photo_set_update_item, so the
/// record set, the counters and the cover pointer move together.
pub async fn commit_photo_txn(
    client: &DynamoClient,
    items: Vec<TransactWriteItem>,
) -> Result<(), TxnError> {
    let mut request = client.transact_write_items();
    for item in items {
        request = request.transact_items(item);
    }

    match request.send().await {
        Ok(_) => Ok(()),
        Err(e) => {
            if let Some(TransactWriteItemsError::TransactionCanceledException(cancel)) =
                e.as_service_error()
            {
                if cancellation_is_conditional(cancel) {
                    return Err(TxnError::Conflict);
                }
            }
            Err(TxnError::Other(format!(
                "DynamoDB transact_write_items error: {}",
                e
            )))
        }
    }
}

/// A cancelled transaction only means a racing writer when one of the
/// per-item reasons is a failed condition check. DynamoDB also cancels
/// for validation errors, throttling and capacity - those are not
/// conflicts and must surface as plain errors.
fn cancellation_is_conditional(cancel: &TransactionCanceledException) -> bool {
    cancel
        .cancellation_reasons()
        .iter()
        .any(|reason| reason.code() == Some("ConditionalCheckFailed"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_dynamodb::types::CancellationReason;

    fn canceled_with(codes: &[&str]) -> TransactionCanceledException {
        let mut builder = TransactionCanceledException::builder().message("Transaction cancelled");
        for code in codes {
            builder = builder.cancellation_reasons(
                CancellationReason::builder().code(code.to_string()).build(),
            );
        }
        builder.build()
    }

    #[test]
    fn condition_check_failure_is_a_conflict() {
        // reorder's photo_rev guard tripping: one item fails its
        // condition, the rest report None
        let cancel = canceled_with(&["None", "ConditionalCheckFailed"]);
        assert!(cancellation_is_conditional(&cancel));
    }

    #[test]
    fn validation_cancellation_is_not_a_conflict() {
        // e.g. photo_rev + :one against a listing item that does not
        // exist - a bad request, not a racing writer
        let cancel = canceled_with(&["ValidationError", "None"]);
        assert!(!cancellation_is_conditional(&cancel));
    }

    #[test]
    fn cancellation_without_reasons_is_not_a_conflict() {
        let cancel = TransactionCanceledException::builder()
            .message("Transaction cancelled")
            .build();
        assert!(!cancellation_is_conditional(&cancel));
    }
}
