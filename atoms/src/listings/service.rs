use aws_sdk_dynamodb::types::{AttributeValue, TransactWriteItem, Update};
use aws_sdk_dynamodb::Client as DynamoClient;
use std::collections::HashMap;

use super::model::{CreateListingPayload, Listing, UpdateListingPayload};

/// What a photo mutation does to the listing's denormalized cover URL.
#[derive(Debug, Clone)]
pub enum CoverPointer {
    Unchanged,
    Set(String),
    Clear,
}

fn listing_from_item(item: &HashMap<String, AttributeValue>) -> Option<Listing> {
    let sk = item.get("SK").and_then(|v| v.as_s().ok())?;
    let listing_id = sk.strip_prefix("LISTING#")?;

    Some(Listing {
        listing_id: listing_id.to_string(),
        address: item.get("address").and_then(|v| v.as_s().ok()).map(|s| s.to_string()).unwrap_or_default(),
        suburb: item.get("suburb").and_then(|v| v.as_s().ok()).map(|s| s.to_string()).unwrap_or_default(),
        price: item.get("price").and_then(|v| v.as_n().ok()).and_then(|n| n.parse().ok()),
        listing_state: item.get("listing_state").and_then(|v| v.as_s().ok()).map(|s| s.to_string()).unwrap_or_else(|| "draft".to_string()),
        cover_photo_url: item.get("cover_photo_url").and_then(|v| v.as_s().ok()).map(|s| s.to_string()),
        photo_count: item.get("photo_count").and_then(|v| v.as_n().ok()).and_then(|n| n.parse().ok()).unwrap_or(0),
        photo_rev: item.get("photo_rev").and_then(|v| v.as_n().ok()).and_then(|n| n.parse().ok()).unwrap_or(0),
        created_at: item.get("created_at").and_then(|v| v.as_s().ok()).map(|s| s.to_string()).unwrap_or_default(),
    })
}

/// Create a listing with an empty gallery (no cover, photo_rev 0)
pub async fn create_listing(
    client: &DynamoClient,
    table_name: &str,
    payload: CreateListingPayload,
) -> Result<Listing, String> {
    let listing_id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    let listing_state = payload.listing_state.unwrap_or_else(|| "draft".to_string());

    let mut builder = client
        .put_item()
        .table_name(table_name)
        .item("PK", AttributeValue::S("LISTING".to_string()))
        .item("SK", AttributeValue::S(format!("LISTING#{}", listing_id)))
        .item("address", AttributeValue::S(payload.address.clone()))
        .item("suburb", AttributeValue::S(payload.suburb.clone()))
        .item("listing_state", AttributeValue::S(listing_state.clone()))
        .item("photo_count", AttributeValue::N("0".to_string()))
        .item("photo_rev", AttributeValue::N("0".to_string()))
        .item("created_at", AttributeValue::S(now.clone()));

    if let Some(price) = payload.price {
        builder = builder.item("price", AttributeValue::N(price.to_string()));
    }

    builder
        .send()
        .await
        .map_err(|e| format!("DynamoDB put_item error: {}", e))?;

    Ok(Listing {
        listing_id,
        address: payload.address,
        suburb: payload.suburb,
        price: payload.price,
        listing_state,
        cover_photo_url: None,
        photo_count: 0,
        photo_rev: 0,
        created_at: now,
    })
}

/// Get a specific listing
pub async fn get_listing(
    client: &DynamoClient,
    table_name: &str,
    listing_id: &str,
) -> Result<Listing, String> {
    let result = client
        .get_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S("LISTING".to_string()))
        .key("SK", AttributeValue::S(format!("LISTING#{}", listing_id)))
        .send()
        .await
        .map_err(|e| format!("DynamoDB get_item error: {}", e))?;

    result
        .item()
        .and_then(listing_from_item)
        .ok_or_else(|| "Listing not found".to_string())
}

/// List all listings
pub async fn list_listings(client: &DynamoClient, table_name: &str) -> Result<Vec<Listing>, String> {
    let result = client
        .query()
        .table_name(table_name)
        .key_condition_expression("PK = :pk")
        .expression_attribute_values(":pk", AttributeValue::S("LISTING".to_string()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB query error: {}", e))?;

    let mut listings: Vec<Listing> = result.items().iter().filter_map(listing_from_item).collect();
    listings.sort_by(|a, b| a.created_at.cmp(&b.created_at));

    Ok(listings)
}

/// Update a listing's own fields. Never touches cover_photo_url,
/// photo_count or photo_rev - those belong to the photo mutations.
pub async fn update_listing(
    client: &DynamoClient,
    table_name: &str,
    listing_id: &str,
    payload: UpdateListingPayload,
) -> Result<Listing, String> {
    let mut update_expr = vec![];
    let mut expr_values = HashMap::new();

    if let Some(address) = payload.address {
        update_expr.push("address = :address");
        expr_values.insert(":address".to_string(), AttributeValue::S(address));
    }

    if let Some(suburb) = payload.suburb {
        update_expr.push("suburb = :suburb");
        expr_values.insert(":suburb".to_string(), AttributeValue::S(suburb));
    }

    if let Some(price) = payload.price {
        update_expr.push("price = :price");
        expr_values.insert(":price".to_string(), AttributeValue::N(price.to_string()));
    }

    if let Some(listing_state) = payload.listing_state {
        update_expr.push("listing_state = :listing_state");
        expr_values.insert(":listing_state".to_string(), AttributeValue::S(listing_state));
    }

    if !update_expr.is_empty() {
        let update_expression = format!("SET {}", update_expr.join(", "));

        let mut builder = client
            .update_item()
            .table_name(table_name)
            .key("PK", AttributeValue::S("LISTING".to_string()))
            .key("SK", AttributeValue::S(format!("LISTING#{}", listing_id)))
            .update_expression(update_expression);

        for (k, v) in expr_values {
            builder = builder.expression_attribute_values(k, v);
        }

        builder
            .send()
            .await
            .map_err(|e| format!("DynamoDB update_item error: {}", e))?;
    }

    get_listing(client, table_name, listing_id).await
}

/// Delete the listing meta item. Photo records and blobs are removed
/// by the gallery teardown before this is called.
pub async fn delete_listing_record(
    client: &DynamoClient,
    table_name: &str,
    listing_id: &str,
) -> Result<(), String> {
    client
        .delete_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S("LISTING".to_string()))
        .key("SK", AttributeValue::S(format!("LISTING#{}", listing_id)))
        .send()
        .await
        .map_err(|e| format!("DynamoDB delete_item error: {}", e))?;

    Ok(())
}

/// The single transact item every photo mutation uses to keep the
/// listing honest: bumps photo_rev, applies the count delta, and moves
/// the denormalized cover URL in the same transaction as the flag
/// change. This is the only writer of cover_photo_url.
///
/// `expected_rev` turns the item into a compare-and-swap: the whole
/// transaction is cancelled if another writer bumped photo_rev first.
pub fn photo_set_update_item(
    table_name: &str,
    listing_id: &str,
    count_delta: i64,
    cover: CoverPointer,
    expected_rev: Option<i64>,
) -> Result<TransactWriteItem, String> {
    let mut set_parts = vec![
        "photo_rev = photo_rev + :one".to_string(),
        "photo_count = photo_count + :delta".to_string(),
    ];
    let mut remove_cover = false;

    let mut builder = Update::builder()
        .table_name(table_name)
        .key("PK", AttributeValue::S("LISTING".to_string()))
        .key("SK", AttributeValue::S(format!("LISTING#{}", listing_id)))
        .expression_attribute_values(":one", AttributeValue::N("1".to_string()))
        .expression_attribute_values(":delta", AttributeValue::N(count_delta.to_string()));

    match cover {
        CoverPointer::Unchanged => {}
        CoverPointer::Set(url) => {
            set_parts.push("cover_photo_url = :cover".to_string());
            builder = builder.expression_attribute_values(":cover", AttributeValue::S(url));
        }
        CoverPointer::Clear => {
            remove_cover = true;
        }
    }

    let mut update_expression = format!("SET {}", set_parts.join(", "));
    if remove_cover {
        update_expression.push_str(" REMOVE cover_photo_url");
    }
    builder = builder.update_expression(update_expression);

    if let Some(rev) = expected_rev {
        builder = builder
            .condition_expression("photo_rev = :expected_rev")
            .expression_attribute_values(":expected_rev", AttributeValue::N(rev.to_string()));
    }

    let update = builder
        .build()
        .map_err(|e| format!("DynamoDB update builder error: {}", e))?;

    Ok(TransactWriteItem::builder().update(update).build())
}
