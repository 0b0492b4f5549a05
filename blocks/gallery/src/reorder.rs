use aws_sdk_dynamodb::Client as DynamoClient;
use lambda_http::{http::StatusCode, Body, Error as LambdaError, Response};

use nestly_atoms::listings::http::error_response;
use nestly_atoms::listings::service::{get_listing, photo_set_update_item, CoverPointer};
use nestly_atoms::photos::model::Photo;
use nestly_atoms::photos::service as photos;
use nestly_atoms::photos::service::TxnError;

use crate::types::ReorderPayload;

/// The drag gesture as an explicit state machine, so the reindexing
/// logic is testable without a UI harness.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragState {
    Idle,
    Dragging { source: usize },
    DropTarget { source: usize, target: usize },
}

impl DragState {
    pub fn drag_start(self, index: usize) -> DragState {
        DragState::Dragging { source: index }
    }

    pub fn drag_over(self, index: usize) -> DragState {
        match self {
            DragState::Idle => DragState::Idle,
            DragState::Dragging { source } | DragState::DropTarget { source, .. } => {
                DragState::DropTarget { source, target: index }
            }
        }
    }

    /// Finish the gesture. Returns the (source, target) pair to apply,
    /// or None when nothing moved.
    pub fn release(self) -> (DragState, Option<(usize, usize)>) {
        match self {
            DragState::DropTarget { source, target } if source != target => {
                (DragState::Idle, Some((source, target)))
            }
            _ => (DragState::Idle, None),
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct OrderAssignment {
    pub photo_id: String,
    pub order: i32,
}

/// Compute the full order rewrite for one drag: remove at source,
/// reinsert at target, then reassign order = position for the whole
/// sequence. Only assignments that differ from the stored order are
/// returned, so dropping an item on itself issues no writes. None means
/// the gesture is a no-op or out of range.
pub fn plan_reorder(photos: &[Photo], source: usize, target: usize) -> Option<Vec<OrderAssignment>> {
    if source == target || source >= photos.len() || target >= photos.len() {
        return None;
    }

    let mut sequence: Vec<&Photo> = photos.iter().collect();
    let moved = sequence.remove(source);
    sequence.insert(target, moved);

    let assignments: Vec<OrderAssignment> = sequence
        .iter()
        .enumerate()
        .filter(|(position, photo)| photo.order != *position as i32)
        .map(|(position, photo)| OrderAssignment {
            photo_id: photo.photo_id.clone(),
            order: position as i32,
        })
        .collect();

    Some(assignments)
}

#[derive(Debug)]
pub enum ReorderOutcome {
    /// Gesture changed nothing; no writes were issued.
    Unchanged(Vec<Photo>),
    /// New order persisted.
    Applied(Vec<Photo>),
    /// A racing writer was detected; carries the authoritative gallery
    /// from the single resync.
    Conflict(Vec<Photo>),
    /// Persistence failed for another reason; the optimistic order was
    /// discarded and the authoritative gallery reloaded.
    Failed { error: String, photos: Vec<Photo> },
}

/// Reorder Engine: persist a drag gesture as one transaction - every
/// changed order value plus a conditional photo_rev bump on the
/// listing. The cover pointer is re-asserted in the same transaction;
/// cover identity never changes here, only its position.
pub async fn reorder_photos(
    dynamo: &DynamoClient,
    table_name: &str,
    listing_id: &str,
    source: usize,
    target: usize,
) -> Result<ReorderOutcome, String> {
    let listing = get_listing(dynamo, table_name, listing_id).await?;
    let gallery = photos::load_photos_for_listing(dynamo, table_name, listing_id).await?;

    let assignments = match plan_reorder(&gallery, source, target) {
        Some(assignments) if !assignments.is_empty() => assignments,
        _ => return Ok(ReorderOutcome::Unchanged(gallery)),
    };

    let mut items = Vec::new();
    for assignment in &assignments {
        items.push(photos::update_order_txn_item(
            table_name,
            listing_id,
            &assignment.photo_id,
            assignment.order,
        )?);
    }

    let cover = match gallery.iter().find(|p| p.is_cover) {
        Some(cover_photo) => CoverPointer::Set(cover_photo.url.clone()),
        None => CoverPointer::Unchanged,
    };
    items.push(photo_set_update_item(
        table_name,
        listing_id,
        0,
        cover,
        Some(listing.photo_rev),
    )?);

    match photos::commit_photo_txn(dynamo, items).await {
        Ok(()) => {
            let mut updated = gallery;
            for assignment in &assignments {
                if let Some(photo) = updated.iter_mut().find(|p| p.photo_id == assignment.photo_id) {
                    photo.order = assignment.order;
                }
            }
            updated.sort_by_key(|p| p.order);
            Ok(ReorderOutcome::Applied(updated))
        }
        Err(TxnError::Conflict) => {
            tracing::warn!(
                "reorder_photos: photo_rev moved under us for listing {}, reloading",
                listing_id
            );
            let authoritative =
                photos::load_photos_for_listing(dynamo, table_name, listing_id).await?;
            Ok(ReorderOutcome::Conflict(authoritative))
        }
        Err(TxnError::Other(e)) => {
            // one resync attempt; if that also fails, surface both
            // errors so the persistence failure is not lost
            let authoritative = photos::load_photos_for_listing(dynamo, table_name, listing_id)
                .await
                .map_err(|reload_err| resync_error(&e, &reload_err))?;
            Ok(ReorderOutcome::Failed { error: e, photos: authoritative })
        }
    }
}

fn resync_error(persist_err: &str, reload_err: &str) -> String {
    format!(
        "order persistence failed: {} (authoritative reload also failed: {})",
        persist_err, reload_err
    )
}

/// HTTP Handler: PUT /listings/{id}/photos/order
pub async fn reorder_photos_handler(
    dynamo: &DynamoClient,
    table_name: &str,
    listing_id: &str,
    body: &[u8],
) -> Result<Response<Body>, LambdaError> {
    let payload: ReorderPayload = serde_json::from_slice(body)?;

    match reorder_photos(
        dynamo,
        table_name,
        listing_id,
        payload.source_index,
        payload.target_index,
    )
    .await
    {
        Ok(ReorderOutcome::Unchanged(photos)) | Ok(ReorderOutcome::Applied(photos)) => {
            Ok(Response::builder()
                .status(StatusCode::OK)
                .header("Content-Type", "application/json")
                .header("Access-Control-Allow-Origin", "*")
                .body(serde_json::to_string(&photos)?.into())
                .map_err(Box::new)?)
        }
        Ok(ReorderOutcome::Conflict(photos)) => Ok(Response::builder()
            .status(StatusCode::CONFLICT)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(
                serde_json::json!({
                    "error": "gallery changed concurrently, state reloaded",
                    "photos": photos,
                })
                .to_string()
                .into(),
            )
            .map_err(Box::new)?),
        Ok(ReorderOutcome::Failed { error, photos }) => {
            tracing::error!(
                "reorder_photos_handler persistence failed: listing_id={}, error={}",
                listing_id,
                error
            );
            Ok(Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .header("Content-Type", "application/json")
                .header("Access-Control-Allow-Origin", "*")
                .body(
                    serde_json::json!({ "error": error, "photos": photos })
                        .to_string()
                        .into(),
                )
                .map_err(Box::new)?)
        }
        Err(e) if e == "Listing not found" => error_response(StatusCode::NOT_FOUND, &e),
        Err(e) => {
            tracing::error!(
                "reorder_photos_handler failed: listing_id={}, error={}",
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

    fn assignment(id: &str, order: i32) -> OrderAssignment {
        OrderAssignment { photo_id: id.to_string(), order }
    }

    #[test]
    fn drag_last_to_front_shifts_everything() {
        // A(0, cover), B(1), C(2); drag C to position 0
        let gallery = vec![photo("a", 0, true), photo("b", 1, false), photo("c", 2, false)];
        let assignments = plan_reorder(&gallery, 2, 0).unwrap();

        assert_eq!(
            assignments,
            vec![assignment("c", 0), assignment("a", 1), assignment("b", 2)]
        );
    }

    #[test]
    fn adjacent_swap_touches_only_the_pair() {
        let gallery = vec![photo("a", 0, false), photo("b", 1, false), photo("c", 2, false)];
        let assignments = plan_reorder(&gallery, 0, 1).unwrap();

        assert_eq!(assignments, vec![assignment("b", 0), assignment("a", 1)]);
    }

    #[test]
    fn dropping_on_own_position_is_a_no_op() {
        let gallery = vec![photo("a", 0, false), photo("b", 1, false)];
        assert_eq!(plan_reorder(&gallery, 1, 1), None);
    }

    #[test]
    fn out_of_range_gesture_is_rejected() {
        let gallery = vec![photo("a", 0, false)];
        assert_eq!(plan_reorder(&gallery, 0, 5), None);
        assert_eq!(plan_reorder(&gallery, 5, 0), None);
    }

    #[test]
    fn rewrite_closes_gaps_left_by_deletes() {
        // orders 0, 2, 5 after deletes; any real move rewrites 0..n
        let gallery = vec![photo("a", 0, true), photo("b", 2, false), photo("c", 5, false)];
        let assignments = plan_reorder(&gallery, 1, 2).unwrap();

        // b lands on position 2 which it already stores; only c changes
        assert_eq!(assignments, vec![assignment("c", 1)]);
    }

    #[test]
    fn failed_resync_keeps_the_persistence_error() {
        let message = resync_error("DynamoDB transact_write_items error: timeout", "query throttled");
        assert!(message.contains("DynamoDB transact_write_items error: timeout"));
        assert!(message.contains("query throttled"));
    }

    #[test]
    fn drag_state_machine_yields_the_gesture() {
        let state = DragState::Idle.drag_start(2).drag_over(0);
        assert_eq!(state, DragState::DropTarget { source: 2, target: 0 });

        let (state, gesture) = state.release();
        assert_eq!(state, DragState::Idle);
        assert_eq!(gesture, Some((2, 0)));
    }

    #[test]
    fn drag_state_machine_ignores_degenerate_gestures() {
        // drop without a target
        let (_, gesture) = DragState::Idle.drag_start(1).release();
        assert_eq!(gesture, None);

        // drop on own position
        let (_, gesture) = DragState::Idle.drag_start(1).drag_over(1).release();
        assert_eq!(gesture, None);

        // drag_over without drag_start
        assert_eq!(DragState::Idle.drag_over(3), DragState::Idle);
    }
}
