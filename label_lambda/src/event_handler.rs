use std::time::{Duration, SystemTime, UNIX_EPOCH};

use aws_lambda_events::event::s3::{S3Event, S3EventRecord};
use lambda_runtime::{tracing, Context, Error, LambdaEvent};
use tokio::time::Instant;

use crate::error::LabelError;
use crate::labeler::LabelHandler;
use crate::model::StorageEvent;
use crate::storage::ObjectSource;
use crate::vision::LabelDetector;

fn storage_event(record: &S3EventRecord) -> Result<StorageEvent, LabelError> {
    let bucket = record.s3.bucket.name.as_deref().unwrap_or_default();
    let key = record.s3.object.key.as_deref().unwrap_or_default();
    StorageEvent::from_notification(bucket, key)
}

/// Time left before the runtime's deadline, less `margin`. `None` when the
/// context carries no deadline.
fn time_remaining(context: &Context, margin: Duration) -> Option<Duration> {
    if context.deadline == 0 {
        return None;
    }
    let deadline = UNIX_EPOCH + Duration::from_millis(context.deadline);
    let left = deadline
        .duration_since(SystemTime::now())
        .unwrap_or(Duration::ZERO);
    Some(left.saturating_sub(margin))
}

async fn label_record<S, D>(
    handler: &LabelHandler<S, D>,
    record: &S3EventRecord,
    deadline: Option<Instant>,
) -> Result<usize, LabelError>
where
    S: ObjectSource,
    D: LabelDetector,
{
    let event = storage_event(record)?;
    let labels = match deadline {
        Some(at) => tokio::time::timeout_at(at, handler.handle(&event))
            .await
            .unwrap_or_else(|_| {
                Err(LabelError::DeadlineExceeded {
                    bucket: event.bucket.clone(),
                    key: event.name.clone(),
                })
            })?,
        None => handler.handle(&event).await?,
    };
    Ok(labels.len())
}

pub(crate) async fn function_handler<S, D>(
    event: LambdaEvent<S3Event>,
    handler: &LabelHandler<S, D>,
) -> Result<(), Error>
where
    S: ObjectSource,
    D: LabelDetector,
{
    let (payload, context) = (event.payload, event.context);
    if payload.records.is_empty() {
        tracing::warn!("No records found in S3 event");
        return Ok(());
    }

    let deadline = time_remaining(&context, handler.config().deadline_margin)
        .map(|left| Instant::now() + left);
    let mut labeled = 0;
    let mut dropped = 0;
    for record in &payload.records {
        let bucket = record.s3.bucket.name.as_deref().unwrap_or_default();
        let key = record.s3.object.key.as_deref().unwrap_or_default();
        match label_record(handler, record, deadline).await {
            Ok(count) => {
                labeled += 1;
                tracing::debug!(bucket, key, labels = count, "Labeled object");
            }
            Err(err) if err.is_retryable() => {
                tracing::error!(
                    bucket,
                    key,
                    kind = err.kind(),
                    request_id = %context.request_id,
                    "Failed to label object, event will be redelivered: {}",
                    err
                );
                return Err(err.into());
            }
            Err(err) => {
                dropped += 1;
                tracing::error!(
                    bucket,
                    key,
                    kind = err.kind(),
                    request_id = %context.request_id,
                    "Skipping object that cannot be labeled: {}",
                    err
                );
            }
        }
    }
    tracing::info!("Labeled {} object(s), skipped {}", labeled, dropped);
    Ok(())
}
