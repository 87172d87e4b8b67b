use async_trait::async_trait;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::Client as S3Client;

use crate::error::LabelError;

const SERVICE: &str = "s3";

/// Read access to objects in a bucket.
#[async_trait]
pub trait ObjectSource: Send + Sync {
    /// Reads the whole object into memory, refusing objects that announce
    /// more than `max_bytes` before any of the body is fetched.
    async fn read_object(
        &self,
        bucket: &str,
        key: &str,
        max_bytes: usize,
    ) -> Result<Vec<u8>, LabelError>;
}

#[async_trait]
impl ObjectSource for S3Client {
    async fn read_object(
        &self,
        bucket: &str,
        key: &str,
        max_bytes: usize,
    ) -> Result<Vec<u8>, LabelError> {
        let output = self
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| match e.as_service_error() {
                Some(err) => classify_get_object(bucket, key, err),
                None => LabelError::Transient {
                    service: SERVICE,
                    message: DisplayErrorContext(&e).to_string(),
                },
            })?;

        if let Some(length) = output.content_length() {
            if length > max_bytes as i64 {
                return Err(too_large(bucket, key, max_bytes));
            }
        }

        // Content-Length is optional, so the limit is enforced while reading
        // too. The response stream is dropped, and its connection released,
        // on every path out of here.
        let mut body = output.body;
        let mut bytes = Vec::new();
        while let Some(chunk) = body.try_next().await.map_err(|e| LabelError::Transient {
            service: SERVICE,
            message: format!("reading {bucket}/{key}: {e}"),
        })? {
            if bytes.len() + chunk.len() > max_bytes {
                return Err(too_large(bucket, key, max_bytes));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }
}

fn too_large(bucket: &str, key: &str, max_bytes: usize) -> LabelError {
    LabelError::Decode {
        bucket: bucket.to_string(),
        key: key.to_string(),
        reason: format!("object is larger than the {max_bytes} byte limit"),
    }
}

fn classify_get_object(bucket: &str, key: &str, err: &GetObjectError) -> LabelError {
    if err.is_no_such_key() || err.code() == Some("NoSuchBucket") {
        return LabelError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        };
    }
    if let GetObjectError::InvalidObjectState(archived) = err {
        return LabelError::Unavailable {
            bucket: bucket.to_string(),
            key: key.to_string(),
            reason: archived
                .message()
                .or_else(|| err.message())
                .unwrap_or("object is archived")
                .to_string(),
        };
    }
    let message = err.message().unwrap_or("no message").to_string();
    match err.code() {
        Some("AccessDenied") => LabelError::PermissionDenied {
            service: SERVICE,
            message,
        },
        code => LabelError::Transient {
            service: SERVICE,
            message: format!("{}: {message}", code.unwrap_or("unknown error")),
        },
    }
}
