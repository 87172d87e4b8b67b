use image::ImageFormat;

use crate::error::LabelError;

/// A changed object, as identified by the storage notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub bucket: String,
    pub name: String,
}

impl StorageEvent {
    pub fn new(bucket: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            name: name.into(),
        }
    }

    /// Builds an event from the raw notification fields. S3 delivers keys
    /// form-encoded, so `+` stands for a space and the rest is percent-encoded.
    pub fn from_notification(bucket: &str, raw_key: &str) -> Result<Self, LabelError> {
        let key = urlencoding::decode(&raw_key.replace('+', " "))
            .map_err(|e| LabelError::InvalidEvent(format!("undecodable key {raw_key:?}: {e}")))?
            .into_owned();
        let event = Self::new(bucket, key);
        event.validate()?;
        Ok(event)
    }

    pub fn validate(&self) -> Result<(), LabelError> {
        if self.bucket.is_empty() {
            return Err(LabelError::InvalidEvent("empty bucket name".to_string()));
        }
        if self.name.is_empty() {
            return Err(LabelError::InvalidEvent(format!(
                "empty object key in bucket {}",
                self.bucket
            )));
        }
        Ok(())
    }
}

/// Image bytes ready to be submitted for label detection.
#[derive(Debug)]
pub struct ImageHandle {
    bytes: Vec<u8>,
    format: ImageFormat,
}

impl ImageHandle {
    /// Accepts only what the labeling service can read: non-empty JPEG or
    /// PNG data no larger than `max_bytes`.
    pub fn from_bytes(bytes: Vec<u8>, max_bytes: usize) -> Result<Self, String> {
        if bytes.is_empty() {
            return Err("object is empty".to_string());
        }
        if bytes.len() > max_bytes {
            return Err(format!(
                "object is {} bytes, limit is {} bytes",
                bytes.len(),
                max_bytes
            ));
        }
        let format = image::guess_format(&bytes)
            .map_err(|_| "unrecognised image format".to_string())?;
        match format {
            ImageFormat::Jpeg | ImageFormat::Png => Ok(Self { bytes, format }),
            other => Err(format!("unsupported image format {other:?}")),
        }
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// A descriptive tag returned by label detection. `score` is in `0.0..=1.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub description: String,
    pub score: f32,
}
