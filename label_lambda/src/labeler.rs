use tracing::{debug, info, instrument};

use crate::config::HandlerConfig;
use crate::error::LabelError;
use crate::model::{ImageHandle, Label, StorageEvent};
use crate::storage::ObjectSource;
use crate::vision::LabelDetector;

/// Fetches uploaded objects and logs the labels detected in them.
///
/// The storage and detection clients are built once per execution
/// environment and shared by every invocation; nothing else is kept between
/// calls to [`LabelHandler::handle`].
pub struct LabelHandler<S, D> {
    storage: S,
    detector: D,
    config: HandlerConfig,
}

impl<S, D> LabelHandler<S, D>
where
    S: ObjectSource,
    D: LabelDetector,
{
    pub fn new(storage: S, detector: D, config: HandlerConfig) -> Self {
        Self {
            storage,
            detector,
            config,
        }
    }

    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    #[instrument(skip_all, fields(bucket = %event.bucket, key = %event.name))]
    pub async fn handle(&self, event: &StorageEvent) -> Result<Vec<Label>, LabelError> {
        info!("Processing file: {}; bucket: {}", event.name, event.bucket);
        event.validate()?;

        let bytes = self
            .storage
            .read_object(&event.bucket, &event.name, self.config.max_image_bytes)
            .await?;
        let image = ImageHandle::from_bytes(bytes, self.config.max_image_bytes).map_err(
            |reason| LabelError::Decode {
                bucket: event.bucket.clone(),
                key: event.name.clone(),
                reason,
            },
        )?;
        debug!(bytes = image.size(), format = ?image.format(), "Loaded image");

        let labels = self
            .detector
            .label_image(image, self.config.max_labels)
            .await?;

        info!("Labels:");
        for label in &labels {
            info!(score = label.score, "{}", label.description);
        }
        Ok(labels)
    }
}
