use async_trait::async_trait;
use aws_sdk_rekognition::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_rekognition::operation::detect_labels::DetectLabelsError;
use aws_sdk_rekognition::primitives::Blob;
use aws_sdk_rekognition::types::Image;
use aws_sdk_rekognition::Client as RekognitionClient;

use crate::error::LabelError;
use crate::model::{ImageHandle, Label};

const SERVICE: &str = "rekognition";

/// Label detection over in-memory images.
#[async_trait]
pub trait LabelDetector: Send + Sync {
    /// Returns at most `max_labels` labels in the service's ranking order.
    async fn label_image(
        &self,
        image: ImageHandle,
        max_labels: i32,
    ) -> Result<Vec<Label>, LabelError>;
}

#[async_trait]
impl LabelDetector for RekognitionClient {
    async fn label_image(
        &self,
        image: ImageHandle,
        max_labels: i32,
    ) -> Result<Vec<Label>, LabelError> {
        let image = Image::builder()
            .bytes(Blob::new(image.into_bytes()))
            .build();
        let output = self
            .detect_labels()
            .image(image)
            .max_labels(max_labels)
            .send()
            .await
            .map_err(|e| match e.as_service_error() {
                Some(err) => classify_detect_labels(err),
                None => LabelError::Transient {
                    service: SERVICE,
                    message: DisplayErrorContext(&e).to_string(),
                },
            })?;

        let cap = usize::try_from(max_labels).unwrap_or(0);
        Ok(output
            .labels()
            .iter()
            .take(cap)
            .map(|label| Label {
                description: label.name().unwrap_or_default().to_string(),
                score: label.confidence().unwrap_or_default() / 100.0,
            })
            .collect())
    }
}

fn classify_detect_labels(err: &DetectLabelsError) -> LabelError {
    // Modeled exceptions carry their own message; metadata is the fallback.
    let message = |own: Option<&str>| match own {
        Some(own) => own.to_string(),
        None => err.message().unwrap_or("no message").to_string(),
    };
    match err {
        DetectLabelsError::ProvisionedThroughputExceededException(e) => {
            LabelError::QuotaExceeded(message(e.message()))
        }
        DetectLabelsError::ThrottlingException(e) => {
            LabelError::QuotaExceeded(message(e.message()))
        }
        DetectLabelsError::InvalidImageFormatException(e) => {
            LabelError::InvalidImage(message(e.message()))
        }
        DetectLabelsError::ImageTooLargeException(e) => {
            LabelError::InvalidImage(message(e.message()))
        }
        DetectLabelsError::InvalidParameterException(e) => {
            LabelError::InvalidImage(message(e.message()))
        }
        DetectLabelsError::AccessDeniedException(e) => LabelError::PermissionDenied {
            service: SERVICE,
            message: message(e.message()),
        },
        other => LabelError::Transient {
            service: SERVICE,
            message: format!(
                "{}: {}",
                other.code().unwrap_or("unknown error"),
                message(None)
            ),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::JPEG;
    use aws_sdk_rekognition::error::ErrorMetadata;
    use aws_sdk_rekognition::operation::detect_labels::DetectLabelsOutput;
    use aws_sdk_rekognition::types::error::{
        AccessDeniedException, InternalServerError, InvalidImageFormatException,
        ThrottlingException,
    };
    use aws_sdk_rekognition::types::Label as RekognitionLabel;
    use aws_smithy_mocks::{mock, mock_client};

    fn label(name: &str, confidence: f32) -> RekognitionLabel {
        RekognitionLabel::builder()
            .name(name)
            .confidence(confidence)
            .build()
    }

    fn jpeg() -> ImageHandle {
        ImageHandle::from_bytes(JPEG.to_vec(), 1024).unwrap()
    }

    #[tokio::test]
    async fn test_labels_keep_service_order() {
        let detect_labels_rule = mock!(aws_sdk_rekognition::Client::detect_labels)
            .match_requests(|req| {
                let bytes = req.image().and_then(|image| image.bytes());
                req.max_labels() == Some(10)
                    && bytes.map(|b| b.clone().into_inner()) == Some(JPEG.to_vec())
            })
            .then_output(|| {
                DetectLabelsOutput::builder()
                    .labels(label("Mammal", 91.0))
                    .labels(label("Cat", 98.0))
                    .build()
            });
        let rekognition = mock_client!(aws_sdk_rekognition, [&detect_labels_rule]);

        let labels = rekognition.label_image(jpeg(), 10).await.unwrap();
        let names: Vec<&str> = labels.iter().map(|l| l.description.as_str()).collect();
        assert_eq!(names, ["Mammal", "Cat"]);
        assert!((labels[1].score - 0.98).abs() < 1e-6);
        assert_eq!(detect_labels_rule.num_calls(), 1);
    }

    #[tokio::test]
    async fn test_over_long_response_is_truncated() {
        let detect_labels_rule =
            mock!(aws_sdk_rekognition::Client::detect_labels).then_output(|| {
                let labels = (0..15).map(|i| label(&format!("label-{i}"), 50.0)).collect();
                DetectLabelsOutput::builder().set_labels(Some(labels)).build()
            });
        let rekognition = mock_client!(aws_sdk_rekognition, [&detect_labels_rule]);

        let labels = rekognition.label_image(jpeg(), 10).await.unwrap();
        assert_eq!(labels.len(), 10);
        assert_eq!(labels[9].description, "label-9");
    }

    #[tokio::test]
    async fn test_invalid_image_is_permanent() {
        let detect_labels_rule =
            mock!(aws_sdk_rekognition::Client::detect_labels).then_error(|| {
                DetectLabelsError::InvalidImageFormatException(
                    InvalidImageFormatException::builder()
                        .message("Request has invalid image format")
                        .build(),
                )
            });
        let rekognition = mock_client!(aws_sdk_rekognition, [&detect_labels_rule]);

        let err = rekognition.label_image(jpeg(), 10).await.unwrap_err();
        assert_eq!(err.kind(), "invalid_image");
        assert_eq!(
            err.to_string(),
            "image rejected by label detection: Request has invalid image format"
        );
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_classification() {
        let throttled = DetectLabelsError::ThrottlingException(
            ThrottlingException::builder().message("Rate exceeded").build(),
        );
        let err = classify_detect_labels(&throttled);
        assert_eq!(err.to_string(), "label detection quota exceeded: Rate exceeded");
        assert!(err.is_retryable());

        let metadata_only = DetectLabelsError::ThrottlingException(
            ThrottlingException::builder()
                .meta(ErrorMetadata::builder().message("Slow down").build())
                .build(),
        );
        assert_eq!(
            classify_detect_labels(&metadata_only).to_string(),
            "label detection quota exceeded: Slow down"
        );

        let denied = DetectLabelsError::AccessDeniedException(
            AccessDeniedException::builder()
                .message("User is not authorized")
                .build(),
        );
        assert_eq!(
            classify_detect_labels(&denied).to_string(),
            "rekognition denied access: User is not authorized"
        );

        let internal =
            DetectLabelsError::InternalServerError(InternalServerError::builder().build());
        let err = classify_detect_labels(&internal);
        assert_eq!(err.kind(), "transient");
        assert!(err.is_retryable());
    }
}
