use aws_config::BehaviorVersion;
use aws_sdk_rekognition::Client as RekognitionClient;
use aws_sdk_s3::Client as S3Client;
use lambda_runtime::{run, service_fn, tracing, Error};
mod config;
mod error;
mod event_handler;
mod labeler;
mod model;
mod storage;
mod vision;
use config::HandlerConfig;
use event_handler::function_handler;
use labeler::LabelHandler;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing::subscriber::fmt().json().init();
    let config = HandlerConfig::from_env()?;
    tracing::info!(
        max_labels = config.max_labels,
        max_image_bytes = config.max_image_bytes,
        "Loaded handler configuration"
    );
    let shared_config = aws_config::load_defaults(BehaviorVersion::v2025_01_17()).await;
    let handler = LabelHandler::new(
        S3Client::new(&shared_config),
        RekognitionClient::new(&shared_config),
        config,
    );
    run(service_fn(|event| function_handler(event, &handler))).await
}
