//! Object-tagging label detection (spec.md §4.3 step 9, §4.7), grounded on
//! `pkg/aws_repository/aws_rekognition.go`'s `GetImageLabels`: three
//! Rekognition calls against the same stored S3 object — `DetectLabels`,
//! `DetectModerationLabels`, `DetectText` — concatenated into one label
//! list. Moderation and text detection errors are swallowed there (`_ :=`);
//! only `DetectLabels` failing drops the whole call, and even that is
//! swallowed one level up by `GetLabels`' `labels, _ :=`, so detection is
//! best-effort from the worker's point of view.
//!
//! `StartVideoLabelsDetection` in the same ground truth is an unimplemented
//! stub (`return nil, nil`, the two `StartLabelDetection`/
//! `StartContentModeration` calls commented out) — video strategies get
//! [`NullLabelDetector`] rather than a half-built async-job client.

use async_trait::async_trait;
use aws_sdk_rekognition::types::Image;
use aws_sdk_rekognition::Client as RekognitionClient;

/// Matches `maxRekognitionLabels` and the 97%-confidence floor applied to
/// every detection call in the ground truth.
const MAX_LABELS: i32 = 10;
const MIN_CONFIDENCE: f32 = 97.0;

#[async_trait]
pub trait LabelDetector: Send + Sync {
    /// Best-effort label detection for the object at `key`. Never fails the
    /// caller; detection errors are logged and fold to an empty list, the
    /// same discard-the-error shape `GetLabels` wraps around
    /// `GetImageLabels`/`StartVideoLabelsDetection`.
    async fn detect_labels(&self, key: &str) -> Vec<String>;
}

/// Always returns no labels. Used for strategies whose ground-truth label
/// detector is an unimplemented stub (video), and as the development-mode
/// backend so local runs don't need AWS credentials.
#[derive(Clone, Default)]
pub struct NullLabelDetector;

#[async_trait]
impl LabelDetector for NullLabelDetector {
    async fn detect_labels(&self, _key: &str) -> Vec<String> {
        Vec::new()
    }
}

/// Calls `DetectLabels` + `DetectModerationLabels` + `DetectText` against an
/// object already sitting in `bucket`, exactly as the ground truth passes an
/// S3 `Image` reference rather than uploading bytes inline.
#[derive(Clone)]
pub struct RekognitionLabelDetector {
    client: RekognitionClient,
    bucket: String,
}

impl RekognitionLabelDetector {
    pub fn new(client: RekognitionClient, bucket: String) -> Self {
        Self { client, bucket }
    }

    fn s3_image(&self, key: &str) -> Image {
        Image::builder()
            .s3_object(
                aws_sdk_rekognition::types::S3Object::builder()
                    .bucket(&self.bucket)
                    .name(key)
                    .build(),
            )
            .build()
    }
}

#[async_trait]
impl LabelDetector for RekognitionLabelDetector {
    async fn detect_labels(&self, key: &str) -> Vec<String> {
        let mut labels = Vec::new();

        let detected = self
            .client
            .detect_labels()
            .image(self.s3_image(key))
            .max_labels(MAX_LABELS)
            .min_confidence(MIN_CONFIDENCE)
            .send()
            .await;
        match detected {
            Ok(response) => {
                labels.extend(response.labels().iter().filter_map(|l| l.name().map(str::to_string)));
            }
            Err(err) => {
                tracing::warn!(%key, error = %err, "detect_labels failed, skipping image labels");
                return labels;
            }
        }

        match self
            .client
            .detect_moderation_labels()
            .image(self.s3_image(key))
            .min_confidence(MIN_CONFIDENCE)
            .send()
            .await
        {
            Ok(response) => {
                labels.extend(
                    response
                        .moderation_labels()
                        .iter()
                        .filter_map(|l| l.name().map(str::to_string)),
                );
            }
            Err(err) => {
                tracing::warn!(%key, error = %err, "detect_moderation_labels failed, skipping");
            }
        }

        match self
            .client
            .detect_text()
            .image(self.s3_image(key))
            .send()
            .await
        {
            Ok(response) => {
                labels.extend(response.text_detections().iter().filter_map(|d| {
                    let confidence = d.confidence().unwrap_or(0.0);
                    if confidence >= MIN_CONFIDENCE {
                        d.detected_text().map(str::to_string)
                    } else {
                        None
                    }
                }));
            }
            Err(err) => {
                tracing::warn!(%key, error = %err, "detect_text failed, skipping");
            }
        }

        tracing::info!(%key, count = labels.len(), "image labeling done");
        labels
    }
}
