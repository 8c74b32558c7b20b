//! Builds the configured [`LabelDetector`] backend, the labeling-side
//! counterpart of `filepoint_storage::create_storage`'s dev/prod branch.

use crate::labeling::{LabelDetector, NullLabelDetector, RekognitionLabelDetector};
use aws_config::BehaviorVersion;
use std::sync::Arc;

pub async fn create_label_detector(
    bucket: &str,
    region: &str,
    is_development: bool,
) -> Arc<dyn LabelDetector> {
    if is_development {
        return Arc::new(NullLabelDetector);
    }

    let sdk_config = aws_config::defaults(BehaviorVersion::latest())
        .region(aws_config::Region::new(region.to_string()))
        .load()
        .await;
    let client = aws_sdk_rekognition::Client::new(&sdk_config);
    Arc::new(RekognitionLabelDetector::new(client, bucket.to_string()))
}
