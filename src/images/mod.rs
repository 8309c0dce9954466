pub mod pipeline;
pub mod storage;
pub mod transcode;

pub use pipeline::{materialize_card_image, plan_image, ImageOutcome, ImagePlan, ImageTarget};
pub use storage::{card_object_path, series_banner_path, StorageClient};
pub use transcode::{transcode_card, transcode_card_auto, Fit};
