mod connectivity;
mod evaluation_gateway;
mod image_source;
mod record_store;
mod sync_gateway;

pub use connectivity::Connectivity;
pub use evaluation_gateway::EvaluationGateway;
pub use image_source::ImageSource;
pub use record_store::RecordStore;
pub use sync_gateway::{ReadImage, SyncAck, SyncGateway};
