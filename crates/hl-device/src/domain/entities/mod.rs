mod captured_record;

pub use captured_record::{CaptureDraft, CapturedRecord, Geolocation};
