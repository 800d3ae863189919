pub mod calibration;
pub mod channel;
pub mod survey;

pub use calibration::{Calibration, CalibrationChain, CalibrationError, CalibrationSource, CalibrationTable};
pub use channel::{Channel, ChannelMetadata};
pub use survey::{ChannelRecord, SurveyPayload};
