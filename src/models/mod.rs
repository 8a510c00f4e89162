pub mod event;
pub mod row;

pub use event::{
    ApplicationActivity, EventData, EventTimestamp, SafariActivity, Seconds,
    SerializedEvent, TimeDescription, TimelineEvent,
};
pub use row::{describe_value, ColumnIndex, SourceRow};
