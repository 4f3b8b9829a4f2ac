pub mod job;
pub mod schedule;

pub use job::{JobHandle, RefreshJob, RetryPolicy, Trigger};
pub use schedule::RefreshSchedule;
