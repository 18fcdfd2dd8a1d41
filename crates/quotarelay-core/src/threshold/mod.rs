//! Local pre-flight rejection of requests whose account is already over a
//! configured utilization ceiling.

mod error;
mod guard;
mod retry_after;


pub use error::{format_reset_duration, QuotaThresholdError, THRESHOLD_ERROR_CODE};
pub use guard::{ThresholdGuard, ThresholdGuards};
pub use retry_after::RetryAfterProvider;
