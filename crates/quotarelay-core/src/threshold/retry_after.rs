use quotarelay_types::RateLimitInfo;
use std::time::Duration;

/// Anything that can tell a client how long to back off. Lets callers treat
/// local threshold rejections and upstream rate limits the same way.
pub trait RetryAfterProvider {
    fn retry_after(&self) -> Option<Duration>;
}

impl RetryAfterProvider for RateLimitInfo {
    fn retry_after(&self) -> Option<Duration> {
        Some(self.remaining())
    }
}
