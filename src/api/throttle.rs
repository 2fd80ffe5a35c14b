use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;

/// Per-minute request quota for a remote service
pub struct RequestThrottle {
    limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
}

impl RequestThrottle {
    pub fn per_minute(requests: u32) -> Self {
        let requests = NonZeroU32::new(requests).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: RateLimiter::direct(Quota::per_minute(requests)),
        }
    }

    /// Wait until the quota allows another request
    pub async fn acquire(&self) {
        self.limiter.until_ready().await;
    }

    #[cfg(test)]
    fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_allows_quota_then_blocks() {
        let throttle = RequestThrottle::per_minute(3);

        throttle.acquire().await;
        assert!(throttle.try_acquire());
        assert!(throttle.try_acquire());
        assert!(!throttle.try_acquire());
    }

    #[test]
    fn test_zero_quota_still_allows_one() {
        let throttle = RequestThrottle::per_minute(0);
        assert!(throttle.try_acquire());
        assert!(!throttle.try_acquire());
    }
}
