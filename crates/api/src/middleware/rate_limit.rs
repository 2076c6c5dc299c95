//! Rate limiting for credential endpoints.
//!
//! Login attempts are limited per submitted username rather than per client,
//! so a distributed password-guessing run against one account still trips
//! the limiter.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovRateLimiter,
};
use serde_json::json;
use std::{
    collections::HashMap,
    num::NonZeroU32,
    sync::{Arc, RwLock},
};

/// Type alias for the rate limiter used per key.
type KeyRateLimiter = GovRateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Rate limiter state shared across all requests.
/// Uses a HashMap keyed by login identifier with individual rate limiters.
pub struct RateLimiterState {
    limiters: RwLock<HashMap<String, Arc<KeyRateLimiter>>>,
    rate_limit_per_minute: u32,
}

impl RateLimiterState {
    /// Create a new rate limiter state with the specified limit per minute.
    pub fn new(rate_limit_per_minute: u32) -> Self {
        Self {
            limiters: RwLock::new(HashMap::new()),
            rate_limit_per_minute,
        }
    }

    /// Get or create a rate limiter for the given key.
    fn get_or_create_limiter(&self, key: &str) -> Arc<KeyRateLimiter> {
        // First try to get existing limiter with read lock
        {
            let limiters = self.limiters.read().unwrap();
            if let Some(limiter) = limiters.get(key) {
                return limiter.clone();
            }
        }

        // Create new limiter with write lock
        let mut limiters = self.limiters.write().unwrap();

        // Double-check in case another thread created it
        if let Some(limiter) = limiters.get(key) {
            return limiter.clone();
        }

        // Create new limiter with rate limit per minute
        let quota = Quota::per_minute(
            NonZeroU32::new(self.rate_limit_per_minute).unwrap_or(NonZeroU32::new(30).unwrap()),
        );
        let limiter = Arc::new(GovRateLimiter::direct(quota));
        limiters.insert(key.to_string(), limiter.clone());
        limiter
    }

    /// Check if a request for the given key should be allowed.
    /// Returns Ok(()) if allowed, or Err with retry_after seconds if rate limited.
    pub fn check(&self, key: &str) -> Result<(), u64> {
        let limiter = self.get_or_create_limiter(key);

        match limiter.check() {
            Ok(_) => Ok(()),
            Err(not_until) => {
                let wait_time = not_until.wait_time_from(governor::clock::Clock::now(
                    &governor::clock::DefaultClock::default(),
                ));
                // Return retry after in seconds, minimum 1 second
                Err(wait_time.as_secs().max(1))
            }
        }
    }
}

impl std::fmt::Debug for RateLimiterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiterState")
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field("active_limiters", &self.limiters.read().unwrap().len())
            .finish()
    }
}

impl Clone for RateLimiterState {
    fn clone(&self) -> Self {
        // Clone creates a new state that shares the same limiters
        Self {
            limiters: RwLock::new(self.limiters.read().unwrap().clone()),
            rate_limit_per_minute: self.rate_limit_per_minute,
        }
    }
}

/// Create a rate limited response with proper headers and body.
pub fn rate_limited_response(limit: u32, retry_after: u64) -> Response {
    let body = json!({
        "error": "rate_limit_exceeded",
        "message": format!("Rate limit of {} requests/minute exceeded", limit),
        "retryAfter": retry_after
    });

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();

    // Add Retry-After header
    response.headers_mut().insert(
        header::RETRY_AFTER,
        retry_after.to_string().parse().unwrap(),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_state_creation() {
        let state = RateLimiterState::new(30);
        assert_eq!(state.rate_limit_per_minute, 30);
    }

    #[test]
    fn test_rate_limiter_allows_requests() {
        let state = RateLimiterState::new(30);

        // First request should be allowed
        assert!(state.check("asha").is_ok());
    }

    #[test]
    fn test_rate_limiter_exhaustion() {
        // Use very low limit to test exhaustion
        let state = RateLimiterState::new(1);

        // First request should be allowed
        assert!(state.check("asha").is_ok());

        // Second request should be rate limited
        let result = state.check("asha");
        assert!(result.is_err());
        // Retry-after should be at least 1 second
        assert!(result.unwrap_err() >= 1);
    }

    #[test]
    fn test_rate_limiter_different_keys_independent() {
        let state = RateLimiterState::new(1); // Very low limit

        // Each key should have independent limits
        assert!(state.check("asha").is_ok());
        assert!(state.check("ravi").is_ok());
        assert!(state.check("meena").is_ok());

        // Now every key should be rate limited independently
        assert!(state.check("asha").is_err());
        assert!(state.check("ravi").is_err());
        assert!(state.check("meena").is_err());
    }

    #[test]
    fn test_rate_limiter_same_key_multiple_checks() {
        let state = RateLimiterState::new(5);

        // Should allow 5 requests
        for i in 0..5 {
            let result = state.check("asha");
            assert!(result.is_ok(), "Request {} should be allowed", i);
        }

        // 6th request should be rate limited
        assert!(state.check("asha").is_err());
    }

    #[test]
    fn test_rate_limiter_state_debug() {
        let state = RateLimiterState::new(30);
        let debug = format!("{:?}", state);
        assert!(debug.contains("RateLimiterState"));
        assert!(debug.contains("rate_limit_per_minute"));
        assert!(debug.contains("30"));
        assert!(debug.contains("active_limiters"));
    }

    #[test]
    fn test_rate_limiter_state_clone_shares_limiters() {
        let state = RateLimiterState::new(30);
        state.check("asha").unwrap();
        state.check("ravi").unwrap();

        let cloned = state.clone();
        // Clone should have the same limiters
        assert!(cloned.check("asha").is_ok()); // Using existing limiter
        assert!(cloned.check("kiran").is_ok()); // Creating new limiter
    }

    #[test]
    fn test_rate_limiter_get_or_create_idempotent() {
        let state = RateLimiterState::new(30);

        // Multiple calls should return the same limiter
        let limiter1 = state.get_or_create_limiter("asha");
        let limiter2 = state.get_or_create_limiter("asha");

        // Should be the same Arc (same underlying object)
        assert!(Arc::ptr_eq(&limiter1, &limiter2));
    }

    #[test]
    fn test_rate_limiter_different_keys_different_limiters() {
        let state = RateLimiterState::new(30);

        let limiter1 = state.get_or_create_limiter("asha");
        let limiter2 = state.get_or_create_limiter("ravi");

        // Should be different Arcs
        assert!(!Arc::ptr_eq(&limiter1, &limiter2));
    }

    #[test]
    fn test_rate_limited_response_format() {
        let response = rate_limited_response(30, 60);
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().contains_key(header::RETRY_AFTER));
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "60");
    }

    #[test]
    fn test_rate_limited_response_various_retry_after() {
        let retry_values = vec![1, 5, 30, 60];
        for retry_after in retry_values {
            let response = rate_limited_response(30, retry_after);
            assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
            assert_eq!(
                response.headers().get(header::RETRY_AFTER).unwrap(),
                &retry_after.to_string()
            );
        }
    }
}
