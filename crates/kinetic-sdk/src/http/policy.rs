//! Redirect and gateway-retry policy.

use std::time::Duration;

use kinetic_config::SdkOptions;

/// A per-request hop budget.
///
/// Configured as an integer: any negative value means the transport leaves
/// the response alone (`Passthrough`), `0` means the first occurrence is an
/// error, and `N` allows `N` more hops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Budget {
    Passthrough,
    Remaining(u32),
}

impl Budget {
    pub fn from_limit(limit: i32) -> Self {
        u32::try_from(limit).map_or(Budget::Passthrough, Budget::Remaining)
    }
}

/// Redirect and gateway-retry knobs for one request.
///
/// Each call works on its own copy; the transport decrements the copy as
/// it goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    pub max_redirects: Budget,
    pub gateway_retry_limit: Budget,
    pub gateway_retry_delay: Duration,
}

impl Default for Policy {
    fn default() -> Self {
        Self::from_options(&SdkOptions::default())
    }
}

impl Policy {
    pub fn from_options(options: &SdkOptions) -> Self {
        Self {
            max_redirects: Budget::from_limit(options.max_redirects),
            gateway_retry_limit: Budget::from_limit(options.gateway_retry_limit),
            gateway_retry_delay: options.gateway_retry_delay(),
        }
    }

    pub fn with_max_redirects(mut self, limit: i32) -> Self {
        self.max_redirects = Budget::from_limit(limit);
        self
    }

    pub fn with_gateway_retry_limit(mut self, limit: i32) -> Self {
        self.gateway_retry_limit = Budget::from_limit(limit);
        self
    }

    pub fn with_gateway_retry_delay(mut self, delay: Duration) -> Self {
        self.gateway_retry_delay = delay;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_from_limit() {
        assert_eq!(Budget::from_limit(-1), Budget::Passthrough);
        assert_eq!(Budget::from_limit(-42), Budget::Passthrough);
        assert_eq!(Budget::from_limit(0), Budget::Remaining(0));
        assert_eq!(Budget::from_limit(5), Budget::Remaining(5));
    }

    #[test]
    fn test_default_policy_matches_default_options() {
        let policy = Policy::default();
        assert_eq!(policy.max_redirects, Budget::Remaining(5));
        assert_eq!(policy.gateway_retry_limit, Budget::Passthrough);
        assert_eq!(policy.gateway_retry_delay, Duration::from_secs(1));
    }

    #[test]
    fn test_overrides() {
        let policy = Policy::default()
            .with_max_redirects(0)
            .with_gateway_retry_limit(2)
            .with_gateway_retry_delay(Duration::from_millis(10));
        assert_eq!(policy.max_redirects, Budget::Remaining(0));
        assert_eq!(policy.gateway_retry_limit, Budget::Remaining(2));
        assert_eq!(policy.gateway_retry_delay, Duration::from_millis(10));
    }
}
