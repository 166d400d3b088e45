#![forbid(unsafe_code)]

//! Host capability flags.
//!
//! Browser feature checks ("is `IntersectionObserver` defined?") are made
//! once by the host at startup and handed to the controllers as plain
//! booleans. Controllers branch on these flags and never probe the host
//! again.
//!
//! | Preset | Use |
//! |--------|-----|
//! | [`HostCapabilities::modern`] | evergreen browsers, default for tests |
//! | [`HostCapabilities::legacy`] | no observers at all; exercises every fallback |

/// Optional platform features the controllers can take advantage of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostCapabilities {
    /// `IntersectionObserver` is available.
    pub intersection_observer: bool,
    /// `PerformanceObserver` is available.
    pub performance_observer: bool,
    /// `performance.getEntriesByType("resource")` is available.
    pub resource_timing: bool,
}

impl Default for HostCapabilities {
    fn default() -> Self {
        Self::modern()
    }
}

impl HostCapabilities {
    /// Every optional feature present.
    #[must_use]
    pub const fn modern() -> Self {
        Self {
            intersection_observer: true,
            performance_observer: true,
            resource_timing: true,
        }
    }

    /// No optional feature present.
    #[must_use]
    pub const fn legacy() -> Self {
        Self {
            intersection_observer: false,
            performance_observer: false,
            resource_timing: false,
        }
    }

    #[must_use]
    pub const fn with_intersection_observer(mut self, enabled: bool) -> Self {
        self.intersection_observer = enabled;
        self
    }

    #[must_use]
    pub const fn with_performance_observer(mut self, enabled: bool) -> Self {
        self.performance_observer = enabled;
        self
    }

    #[must_use]
    pub const fn with_resource_timing(mut self, enabled: bool) -> Self {
        self.resource_timing = enabled;
        self
    }
}

/// Whether `hostname` is a development host (loopback or `.local`).
#[must_use]
pub fn is_local_host(hostname: &str) -> bool {
    let host = hostname.trim_start_matches('[').trim_end_matches(']');
    matches!(host, "localhost" | "127.0.0.1" | "::1")
        || host.ends_with(".localhost")
        || host.ends_with(".local")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_differ_only_in_flags() {
        assert_eq!(
            HostCapabilities::legacy()
                .with_intersection_observer(true)
                .with_performance_observer(true)
                .with_resource_timing(true),
            HostCapabilities::modern()
        );
    }

    #[test]
    fn loopback_hosts_are_local() {
        assert!(is_local_host("localhost"));
        assert!(is_local_host("127.0.0.1"));
        assert!(is_local_host("[::1]"));
        assert!(is_local_host("mysite.local"));
    }

    #[test]
    fn public_hosts_are_not_local() {
        assert!(!is_local_host("example.com"));
        assert!(!is_local_host("localhost.example.com"));
        assert!(!is_local_host(""));
    }
}
