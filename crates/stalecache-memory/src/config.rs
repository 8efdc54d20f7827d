//! Memory driver configuration.

use std::time::Duration;

/// Default period between garbage collection cycles.
pub const DEFAULT_GC_INTERVAL: Duration = Duration::from_secs(60);

/// Configuration for the memory driver.
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    /// Interval between garbage collection cycles.
    pub gc_interval: Duration,
}

impl MemoryConfig {
    /// Creates a configuration with the given GC interval.
    pub fn with_gc_interval(gc_interval: Duration) -> Self {
        Self { gc_interval }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            gc_interval: DEFAULT_GC_INTERVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_config_default() {
        let config = MemoryConfig::default();
        assert_eq!(config.gc_interval, Duration::from_secs(60));
    }

    #[test]
    fn test_with_gc_interval() {
        let config = MemoryConfig::with_gc_interval(Duration::from_millis(250));
        assert_eq!(config.gc_interval, Duration::from_millis(250));
    }
}
