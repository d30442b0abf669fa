//! BLOOMFILE - Filter Configuration
//! Construction parameters and the diagnostic verbosity used by the logger.

use log::LevelFilter;

use crate::error::Result;

/// Configuration for building a [`BloomFilter`](crate::filter::BloomFilter).
#[derive(Debug, Clone)]
pub struct Config {
    /// Hash salt, persisted with the filter.
    pub seed: u32,

    /// Planned maximum number of inserted items.
    pub capacity: u32,

    /// Target false-positive probability, strictly between 0 and 1.
    pub false_positive_rate: f64,

    /// Verbosity handed to the logger by [`Config::init_logging`].
    pub log_level: LevelFilter,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: 0,
            capacity: 100_000,
            false_positive_rate: 0.00001,
            log_level: LevelFilter::Info,
        }
    }
}

impl Config {
    /// Create a new Config for `capacity` items at `false_positive_rate`.
    pub fn new(capacity: u32, false_positive_rate: f64) -> Self {
        Self {
            capacity,
            false_positive_rate,
            ..Default::default()
        }
    }

    /// Set the hash seed.
    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }

    /// Set the log verbosity.
    pub fn with_log_level(mut self, level: LevelFilter) -> Self {
        self.log_level = level;
        self
    }

    /// Check the sizing preconditions without allocating anything.
    pub fn validate(&self) -> Result<()> {
        crate::filter::params::FilterParams::compute(self.capacity, self.false_positive_rate)
            .map(|_| ())
    }

    /// Install an `env_logger` filtered at `log_level`. `RUST_LOG` may refine it.
    /// Calling this more than once is harmless.
    pub fn init_logging(&self) {
        let _ = env_logger::Builder::new()
            .filter_level(self.log_level)
            .parse_default_env()
            .try_init();
    }
}
