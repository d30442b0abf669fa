//! BLOOMFILE - Bloom Filter with File Persistence
//!
//! A fixed-size probabilistic set: "might this item have been inserted?"
//! answered from a bit array and several hash-derived positions, with a
//! bounded false-positive rate and no false negatives.
//!
//! ## Features
//! - **Sizing**: bit count and hash count derived from capacity and target rate
//! - **Double hashing**: `k` positions from two MurmurHash64A passes
//! - **Lazy and eager reset**: defer the zero-fill to the next insert, or clear now
//! - **Dump files**: fixed 40-byte header plus raw bits, validated by a magic code
//!
//! ## Example
//! ```no_run
//! use bloomfile::filter::BloomFilter;
//!
//! let mut filter = BloomFilter::new(0, 100_000, 0.00001).unwrap();
//! filter.insert(&0u32.to_le_bytes()).unwrap();
//! assert!(filter.contains(&[0, 0, 0, 0]).unwrap());
//!
//! filter.save("dump.bin").unwrap();
//! let restored = BloomFilter::load("dump.bin").unwrap();
//! assert_eq!(restored.count(), 1);
//! ```

pub mod config;
pub mod error;
pub mod filter;
pub mod types;

pub use config::Config;
pub use error::{BloomError, Result};
pub use filter::BloomFilter;
pub use types::{FilterState, InsertStatus};
