//! BLOOMFILE - Bloom Filter
//! A space-efficient probabilistic data structure used to test
//! whether an element is a member of a set.
//!
//! False positives are possible, but false negatives are not.
//! The filter is sized once at construction and can be dumped to,
//! and restored from, a fixed-layout binary file.

pub mod hash;
pub mod params;
pub mod persist;

use log::{debug, info, warn};

use crate::config::Config;
use crate::error::{BloomError, Result};
use crate::types::{FilterState, InsertStatus};

use self::hash::Probe;
use self::params::FilterParams;

/// Heap storage owned by a live filter: the bit array and the scratch
/// array that receives the derived positions of the item being inserted.
#[derive(Debug)]
struct Buffers {
    bits: Vec<u8>,
    positions: Vec<u32>,
}

impl Buffers {
    /// Allocate a zeroed bit array and an empty scratch array for `params`.
    fn allocate(params: &FilterParams) -> Result<Self> {
        let byte_count = params.byte_count() as usize;
        let mut bits = Vec::new();
        bits.try_reserve_exact(byte_count)
            .map_err(|_| BloomError::OutOfMemory { bytes: byte_count })?;
        bits.resize(byte_count, 0);

        let k = params.hash_func_count as usize;
        let mut positions = Vec::new();
        positions
            .try_reserve_exact(k)
            .map_err(|_| BloomError::OutOfMemory {
                bytes: k * std::mem::size_of::<u32>(),
            })?;

        Ok(Self { bits, positions })
    }
}

#[inline]
fn set_bit(bits: &mut [u8], pos: u32) {
    bits[(pos / 8) as usize] |= 1 << (pos % 8);
}

#[inline]
fn test_bit(bits: &[u8], pos: u32) -> bool {
    bits[(pos / 8) as usize] & (1 << (pos % 8)) != 0
}

/// A Bloom filter for probabilistic set membership testing.
///
/// ## How it works
/// - `k` positions are derived from each item's bytes (see [`hash`])
/// - On insert: set all corresponding bits to 1
/// - On lookup: check if all corresponding bits are 1
/// - If any bit is 0 → item is **definitely not** in the set
/// - If all bits are 1 → item is **probably** in the set
///
/// ## Lifecycle
/// [`reset`](Self::reset) is lazy: it only forgets the item count, and the
/// old bits stay in place until the next [`insert`](Self::insert) wipes them.
/// Queries issued in between see those stale bits. Use
/// [`clear`](Self::clear) when the filter must read as empty immediately.
#[derive(Debug)]
pub struct BloomFilter {
    seed: u32,
    params: FilterParams,
    /// Number of insert calls since construction or the last reset.
    count: u32,
    buffers: Option<Buffers>,
    ready: bool,
}

impl BloomFilter {
    /// Build a filter sized for `capacity` items at `false_positive_rate`.
    pub fn new(seed: u32, capacity: u32, false_positive_rate: f64) -> Result<Self> {
        let params = FilterParams::compute(capacity, false_positive_rate)?;
        let buffers = Buffers::allocate(&params)?;
        log_summary("Init", &params);

        Ok(Self {
            seed,
            params,
            count: 0,
            buffers: Some(buffers),
            ready: true,
        })
    }

    /// Build a filter from a [`Config`].
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.seed, config.capacity, config.false_positive_rate)
    }

    /// Rebuild this filter in place with new parameters.
    ///
    /// Invalid parameters leave the filter untouched. Once sizing succeeds the
    /// old buffers are dropped before the new ones are allocated, so an
    /// allocation failure leaves the filter released.
    pub fn init(&mut self, seed: u32, capacity: u32, false_positive_rate: f64) -> Result<()> {
        let params = FilterParams::compute(capacity, false_positive_rate)?;
        self.release();

        let buffers = Buffers::allocate(&params)?;
        log_summary("Init", &params);

        self.seed = seed;
        self.params = params;
        self.buffers = Some(buffers);
        self.ready = true;
        Ok(())
    }

    /// Lazy reset: zero the item count and mark the filter not ready.
    ///
    /// The bit array is **not** cleared here; the next insert does that.
    pub fn reset(&mut self) {
        self.ready = false;
        self.count = 0;
        debug!("filter reset (lazy), bits cleared on next insert");
    }

    /// Eager reset: zero the bit array now and mark the filter ready.
    pub fn clear(&mut self) -> Result<()> {
        let buffers = self.buffers.as_mut().ok_or(BloomError::NotReady)?;
        buffers.bits.fill(0);
        self.ready = true;
        self.count = 0;
        debug!("filter cleared ({} bytes zeroed)", buffers.bits.len());
        Ok(())
    }

    /// Drop the bit array and scratch array. Calling this twice is a no-op.
    pub fn release(&mut self) {
        if self.buffers.take().is_some() {
            debug!("filter buffers released");
        }
        self.ready = false;
        self.count = 0;
    }

    /// Insert an item's bytes into the filter.
    ///
    /// Returns [`InsertStatus::OverCapacity`] once more than `capacity` items
    /// have gone in; the insert still happens.
    pub fn insert(&mut self, item: &[u8]) -> Result<InsertStatus> {
        let buffers = self.buffers.as_mut().ok_or(BloomError::NotReady)?;
        if !self.ready {
            buffers.bits.fill(0);
            self.ready = true;
        }

        buffers.positions.clear();
        buffers.positions.extend(Probe::new(
            item,
            self.seed,
            self.params.hash_func_count,
            self.params.bit_count,
        ));
        for &pos in &buffers.positions {
            set_bit(&mut buffers.bits, pos);
        }

        self.count = self.count.saturating_add(1);
        if self.count <= self.params.capacity {
            return Ok(InsertStatus::Inserted);
        }
        if self.count == self.params.capacity.saturating_add(1) {
            warn!(
                "filter exceeded its capacity of {} items; false positive rate will exceed {}",
                self.params.capacity, self.params.false_positive_rate
            );
        }
        Ok(InsertStatus::OverCapacity)
    }

    /// Check if an item **may** be in the set.
    /// - `Ok(false)` → item is **definitely not** in the set
    /// - `Ok(true)` → item is **probably** in the set (may be a false positive)
    pub fn contains(&self, item: &[u8]) -> Result<bool> {
        let buffers = self.buffers.as_ref().ok_or(BloomError::NotReady)?;
        let bits = &buffers.bits;
        Ok(self.probe(item).all(|pos| test_bit(bits, pos)))
    }

    /// Derive the bit positions for `item` into the scratch array and return them.
    pub fn positions(&mut self, item: &[u8]) -> Result<&[u32]> {
        let probe = self.probe(item);
        let buffers = self.buffers.as_mut().ok_or(BloomError::NotReady)?;
        buffers.positions.clear();
        buffers.positions.extend(probe);
        Ok(&buffers.positions)
    }

    fn probe(&self, item: &[u8]) -> Probe {
        Probe::new(
            item,
            self.seed,
            self.params.hash_func_count,
            self.params.bit_count,
        )
    }

    /// Current lifecycle state.
    pub fn state(&self) -> FilterState {
        match (&self.buffers, self.ready) {
            (None, _) => FilterState::Released,
            (Some(_), false) => FilterState::Stale,
            (Some(_), true) => FilterState::Ready,
        }
    }

    /// Returns true if the filter holds its buffers and is not lazily reset.
    pub fn is_ready(&self) -> bool {
        self.buffers.is_some() && self.ready
    }

    /// Returns true while the filter holds its bit array.
    pub fn is_allocated(&self) -> bool {
        self.buffers.is_some()
    }

    /// Returns the hash seed.
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Returns the planned maximum number of items.
    pub fn capacity(&self) -> u32 {
        self.params.capacity
    }

    /// Returns the target false positive rate.
    pub fn false_positive_rate(&self) -> f64 {
        self.params.false_positive_rate
    }

    /// Returns the number of bits in the filter.
    pub fn bit_count(&self) -> u32 {
        self.params.bit_count
    }

    /// Returns the number of positions derived per item.
    pub fn hash_func_count(&self) -> u32 {
        self.params.hash_func_count
    }

    /// Returns the length of the bit array in bytes.
    pub fn byte_count(&self) -> u32 {
        self.params.byte_count()
    }

    /// Number of inserts since construction or the last reset.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Returns the sizing parameters.
    pub fn params(&self) -> &FilterParams {
        &self.params
    }

    /// The raw bit array, byte 0 holding bits 0-7. `None` once released.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        self.buffers.as_ref().map(|b| b.bits.as_slice())
    }

    /// Returns the bytes held by the bit array.
    pub fn memory_usage(&self) -> usize {
        self.buffers.as_ref().map_or(0, |b| b.bits.len())
    }

    /// Estimated false positive rate based on current fill.
    /// `FPR ≈ (1 - e^(-kn/m))^k`
    pub fn estimated_fpr(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let k = self.params.hash_func_count as f64;
        let m = self.params.bit_count as f64;
        let n = self.count as f64;
        (1.0 - (-k * n / m).exp()).powf(k)
    }
}

fn log_summary(action: &str, params: &FilterParams) {
    info!(
        "{} BloomFilter(n={}, p={}, m={}, k={}), buffer size={:.2}MB",
        action,
        params.capacity,
        params.false_positive_rate,
        params.bit_count,
        params.hash_func_count,
        params.byte_count() as f64 / 1024.0 / 1024.0
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_contains() {
        let mut bf = BloomFilter::new(0, 100, 0.01).unwrap();
        bf.insert(b"hello").unwrap();
        bf.insert(b"world").unwrap();

        assert!(bf.contains(b"hello").unwrap());
        assert!(bf.contains(b"world").unwrap());
        assert_eq!(bf.count(), 2);
    }

    #[test]
    fn test_reference_values() {
        let mut bf = BloomFilter::new(0, 100_000, 0.00001).unwrap();
        assert_eq!(bf.bit_count() % 64, 0);
        assert_eq!(bf.byte_count() * 8, bf.bit_count());

        bf.insert(&0u32.to_le_bytes()).unwrap();
        assert!(bf.contains(&[0, 0, 0, 0]).unwrap());
        assert!(!bf.contains(&[1, 0, 0, 0]).unwrap());
    }

    #[test]
    fn test_definitely_not_contains() {
        let mut bf = BloomFilter::new(0, 100, 0.01).unwrap();
        bf.insert(b"alpha").unwrap();
        bf.insert(b"bravo").unwrap();

        let mut false_positives = 0;
        for i in 0..1000 {
            let key = format!("nonexistent_key_{}", i);
            if bf.contains(key.as_bytes()).unwrap() {
                false_positives += 1;
            }
        }

        // Two items in a 100-item filter: almost no bits are set.
        assert!(
            false_positives < 10,
            "Too many false positives: {}",
            false_positives
        );
    }

    #[test]
    fn test_no_false_negatives() {
        let mut bf = BloomFilter::new(7, 1000, 0.01).unwrap();

        for i in 0..1000 {
            let key = format!("key_{}", i);
            bf.insert(key.as_bytes()).unwrap();
        }

        for i in 0..1000 {
            let key = format!("key_{}", i);
            assert!(
                bf.contains(key.as_bytes()).unwrap(),
                "False negative for key: {}",
                key
            );
        }
    }

    #[test]
    fn test_false_positive_rate_within_target() {
        // Half load: the 0.6185 sizing constant only meets the target below capacity.
        let mut bf = BloomFilter::new(0, 10_000, 0.01).unwrap();
        for i in 0u32..5_000 {
            bf.insert(&i.to_le_bytes()).unwrap();
        }

        let trials = 100_000u32;
        let hits = (1_000_000..1_000_000 + trials)
            .filter(|i| bf.contains(&i.to_le_bytes()).unwrap())
            .count();
        let observed = hits as f64 / trials as f64;
        assert!(observed < 0.01, "observed fpr {}", observed);
    }

    #[test]
    fn test_over_capacity_status() {
        let mut bf = BloomFilter::new(0, 3, 0.1).unwrap();
        for i in 0..3u8 {
            assert_eq!(bf.insert(&[i]).unwrap(), InsertStatus::Inserted);
        }
        let status = bf.insert(&[3]).unwrap();
        assert!(status.is_over_capacity());
        assert!(bf.contains(&[3]).unwrap());
        assert_eq!(bf.count(), 4);
    }

    #[test]
    fn test_lazy_reset_keeps_stale_bits() {
        let mut bf = BloomFilter::new(0, 100, 0.01).unwrap();
        bf.insert(b"stale").unwrap();

        bf.reset();
        assert_eq!(bf.state(), FilterState::Stale);
        assert_eq!(bf.count(), 0);
        assert!(bf.contains(b"stale").unwrap());

        // The next insert wipes the old content first.
        bf.insert(b"fresh").unwrap();
        assert!(bf.is_ready());
        assert!(bf.contains(b"fresh").unwrap());
        assert!(!bf.contains(b"stale").unwrap());
        assert_eq!(bf.count(), 1);
    }

    #[test]
    fn test_clear_empties_filter() {
        let mut bf = BloomFilter::new(0, 100, 0.01).unwrap();
        for i in 0..50u8 {
            bf.insert(&[i]).unwrap();
        }

        bf.clear().unwrap();
        assert!(bf.is_ready());
        assert_eq!(bf.count(), 0);
        assert!(bf.as_bytes().unwrap().iter().all(|&b| b == 0));
        for i in 0..50u8 {
            assert!(!bf.contains(&[i]).unwrap());
        }
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut bf = BloomFilter::new(0, 100, 0.01).unwrap();
        bf.insert(b"x").unwrap();

        bf.release();
        bf.release();
        assert_eq!(bf.state(), FilterState::Released);
        assert_eq!(bf.memory_usage(), 0);
        assert_eq!(bf.count(), 0);
        assert!(matches!(bf.insert(b"x"), Err(BloomError::NotReady)));
        assert!(matches!(bf.contains(b"x"), Err(BloomError::NotReady)));
        assert!(matches!(bf.clear(), Err(BloomError::NotReady)));
    }

    #[test]
    fn test_init_reinitializes() {
        let mut bf = BloomFilter::new(0, 100, 0.01).unwrap();
        bf.insert(b"old").unwrap();

        bf.init(5, 1000, 0.001).unwrap();
        assert_eq!(bf.seed(), 5);
        assert_eq!(bf.capacity(), 1000);
        assert_eq!(bf.count(), 0);
        assert!(bf.is_ready());
        assert_eq!(bf.memory_usage(), bf.byte_count() as usize);
        assert!(!bf.contains(b"old").unwrap());

        // A released filter can be brought back.
        bf.release();
        bf.init(1, 10, 0.1).unwrap();
        assert!(bf.is_ready());
    }

    #[test]
    fn test_init_with_bad_rate_keeps_filter() {
        let mut bf = BloomFilter::new(0, 100, 0.01).unwrap();
        bf.insert(b"keep").unwrap();

        assert!(matches!(
            bf.init(0, 100, 1.0),
            Err(BloomError::InvalidParameter(_))
        ));
        assert!(bf.contains(b"keep").unwrap());
        assert_eq!(bf.count(), 1);
    }

    #[test]
    fn test_new_rejects_invalid_parameters() {
        assert!(matches!(
            BloomFilter::new(0, 100, 0.0),
            Err(BloomError::InvalidParameter(_))
        ));
        assert!(matches!(
            BloomFilter::new(0, 0, 0.5),
            Err(BloomError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_positions_match_insert() {
        let mut bf = BloomFilter::new(3, 100, 0.01).unwrap();
        let positions = bf.positions(b"item").unwrap().to_vec();
        assert_eq!(positions.len(), bf.hash_func_count() as usize);

        bf.insert(b"item").unwrap();
        let bits = bf.as_bytes().unwrap();
        for pos in positions {
            assert!(test_bit(bits, pos));
        }
    }

    #[test]
    fn test_bit_addressing() {
        let mut bits = [0u8; 2];
        set_bit(&mut bits, 0);
        set_bit(&mut bits, 9);
        assert_eq!(bits, [0b0000_0001, 0b0000_0010]);
        assert!(test_bit(&bits, 9));
        assert!(!test_bit(&bits, 8));
    }

    #[test]
    fn test_estimated_fpr() {
        let mut bf = BloomFilter::new(0, 100, 0.01).unwrap();
        assert_eq!(bf.estimated_fpr(), 0.0);

        for i in 0..100 {
            bf.insert(format!("k{}", i).as_bytes()).unwrap();
        }

        let fpr = bf.estimated_fpr();
        assert!(fpr > 0.0);
        assert!(fpr < 0.1);
    }

    #[test]
    fn test_from_config() {
        let config = Config::new(1000, 0.01).with_seed(11);
        let bf = BloomFilter::from_config(&config).unwrap();
        assert_eq!(bf.seed(), 11);
        assert_eq!(bf.capacity(), 1000);
        assert_eq!(bf.bit_count(), 7488);
        assert_eq!(bf.hash_func_count(), 6);
    }
}
