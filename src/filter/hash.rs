//! Position derivation.
//!
//! Each item is hashed twice with MurmurHash64A: once salted with the filter
//! seed (`h1`), once salted with `h1` folded to 32 bits (`h2`). Probe `i` is
//! `(h1 + i * h2) mod m` (Kirsch & Mitzenmacher double hashing), so deriving
//! `k` positions costs two hash passes regardless of `k`.

const M: u64 = 0xc6a4_a793_5bd1_e995;
const R: u32 = 47;

/// MurmurHash64A (64-bit MurmurHash2) over `data`.
pub fn murmur64a(data: &[u8], seed: u64) -> u64 {
    let mut h = seed ^ (data.len() as u64).wrapping_mul(M);

    let mut chunks = data.chunks_exact(8);
    for chunk in &mut chunks {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(chunk);
        let mut k = u64::from_le_bytes(buf);
        k = k.wrapping_mul(M);
        k ^= k >> R;
        k = k.wrapping_mul(M);
        h ^= k;
        h = h.wrapping_mul(M);
    }

    let tail = chunks.remainder();
    if !tail.is_empty() {
        for (i, &b) in tail.iter().enumerate() {
            h ^= (b as u64) << (8 * i);
        }
        h = h.wrapping_mul(M);
    }

    h ^= h >> R;
    h = h.wrapping_mul(M);
    h ^= h >> R;
    h
}

#[inline]
fn fold32(v: u64) -> u32 {
    ((v >> 32) ^ v) as u32
}

/// Iterator over the `k` bit positions of one item.
#[derive(Debug, Clone)]
pub struct Probe {
    h1: u64,
    h2: u64,
    i: u64,
    k: u32,
    bit_count: u64,
}

impl Probe {
    /// Hash `item` twice and yield `hash_func_count` positions in `[0, bit_count)`.
    pub fn new(item: &[u8], seed: u32, hash_func_count: u32, bit_count: u32) -> Self {
        let h1 = murmur64a(item, seed as u64);
        let h2 = murmur64a(item, fold32(h1) as u64);
        Self {
            h1,
            h2,
            i: 0,
            k: hash_func_count,
            bit_count: bit_count as u64,
        }
    }
}

impl Iterator for Probe {
    type Item = u32;

    #[inline]
    fn next(&mut self) -> Option<u32> {
        if self.i >= self.k as u64 {
            return None;
        }
        let combined = self.h1.wrapping_add(self.i.wrapping_mul(self.h2));
        self.i += 1;
        // bit_count fits in u32, so the remainder does too.
        Some((combined % self.bit_count) as u32)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.k as u64 - self.i) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Probe {}
