//! BLOOMFILE - Filter Dump Files
//! Saves a filter to, and restores it from, a fixed-layout binary file.
//!
//! ## Binary Format
//! All integers little-endian.
//! ```text
//! [magic: 4][seed: 4][count: 4][capacity: 4][fp_rate: f64 8]
//! [bit_count: 4][hash_funcs: 4][byte_count: 4][reserved: 4]   (40-byte header)
//! [bits: byte_count bytes]
//! ```
//! The reserved word keeps the header the same size as the padded C struct
//! older dumps were written from.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use bytes::{Buf, BufMut, BytesMut};
use log::{error, info};

use super::params::{FilterParams, BIT_ALIGN, BYTE_BITS};
use super::{log_summary, BloomFilter, Buffers};
use crate::error::{BloomError, IoStage, Result};

/// Sentinel at offset 0 of every dump file.
pub const MAGIC_CODE: u32 = 0x0146_4C42;

/// Size of the on-disk header in bytes.
pub const HEADER_LEN: usize = 40;

/// The fixed-size header that precedes the bit array on disk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FileHeader {
    pub magic: u32,
    pub seed: u32,
    pub count: u32,
    pub capacity: u32,
    pub false_positive_rate: f64,
    pub bit_count: u32,
    pub hash_func_count: u32,
    pub byte_count: u32,
}

impl FileHeader {
    fn of(filter: &BloomFilter) -> Self {
        Self {
            magic: MAGIC_CODE,
            seed: filter.seed,
            count: filter.count,
            capacity: filter.params.capacity,
            false_positive_rate: filter.params.false_positive_rate,
            bit_count: filter.params.bit_count,
            hash_func_count: filter.params.hash_func_count,
            byte_count: filter.params.byte_count(),
        }
    }

    /// Pack the header field by field.
    pub fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u32_le(self.magic);
        buf.put_u32_le(self.seed);
        buf.put_u32_le(self.count);
        buf.put_u32_le(self.capacity);
        buf.put_f64_le(self.false_positive_rate);
        buf.put_u32_le(self.bit_count);
        buf.put_u32_le(self.hash_func_count);
        buf.put_u32_le(self.byte_count);
        buf.put_u32_le(0);
    }

    /// Unpack and validate a header.
    pub fn decode(mut buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_LEN {
            return Err(BloomError::CorruptFormat(format!(
                "header is {} bytes, expected {}",
                buf.len(),
                HEADER_LEN
            )));
        }

        let header = Self {
            magic: buf.get_u32_le(),
            seed: buf.get_u32_le(),
            count: buf.get_u32_le(),
            capacity: buf.get_u32_le(),
            false_positive_rate: buf.get_f64_le(),
            bit_count: buf.get_u32_le(),
            hash_func_count: buf.get_u32_le(),
            byte_count: buf.get_u32_le(),
        };
        header.validate()?;
        Ok(header)
    }

    fn validate(&self) -> Result<()> {
        if self.magic != MAGIC_CODE {
            return Err(BloomError::CorruptFormat(format!(
                "bad magic code {:#010x}, expected {:#010x}",
                self.magic, MAGIC_CODE
            )));
        }
        if self.byte_count.checked_mul(BYTE_BITS) != Some(self.bit_count) {
            return Err(BloomError::CorruptFormat(format!(
                "bit count {} does not match byte count {}",
                self.bit_count, self.byte_count
            )));
        }
        if self.bit_count == 0 || self.bit_count as u64 % BIT_ALIGN != 0 {
            return Err(BloomError::CorruptFormat(format!(
                "bit count {} is not a positive multiple of {}",
                self.bit_count, BIT_ALIGN
            )));
        }
        if self.hash_func_count == 0 {
            return Err(BloomError::CorruptFormat("zero hash functions".into()));
        }
        // The scratch array holds one u32 per hash function.
        if self.hash_func_count > self.bit_count {
            return Err(BloomError::CorruptFormat(format!(
                "{} hash functions for a {}-bit filter",
                self.hash_func_count, self.bit_count
            )));
        }
        if !(self.false_positive_rate > 0.0 && self.false_positive_rate < 1.0) {
            return Err(BloomError::CorruptFormat(format!(
                "false positive rate {} outside (0, 1)",
                self.false_positive_rate
            )));
        }
        Ok(())
    }

    fn params(&self) -> FilterParams {
        FilterParams {
            capacity: self.capacity,
            false_positive_rate: self.false_positive_rate,
            bit_count: self.bit_count,
            hash_func_count: self.hash_func_count,
        }
    }
}

/// Log an I/O failure and tag it with the step it happened in.
fn io_failure(path: &Path, stage: IoStage) -> impl FnOnce(io::Error) -> BloomError + '_ {
    move |e| {
        error!("{} failed while {}: {}", path.display(), stage, e);
        BloomError::io(stage, e)
    }
}

/// Like `io_failure`, but a file that ends early is corrupt rather than unreadable.
fn read_failure(path: &Path, stage: IoStage, what: String) -> impl FnOnce(io::Error) -> BloomError + '_ {
    move |e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            error!("{}: truncated {}", path.display(), what);
            BloomError::CorruptFormat(format!("truncated {what}"))
        } else {
            io_failure(path, stage)(e)
        }
    }
}

impl BloomFilter {
    /// Write the filter to `path`, truncating any existing file.
    ///
    /// A lazily reset filter must be inserted into or cleared first.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bits = match (&self.buffers, self.ready) {
            (Some(buffers), true) => &buffers.bits,
            _ => return Err(BloomError::NotReady),
        };

        let mut file = File::create(path).map_err(io_failure(path, IoStage::Open))?;

        let mut head = BytesMut::with_capacity(HEADER_LEN);
        FileHeader::of(self).encode(&mut head);
        file.write_all(&head)
            .map_err(io_failure(path, IoStage::WriteHeader))?;
        file.write_all(bits)
            .map_err(io_failure(path, IoStage::WriteData))?;
        file.sync_all().map_err(io_failure(path, IoStage::Flush))?;

        info!(
            "Saved BloomFilter to {} ({} items, {} bytes)",
            path.display(),
            self.count,
            HEADER_LEN + bits.len()
        );
        Ok(())
    }

    /// Read a filter back from a file written by [`save`](Self::save).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(io_failure(path, IoStage::Open))?;

        let mut head = [0u8; HEADER_LEN];
        file.read_exact(&mut head)
            .map_err(read_failure(path, IoStage::ReadHeader, "header".into()))?;
        let header = FileHeader::decode(&head)?;

        let params = header.params();
        let mut buffers = Buffers::allocate(&params)?;
        file.read_exact(&mut buffers.bits).map_err(read_failure(
            path,
            IoStage::ReadData,
            format!("bit data, expected {} bytes", header.byte_count),
        ))?;

        log_summary("Load", &params);
        Ok(Self {
            seed: header.seed,
            params,
            count: header.count,
            buffers: Some(buffers),
            ready: true,
        })
    }

    /// Replace this filter with the one stored at `path`.
    ///
    /// The current buffers are released first; on failure the filter stays released.
    pub fn load_into(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.release();
        *self = Self::load(path)?;
        Ok(())
    }
}
