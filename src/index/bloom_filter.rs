use std::collections::BTreeSet;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use crate::core::error::{Error, Result};
use crate::schema::settings::{IndexMapping, KEY_LENGTH};

type HmacSha256 = Hmac<Sha256>;

pub const DEFAULT_FILTER_SIZE: u32 = 256;
pub const MIN_FILTER_SIZE: u32 = 32;
pub const MAX_FILTER_SIZE: u32 = 65536;

pub const DEFAULT_FILTER_TERM_BITS: u32 = 3;
pub const MIN_FILTER_TERM_BITS: u32 = 3;
pub const MAX_FILTER_TERM_BITS: u32 = 16;

/// Bloom filter shape: `m` (size in bits) and `k` (bits set per term)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterParams {
    size: u32,
    term_bits: u32,
}

impl FilterParams {
    pub fn new(size: u32, term_bits: u32) -> Result<Self> {
        if !size.is_power_of_two() || !(MIN_FILTER_SIZE..=MAX_FILTER_SIZE).contains(&size) {
            return Err(Error::invalid_schema(format!(
                "filterSize must be a power of 2 between {} and {} (got {})",
                MIN_FILTER_SIZE, MAX_FILTER_SIZE, size
            )));
        }

        if !(MIN_FILTER_TERM_BITS..=MAX_FILTER_TERM_BITS).contains(&term_bits) {
            return Err(Error::invalid_schema(format!(
                "filterTermBits must be between {} and {} (got {})",
                MIN_FILTER_TERM_BITS, MAX_FILTER_TERM_BITS, term_bits
            )));
        }

        Ok(FilterParams { size, term_bits })
    }

    /// Read `filterSize`/`filterTermBits` from a mapping, applying defaults
    pub fn from_mapping(mapping: &IndexMapping) -> Result<Self> {
        FilterParams::new(
            mapping.filter_size.unwrap_or(DEFAULT_FILTER_SIZE),
            mapping.filter_term_bits.unwrap_or(DEFAULT_FILTER_TERM_BITS),
        )
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn term_bits(&self) -> u32 {
        self.term_bits
    }
}

impl Default for FilterParams {
    fn default() -> Self {
        FilterParams {
            size: DEFAULT_FILTER_SIZE,
            term_bits: DEFAULT_FILTER_TERM_BITS,
        }
    }
}

/// Keyed bloom filter over terms.
///
/// Built by folding terms in with `add`, which consumes the filter and hands
/// back the extended one; a finished filter is never mutated again.
#[derive(Clone)]
pub struct BloomFilter {
    mac: HmacSha256,
    params: FilterParams,
    bits: BTreeSet<u16>,
}

impl BloomFilter {
    pub fn new(key: &[u8], params: FilterParams) -> Result<Self> {
        if key.len() != KEY_LENGTH {
            return Err(Error::internal(format!(
                "Bloom filter key must be exactly {} bytes (got {})",
                KEY_LENGTH,
                key.len()
            )));
        }

        let mac = HmacSha256::new_from_slice(key)
            .map_err(|_| Error::internal("Bloom filter key rejected by HMAC"))?;

        Ok(BloomFilter {
            mac,
            params,
            bits: BTreeSet::new(),
        })
    }

    /// Bit positions a single term maps to
    pub fn positions(&self, term: &str) -> Vec<u16> {
        let mut mac = self.mac.clone();
        mac.update(term.as_bytes());
        let digest = mac.finalize().into_bytes();

        let m = self.params.size;
        (0..self.params.term_bits as usize)
            .map(|slice| {
                let raw = u16::from_le_bytes([digest[2 * slice], digest[2 * slice + 1]]);
                (raw as u32 % m) as u16
            })
            .collect()
    }

    pub fn add(mut self, term: &str) -> Self {
        let positions = self.positions(term);
        self.bits.extend(positions);
        self
    }

    pub fn with_terms<I, S>(self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        terms.into_iter().fold(self, |filter, term| filter.add(term.as_ref()))
    }

    /// True iff every bit set here is also set in `other`
    pub fn subset_of(&self, other: &BloomFilter) -> bool {
        self.bits.is_subset(&other.bits)
    }

    /// Same test against a raw bit list, as stored on the server
    pub fn subset_of_bits(&self, other: &[u16]) -> bool {
        self.bits.iter().all(|bit| other.contains(bit))
    }

    pub fn bits(&self) -> &BTreeSet<u16> {
        &self.bits
    }

    pub fn to_bits(&self) -> Vec<u16> {
        self.bits.iter().copied().collect()
    }

    pub fn params(&self) -> FilterParams {
        self.params
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }
}

impl std::fmt::Debug for BloomFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BloomFilter")
            .field("params", &self.params)
            .field("bits", &self.bits)
            .finish()
    }
}
