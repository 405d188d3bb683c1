use std::cmp::Ordering;
use std::sync::LazyLock;
use regex::Regex;
use crate::core::error::{Error, ErrorKind, Result};

/// Ordered strings never produce more than this many 64-bit words; the data
/// service stores at most six ORE ciphertexts per term.
pub const MAX_ORDERED_TERMS: usize = 6;

const BITS_PER_CHAR: usize = 5;
const WORD_BITS: usize = 64;

// Sentinel ranks. 0 means "no character" so a prefix sorts first.
const RANK_WHITESPACE: u8 = 28;
const RANK_DIGIT: u8 = 29;
const RANK_OTHER: u8 = 31;

static OTHER_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9\s]+").unwrap());
static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Maps an ASCII string onto a short sequence of `u64` words whose
/// element-wise order matches the string's order under a coarse ranking:
/// case is ignored, digits are indistinguishable from each other, and any run
/// of whitespace or of punctuation collapses into one character.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderEncoder;

impl OrderEncoder {
    pub fn new() -> Self {
        OrderEncoder
    }

    /// Encode `s` into at most `MAX_ORDERED_TERMS` words, most significant first.
    /// The empty string encodes to no words.
    pub fn encode(&self, s: &str) -> Result<Vec<u64>> {
        let ranks = self.ranks(s)?;
        Ok(pack(&ranks))
    }

    /// The per-character ranks (1..=31) fed into the packer
    pub fn ranks(&self, s: &str) -> Result<Vec<u8>> {
        if !s.is_ascii() {
            return Err(Error::new(
                ErrorKind::InvalidRecord,
                "Can only order strings that are pure ASCII",
            ));
        }

        let lowered = s.to_ascii_lowercase();
        let collapsed = OTHER_RUN.replace_all(&lowered, "~");
        let collapsed = WHITESPACE_RUN.replace_all(&collapsed, " ");

        Ok(collapsed.bytes().map(rank).collect())
    }

    /// Compare two encodings, padding the shorter one with zero words
    pub fn compare(a: &[u64], b: &[u64]) -> Ordering {
        let len = a.len().max(b.len());
        for i in 0..len {
            let x = a.get(i).copied().unwrap_or(0);
            let y = b.get(i).copied().unwrap_or(0);
            match x.cmp(&y) {
                Ordering::Equal => continue,
                other => return other,
            }
        }
        Ordering::Equal
    }
}

fn rank(byte: u8) -> u8 {
    match byte {
        b'a'..=b'z' => byte - b'a' + 1,
        b'0'..=b'9' => RANK_DIGIT,
        b' ' => RANK_WHITESPACE,
        _ => RANK_OTHER,
    }
}

// Write 5 bits per rank, first character in the top bits of the first word.
// The word count follows the full string length, then is capped.
fn pack(ranks: &[u8]) -> Vec<u64> {
    let total_bits = ranks.len() * BITS_PER_CHAR;
    let word_count = total_bits.div_ceil(WORD_BITS).min(MAX_ORDERED_TERMS);
    let capacity = word_count * WORD_BITS;

    let mut words = vec![0u64; word_count];
    for (i, &r) in ranks.iter().enumerate() {
        let start = i * BITS_PER_CHAR;
        if start >= capacity {
            break;
        }

        for j in 0..BITS_PER_CHAR {
            let pos = start + j;
            if pos >= capacity {
                break;
            }
            if (r >> (BITS_PER_CHAR - 1 - j)) & 1 == 1 {
                words[pos / WORD_BITS] |= 1u64 << (WORD_BITS - 1 - pos % WORD_BITS);
            }
        }
    }

    words
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(s: &str) -> Vec<u64> {
        OrderEncoder::new().encode(s).unwrap()
    }

    #[test]
    fn single_letter_sits_in_top_bits() {
        assert_eq!(encode("a"), vec![1u64 << 59]);
        assert_eq!(encode("z"), vec![26u64 << 59]);
        assert!(encode("").is_empty());
    }

    #[test]
    fn ranking_classes() {
        let enc = OrderEncoder::new();
        assert_eq!(enc.ranks("Ab").unwrap(), vec![1, 2]);
        assert_eq!(enc.ranks("a \t\n b").unwrap(), vec![1, 28, 2]);
        assert_eq!(enc.ranks("a42").unwrap(), vec![1, 29, 29]);
        assert_eq!(enc.ranks("a!?-b").unwrap(), vec![1, 31, 2]);
    }

    #[test]
    fn case_is_ignored() {
        assert_eq!(encode("Star Trek"), encode("star trek"));
    }

    #[test]
    fn non_ascii_is_rejected() {
        let err = OrderEncoder::new().encode("café").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRecord);
    }

    #[test]
    fn prefixes_sort_first() {
        let ordered = ["a", "ab", "abc", "abd", "b", "b c", "b1", "b!", "ba"];
        for pair in ordered.windows(2) {
            let a = encode(pair[0]);
            let b = encode(pair[1]);
            let ordering = OrderEncoder::compare(&a, &b);
            assert_eq!(ordering, Ordering::Less, "{:?} < {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn characters_span_word_boundaries() {
        // 13 characters need 65 bits, so the 13th straddles two words
        // 'a' is 00001, so its last bit lands at the top of the second word
        let words = encode("aaaaaaaaaaaaa");
        assert_eq!(words.len(), 2);
        assert_eq!(words[0] & 0xF, 0);
        assert_eq!(words[1], 1u64 << 63);

        // 'z' is 11010: four bits in the first word, a zero in the second
        let words = encode("aaaaaaaaaaaaz");
        assert_eq!(words[0] & 0xF, 0b1101);
        assert_eq!(words[1], 0);
    }

    #[test]
    fn long_strings_are_capped() {
        let long = "x".repeat(500);
        assert_eq!(encode(&long).len(), MAX_ORDERED_TERMS);

        // Differences beyond the cap are invisible
        let a = format!("{}a", "q".repeat(100));
        let b = format!("{}b", "q".repeat(100));
        assert_eq!(encode(&a), encode(&b));
    }

    #[test]
    fn compare_pads_with_zero() {
        assert_eq!(OrderEncoder::compare(&[5], &[5, 0]), Ordering::Equal);
        assert_eq!(OrderEncoder::compare(&[5], &[5, 1]), Ordering::Less);
        assert_eq!(OrderEncoder::compare(&[], &[0]), Ordering::Equal);
    }
}
