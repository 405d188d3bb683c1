use std::cmp::Ordering;
use std::fmt;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use crate::core::error::{Error, ErrorKind, Result};
use crate::schema::settings::{FieldType, IndexMeta, KeyMaterial};

type HmacSha256 = Hmac<Sha256>;

/// Plaintext width of the ORE scheme in bits
pub const ORE_BITS: usize = 64;

const SIGN_BIT: u64 = 1 << 63;

/// A plaintext in the ORE domain: an unsigned 64-bit integer whose natural
/// order is the order the index should reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OrePoint(pub u64);

impl OrePoint {
    pub const MIN: OrePoint = OrePoint(0);
    pub const MAX: OrePoint = OrePoint(u64::MAX);

    pub fn from_u64(v: u64) -> Self {
        OrePoint(v)
    }

    /// Flip the sign bit so negative numbers sort below positive ones
    pub fn from_i64(v: i64) -> Self {
        OrePoint((v as u64) ^ SIGN_BIT)
    }

    /// IEEE-754 order-preserving transform. `-0.0` collapses onto `0.0`.
    pub fn from_f64(v: f64) -> Result<Self> {
        if v.is_nan() {
            return Err(Error::new(ErrorKind::InvalidInput, "NaN cannot be order-encrypted"));
        }

        let v = if v == 0.0 { 0.0 } else { v };
        let bits = v.to_bits();
        let mapped = if bits & SIGN_BIT != 0 { !bits } else { bits | SIGN_BIT };
        Ok(OrePoint(mapped))
    }

    pub fn from_bool(v: bool) -> Self {
        OrePoint(v as u64)
    }

    /// Equality-only reduction of a string term
    pub fn from_term(term: &str) -> Self {
        let digest = Sha256::digest(term.as_bytes());
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        OrePoint(u64::from_be_bytes(head))
    }

    /// Convert a JSON scalar according to the field's declared type
    pub fn from_value(value: &Value, field_type: FieldType) -> Result<Self> {
        let mismatch = || Error::new(
            ErrorKind::InvalidRecord,
            format!("Expected a {:?} value, got {}", field_type, describe(value)),
        );

        match field_type {
            FieldType::String => value.as_str().map(OrePoint::from_term).ok_or_else(mismatch),
            FieldType::Uint64 => value.as_u64().map(OrePoint::from_u64).ok_or_else(mismatch),
            FieldType::Int64 => value.as_i64().map(OrePoint::from_i64).ok_or_else(mismatch),
            FieldType::Float64 => OrePoint::from_f64(value.as_f64().ok_or_else(mismatch)?),
            FieldType::Boolean => value.as_bool().map(OrePoint::from_bool).ok_or_else(mismatch),
        }
    }

    /// `v - 1`, used for strict upper bounds
    pub fn pred(self) -> Option<Self> {
        self.0.checked_sub(1).map(OrePoint)
    }

    /// `v + 1`, used for strict lower bounds
    pub fn succ(self) -> Option<Self> {
        self.0.checked_add(1).map(OrePoint)
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// One ORE ciphertext: a trit (0..3) per plaintext bit, most significant first.
/// Serialized as a hex string.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct OreCiphertext(Vec<u8>);

impl OreCiphertext {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Reveal the order of the two underlying plaintexts.
    ///
    /// Only meaningful for ciphertexts produced under the same key pair.
    pub fn compare(&self, other: &OreCiphertext) -> Ordering {
        for (a, b) in self.0.iter().zip(other.0.iter()) {
            if a != b {
                return if (a + 1) % 3 == *b { Ordering::Less } else { Ordering::Greater };
            }
        }
        self.0.len().cmp(&other.0.len())
    }
}

impl fmt::Debug for OreCiphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OreCiphertext({})", hex::encode(&self.0))
    }
}

impl From<OreCiphertext> for String {
    fn from(ct: OreCiphertext) -> Self {
        hex::encode(ct.0)
    }
}

impl TryFrom<String> for OreCiphertext {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        let bytes = hex::decode(&value)?;
        if bytes.len() != ORE_BITS || bytes.iter().any(|b| *b > 2) {
            return Err(Error::internal("Malformed ORE ciphertext"));
        }
        Ok(OreCiphertext(bytes))
    }
}

/// Compare two ciphertext sequences element-wise, most significant first.
/// A shorter sequence that is a prefix of the longer one sorts first.
pub fn compare_sequences(a: &[OreCiphertext], b: &[OreCiphertext]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        match x.compare(y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    a.len().cmp(&b.len())
}

/// Adapter around the order-revealing primitive.
///
/// The construction is the bitwise "practical ORE" scheme: bit `i` of the
/// plaintext is masked with a PRF of the bits above it, reduced mod 3. The PRF
/// is HMAC-SHA256 keyed with `prfKey || prpKey`. Encryption is deterministic.
#[derive(Clone)]
pub struct OreCipher {
    mac: HmacSha256,
}

impl OreCipher {
    pub fn new(prf_key: &KeyMaterial, prp_key: &KeyMaterial) -> Result<Self> {
        let mut key = Vec::with_capacity(32);
        key.extend_from_slice(prf_key.as_bytes());
        key.extend_from_slice(prp_key.as_bytes());

        let mac = HmacSha256::new_from_slice(&key)
            .map_err(|_| Error::internal("ORE key rejected by HMAC"))?;
        Ok(OreCipher { mac })
    }

    /// Key the cipher from `$prfKey`/`$prpKey`
    pub fn from_meta(meta: &IndexMeta) -> Result<Self> {
        let prf = KeyMaterial::from_meta(meta.prf_key.as_ref(), "$prfKey", &meta.index_name)?;
        let prp = KeyMaterial::from_meta(meta.prp_key.as_ref(), "$prpKey", &meta.index_name)?;
        OreCipher::new(&prf, &prp)
    }

    pub fn encrypt(&self, point: OrePoint) -> OreCiphertext {
        let x = point.0;
        let mut trits = Vec::with_capacity(ORE_BITS);

        for i in 0..ORE_BITS {
            let bit = ((x >> (ORE_BITS - 1 - i)) & 1) as u8;
            let prefix = x & !(u64::MAX >> i);

            let mut mac = self.mac.clone();
            mac.update(&[i as u8]);
            mac.update(&prefix.to_be_bytes());
            let digest = mac.finalize().into_bytes();

            trits.push((digest[0] % 3 + bit) % 3);
        }

        OreCiphertext(trits)
    }

    /// Encrypt an interval. `None` bounds are open and become the domain
    /// minimum/maximum, so every interval turns into a closed `[lower, upper]`.
    pub fn encrypt_range(
        &self,
        lower: Option<OrePoint>,
        upper: Option<OrePoint>,
    ) -> Result<(OreCiphertext, OreCiphertext)> {
        let lower = lower.unwrap_or(OrePoint::MIN);
        let upper = upper.unwrap_or(OrePoint::MAX);

        if lower > upper {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Range lower bound is greater than its upper bound",
            ));
        }

        Ok((self.encrypt(lower), self.encrypt(upper)))
    }
}

impl fmt::Debug for OreCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OreCipher(..)")
    }
}
