use std::cmp::Ordering;
use rand::Rng;
use serde::{Deserialize, Serialize};
use crate::core::error::Result;
use crate::index::order_encoder::OrderEncoder;

/// Cases per fixture file. Small enough for fixture diffs to stay reviewable.
pub const NUM_TEST_CASES: usize = 100;

/// Highest character code in generated strings
pub const ASCII_CHAR_CODE_MAX: u8 = 127;

/// Longer than the 76 characters the encoding can see, so truncation is
/// exercised too.
pub const MAX_STRING_LENGTH: usize = 200;

pub const ENCODING_CASES_FILE: &str = "orderise_string_test_cases.json";
pub const COMPARISON_CASES_FILE: &str = "string_comparison_test_cases.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingCase {
    pub input: String,
    pub output: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonCase {
    pub input: [String; 2],
    /// `"<"`, `"=="` or `">"`
    pub output: String,
}

/// Generates order-encoding fixtures that other client implementations
/// replay to prove they encode strings identically.
pub struct ConformanceGenerator<R: Rng> {
    rng: R,
    encoder: OrderEncoder,
}

impl<R: Rng> ConformanceGenerator<R> {
    pub fn new(rng: R) -> Self {
        ConformanceGenerator {
            rng,
            encoder: OrderEncoder::new(),
        }
    }

    pub fn random_ascii_string(&mut self) -> String {
        let len = self.rng.gen_range(1..MAX_STRING_LENGTH);
        (0..len)
            .map(|_| self.rng.gen_range(0..=ASCII_CHAR_CODE_MAX) as char)
            .collect()
    }

    pub fn encoding_cases(&mut self, count: usize) -> Result<Vec<EncodingCase>> {
        (0..count)
            .map(|_| {
                let input = self.random_ascii_string();
                let output = self.encoder.encode(&input)?;
                Ok(EncodingCase { input, output })
            })
            .collect()
    }

    pub fn comparison_cases(&mut self, count: usize) -> Result<Vec<ComparisonCase>> {
        (0..count)
            .map(|_| {
                let a = self.random_ascii_string();
                let b = self.random_ascii_string();
                let (x, y) = (self.encoder.encode(&a)?, self.encoder.encode(&b)?);
                let ordering = OrderEncoder::compare(&x, &y);

                let output = match ordering {
                    Ordering::Less => "<",
                    Ordering::Equal => "==",
                    Ordering::Greater => ">",
                };

                Ok(ComparisonCase {
                    input: [a, b],
                    output: output.to_string(),
                })
            })
            .collect()
    }

    /// Both fixture files as `(file name, pretty JSON)`
    pub fn fixtures(&mut self) -> Result<Vec<(&'static str, String)>> {
        let encodings = serde_json::to_string_pretty(&self.encoding_cases(NUM_TEST_CASES)?)?;
        let comparisons = serde_json::to_string_pretty(&self.comparison_cases(NUM_TEST_CASES)?)?;
        Ok(vec![
            (ENCODING_CASES_FILE, encodings),
            (COMPARISON_CASES_FILE, comparisons),
        ])
    }
}
