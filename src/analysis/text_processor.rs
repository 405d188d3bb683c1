use std::fmt;
use serde_json::Value;
use crate::analysis::filter::TokenFilter;
use crate::analysis::filters::downcase::DowncaseFilter;
use crate::analysis::filters::ngram::{NGramFilter, DEFAULT_MAX_GRAM, DEFAULT_MIN_GRAM};
use crate::analysis::token::Token;
use crate::analysis::tokenizer::{StandardTokenizer, Tokenizer};
use crate::core::error::{Error, Result};
use crate::schema::settings::{TokenFilterSettings, TokenizerSettings};

/// Text analysis pipeline built from an index mapping:
/// one tokenizer followed by the token filters in declaration order.
pub struct TextProcessor {
    pub tokenizer: Box<dyn Tokenizer>,
    pub filters: Vec<Box<dyn TokenFilter>>,
}

impl TextProcessor {
    pub fn new(tokenizer: Box<dyn Tokenizer>) -> Self {
        TextProcessor {
            tokenizer,
            filters: Vec::new(),
        }
    }

    pub fn add_filter(mut self, filter: Box<dyn TokenFilter>) -> Self {
        self.filters.push(filter);
        self
    }

    /// Build from the `tokenizer`/`tokenFilters` part of a mapping
    pub fn from_settings(
        tokenizer: &TokenizerSettings,
        filters: &[TokenFilterSettings],
    ) -> Result<Self> {
        let tokenizer: Box<dyn Tokenizer> = match tokenizer {
            TokenizerSettings::Standard => Box::new(StandardTokenizer),
        };

        let mut processor = TextProcessor::new(tokenizer);
        for settings in filters {
            processor = processor.add_filter(build_filter(settings)?);
        }

        Ok(processor)
    }

    pub fn analyze(&self, text: &str) -> Vec<Token> {
        let mut tokens = self.tokenizer.tokenize(text);

        for filter in &self.filters {
            tokens = filter.filter(tokens);
        }

        tokens
    }

    /// Term strings only, in pipeline order (duplicates kept)
    pub fn perform(&self, text: &str) -> Vec<String> {
        self.analyze(text).into_iter().map(|t| t.text).collect()
    }
}

impl Clone for TextProcessor {
    fn clone(&self) -> Self {
        TextProcessor {
            tokenizer: self.tokenizer.clone_box(),
            filters: self.filters.iter().map(|f| f.clone_box()).collect(),
        }
    }
}

impl fmt::Debug for TextProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let filters: Vec<&str> = self.filters.iter().map(|f| f.name()).collect();
        f.debug_struct("TextProcessor")
            .field("tokenizer", &self.tokenizer.name())
            .field("filters", &filters)
            .finish()
    }
}

fn build_filter(settings: &TokenFilterSettings) -> Result<Box<dyn TokenFilter>> {
    match settings {
        TokenFilterSettings::Downcase => Ok(Box::new(DowncaseFilter)),
        TokenFilterSettings::Ngram { min_length, max_length, token_length } => {
            if token_length.is_some() {
                return Err(Error::invalid_schema(concat!(
                    "'tokenLength' is deprecated. ",
                    "Use 'minLength' and 'maxLength' for the ngram filter.",
                )));
            }

            let (min_gram, max_gram) = match (min_length, max_length) {
                (None, None) => (DEFAULT_MIN_GRAM, DEFAULT_MAX_GRAM),
                (min, max) => (
                    gram_length(min.as_ref(), DEFAULT_MIN_GRAM)?,
                    gram_length(max.as_ref(), DEFAULT_MAX_GRAM)?,
                ),
            };

            if max_gram < min_gram {
                return Err(Error::invalid_schema(
                    "The ngram filter min length must be less than or equal to the max length",
                ));
            }

            Ok(Box::new(NGramFilter::new(min_gram, max_gram)))
        }
    }
}

fn gram_length(value: Option<&Value>, default: usize) -> Result<usize> {
    match value {
        None => Ok(default),
        Some(v) => match v.as_u64() {
            Some(0) => Err(Error::invalid_schema(
                "The ngram filter min and max length must be greater than zero.",
            )),
            Some(n) => Ok(n as usize),
            None => Err(Error::invalid_schema(
                "The values provided to the min and max length must be of type Integer.",
            )),
        },
    }
}
