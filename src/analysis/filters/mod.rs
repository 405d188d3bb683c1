pub mod downcase;
pub mod ngram;
