use crate::analysis::filter::TokenFilter;
use crate::analysis::token::Token;

pub const DEFAULT_MIN_GRAM: usize = 3;
pub const DEFAULT_MAX_GRAM: usize = 8;

/// Emits every character window of each length in `min_gram..=max_gram`,
/// shortest first, followed by the whole token when it is longer than
/// `max_gram` (so long words still match exactly).
pub struct NGramFilter {
    pub min_gram: usize,
    pub max_gram: usize,
}

impl NGramFilter {
    pub fn new(min_gram: usize, max_gram: usize) -> Self {
        NGramFilter { min_gram, max_gram }
    }
}

impl Default for NGramFilter {
    fn default() -> Self {
        NGramFilter::new(DEFAULT_MIN_GRAM, DEFAULT_MAX_GRAM)
    }
}

impl TokenFilter for NGramFilter {
    fn filter(&self, tokens: Vec<Token>) -> Vec<Token> {
        let mut result = Vec::new();

        for token in tokens {
            let chars: Vec<char> = token.text.chars().collect();

            for n in self.min_gram..=self.max_gram {
                if n == 0 || n > chars.len() {
                    continue;
                }
                for i in 0..=chars.len() - n {
                    let ngram: String = chars[i..i + n].iter().collect();
                    result.push(Token::new(ngram));
                }
            }

            if chars.len() > self.max_gram {
                result.push(token);
            }
        }

        result
    }

    fn name(&self) -> &str {
        "ngram"
    }

    fn clone_box(&self) -> Box<dyn TokenFilter> {
        Box::new(NGramFilter {
            min_gram: self.min_gram,
            max_gram: self.max_gram,
        })
    }
}
