use crate::analysis::filter::TokenFilter;
use crate::analysis::token::Token;

/// `{"kind": "downcase"}`: lowercases every term so matching is case-blind
pub struct DowncaseFilter;

impl TokenFilter for DowncaseFilter {
    fn filter(&self, mut tokens: Vec<Token>) -> Vec<Token> {
        for token in &mut tokens {
            token.text = token.text.to_lowercase();
        }
        tokens
    }

    fn name(&self) -> &str {
        "downcase"
    }

    fn clone_box(&self) -> Box<dyn TokenFilter> {
        Box::new(DowncaseFilter)
    }
}
