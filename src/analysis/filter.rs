use crate::analysis::token::Token;

/// One stage of a `tokenFilters` pipeline
pub trait TokenFilter: Send + Sync {
    fn filter(&self, tokens: Vec<Token>) -> Vec<Token>;

    /// The `kind` this filter is declared with in a mapping
    fn name(&self) -> &str;

    fn clone_box(&self) -> Box<dyn TokenFilter>;
}
