/// A term produced by the tokenizer and reshaped by token filters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
}

impl Token {
    pub fn new(text: impl Into<String>) -> Self {
        Token { text: text.into() }
    }
}
