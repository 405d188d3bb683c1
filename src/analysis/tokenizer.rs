use crate::analysis::token::Token;
use unicode_segmentation::UnicodeSegmentation;

pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<Token>;

    fn name(&self) -> &str;

    fn clone_box(&self) -> Box<dyn Tokenizer>;
}

/// Standard Unicode tokenizer: splits on word boundaries, keeps case.
/// Every word is kept whatever its length.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardTokenizer;

impl Tokenizer for StandardTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        text.unicode_words().map(Token::new).collect()
    }

    fn name(&self) -> &str {
        "standard"
    }

    fn clone_box(&self) -> Box<dyn Tokenizer> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_word_boundaries() {
        let tokens = StandardTokenizer.tokenize("Star Trek: The Motion Picture");
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["Star", "Trek", "The", "Motion", "Picture"]);
    }

    #[test]
    fn keeps_long_words() {
        let long = "k".repeat(300);
        let tokens = StandardTokenizer.tokenize(&format!("a {} b", long));
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1].text, long);
    }
}
