//! Item tokenization for search matching
//!
//! A tokenizer maps one chip item to the text fragments the user may type to
//! find it. Tokens are compared case-insensitively by the inline matcher, so
//! implementations can return them in display case.

use std::fmt::Display;

/// Maps an item to its searchable text tokens
pub trait Tokenizer<T>: Send + Sync {
    /// Return the tokens for `item`, in priority order.
    ///
    /// Empty strings are treated as missing tokens and ignored by matchers.
    fn tokenize(&self, item: &T) -> Vec<String>;
}

/// Default tokenizer: the item's `Display` output as a single token
#[derive(Debug, Clone, Copy, Default)]
pub struct DisplayTokenizer;

impl<T: Display> Tokenizer<T> for DisplayTokenizer {
    fn tokenize(&self, item: &T) -> Vec<String> {
        vec![item.to_string()]
    }
}

impl<T, F> Tokenizer<T> for F
where
    F: Fn(&T) -> Vec<String> + Send + Sync,
{
    fn tokenize(&self, item: &T) -> Vec<String> {
        self(item)
    }
}

/// Tokenize `item` and drop missing (empty) tokens
pub(crate) fn tokens_of<T>(tokenizer: &dyn Tokenizer<T>, item: &T) -> Vec<String> {
    tokenizer
        .tokenize(item)
        .into_iter()
        .filter(|token| !token.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_tokenizer_single_token() {
        let tokens = Tokenizer::<&str>::tokenize(&DisplayTokenizer, &"Rust");
        assert_eq!(tokens, vec!["Rust".to_string()]);
    }

    #[test]
    fn test_closure_tokenizer() {
        let tokenizer = |city: &(String, String)| vec![city.0.clone(), city.1.clone()];
        let tokens = tokenizer.tokenize(&("NY".to_string(), "New York".to_string()));
        assert_eq!(tokens, vec!["NY".to_string(), "New York".to_string()]);
    }

    #[test]
    fn test_tokens_of_discards_empty_tokens() {
        let tokenizer = |_: &u32| vec![String::new(), "seven".to_string(), String::new()];
        let tokens = tokens_of(&tokenizer, &7);
        assert_eq!(tokens, vec!["seven".to_string()]);
    }
}
