//! Text tokenization.

/// Configuration for the tokenizer.
#[derive(Debug, Clone)]
pub struct TokenizerConfig {
    /// Minimum token length (in characters) to index.
    pub min_token_length: usize,
    /// Maximum token length (in characters) to index.
    pub max_token_length: usize,
    /// Whether to perform case-insensitive matching.
    pub case_insensitive: bool,
    /// Additional characters to treat as separators.
    pub extra_separators: Vec<char>,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            min_token_length: 1,
            max_token_length: 256,
            case_insensitive: true,
            extra_separators: vec![],
        }
    }
}

impl TokenizerConfig {
    /// Creates a new tokenizer configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets minimum token length.
    #[must_use]
    pub fn min_length(mut self, len: usize) -> Self {
        self.min_token_length = len;
        self
    }

    /// Sets maximum token length.
    #[must_use]
    pub fn max_length(mut self, len: usize) -> Self {
        self.max_token_length = len;
        self
    }

    /// Sets case sensitivity.
    #[must_use]
    pub fn case_sensitive(mut self) -> Self {
        self.case_insensitive = false;
        self
    }

    /// Adds extra separator characters.
    #[must_use]
    pub fn with_separators(mut self, chars: &[char]) -> Self {
        self.extra_separators.extend_from_slice(chars);
        self
    }
}

/// Splits text into normalized tokens.
#[derive(Debug, Clone, Default)]
pub struct Tokenizer {
    config: TokenizerConfig,
}

impl Tokenizer {
    /// Creates a tokenizer.
    pub fn new(config: TokenizerConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    /// Normalizes a single token (case folding only).
    pub fn normalize(&self, token: &str) -> String {
        if self.config.case_insensitive {
            token.to_lowercase()
        } else {
            token.to_string()
        }
    }

    /// Tokenizes text, splitting on whitespace, ASCII punctuation and the
    /// configured extra separators.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let config = &self.config;
        text.split(|c: char| {
            c.is_whitespace() || c.is_ascii_punctuation() || config.extra_separators.contains(&c)
        })
        .filter(|t| {
            let len = t.chars().count();
            len > 0 && len >= config.min_token_length && len <= config.max_token_length
        })
        .map(|t| self.normalize(t))
        .collect()
    }
}
