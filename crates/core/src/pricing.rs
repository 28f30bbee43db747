//! Per-1k-token prices for hosted providers that bill by token.
use once_cell::sync::Lazy;

use crate::model::ProviderKind;

/// Price in USD per 1000 tokens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenPrice {
    pub input: f64,
    pub output: f64,
}

impl TokenPrice {
    const fn new(input: f64, output: f64) -> Self {
        Self { input, output }
    }

    pub fn cost(&self, prompt_tokens: u64, completion_tokens: u64) -> f64 {
        (prompt_tokens as f64 / 1000.0) * self.input
            + (completion_tokens as f64 / 1000.0) * self.output
    }
}

// Ordered so that longer, more specific prefixes win.
static OPENAI_PRICES: Lazy<Vec<(&'static str, TokenPrice)>> = Lazy::new(|| {
    let mut prices = vec![
        ("gpt-4o-mini", TokenPrice::new(0.00015, 0.0006)),
        ("gpt-4o", TokenPrice::new(0.005, 0.015)),
        ("gpt-4-turbo", TokenPrice::new(0.01, 0.03)),
        ("gpt-4-32k", TokenPrice::new(0.06, 0.12)),
        ("gpt-4", TokenPrice::new(0.03, 0.06)),
        ("gpt-3.5-turbo", TokenPrice::new(0.0005, 0.0015)),
    ];
    prices.sort_by_key(|(prefix, _)| std::cmp::Reverse(prefix.len()));
    prices
});

static ANTHROPIC_PRICES: Lazy<Vec<(&'static str, TokenPrice)>> = Lazy::new(|| {
    let mut prices = vec![
        ("claude-3-opus", TokenPrice::new(0.015, 0.075)),
        ("claude-3-sonnet", TokenPrice::new(0.003, 0.015)),
        ("claude-3-5-sonnet", TokenPrice::new(0.003, 0.015)),
        ("claude-3-haiku", TokenPrice::new(0.00025, 0.00125)),
        ("claude-3-5-haiku", TokenPrice::new(0.0008, 0.004)),
    ];
    prices.sort_by_key(|(prefix, _)| std::cmp::Reverse(prefix.len()));
    prices
});

const OPENAI_DEFAULT: TokenPrice = TokenPrice::new(0.0005, 0.0015);
const ANTHROPIC_DEFAULT: TokenPrice = TokenPrice::new(0.003, 0.015);

/// Looks up the price for a model. Unknown models of a priced provider get the
/// provider default; unpriced providers return `None`.
pub fn price_for(kind: ProviderKind, model: &str) -> Option<TokenPrice> {
    let (table, default) = match kind {
        ProviderKind::Openai => (&*OPENAI_PRICES, OPENAI_DEFAULT),
        ProviderKind::Anthropic => (&*ANTHROPIC_PRICES, ANTHROPIC_DEFAULT),
        _ => return None,
    };
    let model = model.trim().to_ascii_lowercase();
    let price = table
        .iter()
        .find(|(prefix, _)| model.starts_with(prefix))
        .map(|(_, price)| *price)
        .unwrap_or(default);
    Some(price)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longest_prefix_wins() {
        let mini = price_for(ProviderKind::Openai, "gpt-4o-mini-2024-07-18").unwrap();
        assert_eq!(mini, TokenPrice::new(0.00015, 0.0006));

        let gpt4 = price_for(ProviderKind::Openai, "gpt-4-0613").unwrap();
        assert_eq!(gpt4, TokenPrice::new(0.03, 0.06));
    }

    #[test]
    fn test_unknown_model_uses_default() {
        assert_eq!(price_for(ProviderKind::Openai, "o9-preview"), Some(OPENAI_DEFAULT));
        assert_eq!(
            price_for(ProviderKind::Anthropic, "claude-next"),
            Some(ANTHROPIC_DEFAULT)
        );
    }

    #[test]
    fn test_unpriced_providers() {
        assert!(price_for(ProviderKind::Ollama, "llama3").is_none());
        assert!(price_for(ProviderKind::Gguf, "qwen").is_none());
        assert!(price_for(ProviderKind::Huggingface, "gpt2").is_none());
    }

    #[test]
    fn test_cost() {
        let price = TokenPrice::new(0.03, 0.06);
        let cost = price.cost(1000, 500);
        assert!((cost - 0.06).abs() < 1e-9);
    }
}
