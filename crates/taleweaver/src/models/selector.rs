use std::str::FromStr;

use strum_macros::{Display, EnumIter, EnumString};

use crate::providers::factory::ProviderType;

/// The logical model names a client may ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, EnumIter)]
pub enum ModelSelector {
    #[default]
    #[strum(serialize = "sonnet")]
    Sonnet,
    #[strum(serialize = "haiku")]
    Haiku,
    #[strum(serialize = "gpt4o")]
    Gpt4o,
    #[strum(serialize = "gpt4o-mini")]
    Gpt4oMini,
    #[strum(serialize = "local")]
    Local,
}

/// A concrete backend and model name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelChoice {
    pub provider: ProviderType,
    pub model: &'static str,
}

impl ModelSelector {
    /// Parse a selector, falling back to the default for anything unrecognised
    pub fn resolve(name: Option<&str>) -> Self {
        match name {
            Some(name) => Self::from_str(name).unwrap_or_else(|_| {
                tracing::debug!(selector = name, "unknown model selector, using default");
                Self::default()
            }),
            None => Self::default(),
        }
    }

    pub fn choice(self) -> ModelChoice {
        let (provider, model) = match self {
            ModelSelector::Sonnet => (ProviderType::Anthropic, "claude-sonnet-4-20250514"),
            ModelSelector::Haiku => (ProviderType::Anthropic, "claude-3-5-haiku-20241022"),
            ModelSelector::Gpt4o => (ProviderType::OpenAi, "gpt-4o"),
            ModelSelector::Gpt4oMini => (ProviderType::OpenAi, "gpt-4o-mini"),
            ModelSelector::Local => (ProviderType::Ollama, crate::providers::ollama::OLLAMA_MODEL),
        };
        ModelChoice { provider, model }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_known_selectors_round_trip_through_names() {
        for selector in ModelSelector::iter() {
            let name = selector.to_string();
            assert_eq!(ModelSelector::resolve(Some(&name)), selector);
        }
    }

    #[test]
    fn test_unknown_selector_falls_back_to_default() {
        assert_eq!(ModelSelector::resolve(Some("gpt-9")), ModelSelector::Sonnet);
        assert_eq!(ModelSelector::resolve(Some("")), ModelSelector::Sonnet);
        assert_eq!(ModelSelector::resolve(None), ModelSelector::Sonnet);
    }

    #[test]
    fn test_choice_table() {
        let choice = ModelSelector::Haiku.choice();
        assert_eq!(choice.provider, ProviderType::Anthropic);
        assert_eq!(choice.model, "claude-3-5-haiku-20241022");

        let choice = ModelSelector::Gpt4oMini.choice();
        assert_eq!(choice.provider, ProviderType::OpenAi);
        assert_eq!(choice.model, "gpt-4o-mini");

        assert_eq!(ModelSelector::Local.choice().provider, ProviderType::Ollama);
    }
}
