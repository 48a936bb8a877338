//! Hotkey binding value object

use crate::domain::provider::ProviderId;

use super::KeyCombination;

/// Provider/model routing for a single binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelOverride {
    pub provider: ProviderId,
    /// None uses the provider's active model
    pub model: Option<String>,
}

/// A configured key combination plus its prompt template.
///
/// Immutable once a job captures it; configuration edits produce new values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeyBinding {
    pub combination: KeyCombination,
    pub name: String,
    pub prompt: String,
    pub log_color: String,
    pub model_override: Option<ModelOverride>,
    /// Explanation template when learning mode is on; empty uses the default
    pub learning_prompt: Option<String>,
}

impl HotkeyBinding {
    /// Create a binding without a model override
    pub fn new(
        combination: KeyCombination,
        name: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            combination,
            name: name.into(),
            prompt: prompt.into(),
            log_color: "#FFFFFF".to_string(),
            model_override: None,
            learning_prompt: None,
        }
    }

    /// Route this binding to a specific provider/model
    pub fn with_override(mut self, provider: ProviderId, model: Option<String>) -> Self {
        self.model_override = Some(ModelOverride { provider, model });
        self
    }

    /// Follow text jobs with an explanation request
    pub fn with_learning(mut self, prompt: impl Into<String>) -> Self {
        self.learning_prompt = Some(prompt.into());
        self
    }

    /// Short label used in log lines, e.g. `Ctrl+F1: Fix grammar`
    pub fn label(&self) -> String {
        format!("{}: {}", self.combination, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_contains_combination_and_name() {
        let binding = HotkeyBinding::new("Ctrl+F1".parse().unwrap(), "Fix", "Fix grammar");
        assert_eq!(binding.label(), "Ctrl+F1: Fix");
        assert!(binding.model_override.is_none());
    }

    #[test]
    fn with_override_sets_provider() {
        let binding = HotkeyBinding::new("Ctrl+F2".parse().unwrap(), "Tr", "Translate")
            .with_override(ProviderId::OpenAi, Some("gpt-4o".to_string()));
        let routing = binding.model_override.unwrap();
        assert_eq!(routing.provider, ProviderId::OpenAi);
        assert_eq!(routing.model.as_deref(), Some("gpt-4o"));
    }
}
