//! Prompt resolution

use super::content::{CapturedInput, EncodedImage};

/// Placeholder replaced by the captured text
pub const TEXT_PLACEHOLDER: &str = "{text}";

/// Placeholders in a learning-mode template
pub const ORIGINAL_PLACEHOLDER: &str = "{original}";
pub const RESULT_PLACEHOLDER: &str = "{result}";

const DEFAULT_LEARNING_PROMPT: &str = "You are a language tutor. Compare the original text with the corrected result \
and explain each real mistake that was fixed: the spelling, punctuation or grammar rule behind it, in one short line. \
Ignore typos, capitalization and symbol changes.\n\nOriginal: {original}\n\nResult: {result}";

const LANGUAGE_INSTRUCTION: &str = "Respond in the same language as the original text.";

/// A fully resolved provider request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub image: Option<EncodedImage>,
    pub model: String,
}

impl GenerationRequest {
    /// Substitute captured input into a binding's prompt template.
    ///
    /// Text replaces `{text}` when present, otherwise it is appended after a
    /// blank line. Image input leaves the template as-is and travels as payload.
    pub fn resolve(template: &str, input: CapturedInput, model: impl Into<String>) -> Self {
        let template = template.trim();
        let (prompt, image) = match input {
            CapturedInput::Text(text) => {
                let prompt = if template.contains(TEXT_PLACEHOLDER) {
                    template.replace(TEXT_PLACEHOLDER, &text)
                } else if template.is_empty() {
                    text
                } else {
                    format!("{}\n\n{}", template, text)
                };
                (prompt, None)
            }
            CapturedInput::Image(image) => (template.to_string(), Some(image)),
        };

        Self {
            prompt,
            image,
            model: model.into(),
        }
    }

    /// Learning-mode follow-up asking the model to explain its changes.
    ///
    /// `{original}` and `{result}` in the template are substituted; a
    /// template without either gets both texts appended. An empty template
    /// uses the built-in tutor prompt.
    pub fn explanation(
        template: &str,
        original: &str,
        result: &str,
        model: impl Into<String>,
    ) -> Self {
        let template = match template.trim() {
            "" => DEFAULT_LEARNING_PROMPT,
            t => t,
        };

        let has_placeholders =
            template.contains(ORIGINAL_PLACEHOLDER) || template.contains(RESULT_PLACEHOLDER);
        let body = if has_placeholders {
            template
                .replace(ORIGINAL_PLACEHOLDER, original)
                .replace(RESULT_PLACEHOLDER, result)
        } else {
            format!("{}\n\nOriginal: {}\n\nResult: {}", template, original, result)
        };

        Self::text(format!("{}\n\n{}", body, LANGUAGE_INSTRUCTION), model)
    }

    /// Plain text request with no captured content
    pub fn text(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            image: None,
            model: model.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_text_after_template() {
        let req = GenerationRequest::resolve(
            "Fix grammar.",
            CapturedInput::Text("teh cat".into()),
            "m",
        );
        assert_eq!(req.prompt, "Fix grammar.\n\nteh cat");
        assert!(req.image.is_none());
        assert_eq!(req.model, "m");
    }

    #[test]
    fn substitutes_placeholder() {
        let req = GenerationRequest::resolve(
            "Translate \"{text}\" to French",
            CapturedInput::Text("hello".into()),
            "m",
        );
        assert_eq!(req.prompt, "Translate \"hello\" to French");
    }

    #[test]
    fn empty_template_uses_text() {
        let req = GenerationRequest::resolve("  ", CapturedInput::Text("just this".into()), "m");
        assert_eq!(req.prompt, "just this");
    }

    #[test]
    fn explanation_substitutes_both_texts() {
        let req = GenerationRequest::explanation("Why {original} became {result}?", "teh", "the", "m");
        assert!(req.prompt.starts_with("Why teh became the?"));
        assert!(req.prompt.ends_with(LANGUAGE_INSTRUCTION));
        assert!(req.image.is_none());
    }

    #[test]
    fn explanation_appends_texts_without_placeholders() {
        let req = GenerationRequest::explanation("Explain the fixes.", "teh", "the", "m");
        assert!(req.prompt.contains("Explain the fixes.\n\nOriginal: teh\n\nResult: the"));
    }

    #[test]
    fn empty_learning_template_uses_default() {
        let req = GenerationRequest::explanation("  ", "teh", "the", "m");
        assert!(req.prompt.starts_with("You are a language tutor."));
        assert!(req.prompt.contains("Original: teh"));
        assert!(!req.prompt.contains(ORIGINAL_PLACEHOLDER));
    }

    #[test]
    fn image_input_keeps_template() {
        let image = EncodedImage::png(vec![1, 2, 3]);
        let req = GenerationRequest::resolve(
            "Describe {text}",
            CapturedInput::Image(image.clone()),
            "m",
        );
        assert_eq!(req.prompt, "Describe {text}");
        assert_eq!(req.image, Some(image));
    }
}
