use serde::{Deserialize, Serialize};

/// Supported chat providers.
///
/// Unrecognized ids never reach the adapters: the validator maps them to
/// [`ProviderKind::OpenAi`], which is also the `Default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProviderKind {
    #[default]
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "claude")]
    Claude,
    #[serde(rename = "deepseek")]
    DeepSeek,
}

/// A model the settings surface offers for a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelInfo {
    pub id: &'static str,
    pub name: &'static str,
}

const OPENAI_MODELS: &[ModelInfo] = &[
    ModelInfo { id: "gpt-4", name: "GPT-4" },
    ModelInfo { id: "gpt-4-turbo", name: "GPT-4 Turbo" },
    ModelInfo { id: "gpt-3.5-turbo", name: "GPT-3.5 Turbo" },
];

const CLAUDE_MODELS: &[ModelInfo] = &[
    ModelInfo { id: "claude-3-opus-20240229", name: "Claude 3 Opus" },
    ModelInfo { id: "claude-3-sonnet-20240229", name: "Claude 3 Sonnet" },
    ModelInfo { id: "claude-3-haiku-20240307", name: "Claude 3 Haiku" },
];

const DEEPSEEK_MODELS: &[ModelInfo] = &[
    ModelInfo { id: "deepseek-chat", name: "DeepSeek Chat" },
    ModelInfo { id: "deepseek-coder", name: "DeepSeek Coder" },
];

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [ProviderKind::OpenAi, ProviderKind::Claude, ProviderKind::DeepSeek];

    pub fn id(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Claude => "claude",
            ProviderKind::DeepSeek => "deepseek",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.id() == id)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::Claude => "Claude",
            ProviderKind::DeepSeek => "DeepSeek",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "gpt-3.5-turbo",
            ProviderKind::Claude => "claude-3-sonnet-20240229",
            ProviderKind::DeepSeek => "deepseek-chat",
        }
    }

    pub fn default_endpoint(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "https://api.openai.com/v1/chat/completions",
            ProviderKind::Claude => "https://api.anthropic.com/v1/messages",
            ProviderKind::DeepSeek => "https://api.deepseek.com/v1/chat/completions",
        }
    }

    pub fn models(&self) -> &'static [ModelInfo] {
        match self {
            ProviderKind::OpenAi => OPENAI_MODELS,
            ProviderKind::Claude => CLAUDE_MODELS,
            ProviderKind::DeepSeek => DEEPSEEK_MODELS,
        }
    }

    /// Human-readable name for a model id, falling back to the id itself.
    pub fn model_name(model: &str) -> &str {
        Self::ALL
            .iter()
            .flat_map(|p| p.models())
            .find(|m| m.id == model)
            .map(|m| m.name)
            .unwrap_or(model)
    }

    /// Environment variable that overrides this provider's endpoint
    /// (e.g. `AI_CHAT_DEEPSEEK_BASE_URL`).
    pub fn endpoint_env_var(&self) -> String {
        format!("AI_CHAT_{}_BASE_URL", self.id().to_uppercase())
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_round_trip() {
        for p in ProviderKind::ALL {
            assert_eq!(ProviderKind::from_id(p.id()), Some(p));
        }
        assert_eq!(ProviderKind::from_id("gemini"), None);
    }

    #[test]
    fn test_default_model_is_in_catalogue() {
        for p in ProviderKind::ALL {
            assert!(p.models().iter().any(|m| m.id == p.default_model()));
        }
    }

    #[test]
    fn test_model_name_lookup() {
        assert_eq!(ProviderKind::model_name("claude-3-haiku-20240307"), "Claude 3 Haiku");
        assert_eq!(ProviderKind::model_name("my-finetune"), "my-finetune");
    }
}
