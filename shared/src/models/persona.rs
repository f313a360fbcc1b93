//! Restaurant persona configuration: avatar, theme and AI settings
//!
//! Stored as JSONB columns on `restaurants`. Every struct keeps unknown keys in
//! `extra` so a document exported by a newer schema survives a round-trip.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Define a string-backed enum whose unlisted values survive as `Other`
macro_rules! open_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($variant,)+
            /// A value this build does not know, kept verbatim
            Other(String),
        }

        impl $name {
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $text,)+
                    Self::Other(s) => s.as_str(),
                }
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                match s.as_str() {
                    $($text => Self::$variant,)+
                    _ => Self::Other(s),
                }
            }
        }

        impl From<$name> for String {
            fn from(v: $name) -> Self {
                match v {
                    $name::Other(s) => s,
                    known => known.as_str().to_string(),
                }
            }
        }
    };
}

// =============================================================================
// Avatar
// =============================================================================

/// Chat assistant persona.
///
/// Every key is optional: stored configs are often partial, and absent keys
/// must stay absent through export and import.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AvatarConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personality: Option<Personality>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub greeting: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<Tone>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

open_enum!(Personality {
    FriendlyKnowledgeable => "friendly_knowledgeable",
    ProfessionalFormal => "professional_formal",
    CasualFun => "casual_fun",
    ExpertChef => "expert_chef",
});

open_enum!(Tone {
    Warm => "warm",
    Professional => "professional",
    Enthusiastic => "enthusiastic",
    Casual => "casual",
});

// =============================================================================
// Theme
// =============================================================================

/// Colour tokens and CSS gradient strings used by the restaurant page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThemeConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Named gradients, e.g. `header`, `button`, `fab`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gradients: Option<BTreeMap<String, String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// =============================================================================
// AI
// =============================================================================

/// Per-restaurant AI assistant configuration.
///
/// The AI service applies its own defaults for absent keys; nothing is
/// filled in here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<AiMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Feature flags (speech_synthesis, speech_recognition, streaming, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_config: Option<ModelParams>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance: Option<PerformanceLimits>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

open_enum!(AiMode {
    TextOnly => "text_only",
    SpeechEnabled => "speech_enabled",
    Hybrid => "hybrid",
});

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_messages: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt_override: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceLimits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streaming_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_responses: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_daily_requests: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_daily_cost_usd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit_per_minute: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_avatar_keeps_unknown_keys() {
        let raw = json!({
            "name": "Cookie Expert Betty",
            "personality": "friendly_knowledgeable",
            "greeting": "Welcome to Chip Cookies!",
            "tone": "warm",
            "voice": "nova"
        });
        let avatar: AvatarConfig = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(avatar.personality, Some(Personality::FriendlyKnowledgeable));
        assert_eq!(avatar.tone, Some(Tone::Warm));
        assert_eq!(avatar.extra.get("voice").unwrap(), "nova");
        assert_eq!(serde_json::to_value(&avatar).unwrap(), raw);
    }

    #[test]
    fn test_avatar_partial_and_unlisted_values() {
        let raw = json!({ "personality": "grumpy", "tone": "deadpan" });
        let avatar: AvatarConfig = serde_json::from_value(raw.clone()).unwrap();
        assert!(avatar.name.is_none());
        assert!(avatar.greeting.is_none());
        assert_eq!(avatar.personality, Some(Personality::Other("grumpy".into())));
        assert_eq!(avatar.tone.as_ref().map(Tone::as_str), Some("deadpan"));
        assert_eq!(serde_json::to_value(&avatar).unwrap(), raw);
    }

    #[test]
    fn test_theme_gradients() {
        let raw = json!({
            "primary": "#aa8a40",
            "secondary": "#d4a854",
            "gradients": {
                "header": "linear-gradient(135deg, #aa8a40 0%, #d4a854 50%, #aa8a40 100%)"
            }
        });
        let theme: ThemeConfig = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(theme.primary.as_deref(), Some("#aa8a40"));
        assert!(theme.accent.is_none());
        assert_eq!(theme.gradients.as_ref().map(BTreeMap::len), Some(1));
        assert_eq!(serde_json::to_value(&theme).unwrap(), raw);

        let empty = json!({ "primary": "#000", "gradients": {} });
        let theme: ThemeConfig = serde_json::from_value(empty.clone()).unwrap();
        assert_eq!(serde_json::to_value(&theme).unwrap(), empty);
    }

    #[test]
    fn test_partial_ai_config_is_not_filled_in() {
        let raw = json!({ "mode": "hybrid" });
        let ai: AiConfig = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(ai.mode, Some(AiMode::Hybrid));
        assert!(ai.provider.is_none());
        assert!(ai.model_config.is_none());
        assert_eq!(serde_json::to_value(&ai).unwrap(), raw);

        let raw = json!({ "model_config": { "temperature": 0.5 }, "performance": {} });
        let ai: AiConfig = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&ai).unwrap(), raw);
    }

    #[test]
    fn test_ai_config_full() {
        let raw = json!({
            "mode": "speech_enabled",
            "provider": "openai",
            "features": { "speech_synthesis": true, "streaming": false },
            "model_config": {
                "model_name": "gpt-4o",
                "max_tokens": 300,
                "temperature": 0.8,
                "context_messages": 12
            },
            "performance": {
                "streaming_enabled": true,
                "cache_responses": false,
                "max_daily_requests": 2000,
                "max_daily_cost_usd": 20.0,
                "rate_limit_per_minute": 100
            }
        });
        let ai: AiConfig = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(ai.mode, Some(AiMode::SpeechEnabled));
        assert_eq!(ai.features.as_ref().unwrap()["streaming"], false);
        assert_eq!(ai.performance.as_ref().unwrap().max_daily_requests, Some(2000));
        assert_eq!(serde_json::to_value(&ai).unwrap(), raw);
    }
}
