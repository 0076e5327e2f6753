use manapalm_protocol::JsonValue;
use manapalm_protocol::downstream::{Content, ProxyRequestConfig};

pub const DEFAULT_TEMPERATURE: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurnRole {
    User,
    Model,
}

impl TurnRole {
    /// Only `model` is recognised; every other role is a user turn.
    pub fn parse(role: &str) -> Self {
        if role.trim().eq_ignore_ascii_case("model") {
            TurnRole::Model
        } else {
            TurnRole::User
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Model,
            text: text.into(),
        }
    }

    pub fn from_content(content: &Content) -> Self {
        Self {
            role: TurnRole::parse(&content.role),
            text: part_text(&content.parts),
        }
    }
}

/// Text of the first part when it carries a string `text`, otherwise the first
/// part as JSON. Structured parts (images, files) therefore reach the provider
/// as raw JSON text rather than failing the request.
pub fn part_text(parts: &[JsonValue]) -> String {
    let Some(part) = parts.first() else {
        return String::new();
    };
    match part.get("text") {
        Some(JsonValue::String(text)) => text.clone(),
        _ => part.to_string(),
    }
}

/// Provider-agnostic adapter input.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub turns: Vec<ChatTurn>,
    pub temperature: Option<f64>,
    pub system_instruction: Option<String>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, turns: Vec<ChatTurn>) -> Self {
        Self {
            model: model.into(),
            turns,
            temperature: None,
            system_instruction: None,
        }
    }

    pub fn from_contents(
        model: impl Into<String>,
        contents: &[Content],
        config: Option<&ProxyRequestConfig>,
    ) -> Self {
        let mut req = Self::new(model, contents.iter().map(ChatTurn::from_content).collect());
        if let Some(config) = config {
            req.temperature = config.temperature;
            req.system_instruction = config
                .system_instruction
                .as_ref()
                .map(|instruction| instruction.text())
                .filter(|text| !text.trim().is_empty());
        }
        req
    }

    pub fn with_model(&self, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..self.clone()
        }
    }

    pub fn temperature(&self) -> f64 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn string_text_part_is_used_verbatim() {
        assert_eq!(part_text(&[json!({"text": "درود"}), json!({"text": "ignored"})]), "درود");
    }

    #[test]
    fn structured_part_is_serialized() {
        let part = json!({"inlineData": {"mimeType": "image/png", "data": "AAAA"}});
        assert_eq!(part_text(&[part.clone()]), part.to_string());

        let numeric_text = json!({"text": 42});
        assert_eq!(part_text(&[numeric_text]), r#"{"text":42}"#);
    }

    #[test]
    fn no_parts_is_empty_text() {
        assert_eq!(part_text(&[]), "");
    }

    #[test]
    fn roles_other_than_model_are_user() {
        assert_eq!(TurnRole::parse("model"), TurnRole::Model);
        assert_eq!(TurnRole::parse("user"), TurnRole::User);
        assert_eq!(TurnRole::parse("system"), TurnRole::User);
        assert_eq!(TurnRole::parse("assistant"), TurnRole::User);
    }

    #[test]
    fn from_contents_applies_config() {
        let contents = vec![
            Content {
                role: "user".to_string(),
                parts: vec![json!({"text": "hi"})],
            },
            Content {
                role: "model".to_string(),
                parts: vec![json!({"text": "hello"})],
            },
        ];
        let config: ProxyRequestConfig =
            serde_json::from_value(json!({"temperature": 0.1, "systemInstruction": "   "})).unwrap();

        let req = ChatRequest::from_contents("gpt-4o-mini", &contents, Some(&config));
        assert_eq!(req.turns, vec![ChatTurn::user("hi"), ChatTurn::model("hello")]);
        assert_eq!(req.temperature(), 0.1);
        assert!(req.system_instruction.is_none());

        let bare = ChatRequest::from_contents("gpt-4o-mini", &contents, None);
        assert_eq!(bare.temperature(), DEFAULT_TEMPERATURE);
        assert_eq!(bare.with_model("other").model, "other");
    }
}
