use std::fmt;

use serde::{Deserialize, Serialize};

use crate::JsonValue;

/// Caller entitlement level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Free,
    Premium,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Premium => "premium",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One conversation turn as sent by the storefront.
///
/// `parts` stays untyped: only the first part's `text` is read, anything else
/// is forwarded as its JSON text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default)]
    pub parts: Vec<JsonValue>,
}

fn default_role() -> String {
    "user".to_string()
}
