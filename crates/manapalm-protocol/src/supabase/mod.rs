//! Supabase auth and PostgREST rows read by the identity resolver.

use serde::{Deserialize, Serialize};

use crate::JsonValue;

/// `GET /auth/v1/user` response (only the fields we read).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// `profiles` row, selected as `is_admin,metadata`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileRow {
    #[serde(default)]
    pub is_admin: Option<bool>,
    /// Free-form JSON; live access lives at `live_access.remaining_seconds`.
    #[serde(default)]
    pub metadata: Option<JsonValue>,
}

impl ProfileRow {
    pub fn is_admin(&self) -> bool {
        self.is_admin.unwrap_or(false)
    }

    /// Remaining live-access seconds. Missing, null or non-numeric values read as 0;
    /// numeric strings are accepted since the admin panel stores form input verbatim.
    pub fn live_access_remaining_seconds(&self) -> i64 {
        let Some(value) = self
            .metadata
            .as_ref()
            .and_then(|metadata| metadata.get("live_access"))
            .and_then(|live| live.get("remaining_seconds"))
        else {
            return 0;
        };
        match value {
            JsonValue::Number(number) => number
                .as_i64()
                .or_else(|| number.as_f64().map(|secs| secs as i64))
                .unwrap_or(0),
            JsonValue::String(raw) => raw.trim().parse::<f64>().map(|secs| secs as i64).unwrap_or(0),
            _ => 0,
        }
    }
}
