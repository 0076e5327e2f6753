//! Wire types for the router: the downstream proxy API and the upstream
//! provider/identity payloads it speaks.

pub mod downstream;
pub mod gemini;
pub mod openai;
pub mod supabase;

pub type JsonValue = serde_json::Value;
