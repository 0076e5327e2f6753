pub mod request;
pub mod response;
pub mod types;

pub use request::{ProxyRequestBody, ProxyRequestConfig, ProxyRequestData, SystemInstruction};
pub use response::{ErrorBody, ProxyResponseBody};
pub use types::*;
