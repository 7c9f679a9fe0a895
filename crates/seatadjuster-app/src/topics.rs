//! Message bus topic names used by the seat adjuster.

use serde::{Deserialize, Serialize};

pub const TOPIC_REQUEST: &str = "seatadjuster/setPosition/request";
pub const TOPIC_REQUEST_RIGHT: &str = "seatadjuster/setPosition/requestRight";
pub const TOPIC_RESPONSE: &str = "seatadjuster/setPosition/response";
pub const TOPIC_CURRENT_POSITION: &str = "seatadjuster/currentPosition";

/// Topic layout. Every entry in `requests` is served by the same handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topics {
    #[serde(default = "default_requests")]
    pub requests: Vec<String>,
    #[serde(default = "default_response")]
    pub response: String,
    #[serde(default = "default_current_position")]
    pub current_position: String,
}

fn default_requests() -> Vec<String> {
    vec![TOPIC_REQUEST.to_string(), TOPIC_REQUEST_RIGHT.to_string()]
}
fn default_response() -> String {
    TOPIC_RESPONSE.to_string()
}
fn default_current_position() -> String {
    TOPIC_CURRENT_POSITION.to_string()
}

impl Default for Topics {
    fn default() -> Self {
        Self {
            requests: default_requests(),
            response: default_response(),
            current_position: default_current_position(),
        }
    }
}
