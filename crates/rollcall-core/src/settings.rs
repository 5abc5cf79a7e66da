use std::collections::BTreeMap;

pub const KEY_CAPACITY: &str = "capacity";
pub const KEY_TITLE: &str = "title";
pub const KEY_DESCRIPTION: &str = "description";
pub const KEY_SIGNUP_ENABLED: &str = "signup_enabled";
pub const KEY_QUERY_ENABLED: &str = "query_enabled";

pub const DEFAULT_CAPACITY: u32 = 10;
pub const DEFAULT_TITLE: &str = "Event signup";

/// Typed event configuration, resolved once per inbound command from the
/// provider's key/value map. Invalid values keep the documented default
/// with a warning; they are never fatal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub capacity: u32,
    pub title: String,
    pub description: String,
    pub signup_enabled: bool,
    pub query_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            title: DEFAULT_TITLE.to_string(),
            description: String::new(),
            signup_enabled: true,
            query_enabled: true,
        }
    }
}

impl Settings {
    pub fn resolve(map: &BTreeMap<String, String>) -> Settings {
        let mut out = Settings::default();
        if let Some(raw) = map.get(KEY_CAPACITY) {
            match raw.trim().parse::<u32>() {
                Ok(n) => out.capacity = n,
                Err(_) => tracing::warn!(
                    key = KEY_CAPACITY,
                    value = raw.as_str(),
                    "invalid setting value, keeping default"
                ),
            }
        }
        if let Some(raw) = map.get(KEY_TITLE) {
            if !raw.trim().is_empty() {
                out.title = raw.trim().to_string();
            }
        }
        if let Some(raw) = map.get(KEY_DESCRIPTION) {
            out.description = raw.trim().to_string();
        }
        out.signup_enabled = resolve_bool(map, KEY_SIGNUP_ENABLED, out.signup_enabled);
        out.query_enabled = resolve_bool(map, KEY_QUERY_ENABLED, out.query_enabled);
        out
    }
}

fn resolve_bool(map: &BTreeMap<String, String>, key: &'static str, default: bool) -> bool {
    let Some(raw) = map.get(key) else {
        return default;
    };
    match parse_bool_token(raw) {
        Some(v) => v,
        None => {
            tracing::warn!(key, value = raw.as_str(), "unrecognized toggle value, keeping default");
            default
        }
    }
}

/// Accepts the toggle spellings seen in sheet-backed deployments.
fn parse_bool_token(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Some(true),
        "false" | "off" | "no" | "0" => Some(false),
        _ => None,
    }
}
