use crate::DEFAULT_SSH_PORT;

pub fn get_default_ssh_port() -> u16 {
    DEFAULT_SSH_PORT
}

const HOSTWATCH_DEMO: &str = "HOSTWATCH_DEMO";

/// Demo mode forces synthetic data for every host
pub fn get_demo_mode() -> bool {
    let demo_from_env = std::env::var(HOSTWATCH_DEMO);
    demo_from_env.is_ok_and(|res| matches!(res.trim(), "1" | "true" | "yes" | "on"))
}

const HOSTWATCH_SECRET: &str = "HOSTWATCH_SECRET";

pub fn get_secret() -> Option<String> {
    let secret_from_env = std::env::var(HOSTWATCH_SECRET);
    secret_from_env.ok()
}

/// Longest error detail handed to callers
pub const MAX_DETAIL_LEN: usize = 150;

/// Cut `text` down to [`MAX_DETAIL_LEN`] characters on a char boundary
pub fn truncate_detail(text: &str) -> String {
    let text = text.trim();
    match text.char_indices().nth(MAX_DETAIL_LEN) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Replace every occurrence of `secret` in `text`
pub fn redact(text: &str, secret: &str) -> String {
    if secret.is_empty() {
        return text.to_string();
    }
    text.replace(secret, "***")
}

/// Round to `places` decimal places
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
