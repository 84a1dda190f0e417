// API key shape checks, run before a provider is activated.
//
// These are cheap plausibility checks (prefix + length), not a call to the
// provider. Detection itself never validates keys; a bad key simply
// surfaces as a Remote error at analysis time.

/// Whether `api_key` looks like a valid credential for `provider`.
pub fn validate_api_key(provider: &str, api_key: &str) -> bool {
    if api_key.is_empty() {
        return false;
    }
    match provider {
        "openai" => api_key.starts_with("sk-") && api_key.len() > 20,
        "huggingface" => api_key.starts_with("hf_") && api_key.len() > 10,
        "custom" => true,
        _ => false,
    }
}
