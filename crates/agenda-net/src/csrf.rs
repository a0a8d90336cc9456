//! CSRF token lookup in a `Cookie` header value.

/// Find `name` in a `k=v; k2=v2` cookie string.  Surrounding quotes are
/// stripped; an empty value counts as absent.
pub fn cookie_value(header: &str, name: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}
