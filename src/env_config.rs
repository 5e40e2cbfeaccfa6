/// Centralized environment-variable parsing helpers.
///
/// All configuration knobs go through these helpers so the truthy/falsy
/// parsing logic lives in exactly one place.

/// Returns `true` for `1`, `true`, `yes` or `on` (case-insensitive, trimmed).
#[inline]
pub(crate) fn is_truthy(raw: &str) -> bool {
    let normalized = raw.trim().to_ascii_lowercase();
    normalized == "1" || normalized == "true" || normalized == "yes" || normalized == "on"
}

/// Returns `true` for `0`, `false`, `no` or `off` (case-insensitive, trimmed).
#[inline]
pub(crate) fn is_falsy(raw: &str) -> bool {
    let normalized = raw.trim().to_ascii_lowercase();
    normalized == "0" || normalized == "false" || normalized == "no" || normalized == "off"
}

/// Reads an environment variable, treating unset and blank values alike.
#[inline]
pub(crate) fn env_var(var_name: &str) -> Option<String> {
    std::env::var(var_name)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|value| !value.is_empty())
}
