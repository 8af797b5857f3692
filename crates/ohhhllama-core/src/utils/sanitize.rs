//! Deterministic name sanitization for import targets and archives.

/// Sanitize a model name for registration with the inference backend.
///
/// Lowercases, maps anything outside `[a-z0-9-]` to `-`, collapses runs of
/// `-` and trims them from both ends. Applying it twice yields the same value.
pub fn sanitize_model_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars().flat_map(char::to_lowercase) {
        let c = if c.is_ascii_alphanumeric() || c == '-' {
            c
        } else {
            '-'
        };
        if c == '-' && out.ends_with('-') {
            continue;
        }
        out.push(c);
    }
    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() {
        "model".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Default import name for a repository: its last path segment, sanitized.
pub fn default_name_for_repo(repo_id: &str) -> String {
    let last = repo_id
        .trim()
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(repo_id);
    sanitize_model_name(last)
}

/// Archive filename for a container image reference.
pub fn archive_name_for_image(image: &str) -> String {
    let mut out = String::with_capacity(image.len() + 4);
    for c in image.trim().chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
            out.push(c);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    let stem = out.trim_matches(|c| c == '_' || c == '.');
    let stem = if stem.is_empty() { "image" } else { stem };
    format!("{stem}.tar")
}
