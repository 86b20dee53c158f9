//! Path arithmetic on opaque server paths.
//!
//! Paths are never normalised. The only thing inspected is which separator
//! style a path uses: `/` wins whenever it appears, otherwise `\`.

const ROOT: &str = "/";

fn separator_of(path: &str) -> char {
    if path.contains('/') { '/' } else { '\\' }
}

/// Substring before the last separator, or `None` when there is no
/// separator or nothing in front of it.
pub fn parent(path: &str) -> Option<&str> {
    let index = path.rfind(separator_of(path))?;
    if index == 0 {
        return None;
    }
    Some(&path[..index])
}

/// Directory to show after saving `path`. Falls back to the path itself.
pub fn parent_or_self(path: &str) -> &str {
    parent(path).unwrap_or(path)
}

/// Directory to show after deleting `path`. Falls back to the root.
pub fn parent_or_root(path: &str) -> &str {
    parent(path).unwrap_or(ROOT)
}

/// One level up for interactive navigation. Roots such as `/` or `C:\`
/// have nowhere to go.
pub fn up(path: &str) -> Option<String> {
    let separator = separator_of(path);
    let trimmed = path.trim_end_matches(separator);
    if trimmed.len() < path.len() && !trimmed.contains(separator) {
        return None;
    }
    match trimmed.rfind(separator) {
        Some(0) => Some(separator.to_string()),
        Some(index) => {
            let parent = &trimmed[..index];
            if parent.contains(separator) {
                Some(parent.to_string())
            } else {
                Some(format!("{}{}", parent, separator))
            }
        }
        None => None,
    }
}

/// Appends `name` to `base` with the separator style `base` already uses.
pub fn child(base: &str, name: &str) -> String {
    let base = if base.is_empty() { ROOT } else { base };
    if base.ends_with('/') || base.ends_with('\\') {
        return format!("{}{}", base, name);
    }
    let separator = if base.contains('\\') { '\\' } else { '/' };
    format!("{}{}{}", base, separator, name)
}

/// Resolves user input against `base`. Input that already carries a
/// separator is taken verbatim.
pub fn resolve(base: &str, input: &str) -> String {
    if input.contains('/') || input.contains('\\') {
        return input.to_string();
    }
    child(base, input)
}

/// Last path segment, used as the local file name for downloads.
pub fn file_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches(['/', '\\']);
    trimmed.rsplit(['/', '\\']).next().unwrap_or(trimmed)
}
