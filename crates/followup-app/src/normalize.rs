// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

/// Canonical comparable form of a status or category label: lower-cased with
/// every whitespace and underscore character removed, so `"In Progress"`,
/// `"in_progress"`, and `"inprogress"` compare equal.
pub fn normalize(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .chars()
        .filter(|ch| !ch.is_whitespace() && *ch != '_')
        .collect()
}

/// Same as [`normalize`], treating an absent value as empty.
pub fn normalize_opt(value: Option<&str>) -> String {
    value.map(normalize).unwrap_or_default()
}
