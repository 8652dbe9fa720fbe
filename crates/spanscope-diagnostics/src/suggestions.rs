// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Suggestion helpers for lookup failures.

/// Levenshtein distance, counted in chars.
fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, a_ch) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, b_ch) in b.iter().enumerate() {
            let cost = usize::from(a_ch != *b_ch);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Closest candidate to `name`, if any is near enough to be a likely typo.
/// Ties go to the earliest candidate.
pub fn closest<'a>(name: &str, candidates: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let max_distance = match name.chars().count() {
        0..=2 => 1,
        3..=5 => 2,
        _ => 3,
    };

    candidates
        .into_iter()
        .filter(|c| c.chars().count().abs_diff(name.chars().count()) <= max_distance)
        .map(|c| (c, edit_distance(name, c)))
        .filter(|(_, d)| *d <= max_distance)
        .fold(None, |best: Option<(&str, usize)>, (c, d)| match best {
            Some((_, bd)) if bd <= d => best,
            _ => Some((c, d)),
        })
        .map(|(c, _)| c)
}

/// `did you mean `x`?` for the closest candidate.
pub fn did_you_mean<'a>(name: &str, candidates: impl IntoIterator<Item = &'a str>) -> Option<String> {
    closest(name, candidates).map(|c| format!("did you mean `{}`?", c))
}

/// Short listing of available names, capped at `limit` entries.
pub fn available(what: &str, names: &[String], limit: usize) -> Option<String> {
    if names.is_empty() {
        return None;
    }
    let shown: Vec<String> = names.iter().take(limit).map(|n| format!("`{}`", n)).collect();
    let more = names.len().saturating_sub(limit);
    Some(if more > 0 {
        format!("{} available: {} and {} more", what, shown.join(", "), more)
    } else {
        format!("{} available: {}", what, shown.join(", "))
    })
}
