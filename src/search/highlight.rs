use regex::RegexBuilder;

/// Wrap every query-word occurrence in `text` with `<b>..</b>` markers.
///
/// The query is lowercased and split on whitespace. Words longer than four
/// characters match prefix-tolerantly: the final character is optional and
/// up to one extra trailing character is absorbed, so minor morphological
/// variants ("rocket" / "rockets") still highlight. Words of four characters
/// or fewer must match as exact whole words. Matching is case-insensitive.
///
/// Words are applied left to right over the already-marked text, so markers
/// can nest when two query words overlap a span. That compounding matches
/// the historic behavior and is covered by tests; see DESIGN.md.
pub fn highlight(text: &str, query: &str) -> String {
    let mut marked = text.to_string();
    for word in query.to_lowercase().split_whitespace() {
        let Some(pattern) = word_pattern(word) else {
            continue;
        };
        let Ok(re) = RegexBuilder::new(&pattern).case_insensitive(true).build() else {
            continue;
        };
        marked = re.replace_all(&marked, "<b>${0}</b>").into_owned();
    }
    marked
}

fn word_pattern(word: &str) -> Option<String> {
    let mut chars: Vec<char> = word.chars().collect();
    if chars.is_empty() {
        return None;
    }
    if chars.len() > 4 {
        let last = chars.pop()?;
        let stem: String = chars.into_iter().collect();
        Some(format!(
            r"\b{}{}?.?\b",
            regex::escape(&stem),
            regex::escape(&last.to_string())
        ))
    } else {
        Some(format!(r"\b{}\b", regex::escape(word)))
    }
}
