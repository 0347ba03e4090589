use crate::dataset::value::Value;
use crate::dataset::value::ValueError;
use crate::document::paragraph::TextRuns;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Well-formed placeholder token: `{{key}}` where the key has no braces
static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([^{}]+)\}\}").expect("Hardcode regex pattern"));

/// Placeholder token for a column name
pub fn token(key: &str) -> String {
    format!("{{{{{key}}}}}")
}

/// Replaces every `{{key}}` token of a paragraph with the rendered value.
///
/// Replacement is run-local: a run is rewritten only when its own text holds
/// the whole token, so formatting never moves between runs. Tokens spread over
/// several runs, or over a tab or line break, are left as they are.
///
/// # Arguments
/// * `paragraph` - Runs to rewrite in place
/// * `key` - Column name inside the braces
/// * `value` - Value inserted verbatim; rendered only when the token occurs
///
/// # Returns
/// Number of runs rewritten
pub fn substitute<P: TextRuns + ?Sized>(paragraph: &mut P, key: &str, value: &Value) -> Result<usize, ValueError> {
    let token = token(key);
    if !paragraph.text().contains(&token) {
        return Ok(0);
    }

    let replacement = value.render()?;
    let mut rewritten = 0;
    for index in 0..paragraph.run_count() {
        if paragraph.replace_in_run(index, &token, &replacement) {
            rewritten += 1;
        }
    }
    Ok(rewritten)
}

/// Keys of all well-formed tokens in a text
pub fn placeholders(text: &str) -> BTreeSet<String> {
    TOKEN
        .captures_iter(text)
        .map(|captures| captures[1].to_owned())
        .collect()
}
