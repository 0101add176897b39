//! Configuration template for `sift init`.
//!
//! The template is stored as a valid TOML file and returned as a commented-out
//! example configuration.

/// Page configuration template (valid TOML).
const PAGE_TEMPLATE: &str = include_str!("../templates/sift.toml");

/// Returns the page configuration template as a commented-out example.
pub fn page_template() -> String {
    comment_template(PAGE_TEMPLATE)
}

/// Converts a valid TOML template into a commented-out example config.
///
/// Lines that are already comments are preserved as-is. Non-comment, non-empty
/// lines get a "# " prefix. Empty lines are preserved.
fn comment_template(template: &str) -> String {
    let mut result = String::with_capacity(template.len() + template.lines().count() * 2);
    for line in template.lines() {
        if !line.is_empty() && !line.starts_with('#') {
            result.push_str("# ");
        }
        result.push_str(line);
        result.push('\n');
    }
    result
}
