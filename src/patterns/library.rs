use super::{PatternEntry, PatternOptions};

/// Renders `pattern_library.md`
///
/// # Arguments
///
/// * `domain` - Audited site
/// * `qualifying_pages` - Pages that met both thresholds
/// * `patterns` - Categories with their examples
/// * `options` - Thresholds used, stated in the methodology section
pub fn format_pattern_library(
    domain: &str,
    qualifying_pages: usize,
    patterns: &[PatternEntry],
    options: &PatternOptions,
) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Pattern Library: {}\n\n", domain));

    md.push_str("## Methodology\n\n");
    md.push_str(&format!(
        "Patterns were taken from {} high-scoring pages: pages with a served score >= {} \
         and a rendered score >= {}. ",
        qualifying_pages, options.min_served_score, options.min_rendered_score
    ));
    md.push_str(&format!(
        "Each category lists at most {} examples, in the order the pages were audited.\n\n",
        options.max_examples
    ));

    for pattern in patterns {
        md.push_str(&format!("## {}\n\n", pattern.category));
        md.push_str(&format!("{}\n\n", pattern.description));

        if pattern.examples.is_empty() {
            md.push_str("_No examples found._\n\n");
            continue;
        }

        for (i, example) in pattern.examples.iter().enumerate() {
            md.push_str(&format!("### Example {}: {}\n\n", i + 1, example.url));
            md.push_str("```html\n");
            md.push_str(&example.snippet);
            md.push_str("\n```\n\n");
        }
    }

    md
}
