// Shared prompt constants and prompt-building utilities.
// Each service that needs model calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// Instruction appended to every prompt whose answer is parsed as JSON.
pub const JSON_ONLY_INSTRUCTION: &str = "\
Return ONLY the JSON. \
Do NOT include any text outside the JSON object. \
Do not include markdown formatting like ```json. \
Do NOT include explanations or apologies.";

/// Audience description shared by the tutor prompts.
pub const AUDIENCE: &str = "Dutch secondary school students (VO, 14-16 year olds)";

/// Fills `{placeholder}` slots in a template in a single pass, so braces inside
/// substituted values are never expanded. Unknown placeholders are left as-is.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let key_end = after.find('}').filter(|&end| {
            let key = &after[..end];
            !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        });

        match key_end.and_then(|end| {
            values
                .iter()
                .find(|(k, _)| *k == &after[..end])
                .map(|(_, v)| (end, *v))
        }) {
            Some((end, value)) => {
                out.push_str(value);
                rest = &after[end + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_template_replaces_every_occurrence() {
        let out = fill_template("{a} and {a} then {b}", &[("a", "x"), ("b", "y")]);
        assert_eq!(out, "x and x then y");
    }

    #[test]
    fn test_fill_template_leaves_unknown_placeholders() {
        let out = fill_template("{known} {unknown}", &[("known", "1")]);
        assert_eq!(out, "1 {unknown}");
    }

    #[test]
    fn test_fill_template_does_not_expand_inside_values() {
        let out = fill_template("{title} / {date}", &[("title", "About {date}"), ("date", "today")]);
        assert_eq!(out, "About {date} / today");
    }

    #[test]
    fn test_fill_template_keeps_json_braces() {
        let out = fill_template(r#"{"items": [{n}]}"#, &[("n", "4")]);
        assert_eq!(out, r#"{"items": [4]}"#);
    }
}
