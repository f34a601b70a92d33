//! Message template substitution for per-subscription custom templates.
//!
//! Templates are user-supplied strings with `{placeholder}` variables, e.g.
//! `"{author} uploaded {title} — {url}"`. Placeholders without a binding are
//! left verbatim so a typo is visible in the output instead of silently
//! vanishing.

use regex::Regex;
use std::sync::OnceLock;

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([a-zA-Z][a-zA-Z0-9_.]*)\}").expect("valid regex"))
}

/// Substitute `{name}` placeholders in `template` from `vars`.
#[must_use]
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    placeholder_re()
        .replace_all(template, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            vars.iter()
                .find(|(key, _)| *key == name)
                .map_or_else(|| caps[0].to_string(), |(_, value)| (*value).to_string())
        })
        .into_owned()
}
