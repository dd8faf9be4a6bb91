//! Minimal RFC 8288 `Link` header parsing.
//!
//! Memento responses describe themselves through links such as
//! `<http://example.com/>; rel="original"`. Only the target and the parameters are
//! extracted; no URI resolution is performed.

#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub url: String,
    /// Parameters in header order, names lowercased, values unquoted
    pub params: Vec<(String, String)>,
}

impl Link {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// `rel` may hold several space-separated relation types (`rel="first memento"`).
    pub fn has_rel(&self, rel: &str) -> bool {
        self.param("rel")
            .map(|value| value.split_whitespace().any(|r| r.eq_ignore_ascii_case(rel)))
            .unwrap_or(false)
    }
}

pub fn parse_link_header(value: &str) -> Vec<Link> {
    let mut links = Vec::new();
    let mut rest = value;

    while let Some(open) = rest.find('<') {
        let after_open = &rest[open + 1..];
        let Some(close) = after_open.find('>') else {
            break;
        };
        let url = after_open[..close].trim().to_string();

        let (params_text, remainder) = split_params(&after_open[close + 1..]);
        links.push(Link {
            url,
            params: parse_params(params_text),
        });
        rest = remainder;
    }

    links
}

/// Splits off the parameter section of one link, up to the next top-level `,`.
fn split_params(text: &str) -> (&str, &str) {
    let mut in_quotes = false;
    for (i, c) in text.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => return (&text[..i], &text[i + 1..]),
            _ => {}
        }
    }
    (text, "")
}

fn parse_params(text: &str) -> Vec<(String, String)> {
    text.split(';')
        .filter_map(|part| {
            let part = part.trim();
            if part.is_empty() {
                return None;
            }
            let (name, value) = match part.split_once('=') {
                Some((name, value)) => (name, value.trim().trim_matches('"')),
                None => (part, ""),
            };
            Some((name.trim().to_ascii_lowercase(), value.to_string()))
        })
        .collect()
}
