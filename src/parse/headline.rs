use std::sync::OnceLock;

use regex::Regex;

use crate::model::config::KeywordSet;

/// Trailing tag block: one or more `:tag` groups closed by a final colon.
fn tag_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?::[A-Za-z0-9_@#%]+)+:$").unwrap())
}

/// Number of leading stars if `line` is a heading, `None` otherwise.
///
/// A star run must be followed by at least one space; a bare run or one
/// glued to text is body content (emphasis markers, horizontal rules),
/// not a heading.
pub fn heading_level(line: &str) -> Option<usize> {
    let stars = line.bytes().take_while(|&b| b == b'*').count();
    if stars > 0 && line[stars..].starts_with(' ') {
        Some(stars)
    } else {
        None
    }
}

/// Split a heading line into state keyword, title, and tags.
///
/// The first whitespace-delimited token after the stars is a state keyword
/// iff it belongs to the configured closed set; the trailing `:a:b:` group
/// is the tag block; the title is everything between.
pub fn parse_headline(
    line: &str,
    level: usize,
    keywords: &KeywordSet,
) -> (Option<String>, String, Vec<String>) {
    let rest = line[level..].trim();

    let (state, after_state) = match rest.split_once(char::is_whitespace) {
        Some((first, tail)) if keywords.contains(first) => {
            (Some(first.to_string()), tail.trim_start())
        }
        None if keywords.contains(rest) => (Some(rest.to_string()), ""),
        _ => (None, rest),
    };

    let (title, tags) = split_tags(after_state);
    (state, title.to_string(), tags)
}

/// Split trailing tags off a headline remainder.
fn split_tags(rest: &str) -> (&str, Vec<String>) {
    let trimmed = rest.trim_end();
    if let Some(m) = tag_block_re().find(trimmed) {
        let before = &trimmed[..m.start()];
        // The block must stand alone or be separated from the title;
        // a title that merely ends in a colon-word is not tagged.
        if before.is_empty() || before.ends_with(char::is_whitespace) {
            let tags = m
                .as_str()
                .trim_matches(':')
                .split(':')
                .map(str::to_string)
                .collect();
            return (before.trim_end(), tags);
        }
    }
    (trimmed, Vec::new())
}

/// Compose a heading line from its parts. The inverse of [`parse_headline`].
pub fn compose_headline(
    level: usize,
    state: Option<&str>,
    title: &str,
    tags: &[String],
) -> String {
    let mut parts: Vec<String> = vec!["*".repeat(level)];
    if let Some(s) = state {
        parts.push(s.to_string());
    }
    if !title.is_empty() {
        parts.push(title.to_string());
    }
    if !tags.is_empty() {
        parts.push(format!(":{}:", tags.join(":")));
    }
    let mut line = parts.join(" ");
    if parts.len() == 1 {
        // Keep the trailing space so the line stays a heading
        line.push(' ');
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kw() -> KeywordSet {
        KeywordSet::default()
    }

    #[test]
    fn test_heading_level() {
        assert_eq!(heading_level("* Top"), Some(1));
        assert_eq!(heading_level("*** Deep"), Some(3));
        assert_eq!(heading_level("* "), Some(1));
        assert_eq!(heading_level("*bold* text"), None);
        assert_eq!(heading_level("**emphasis**"), None);
        assert_eq!(heading_level("plain text"), None);
        assert_eq!(heading_level(""), None);
    }

    #[test]
    fn test_parse_plain_headline() {
        let (state, title, tags) = parse_headline("* Buy milk", 1, &kw());
        assert_eq!(state, None);
        assert_eq!(title, "Buy milk");
        assert!(tags.is_empty());
    }

    #[test]
    fn test_parse_headline_with_state_and_tags() {
        let (state, title, tags) =
            parse_headline("** NEXT Call the plumber :home:phone:", 2, &kw());
        assert_eq!(state.as_deref(), Some("NEXT"));
        assert_eq!(title, "Call the plumber");
        assert_eq!(tags, vec!["home", "phone"]);
    }

    #[test]
    fn test_unknown_keyword_is_title() {
        let (state, title, _) = parse_headline("* URGENT Call back", 1, &kw());
        assert_eq!(state, None);
        assert_eq!(title, "URGENT Call back");
    }

    #[test]
    fn test_state_only_headline() {
        let (state, title, tags) = parse_headline("* TODO", 1, &kw());
        assert_eq!(state.as_deref(), Some("TODO"));
        assert!(title.is_empty());
        assert!(tags.is_empty());
    }

    #[test]
    fn test_tags_only_headline() {
        let (state, title, tags) = parse_headline("* :misc:", 1, &kw());
        assert_eq!(state, None);
        assert!(title.is_empty());
        assert_eq!(tags, vec!["misc"]);
    }

    #[test]
    fn test_colon_word_in_title_is_not_a_tag() {
        let (_, title, tags) = parse_headline("* Read chapter:one:", 1, &kw());
        assert_eq!(title, "Read chapter:one:");
        assert!(tags.is_empty());
    }

    #[test]
    fn test_compose_round_trip() {
        let cases: Vec<(usize, Option<&str>, &str, Vec<String>)> = vec![
            (1, None, "Buy milk", vec![]),
            (2, Some("NEXT"), "Call the plumber", vec!["home".into(), "phone".into()]),
            (3, Some("DONE"), "", vec![]),
            (1, None, "", vec!["misc".into()]),
        ];
        for (level, state, title, tags) in cases {
            let line = compose_headline(level, state, title, &tags);
            assert_eq!(heading_level(&line), Some(level));
            let (s, t, tg) = parse_headline(&line, level, &kw());
            assert_eq!(s.as_deref(), state);
            assert_eq!(t, title);
            assert_eq!(tg, tags);
        }
    }

    #[test]
    fn test_compose_empty_headline_stays_a_heading() {
        let line = compose_headline(1, None, "", &[]);
        assert_eq!(line, "* ");
        assert_eq!(heading_level(&line), Some(1));
    }
}
