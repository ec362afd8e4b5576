//! Address bar input handling and fallback suggestions.

use serde::Serialize;

/// A named destination offered when a page cannot be loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub name: &'static str,
    pub url: &'static str,
}

pub const ALTERNATIVE_SEARCH_ENGINES: [Suggestion; 6] = [
    Suggestion { name: "DuckDuckGo", url: "https://duckduckgo.com" },
    Suggestion { name: "Bing", url: "https://www.bing.com" },
    Suggestion { name: "Yahoo", url: "https://search.yahoo.com" },
    Suggestion { name: "Baidu", url: "https://www.baidu.com" },
    Suggestion { name: "Yandex", url: "https://yandex.com" },
    Suggestion { name: "Ecosia", url: "https://www.ecosia.org" },
];

pub const POPULAR_SITES: [Suggestion; 6] = [
    Suggestion { name: "YouTube", url: "https://www.youtube.com" },
    Suggestion { name: "Wikipedia", url: "https://www.wikipedia.org" },
    Suggestion { name: "Reddit", url: "https://www.reddit.com" },
    Suggestion { name: "Twitter", url: "https://twitter.com" },
    Suggestion { name: "GitHub", url: "https://github.com" },
    Suggestion { name: "Stack Overflow", url: "https://stackoverflow.com" },
];

/// Turn address bar input into a URL.
///
/// Text without a dot, or with a space, is a search. Anything else is a
/// host or URL and gets `https://` when it has no http(s) scheme. Blank
/// input yields `None`.
pub fn resolve_input(input: &str, search_url: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if !input.contains('.') || input.contains(' ') {
        let query: String = url::form_urlencoded::byte_serialize(input.as_bytes()).collect();
        return Some(format!("{search_url}{query}"));
    }

    if input.starts_with("http://") || input.starts_with("https://") {
        Some(input.to_string())
    } else {
        Some(format!("https://{input}"))
    }
}

/// Three search engines followed by three popular sites.
pub fn suggestions() -> Vec<Suggestion> {
    ALTERNATIVE_SEARCH_ENGINES
        .iter()
        .take(3)
        .chain(POPULAR_SITES.iter().take(3))
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH: &str = "https://www.google.com/search?q=";

    #[test]
    fn free_text_becomes_search() {
        assert_eq!(
            resolve_input("rust borrow checker", SEARCH).as_deref(),
            Some("https://www.google.com/search?q=rust+borrow+checker")
        );
        assert_eq!(
            resolve_input("localhost", SEARCH).as_deref(),
            Some("https://www.google.com/search?q=localhost")
        );
    }

    #[test]
    fn dotted_text_with_space_is_a_search() {
        assert_eq!(
            resolve_input("what is example.com", SEARCH).as_deref(),
            Some("https://www.google.com/search?q=what+is+example.com")
        );
    }

    #[test]
    fn bare_host_gets_https() {
        assert_eq!(
            resolve_input("  example.com/path ", SEARCH).as_deref(),
            Some("https://example.com/path")
        );
    }

    #[test]
    fn explicit_scheme_is_kept() {
        assert_eq!(
            resolve_input("http://example.com", SEARCH).as_deref(),
            Some("http://example.com")
        );
    }

    #[test]
    fn blank_input_is_ignored() {
        assert_eq!(resolve_input("   ", SEARCH), None);
    }

    #[test]
    fn suggestions_mix_engines_and_sites() {
        let names: Vec<_> = suggestions().iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            ["DuckDuckGo", "Bing", "Yahoo", "YouTube", "Wikipedia", "Reddit"]
        );
    }
}
