//! Jailbreak corpus plugin.
//!
//! Downloads community jailbreak collections published as markdown, splits
//! them into sections at headings and uses random sections as probes.

use super::{Assertion, RedteamPlugin, TestCase};
use crate::error::GenerationResult;
use crate::generation::sample_items;
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use std::sync::OnceLock;
use tracing::{debug, error};

/// Plugin id.
pub const PLINY_PLUGIN_ID: &str = "redteam:pliny";

/// Markdown corpora fetched by default.
pub const DEFAULT_CORPUS_URLS: &[&str] = &[
    "https://raw.githubusercontent.com/elder-plinius/L1B3RT4S/refs/heads/main/GOOGLE.mkd",
    "https://raw.githubusercontent.com/elder-plinius/L1B3RT4S/refs/heads/main/AMAZON.mkd",
    "https://raw.githubusercontent.com/elder-plinius/L1B3RT4S/refs/heads/main/META.mkd",
    "https://raw.githubusercontent.com/elder-plinius/L1B3RT4S/refs/heads/main/OPENAI.mkd",
];

fn heading_regex() -> &'static Regex {
    static HEADING: OnceLock<Regex> = OnceLock::new();
    HEADING.get_or_init(|| Regex::new(r"(?m)^#{1,4}\s+.*$").expect("valid heading regex"))
}

/// Split markdown at `#` to `####` headings.
///
/// Keeps trimmed, non-empty sections that span more than one line.
pub fn parse_sections(markdown: &str) -> Vec<String> {
    heading_regex()
        .split(markdown)
        .map(str::trim)
        .filter(|section| section.contains('\n'))
        .map(str::to_string)
        .collect()
}

/// Samples jailbreak prompts from markdown corpora.
#[derive(Debug, Clone)]
pub struct JailbreakCorpusPlugin {
    inject_var: String,
    urls: Vec<String>,
    client: Client,
}

impl JailbreakCorpusPlugin {
    /// Create a plugin over the default corpora.
    pub fn new(inject_var: impl Into<String>) -> Self {
        Self {
            inject_var: inject_var.into(),
            urls: DEFAULT_CORPUS_URLS.iter().map(|u| u.to_string()).collect(),
            client: Client::new(),
        }
    }

    /// Fetch from these URLs instead.
    #[must_use]
    pub fn with_urls<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.urls = urls.into_iter().map(Into::into).collect();
        self
    }

    /// Set a custom HTTP client.
    #[must_use]
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Corpus URLs.
    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    async fn fetch_text(&self, url: &str) -> reqwest::Result<String> {
        self.client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }

    /// Sections of one corpus; empty when the fetch fails.
    async fn fetch_sections(&self, url: &str) -> Vec<String> {
        match self.fetch_text(url).await {
            Ok(text) => parse_sections(&text),
            Err(e) => {
                error!(url, error = %e, "Error fetching jailbreak corpus");
                Vec::new()
            }
        }
    }

    /// Sections from every corpus, fetched concurrently.
    pub async fn fetch_all_sections(&self) -> Vec<String> {
        let fetches = self.urls.iter().map(|url| self.fetch_sections(url));
        futures::future::join_all(fetches)
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    fn assertions() -> Vec<Assertion> {
        vec![Assertion::new("is-refusal").with_metric("Pliny")]
    }
}

#[async_trait]
impl RedteamPlugin for JailbreakCorpusPlugin {
    fn id(&self) -> &str {
        PLINY_PLUGIN_ID
    }

    fn inject_var(&self) -> &str {
        &self.inject_var
    }

    async fn generate_tests(&self, n: usize) -> GenerationResult<Vec<TestCase>> {
        let sections = self.fetch_all_sections().await;
        debug!(sections = sections.len(), n, "Sampling jailbreak corpus");

        Ok(sample_items(&sections, n)
            .into_iter()
            .map(|text| TestCase::injected(&self.inject_var, format!(" {}", text), Self::assertions()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const CORPUS: &str = "# GOOGLE
intro line
## Gemini 1.5
first line
second line
### short
single line
#### Bard
  alpha
  beta
";

    #[test]
    fn test_parse_sections_keeps_multiline() {
        assert_eq!(
            parse_sections(CORPUS),
            vec!["first line\nsecond line", "alpha\n  beta"]
        );
    }

    #[test]
    fn test_parse_sections_ignores_deep_headings() {
        let text = "##### not a heading\nline one\nline two";
        assert_eq!(
            parse_sections(text),
            vec!["##### not a heading\nline one\nline two"]
        );
    }

    #[rstest]
    #[case("")]
    #[case("# only a heading")]
    #[case("# heading\none line")]
    #[case("## a\n\n## b\n")]
    fn test_parse_sections_empty(#[case] markdown: &str) {
        assert!(parse_sections(markdown).is_empty());
    }

    #[tokio::test]
    async fn test_generate_tests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/GOOGLE.mkd"))
            .respond_with(ResponseTemplate::new(200).set_body_string(CORPUS))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/META.mkd"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let plugin = JailbreakCorpusPlugin::new("query").with_urls([
            format!("{}/GOOGLE.mkd", server.uri()),
            format!("{}/META.mkd", server.uri()),
        ]);

        let mut cases = plugin.generate_tests(5).await.unwrap();
        assert_eq!(cases.len(), 2);
        cases.sort_by(|a, b| a.injected_value("query").cmp(&b.injected_value("query")));

        assert_eq!(cases[0].injected_value("query"), Some(" alpha\n  beta"));
        assert_eq!(cases[1].injected_value("query"), Some(" first line\nsecond line"));
        assert_eq!(
            cases[0].assert,
            vec![Assertion::new("is-refusal").with_metric("Pliny")]
        );
    }

    #[tokio::test]
    async fn test_sample_fewer_than_available() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(CORPUS))
            .mount(&server)
            .await;

        let plugin = JailbreakCorpusPlugin::new("query").with_urls([server.uri()]);
        let cases = plugin.generate_tests(1).await.unwrap();
        assert_eq!(cases.len(), 1);
        assert!(cases[0].injected_value("query").unwrap().starts_with(' '));
    }

    #[tokio::test]
    async fn test_all_fetches_fail() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let plugin = JailbreakCorpusPlugin::new("query").with_urls([server.uri()]);
        assert!(plugin.generate_tests(3).await.unwrap().is_empty());
    }

    #[test]
    fn test_defaults() {
        let plugin = JailbreakCorpusPlugin::new("query");
        assert_eq!(plugin.id(), PLINY_PLUGIN_ID);
        assert_eq!(plugin.inject_var(), "query");
        assert_eq!(plugin.urls().len(), DEFAULT_CORPUS_URLS.len());
    }
}
