use anyhow::Context;
use crawlkit_core::config::DomCompareConfig;
use crawlkit_core::{CrawlerContext, Eventable};
use crawlkit_plugin::{DomChangeNotifierPlugin, Plugin};
use regex::Regex;
use std::borrow::Cow;

/// DOM change strategy that ignores volatile fragments.
///
/// Both DOMs are normalized before comparing: every match of an ignore
/// pattern is removed, then runs of whitespace are collapsed to a single
/// space and the ends trimmed. The DOM changed when the normalized forms
/// differ.
///
/// ```yaml
/// plugins:
///   dom_compare:
///     ignore_patterns:
///       - '<span class="clock">[^<]*</span>'
///       - 'csrf_token=\w+'
///     collapse_whitespace: true
/// ```
#[derive(Debug, Clone)]
pub struct NormalizedDomComparator {
    ignore: Vec<Regex>,
    collapse_whitespace: bool,
}

impl NormalizedDomComparator {
    pub fn new<I, S>(ignore_patterns: I, collapse_whitespace: bool) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ignore = ignore_patterns
            .into_iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                Regex::new(pattern)
                    .with_context(|| format!("normalized-dom: invalid ignore pattern `{pattern}`"))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Self { ignore, collapse_whitespace })
    }

    pub fn from_config(config: &DomCompareConfig) -> anyhow::Result<Self> {
        Self::new(&config.ignore_patterns, config.collapse_whitespace)
    }

    pub fn normalize<'a>(&self, dom: &'a str) -> Cow<'a, str> {
        let mut dom = Cow::Borrowed(dom);
        for pattern in &self.ignore {
            let stripped = match pattern.replace_all(&dom, "") {
                Cow::Owned(stripped) => Some(stripped),
                Cow::Borrowed(_) => None,
            };
            if let Some(stripped) = stripped {
                dom = Cow::Owned(stripped);
            }
        }
        if self.collapse_whitespace {
            let collapsed = dom.split_whitespace().collect::<Vec<_>>().join(" ");
            if collapsed != dom.as_ref() {
                dom = Cow::Owned(collapsed);
            }
        }
        dom
    }
}

impl Plugin for NormalizedDomComparator {
    fn name(&self) -> &str {
        "normalized-dom"
    }

    fn as_dom_change_notifier(&self) -> Option<&dyn DomChangeNotifierPlugin> {
        Some(self)
    }
}

impl DomChangeNotifierPlugin for NormalizedDomComparator {
    fn is_dom_changed(
        &self,
        _context: &CrawlerContext,
        dom_before: &str,
        _event: &Eventable,
        dom_after: &str,
    ) -> anyhow::Result<bool> {
        Ok(self.normalize(dom_before) != self.normalize(dom_after))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crawlkit_core::{BrowserHandle, BrowserKind, EventType};

    fn changed(cmp: &NormalizedDomComparator, before: &str, after: &str) -> bool {
        let ctx = CrawlerContext::new(0, BrowserHandle::new(0, BrowserKind::ChromeHeadless));
        let event = Eventable::new(1, EventType::Click, "/html/body/button");
        cmp.is_dom_changed(&ctx, before, &event, after).unwrap()
    }

    #[test]
    fn identical_doms_are_unchanged() {
        let cmp = NormalizedDomComparator::new(Vec::<String>::new(), true).unwrap();
        assert!(!changed(&cmp, "<p>a</p>", "<p>a</p>"));
    }

    #[test]
    fn whitespace_only_differences_are_ignored() {
        let cmp = NormalizedDomComparator::new(Vec::<String>::new(), true).unwrap();
        assert!(!changed(&cmp, "<p>a</p>\n  <p>b</p>", "  <p>a</p> <p>b</p>"));
    }

    #[test]
    fn whitespace_counts_when_not_collapsing() {
        let cmp = NormalizedDomComparator::new(Vec::<String>::new(), false).unwrap();
        assert!(changed(&cmp, "<p>a</p>\n<p>b</p>", "<p>a</p> <p>b</p>"));
    }

    #[test]
    fn ignore_patterns_are_removed() {
        let cmp = NormalizedDomComparator::new([r#"<span class="clock">[^<]*</span>"#], true).unwrap();
        assert!(!changed(
            &cmp,
            r#"<div><span class="clock">12:00</span>menu</div>"#,
            r#"<div><span class="clock">12:01</span>menu</div>"#,
        ));
        assert!(changed(
            &cmp,
            r#"<div><span class="clock">12:00</span>menu</div>"#,
            r#"<div><span class="clock">12:00</span>cart</div>"#,
        ));
    }

    #[test]
    fn normalize_borrows_when_nothing_to_do() {
        let cmp = NormalizedDomComparator::new(["nomatch"], true).unwrap();
        assert!(matches!(cmp.normalize("<p>a</p>"), Cow::Borrowed(_)));
        assert_eq!(cmp.normalize("  <p> a</p> "), "<p> a</p>");
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let err = NormalizedDomComparator::new(["(unclosed"], true).unwrap_err();
        assert!(err.to_string().contains("(unclosed"));
    }

    #[test]
    fn from_config_uses_settings() {
        let cfg = DomCompareConfig {
            ignore_patterns: vec![r"id=\d+".into()],
            collapse_whitespace: false,
        };
        let cmp = NormalizedDomComparator::from_config(&cfg).unwrap();
        assert!(!changed(&cmp, "<a id=1>", "<a id=22>"));
    }
}
