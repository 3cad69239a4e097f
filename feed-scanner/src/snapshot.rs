use crate::affordance::Affordance;
use crate::page::HostPage;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use xbird_core::{PostId, ScanError};

/// A host page backed by a parsed HTML document.
///
/// Attached affordances are recorded alongside the document rather than spliced
/// into it, one per post.
#[derive(Debug)]
pub struct SnapshotPage {
    location: String,
    document: Html,
    affordances: Vec<Affordance>,
}

impl SnapshotPage {
    pub fn parse(location: impl Into<String>, html: &str) -> Self {
        Self {
            location: location.into(),
            document: Html::parse_document(html),
            affordances: Vec::new(),
        }
    }

    /// Client-side navigation: new location, new content, no affordances.
    pub fn navigate(&mut self, location: impl Into<String>, html: &str) {
        self.location = location.into();
        self.document = Html::parse_document(html);
        self.affordances.clear();
    }

    /// Content changed without a location change, e.g. the feed grew on scroll.
    pub fn replace_content(&mut self, html: &str) {
        self.document = Html::parse_document(html);
    }

    pub fn affordances(&self) -> &[Affordance] {
        &self.affordances
    }

    pub fn affordance(&self, post_id: &PostId) -> Option<&Affordance> {
        self.affordances.iter().find(|a| &a.post.id == post_id)
    }

    fn links_to(&self, post_id: &PostId) -> Result<bool, ScanError> {
        let links = parse_selector("a[href]")?;
        Ok(self
            .document
            .select(&links)
            .filter_map(|link| link.value().attr("href"))
            .any(|href| PostId::from_permalink(href).as_ref() == Some(post_id)))
    }
}

fn parse_selector(selector: &str) -> Result<Selector, ScanError> {
    Selector::parse(selector).map_err(|_| ScanError::InvalidSelector {
        selector: selector.to_string(),
    })
}

impl HostPage for SnapshotPage {
    type Element<'a> = ElementRef<'a>;

    fn location(&self) -> &str {
        &self.location
    }

    fn select_all(&self, selector: &str) -> Result<Vec<ElementRef<'_>>, ScanError> {
        let parsed = parse_selector(selector)?;
        Ok(self.document.select(&parsed).collect())
    }

    fn select_first_in<'a>(
        &'a self,
        scope: ElementRef<'a>,
        selector: &str,
    ) -> Result<Option<ElementRef<'a>>, ScanError> {
        let parsed = parse_selector(selector)?;
        Ok(scope.select(&parsed).next())
    }

    fn attribute<'a>(&'a self, element: ElementRef<'a>, name: &str) -> Option<String> {
        element.value().attr(name).map(str::to_string)
    }

    fn inner_text<'a>(&'a self, element: ElementRef<'a>) -> String {
        element
            .text()
            .map(str::trim)
            .filter(|chunk| !chunk.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn append_affordance(&mut self, affordance: Affordance) -> Result<(), ScanError> {
        if !self.links_to(&affordance.post.id)? {
            return Err(ScanError::AttachFailed {
                post_id: affordance.post.id.to_string(),
                reason: "post is no longer in the document".to_string(),
            });
        }
        debug!(
            "Attaching affordance to post {} ({})",
            affordance.post.id, affordance.title
        );
        match self
            .affordances
            .iter_mut()
            .find(|existing| existing.post.id == affordance.post.id)
        {
            Some(existing) => *existing = affordance,
            None => self.affordances.push(affordance),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"
        <main>
          <article data-testid="tweet">
            <div lang="en">First <b>post</b></div>
            <a href="/alice/status/111">2h</a>
          </article>
        </main>"#;

    #[test]
    fn test_queries_over_snapshot() {
        let page = SnapshotPage::parse("https://x.com/home", FEED);
        let articles = page.select_all("article").unwrap();
        assert_eq!(articles.len(), 1);

        let link = page
            .select_first_in(articles[0], r#"a[href*="/status/"]"#)
            .unwrap()
            .unwrap();
        assert_eq!(page.attribute(link, "href").as_deref(), Some("/alice/status/111"));
        assert_eq!(page.inner_text(articles[0]), "First\npost\n2h");
    }

    #[test]
    fn test_invalid_selector_is_reported() {
        let page = SnapshotPage::parse("https://x.com/home", FEED);
        assert!(matches!(
            page.select_all("[[broken"),
            Err(ScanError::InvalidSelector { .. })
        ));
    }

    #[test]
    fn test_attach_requires_post_in_document() {
        let mut page = SnapshotPage::parse("https://x.com/home", FEED);
        let post = xbird_core::Post {
            id: PostId::new("222"),
            text: "Gone".to_string(),
            metrics_label: None,
        };
        assert!(matches!(
            page.append_affordance(Affordance::new(post, 900)),
            Err(ScanError::AttachFailed { .. })
        ));
        assert!(page.affordances().is_empty());
    }

    #[test]
    fn test_navigation_drops_affordances() {
        let mut page = SnapshotPage::parse("https://x.com/home", FEED);
        let post = xbird_core::Post {
            id: PostId::new("111"),
            text: "First post".to_string(),
            metrics_label: None,
        };
        page.append_affordance(Affordance::new(post.clone(), 600)).unwrap();
        page.append_affordance(Affordance::new(post, 700)).unwrap();
        assert_eq!(page.affordances().len(), 1);
        assert_eq!(page.affordance(&PostId::new("111")).unwrap().view_count, 700);

        page.navigate("https://x.com/explore", "<main></main>");
        assert!(page.affordances().is_empty());
        assert_eq!(page.location(), "https://x.com/explore");
    }
}
