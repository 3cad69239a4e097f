use crate::page::HostPage;
use scraper::Selector;
use xbird_core::ScanError;

/// Ordered fallback list of CSS selectors. The first entry with any match wins.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorChain {
    selectors: Vec<String>,
}

impl SelectorChain {
    pub fn new(selectors: Vec<String>) -> Result<Self, ScanError> {
        if selectors.is_empty() {
            return Err(ScanError::InvalidSelector {
                selector: "<empty chain>".to_string(),
            });
        }
        for selector in &selectors {
            if Selector::parse(selector).is_err() {
                return Err(ScanError::InvalidSelector {
                    selector: selector.clone(),
                });
            }
        }
        Ok(Self { selectors })
    }

    pub fn selectors(&self) -> &[String] {
        &self.selectors
    }

    pub fn select_all<'a, P: HostPage>(
        &self,
        page: &'a P,
    ) -> Result<Vec<P::Element<'a>>, ScanError> {
        for selector in &self.selectors {
            let matches = page.select_all(selector)?;
            if !matches.is_empty() {
                return Ok(matches);
            }
        }
        Ok(Vec::new())
    }

    pub fn first_within<'a, P: HostPage>(
        &self,
        page: &'a P,
        scope: P::Element<'a>,
    ) -> Result<Option<P::Element<'a>>, ScanError> {
        for selector in &self.selectors {
            if let Some(found) = page.select_first_in(scope, selector)? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_and_malformed_chains() {
        assert!(SelectorChain::new(Vec::new()).is_err());
        assert_eq!(
            SelectorChain::new(vec!["article".to_string(), "[[nope".to_string()]),
            Err(ScanError::InvalidSelector {
                selector: "[[nope".to_string()
            })
        );
        assert!(SelectorChain::new(vec![r#"a[href*="/status/"]"#.to_string()]).is_ok());
    }
}
