use crate::affordance::Affordance;
use xbird_core::ScanError;

/// Read access to the host document plus the one write the scanner performs.
///
/// Element handles borrow the page, so a scan pass gathers owned candidates first
/// and only then calls [`HostPage::append_affordance`].
pub trait HostPage {
    type Element<'a>: Copy
    where
        Self: 'a;

    /// Current location of the page, used to detect client-side navigation.
    fn location(&self) -> &str;

    /// All elements matching `selector`, in document order.
    fn select_all(&self, selector: &str) -> Result<Vec<Self::Element<'_>>, ScanError>;

    /// First descendant of `scope` matching `selector`.
    fn select_first_in<'a>(
        &'a self,
        scope: Self::Element<'a>,
        selector: &str,
    ) -> Result<Option<Self::Element<'a>>, ScanError>;

    fn attribute<'a>(&'a self, element: Self::Element<'a>, name: &str) -> Option<String>;

    fn inner_text<'a>(&'a self, element: Self::Element<'a>) -> String;

    fn append_affordance(&mut self, affordance: Affordance) -> Result<(), ScanError>;
}
