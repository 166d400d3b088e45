#![forbid(unsafe_code)]

//! Screen-reader live region.

use sitekit_core::dom::Dom;

/// Element id of the live region.
pub const ANNOUNCER_ID: &str = "sr-announcer";

/// A polite, atomic live region appended to `<body>`.
///
/// Replacing its text makes assistive technology read the new message.
#[derive(Debug, Clone, PartialEq)]
pub struct Announcer<N> {
    region: N,
}

impl<N: Clone> Announcer<N> {
    /// Create the live region, or adopt one already in the page.
    pub fn install<D: Dom<Node = N>>(dom: &mut D) -> Option<Self> {
        if let Some(region) = dom.query(&format!("#{ANNOUNCER_ID}")) {
            return Some(Self { region });
        }
        let region = dom.create_element("div")?;
        dom.set_attr(&region, "id", ANNOUNCER_ID);
        dom.set_attr(&region, "aria-live", "polite");
        dom.set_attr(&region, "aria-atomic", "true");
        dom.add_class(&region, "sr-only");
        let body = dom.body();
        dom.append_child(&body, &region);
        Some(Self { region })
    }

    #[must_use]
    pub fn region(&self) -> &N {
        &self.region
    }

    pub fn announce<D: Dom<Node = N>>(&self, dom: &mut D, message: &str) {
        tracing::debug!(message, "announce");
        dom.set_text(&self.region, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitekit_core::dom::memory::MemoryDom;

    #[test]
    fn install_creates_polite_atomic_region() {
        let mut dom = MemoryDom::new();
        let announcer = Announcer::install(&mut dom).expect("region");
        let region = announcer.region();
        assert_eq!(dom.attr(region, "id").as_deref(), Some(ANNOUNCER_ID));
        assert_eq!(dom.attr(region, "aria-live").as_deref(), Some("polite"));
        assert_eq!(dom.attr(region, "aria-atomic").as_deref(), Some("true"));
        assert!(dom.has_class(region, "sr-only"));
        assert!(dom.is_attached(*region));
    }

    #[test]
    fn install_twice_reuses_region() {
        let mut dom = MemoryDom::new();
        let first = Announcer::install(&mut dom).expect("region");
        let second = Announcer::install(&mut dom).expect("region");
        assert_eq!(first, second);
        assert_eq!(dom.query_all("#sr-announcer").len(), 1);
    }

    #[test]
    fn announce_replaces_text() {
        let mut dom = MemoryDom::new();
        let announcer = Announcer::install(&mut dom).expect("region");
        announcer.announce(&mut dom, "Menu opened");
        announcer.announce(&mut dom, "Menu closed");
        assert_eq!(dom.text(announcer.region()), "Menu closed");
    }
}
