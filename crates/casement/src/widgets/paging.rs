//! Paging strip: a clamped window of numbered page buttons plus
//! previous/next steppers.

use casement_core::Result;

use crate::callback::{CallbackDetail, CallbackRegistry, CallbackTable, SlotKind};
use crate::config::ConfigMap;
use crate::controller::{Controller, ControllerBase, Outcome};
use crate::dom::{Dom, ElementId, EventKind, InputEvent};
use crate::widgets::item;

/// Role class for paging strips.
pub const PAGING_CLASS: &str = "w-paging";

const PREV_CLASS: &str = "w-page-prev";
const NEXT_CLASS: &str = "w-page-next";
const PAGE_ATTR: &str = "w-page";

const KIND: &str = "Paging";

const SLOTS: &[(&str, SlotKind)] = &[
    ("delete", SlotKind::Notify),
    ("page_change", SlotKind::Notify),
];

/// The paging controller.
pub struct PagingController {
    base: ControllerBase,
    callbacks: CallbackTable,
    page_count: usize,
    current: usize,
    window: usize,
}

impl PagingController {
    /// Bind to `element`, or create a fresh `w-paging` element when `None`.
    pub fn new(dom: Dom, registry: &CallbackRegistry, element: Option<ElementId>) -> Result<Self> {
        let element = match element {
            Some(element) => element,
            None => {
                let element = dom.create_element("div");
                dom.with_mut(|doc| doc.add_class(element, PAGING_CLASS))?;
                element
            }
        };

        let base = ControllerBase::adopt(dom, element, KIND)?;
        let mut paging = Self {
            base,
            callbacks: CallbackTable::new(KIND, SLOTS),
            page_count: 0,
            current: 0,
            window: 5,
        };

        let config = paging
            .base
            .dom()
            .with_mut(|doc| ConfigMap::take_from(doc, element, crate::config::CONFIG_ATTR))?;
        config.wire_callbacks(registry, &mut paging.callbacks)?;
        if let Some(value) = config.get("pages")
            && let Ok(count) = value.parse()
        {
            paging.page_count = count;
        }
        if let Some(value) = config.get("window")
            && let Ok(window) = value.parse::<usize>()
        {
            paging.window = window.max(1);
        }
        paging.rebuild()?;
        Ok(paging)
    }

    /// The bound element.
    pub fn element(&self) -> ElementId {
        self.base.element()
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// The current page (zero-based).
    pub fn current_page(&self) -> usize {
        self.current
    }

    /// Set the number of pages; the current page is clamped.
    pub fn set_page_count(&mut self, count: usize) -> Result<()> {
        self.page_count = count;
        self.current = self.current.min(count.saturating_sub(1));
        self.rebuild()
    }

    /// Set the window size (maximum numbered buttons shown).
    pub fn set_window(&mut self, window: usize) -> Result<()> {
        self.window = window.max(1);
        self.rebuild()
    }

    /// Jump to a page. The target is clamped to the valid range; a change
    /// fires the `page_change` slot.
    pub fn set_current_page(&mut self, page: usize) -> Result<Vec<Outcome>> {
        if self.page_count == 0 {
            return Ok(Vec::new());
        }
        let page = page.min(self.page_count - 1);
        if page == self.current {
            return Ok(Vec::new());
        }
        self.current = page;
        self.rebuild()?;
        self.callbacks
            .notify("page_change", &self.base.args(CallbackDetail::Page { page }));
        Ok(vec![Outcome::PageChanged {
            element: self.base.element(),
            page,
        }])
    }

    /// Step back one page.
    pub fn prev_page(&mut self) -> Result<Vec<Outcome>> {
        self.set_current_page(self.current.saturating_sub(1))
    }

    /// Step forward one page.
    pub fn next_page(&mut self) -> Result<Vec<Outcome>> {
        self.set_current_page(self.current + 1)
    }

    /// The window of page numbers currently shown.
    pub fn visible_pages(&self) -> Vec<usize> {
        if self.page_count == 0 {
            return Vec::new();
        }
        let half = self.window / 2;
        let start = self
            .current
            .saturating_sub(half)
            .min(self.page_count.saturating_sub(self.window));
        let end = (start + self.window).min(self.page_count);
        (start..end).collect()
    }

    fn rebuild(&mut self) -> Result<()> {
        let element = self.base.element();
        let pages = self.visible_pages();
        let current = self.current;
        self.base.dom().with_mut(|doc| -> Result<()> {
            for child in doc.children(element)? {
                doc.remove(child)?;
            }

            let prev = doc.create_element("button");
            doc.add_class(prev, PREV_CLASS)?;
            doc.set_text(prev, "‹")?;
            doc.append_child(element, prev)?;

            for page in pages {
                let entry = doc.create_element("button");
                doc.set_attr(entry, PAGE_ATTR, &page.to_string())?;
                doc.set_text(entry, (page + 1).to_string())?;
                if page == current {
                    doc.add_class(entry, item::SELECT_CLASS)?;
                }
                doc.append_child(element, entry)?;
            }

            let next = doc.create_element("button");
            doc.add_class(next, NEXT_CLASS)?;
            doc.set_text(next, "›")?;
            doc.append_child(element, next)?;
            Ok(())
        })
    }

    fn press(&mut self, target: ElementId) -> Vec<Outcome> {
        let element = self.base.element();
        let dom = self.base.dom().clone();

        enum Hit {
            Prev,
            Next,
            Page(usize),
        }

        let hit = dom.with(|doc| -> Result<Option<Hit>> {
            let Some(button) = doc.nearest_ancestor(target, |e| {
                e.has_class(PREV_CLASS) || e.has_class(NEXT_CLASS) || e.has_attr(PAGE_ATTR)
            })?
            else {
                return Ok(None);
            };
            if !doc.contains(element, button)? {
                return Ok(None);
            }
            if doc.has_class(button, PREV_CLASS)? {
                Ok(Some(Hit::Prev))
            } else if doc.has_class(button, NEXT_CLASS)? {
                Ok(Some(Hit::Next))
            } else {
                Ok(doc
                    .attr(button, PAGE_ATTR)?
                    .and_then(|v| v.parse().ok())
                    .map(Hit::Page))
            }
        });

        let result = match hit {
            Ok(Some(Hit::Prev)) => self.prev_page(),
            Ok(Some(Hit::Next)) => self.next_page(),
            Ok(Some(Hit::Page(page))) => self.set_current_page(page),
            _ => Ok(Vec::new()),
        };
        result.unwrap_or_default()
    }
}

impl Controller for PagingController {
    fn base(&self) -> &ControllerBase {
        &self.base
    }

    fn callbacks(&self) -> &CallbackTable {
        &self.callbacks
    }

    fn callbacks_mut(&mut self) -> &mut CallbackTable {
        &mut self.callbacks
    }

    fn handle_event(&mut self, event: &InputEvent) -> Vec<Outcome> {
        match event.kind {
            EventKind::PointerDown | EventKind::Click => self.press(event.target),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(pages: usize) -> (Dom, PagingController) {
        let dom = Dom::new();
        let registry = CallbackRegistry::new();
        let mut paging = PagingController::new(dom.clone(), &registry, None).unwrap();
        dom.append_child(dom.root(), paging.element()).unwrap();
        paging.set_page_count(pages).unwrap();
        (dom, paging)
    }

    #[test]
    fn navigation_clamps_to_range() {
        let (_, mut paging) = fixture(3);
        assert_eq!(paging.current_page(), 0);

        paging.prev_page().unwrap();
        assert_eq!(paging.current_page(), 0);

        paging.set_current_page(99).unwrap();
        assert_eq!(paging.current_page(), 2);

        paging.next_page().unwrap();
        assert_eq!(paging.current_page(), 2);
    }

    #[test]
    fn page_change_fires_only_on_change() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let (_, mut paging) = fixture(5);
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        paging
            .callbacks_mut()
            .set("page_change", crate::callback::Handler::notify(move |_| {
                h.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();

        paging.set_current_page(2).unwrap();
        paging.set_current_page(2).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn window_slides_around_the_current_page() {
        let (_, mut paging) = fixture(10);
        paging.set_window(3).unwrap();

        paging.set_current_page(0).unwrap_or_default();
        assert_eq!(paging.visible_pages(), vec![0, 1, 2]);

        paging.set_current_page(5).unwrap();
        assert_eq!(paging.visible_pages(), vec![4, 5, 6]);

        paging.set_current_page(9).unwrap();
        assert_eq!(paging.visible_pages(), vec![7, 8, 9]);
    }

    #[test]
    fn pressing_buttons_navigates() {
        let (dom, mut paging) = fixture(4);
        let element = paging.element();

        // Find the "next" button and press it twice.
        for _ in 0..2 {
            let next = dom.with(|doc| {
                doc.children(element)
                    .unwrap()
                    .into_iter()
                    .find(|&c| doc.has_class(c, NEXT_CLASS).unwrap())
                    .unwrap()
            });
            let outcomes = paging.handle_event(&InputEvent::new(next, EventKind::Click));
            assert_eq!(outcomes.len(), 1);
        }
        assert_eq!(paging.current_page(), 2);

        // Press a numbered button.
        let first = dom.with(|doc| {
            doc.children(element)
                .unwrap()
                .into_iter()
                .find(|&c| doc.attr(c, PAGE_ATTR).unwrap().as_deref() == Some("0"))
                .unwrap()
        });
        paging.handle_event(&InputEvent::new(first, EventKind::Click));
        assert_eq!(paging.current_page(), 0);
    }
}
