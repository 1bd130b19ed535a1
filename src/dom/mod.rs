//! In-memory page element tree.
//!
//! Pages are modeled as an owned tree of [`Element`] values held by a
//! [`PageTree`]. Projections mutate the tree through change-detecting
//! setters: a write that does not alter the element reports `false` and
//! leaves the tree's revision untouched, so converged projections settle
//! instead of re-triggering observers.

pub mod selector;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

pub use selector::{SelectorList, SelectorParseError};

/// An inline style declaration value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleValue {
    pub value: String,
    #[serde(default)]
    pub important: bool,
}

/// One node of the page tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub styles: BTreeMap<String, StyleValue>,
    /// Overrides the `href` attribute as the navigation target when the
    /// element is activated. Survives later `href` rewrites.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activation_target: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Element>,
}

/// Where activation of an element navigates, and whether an explicit
/// override (rather than the `href` attribute) supplied the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    pub target: String,
    pub overridden: bool,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            id: None,
            classes: Vec::new(),
            attrs: BTreeMap::new(),
            text: String::new(),
            styles: BTreeMap::new(),
            activation_target: None,
            children: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_children(mut self, children: Vec<Element>) -> Self {
        self.children = children;
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Sets an attribute. Returns true if the stored value changed.
    pub fn set_attr(&mut self, name: &str, value: &str) -> bool {
        if self.attrs.get(name).map(String::as_str) == Some(value) {
            return false;
        }
        self.attrs.insert(name.to_string(), value.to_string());
        true
    }

    /// Removes an attribute. Returns true if it was present.
    pub fn remove_attr(&mut self, name: &str) -> bool {
        self.attrs.remove(name).is_some()
    }

    /// Sets the text content. Returns true if it changed.
    pub fn set_text(&mut self, text: &str) -> bool {
        if self.text == text {
            return false;
        }
        self.text = text.to_string();
        true
    }

    /// Sets an inline style declaration. Returns true if it changed.
    pub fn set_style(&mut self, property: &str, value: &str, important: bool) -> bool {
        let next = StyleValue {
            value: value.to_string(),
            important,
        };
        if self.styles.get(property) == Some(&next) {
            return false;
        }
        self.styles.insert(property.to_string(), next);
        true
    }

    /// Pins the activation target, decoupling navigation from `href`.
    /// Returns true if it changed.
    pub fn set_activation_target(&mut self, target: &str) -> bool {
        if self.activation_target.as_deref() == Some(target) {
            return false;
        }
        self.activation_target = Some(target.to_string());
        true
    }

    /// Replaces all children. Returns true if the new set differs.
    pub fn set_children(&mut self, children: Vec<Element>) -> bool {
        if self.children == children {
            return false;
        }
        self.children = children;
        true
    }

    /// Resolves where activating this element navigates: the pinned
    /// activation target when present, otherwise the `href` attribute.
    pub fn activation(&self) -> Option<Activation> {
        if let Some(target) = &self.activation_target {
            return Some(Activation {
                target: target.clone(),
                overridden: true,
            });
        }
        self.attr("href").map(|href| Activation {
            target: href.to_string(),
            overridden: false,
        })
    }
}

/// An owned page tree with a monotonic revision counter.
///
/// Every mutation that actually changes an element bumps the revision
/// exactly once and notifies watchers; no-op writes are invisible.
pub struct PageTree {
    root: Element,
    revision: u64,
    revision_tx: watch::Sender<u64>,
}

impl PageTree {
    pub fn new(root: Element) -> Self {
        let (revision_tx, _) = watch::channel(0);
        Self {
            root,
            revision: 0,
            revision_tx,
        }
    }

    /// Parses a tree from its JSON element representation.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    /// Serializes the current root element as pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.root)
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Subscribes to revision bumps. The receiver observes the revision
    /// value current at each change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision_tx.subscribe()
    }

    fn bump(&mut self) {
        self.revision += 1;
        let _ = self.revision_tx.send(self.revision);
    }

    /// Collects references to all elements matching the selector list,
    /// in document order.
    pub fn query(&self, selectors: &SelectorList) -> Vec<&Element> {
        let mut hits = Vec::new();
        let initial: Vec<Vec<usize>> = selectors.max_prefix().iter().map(|_| vec![0]).collect();
        collect(&self.root, selectors, &initial, &mut hits);
        hits
    }

    /// Applies `f` to every matching element. Returns how many elements
    /// `f` reported as changed; bumps the revision once if any did.
    pub fn mutate(
        &mut self,
        selectors: &SelectorList,
        mut f: impl FnMut(&mut Element) -> bool,
    ) -> usize {
        let initial: Vec<Vec<usize>> = selectors.max_prefix().iter().map(|_| vec![0]).collect();
        let changed = apply(&mut self.root, selectors, &initial, &mut f);
        if changed > 0 {
            self.bump();
        }
        changed
    }

    /// Applies `f` to the first matching element only. Returns whether
    /// `f` reported a change.
    pub fn mutate_first(
        &mut self,
        selectors: &SelectorList,
        f: impl FnOnce(&mut Element) -> bool,
    ) -> bool {
        let mut f = Some(f);
        let changed = self.mutate(selectors, |element| match f.take() {
            Some(f) => f(element),
            None => false,
        });
        changed > 0
    }

    /// Mutates the root element directly.
    pub fn update_root(&mut self, f: impl FnOnce(&mut Element) -> bool) -> bool {
        if f(&mut self.root) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Replaces the text of the style element with the given id, creating
    /// it under `head` if absent. The element is never duplicated.
    /// Returns whether the tree changed.
    pub fn upsert_style_element(&mut self, id: &str, css: &str) -> bool {
        if let Some(existing) = find_by_id_mut(&mut self.root, id) {
            let changed = existing.set_text(css);
            if changed {
                self.bump();
            }
            return changed;
        }

        let style = Element::new("style").with_id(id).with_text(css);
        let appended = match find_by_tag_mut(&mut self.root, "head") {
            Some(head) => {
                head.children.push(style);
                true
            }
            None => {
                // Headless fixture trees still need somewhere to hold it.
                self.root.children.push(style);
                true
            }
        };
        if appended {
            self.bump();
        }
        appended
    }
}

fn collect<'a>(
    element: &'a Element,
    selectors: &SelectorList,
    active: &[Vec<usize>],
    hits: &mut Vec<&'a Element>,
) {
    let (next, hit) = selectors.advance(element, active);
    if hit {
        hits.push(element);
    }
    for child in &element.children {
        collect(child, selectors, &next, hits);
    }
}

fn apply(
    element: &mut Element,
    selectors: &SelectorList,
    active: &[Vec<usize>],
    f: &mut impl FnMut(&mut Element) -> bool,
) -> usize {
    let (next, hit) = selectors.advance(element, active);
    let mut changed = 0;
    if hit && f(element) {
        changed += 1;
    }
    for child in &mut element.children {
        changed += apply(child, selectors, &next, f);
    }
    changed
}

fn find_by_id_mut<'a>(element: &'a mut Element, id: &str) -> Option<&'a mut Element> {
    if element.id.as_deref() == Some(id) {
        return Some(element);
    }
    for child in &mut element.children {
        if let Some(found) = find_by_id_mut(child, id) {
            return Some(found);
        }
    }
    None
}

fn find_by_tag_mut<'a>(element: &'a mut Element, tag: &str) -> Option<&'a mut Element> {
    if element.tag.eq_ignore_ascii_case(tag) {
        return Some(element);
    }
    for child in &mut element.children {
        if let Some(found) = find_by_tag_mut(child, tag) {
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> PageTree {
        PageTree::new(Element::new("html").with_children(vec![
            Element::new("head").with_children(vec![Element::new("title").with_text("Inicio")]),
            Element::new("body").with_children(vec![
                Element::new("h1").with_id("heroTitle").with_text("Arte"),
                Element::new("a").with_id("ctaWhatsappBtn").with_attr("href", "#"),
            ]),
        ]))
    }

    #[test]
    fn noop_writes_do_not_bump_revision() {
        let mut tree = tree();
        let list = SelectorList::parse("#heroTitle").expect("parse failed");

        assert_eq!(tree.mutate(&list, |el| el.set_text("Arte")), 0);
        assert_eq!(tree.revision(), 0);

        assert_eq!(tree.mutate(&list, |el| el.set_text("Tinta")), 1);
        assert_eq!(tree.revision(), 1);

        // Re-applying the same write converges.
        assert_eq!(tree.mutate(&list, |el| el.set_text("Tinta")), 0);
        assert_eq!(tree.revision(), 1);
    }

    #[test]
    fn revision_watchers_observe_changes() {
        let mut tree = tree();
        let mut rx = tree.subscribe();
        let list = SelectorList::parse("title").expect("parse failed");

        tree.mutate(&list, |el| el.set_text("Nuevo"));

        assert!(rx.has_changed().expect("sender dropped"));
        assert_eq!(*rx.borrow_and_update(), 1);
    }

    #[test]
    fn match_stops_at_the_matched_element() {
        let mut tree = PageTree::new(Element::new("html").with_children(vec![Element::new(
            "div",
        )
        .with_id("categoriesGrid")
        .with_children(vec![Element::new("p").with_text("viejo")])]));
        let list = SelectorList::parse("#categoriesGrid").expect("parse failed");

        // The grid's children are not matches themselves.
        assert_eq!(tree.query(&list).len(), 1);

        // A child-inserting mutator must run once, on the grid only, and
        // terminate even though it keeps growing the subtree it matched.
        let writes = tree.mutate(&list, |el| {
            el.set_children(vec![Element::new("article").with_class("category-card")])
        });
        assert_eq!(writes, 1);

        let grid = &tree.root().children[0];
        assert_eq!(grid.children.len(), 1);
        assert_eq!(grid.children[0].tag, "article");
        assert!(grid.children[0].children.is_empty());
    }

    #[test]
    fn style_element_is_replaced_not_accumulated() {
        let mut tree = tree();

        assert!(tree.upsert_style_element("force-theme-styles", "a { color: red; }"));
        assert!(tree.upsert_style_element("force-theme-styles", "a { color: blue; }"));

        let list = SelectorList::parse("#force-theme-styles").expect("parse failed");
        let hits = tree.query(&list);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text, "a { color: blue; }");

        // Identical text is a no-op.
        let before = tree.revision();
        assert!(!tree.upsert_style_element("force-theme-styles", "a { color: blue; }"));
        assert_eq!(tree.revision(), before);
    }

    #[test]
    fn activation_prefers_pinned_target_over_href() {
        let mut el = Element::new("a").with_attr("href", "#");
        assert_eq!(
            el.activation(),
            Some(Activation {
                target: "#".to_string(),
                overridden: false
            })
        );

        el.set_activation_target("https://wa.me/34600000000");
        el.set_attr("href", "#stale");

        let activation = el.activation().expect("no activation");
        assert_eq!(activation.target, "https://wa.me/34600000000");
        assert!(activation.overridden);
    }

    #[test]
    fn tree_round_trips_through_json() {
        let tree = tree();
        let json = tree.to_json().expect("serialize failed");
        let parsed = PageTree::from_json(&json).expect("parse failed");

        assert_eq!(parsed.root(), tree.root());
    }
}
