//! Projection of configuration values onto page trees.
//!
//! Each projector owns one concern (text and image fields, theme colors,
//! outbound links) and is idempotent: once a tree reflects the document,
//! re-projecting the same document writes nothing.

pub mod categories;
pub mod fields;
pub mod links;
pub mod theme;

pub use fields::FieldProjector;
pub use links::LinkProjector;
pub use theme::ThemeProjector;

use crate::config::ConfigDocument;
use crate::dom::PageTree;

/// Outcome of one projector pass over a tree.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProjectionReport {
    /// Elements the pass actually changed.
    pub writes: usize,
    /// Bindings whose selector matched nothing on this page.
    pub misses: usize,
    /// Bindings skipped because the configured value was empty or invalid.
    pub skips: usize,
}

impl ProjectionReport {
    pub fn absorb(&mut self, other: ProjectionReport) {
        self.writes += other.writes;
        self.misses += other.misses;
        self.skips += other.skips;
    }

    /// True if the pass changed the tree.
    pub fn changed(&self) -> bool {
        self.writes > 0
    }
}

/// A single projection concern.
pub trait Projector: Send + Sync {
    fn name(&self) -> &'static str;

    /// Projects the document onto the tree, returning what happened.
    /// Must tolerate any tree shape: a missing target is a miss, never
    /// an error.
    fn project(&self, config: &ConfigDocument, tree: &mut PageTree) -> ProjectionReport;
}
