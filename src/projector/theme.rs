//! Theme color projection.
//!
//! Colors are applied in three layers of increasing precedence: root CSS
//! variables, a managed stylesheet element, and forced inline declarations.
//! The layers are written in ascending order so the strongest one always
//! lands last; the stylesheet element is replaced in place, never
//! accumulated.

use tracing::warn;

use super::{ProjectionReport, Projector};
use crate::config::{ConfigDocument, ThemeColors};
use crate::dom::{PageTree, SelectorList};

/// Id of the managed stylesheet element.
pub const STYLE_ELEMENT_ID: &str = "force-theme-styles";

/// Badge text in legacy markup, used when no binding attribute exists.
const BADGE_SENTINELS: [&str; 2] = ["Profesional Certificado", "Artista Profesional"];

/// Projects theme colors and the artist badge.
pub struct ThemeProjector;

impl Projector for ThemeProjector {
    fn name(&self) -> &'static str {
        "theme"
    }

    fn project(&self, config: &ConfigDocument, tree: &mut PageTree) -> ProjectionReport {
        let mut report = ProjectionReport::default();
        let colors = &config.theme.colors;

        self.write_variables(tree, &mut report, colors);
        self.write_stylesheet(tree, &mut report, colors);
        self.write_inline_overrides(tree, &mut report, colors);
        self.write_badge(tree, &mut report, &config.artist.badge);

        report
    }
}

impl ThemeProjector {
    /// Layer 1: CSS custom properties on the root element. Legacy variable
    /// names are kept in sync with the canonical ones.
    fn write_variables(
        &self,
        tree: &mut PageTree,
        report: &mut ProjectionReport,
        colors: &ThemeColors,
    ) {
        let accent = colors.effective_accent().to_string();
        let variables = [
            ("--color-primary", colors.primary.clone()),
            ("--color-accent", accent.clone()),
            ("--color-background", colors.background.clone()),
            ("--color-surface", colors.surface.clone()),
            ("--color-text-primary", colors.text_primary.clone()),
            ("--accent-color", accent.clone()),
            ("--primary-color", colors.primary.clone()),
            ("--bg-primary", colors.primary.clone()),
            ("--text-accent", accent),
        ];

        let changed = tree.update_root(|root| {
            let mut changed = false;
            for (name, value) in &variables {
                if value.is_empty() {
                    continue;
                }
                changed |= root.set_style(name, value, false);
            }
            changed
        });
        if changed {
            report.writes += 1;
        }
    }

    /// Layer 2: the managed stylesheet element under `head`.
    fn write_stylesheet(
        &self,
        tree: &mut PageTree,
        report: &mut ProjectionReport,
        colors: &ThemeColors,
    ) {
        let accent = colors.effective_accent();
        if accent.is_empty() {
            report.skips += 1;
            return;
        }

        let css = render_stylesheet(accent);
        if tree.upsert_style_element(STYLE_ELEMENT_ID, &css) {
            report.writes += 1;
        }
    }

    /// Layer 3: forced inline declarations on accent-bearing elements.
    fn write_inline_overrides(
        &self,
        tree: &mut PageTree,
        report: &mut ProjectionReport,
        colors: &ThemeColors,
    ) {
        let accent = colors.effective_accent().to_string();
        if accent.is_empty() {
            report.skips += 1;
            return;
        }

        let overrides: [(&str, &[&str]); 7] = [
            (".btn-primary", &["background-color", "border-color"]),
            (".text-accent", &["color"]),
            (".text-gradient-gold", &["color"]),
            (".bg-accent", &["background-color"]),
            ("#floatingWhatsappBtn", &["background-color"]),
            (".border-accent", &["border-color"]),
            ("#goldGradient stop, #goldGradientFooter stop", &["stop-color"]),
        ];

        for (selector, properties) in overrides {
            let list = match SelectorList::parse(selector) {
                Ok(list) => list,
                Err(e) => {
                    warn!(error = %e, "Skipping theme override with invalid selector");
                    continue;
                }
            };
            report.writes += tree.mutate(&list, |el| {
                let mut changed = false;
                for property in properties {
                    changed |= el.set_style(property, &accent, true);
                }
                changed
            });
        }
    }

    /// Updates the artist badge text, by binding attribute first and by
    /// sentinel text for legacy markup.
    fn write_badge(&self, tree: &mut PageTree, report: &mut ProjectionReport, badge: &str) {
        if badge.is_empty() {
            report.skips += 1;
            return;
        }

        let bound = match SelectorList::parse("[data-artist-badge]") {
            Ok(list) => list,
            Err(_) => return,
        };
        let mut matched = 0usize;
        report.writes += tree.mutate(&bound, |el| {
            matched += 1;
            el.set_text(badge)
        });
        if matched > 0 {
            return;
        }

        let fallback = match SelectorList::parse(".badge span, .badge-gold span") {
            Ok(list) => list,
            Err(_) => return,
        };
        report.writes += tree.mutate(&fallback, |el| {
            let is_target =
                el.text == badge || BADGE_SENTINELS.iter().any(|s| el.text.contains(s));
            if !is_target {
                return false;
            }
            matched += 1;
            el.set_text(badge)
        });
        if matched == 0 {
            report.misses += 1;
        }
    }
}

/// Renders the managed stylesheet. Deterministic: equal accents produce
/// byte-identical text, which keeps re-application from churning the tree.
fn render_stylesheet(accent: &str) -> String {
    format!(
        "\
.text-accent {{ color: {accent} !important; }}\n\
.bg-accent {{ background-color: {accent} !important; }}\n\
.border-accent {{ border-color: {accent} !important; }}\n\
.btn-primary {{ background-color: {accent} !important; border-color: {accent} !important; }}\n\
.text-gradient-gold {{ background-image: none !important; color: {accent} !important; }}\n\
#floatingWhatsappBtn {{ background-color: {accent} !important; }}\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Element;

    fn themed_tree() -> PageTree {
        PageTree::new(Element::new("html").with_children(vec![
            Element::new("head"),
            Element::new("body").with_children(vec![
                Element::new("button").with_class("btn-primary"),
                Element::new("span").with_class("text-accent"),
                Element::new("div").with_class("badge").with_children(vec![
                    Element::new("span").with_text("Artista Profesional"),
                ]),
                Element::new("svg").with_children(vec![
                    Element::new("linearGradient")
                        .with_id("goldGradient")
                        .with_children(vec![Element::new("stop")]),
                ]),
            ]),
        ]))
    }

    #[test]
    fn applies_all_three_layers() {
        let mut tree = themed_tree();
        let config = ConfigDocument::default_document();

        let report = ThemeProjector.project(&config, &mut tree);
        assert!(report.changed());

        // Layer 1: root variables.
        let root = tree.root();
        assert_eq!(root.styles["--color-primary"].value, "#D4AF37");
        assert_eq!(root.styles["--accent-color"].value, "#D4AF37");

        // Layer 2: managed stylesheet.
        let style = tree.query(&SelectorList::parse("#force-theme-styles").unwrap());
        assert_eq!(style.len(), 1);
        assert!(style[0].text.contains("#D4AF37"));

        // Layer 3: forced inline declarations.
        let button = tree.query(&SelectorList::parse(".btn-primary").unwrap());
        let background = &button[0].styles["background-color"];
        assert_eq!(background.value, "#D4AF37");
        assert!(background.important);

        let stops = tree.query(&SelectorList::parse("#goldGradient stop").unwrap());
        assert_eq!(stops[0].styles["stop-color"].value, "#D4AF37");
    }

    #[test]
    fn legacy_bg_primary_tracks_the_primary_color() {
        let mut tree = themed_tree();
        let mut config = ConfigDocument::default_document();
        config.theme.colors.primary = "#111111".to_string();
        config.theme.colors.background = "#222222".to_string();

        ThemeProjector.project(&config, &mut tree);

        let root = tree.root();
        assert_eq!(root.styles["--bg-primary"].value, "#111111");
        assert_eq!(root.styles["--color-background"].value, "#222222");
    }

    #[test]
    fn two_applications_leave_one_stylesheet_block() {
        let mut tree = themed_tree();
        let mut config = ConfigDocument::default_document();
        config.theme.colors.accent = "#AAAAAA".to_string();

        ThemeProjector.project(&config, &mut tree);
        ThemeProjector.project(&config, &mut tree);

        let style = tree.query(&SelectorList::parse("#force-theme-styles").unwrap());
        assert_eq!(style.len(), 1);
        assert!(style[0].text.contains("#AAAAAA"));
    }

    #[test]
    fn reprojection_converges() {
        let mut tree = themed_tree();
        let config = ConfigDocument::default_document();

        assert!(ThemeProjector.project(&config, &mut tree).changed());
        let revision = tree.revision();

        assert!(!ThemeProjector.project(&config, &mut tree).changed());
        assert_eq!(tree.revision(), revision);
    }

    #[test]
    fn empty_accent_falls_back_to_primary() {
        let mut tree = themed_tree();
        let mut config = ConfigDocument::default_document();
        config.theme.colors.accent = String::new();
        config.theme.colors.primary = "#112233".to_string();

        ThemeProjector.project(&config, &mut tree);

        let span = tree.query(&SelectorList::parse(".text-accent").unwrap());
        assert_eq!(span[0].styles["color"].value, "#112233");
    }

    #[test]
    fn badge_updates_by_sentinel_text() {
        let mut tree = themed_tree();
        let mut config = ConfigDocument::default_document();
        config.artist.badge = "Maestro Tatuador".to_string();

        ThemeProjector.project(&config, &mut tree);

        let badge = tree.query(&SelectorList::parse(".badge span").unwrap());
        assert_eq!(badge[0].text, "Maestro Tatuador");

        // A second pass recognizes its own write and stays put.
        let revision = tree.revision();
        ThemeProjector.project(&config, &mut tree);
        assert_eq!(badge_text(&tree), "Maestro Tatuador");
        assert_eq!(tree.revision(), revision);
    }

    fn badge_text(tree: &PageTree) -> String {
        tree.query(&SelectorList::parse(".badge span").unwrap())[0]
            .text
            .clone()
    }
}
