//! Text and image field projection.

use tracing::warn;

use super::{categories, ProjectionReport, Projector};
use crate::config::{is_valid_image_path, normalize_image_path, ConfigDocument, PageLocation};
use crate::dom::{PageTree, SelectorList};

/// Marker attribute stamped on every element a binding has written to.
pub const BOUND_FIELD_ATTR: &str = "data-bound-field";

/// Legacy markup carries no binding attributes for the artist bio; these
/// substrings identify the paragraph it lives in.
const BIO_SENTINELS: [&str; 3] = [
    "años transformando",
    "Transformo visiones",
    "línea que trazo",
];

/// Projects document text, stats, images and the category grid.
pub struct FieldProjector {
    location: PageLocation,
}

impl FieldProjector {
    pub fn new(location: PageLocation) -> Self {
        Self { location }
    }
}

impl Projector for FieldProjector {
    fn name(&self) -> &'static str {
        "fields"
    }

    fn project(&self, config: &ConfigDocument, tree: &mut PageTree) -> ProjectionReport {
        let mut report = ProjectionReport::default();

        // Document title combines title and tagline.
        let title = if config.site.title.is_empty() {
            String::new()
        } else if config.site.tagline.is_empty() {
            config.site.title.clone()
        } else {
            format!("{} - {}", config.site.title, config.site.tagline)
        };
        write_text(tree, &mut report, "title", "site.title", &title);

        write_attr(
            tree,
            &mut report,
            r#"meta[name*="description"]"#,
            "content",
            "site.description",
            &config.site.description,
        );

        let texts = &config.texts.homepage;
        write_text(
            tree,
            &mut report,
            "[data-homepage-title]",
            "texts.homepage.heroTitle",
            &texts.hero_title,
        );
        write_text(
            tree,
            &mut report,
            "[data-homepage-title-accent]",
            "texts.homepage.heroTitleAccent",
            &texts.hero_title_accent,
        );
        write_text(
            tree,
            &mut report,
            "[data-homepage-description]",
            "texts.homepage.heroDescription",
            &texts.hero_description,
        );

        write_text(
            tree,
            &mut report,
            "[data-artist-name], .artist-name",
            "artist.name",
            &config.artist.name,
        );
        write_text(
            tree,
            &mut report,
            "[data-artist-title], .artist-title",
            "artist.title",
            &config.artist.title,
        );
        self.write_bio(tree, &mut report, &config.artist.bio);

        for (selector, field, value) in [
            (
                "[data-artist-experience]",
                "artist.experience",
                config.artist.experience,
            ),
            ("[data-artist-clients]", "artist.clients", config.artist.clients),
            ("[data-artist-awards]", "artist.awards", config.artist.awards),
        ] {
            let text = if value == 0 {
                String::new()
            } else {
                format!("{}+", value)
            };
            write_text(tree, &mut report, selector, field, &text);
        }

        self.write_image(
            tree,
            &mut report,
            "[data-homepage-hero-image]",
            "images.homepage.hero",
            &config.images.homepage.hero,
        );
        self.write_image(
            tree,
            &mut report,
            "[data-artist-profile-image]",
            "images.artist.profile",
            &config.images.artist.profile,
        );
        self.write_image(
            tree,
            &mut report,
            "[data-site-logo]",
            "theme.logo",
            &config.theme.logo,
        );

        report.absorb(categories::render_at(config, tree, self.location));

        report
    }
}

impl FieldProjector {
    /// Binds the artist bio, falling back to sentinel paragraph text when
    /// the page predates binding attributes.
    fn write_bio(&self, tree: &mut PageTree, report: &mut ProjectionReport, bio: &str) {
        if bio.is_empty() {
            report.skips += 1;
            return;
        }

        let primary = match parse("[data-artist-bio], .artist-bio") {
            Some(list) => list,
            None => return,
        };

        let mut matched = 0usize;
        report.writes += tree.mutate(&primary, |el| {
            matched += 1;
            let text_changed = el.set_text(bio);
            el.set_attr(BOUND_FIELD_ATTR, "artist.bio") || text_changed
        });
        if matched > 0 {
            return;
        }

        let paragraphs = match parse("p") {
            Some(list) => list,
            None => return,
        };
        report.writes += tree.mutate(&paragraphs, |el| {
            let is_target = el.attr(BOUND_FIELD_ATTR) == Some("artist.bio")
                || BIO_SENTINELS.iter().any(|s| el.text.contains(s));
            if !is_target {
                return false;
            }
            matched += 1;
            let text_changed = el.set_text(bio);
            el.set_attr(BOUND_FIELD_ATTR, "artist.bio") || text_changed
        });
        if matched == 0 {
            report.misses += 1;
        }
    }

    /// Binds an image path after validating and normalizing it. An empty
    /// or unrecognized path is skipped; the current src is never cleared.
    fn write_image(
        &self,
        tree: &mut PageTree,
        report: &mut ProjectionReport,
        selector: &str,
        field: &str,
        path: &str,
    ) {
        if !is_valid_image_path(path) {
            if !path.is_empty() {
                warn!(field, path, "Skipping unrecognized image path");
            }
            report.skips += 1;
            return;
        }

        let src = normalize_image_path(path, self.location);
        write_attr(tree, report, selector, "src", field, &src);
    }
}

fn parse(selector: &str) -> Option<SelectorList> {
    match SelectorList::parse(selector) {
        Ok(list) => Some(list),
        Err(e) => {
            warn!(error = %e, "Skipping binding with invalid selector");
            None
        }
    }
}

fn write_text(
    tree: &mut PageTree,
    report: &mut ProjectionReport,
    selector: &str,
    field: &str,
    value: &str,
) {
    if value.is_empty() {
        report.skips += 1;
        return;
    }
    let list = match parse(selector) {
        Some(list) => list,
        None => return,
    };

    let mut matched = 0usize;
    report.writes += tree.mutate(&list, |el| {
        matched += 1;
        let text_changed = el.set_text(value);
        el.set_attr(BOUND_FIELD_ATTR, field) || text_changed
    });
    if matched == 0 {
        report.misses += 1;
    }
}

fn write_attr(
    tree: &mut PageTree,
    report: &mut ProjectionReport,
    selector: &str,
    attr: &str,
    field: &str,
    value: &str,
) {
    if value.is_empty() {
        report.skips += 1;
        return;
    }
    let list = match parse(selector) {
        Some(list) => list,
        None => return,
    };

    let mut matched = 0usize;
    report.writes += tree.mutate(&list, |el| {
        matched += 1;
        let attr_changed = el.set_attr(attr, value);
        el.set_attr(BOUND_FIELD_ATTR, field) || attr_changed
    });
    if matched == 0 {
        report.misses += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Element;

    fn homepage_tree() -> PageTree {
        PageTree::new(Element::new("html").with_children(vec![
            Element::new("head").with_children(vec![
                Element::new("title").with_text("Cargando..."),
                Element::new("meta")
                    .with_attr("name", "description")
                    .with_attr("content", ""),
            ]),
            Element::new("body").with_children(vec![
                Element::new("span").with_attr("data-homepage-title", ""),
                Element::new("span").with_attr("data-homepage-title-accent", ""),
                Element::new("p").with_attr("data-homepage-description", ""),
                Element::new("img")
                    .with_attr("data-homepage-hero-image", "")
                    .with_attr("src", "placeholder.jpg"),
                Element::new("div").with_id("categoriesGrid"),
                Element::new("span").with_id("resultCount"),
            ]),
        ]))
    }

    fn artist_tree() -> PageTree {
        PageTree::new(Element::new("html").with_children(vec![
            Element::new("head"),
            Element::new("body").with_children(vec![
                Element::new("h1").with_class("artist-name").with_text("..."),
                Element::new("p")
                    .with_text("Con más de 10 años transformando visiones en arte permanente."),
            ]),
        ]))
    }

    #[test]
    fn projects_homepage_texts_and_title() {
        let mut tree = homepage_tree();
        let config = ConfigDocument::default_document();

        let report = FieldProjector::new(PageLocation::Root).project(&config, &mut tree);

        assert!(report.changed());
        let title = tree.query(&SelectorList::parse("title").unwrap());
        assert_eq!(title[0].text, "InkMaster Portfolio - Arte que vive contigo");

        let hero = tree.query(&SelectorList::parse("[data-homepage-title]").unwrap());
        assert_eq!(hero[0].text, "Arte que");
        assert_eq!(hero[0].attr(BOUND_FIELD_ATTR), Some("texts.homepage.heroTitle"));
    }

    #[test]
    fn projection_is_idempotent() {
        let mut tree = homepage_tree();
        let config = ConfigDocument::default_document();
        let projector = FieldProjector::new(PageLocation::Root);

        let first = projector.project(&config, &mut tree);
        assert!(first.changed());

        let revision = tree.revision();
        let second = projector.project(&config, &mut tree);

        assert!(!second.changed());
        assert_eq!(tree.revision(), revision);
    }

    #[test]
    fn empty_image_path_never_clears_existing_src() {
        let mut tree = homepage_tree();
        let mut config = ConfigDocument::default_document();
        config.images.homepage.hero = String::new();

        let report = FieldProjector::new(PageLocation::Root).project(&config, &mut tree);

        assert!(report.skips > 0);
        let img = tree.query(&SelectorList::parse("[data-homepage-hero-image]").unwrap());
        assert_eq!(img[0].attr("src"), Some("placeholder.jpg"));
    }

    #[test]
    fn nested_page_gets_ascended_image_path() {
        let mut tree = homepage_tree();
        let config = ConfigDocument::default_document();

        FieldProjector::new(PageLocation::Nested).project(&config, &mut tree);

        let img = tree.query(&SelectorList::parse("[data-homepage-hero-image]").unwrap());
        assert_eq!(img[0].attr("src"), Some("../imagenes/homepage/hero.jpg"));
    }

    #[test]
    fn bio_falls_back_to_sentinel_paragraph() {
        let mut tree = artist_tree();
        let mut config = ConfigDocument::default_document();
        config.artist.bio = "Nueva biografía.".to_string();

        FieldProjector::new(PageLocation::Root).project(&config, &mut tree);

        let p = tree.query(&SelectorList::parse(r#"p[data-bound-field*="artist.bio"]"#).unwrap());
        assert_eq!(p.len(), 1);
        assert_eq!(p[0].text, "Nueva biografía.");
    }

    #[test]
    fn missing_targets_are_misses_not_errors() {
        let mut tree = PageTree::new(Element::new("html"));
        let config = ConfigDocument::default_document();

        let report = FieldProjector::new(PageLocation::Root).project(&config, &mut tree);

        assert!(report.misses > 0);
    }
}
