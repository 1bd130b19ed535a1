//! Category grid rendering.
//!
//! The grid is rebuilt from the document on every pass and swapped in only
//! when the rendered cards differ from what the page already holds, so a
//! converged grid does not churn the tree.

use super::ProjectionReport;
use crate::config::{
    is_valid_image_path, normalize_image_path, Category, ConfigDocument, PageLocation,
};
use crate::dom::{Element, PageTree, SelectorList};

const GRID_ID: &str = "categoriesGrid";
const COUNTER_ID: &str = "resultCount";
const DEFAULT_GALLERY_LINK: &str = "portfolio_gallery.html";

/// Renders the active categories into the grid and updates the result
/// counter. Inactive categories are filtered out entirely.
pub fn render(config: &ConfigDocument, tree: &mut PageTree) -> ProjectionReport {
    render_at(config, tree, PageLocation::Root)
}

pub fn render_at(
    config: &ConfigDocument,
    tree: &mut PageTree,
    location: PageLocation,
) -> ProjectionReport {
    let mut report = ProjectionReport::default();

    let active: Vec<&Category> = config.categories.iter().filter(|c| c.active).collect();
    let cards: Vec<Element> = active.iter().map(|c| render_card(c, location)).collect();

    let grid = match SelectorList::parse(&format!("#{}", GRID_ID)) {
        Ok(list) => list,
        Err(_) => return report,
    };
    let mut matched = false;
    report.writes += tree.mutate(&grid, |el| {
        matched = true;
        el.set_children(cards.clone())
    });
    if !matched {
        report.misses += 1;
        return report;
    }

    let counter = match SelectorList::parse(&format!("#{}", COUNTER_ID)) {
        Ok(list) => list,
        Err(_) => return report,
    };
    let count = active.len().to_string();
    let mut counter_matched = false;
    report.writes += tree.mutate(&counter, |el| {
        counter_matched = true;
        el.set_text(&count)
    });
    if !counter_matched {
        report.misses += 1;
    }

    report
}

fn render_card(category: &Category, location: PageLocation) -> Element {
    let mut children = Vec::new();

    if is_valid_image_path(&category.image) {
        children.push(
            Element::new("div").with_class("card-image").with_children(vec![
                Element::new("img")
                    .with_attr("src", normalize_image_path(&category.image, location))
                    .with_attr("alt", &category.name)
                    .with_attr("loading", "lazy"),
            ]),
        );
    }

    if !category.badge.is_empty() {
        children.push(
            Element::new("span")
                .with_class("card-badge")
                .with_text(&category.badge),
        );
    }

    children.push(Element::new("h3").with_text(&category.name));
    children.push(Element::new("p").with_text(&category.description));

    if !category.tags.is_empty() {
        children.push(
            Element::new("div").with_class("card-tags").with_children(
                category
                    .tags
                    .iter()
                    .map(|tag| Element::new("span").with_class("tag").with_text(tag))
                    .collect(),
            ),
        );
    }

    let link = if category.link.is_empty() {
        DEFAULT_GALLERY_LINK
    } else {
        category.link.as_str()
    };
    children.push(
        Element::new("a")
            .with_class("card-link")
            .with_attr("href", link)
            .with_text("Ver Galería"),
    );

    Element::new("article")
        .with_class("category-card")
        .with_attr("data-category-id", &category.id)
        .with_attr("data-name", category.name.to_lowercase())
        .with_attr("data-tags", category.tags.join(","))
        .with_attr("data-complexity", category.complexity.to_string())
        .with_children(children)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_tree() -> PageTree {
        PageTree::new(Element::new("html").with_children(vec![
            Element::new("body").with_children(vec![
                Element::new("div").with_id(GRID_ID),
                Element::new("span").with_id(COUNTER_ID).with_text("0"),
            ]),
        ]))
    }

    fn two_categories() -> ConfigDocument {
        let mut config = ConfigDocument::default_document();
        config.categories = vec![
            Category {
                active: false,
                ..Category::new("Japonés")
            },
            Category {
                link: "galeria_geometrico.html".to_string(),
                ..Category::new("Geométrico")
            },
        ];
        config
    }

    #[test]
    fn inactive_categories_are_filtered_and_counted_out() {
        let mut tree = grid_tree();
        let config = two_categories();

        let report = render(&config, &mut tree);

        assert!(report.changed());

        let cards = tree.query(&SelectorList::parse(".category-card").unwrap());
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].attr("data-name"), Some("geométrico"));

        let counter = tree.query(&SelectorList::parse("#resultCount").unwrap());
        assert_eq!(counter[0].text, "1");
    }

    #[test]
    fn rendering_converges() {
        let mut tree = grid_tree();
        let config = ConfigDocument::default_document();

        assert!(render(&config, &mut tree).changed());
        let revision = tree.revision();

        assert!(!render(&config, &mut tree).changed());
        assert_eq!(tree.revision(), revision);
    }

    #[test]
    fn card_link_defaults_to_gallery_page() {
        let mut tree = grid_tree();
        let mut config = ConfigDocument::default_document();
        config.categories = vec![Category::new("Sin Enlace")];

        render(&config, &mut tree);

        let links = tree.query(&SelectorList::parse(".category-card .card-link").unwrap());
        assert_eq!(links[0].attr("href"), Some(DEFAULT_GALLERY_LINK));
    }

    #[test]
    fn card_carries_filtering_metadata() {
        let mut tree = grid_tree();
        let config = ConfigDocument::default_document();

        render(&config, &mut tree);

        let cards = tree.query(&SelectorList::parse(".category-card").unwrap());
        assert_eq!(cards.len(), 4);
        assert_eq!(cards[0].attr("data-category-id"), Some("realismo-en-sombras"));
        assert_eq!(cards[0].attr("data-tags"), Some("color,detailed,large"));
        assert_eq!(cards[0].attr("data-complexity"), Some("high"));
    }

    #[test]
    fn missing_grid_is_a_miss() {
        let mut tree = PageTree::new(Element::new("html"));

        let report = render(&ConfigDocument::default_document(), &mut tree);

        assert!(!report.changed());
        assert_eq!(report.misses, 1);
    }
}
