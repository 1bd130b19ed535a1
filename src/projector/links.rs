//! Outbound contact and social link projection.

use tracing::warn;

use super::{ProjectionReport, Projector};
use crate::config::ConfigDocument;
use crate::dom::{Element, PageTree, SelectorList};

/// Prefilled message for the messaging contact link.
const CONTACT_MESSAGE: &str = "¡Hola! Me interesa obtener más información sobre tus trabajos de \
                               tatuajes. ¿Podríamos agendar una consulta?";

const EMAIL_SUBJECT: &str = "Consulta sobre tatuajes - InkMaster";

/// Elements never rewritten as messaging buttons, even when their labels
/// match. These open the on-page contact section instead.
const EXCLUDED_IDS: [&str; 2] = ["headerContactBtn", "mobileContactBtn"];

const MESSAGING_SELECTOR: &str = "#heroWhatsappBtn, #ctaWhatsappBtn, #footerWhatsappBtn, \
                                  #floatingWhatsappBtn, a[aria-label*=\"whatsapp\" i], \
                                  a[aria-label*=\"contactar\" i]";

const EMAIL_SELECTOR: &str = "#footerEmailBtn, a[href*=\"mailto:\"], a[aria-label*=\"Email\" i]";

/// Builds the messaging deep link for a raw phone field.
///
/// Every non-digit character is stripped; an empty result yields the inert
/// href `#` so the button never navigates to a malformed URL.
pub fn messaging_url(handle: &str) -> String {
    let digits: String = handle.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return "#".to_string();
    }

    match reqwest::Url::parse(&format!("https://wa.me/{}?text={}", digits, CONTACT_MESSAGE)) {
        Ok(url) => url.to_string(),
        Err(_) => "#".to_string(),
    }
}

/// Builds the mailto link with the standard consultation subject.
pub fn email_url(email: &str) -> String {
    if email.is_empty() {
        return "#".to_string();
    }

    match reqwest::Url::parse(&format!("mailto:{}?subject={}", email, EMAIL_SUBJECT)) {
        Ok(url) => url.to_string(),
        Err(_) => "#".to_string(),
    }
}

/// Projects messaging, email and social links.
pub struct LinkProjector;

impl Projector for LinkProjector {
    fn name(&self) -> &'static str {
        "links"
    }

    fn project(&self, config: &ConfigDocument, tree: &mut PageTree) -> ProjectionReport {
        let mut report = ProjectionReport::default();

        let messaging = messaging_url(&config.artist.messaging_handle);
        self.write_links(tree, &mut report, MESSAGING_SELECTOR, &messaging);

        let email = email_url(&config.artist.email);
        self.write_links(tree, &mut report, EMAIL_SELECTOR, &email);

        // Social buttons with no configured URL fall back to the inert
        // anchor so they never point at a stale destination.
        for (selector, url) in [
            (
                "#instagramBtn, #mainInstagramBtn, a[aria-label*=\"instagram\" i]",
                &config.artist.instagram_url,
            ),
            (
                "#facebookBtn, #mainFacebookBtn, a[aria-label*=\"facebook\" i]",
                &config.artist.facebook_url,
            ),
            ("#tiktokBtn, a[aria-label*=\"tiktok\" i]", &config.artist.tiktok_url),
            ("#youtubeBtn, a[aria-label*=\"youtube\" i]", &config.artist.youtube_url),
        ] {
            let target = if url.is_empty() { "#" } else { url.as_str() };
            self.write_links(tree, &mut report, selector, target);
        }

        report
    }
}

impl LinkProjector {
    /// Rewrites every binding under the selector to the given target. The
    /// target is also pinned as the activation override so later href
    /// churn cannot break navigation. The inert target `#` is written
    /// plainly.
    fn write_links(
        &self,
        tree: &mut PageTree,
        report: &mut ProjectionReport,
        selector: &str,
        target: &str,
    ) {
        let list = match SelectorList::parse(selector) {
            Ok(list) => list,
            Err(e) => {
                warn!(error = %e, "Skipping link binding with invalid selector");
                return;
            }
        };

        let mut matched = 0usize;
        report.writes += tree.mutate(&list, |el| {
            if is_excluded(el) {
                return false;
            }
            matched += 1;
            write_target(el, target)
        });
        if matched == 0 {
            report.misses += 1;
        }
    }

}

fn is_excluded(el: &Element) -> bool {
    match &el.id {
        Some(id) => EXCLUDED_IDS.iter().any(|x| x.eq_ignore_ascii_case(id)),
        None => false,
    }
}

fn write_target(el: &mut Element, target: &str) -> bool {
    let mut changed = el.set_attr("href", target);
    if target == "#" {
        changed |= el.remove_attr("target");
        changed |= el.remove_attr("rel");
        return changed;
    }
    changed |= el.set_attr("target", "_blank");
    changed |= el.set_attr("rel", "noopener noreferrer");
    changed |= el.set_activation_target(target);
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact_tree() -> PageTree {
        PageTree::new(Element::new("html").with_children(vec![
            Element::new("body").with_children(vec![
                Element::new("a").with_id("ctaWhatsappBtn").with_attr("href", "#"),
                Element::new("a")
                    .with_attr("aria-label", "Contactar por WhatsApp")
                    .with_attr("href", "#"),
                Element::new("a")
                    .with_id("headerContactBtn")
                    .with_attr("aria-label", "Contactar")
                    .with_attr("href", "#contacto"),
                Element::new("a").with_id("footerEmailBtn").with_attr("href", "#"),
                Element::new("a").with_id("instagramBtn").with_attr("href", "#"),
                Element::new("a").with_id("tiktokBtn").with_attr("href", "#"),
            ]),
        ]))
    }

    #[test]
    fn phone_field_is_reduced_to_digits() {
        let url = messaging_url("+34 600-000-000");

        assert!(url.starts_with("https://wa.me/34600000000?text="));
    }

    #[test]
    fn empty_phone_yields_inert_href() {
        assert_eq!(messaging_url(""), "#");
        assert_eq!(messaging_url("sin número"), "#");
    }

    #[test]
    fn message_is_percent_encoded() {
        let url = messaging_url("34600000000");

        assert!(!url.contains(' '));
        assert!(url.contains("%20"));
    }

    #[test]
    fn email_link_carries_the_consultation_subject() {
        let url = email_url("contacto@inkmaster.es");

        assert!(url.starts_with("mailto:contacto@inkmaster.es?subject="));
        assert!(url.contains("Consulta%20sobre%20tatuajes"));
        assert_eq!(email_url(""), "#");
    }

    #[test]
    fn contact_section_buttons_are_never_rewritten() {
        let mut tree = contact_tree();
        let config = ConfigDocument::default_document();

        LinkProjector.project(&config, &mut tree);

        let excluded = tree.query(&SelectorList::parse("#headerContactBtn").unwrap());
        assert_eq!(excluded[0].attr("href"), Some("#contacto"));
        assert_eq!(excluded[0].attr("target"), None);
    }

    #[test]
    fn messaging_buttons_point_at_the_deep_link() {
        let mut tree = contact_tree();
        let config = ConfigDocument::default_document();

        LinkProjector.project(&config, &mut tree);

        let button = tree.query(&SelectorList::parse("#ctaWhatsappBtn").unwrap());
        let href = button[0].attr("href").expect("href missing");
        assert!(href.starts_with("https://wa.me/34600000000"));
        assert_eq!(button[0].attr("target"), Some("_blank"));
        assert_eq!(button[0].attr("rel"), Some("noopener noreferrer"));

        // Navigation survives later href churn via the pinned target.
        let activation = button[0].activation().expect("no activation");
        assert!(activation.overridden);
        assert_eq!(activation.target, href);
    }

    #[test]
    fn unconfigured_social_buttons_point_at_the_null_anchor() {
        let mut tree = contact_tree();
        let config = ConfigDocument::default_document();

        LinkProjector.project(&config, &mut tree);

        let tiktok = tree.query(&SelectorList::parse("#tiktokBtn").unwrap());
        assert_eq!(tiktok[0].attr("href"), Some("#"));
        assert_eq!(tiktok[0].attr("target"), None);
        assert_eq!(tiktok[0].attr("rel"), None);

        let instagram = tree.query(&SelectorList::parse("#instagramBtn").unwrap());
        assert_eq!(
            instagram[0].attr("href"),
            Some("https://instagram.com/inkmaster")
        );
        assert_eq!(instagram[0].attr("target"), Some("_blank"));
    }

    #[test]
    fn projection_converges() {
        let mut tree = contact_tree();
        let config = ConfigDocument::default_document();

        assert!(LinkProjector.project(&config, &mut tree).changed());
        let revision = tree.revision();

        assert!(!LinkProjector.project(&config, &mut tree).changed());
        assert_eq!(tree.revision(), revision);
    }
}
