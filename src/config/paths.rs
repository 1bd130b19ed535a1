//! Image path validation and page-relative normalization.
//!
//! Configured paths are a discriminated union: absolute URL, embedded data
//! URL, or project-relative path. Relative paths are stored rooted at the
//! project directory (`imagenes/...`) and must be rewritten for pages served
//! from a nested directory.

/// Where the consuming page lives relative to the project root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageLocation {
    /// Page served from the project root.
    Root,
    /// Page served from a nested directory (one level down, e.g. `pages/`).
    #[default]
    Nested,
}

/// Returns true if the path is one of the recognized image path forms.
pub fn is_valid_image_path(path: &str) -> bool {
    if path.is_empty() {
        return false;
    }

    path.starts_with("http")
        || path.starts_with("data:")
        || path.starts_with("../")
        || path.starts_with("imagenes/")
}

/// Normalizes a configured image path for use from the given page location.
///
/// Absolute URLs, data URLs and already-ascended paths pass through
/// unchanged; project-relative paths gain a `../` prefix for nested pages.
pub fn normalize_image_path(path: &str, location: PageLocation) -> String {
    if path.starts_with("http") || path.starts_with("data:") || path.starts_with("../") {
        return path.to_string();
    }

    match location {
        PageLocation::Root => path.to_string(),
        PageLocation::Nested => format!("../{}", path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_path_forms() {
        assert!(is_valid_image_path("https://example.com/a.jpg"));
        assert!(is_valid_image_path("http://example.com/a.jpg"));
        assert!(is_valid_image_path("data:image/png;base64,AAAA"));
        assert!(is_valid_image_path("../imagenes/hero.jpg"));
        assert!(is_valid_image_path("imagenes/hero.jpg"));

        assert!(!is_valid_image_path(""));
        assert!(!is_valid_image_path("/etc/passwd"));
        assert!(!is_valid_image_path("file:///a.jpg"));
    }

    #[test]
    fn nested_pages_ascend_project_relative_paths() {
        assert_eq!(
            normalize_image_path("imagenes/hero.jpg", PageLocation::Nested),
            "../imagenes/hero.jpg"
        );
        assert_eq!(
            normalize_image_path("imagenes/hero.jpg", PageLocation::Root),
            "imagenes/hero.jpg"
        );
    }

    #[test]
    fn absolute_and_data_urls_pass_through() {
        for path in [
            "https://example.com/a.jpg",
            "data:image/png;base64,AAAA",
            "../imagenes/hero.jpg",
        ] {
            assert_eq!(normalize_image_path(path, PageLocation::Nested), path);
            assert_eq!(normalize_image_path(path, PageLocation::Root), path);
        }
    }
}
