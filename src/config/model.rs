//! Configuration document data structures.
//!
//! Every scalar field carries a serde default so a partially populated
//! document never produces an absent field: projectors read empty strings
//! and zeros, not `Option`s, and must never panic on missing data.

use serde::{Deserialize, Serialize};

/// Schema version stamped into backup snapshots.
pub const SCHEMA_VERSION: &str = "1.0";

/// Root configuration document shared by every page of the site.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigDocument {
    /// Site-wide copy (title, tagline, description).
    #[serde(default)]
    pub site: SiteSection,

    /// Artist profile and contact fields.
    #[serde(default)]
    pub artist: ArtistSection,

    /// Image paths keyed by page.
    #[serde(default)]
    pub images: ImagesSection,

    /// Theme colors and optional logo.
    #[serde(default)]
    pub theme: ThemeSection,

    /// Page-specific text blocks.
    #[serde(default)]
    pub texts: TextsSection,

    /// Ordered portfolio category listing.
    #[serde(default)]
    pub categories: Vec<Category>,
}

/// Site-wide copy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteSection {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub tagline: String,

    #[serde(default)]
    pub description: String,
}

/// Artist profile, stats and contact links.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistSection {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub bio: String,

    /// Certification badge text shown next to the artist name.
    #[serde(default)]
    pub badge: String,

    #[serde(default)]
    pub experience: u32,

    #[serde(default)]
    pub clients: u32,

    #[serde(default)]
    pub awards: u32,

    /// Raw phone field for the messaging contact; sanitized at projection time.
    #[serde(default)]
    pub messaging_handle: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub instagram_url: String,

    #[serde(default)]
    pub facebook_url: String,

    #[serde(default)]
    pub tiktok_url: String,

    #[serde(default)]
    pub youtube_url: String,
}

/// Image paths, nested per page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImagesSection {
    #[serde(default)]
    pub homepage: HomepageImages,

    #[serde(default)]
    pub artist: ArtistImages,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HomepageImages {
    /// Hero image: absolute URL, data URL, or project-relative path.
    #[serde(default)]
    pub hero: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtistImages {
    #[serde(default)]
    pub profile: String,
}

/// Theme colors plus an optional logo path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThemeSection {
    #[serde(default)]
    pub colors: ThemeColors,

    #[serde(default)]
    pub logo: String,
}

/// Named theme colors. An empty `accent` falls back to `primary`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeColors {
    #[serde(default)]
    pub primary: String,

    #[serde(default)]
    pub accent: String,

    #[serde(default)]
    pub background: String,

    #[serde(default)]
    pub surface: String,

    #[serde(default)]
    pub text_primary: String,
}

impl ThemeColors {
    /// Effective accent color: `accent` when set, otherwise `primary`.
    pub fn effective_accent(&self) -> &str {
        if self.accent.is_empty() {
            &self.primary
        } else {
            &self.accent
        }
    }
}

/// Page-specific text blocks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextsSection {
    #[serde(default)]
    pub homepage: HomepageTexts,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomepageTexts {
    #[serde(default)]
    pub hero_title: String,

    #[serde(default)]
    pub hero_title_accent: String,

    #[serde(default)]
    pub hero_description: String,
}

/// A portfolio category entry. `id` is unique within the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub image: String,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub badge: String,

    #[serde(default)]
    pub complexity: Complexity,

    #[serde(default = "default_true")]
    pub active: bool,

    #[serde(default)]
    pub link: String,
}

impl Category {
    /// Creates a new active category with a generated unique id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            description: String::new(),
            image: String::new(),
            tags: Vec::new(),
            badge: String::new(),
            complexity: Complexity::default(),
            active: true,
            link: String::new(),
        }
    }
}

/// Design complexity rating for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Low,
    #[default]
    Medium,
    High,
}

impl std::fmt::Display for Complexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

fn default_true() -> bool {
    true
}

impl ConfigDocument {
    /// Hardcoded default document, the last tier of the loader's fallback
    /// chain. Always usable: every page renders something sensible from it.
    pub fn default_document() -> Self {
        Self {
            site: SiteSection {
                title: "InkMaster Portfolio".to_string(),
                tagline: "Arte que vive contigo".to_string(),
                description: "Transformo visiones en arte permanente con precisión en cada línea."
                    .to_string(),
            },
            artist: ArtistSection {
                name: "Alejandro Morales".to_string(),
                title: "Maestro del Arte Corporal".to_string(),
                bio: "Con más de 10 años transformando visiones en arte permanente.".to_string(),
                badge: "Artista Profesional Certificado".to_string(),
                experience: 10,
                clients: 500,
                awards: 15,
                messaging_handle: "+34600000000".to_string(),
                email: "contacto@inkmaster.es".to_string(),
                instagram_url: "https://instagram.com/inkmaster".to_string(),
                facebook_url: "https://facebook.com/inkmaster".to_string(),
                tiktok_url: String::new(),
                youtube_url: String::new(),
            },
            images: ImagesSection {
                homepage: HomepageImages {
                    hero: "imagenes/homepage/hero.jpg".to_string(),
                },
                artist: ArtistImages {
                    profile: "imagenes/artist/profile.jpg".to_string(),
                },
            },
            theme: ThemeSection {
                colors: ThemeColors {
                    primary: "#D4AF37".to_string(),
                    accent: String::new(),
                    background: "#000000".to_string(),
                    surface: "#262626".to_string(),
                    text_primary: "#FFFFFF".to_string(),
                },
                logo: String::new(),
            },
            texts: TextsSection {
                homepage: HomepageTexts {
                    hero_title: "Arte que".to_string(),
                    hero_title_accent: "Vive Contigo".to_string(),
                    hero_description:
                        "Transformo visiones en arte permanente con precisión en cada línea."
                            .to_string(),
                },
            },
            categories: vec![
                Category {
                    id: "realismo-en-sombras".to_string(),
                    name: "Realismo en Sombras".to_string(),
                    description: "Detalles fotográficos que capturan la esencia de retratos y escenas.".to_string(),
                    image: "imagenes/portafolio/realismo.jpg".to_string(),
                    tags: vec!["color".to_string(), "detailed".to_string(), "large".to_string()],
                    badge: "Alta Demanda".to_string(),
                    complexity: Complexity::High,
                    active: true,
                    link: String::new(),
                },
                Category {
                    id: "geometrico".to_string(),
                    name: "Geométrico".to_string(),
                    description: "Patrones simétricos y mandalas con precisión matemática.".to_string(),
                    image: "imagenes/portafolio/geometrico.jpg".to_string(),
                    tags: vec!["blackwork".to_string(), "minimalist".to_string()],
                    badge: "Trending".to_string(),
                    complexity: Complexity::High,
                    active: true,
                    link: String::new(),
                },
                Category {
                    id: "japones".to_string(),
                    name: "Japonés".to_string(),
                    description: "Tradición milenaria con dragones, flores y arte oriental.".to_string(),
                    image: "imagenes/portafolio/japones.jpg".to_string(),
                    tags: vec!["color".to_string(), "traditional".to_string()],
                    badge: "Clásico".to_string(),
                    complexity: Complexity::High,
                    active: true,
                    link: String::new(),
                },
                Category {
                    id: "blackwork".to_string(),
                    name: "Blackwork".to_string(),
                    description: "Tinta negra sólida con alto contraste y definición.".to_string(),
                    image: "imagenes/portafolio/blackwork.jpg".to_string(),
                    tags: vec!["blackwork".to_string(), "bold".to_string()],
                    badge: "Popular".to_string(),
                    complexity: Complexity::Medium,
                    active: true,
                    link: String::new(),
                },
            ],
        }
    }
}
