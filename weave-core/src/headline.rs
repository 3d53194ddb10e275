use serde::{Deserialize, Serialize};

use crate::registry::ComponentRegistry;
use crate::slots::fill_slots;

/// The component addressed by the headline tokens.
pub const HEADLINE_COMPONENT: &str = "headline";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeadlineVariant {
    Default,
    Black,
    Lighter,
}

impl HeadlineVariant {
    pub const ALL: [HeadlineVariant; 3] = [Self::Default, Self::Black, Self::Lighter];

    pub fn token(self) -> &'static str {
        match self {
            Self::Default => "<!-- HEADLINE COMPONENT -->",
            Self::Black => "<!-- HEADLINE COMPONENT - BLACK -->",
            Self::Lighter => "<!-- HEADLINE COMPONENT - LIGHTER -->",
        }
    }
}

/// Values for the `{{headline_class}}` and `{{marquee_class}}` slots.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct HeadlineStyle {
    pub headline_class: String,
    #[serde(default)]
    pub marquee_class: String,
}

impl HeadlineStyle {
    pub fn new(headline_class: impl Into<String>, marquee_class: impl Into<String>) -> Self {
        Self {
            headline_class: headline_class.into(),
            marquee_class: marquee_class.into(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct HeadlineStyles {
    pub black: HeadlineStyle,
    pub lighter: HeadlineStyle,
}

impl Default for HeadlineStyles {
    fn default() -> Self {
        Self {
            black: HeadlineStyle::new("bgc-black pt-120 rpt-90", "white-text"),
            lighter: HeadlineStyle::new("bgc-lighter pt-120 rpt-90", ""),
        }
    }
}

impl HeadlineStyles {
    pub fn style(&self, variant: HeadlineVariant) -> Option<&HeadlineStyle> {
        match variant {
            HeadlineVariant::Default => None,
            HeadlineVariant::Black => Some(&self.black),
            HeadlineVariant::Lighter => Some(&self.lighter),
        }
    }

    /// The text a variant's token is replaced with.
    ///
    /// Without a `headline` component every variant renders as nothing.
    pub fn render(&self, variant: HeadlineVariant, fragment: Option<&str>) -> String {
        let Some(fragment) = fragment else {
            return String::new();
        };

        match self.style(variant) {
            None => fragment.to_string(),
            Some(style) => fill_slots(
                fragment,
                &[
                    ("headline_class", style.headline_class.as_str()),
                    ("marquee_class", style.marquee_class.as_str()),
                ],
            ),
        }
    }
}

/// Replace the three headline tokens with the styled `headline` fragment.
pub fn resolve_headlines(
    document: &str,
    registry: &ComponentRegistry,
    styles: &HeadlineStyles,
) -> String {
    let fragment = registry.get(HEADLINE_COMPONENT);

    HeadlineVariant::ALL
        .iter()
        .fold(document.to_string(), |doc, &variant| {
            if doc.contains(variant.token()) {
                doc.replace(variant.token(), &styles.render(variant, fragment))
            } else {
                doc
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADLINE: &str =
        "<section class=\"{{headline_class}}\"><div class=\"marquee {{marquee_class}}\"></div></section>";

    fn with_headline() -> ComponentRegistry {
        ComponentRegistry::load([(HEADLINE_COMPONENT, HEADLINE)])
    }

    #[test]
    fn plain_token_is_verbatim() {
        let out = resolve_headlines(
            "<!-- HEADLINE COMPONENT -->",
            &with_headline(),
            &HeadlineStyles::default(),
        );
        assert_eq!(out, HEADLINE);
    }

    #[test]
    fn black_variant_fills_classes() {
        let out = resolve_headlines(
            "<!-- HEADLINE COMPONENT - BLACK -->",
            &with_headline(),
            &HeadlineStyles::default(),
        );
        assert_eq!(
            out,
            "<section class=\"bgc-black pt-120 rpt-90\"><div class=\"marquee white-text\"></div></section>"
        );
    }

    #[test]
    fn lighter_variant_fills_classes() {
        let out = resolve_headlines(
            "<!-- HEADLINE COMPONENT - LIGHTER -->",
            &with_headline(),
            &HeadlineStyles::default(),
        );
        assert_eq!(
            out,
            "<section class=\"bgc-lighter pt-120 rpt-90\"><div class=\"marquee \"></div></section>"
        );
    }

    #[test]
    fn every_occurrence_of_each_variant() {
        let doc = "<!-- HEADLINE COMPONENT - BLACK -->|<!-- HEADLINE COMPONENT -->|<!-- HEADLINE COMPONENT - BLACK -->";
        let reg = ComponentRegistry::load([(HEADLINE_COMPONENT, "[{{marquee_class}}]")]);
        let out = resolve_headlines(doc, &reg, &HeadlineStyles::default());
        assert_eq!(out, "[white-text]|[{{marquee_class}}]|[white-text]");
    }

    #[test]
    fn missing_component_renders_nothing() {
        let doc = "a<!-- HEADLINE COMPONENT -->b<!-- HEADLINE COMPONENT - BLACK -->c<!-- HEADLINE COMPONENT - LIGHTER -->d";
        let out = resolve_headlines(doc, &ComponentRegistry::default(), &HeadlineStyles::default());
        assert_eq!(out, "abcd");
    }

    #[test]
    fn custom_styles() {
        let styles = HeadlineStyles {
            black: HeadlineStyle::new("dark", "light"),
            ..HeadlineStyles::default()
        };
        let reg = ComponentRegistry::load([(HEADLINE_COMPONENT, "{{headline_class}}/{{marquee_class}}")]);
        let out = resolve_headlines("<!-- HEADLINE COMPONENT - BLACK -->", &reg, &styles);
        assert_eq!(out, "dark/light");
    }
}
