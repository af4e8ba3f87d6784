use crate::core::geo::TileCoord;

/// Trait representing anything that can produce tile URLs for a given coordinate.
pub trait TileSource: Send + Sync {
    /// Build a URL for the requested `coord`.
    fn url(&self, coord: TileCoord) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Subdomain,
    Zoom,
    X,
    Y,
    Retina,
    Extension,
}

/// Leaflet style URL template such as
/// `https://{s}.tile.openstreetmap.org/{z}/{x}/{y}{r}.{ext}`.
///
/// `{s}` always resolves to `a`, `{r}` to nothing and `{ext}` to `png`.
/// Unknown placeholders are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    template: String,
    segments: Vec<Segment>,
}

impl UrlTemplate {
    pub const DEFAULT_SUBDOMAIN: &'static str = "a";
    pub const DEFAULT_EXTENSION: &'static str = "png";

    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let segments = Self::parse(&template);
        Self { template, segments }
    }

    fn parse(template: &str) -> Vec<Segment> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            literal.push_str(&rest[..open]);
            let after = &rest[open..];
            let Some(close) = after.find('}') else {
                // Unterminated brace, keep the remainder as text
                literal.push_str(after);
                rest = "";
                break;
            };

            let placeholder = match &after[1..close] {
                "s" => Some(Segment::Subdomain),
                "z" => Some(Segment::Zoom),
                "x" => Some(Segment::X),
                "y" => Some(Segment::Y),
                "r" => Some(Segment::Retina),
                "ext" => Some(Segment::Extension),
                _ => None,
            };

            match placeholder {
                Some(segment) => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(segment);
                }
                None => literal.push_str(&after[..=close]),
            }
            rest = &after[close + 1..];
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        segments
    }

    /// The raw template string
    pub fn as_str(&self) -> &str {
        &self.template
    }

    pub fn resolve(&self, coord: TileCoord) -> String {
        let mut url = String::with_capacity(self.template.len() + 16);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => url.push_str(text),
                Segment::Subdomain => url.push_str(Self::DEFAULT_SUBDOMAIN),
                Segment::Zoom => url.push_str(&coord.z.to_string()),
                Segment::X => url.push_str(&coord.x.to_string()),
                Segment::Y => url.push_str(&coord.y.to_string()),
                Segment::Retina => {}
                Segment::Extension => url.push_str(Self::DEFAULT_EXTENSION),
            }
        }
        url
    }
}

impl TileSource for UrlTemplate {
    fn url(&self, coord: TileCoord) -> String {
        self.resolve(coord)
    }
}

impl From<&str> for UrlTemplate {
    fn from(template: &str) -> Self {
        Self::new(template)
    }
}

impl From<String> for UrlTemplate {
    fn from(template: String) -> Self {
        Self::new(template)
    }
}
