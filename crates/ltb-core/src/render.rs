//! Remote render requests (LaTeX → CodeCogs image URL + caption).
//!
//! Nothing here touches the network. The URL is handed to Telegram as an
//! opaque photo source and Telegram fetches it.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RenderKind {
    /// Caption only.
    Standard,
    /// Caption plus the image link.
    Linked,
    /// Sampled from the example corpus; captioned like `Standard`.
    Random,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RendererConfig {
    pub base_url: String,
    pub format: String,
    pub dpi: u32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            base_url: "https://latex.codecogs.com".to_string(),
            format: "png".to_string(),
            dpi: 512,
        }
    }
}

impl RendererConfig {
    pub fn image_url(&self, latex: &str) -> String {
        format!(
            "{}/{}.latex?\\{}dpi&space;{}",
            self.base_url.trim_end_matches('/'),
            self.format,
            self.dpi,
            encode_latex(latex)
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderRequest {
    pub latex: String,
    pub kind: RenderKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedImage {
    pub image_url: String,
    pub caption: String,
}

impl RenderRequest {
    /// `latex` is used as-is; command tokens are stripped by the caller.
    pub fn new(latex: &str, kind: RenderKind) -> Self {
        Self {
            latex: latex.to_string(),
            kind,
        }
    }

    pub fn build(&self, renderer: &RendererConfig) -> RenderedImage {
        let image_url = renderer.image_url(&self.latex);
        let mut caption = format!("`{}`", self.latex);
        if self.kind == RenderKind::Linked {
            caption.push('\n');
            caption.push_str(&image_url);
        }
        RenderedImage { image_url, caption }
    }
}

pub fn encode_latex(latex: &str) -> String {
    urlencoding::encode(latex).into_owned()
}

pub fn decode_latex(encoded: &str) -> Option<String> {
    urlencoding::decode(encoded).ok().map(|s| s.into_owned())
}
