use crate::media::DataUri;
use serde::{Deserialize, Serialize};

/// Kind of content requested from the remote model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Modality {
    Text,
    Image,
    Audio,
}

impl Modality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Text => "TEXT",
            Modality::Image => "IMAGE",
            Modality::Audio => "AUDIO",
        }
    }
}

/// One segment of a prompt: instruction text or an inline media attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptPart {
    Text(String),
    Media(DataUri),
}

impl PromptPart {
    pub fn text(s: impl Into<String>) -> Self {
        PromptPart::Text(s.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PromptPart::Text(s) => Some(s),
            PromptPart::Media(_) => None,
        }
    }
}

/// The fully rendered prompt of one invocation, in order.
///
/// Adjacent text segments are merged on push, so a prompt without media is
/// always a single text part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedPrompt {
    parts: Vec<PromptPart>,
}

impl RenderedPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        let mut prompt = Self::new();
        prompt.push_text(&text.into());
        prompt
    }

    pub fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(PromptPart::Text(last)) = self.parts.last_mut() {
            last.push_str(text);
        } else {
            self.parts.push(PromptPart::Text(text.to_string()));
        }
    }

    pub fn push_media(&mut self, media: DataUri) {
        self.parts.push(PromptPart::Media(media));
    }

    pub fn parts(&self) -> &[PromptPart] {
        &self.parts
    }

    pub fn into_parts(self) -> Vec<PromptPart> {
        self.parts
    }

    /// All text parts concatenated.
    pub fn text(&self) -> String {
        self.parts.iter().filter_map(PromptPart::as_text).collect()
    }

    pub fn media(&self) -> impl Iterator<Item = &DataUri> {
        self.parts.iter().filter_map(|p| match p {
            PromptPart::Media(m) => Some(m),
            PromptPart::Text(_) => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjacent_text_merges() {
        let mut p = RenderedPrompt::new();
        p.push_text("Hello ");
        p.push_text("world");
        p.push_text("");
        assert_eq!(p.parts().len(), 1);
        assert_eq!(p.text(), "Hello world");
    }

    #[test]
    fn test_media_splits_text() {
        let mut p = RenderedPrompt::from_text("Image: ");
        p.push_media(DataUri::new("image/png", "AAAA"));
        p.push_text("\nDescribe it.");
        assert_eq!(p.parts().len(), 3);
        assert_eq!(p.media().count(), 1);
        assert_eq!(p.text(), "Image: \nDescribe it.");
    }

    #[test]
    fn test_modality_serializes_uppercase() {
        let v = serde_json::to_value([Modality::Text, Modality::Image]).unwrap();
        assert_eq!(v, serde_json::json!(["TEXT", "IMAGE"]));
    }
}
