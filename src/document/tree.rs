use serde::{Deserialize, Serialize};

/// Inline emphasis carried through from the markup converter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarkStyle {
    Bold,
    Italic,
    Underline,
    Highlight,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub src: String,
    pub alt: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl Image {
    pub fn new(src: impl Into<String>, alt: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            alt: alt.into(),
            width: None,
            height: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Inline {
    Text(String),
    Code(String),
    Strike(Vec<Inline>),
    Mark(MarkStyle, Vec<Inline>),
    Link { href: String, content: Vec<Inline> },
    Image(Image),
    LineBreak,
}

impl Inline {
    pub fn text(text: impl Into<String>) -> Self {
        Inline::Text(text.into())
    }

    pub fn code(text: impl Into<String>) -> Self {
        Inline::Code(text.into())
    }

    pub fn strike(content: Vec<Inline>) -> Self {
        Inline::Strike(content)
    }

    pub fn mark(style: MarkStyle, content: Vec<Inline>) -> Self {
        Inline::Mark(style, content)
    }

    pub fn link(href: impl Into<String>, content: Vec<Inline>) -> Self {
        Inline::Link {
            href: href.into(),
            content,
        }
    }

    /// Nested inline content for wrapping variants.
    pub fn children(&self) -> Option<&Vec<Inline>> {
        match self {
            Inline::Strike(content) | Inline::Mark(_, content) | Inline::Link { content, .. } => {
                Some(content)
            }
            _ => None,
        }
    }
}

/// Table payload. Its internals belong to the table collaborator; the core
/// only moves the block around as a whole.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub rows: Vec<Vec<String>>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkbox {
    pub checked: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    pub checkbox: Option<Checkbox>,
    pub content: Vec<Inline>,
    pub nested: Option<List>,
    pub preserve_empty: bool,
}

impl ListItem {
    pub fn new(text: &str) -> Self {
        Self {
            checkbox: None,
            content: text_content(text),
            nested: None,
            preserve_empty: false,
        }
    }

    pub fn empty() -> Self {
        Self::new("")
    }

    pub fn task(checked: bool, text: &str) -> Self {
        Self {
            checkbox: Some(Checkbox { checked }),
            ..Self::new(text)
        }
    }

    pub fn with_content(mut self, content: Vec<Inline>) -> Self {
        self.content = content;
        self.preserve_empty = self.nested.is_some() && !super::inline::has_real_text(&self.content);
        self
    }

    pub fn with_nested(mut self, nested: List) -> Self {
        self.nested = Some(nested);
        self.preserve_empty = !super::inline::has_real_text(&self.content);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct List {
    pub ordered: bool,
    pub items: Vec<ListItem>,
}

impl List {
    pub fn bullet(items: Vec<ListItem>) -> Self {
        Self {
            ordered: false,
            items,
        }
    }

    pub fn numbered(items: Vec<ListItem>) -> Self {
        Self {
            ordered: true,
            items,
        }
    }
}

/// Owned value form of a top-level block, used at the converter boundary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Block {
    Paragraph(Vec<Inline>),
    Heading {
        level: u8,
        content: Vec<Inline>,
    },
    List(List),
    CodeBlock {
        language: Option<String>,
        lines: Vec<String>,
    },
    Blockquote(Vec<Vec<Inline>>),
    Table(Table),
    HorizontalRule,
    Image(Image),
}

impl Block {
    pub fn paragraph(text: &str) -> Self {
        Block::Paragraph(text_content(text))
    }

    pub fn heading(level: u8, text: &str) -> Self {
        Block::Heading {
            level: level.clamp(1, 6),
            content: text_content(text),
        }
    }

    pub fn code(language: Option<&str>, lines: &[&str]) -> Self {
        let mut lines: Vec<String> = lines.iter().map(|line| line.to_string()).collect();
        if lines.is_empty() {
            lines.push(String::new());
        }
        Block::CodeBlock {
            language: language.map(str::to_string),
            lines,
        }
    }

    pub fn quote(paragraphs: &[&str]) -> Self {
        Block::Blockquote(paragraphs.iter().map(|text| text_content(text)).collect())
    }
}

impl From<List> for Block {
    fn from(list: List) -> Self {
        Block::List(list)
    }
}

pub(crate) fn text_content(text: &str) -> Vec<Inline> {
    if text.is_empty() {
        Vec::new()
    } else {
        vec![Inline::Text(text.to_string())]
    }
}
