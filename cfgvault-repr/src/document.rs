use crate::{Element, ReprError, Result, ROOT_ELEMENT};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::fs;
use std::path::Path;

const INDENT: usize = 2;

/// A whole exported profile: one `configuration` root element, stored as XML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    root: Element,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            root: Element::new(ROOT_ELEMENT),
        }
    }

    /// Wrap an existing tree. Fails when the top element is not the
    /// document root.
    pub fn from_root(root: Element) -> Result<Self> {
        if root.name != ROOT_ELEMENT {
            return Err(ReprError::MissingRoot);
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    pub fn into_root(self) -> Element {
        self.root
    }

    pub fn version(&self) -> Option<&str> {
        self.root.attr("version")
    }

    pub fn set_version(&mut self, major: u32, minor: u32, patch: u32) {
        self.root
            .set_attr("version", format!("{}.{}.{}", major, minor, patch));
    }

    /// Parse XML text. Text content and comments are ignored; only elements
    /// and their attributes make up the tree.
    pub fn parse(text: &str) -> Result<Self> {
        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text(true);

        let mut open: Vec<Element> = Vec::new();
        let mut root = None;
        loop {
            let event = reader.read_event().map_err(|err| {
                ReprError::Parse(format!("{} at byte {}", err, reader.error_position()))
            })?;
            match event {
                Event::Start(start) => open.push(element_of(&start)?),
                Event::Empty(start) => {
                    let element = element_of(&start)?;
                    close(&mut open, &mut root, element)?;
                }
                Event::End(_) => match open.pop() {
                    Some(element) => close(&mut open, &mut root, element)?,
                    None => return Err(ReprError::Parse("unexpected closing tag".to_string())),
                },
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(unclosed) = open.last() {
            return Err(ReprError::Parse(format!("element <{}> is not closed", unclosed.name)));
        }
        root.map_or(Err(ReprError::MissingRoot), Self::from_root)
    }

    pub fn to_pretty_string(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        write_element(&mut writer, &self.root)?;

        let mut text = String::from_utf8(writer.into_inner())
            .map_err(|err| ReprError::Parse(err.to_string()))?;
        text.push('\n');
        Ok(text)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ReprError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = self.to_pretty_string()?;
        fs::write(path, text).map_err(|source| ReprError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn element_of(start: &BytesStart<'_>) -> Result<Element> {
    let mut element = Element::new(utf8(start.name().as_ref())?);
    for attr in start.attributes() {
        let attr = attr.map_err(|err| ReprError::Parse(err.to_string()))?;
        let value = attr
            .unescape_value()
            .map_err(|err| ReprError::Parse(err.to_string()))?;
        element.set_attr(utf8(attr.key.as_ref())?, value.into_owned());
    }
    Ok(element)
}

/// Attach a finished element to its parent, or make it the root.
fn close(open: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    match open.last_mut() {
        Some(parent) => parent.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(ReprError::Parse("more than one top-level element".to_string())),
    }
    Ok(())
}

fn utf8(bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|err| ReprError::Parse(err.to_string()))
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (name, value) in &element.attributes {
        start.push_attribute((name.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }
    writer.write_event(Event::Start(start))?;
    for child in &element.children {
        write_element(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
    Ok(())
}
