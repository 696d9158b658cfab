//! XML document loading
//!
//! Reads a whole XML document into an owned element tree with quick-xml.
//! Element names keep their namespace prefix; [`local_name`] strips it for
//! matching against the city-model vocabularies.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A parsed XML element with its attributes, text and children
#[derive(Debug, Clone, Default)]
pub struct XmlNode {
    /// Qualified element name (e.g. `gml:posList`)
    pub name: String,
    /// Map of qualified attribute names to unescaped values
    pub attributes: HashMap<String, String>,
    /// Text content of this element; separate text chunks are joined by a space
    pub text_content: String,
    /// Child elements in document order
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    /// Element name with any namespace prefix removed
    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    /// Attribute lookup by local name (`gml:id` matches `id`)
    pub fn attribute_local(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| local_name(key) == local)
            .map(|(_, value)| value.as_str())
    }

    /// First direct child with the given local name
    pub fn child_local(&self, local: &str) -> Option<&XmlNode> {
        self.children.iter().find(|child| child.local_name() == local)
    }
}

/// Strip a namespace prefix: everything up to and including the first colon
pub fn local_name(name: &str) -> &str {
    match name.split_once(':') {
        Some((_, local)) => local,
        None => name,
    }
}

/// Parses an XML file and returns the root element
///
/// # Arguments
/// * `path` - The file path to the XML file to parse
///
/// # Returns
/// * `Result<XmlNode>` - The parsed XML tree or an error
pub fn parse_xml_file<P: AsRef<Path>>(path: P) -> anyhow::Result<XmlNode> {
    let file = File::open(path.as_ref())
        .map_err(|e| anyhow::anyhow!("Failed to open file {}: {}", path.as_ref().display(), e))?;

    // Buffered reads matter for large city models
    parse_xml_reader(BufReader::new(file))
}

/// Parses an in-memory XML document
pub fn parse_xml_str(content: &str) -> anyhow::Result<XmlNode> {
    parse_xml_reader(content.as_bytes())
}

/// Parses an XML document from any buffered reader
pub fn parse_xml_reader<R: BufRead>(source: R) -> anyhow::Result<XmlNode> {
    let mut reader = Reader::from_reader(source);
    reader.trim_text(true);

    let mut buf = Vec::new();

    loop {
        buf.clear();
        let event = reader.read_event_into(&mut buf)?;
        let maybe_root = match event {
            Event::Start(start) => Some((start.into_owned(), false)),
            Event::Empty(start) => Some((start.into_owned(), true)),
            Event::Eof => {
                anyhow::bail!("XML document is empty");
            }
            _ => None,
        };

        if let Some((start, self_closing)) = maybe_root {
            let mut node_buf = Vec::new();
            let root = parse_node(&mut reader, &mut node_buf, start, self_closing)?;
            ensure_document_end(&mut reader, &root)?;
            return Ok(root);
        }
    }
}

/// Only comments, processing instructions and whitespace may follow the root
fn ensure_document_end<R: BufRead>(reader: &mut Reader<R>, root: &XmlNode) -> anyhow::Result<()> {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Eof => return Ok(()),
            Event::Comment(_) | Event::PI(_) => {}
            Event::Text(text) if text.iter().all(u8::is_ascii_whitespace) => {}
            Event::Start(start) | Event::Empty(start) => anyhow::bail!(
                "unexpected element '<{}>' after root element '{}'",
                String::from_utf8_lossy(start.name().as_ref()),
                root.name
            ),
            Event::End(end) => anyhow::bail!(
                "unexpected closing tag '</{}>' after root element '{}'",
                String::from_utf8_lossy(end.name().as_ref()),
                root.name
            ),
            _ => anyhow::bail!("unexpected content after root element '{}'", root.name),
        }
    }
}

fn parse_node<R: BufRead>(
    reader: &mut Reader<R>,
    buf: &mut Vec<u8>,
    start: BytesStart<'static>,
    self_closing: bool,
) -> anyhow::Result<XmlNode> {
    let element_name_bytes = start.name().as_ref().to_vec();
    let element_name = String::from_utf8_lossy(&element_name_bytes).to_string();
    let attributes = collect_attributes(&start)?;

    let mut node = XmlNode {
        name: element_name,
        attributes,
        text_content: String::new(),
        children: Vec::new(),
    };

    if self_closing {
        return Ok(node);
    }

    loop {
        buf.clear();
        let event = reader.read_event_into(buf)?;
        match event {
            Event::Start(child_start) => {
                let mut child_buf = Vec::new();
                let child = parse_node(reader, &mut child_buf, child_start.into_owned(), false)?;
                node.children.push(child);
            }
            Event::Empty(child_start) => {
                let mut child_buf = Vec::new();
                let child = parse_node(reader, &mut child_buf, child_start.into_owned(), true)?;
                node.children.push(child);
            }
            Event::Text(text) => {
                let value = text.unescape()?;
                push_text(&mut node.text_content, &value);
            }
            Event::CData(text) => {
                let value = String::from_utf8_lossy(text.as_ref()).to_string();
                push_text(&mut node.text_content, &value);
            }
            Event::End(end) => {
                anyhow::ensure!(
                    end.name().as_ref() == element_name_bytes.as_slice(),
                    "unexpected closing tag '</{}>' while parsing '<{}>'",
                    String::from_utf8_lossy(end.name().as_ref()),
                    node.name
                );
                return Ok(node);
            }
            Event::Eof => {
                anyhow::bail!("unexpected end of file while parsing element '{}'", node.name);
            }
            _ => {}
        }
    }
}

fn push_text(content: &mut String, value: &str) {
    let value = value.trim();
    if value.is_empty() {
        return;
    }
    if !content.is_empty() {
        content.push(' ');
    }
    content.push_str(value);
}

fn collect_attributes(start: &BytesStart<'_>) -> anyhow::Result<HashMap<String, String>> {
    let mut map = HashMap::new();
    for attr in start.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr.unescape_value()?.to_string();
        map.insert(key, value);
    }
    Ok(map)
}
