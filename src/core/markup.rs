//! Record to XML conversion.
//!
//! A record maps onto an element tree: mappings become child elements, sequences
//! become repeated sibling elements sharing the parent's tag, and scalars become
//! text. The same walk backs column extraction in [`MarkupConverter::descendant_texts`],
//! so table columns see exactly the elements the XML output would contain.

use crate::domain::model::Record;
use crate::utils::error::{Result, SosError};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::BTreeSet;

/// Keys dropped from the XML output by default; task status payloads break the tree.
pub const DEFAULT_EXCLUDED_KEYS: &[&str] = &["operationStatus"];

/// Element names cannot be purely numeric, so such keys get this prefix.
pub const NUMERIC_TAG_PREFIX: &str = "mytag_";

const INDENT_WIDTH: usize = 2;

#[derive(Debug, Clone)]
pub struct MarkupOptions {
    excluded_keys: BTreeSet<String>,
    numeric_prefix: String,
}

impl Default for MarkupOptions {
    fn default() -> Self {
        Self {
            excluded_keys: DEFAULT_EXCLUDED_KEYS.iter().map(|k| k.to_string()).collect(),
            numeric_prefix: NUMERIC_TAG_PREFIX.to_string(),
        }
    }
}

impl MarkupOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exclude(mut self, key: impl Into<String>) -> Self {
        self.excluded_keys.insert(key.into());
        self
    }

    pub fn without_exclusions(mut self) -> Self {
        self.excluded_keys.clear();
        self
    }

    pub fn with_numeric_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.numeric_prefix = prefix.into();
        self
    }

    pub fn is_excluded(&self, key: &str) -> bool {
        self.excluded_keys.contains(key)
    }

    /// 將欄位名稱轉成合法的 XML 標籤名稱
    pub fn tag_name<'a>(&self, key: &'a str) -> Cow<'a, str> {
        if !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit()) {
            Cow::Owned(format!("{}{}", self.numeric_prefix, key))
        } else {
            Cow::Borrowed(key)
        }
    }
}

/// Element content. An element holds either child elements or one text leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Empty,
    Text(String),
    Elements(Vec<Element>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub content: Content,
}

impl Element {
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            Content::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn children(&self) -> &[Element] {
        match &self.content {
            Content::Elements(children) => children,
            _ => &[],
        }
    }

    fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let name = self.name.as_str();
        match &self.content {
            Content::Empty => {
                writer
                    .write_event(Event::Empty(BytesStart::new(name)))
                    .map_err(SosError::markup)?;
            }
            Content::Text(text) => {
                writer
                    .write_event(Event::Start(BytesStart::new(name)))
                    .map_err(SosError::markup)?;
                writer
                    .write_event(Event::Text(BytesText::new(text)))
                    .map_err(SosError::markup)?;
                writer
                    .write_event(Event::End(BytesEnd::new(name)))
                    .map_err(SosError::markup)?;
            }
            Content::Elements(children) => {
                writer
                    .write_event(Event::Start(BytesStart::new(name)))
                    .map_err(SosError::markup)?;
                for child in children {
                    child.write_to(writer)?;
                }
                writer
                    .write_event(Event::End(BytesEnd::new(name)))
                    .map_err(SosError::markup)?;
            }
        }
        Ok(())
    }
}

/// A converted record. Documents built from records without exactly one
/// top-level key have no root element.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MarkupDocument {
    root: Option<Element>,
}

impl MarkupDocument {
    pub fn from_root(root: Element) -> Self {
        Self { root: Some(root) }
    }

    pub fn root(&self) -> Option<&Element> {
        self.root.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// XML declaration plus the tree, two-space indented, scalar elements inline.
    pub fn to_pretty_xml(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT_WIDTH);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", None, None)))
            .map_err(SosError::markup)?;
        if let Some(root) = &self.root {
            root.write_to(&mut writer)?;
        }

        let mut xml = String::from_utf8(writer.into_inner()).map_err(SosError::markup)?;
        xml.push('\n');
        Ok(xml)
    }
}

/// Text form of a scalar; `None` for null and containers.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[derive(Debug, Clone, Default)]
pub struct MarkupConverter {
    options: MarkupOptions,
}

impl MarkupConverter {
    pub fn new(options: MarkupOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &MarkupOptions {
        &self.options
    }

    /// 轉換只有一個頂層鍵的結構；鍵名即為根元素
    pub fn document(&self, structure: &Record) -> Result<MarkupDocument> {
        if structure.len() != 1 {
            return Ok(MarkupDocument::default());
        }

        let Some((key, value)) = structure.data.iter().next() else {
            return Ok(MarkupDocument::default());
        };

        // a root sequence expands like any other; a document holds one root at most
        let mut roots = Vec::new();
        self.push_elements(&mut roots, &self.options.tag_name(key), value);
        if roots.len() > 1 {
            return Err(SosError::value(format!(
                "Document root '{}' cannot hold {} elements",
                key,
                roots.len()
            )));
        }

        Ok(roots
            .pop()
            .map(MarkupDocument::from_root)
            .unwrap_or_default())
    }

    /// Wraps `record` under an element called `name`.
    pub fn element(&self, name: &str, record: &Record) -> Element {
        Element {
            name: self.options.tag_name(name).into_owned(),
            content: self.mapping_content(&record.data),
        }
    }

    fn build_content(&self, value: &Value) -> Content {
        match value {
            Value::Object(map) => self.mapping_content(map),
            // sequences never get here, push_elements expands them into siblings
            scalar => match scalar_text(scalar) {
                Some(text) => Content::Text(text),
                None => Content::Empty,
            },
        }
    }

    fn mapping_content(&self, map: &serde_json::Map<String, Value>) -> Content {
        let mut children = Vec::new();
        for (key, value) in map {
            if self.options.is_excluded(key) {
                continue;
            }
            let tag = self.options.tag_name(key);
            self.push_elements(&mut children, &tag, value);
        }

        if children.is_empty() {
            Content::Empty
        } else {
            Content::Elements(children)
        }
    }

    fn push_elements(&self, out: &mut Vec<Element>, tag: &str, value: &Value) {
        match value {
            Value::Array(items) => {
                for item in items {
                    self.push_elements(out, tag, item);
                }
            }
            other => out.push(Element {
                name: tag.to_string(),
                content: self.build_content(other),
            }),
        }
    }

    /// Text of every descendant element named `name`, in document order.
    ///
    /// Elements without a text leaf (nested mappings, empty values) yield an
    /// empty string.
    pub fn descendant_texts(&self, record: &Record, name: &str) -> Vec<String> {
        let mut matches = Vec::new();
        self.collect_in_mapping(&record.data, name, &mut matches);
        matches
            .into_iter()
            .map(|value| scalar_text(value).unwrap_or_default())
            .collect()
    }

    fn collect_in_mapping<'v>(
        &self,
        map: &'v serde_json::Map<String, Value>,
        name: &str,
        out: &mut Vec<&'v Value>,
    ) {
        for (key, value) in map {
            if self.options.is_excluded(key) {
                continue;
            }
            let matched = self.options.tag_name(key) == name;
            self.collect_items(value, matched, name, out);
        }
    }

    fn collect_items<'v>(&self, value: &'v Value, matched: bool, name: &str, out: &mut Vec<&'v Value>) {
        match value {
            Value::Array(items) => {
                for item in items {
                    self.collect_items(item, matched, name, out);
                }
            }
            other => {
                if matched {
                    out.push(other);
                }
                if let Value::Object(map) = other {
                    self.collect_in_mapping(map, name, out);
                }
            }
        }
    }
}

/// Converts a single-key record to pretty XML with the default options.
pub fn dict_to_xml(structure: &Record) -> Result<String> {
    MarkupConverter::default().document(structure)?.to_pretty_xml()
}

/// Re-indents an XML payload returned by the API.
pub fn format_xml(raw: &str) -> Result<String> {
    let mut reader = Reader::from_str(raw);
    reader.config_mut().trim_text(true);

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT_WIDTH);
    loop {
        match reader.read_event().map_err(SosError::markup)? {
            Event::Eof => break,
            event => writer.write_event(event).map_err(SosError::markup)?,
        }
    }

    let mut xml = String::from_utf8(writer.into_inner()).map_err(SosError::markup)?;
    xml.push('\n');
    Ok(xml)
}
