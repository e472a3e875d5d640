//! A small owned XML element tree.
//!
//! Elements are serialized with [`quick_xml`] and can be canonicalized according to
//! [Canonical XML 1.0] (inclusive, without comments), which is what EBICS authentication
//! signatures are calculated over.
//!
//! Names are kept verbatim, so prefixed names such as `ds:SignedInfo` and namespace declarations
//! such as `xmlns:ds` are regular names and attributes of an [`Element`].
//!
//! [Canonical XML 1.0]: https://www.w3.org/TR/2001/REC-xml-c14n-20010315

use std::{borrow::Cow, collections::BTreeMap};

use quick_xml::{
    Writer,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event, attributes::Attribute},
    name::QName,
};

/// The EBICS H004 namespace.
pub const EBICS_NAMESPACE: &str = "urn:org:ebics:H004";

/// The XML digital signature namespace.
pub const XMLDSIG_NAMESPACE: &str = "http://www.w3.org/2000/09/xmldsig#";

/// The namespace of EBICS signature order data.
pub const SIGNATURE_NAMESPACE: &str = "http://www.ebics.org/S001";

/// The name of the default namespace declaration attribute.
const DEFAULT_NAMESPACE_DECLARATION: &str = "xmlns";

/// An error that may occur when serializing XML.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An XML event can not be written.
    #[error("Writing XML failed while {context}: {source}")]
    Write {
        /// The context in which the error occurred.
        ///
        /// This is meant to complete the sentence "Writing XML failed while ".
        context: &'static str,
        /// The error source.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The serialized XML is not valid UTF-8.
    #[error("Serialized XML is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// A child node of an [`Element`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Node {
    /// A child element.
    Element(Element),
    /// Character data.
    Text(String),
}

/// An XML element with attributes and child nodes.
///
/// # Examples
///
/// ```
/// use ebics_client::xml::Element;
///
/// let element = Element::new("OrderDetails")
///     .with_child(Element::new("OrderType").with_text("HPD"))
///     .with_child(Element::new("StandardOrderParams"));
///
/// assert_eq!(
///     element.canonicalize(),
///     "<OrderDetails><OrderType>HPD</OrderType><StandardOrderParams></StandardOrderParams></OrderDetails>"
/// );
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

/// Namespace declarations in scope, keyed by declaration attribute name (`xmlns`, `xmlns:ds`).
type Namespaces = BTreeMap<String, String>;

fn is_namespace_declaration(name: &str) -> bool {
    name == DEFAULT_NAMESPACE_DECLARATION || name.starts_with("xmlns:")
}

impl Element {
    /// Creates a new [`Element`] without attributes and children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Adds (or replaces) the attribute `name`.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Adds a child element.
    pub fn with_child(mut self, child: Element) -> Self {
        self.push_child(child);
        self
    }

    /// Adds several child elements.
    pub fn with_children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children
            .extend(children.into_iter().map(Node::Element));
        self
    }

    /// Adds character data.
    ///
    /// Empty text is not added, so that an element without content stays empty.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        if !text.is_empty() {
            self.children.push(Node::Text(text));
        }
        self
    }

    /// Sets the attribute `name` to `value`, replacing a previous value.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .attributes
            .iter_mut()
            .find(|(existing, _)| *existing == name)
        {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Appends a child element.
    pub fn push_child(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    /// Inserts a child element at `index` of the child nodes.
    ///
    /// If `index` is past the last child node, the element is appended.
    pub fn insert_child(&mut self, index: usize, child: Element) {
        let index = index.min(self.children.len());
        self.children.insert(index, Node::Element(child));
    }

    /// Returns the name of the element.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the value of the attribute `name`, if any.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns all child nodes.
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Returns an iterator over all child elements.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// Returns the first child element called `name`.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.child_elements().find(|element| element.name == name)
    }

    /// Returns the concatenated character data of the element's direct text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(text) => Some(text.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    /// Returns the namespace declarations (`xmlns` and `xmlns:*` attributes) of the element.
    pub fn namespace_declarations(&self) -> Vec<(String, String)> {
        self.attributes
            .iter()
            .filter(|(name, _)| is_namespace_declaration(name))
            .cloned()
            .collect()
    }

    /// Serializes the element as XML document with an XML declaration.
    ///
    /// Elements without children are written as empty element tags.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn to_xml(&self) -> Result<String, Error> {
        let mut writer = Writer::new(Vec::new());
        write_event(
            &mut writer,
            Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
            "writing the XML declaration",
        )?;
        write_event(
            &mut writer,
            Event::Text(BytesText::from_escaped("\n")),
            "writing the XML declaration",
        )?;
        self.write(&mut writer)?;
        Ok(String::from_utf8(writer.into_inner())?)
    }

    fn write(&self, writer: &mut Writer<Vec<u8>>) -> Result<(), Error> {
        let mut start = BytesStart::new(self.name.as_str());
        for (name, value) in &self.attributes {
            start.push_attribute(Attribute {
                key: QName(name.as_bytes()),
                value: Cow::Owned(escape_attribute(value).into_bytes()),
            });
        }

        if self.children.is_empty() {
            return write_event(writer, Event::Empty(start), "writing an empty element");
        }

        write_event(writer, Event::Start(start), "writing a start tag")?;
        for child in &self.children {
            match child {
                Node::Element(element) => element.write(writer)?,
                Node::Text(text) => write_event(
                    writer,
                    Event::Text(BytesText::from_escaped(escape_text(text))),
                    "writing text",
                )?,
            }
        }
        write_event(
            writer,
            Event::End(BytesEnd::new(self.name.as_str())),
            "writing an end tag",
        )
    }

    /// Returns the canonical form of the element as document element.
    pub fn canonicalize(&self) -> String {
        self.canonicalize_in(&[])
    }

    /// Returns the canonical form of the element, as if it were placed below ancestors that
    /// declare the namespaces in `inherited`.
    ///
    /// All namespace declarations in scope are rendered on the element itself.
    pub fn canonicalize_in(&self, inherited: &[(String, String)]) -> String {
        let scope: Namespaces = inherited.iter().cloned().collect();
        let mut output = String::new();
        self.write_canonical(&scope, &Namespaces::new(), &mut output);
        output
    }

    /// Returns the canonical forms of all elements (including this one) in document order whose
    /// attribute `name` equals `value`.
    pub fn canonicalize_where(&self, name: &str, value: &str) -> Vec<String> {
        let mut output = Vec::new();
        self.collect_canonical(&Namespaces::new(), name, value, &mut output);
        output
    }

    fn collect_canonical(
        &self,
        parent_scope: &Namespaces,
        name: &str,
        value: &str,
        output: &mut Vec<String>,
    ) {
        if self.attribute(name) == Some(value) {
            let mut canonical = String::new();
            self.write_canonical(parent_scope, &Namespaces::new(), &mut canonical);
            output.push(canonical);
        }
        let scope = self.scope(parent_scope);
        for child in self.child_elements() {
            child.collect_canonical(&scope, name, value, output);
        }
    }

    /// Returns the namespaces in scope for the element.
    fn scope(&self, parent_scope: &Namespaces) -> Namespaces {
        let mut scope = parent_scope.clone();
        scope.extend(self.namespace_declarations());
        scope
    }

    /// Writes the canonical form of the element.
    ///
    /// `rendered` holds the namespace declarations already rendered by output ancestors.
    fn write_canonical(&self, parent_scope: &Namespaces, rendered: &Namespaces, output: &mut String) {
        let scope = self.scope(parent_scope);

        output.push('<');
        output.push_str(&self.name);
        for (name, value) in &scope {
            if rendered.get(name) == Some(value) {
                continue;
            }
            // an empty default namespace is only rendered to undeclare a rendered one
            if name == DEFAULT_NAMESPACE_DECLARATION
                && value.is_empty()
                && rendered
                    .get(DEFAULT_NAMESPACE_DECLARATION)
                    .is_none_or(String::is_empty)
            {
                continue;
            }
            push_canonical_attribute(output, name, value);
        }

        let mut attributes: Vec<&(String, String)> = self
            .attributes
            .iter()
            .filter(|(name, _)| !is_namespace_declaration(name))
            .collect();
        attributes.sort_by(|(left, _), (right, _)| {
            attribute_sort_key(left, &scope).cmp(&attribute_sort_key(right, &scope))
        });
        for (name, value) in attributes {
            push_canonical_attribute(output, name, value);
        }
        output.push('>');

        for child in &self.children {
            match child {
                Node::Element(element) => element.write_canonical(&scope, &scope, output),
                Node::Text(text) => output.push_str(&escape_text(text)),
            }
        }

        output.push_str("</");
        output.push_str(&self.name);
        output.push('>');
    }
}

fn write_event(
    writer: &mut Writer<Vec<u8>>,
    event: Event<'_>,
    context: &'static str,
) -> Result<(), Error> {
    writer.write_event(event).map_err(|source| Error::Write {
        context,
        source: Box::new(source),
    })
}

/// Returns the key attributes are ordered by: namespace URI first, then local name.
fn attribute_sort_key<'a>(name: &'a str, scope: &'a Namespaces) -> (&'a str, &'a str) {
    match name.split_once(':') {
        Some((prefix, local_name)) => (
            scope
                .get(&format!("xmlns:{prefix}"))
                .map(String::as_str)
                .unwrap_or_default(),
            local_name,
        ),
        None => ("", name),
    }
}

fn push_canonical_attribute(output: &mut String, name: &str, value: &str) {
    output.push(' ');
    output.push_str(name);
    output.push_str("=\"");
    output.push_str(&escape_attribute(value));
    output.push('"');
}

/// Escapes character data.
fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for character in text.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '\r' => escaped.push_str("&#xD;"),
            _ => escaped.push(character),
        }
    }
    escaped
}

/// Escapes an attribute value.
fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for character in value.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '"' => escaped.push_str("&quot;"),
            '\t' => escaped.push_str("&#x9;"),
            '\n' => escaped.push_str("&#xA;"),
            '\r' => escaped.push_str("&#xD;"),
            _ => escaped.push(character),
        }
    }
    escaped
}
