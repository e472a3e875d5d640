//! XML documents built for EBICS orders.

use crate::{OrderType, xml::{self, Element}};

/// A complete EBICS request.
///
/// Requests are created by a [`RequestBuilder`][`crate::RequestBuilder`] and owned by the
/// caller, which serializes them with [`Request::to_xml`] for transport.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Request {
    order_type: OrderType,
    root: Element,
}

impl Request {
    /// Creates a new [`Request`] for `order_type` from its document element.
    pub fn new(order_type: OrderType, root: Element) -> Self {
        Self { order_type, root }
    }

    /// Returns the order type of the request.
    pub fn order_type(&self) -> OrderType {
        self.order_type
    }

    /// Returns the document element.
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Returns the document element, consuming the request.
    pub fn into_root(self) -> Element {
        self.root
    }

    /// Serializes the request as XML document.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_xml(&self) -> Result<String, xml::Error> {
        self.root.to_xml()
    }
}

/// Order data sent within an EBICS request, such as the keys transmitted with `HIA`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OrderData {
    root: Element,
}

impl OrderData {
    /// Creates new [`OrderData`] from its document element.
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    /// Returns the document element.
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Returns the document element, consuming the order data.
    pub fn into_root(self) -> Element {
        self.root
    }

    /// Serializes the order data as XML document.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_xml(&self) -> Result<String, xml::Error> {
        self.root.to_xml()
    }
}
