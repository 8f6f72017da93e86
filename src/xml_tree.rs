//! Minimal namespace-aware element tree built on `quick_xml`.
//!
//! The GPX reader walks this tree once and turns it into plain values, so the
//! tree never outlives a single read call.

use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;

use crate::error::TrackError;

#[derive(Debug, Clone, Default)]
pub(crate) struct XmlElement {
    pub namespace: Option<String>,
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    /// `{namespace}name`, the same notation ElementTree-style tools print.
    pub fn qualified_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{{{}}}{}", ns, self.name),
            None => self.name.clone(),
        }
    }

    pub fn is(&self, namespace: &str, name: &str) -> bool {
        self.name == name && self.namespace.as_deref() == Some(namespace)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn find<'a>(&'a self, namespace: &str, name: &str) -> Option<&'a XmlElement> {
        self.children.iter().find(|child| child.is(namespace, name))
    }

    pub fn find_all<'a>(
        &'a self,
        namespace: &'a str,
        name: &'a str,
    ) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |child| child.is(namespace, name))
    }

    /// Depth-first visit of every element without element children.
    pub fn leaves(&self) -> Vec<&XmlElement> {
        let mut leaves = Vec::new();
        for child in &self.children {
            if child.children.is_empty() {
                leaves.push(child);
            } else {
                leaves.extend(child.leaves());
            }
        }
        leaves
    }
}

/// Parse a whole document and return its root element, or `None` when the
/// input holds no element at all.
pub(crate) fn parse_tree<R: BufRead>(reader: R) -> Result<Option<XmlElement>, TrackError> {
    let mut reader = NsReader::from_reader(reader);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let (namespace, event) = reader.read_resolved_event_into(&mut buf)?;
        let namespace = resolved_namespace(namespace);

        match event {
            Event::Start(start) => {
                stack.push(start_element(namespace, &start)?);
            }
            Event::Empty(start) => {
                let element = start_element(namespace, &start)?;
                attach(&mut stack, &mut root, element);
            }
            Event::End(_) => {
                if let Some(element) = stack.pop() {
                    attach(&mut stack, &mut root, element);
                }
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    let content = std::str::from_utf8(&data).map_err(|e| {
                        TrackError::InvalidDocument(format!(
                            "CDATA inside <{}> is not valid UTF-8: {}",
                            current.name, e
                        ))
                    })?;
                    current.text.push_str(content);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(TrackError::InvalidDocument(format!(
            "unexpected end of document inside <{}>",
            open.name
        )));
    }

    Ok(root)
}

fn resolved_namespace(result: ResolveResult) -> Option<String> {
    match result {
        ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.as_ref()).into_owned()),
        _ => None,
    }
}

fn start_element(namespace: Option<String>, start: &BytesStart) -> Result<XmlElement, TrackError> {
    let mut attributes = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute.map_err(quick_xml::Error::from)?;
        if attribute.key.as_namespace_binding().is_some() {
            continue;
        }
        let key = String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned();
        let value = attribute.unescape_value()?.into_owned();
        attributes.push((key, value));
    }

    Ok(XmlElement {
        namespace,
        name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
        attributes,
        text: String::new(),
        children: Vec::new(),
    })
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            // Only the first top-level element counts as the root
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}
