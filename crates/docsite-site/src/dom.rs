//! Small helpers over the `markup5ever_rcdom` document tree.

use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::{ElementFlags, NodeOrText, TreeSink};
use html5ever::{
    Attribute, LocalName, ParseOpts, QualName, namespace_url, ns, parse_document, serialize,
};
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};

/// Parse a complete HTML document.
pub(crate) fn parse(html: &str) -> RcDom {
    parse_document(RcDom::default(), ParseOpts::default()).one(html)
}

/// Serialize a document back to HTML.
pub(crate) fn to_html(dom: &RcDom) -> std::io::Result<String> {
    let document: SerializableHandle = dom.document.clone().into();
    let mut bytes = Vec::new();
    serialize(&mut bytes, &document, serialize::SerializeOpts::default())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// All nodes below `handle` in document order, `handle` included.
pub(crate) fn descendants(handle: &Handle) -> Vec<Handle> {
    let mut result = Vec::new();
    let mut stack = vec![handle.clone()];
    while let Some(node) = stack.pop() {
        stack.extend(node.children.borrow().iter().rev().cloned());
        result.push(node);
    }
    result
}

/// Elements named `tag` below `handle` in document order.
pub(crate) fn elements(handle: &Handle, tag: &str) -> Vec<Handle> {
    descendants(handle)
        .into_iter()
        .filter(|node| is_element(node, tag))
        .collect()
}

pub(crate) fn is_element(handle: &Handle, tag: &str) -> bool {
    matches!(&handle.data, NodeData::Element { name, .. } if &*name.local == tag)
}

pub(crate) fn attr(handle: &Handle, attr: &str) -> Option<String> {
    match &handle.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|a| &*a.name.local == attr)
            .map(|a| a.value.to_string()),
        _ => None,
    }
}

pub(crate) fn set_attr(handle: &Handle, attr: &str, value: String) {
    if let NodeData::Element { attrs, .. } = &handle.data {
        let mut attrs = attrs.borrow_mut();
        if let Some(existing) = attrs.iter_mut().find(|a| &*a.name.local == attr) {
            existing.value = value.into();
        } else {
            attrs.push(Attribute {
                name: QualName::new(None, ns!(), LocalName::from(attr)),
                value: value.into(),
            });
        }
    }
}

pub(crate) fn has_class(handle: &Handle, class: &str) -> bool {
    attr(handle, "class").is_some_and(|c| c.split_whitespace().any(|c| c == class))
}

/// Append `class` to the element's class list unless already present.
pub(crate) fn add_class(handle: &Handle, class: &str) {
    let value = match attr(handle, "class") {
        Some(current) if current.split_whitespace().any(|c| c == class) => return,
        Some(current) if !current.trim().is_empty() => format!("{} {class}", current.trim()),
        _ => class.to_owned(),
    };
    set_attr(handle, "class", value);
}

pub(crate) fn parent(handle: &Handle) -> Option<Handle> {
    let weak = handle.parent.take();
    let parent = weak.as_ref().and_then(std::rc::Weak::upgrade);
    handle.parent.set(weak);
    parent
}

/// Concatenated text of all text nodes below `handle`.
pub(crate) fn text_content(handle: &Handle) -> String {
    let mut text = String::new();
    for node in descendants(handle) {
        if let NodeData::Text { contents } = &node.data {
            text.push_str(&contents.borrow());
        }
    }
    text
}

/// Create a detached HTML element.
pub(crate) fn new_element(dom: &mut RcDom, tag: &str, attrs: &[(&str, &str)]) -> Handle {
    let attrs = attrs
        .iter()
        .map(|(name, value)| Attribute {
            name: QualName::new(None, ns!(), LocalName::from(*name)),
            value: (*value).into(),
        })
        .collect();
    dom.create_element(
        QualName::new(None, ns!(html), LocalName::from(tag)),
        attrs,
        ElementFlags::default(),
    )
}

/// Move `child` to the front of `parent`'s children.
pub(crate) fn prepend(dom: &mut RcDom, parent: &Handle, child: Handle) {
    dom.remove_from_parent(&child);
    let first = parent.children.borrow().first().cloned();
    match first {
        Some(first) => dom.append_before_sibling(&first, NodeOrText::AppendNode(child)),
        None => dom.append(parent, NodeOrText::AppendNode(child)),
    }
}

/// Move `child` in front of `sibling`.
pub(crate) fn insert_before(dom: &mut RcDom, sibling: &Handle, child: Handle) {
    dom.remove_from_parent(&child);
    dom.append_before_sibling(sibling, NodeOrText::AppendNode(child));
}

pub(crate) fn append_text(dom: &mut RcDom, parent: &Handle, text: &str) {
    dom.append(parent, NodeOrText::AppendText(text.into()));
}

/// Move `child` to the end of `parent`'s children.
pub(crate) fn append(dom: &mut RcDom, parent: &Handle, child: Handle) {
    dom.remove_from_parent(&child);
    dom.append(parent, NodeOrText::AppendNode(child));
}

/// Lazy iterator over `(heading text, id)` pairs of one heading level.
///
/// Headings without an `id` attribute are skipped.
pub struct Headings {
    // Dropping the document detaches every descendant, so it lives as long
    // as the walk.
    _dom: RcDom,
    stack: Vec<Handle>,
    tag: LocalName,
}

impl Headings {
    pub(crate) fn new(html: &str, level: u8) -> Self {
        let dom = parse(html);
        Self {
            stack: vec![dom.document.clone()],
            _dom: dom,
            tag: LocalName::from(format!("h{level}")),
        }
    }
}

impl Iterator for Headings {
    type Item = (String, String);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            self.stack
                .extend(node.children.borrow().iter().rev().cloned());
            if let NodeData::Element { name, attrs, .. } = &node.data
                && name.local == self.tag
            {
                let id = attrs
                    .borrow()
                    .iter()
                    .find(|a| &*a.name.local == "id")
                    .map(|a| a.value.to_string());
                if let Some(id) = id {
                    return Some((text_content(&node), id));
                }
            }
        }
        None
    }
}
