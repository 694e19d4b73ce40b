//! Helpers for reading and editing parsed documents.
//!
//! Documents are parsed once with [`scraper`]. Edits are expressed as a
//! [`Rewriter`]: a list of [`Rewrite`]s keyed by element which is applied to
//! a clone of the parsed tree, so the original document can be rendered again
//! with different edits. The edited tree is serialized by html5ever through
//! [`Html::html`].

use ego_tree::{NodeId, NodeRef, Tree};
use html5ever::tendril::StrTendril;
use html5ever::{LocalName, Namespace, QualName};
use pulldown_cmark::escape::escape_html;
use scraper::node::Element;
use scraper::{ElementRef, Html, Node};

/// Escapes `s` for use in text content or a double-quoted attribute value.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let _ = escape_html(&mut out, s);
    out
}

/// Every element in the subtree rooted at `root` (including `root`), in
/// document order.
pub fn elements<'a>(root: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    root.descendants().filter_map(ElementRef::wrap)
}

/// Every element in `document`, in document order.
pub fn document_elements(document: &Html) -> impl Iterator<Item = ElementRef<'_>> {
    elements(document.root_element())
}

/// Returns true if `element` is a `name` tag carrying the class `class`.
pub fn is_tag_with_class(element: &ElementRef, name: &str, class: &str) -> bool {
    element.value().name() == name && element.value().classes().any(|c| c == class)
}

/// The concatenated text content of `element`, trimmed.
pub fn text(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_owned()
}

/// An edit applied to one element. Markup arguments are parsed as HTML
/// fragments.
#[derive(Clone, Debug)]
pub enum Rewrite {
    /// Drop the element and its subtree.
    Remove,

    /// Keep the element but replace its children with the given markup.
    ReplaceChildren(String),

    /// Insert the given markup after the element's last child.
    Append(String),

    /// Set (`Some`) or remove (`None`) an attribute on the element.
    SetAttribute(String, Option<String>),
}

/// Collects [`Rewrite`]s and renders a document with them applied.
#[derive(Default)]
pub struct Rewriter {
    edits: Vec<(NodeId, Rewrite)>,
}

impl Rewriter {
    pub fn new() -> Rewriter {
        Rewriter::default()
    }

    /// Registers `rewrite` for `element`. Rewrites are applied in the order
    /// they were added; edits inside a removed or replaced subtree have no
    /// effect on the output.
    pub fn add(&mut self, element: ElementRef, rewrite: Rewrite) -> &mut Rewriter {
        self.edits.push((element.id(), rewrite));
        self
    }

    /// Serializes `document` with every registered rewrite applied.
    /// `document` itself is left as it was.
    pub fn render(&self, document: &Html) -> String {
        let mut document = document.clone();
        for (id, rewrite) in self.edits.iter() {
            apply(&mut document.tree, *id, rewrite);
        }
        let mut out = document.html();
        restore_doctype(&document, &mut out);
        out
    }
}

fn apply(tree: &mut Tree<Node>, id: NodeId, rewrite: &Rewrite) {
    match rewrite {
        Rewrite::Remove => {
            if let Some(mut node) = tree.get_mut(id) {
                node.detach();
            }
        }
        Rewrite::ReplaceChildren(markup) => {
            let children: Vec<NodeId> = match tree.get(id) {
                Some(node) => node.children().map(|child| child.id()).collect(),
                None => return,
            };
            for child in children {
                if let Some(mut child) = tree.get_mut(child) {
                    child.detach();
                }
            }
            graft(tree, id, markup);
        }
        Rewrite::Append(markup) => graft(tree, id, markup),
        Rewrite::SetAttribute(key, value) => {
            if let Some(mut node) = tree.get_mut(id) {
                if let Node::Element(element) = node.value() {
                    set_attribute(element, key, value.as_deref());
                }
            }
        }
    }
}

/// Parses `markup` as a fragment and appends copies of its nodes to
/// `parent`.
fn graft(tree: &mut Tree<Node>, parent: NodeId, markup: &str) {
    let fragment = Html::parse_fragment(markup);
    copy_children(tree, parent, *fragment.root_element());
}

fn copy_children(tree: &mut Tree<Node>, parent: NodeId, source: NodeRef<Node>) {
    for child in source.children() {
        let id = match tree.get_mut(parent) {
            Some(mut parent) => parent.append(child.value().clone()).id(),
            None => return,
        };
        copy_children(tree, id, child);
    }
}

/// Sets or removes the un-namespaced attribute `key`. An existing attribute
/// keeps its position.
fn set_attribute(element: &mut Element, key: &str, value: Option<&str>) {
    match value {
        Some(value) => {
            let existing = element
                .attrs
                .iter_mut()
                .find(|(name, _)| name.ns.is_empty() && &*name.local == key);
            match existing {
                Some((_, existing)) => *existing = StrTendril::from_slice(value),
                None => {
                    element.attrs.insert(
                        QualName::new(None, Namespace::from(""), LocalName::from(key)),
                        StrTendril::from_slice(value),
                    );
                }
            }
        }
        None => element
            .attrs
            .retain(|name, _| !(name.ns.is_empty() && &*name.local == key)),
    }
}

/// html5ever writes a doctype as `<!DOCTYPE name>`; put back the public and
/// system identifiers the document was parsed with.
fn restore_doctype(document: &Html, out: &mut String) {
    let doctype = document.tree.root().children().find_map(|node| match node.value() {
        Node::Doctype(doctype) => Some(doctype),
        _ => None,
    });
    let doctype = match doctype {
        Some(doctype) if !doctype.public_id().is_empty() || !doctype.system_id().is_empty() => {
            doctype
        }
        _ => return,
    };

    let short = format!("<!DOCTYPE {}>", doctype.name());
    if !out.starts_with(&short) {
        return;
    }
    let mut full = format!("<!DOCTYPE {}", doctype.name());
    match doctype.public_id().is_empty() {
        false => {
            full.push_str(&format!(" PUBLIC \"{}\"", doctype.public_id()));
            if !doctype.system_id().is_empty() {
                full.push_str(&format!(" \"{}\"", doctype.system_id()));
            }
        }
        true => full.push_str(&format!(" SYSTEM \"{}\"", doctype.system_id())),
    }
    full.push('>');
    out.replace_range(..short.len(), &full);
}
