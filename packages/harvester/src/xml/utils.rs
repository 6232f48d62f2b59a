//! Namespaced element lookup on roxmltree DOM trees.
//!
//! Every element of an IERS bulletin lives in a single namespace, so the
//! helpers here match on (namespace, local name) pairs and take paths of
//! local names relative to a starting element.

use roxmltree::Node;

use crate::error::{HarvesterError, Result};

/// Namespace of IERS bulletin XML documents.
pub const IERS_NAMESPACE: &str = "http://www.iers.org/2003/schema/iers";

/// Find the first child element with the given local name in the IERS namespace.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use iers_harvester::xml::find_child;
///
/// let xml = r#"<root xmlns="http://www.iers.org/2003/schema/iers"><version/></root>"#;
/// let doc = Document::parse(xml).unwrap();
///
/// assert!(find_child(doc.root_element(), "version").is_some());
/// assert!(find_child(doc.root_element(), "data").is_none());
/// ```
pub fn find_child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|child| child.is_element() && child.has_tag_name((IERS_NAMESPACE, tag)))
}

/// Find all child elements with the given local name in the IERS namespace.
pub fn find_children<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |child| child.is_element() && child.has_tag_name((IERS_NAMESPACE, tag)))
}

/// Find a descendant element matching a slash separated path.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use iers_harvester::xml::find_by_path;
///
/// let xml = r#"<iers xmlns="http://www.iers.org/2003/schema/iers">
///   <version><date>2025-01-02</date></version>
/// </iers>"#;
/// let doc = Document::parse(xml).unwrap();
///
/// let date = find_by_path(doc.root_element(), "version/date").unwrap();
/// assert_eq!(date.text(), Some("2025-01-02"));
/// ```
pub fn find_by_path<'a, 'input>(node: Node<'a, 'input>, path: &str) -> Option<Node<'a, 'input>> {
    let mut current = node;
    for part in path.split('/') {
        current = find_child(current, part)?;
    }
    Some(current)
}

/// Find every element matching a slash separated path.
///
/// Each segment fans out over all matching children, so repeated
/// intermediate elements all contribute. Results are in document order.
pub fn find_all_by_path<'a, 'input>(node: Node<'a, 'input>, path: &str) -> Vec<Node<'a, 'input>> {
    let mut current = vec![node];
    for part in path.split('/') {
        current = current
            .into_iter()
            .flat_map(|n| {
                n.children().filter(move |child| {
                    child.is_element() && child.has_tag_name((IERS_NAMESPACE, part))
                })
            })
            .collect();
    }
    current
}

/// Trimmed text of the element at `path`, failing if it is missing or empty.
///
/// `context` names the document in the error message.
pub fn required_text(node: Node<'_, '_>, path: &str, context: &str) -> Result<String> {
    find_by_path(node, path)
        .and_then(|n| n.text())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| HarvesterError::missing_element(path, context))
}
