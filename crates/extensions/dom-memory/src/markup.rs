//! Markup serialization for the body subtree.

use pagetrace_protocols::NodeId;

use crate::document::Arena;

const VOID_ELEMENTS: [&str; 8] = ["area", "br", "col", "hr", "img", "input", "link", "meta"];

/// Serialize the children of the body, in document order.
pub(crate) fn serialize_body(arena: &Arena) -> String {
    let mut out = String::new();
    for &root in &arena.roots {
        write_element(&mut out, arena, root);
    }
    out
}

fn write_element(out: &mut String, arena: &Arena, id: NodeId) {
    let Some(node) = arena.nodes.get(&id) else {
        return;
    };
    let tag = node.tag.to_ascii_lowercase();

    out.push('<');
    out.push_str(&tag);
    for (name, value) in &node.attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape_attr(value));
        out.push('"');
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&tag.as_str()) {
        return;
    }

    if let Some(text) = &node.text {
        out.push_str(&escape_text(text));
    }
    for &child in &node.children {
        write_element(out, arena, child);
    }

    out.push_str("</");
    out.push_str(&tag);
    out.push('>');
}

pub(crate) fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}

pub(crate) fn escape_text(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_attr() {
        assert_eq!(escape_attr(r#"a "b" & <c>"#), "a &quot;b&quot; &amp; &lt;c>");
    }

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("1 < 2 && 3 > 2"), "1 &lt; 2 &amp;&amp; 3 &gt; 2");
    }
}
