//! HTML serialisation of a [`MemoryDocument`].

use crate::tree::{Arena, Content, ElementRef, MemoryDocument};

impl MemoryDocument {
    /// Serialise `element` and its descendants as HTML.
    ///
    /// Text and attribute values are escaped; nothing else is altered. A
    /// released element serialises as the empty string.
    #[must_use]
    pub fn to_html(&self, element: ElementRef) -> String {
        let mut out = String::new();
        let arena = self.arena.borrow();
        if let Some(index) = arena.resolve(element) {
            write_node(&arena, index, &mut out);
        }
        out
    }
}

fn write_node(arena: &Arena, index: usize, out: &mut String) {
    let Some(node) = arena.node(index) else {
        return;
    };
    match &node.content {
        Content::Text(text) => escape_into(text, false, out),
        Content::Element { tag, attributes } => {
            out.push('<');
            out.push_str(tag);
            for (name, value) in attributes {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                escape_into(value, true, out);
                out.push('"');
            }
            out.push('>');
            for &child in &node.children {
                write_node(arena, child, out);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use sensordb_app::ports::Document;

    use super::*;

    #[test]
    fn should_serialise_nested_elements_with_attributes() {
        let doc = MemoryDocument::new();
        let select = doc.add_element(doc.body(), "select", &["locations-selector"]);
        let option = doc.create_element("option").unwrap();
        doc.set_attribute(&option, "value", "1").unwrap();
        doc.set_text(&option, "A");
        doc.append_child(&select, &option).unwrap();

        assert_eq!(
            doc.to_html(doc.body()),
            "<body><select class=\"locations-selector\"><option value=\"1\">A</option></select></body>"
        );
    }

    #[test]
    fn should_escape_text_and_attribute_values() {
        let doc = MemoryDocument::new();
        let pre = doc.add_element(doc.body(), "pre", &[]);
        doc.set_attribute(&pre, "title", "say \"hi\"").unwrap();
        doc.set_text(&pre, "a < b && c > d\nnext");

        assert_eq!(
            doc.to_html(pre),
            "<pre title=\"say &quot;hi&quot;\">a &lt; b &amp;&amp; c &gt; d\nnext</pre>"
        );
        assert_eq!(doc.text_content(pre), "a < b && c > d\nnext");
    }
}
