// Minimal XML element tree for legacy API responses.
//
// The legacy protocol's response shapes are small and fixed, so a
// lightweight recursive descent over quick-xml events gives all the
// structure the action extractors need. Attributes are not modeled; the
// protocol never carries data in them.

use quick_xml::Reader;
use quick_xml::events::Event;

/// A parsed XML element: name, text content, and child elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNode {
    pub name: String,
    pub text: String,
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    /// Parse a document and return its root element, or `None` when the
    /// input is not well-formed XML.
    pub fn parse(xml: &str) -> Option<XmlNode> {
        let mut reader = Reader::from_str(xml);
        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf).ok()? {
                Event::Start(start) => {
                    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                    return parse_element(&mut reader, name);
                }
                Event::Empty(start) => {
                    return Some(XmlNode {
                        name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
                        ..XmlNode::default()
                    });
                }
                // prolog, comments, whitespace before the root
                Event::Decl(_) | Event::Comment(_) | Event::Text(_) | Event::DocType(_) => {}
                Event::Eof => return None,
                _ => {}
            }
            buf.clear();
        }
    }

    /// The first child element with the given name.
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All child elements with the given name, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// The trimmed text of the named child, if the child exists.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(|c| c.text.as_str())
    }
}

fn parse_element(reader: &mut Reader<&[u8]>, name: String) -> Option<XmlNode> {
    let mut node = XmlNode {
        name,
        ..XmlNode::default()
    };
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf).ok()? {
            Event::Start(start) => {
                let child_name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                node.children.push(parse_element(reader, child_name)?);
            }
            Event::Empty(start) => {
                node.children.push(XmlNode {
                    name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
                    ..XmlNode::default()
                });
            }
            Event::Text(text) => {
                let unescaped = text.unescape().ok()?;
                let trimmed = unescaped.trim();
                if !trimmed.is_empty() {
                    node.text.push_str(trimmed);
                }
            }
            Event::CData(cdata) => {
                node.text
                    .push_str(&String::from_utf8_lossy(&cdata.into_inner()));
            }
            Event::End(_) => return Some(node),
            // truncated document
            Event::Eof => return None,
            _ => {}
        }
        buf.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::XmlNode;

    #[test]
    fn parses_nested_elements_and_text() {
        let root = XmlNode::parse(
            "<Envelope><Body><RESULT><SUCCESS>TRUE</SUCCESS>\
             <SESSIONID>abc-123</SESSIONID></RESULT></Body></Envelope>",
        )
        .expect("well-formed");

        assert_eq!(root.name, "Envelope");
        let result = root
            .child("Body")
            .and_then(|b| b.child("RESULT"))
            .expect("Body.RESULT");
        assert_eq!(result.child_text("SUCCESS"), Some("TRUE"));
        assert_eq!(result.child_text("SESSIONID"), Some("abc-123"));
    }

    #[test]
    fn parses_self_closing_elements() {
        let root = XmlNode::parse("<ExportList><ADD_TO_STORED_FILES/></ExportList>")
            .expect("well-formed");
        let flag = root.child("ADD_TO_STORED_FILES").expect("flag child");
        assert!(flag.text.is_empty());
        assert!(flag.children.is_empty());
    }

    #[test]
    fn repeated_children_preserve_document_order() {
        let root = XmlNode::parse("<R><LIST>1</LIST><LIST>2</LIST><OTHER/></R>")
            .expect("well-formed");
        let lists: Vec<&str> = root.children_named("LIST").map(|n| n.text.as_str()).collect();
        assert_eq!(lists, ["1", "2"]);
    }

    #[test]
    fn unescapes_entities() {
        let root = XmlNode::parse("<V>a &amp; b &lt;c&gt;</V>").expect("well-formed");
        assert_eq!(root.text, "a & b <c>");
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(XmlNode::parse("this is not xml <").is_none());
        assert!(XmlNode::parse("").is_none());
        assert!(XmlNode::parse("<unclosed>").is_none());
    }
}
