// Request document builder for legacy XML operations.
//
// Wraps quick-xml's event writer with the three element shapes the protocol
// uses: text elements, self-closing flag elements (present when true,
// omitted when false — never serialized as true/false text), and
// `<COLUMN><NAME/><VALUE/></COLUMN>` groups.

use chrono::{DateTime, Utc};
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

const WRITE: &str = "writing XML to an in-memory buffer cannot fail";

/// Builds one operation element (the direct child of `<Body>`).
pub struct XmlBuilder {
    writer: Writer<Vec<u8>>,
    root: String,
}

impl XmlBuilder {
    pub fn new(root: &str) -> Self {
        let mut writer = Writer::new(Vec::new());
        writer
            .write_event(Event::Start(BytesStart::new(root)))
            .expect(WRITE);
        Self {
            writer,
            root: root.to_owned(),
        }
    }

    /// `<NAME>value</NAME>`, with XML escaping applied to the value.
    pub fn text_element(&mut self, name: &str, value: &str) -> &mut Self {
        self.writer
            .write_event(Event::Start(BytesStart::new(name)))
            .expect(WRITE);
        self.writer
            .write_event(Event::Text(BytesText::new(value)))
            .expect(WRITE);
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .expect(WRITE);
        self
    }

    /// Text element emitted only when a value is present.
    pub fn opt_text_element(&mut self, name: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value {
            self.text_element(name, value);
        }
        self
    }

    /// Self-closing flag element (`<NAME/>`), emitted only when `set`.
    pub fn flag_element(&mut self, name: &str, set: bool) -> &mut Self {
        if set {
            self.writer
                .write_event(Event::Empty(BytesStart::new(name)))
                .expect(WRITE);
        }
        self
    }

    /// Self-closing element with a single attribute, e.g.
    /// `<COLUMN name="Email" />`.
    pub fn empty_element_with_attr(&mut self, name: &str, attr: &str, value: &str) -> &mut Self {
        let mut start = BytesStart::new(name);
        start.push_attribute((attr, value));
        self.writer.write_event(Event::Empty(start)).expect(WRITE);
        self
    }

    /// Open a container element; pair with [`close`](Self::close).
    pub fn open(&mut self, name: &str) -> &mut Self {
        self.writer
            .write_event(Event::Start(BytesStart::new(name)))
            .expect(WRITE);
        self
    }

    pub fn close(&mut self, name: &str) -> &mut Self {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .expect(WRITE);
        self
    }

    /// One `<COLUMN><NAME>key</NAME><VALUE>value</VALUE></COLUMN>` group per
    /// entry, in iteration order.
    pub fn columns<'a>(
        &mut self,
        fields: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> &mut Self {
        for (key, value) in fields {
            self.open("COLUMN")
                .text_element("NAME", key)
                .text_element("VALUE", value)
                .close("COLUMN");
        }
        self
    }

    /// Close the root element and return the document as a string.
    pub fn finish(mut self) -> String {
        self.writer
            .write_event(Event::End(BytesEnd::new(self.root.as_str())))
            .expect(WRITE);
        String::from_utf8(self.writer.into_inner()).expect("writer output is UTF-8")
    }
}

/// The legacy API's timestamp format: `mm/dd/yyyy HH:MM:SS` (24-hour).
pub fn legacy_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%m/%d/%Y %H:%M:%S").to_string()
}

/// Scheduling timestamps use a 12-hour clock with an AM/PM marker.
pub fn schedule_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%m/%d/%Y %I:%M:%S %p").to_string()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    use super::{XmlBuilder, legacy_timestamp, schedule_timestamp};

    #[test]
    fn text_elements_are_escaped() {
        let mut builder = XmlBuilder::new("Op");
        builder.text_element("VALUE", "a & b <c>");
        assert_eq!(
            builder.finish(),
            "<Op><VALUE>a &amp; b &lt;c&gt;</VALUE></Op>"
        );
    }

    #[test]
    fn flags_are_self_closing_and_omitted_when_false() {
        let mut builder = XmlBuilder::new("Op");
        builder.flag_element("ON", true).flag_element("OFF", false);
        assert_eq!(builder.finish(), "<Op><ON/></Op>");
    }

    #[test]
    fn column_groups_emit_name_value_pairs() {
        let mut builder = XmlBuilder::new("Op");
        builder.columns([("Email", "a@example.com")]);
        assert_eq!(
            builder.finish(),
            "<Op><COLUMN><NAME>Email</NAME><VALUE>a@example.com</VALUE></COLUMN></Op>"
        );
    }

    #[test]
    fn attribute_elements_render_inline() {
        let mut builder = XmlBuilder::new("COLUMNS");
        builder.empty_element_with_attr("COLUMN", "name", "FirstName");
        assert_eq!(builder.finish(), "<COLUMNS><COLUMN name=\"FirstName\"/></COLUMNS>");
    }

    #[test]
    fn timestamp_formats() {
        let ts = Utc.with_ymd_and_hms(2017, 5, 5, 17, 23, 23).single().expect("valid");
        assert_eq!(legacy_timestamp(ts), "05/05/2017 17:23:23");
        assert_eq!(schedule_timestamp(ts), "05/05/2017 05:23:23 PM");
    }
}
