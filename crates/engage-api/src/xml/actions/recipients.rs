// Recipient-level operations: add, update, remove, lookup, change feed.

use chrono::{DateTime, Utc};

use crate::error::Error;
use crate::xml::actions::{XmlAction, bool_text};
use crate::xml::dom::XmlNode;
use crate::xml::envelope::ResponseEnvelope;
use crate::xml::writer::{XmlBuilder, legacy_timestamp};

/// How a contact record came to exist, carried as `CREATED_FROM`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CreatedFrom {
    DatabaseImport,
    #[default]
    Manual,
    OptIn,
    TrackingDb,
}

impl CreatedFrom {
    fn code(self) -> &'static str {
        match self {
            Self::DatabaseImport => "0",
            Self::Manual => "1",
            Self::OptIn => "2",
            Self::TrackingDb => "3",
        }
    }
}

/// `AddRecipient`: add a new contact to an existing database.
///
/// Yields the new contact's `RecipientId`.
#[derive(Debug, Clone)]
pub struct AddRecipient {
    list_id: String,
    created_from: CreatedFrom,
    send_autoreply: bool,
    update_if_found: bool,
    contact_lists: Vec<String>,
    fields: Vec<(String, String)>,
}

impl AddRecipient {
    pub fn new(list_id: impl Into<String>) -> Self {
        Self {
            list_id: list_id.into(),
            created_from: CreatedFrom::default(),
            send_autoreply: false,
            update_if_found: false,
            contact_lists: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Add one `COLUMN` name/value pair.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Update the contact instead of failing when it already exists
    /// (`UPDATE_IF_FOUND`).
    pub fn upsert(mut self, upsert: bool) -> Self {
        self.update_if_found = upsert;
        self
    }

    /// Trigger auto-responders for the new contact (`SEND_AUTOREPLY`).
    pub fn autoreply(mut self, autoreply: bool) -> Self {
        self.send_autoreply = autoreply;
        self
    }

    pub fn created_from(mut self, created_from: CreatedFrom) -> Self {
        self.created_from = created_from;
        self
    }

    /// Also add the contact to the given contact list.
    pub fn contact_list(mut self, contact_list_id: impl Into<String>) -> Self {
        self.contact_lists.push(contact_list_id.into());
        self
    }
}

impl XmlAction for AddRecipient {
    type Output = String;

    fn build_request(&self) -> String {
        let mut xml = XmlBuilder::new("AddRecipient");
        xml.text_element("LIST_ID", &self.list_id)
            .text_element("CREATED_FROM", self.created_from.code())
            .text_element("SEND_AUTOREPLY", bool_text(self.send_autoreply))
            .text_element("UPDATE_IF_FOUND", bool_text(self.update_if_found));
        if !self.contact_lists.is_empty() {
            xml.open("CONTACT_LISTS");
            for id in &self.contact_lists {
                xml.text_element("CONTACT_LIST_ID", id);
            }
            xml.close("CONTACT_LISTS");
        }
        xml.columns(self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        xml.finish()
    }

    fn parse_response(&self, envelope: &ResponseEnvelope) -> Result<String, Error> {
        envelope.require_text("RecipientId")
    }
}

/// `UpdateRecipient`: update field values on an existing contact.
///
/// Yields the contact's `RecipientId`.
#[derive(Debug, Clone)]
pub struct UpdateRecipient {
    list_id: String,
    recipient_id: String,
    fields: Vec<(String, String)>,
    optional: Vec<(String, String)>,
    snooze_resume_date: Option<String>,
}

impl UpdateRecipient {
    pub fn new(list_id: impl Into<String>, recipient_id: impl Into<String>) -> Self {
        Self {
            list_id: list_id.into(),
            recipient_id: recipient_id.into(),
            fields: Vec::new(),
            optional: Vec::new(),
            snooze_resume_date: None,
        }
    }

    /// Add one `COLUMN` name/value pair.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Extra top-level parameter, e.g. `EMAIL` or `VISITOR_KEY`.
    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.optional.push((name.into(), value.into()));
        self
    }

    /// Snooze mailings to this contact until the given resume date
    /// (`SNOOZE_SETTINGS` block).
    pub fn snooze_until(mut self, resume_send_date: impl Into<String>) -> Self {
        self.snooze_resume_date = Some(resume_send_date.into());
        self
    }
}

impl XmlAction for UpdateRecipient {
    type Output = String;

    fn build_request(&self) -> String {
        let mut xml = XmlBuilder::new("UpdateRecipient");
        xml.text_element("RECIPIENT_ID", &self.recipient_id)
            .text_element("LIST_ID", &self.list_id);
        for (name, value) in &self.optional {
            xml.text_element(name, value);
        }
        if let Some(resume) = &self.snooze_resume_date {
            xml.open("SNOOZE_SETTINGS")
                .text_element("SNOOZED", "true")
                .text_element("RESUME_SEND_DATE", resume)
                .close("SNOOZE_SETTINGS");
        }
        xml.columns(self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        xml.finish()
    }

    fn parse_response(&self, envelope: &ResponseEnvelope) -> Result<String, Error> {
        envelope.require_text("RecipientId")
    }
}

/// `RemoveRecipient`: delete a contact from a database, matched by email
/// and/or key columns.
#[derive(Debug, Clone)]
pub struct RemoveRecipient {
    list_id: String,
    email: String,
    key_fields: Vec<(String, String)>,
}

impl RemoveRecipient {
    pub fn new(list_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            list_id: list_id.into(),
            email: email.into(),
            key_fields: Vec::new(),
        }
    }

    /// Key column to match when email alone is not the list key.
    pub fn key_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.key_fields.push((name.into(), value.into()));
        self
    }
}

impl XmlAction for RemoveRecipient {
    type Output = ();

    fn build_request(&self) -> String {
        let mut xml = XmlBuilder::new("RemoveRecipient");
        xml.text_element("LIST_ID", &self.list_id)
            .text_element("EMAIL", &self.email);
        xml.columns(self.key_fields.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        xml.finish()
    }

    fn parse_response(&self, _envelope: &ResponseEnvelope) -> Result<(), Error> {
        Ok(())
    }
}

/// `SelectRecipientData`: fetch all stored data for one contact.
///
/// Unique-key columns must be supplied alongside the main lookup fields
/// when the list defines them. If more than one contact matches, the server
/// returns the oldest. Yields the full `RESULT` subtree.
#[derive(Debug, Clone)]
pub struct SelectRecipientData {
    list_id: String,
    main_fields: Vec<(String, String)>,
    columns: Vec<(String, String)>,
}

impl SelectRecipientData {
    pub fn new(list_id: impl Into<String>) -> Self {
        Self {
            list_id: list_id.into(),
            main_fields: Vec::new(),
            columns: Vec::new(),
        }
    }

    /// Main lookup field, e.g. `EMAIL` or `RECIPIENT_ID`. Names are
    /// uppercased on serialization.
    pub fn main_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.main_fields.push((name.into(), value.into()));
        self
    }

    /// Unique-key column for lists keyed on custom columns.
    pub fn key_column(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.columns.push((name.into(), value.into()));
        self
    }
}

impl XmlAction for SelectRecipientData {
    type Output = XmlNode;

    fn build_request(&self) -> String {
        let mut xml = XmlBuilder::new("SelectRecipientData");
        xml.text_element("LIST_ID", &self.list_id);
        for (name, value) in &self.main_fields {
            xml.text_element(&name.to_uppercase(), value);
        }
        xml.columns(self.columns.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        xml.finish()
    }

    fn parse_response(&self, envelope: &ResponseEnvelope) -> Result<XmlNode, Error> {
        Ok(envelope.result().clone())
    }
}

/// `GetModifiedRecipients`: list contacts modified within a time range.
///
/// Yields one node per `RECIPIENTS` record.
#[derive(Debug, Clone)]
pub struct GetModifiedRecipients {
    list_id: String,
    last_modified_start: DateTime<Utc>,
    last_modified_end: DateTime<Utc>,
    columns: Vec<String>,
}

impl GetModifiedRecipients {
    pub fn new(
        list_id: impl Into<String>,
        last_modified_start: DateTime<Utc>,
        last_modified_end: DateTime<Utc>,
    ) -> Self {
        Self {
            list_id: list_id.into(),
            last_modified_start,
            last_modified_end,
            columns: vec![
                "FirstName".to_owned(),
                "LastName".to_owned(),
                "Email".to_owned(),
            ],
        }
    }

    /// Replace the default column set (FirstName, LastName, Email).
    pub fn columns(mut self, columns: Vec<String>) -> Self {
        self.columns = columns;
        self
    }
}

impl XmlAction for GetModifiedRecipients {
    type Output = Vec<XmlNode>;

    fn build_request(&self) -> String {
        let mut xml = XmlBuilder::new("GetModifiedRecipients");
        xml.text_element("INSERTS_ONLY", "false")
            .text_element("CONTACT_TYPE", "Contact")
            .text_element("LIST_ID", &self.list_id)
            .text_element(
                "LAST_MODIFIED_TIME_START",
                &legacy_timestamp(self.last_modified_start),
            )
            .text_element(
                "LAST_MODIFIED_TIME_END",
                &legacy_timestamp(self.last_modified_end),
            );
        xml.open("COLUMNS");
        for column in &self.columns {
            xml.empty_element_with_attr("COLUMN", "name", column);
        }
        xml.close("COLUMNS");
        xml.finish()
    }

    fn parse_response(&self, envelope: &ResponseEnvelope) -> Result<Vec<XmlNode>, Error> {
        Ok(envelope
            .result()
            .children_named("RECIPIENTS")
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use crate::xml::actions::XmlAction;
    use crate::xml::dom::XmlNode;
    use crate::xml::envelope::ResponseEnvelope;

    use super::{AddRecipient, CreatedFrom, RemoveRecipient, UpdateRecipient};

    fn success_envelope(result_inner: &str) -> ResponseEnvelope {
        let raw = format!(
            "<Envelope><Body><RESULT><SUCCESS>TRUE</SUCCESS>{result_inner}</RESULT></Body></Envelope>"
        );
        ResponseEnvelope::parse(&raw).expect("valid envelope")
    }

    #[test]
    fn add_recipient_request_shape() {
        let action = AddRecipient::new("18176618")
            .field("Email", "a@example.com")
            .upsert(false);
        let request = action.build_request();

        assert!(request.contains("<LIST_ID>18176618</LIST_ID>"));
        assert!(request.contains("<CREATED_FROM>1</CREATED_FROM>"));
        assert!(request.contains("<UPDATE_IF_FOUND>FALSE</UPDATE_IF_FOUND>"));
        assert!(request.contains("<SEND_AUTOREPLY>FALSE</SEND_AUTOREPLY>"));
        assert_eq!(request.matches("<COLUMN>").count(), 1);
        assert!(request.contains("<NAME>Email</NAME><VALUE>a@example.com</VALUE>"));
    }

    #[test]
    fn add_recipient_contact_lists_block_only_when_present() {
        let bare = AddRecipient::new("1").build_request();
        assert!(!bare.contains("CONTACT_LISTS"));

        let with_list = AddRecipient::new("1").contact_list("42").build_request();
        assert!(with_list.contains(
            "<CONTACT_LISTS><CONTACT_LIST_ID>42</CONTACT_LIST_ID></CONTACT_LISTS>"
        ));
    }

    #[test]
    fn add_recipient_recipient_id_round_trips_as_string() {
        let action = AddRecipient::new("18176618").field("Email", "a@example.com");
        let envelope = success_envelope("<RecipientId>4455</RecipientId>");
        let id = action.parse_response(&envelope).expect("recipient id");
        assert_eq!(id, "4455");
    }

    #[test]
    fn add_recipient_large_identifier_survives() {
        let action = AddRecipient::new("1");
        let envelope = success_envelope("<RecipientId>99999999999999999999</RecipientId>");
        let id = action.parse_response(&envelope).expect("recipient id");
        assert_eq!(id, "99999999999999999999");
    }

    #[test]
    fn created_from_codes() {
        assert_eq!(CreatedFrom::DatabaseImport.code(), "0");
        assert_eq!(CreatedFrom::Manual.code(), "1");
        assert_eq!(CreatedFrom::OptIn.code(), "2");
        assert_eq!(CreatedFrom::TrackingDb.code(), "3");
    }

    #[test]
    fn update_recipient_emits_snooze_block() {
        let action = UpdateRecipient::new("10", "20")
            .snooze_until("01/01/2027")
            .field("City", "Oslo");
        let request = action.build_request();

        assert!(request.starts_with("<UpdateRecipient><RECIPIENT_ID>20</RECIPIENT_ID>"));
        assert!(request.contains(
            "<SNOOZE_SETTINGS><SNOOZED>true</SNOOZED>\
             <RESUME_SEND_DATE>01/01/2027</RESUME_SEND_DATE></SNOOZE_SETTINGS>"
        ));
    }

    #[test]
    fn remove_recipient_round_trip() {
        let action = RemoveRecipient::new("10", "a@example.com").key_field("CustomerId", "7");
        let request = action.build_request();
        assert!(request.contains("<EMAIL>a@example.com</EMAIL>"));

        let built = XmlNode::parse(&request).expect("request parses back");
        assert_eq!(built.child_text("LIST_ID"), Some("10"));

        let envelope = success_envelope("");
        action.parse_response(&envelope).expect("unit result");
    }
}
