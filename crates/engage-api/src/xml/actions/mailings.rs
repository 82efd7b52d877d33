// Mailing operations: org-wide reporting, template retrieval, scheduling,
// transactional sends, and raw event exports.

use chrono::{DateTime, Utc};

use crate::error::Error;
use crate::xml::actions::{XmlAction, bool_text};
use crate::xml::dom::XmlNode;
use crate::xml::envelope::ResponseEnvelope;
use crate::xml::writer::{XmlBuilder, legacy_timestamp, schedule_timestamp};

/// Filter flags for [`GetSentMailingsForOrg`]. Every set flag serializes as
/// a self-closing element; unset flags are omitted entirely.
#[derive(Debug, Clone, Copy, Default)]
pub struct SentMailingFlags {
    pub private: bool,
    pub shared: bool,
    pub scheduled: bool,
    pub sent: bool,
    pub sending: bool,
    pub sent_cancelled: bool,
    pub optin_confirmation: bool,
    pub profile_confirmation: bool,
    pub automated: bool,
    pub campaign_active: bool,
    pub campaign_completed: bool,
    pub campaign_cancelled: bool,
    pub campaign_scrape_template: bool,
    pub include_tags: bool,
    pub exclude_zero_sent: bool,
    pub mailing_count_only: bool,
    pub exclude_test_mailings: bool,
}

impl SentMailingFlags {
    fn entries(self) -> [(&'static str, bool); 17] {
        [
            ("PRIVATE", self.private),
            ("SHARED", self.shared),
            ("SCHEDULED", self.scheduled),
            ("SENT", self.sent),
            ("SENDING", self.sending),
            ("SENT_CANCELLED", self.sent_cancelled),
            ("OPTIN_CONFIRMATION", self.optin_confirmation),
            ("PROFILE_CONFIRMATION", self.profile_confirmation),
            ("AUTOMATED", self.automated),
            ("CAMPAIGN_ACTIVE", self.campaign_active),
            ("CAMPAIGN_COMPLETED", self.campaign_completed),
            ("CAMPAIGN_CANCELLED", self.campaign_cancelled),
            ("CAMPAIGN_SCRAPE_TEMPLATE", self.campaign_scrape_template),
            ("INCLUDE_TAGS", self.include_tags),
            ("EXCLUDE_ZERO_SENT", self.exclude_zero_sent),
            ("MAILING_COUNT_ONLY", self.mailing_count_only),
            ("EXCLUDE_TEST_MAILINGS", self.exclude_test_mailings),
        ]
    }
}

/// `GetSentMailingsForOrg`: mailings sent across the organization within a
/// time range. Yields one node per `Mailing` record.
#[derive(Debug, Clone, Default)]
pub struct GetSentMailingsForOrg {
    pub date_start: Option<DateTime<Utc>>,
    pub date_end: Option<DateTime<Utc>>,
    pub flags: SentMailingFlags,
}

impl GetSentMailingsForOrg {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn date_range(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.date_start = Some(start);
        self.date_end = Some(end);
        self
    }

    pub fn flags(mut self, flags: SentMailingFlags) -> Self {
        self.flags = flags;
        self
    }
}

impl XmlAction for GetSentMailingsForOrg {
    type Output = Vec<XmlNode>;

    fn build_request(&self) -> String {
        let mut xml = XmlBuilder::new("GetSentMailingsForOrg");
        xml.opt_text_element("DATE_START", self.date_start.map(legacy_timestamp).as_deref())
            .opt_text_element("DATE_END", self.date_end.map(legacy_timestamp).as_deref());
        for (name, set) in self.flags.entries() {
            xml.flag_element(name, set);
        }
        xml.finish()
    }

    fn parse_response(&self, envelope: &ResponseEnvelope) -> Result<Vec<XmlNode>, Error> {
        Ok(envelope
            .result()
            .children_named("Mailing")
            .cloned()
            .collect())
    }
}

/// `GetMailingTemplates`: templates modified within a time range.
///
/// Yields one node per `MAILING_TEMPLATE` record.
#[derive(Debug, Clone, Default)]
pub struct GetMailingTemplates {
    pub last_modified_start: Option<DateTime<Utc>>,
    pub last_modified_end: Option<DateTime<Utc>>,
}

impl GetMailingTemplates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn modified_between(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.last_modified_start = Some(start);
        self.last_modified_end = Some(end);
        self
    }
}

impl XmlAction for GetMailingTemplates {
    type Output = Vec<XmlNode>;

    fn build_request(&self) -> String {
        let mut xml = XmlBuilder::new("GetMailingTemplates");
        xml.opt_text_element(
            "LAST_MODIFIED_TIME_START",
            self.last_modified_start.map(legacy_timestamp).as_deref(),
        )
        .opt_text_element(
            "LAST_MODIFIED_TIME_END",
            self.last_modified_end.map(legacy_timestamp).as_deref(),
        );
        xml.finish()
    }

    fn parse_response(&self, envelope: &ResponseEnvelope) -> Result<Vec<XmlNode>, Error> {
        Ok(envelope
            .result()
            .children_named("MAILING_TEMPLATE")
            .cloned()
            .collect())
    }
}

/// `PreviewMailing`: fetch one mailing template's content by id.
///
/// Yields the full `RESULT` subtree.
#[derive(Debug, Clone)]
pub struct PreviewMailing {
    mailing_id: String,
}

impl PreviewMailing {
    pub fn new(mailing_id: impl Into<String>) -> Self {
        Self {
            mailing_id: mailing_id.into(),
        }
    }
}

impl XmlAction for PreviewMailing {
    type Output = XmlNode;

    fn build_request(&self) -> String {
        let mut xml = XmlBuilder::new("PreviewMailing");
        xml.text_element("MailingId", &self.mailing_id);
        xml.finish()
    }

    fn parse_response(&self, envelope: &ResponseEnvelope) -> Result<XmlNode, Error> {
        Ok(envelope.result().clone())
    }
}

/// `GetAggregateTrackingForMailing`: summary tracking numbers (sends, opens,
/// clicks) for one mailing/report pair. Yields the `RESULT.Mailing` subtree.
#[derive(Debug, Clone)]
pub struct GetAggregateTrackingForMailing {
    mailing_id: String,
    report_id: String,
    top_domain: bool,
    inbox_monitoring: bool,
    per_click: bool,
}

impl GetAggregateTrackingForMailing {
    pub fn new(mailing_id: impl Into<String>, report_id: impl Into<String>) -> Self {
        Self {
            mailing_id: mailing_id.into(),
            report_id: report_id.into(),
            top_domain: false,
            inbox_monitoring: false,
            per_click: false,
        }
    }

    pub fn top_domain(mut self, include: bool) -> Self {
        self.top_domain = include;
        self
    }

    pub fn inbox_monitoring(mut self, include: bool) -> Self {
        self.inbox_monitoring = include;
        self
    }

    pub fn per_click(mut self, include: bool) -> Self {
        self.per_click = include;
        self
    }
}

impl XmlAction for GetAggregateTrackingForMailing {
    type Output = XmlNode;

    fn build_request(&self) -> String {
        let mut xml = XmlBuilder::new("GetAggregateTrackingForMailing");
        xml.text_element("MAILING_ID", &self.mailing_id)
            .text_element("REPORT_ID", &self.report_id);
        if self.inbox_monitoring {
            xml.text_element("INBOX_MONITORING", bool_text(true));
        }
        if self.top_domain {
            xml.text_element("TOP_DOMAIN", bool_text(true));
        }
        if self.per_click {
            xml.text_element("PER_CLICK", bool_text(true));
        }
        xml.finish()
    }

    fn parse_response(&self, envelope: &ResponseEnvelope) -> Result<XmlNode, Error> {
        envelope
            .result()
            .child("Mailing")
            .cloned()
            .ok_or_else(|| Error::Deserialization {
                message: "response missing <Mailing> element".to_owned(),
                body: envelope.raw().to_owned(),
            })
    }
}

/// `ScheduleMailing`: schedule a template-based mailing to a list.
///
/// Yields the generated `MAILING_ID`.
#[derive(Debug, Clone)]
pub struct ScheduleMailing {
    template_id: String,
    list_id: String,
    mailing_name: String,
    scheduled: DateTime<Utc>,
    save_to_shared_folder: bool,
    optional: Vec<(String, String)>,
    suppression_lists: Vec<String>,
}

impl ScheduleMailing {
    pub fn new(
        template_id: impl Into<String>,
        list_id: impl Into<String>,
        mailing_name: impl Into<String>,
        scheduled: DateTime<Utc>,
    ) -> Self {
        Self {
            template_id: template_id.into(),
            list_id: list_id.into(),
            mailing_name: mailing_name.into(),
            scheduled,
            save_to_shared_folder: false,
            optional: Vec::new(),
            suppression_lists: Vec::new(),
        }
    }

    pub fn save_to_shared_folder(mut self, shared: bool) -> Self {
        self.save_to_shared_folder = shared;
        self
    }

    /// Optional element, e.g. `SUBJECT`, `FROM_NAME`, `REPLY_TO`.
    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.optional.push((name.into(), value.into()));
        self
    }

    pub fn suppression_list(mut self, list_id: impl Into<String>) -> Self {
        self.suppression_lists.push(list_id.into());
        self
    }
}

impl XmlAction for ScheduleMailing {
    type Output = String;

    fn build_request(&self) -> String {
        let mut xml = XmlBuilder::new("ScheduleMailing");
        xml.text_element("TEMPLATE_ID", &self.template_id)
            .text_element("LIST_ID", &self.list_id)
            .text_element("MAILING_NAME", &self.mailing_name)
            .text_element("SEND_HTML", "true")
            .text_element("SEND_TEXT", "true")
            .text_element(
                "VISIBILITY",
                if self.save_to_shared_folder { "1" } else { "0" },
            )
            .text_element("SCHEDULED", &schedule_timestamp(self.scheduled));
        for (name, value) in &self.optional {
            xml.text_element(name, value);
        }
        if !self.suppression_lists.is_empty() {
            xml.open("SUPPRESSION_LISTS");
            for id in &self.suppression_lists {
                xml.text_element("SUPPRESSION_LIST_ID", id);
            }
            xml.close("SUPPRESSION_LISTS");
        }
        xml.finish()
    }

    fn parse_response(&self, envelope: &ResponseEnvelope) -> Result<String, Error> {
        envelope.require_text("MAILING_ID")
    }
}

/// `SendMailing`: trigger an autoresponder mailing to a single address.
///
/// Yields the full `RESULT` subtree.
#[derive(Debug, Clone)]
pub struct SendMailing {
    mailing_id: String,
    recipient_email: String,
}

impl SendMailing {
    pub fn new(mailing_id: impl Into<String>, recipient_email: impl Into<String>) -> Self {
        Self {
            mailing_id: mailing_id.into(),
            recipient_email: recipient_email.into(),
        }
    }
}

impl XmlAction for SendMailing {
    type Output = XmlNode;

    fn build_request(&self) -> String {
        let mut xml = XmlBuilder::new("SendMailing");
        xml.text_element("MailingId", &self.mailing_id)
            .text_element("RecipientEmail", &self.recipient_email);
        xml.finish()
    }

    fn parse_response(&self, envelope: &ResponseEnvelope) -> Result<XmlNode, Error> {
        Ok(envelope.result().clone())
    }
}

/// Job handle from a raw event export. Both fields are absent when the
/// server queues nothing (e.g. an empty result set).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawExportJob {
    pub job_id: Option<String>,
    pub file_path: Option<String>,
}

/// `RawRecipientDataExport`: queue an export of per-contact mailing events.
///
/// Mailings can be addressed by `MAILING_ID`, `REPORT_ID`, `LIST_ID`, or
/// `CAMPAIGN_ID` in varying combinations.
#[derive(Debug, Clone, Default)]
pub struct RawRecipientDataExport {
    mailings: Vec<(String, String)>,
    dates: Vec<(String, String)>,
    flags: Vec<String>,
    optional: Vec<(String, String)>,
    columns: Vec<(String, String)>,
}

impl RawRecipientDataExport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Address one mailing: `id_type` is the element name (`MAILING_ID`,
    /// `REPORT_ID`, `LIST_ID`, or `CAMPAIGN_ID`).
    pub fn mailing(mut self, id_type: impl Into<String>, id: impl Into<String>) -> Self {
        self.mailings.push((id_type.into(), id.into()));
        self
    }

    /// Date boundary element, e.g. `EVENT_DATE_START`.
    pub fn date(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.dates.push((name.into(), value.into()));
        self
    }

    /// Event-type flag, e.g. `SENT`, `OPENS`, `CLICKS`. Sanitized to
    /// uppercase letters and underscores.
    pub fn flag(mut self, name: &str) -> Self {
        let sanitized: String = name
            .chars()
            .filter(|c| c.is_ascii_alphabetic() || *c == '_')
            .collect::<String>()
            .to_uppercase();
        self.flags.push(sanitized);
        self
    }

    /// Optional element, e.g. `EXPORT_FORMAT` or a notification `EMAIL`.
    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.optional.push((name.into(), value.into()));
        self
    }

    /// Key column to include in the exported file.
    pub fn column(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.columns.push((name.into(), value.into()));
        self
    }
}

impl XmlAction for RawRecipientDataExport {
    type Output = RawExportJob;

    fn build_request(&self) -> String {
        let mut xml = XmlBuilder::new("RawRecipientDataExport");
        for (name, value) in &self.dates {
            xml.text_element(name, value);
        }
        for (id_type, id) in &self.mailings {
            xml.open("MAILING").text_element(id_type, id).close("MAILING");
        }
        for flag in &self.flags {
            xml.flag_element(flag, true);
        }
        for (name, value) in &self.optional {
            xml.text_element(name, value);
        }
        xml.columns(self.columns.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        xml.finish()
    }

    fn parse_response(&self, envelope: &ResponseEnvelope) -> Result<RawExportJob, Error> {
        let mailing = envelope.result().child("MAILING");
        Ok(RawExportJob {
            job_id: mailing
                .and_then(|m| m.child_text("JOB_ID"))
                .map(ToOwned::to_owned),
            file_path: mailing
                .and_then(|m| m.child_text("FILE_PATH"))
                .map(ToOwned::to_owned),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::xml::actions::XmlAction;
    use crate::xml::envelope::ResponseEnvelope;

    use super::{
        GetSentMailingsForOrg, RawRecipientDataExport, ScheduleMailing, SentMailingFlags,
    };

    use chrono::{TimeZone, Utc};

    fn success_envelope(result_inner: &str) -> ResponseEnvelope {
        let raw = format!(
            "<Envelope><Body><RESULT><SUCCESS>TRUE</SUCCESS>{result_inner}</RESULT></Body></Envelope>"
        );
        ResponseEnvelope::parse(&raw).expect("valid envelope")
    }

    #[test]
    fn sent_mailings_flags_are_self_closing() {
        let action = GetSentMailingsForOrg::new().flags(SentMailingFlags {
            shared: true,
            exclude_test_mailings: true,
            ..SentMailingFlags::default()
        });
        let request = action.build_request();

        assert!(request.contains("<SHARED/>"));
        assert!(request.contains("<EXCLUDE_TEST_MAILINGS/>"));
        assert!(!request.contains("<PRIVATE"));
        assert!(!request.contains("SHARED>"));
    }

    #[test]
    fn sent_mailings_extracts_mailing_records() {
        let action = GetSentMailingsForOrg::new();
        let envelope = success_envelope(
            "<Mailing><MailingId>1</MailingId></Mailing>\
             <Mailing><MailingId>2</MailingId></Mailing>",
        );
        let mailings = action.parse_response(&envelope).expect("mailings");
        assert_eq!(mailings.len(), 2);
        assert_eq!(mailings[0].child_text("MailingId"), Some("1"));
    }

    #[test]
    fn schedule_mailing_request_shape() {
        let scheduled = Utc
            .with_ymd_and_hms(2027, 3, 1, 14, 30, 0)
            .single()
            .expect("valid");
        let request = ScheduleMailing::new("123", "456", "March sale", scheduled)
            .parameter("SUBJECT", "Hello")
            .suppression_list("789")
            .build_request();

        assert!(request.contains("<TEMPLATE_ID>123</TEMPLATE_ID>"));
        assert!(request.contains("<SEND_HTML>true</SEND_HTML>"));
        assert!(request.contains("<VISIBILITY>0</VISIBILITY>"));
        assert!(request.contains("<SCHEDULED>03/01/2027 02:30:00 PM</SCHEDULED>"));
        assert!(request.contains("<SUBJECT>Hello</SUBJECT>"));
        assert!(request.contains(
            "<SUPPRESSION_LISTS><SUPPRESSION_LIST_ID>789</SUPPRESSION_LIST_ID></SUPPRESSION_LISTS>"
        ));
    }

    #[test]
    fn raw_export_sanitizes_flags_and_parses_job() {
        let action = RawRecipientDataExport::new()
            .mailing("MAILING_ID", "345")
            .flag("all non-exported!")
            .flag("OPENS");
        let request = action.build_request();

        assert!(request.contains("<MAILING><MAILING_ID>345</MAILING_ID></MAILING>"));
        assert!(request.contains("<ALLNONEXPORTED/>"));
        assert!(request.contains("<OPENS/>"));

        let envelope = success_envelope(
            "<MAILING><JOB_ID>42</JOB_ID><FILE_PATH>/download/raw.zip</FILE_PATH></MAILING>",
        );
        let job = action.parse_response(&envelope).expect("job");
        assert_eq!(job.job_id.as_deref(), Some("42"));
        assert_eq!(job.file_path.as_deref(), Some("/download/raw.zip"));
    }

    #[test]
    fn raw_export_without_mailing_block_yields_empty_job() {
        let action = RawRecipientDataExport::new();
        let envelope = success_envelope("");
        let job = action.parse_response(&envelope).expect("job");
        assert_eq!(job.job_id, None);
        assert_eq!(job.file_path, None);
    }
}
