// Query operations: criteria retrieval and size calculation.

use crate::error::Error;
use crate::xml::actions::XmlAction;
use crate::xml::dom::XmlNode;
use crate::xml::envelope::ResponseEnvelope;
use crate::xml::writer::XmlBuilder;

/// `GetQuery`: the criteria used for a query list.
///
/// Yields the full `RESULT` subtree.
#[derive(Debug, Clone)]
pub struct GetQuery {
    list_id: String,
}

impl GetQuery {
    pub fn new(list_id: impl Into<String>) -> Self {
        Self {
            list_id: list_id.into(),
        }
    }
}

impl XmlAction for GetQuery {
    type Output = XmlNode;

    fn build_request(&self) -> String {
        let mut xml = XmlBuilder::new("GetQuery");
        xml.text_element("LIST_ID", &self.list_id);
        xml.finish()
    }

    fn parse_response(&self, envelope: &ResponseEnvelope) -> Result<XmlNode, Error> {
        Ok(envelope.result().clone())
    }
}

/// `CalculateQuery`: queue a data job recalculating a query's contact count.
///
/// The server refuses recalculation within 12 hours of the last run. Yields
/// the data-job id; poll it with `GetJobStatus`.
#[derive(Debug, Clone)]
pub struct CalculateQuery {
    query_id: String,
    notify_email: Option<String>,
}

impl CalculateQuery {
    pub fn new(query_id: impl Into<String>) -> Self {
        Self {
            query_id: query_id.into(),
            notify_email: None,
        }
    }

    /// Email address to notify when the job completes.
    pub fn notify_email(mut self, email: impl Into<String>) -> Self {
        self.notify_email = Some(email.into());
        self
    }
}

impl XmlAction for CalculateQuery {
    type Output = String;

    fn build_request(&self) -> String {
        let mut xml = XmlBuilder::new("CalculateQuery");
        xml.text_element("QUERY_ID", &self.query_id)
            .opt_text_element("EMAIL", self.notify_email.as_deref());
        xml.finish()
    }

    fn parse_response(&self, envelope: &ResponseEnvelope) -> Result<String, Error> {
        envelope.require_text("JOB_ID")
    }
}
