// Facade connector: availability-based routing between the REST and XML
// surfaces.
//
// One method per logical operation. A call goes to REST when the REST
// connector defines the operation *and* currently holds a live access
// token; otherwise it falls back to XML. The check is runtime
// authentication state, not a fixed whitelist, so the same call can land on
// either protocol across the life of a process.

use std::sync::Arc;

use serde_json::Value;

use crate::credentials::{OauthCredentials, SessionCredentials};
use crate::error::Error;
use crate::rest::RestClient;
use crate::xml::XmlClient;
use crate::xml::actions::{
    AddContactToContactList, AddRecipient, CalculateQuery, CreateContactList, ExportJob,
    ExportList, GetAggregateTrackingForMailing, GetJobStatus, GetListMetaData,
    GetMailingTemplates, GetModifiedRecipients, GetQuery, GetSentMailingsForOrg, JobStatus,
    PreviewMailing, RawExportJob, RawRecipientDataExport, RemoveRecipient, ScheduleMailing,
    SelectRecipientData, SendMailing, UpdateRecipient,
};
use crate::xml::dom::XmlNode;

/// Every logical operation the facade can route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    AddRecipient,
    UpdateRecipient,
    RemoveRecipient,
    SelectRecipientData,
    GetModifiedRecipients,
    ExportList,
    GetJobStatus,
    GetListMetaData,
    GetLists,
    CreateContactList,
    AddContactToContactList,
    GetQuery,
    CalculateQuery,
    GetSentMailingsForOrg,
    GetMailingTemplates,
    PreviewMailing,
    GetAggregateTrackingForMailing,
    ScheduleMailing,
    SendMailing,
    RawRecipientDataExport,
    CreateEvent,
    GdprAccess,
    GdprErasure,
}

/// Which protocol a routed call will use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Rest,
    Xml,
}

/// The public entry point holding both protocol connectors.
///
/// Construct connectors explicitly and pass this value through call sites;
/// one facade per credential set.
#[derive(Default)]
pub struct EngageConnector {
    rest: Option<Arc<RestClient>>,
    xml: Option<Arc<XmlClient>>,
}

impl EngageConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rest(mut self, rest: Arc<RestClient>) -> Self {
        self.rest = Some(rest);
        self
    }

    pub fn with_xml(mut self, xml: Arc<XmlClient>) -> Self {
        self.xml = Some(xml);
        self
    }

    /// Resolve which protocol would serve the operation right now.
    ///
    /// REST wins only when its connector exists, defines the operation, and
    /// holds a live access token. Fails with [`Error::Configuration`] when
    /// neither connector is available.
    pub async fn route(&self, operation: Operation) -> Result<Route, Error> {
        if let Some(rest) = &self.rest {
            if RestClient::supports(operation) && rest.is_ready().await {
                return Ok(Route::Rest);
            }
        }
        if self.xml.is_some() {
            return Ok(Route::Xml);
        }
        Err(Error::Configuration {
            message: format!(
                "no authenticated connector available for {operation:?}; \
                 authenticate before calling API resource endpoints"
            ),
        })
    }

    /// Exchange OAuth credentials now, so subsequent calls find a live
    /// token.
    pub async fn authenticate_rest(&self, credentials: OauthCredentials) -> Result<(), Error> {
        let rest = self.rest.as_ref().ok_or_else(|| Error::Configuration {
            message: "no REST connector configured".to_owned(),
        })?;
        rest.token_provider().set_credentials(credentials).await;
        rest.token_provider().access_token().await?;
        Ok(())
    }

    /// Log in to the legacy surface now, caching the session id.
    pub async fn authenticate_xml(&self, credentials: SessionCredentials) -> Result<(), Error> {
        self.require_xml()?.authenticate(credentials).await
    }

    /// Best-effort logout from the legacy surface, if one is configured.
    pub async fn logout(&self) {
        if let Some(xml) = &self.xml {
            xml.logout().await;
        }
    }

    fn require_xml(&self) -> Result<&XmlClient, Error> {
        self.xml.as_deref().ok_or_else(|| Error::Configuration {
            message: "no XML connector configured".to_owned(),
        })
    }

    /// Route a legacy-only operation. The availability check can only
    /// resolve to the XML connector for these, but it still enforces that
    /// some connector is configured.
    async fn xml_for(&self, operation: Operation) -> Result<&XmlClient, Error> {
        match self.route(operation).await? {
            Route::Xml => self.require_xml(),
            Route::Rest => Err(Error::Configuration {
                message: format!("{operation:?} is not defined on the REST surface"),
            }),
        }
    }

    // ── Recipient operations ─────────────────────────────────────────

    pub async fn add_recipient(&self, action: &AddRecipient) -> Result<String, Error> {
        self.xml_for(Operation::AddRecipient).await?.execute(action).await
    }

    pub async fn update_recipient(&self, action: &UpdateRecipient) -> Result<String, Error> {
        self.xml_for(Operation::UpdateRecipient).await?.execute(action).await
    }

    pub async fn remove_recipient(&self, action: &RemoveRecipient) -> Result<(), Error> {
        self.xml_for(Operation::RemoveRecipient).await?.execute(action).await
    }

    pub async fn select_recipient_data(
        &self,
        action: &SelectRecipientData,
    ) -> Result<XmlNode, Error> {
        self.xml_for(Operation::SelectRecipientData)
            .await?
            .execute(action)
            .await
    }

    pub async fn get_modified_recipients(
        &self,
        action: &GetModifiedRecipients,
    ) -> Result<Vec<XmlNode>, Error> {
        self.xml_for(Operation::GetModifiedRecipients)
            .await?
            .execute(action)
            .await
    }

    // ── List operations ──────────────────────────────────────────────

    pub async fn export_list(&self, action: ExportList) -> Result<ExportJob, Error> {
        self.xml_for(Operation::ExportList).await?.export_list(action).await
    }

    pub async fn get_job_status(&self, job_id: &str) -> Result<JobStatus, Error> {
        self.xml_for(Operation::GetJobStatus)
            .await?
            .execute(&GetJobStatus::new(job_id))
            .await
    }

    pub async fn get_list_meta_data(&self, list_id: &str) -> Result<XmlNode, Error> {
        self.xml_for(Operation::GetListMetaData)
            .await?
            .execute(&GetListMetaData::new(list_id))
            .await
    }

    pub async fn get_lists(&self, fields: &[(String, String)]) -> Result<Vec<XmlNode>, Error> {
        self.xml_for(Operation::GetLists).await?.get_lists(fields).await
    }

    pub async fn create_contact_list(
        &self,
        action: &CreateContactList,
    ) -> Result<XmlNode, Error> {
        self.xml_for(Operation::CreateContactList)
            .await?
            .execute(action)
            .await
    }

    pub async fn add_contact_to_contact_list(
        &self,
        action: &AddContactToContactList,
    ) -> Result<(), Error> {
        self.xml_for(Operation::AddContactToContactList)
            .await?
            .execute(action)
            .await
    }

    // ── Query operations ─────────────────────────────────────────────

    pub async fn get_query(&self, list_id: &str) -> Result<XmlNode, Error> {
        self.xml_for(Operation::GetQuery)
            .await?
            .execute(&GetQuery::new(list_id))
            .await
    }

    pub async fn calculate_query(&self, action: &CalculateQuery) -> Result<String, Error> {
        self.xml_for(Operation::CalculateQuery).await?.execute(action).await
    }

    // ── Mailing operations ───────────────────────────────────────────

    pub async fn get_sent_mailings_for_org(
        &self,
        action: &GetSentMailingsForOrg,
    ) -> Result<Vec<XmlNode>, Error> {
        self.xml_for(Operation::GetSentMailingsForOrg)
            .await?
            .execute(action)
            .await
    }

    pub async fn get_mailing_templates(
        &self,
        action: &GetMailingTemplates,
    ) -> Result<Vec<XmlNode>, Error> {
        self.xml_for(Operation::GetMailingTemplates)
            .await?
            .execute(action)
            .await
    }

    pub async fn preview_mailing(&self, mailing_id: &str) -> Result<XmlNode, Error> {
        self.xml_for(Operation::PreviewMailing)
            .await?
            .execute(&PreviewMailing::new(mailing_id))
            .await
    }

    pub async fn get_aggregate_tracking_for_mailing(
        &self,
        action: &GetAggregateTrackingForMailing,
    ) -> Result<XmlNode, Error> {
        self.xml_for(Operation::GetAggregateTrackingForMailing)
            .await?
            .execute(action)
            .await
    }

    pub async fn schedule_mailing(&self, action: &ScheduleMailing) -> Result<String, Error> {
        self.xml_for(Operation::ScheduleMailing).await?.execute(action).await
    }

    pub async fn send_mailing(&self, action: &SendMailing) -> Result<XmlNode, Error> {
        self.xml_for(Operation::SendMailing).await?.execute(action).await
    }

    pub async fn raw_recipient_data_export(
        &self,
        action: &RawRecipientDataExport,
    ) -> Result<RawExportJob, Error> {
        self.xml_for(Operation::RawRecipientDataExport)
            .await?
            .execute(action)
            .await
    }

    // ── REST-only operations ─────────────────────────────────────────

    pub async fn create_event(
        &self,
        type_code: i64,
        timestamp: &str,
        attributes: &[(String, String)],
    ) -> Result<Value, Error> {
        match self.route(Operation::CreateEvent).await? {
            Route::Rest => {
                self.rest
                    .as_ref()
                    .expect("REST route implies REST connector")
                    .create_event(type_code, timestamp, attributes)
                    .await
            }
            Route::Xml => Err(Error::Configuration {
                message: "CreateEvent requires an authenticated REST connector".to_owned(),
            }),
        }
    }

    pub async fn gdpr_access(
        &self,
        database_id: &str,
        rows: &[Vec<String>],
    ) -> Result<Value, Error> {
        match self.route(Operation::GdprAccess).await? {
            Route::Rest => {
                self.rest
                    .as_ref()
                    .expect("REST route implies REST connector")
                    .gdpr_access(database_id, rows)
                    .await
            }
            Route::Xml => Err(Error::Configuration {
                message: "GdprAccess requires an authenticated REST connector".to_owned(),
            }),
        }
    }

    pub async fn gdpr_erasure(
        &self,
        database_id: &str,
        rows: &[Vec<String>],
    ) -> Result<Value, Error> {
        match self.route(Operation::GdprErasure).await? {
            Route::Rest => {
                self.rest
                    .as_ref()
                    .expect("REST route implies REST connector")
                    .gdpr_erasure(database_id, rows)
                    .await
            }
            Route::Xml => Err(Error::Configuration {
                message: "GdprErasure requires an authenticated REST connector".to_owned(),
            }),
        }
    }
}
