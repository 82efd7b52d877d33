// List-level operations: exports, metadata, contact lists, job status.

use chrono::{DateTime, Utc};

use crate::error::Error;
use crate::xml::actions::XmlAction;
use crate::xml::dom::XmlNode;
use crate::xml::envelope::ResponseEnvelope;
use crate::xml::writer::{XmlBuilder, legacy_timestamp};

/// Which contacts a list export includes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportType {
    /// Entire database; system columns are not exported by default.
    #[default]
    All,
    OptIn,
    OptOut,
    Undeliverable,
}

impl ExportType {
    fn as_str(self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::OptIn => "OPT_IN",
            Self::OptOut => "OPT_OUT",
            Self::Undeliverable => "UNDELIVERABLE",
        }
    }
}

/// File type for exported data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Csv,
    Tab,
    Pipe,
}

impl ExportFormat {
    fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "CSV",
            Self::Tab => "TAB",
            Self::Pipe => "PIPE",
        }
    }
}

/// List visibility scope: private (0) or shared (1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Private,
    Shared,
}

impl Visibility {
    fn code(self) -> &'static str {
        match self {
            Self::Private => "0",
            Self::Shared => "1",
        }
    }
}

/// A queued server-side data job: its id and the file path where the result
/// will land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportJob {
    pub job_id: String,
    pub file_path: String,
}

/// `ExportList`: queue an export of a database, query, or contact list.
///
/// Yields the job id and result file path; the job itself runs server-side
/// and is not awaited here.
#[derive(Debug, Clone)]
pub struct ExportList {
    list_id: String,
    export_type: ExportType,
    export_format: ExportFormat,
    list_date_format: String,
    add_to_stored_files: bool,
    date_start: Option<DateTime<Utc>>,
    date_end: Option<DateTime<Utc>>,
    columns: Vec<String>,
}

impl ExportList {
    pub fn new(list_id: impl Into<String>) -> Self {
        Self {
            list_id: list_id.into(),
            export_type: ExportType::default(),
            export_format: ExportFormat::default(),
            list_date_format: "yyyy-mm-dd".to_owned(),
            add_to_stored_files: true,
            date_start: None,
            date_end: None,
            columns: Vec::new(),
        }
    }

    pub fn export_type(mut self, export_type: ExportType) -> Self {
        self.export_type = export_type;
        self
    }

    pub fn export_format(mut self, export_format: ExportFormat) -> Self {
        self.export_format = export_format;
        self
    }

    /// Date format for date fields in the exported file (`LIST_DATE_FORMAT`).
    pub fn list_date_format(mut self, format: impl Into<String>) -> Self {
        self.list_date_format = format.into();
        self
    }

    /// Write the output to Stored Files instead of the user's FTP download
    /// directory. On by default.
    pub fn add_to_stored_files(mut self, stored: bool) -> Self {
        self.add_to_stored_files = stored;
        self
    }

    pub fn date_start(mut self, start: DateTime<Utc>) -> Self {
        self.date_start = Some(start);
        self
    }

    pub fn date_end(mut self, end: DateTime<Utc>) -> Self {
        self.date_end = Some(end);
        self
    }

    /// Restrict the export to the named columns. `LIST_ID` and `MAILING_ID`
    /// are always present server-side and are stripped here.
    pub fn columns(mut self, columns: Vec<String>) -> Self {
        self.columns = columns
            .into_iter()
            .filter(|c| c != "LIST_ID" && c != "MAILING_ID")
            .collect();
        self
    }
}

impl XmlAction for ExportList {
    type Output = ExportJob;

    fn build_request(&self) -> String {
        let mut xml = XmlBuilder::new("ExportList");
        xml.text_element("LIST_ID", &self.list_id)
            .text_element("EXPORT_TYPE", self.export_type.as_str())
            .text_element("EXPORT_FORMAT", self.export_format.as_str())
            .text_element("LIST_DATE_FORMAT", &self.list_date_format)
            .flag_element("ADD_TO_STORED_FILES", self.add_to_stored_files)
            .opt_text_element("DATE_START", self.date_start.map(legacy_timestamp).as_deref())
            .opt_text_element("DATE_END", self.date_end.map(legacy_timestamp).as_deref());
        if !self.columns.is_empty() {
            xml.open("EXPORT_COLUMNS");
            for column in &self.columns {
                xml.text_element("COLUMN", column);
            }
            xml.close("EXPORT_COLUMNS");
        }
        xml.finish()
    }

    fn parse_response(&self, envelope: &ResponseEnvelope) -> Result<ExportJob, Error> {
        Ok(ExportJob {
            job_id: envelope.require_text("JOB_ID")?,
            file_path: envelope.require_text("FILE_PATH")?,
        })
    }
}

/// Lifecycle state of a server-side data job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Waiting,
    Running,
    Cancelled,
    Error,
    Complete,
    /// A status string this client does not know about.
    Other(String),
}

impl JobStatus {
    fn from_response(raw: &str) -> Self {
        match raw {
            "WAITING" => Self::Waiting,
            "RUNNING" => Self::Running,
            "CANCELLED" => Self::Cancelled,
            "ERROR" => Self::Error,
            "COMPLETE" => Self::Complete,
            other => Self::Other(other.to_owned()),
        }
    }
}

/// `GetJobStatus`: check on a queued data job.
#[derive(Debug, Clone)]
pub struct GetJobStatus {
    job_id: String,
}

impl GetJobStatus {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
        }
    }
}

impl XmlAction for GetJobStatus {
    type Output = JobStatus;

    fn build_request(&self) -> String {
        let mut xml = XmlBuilder::new("GetJobStatus");
        xml.text_element("JOB_ID", &self.job_id);
        xml.finish()
    }

    fn parse_response(&self, envelope: &ResponseEnvelope) -> Result<JobStatus, Error> {
        Ok(JobStatus::from_response(
            &envelope.require_text("JOB_STATUS")?,
        ))
    }
}

/// `GetListMetaData`: field definitions and key columns for a list.
///
/// Yields the full `RESULT` subtree; callers pick the metadata they need.
#[derive(Debug, Clone)]
pub struct GetListMetaData {
    list_id: String,
}

impl GetListMetaData {
    pub fn new(list_id: impl Into<String>) -> Self {
        Self {
            list_id: list_id.into(),
        }
    }
}

impl XmlAction for GetListMetaData {
    type Output = XmlNode;

    fn build_request(&self) -> String {
        let mut xml = XmlBuilder::new("GetListMetaData");
        xml.text_element("LIST_ID", &self.list_id);
        xml.finish()
    }

    fn parse_response(&self, envelope: &ResponseEnvelope) -> Result<XmlNode, Error> {
        Ok(envelope.result().clone())
    }
}

/// `GetLists`: enumerate databases, queries, and contact lists in one
/// visibility scope. Yields one node per `LIST` record.
#[derive(Debug, Clone)]
pub struct GetLists {
    visibility: Visibility,
    list_type: String,
    fields: Vec<(String, String)>,
}

impl GetLists {
    /// Defaults to `LIST_TYPE` 2 (databases, queries, and contact lists).
    pub fn new(visibility: Visibility) -> Self {
        Self {
            visibility,
            list_type: "2".to_owned(),
            fields: Vec::new(),
        }
    }

    pub fn list_type(mut self, list_type: impl Into<String>) -> Self {
        self.list_type = list_type.into();
        self
    }

    /// Extra query element, e.g. `INCLUDE_ALL_LISTS` or `FOLDER_ID`. Names
    /// are uppercased on serialization.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }
}

impl XmlAction for GetLists {
    type Output = Vec<XmlNode>;

    fn build_request(&self) -> String {
        let mut xml = XmlBuilder::new("GetLists");
        xml.text_element("VISIBILITY", self.visibility.code())
            .text_element("LIST_TYPE", &self.list_type);
        for (name, value) in &self.fields {
            xml.text_element(&name.to_uppercase(), value);
        }
        xml.finish()
    }

    fn parse_response(&self, envelope: &ResponseEnvelope) -> Result<Vec<XmlNode>, Error> {
        Ok(envelope.result().children_named("LIST").cloned().collect())
    }
}

/// `CreateContactList`: create a contact list under a database.
///
/// Yields the full `RESULT` subtree (which carries the new
/// `CONTACT_LIST_ID`).
#[derive(Debug, Clone)]
pub struct CreateContactList {
    database_id: String,
    contact_list_name: String,
    visibility: Visibility,
    parent_folder_path: Option<String>,
    create_parent_folder: bool,
}

impl CreateContactList {
    pub fn new(
        database_id: impl Into<String>,
        contact_list_name: impl Into<String>,
        visibility: Visibility,
    ) -> Self {
        Self {
            database_id: database_id.into(),
            contact_list_name: contact_list_name.into(),
            visibility,
            parent_folder_path: None,
            create_parent_folder: false,
        }
    }

    pub fn parent_folder_path(mut self, path: impl Into<String>) -> Self {
        self.parent_folder_path = Some(path.into());
        self
    }

    /// Create the parent folder when it does not exist yet.
    pub fn create_parent_folder(mut self, create: bool) -> Self {
        self.create_parent_folder = create;
        self
    }
}

impl XmlAction for CreateContactList {
    type Output = XmlNode;

    fn build_request(&self) -> String {
        let mut xml = XmlBuilder::new("CreateContactList");
        xml.text_element("DATABASE_ID", &self.database_id)
            .text_element("CONTACT_LIST_NAME", &self.contact_list_name)
            .text_element("VISIBILITY", self.visibility.code())
            .opt_text_element("PARENT_FOLDER_PATH", self.parent_folder_path.as_deref())
            .flag_element("CREATE_PARENT_FOLDER", self.create_parent_folder);
        xml.finish()
    }

    fn parse_response(&self, envelope: &ResponseEnvelope) -> Result<XmlNode, Error> {
        Ok(envelope.result().clone())
    }
}

/// `AddContactToContactList`: attach an existing contact to a contact list
/// by contact id.
#[derive(Debug, Clone)]
pub struct AddContactToContactList {
    contact_list_id: String,
    contact_id: String,
}

impl AddContactToContactList {
    pub fn new(contact_list_id: impl Into<String>, contact_id: impl Into<String>) -> Self {
        Self {
            contact_list_id: contact_list_id.into(),
            contact_id: contact_id.into(),
        }
    }
}

impl XmlAction for AddContactToContactList {
    type Output = ();

    fn build_request(&self) -> String {
        let mut xml = XmlBuilder::new("AddContactToContactList");
        xml.text_element("CONTACT_LIST_ID", &self.contact_list_id)
            .text_element("CONTACT_ID", &self.contact_id);
        xml.finish()
    }

    fn parse_response(&self, _envelope: &ResponseEnvelope) -> Result<(), Error> {
        Ok(())
    }
}
