// Typed request builders and response extractors for legacy operations.
//
// One struct per operation. Fields are named and compile-time checked;
// construction is `new(...)` for required fields plus chained builders for
// the rest. Each action serializes itself into the operation-specific
// element tree and knows exactly which subset of the validated response it
// returns — nothing here is generic over response shapes.
//
// Identifier fields are carried as strings end-to-end: values matching
// `^\d+$` pass through untouched, and anything larger or non-numeric is
// preserved verbatim instead of being coerced.

pub mod lists;
pub mod mailings;
pub mod queries;
pub mod recipients;

pub use lists::{
    AddContactToContactList, CreateContactList, ExportFormat, ExportJob, ExportList, ExportType,
    GetJobStatus, GetListMetaData, GetLists, JobStatus, Visibility,
};
pub use mailings::{
    GetAggregateTrackingForMailing, GetMailingTemplates, GetSentMailingsForOrg, PreviewMailing,
    RawExportJob, RawRecipientDataExport, ScheduleMailing, SendMailing, SentMailingFlags,
};
pub use queries::{CalculateQuery, GetQuery};
pub use recipients::{
    AddRecipient, CreatedFrom, GetModifiedRecipients, RemoveRecipient, SelectRecipientData,
    UpdateRecipient,
};

use crate::error::Error;
use crate::xml::envelope::ResponseEnvelope;

/// One legacy API operation: a typed request builder plus the extractor for
/// its slice of the validated response.
pub trait XmlAction {
    /// What the operation yields once the envelope has been validated.
    type Output;

    /// Serialize the operation element (the direct child of `<Body>`).
    fn build_request(&self) -> String;

    /// Extract and reshape this operation's subtree of a validated envelope.
    fn parse_response(&self, envelope: &ResponseEnvelope) -> Result<Self::Output, Error>;
}

/// Value-style boolean elements carry `TRUE`/`FALSE` text, unlike flag
/// elements which are self-closing-or-absent.
pub(crate) fn bool_text(value: bool) -> &'static str {
    if value { "TRUE" } else { "FALSE" }
}
