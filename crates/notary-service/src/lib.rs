//! Verification orchestrator for Notary.
//!
//! [`NotaryService`] runs the three workflows on top of the content hasher
//! and the ledger client:
//! - **register**: hash, submit, await confirmation, decode the event
//! - **verify**: hash, look the digest up; never writes
//! - **list by owner**: validate the address, enumerate ids, resolve each
//!
//! Every failure is a [`ServiceError`] whose [`ErrorKind`] is stable and
//! serializable.

pub mod error;
pub mod results;
pub mod service;
pub mod staging;

pub use error::{ErrorKind, ErrorReport, ServiceError, ServiceResult};
pub use results::{
    DocumentList, DocumentSummary, RegisterResult, VerifyResult, NOT_FOUND_MESSAGE,
    REGISTERED_MESSAGE, VERIFIED_MESSAGE,
};
pub use service::NotaryService;
pub use staging::{StagedUpload, StagingArea, UploadWriter};
