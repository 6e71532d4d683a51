//! SugarCRM SOAP API client
//!
//! [`SugarClient`] is the entry point: it logs in over a [`SugarService`]
//! (normally the [`SoapTransport`]), raises server error signals as
//! [`SugarFault`]s and turns name/value lists into [`SugarEntry`] records.
//! Field lists for the "all fields" calls come from a [`ModuleFieldCache`]
//! that can be shared between clients.

pub mod auth;
pub mod cache;
pub mod client;
pub mod entry;
pub mod error;
pub mod models;
pub mod module_name;
pub mod query;
pub mod service;
pub mod soap;

#[cfg(test)]
pub(crate) mod testing;

pub use auth::{Credentials, password_digest};
pub use cache::ModuleFieldCache;
pub use client::{LogoutStatus, SugarClient, SugarClientBuilder};
pub use entry::SugarEntry;
pub use error::{ClientError, Result, SugarFault};
pub use models::{ErrorValue, ModuleField, NameValue, NoteAttachment};
pub use module_name::ModuleName;
pub use query::ListQuery;
pub use service::SugarService;
pub use soap::{SoapTransport, SoapTransportBuilder};
