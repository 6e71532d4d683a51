//! Error types for the SugarCRM client
//!
//! Domain failures reported by the server inside a response body surface as
//! [`SugarFault`]; everything else (transport, SOAP faults, malformed XML) is
//! a separate [`ClientError`] variant so callers can tell them apart.

use std::fmt::Write;
use thiserror::Error;

/// Column width used when rendering a fault report
const REPORT_PAD: usize = 20;

/// A non-zero error signal returned by a SugarCRM operation.
///
/// All three fields are carried verbatim from the server response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{description}")]
pub struct SugarFault {
    pub number: String,
    pub name: String,
    pub description: String,
}

impl SugarFault {
    /// Render the fault as an aligned Name/Description/Number block
    pub fn report(&self) -> String {
        let mut out = String::new();
        for (label, value) in [
            ("Name:", &self.name),
            ("Description:", &self.description),
            ("Number:", &self.number),
        ] {
            let _ = writeln!(out, "{label:<width$}{value}", width = REPORT_PAD);
        }
        out
    }
}

/// Errors raised by the SugarCRM client
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server reported a domain-level failure
    #[error(transparent)]
    Sugar(#[from] SugarFault),

    /// The reachability probe before login failed
    #[error("endpoint {url} is unreachable")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The HTTP request itself failed
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status without a SOAP fault in the body
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The server answered with a SOAP `Fault` element
    #[error("SOAP fault {code}: {message}")]
    SoapFault { code: String, message: String },

    /// The response body was not well-formed XML
    #[error("invalid XML in response: {0}")]
    Xml(#[from] roxmltree::Error),

    /// The response was XML but did not have the expected shape
    #[error("malformed response: {0}")]
    Malformed(String),

    /// `get_entry` returned no entry for the requested id
    #[error("no {module} entry with id {id}")]
    EntryNotFound { module: String, id: String },

    /// Client configuration is incomplete or invalid
    #[error("configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// The domain fault carried by this error, if any
    pub fn as_fault(&self) -> Option<&SugarFault> {
        match self {
            Self::Sugar(fault) => Some(fault),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
