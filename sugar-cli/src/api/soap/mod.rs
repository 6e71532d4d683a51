//! SOAP binding for the SugarCRM `soap.php` endpoint
//!
//! Requests are SOAP 1.1 RPC/encoded envelopes written with `quick-xml`;
//! responses are decoded with `roxmltree` into the wire models.

pub mod envelope;
pub mod response;
pub mod transport;

pub use envelope::{Envelope, SUGAR_NAMESPACE};
pub use response::{FromSoap, decode};
pub use transport::{SoapTransport, SoapTransportBuilder};
