//! # Module SOAP - Simple Object Access Protocol
//!
//! Support SOAP pour UPnP côté control point :
//!
//! - ✅ Construction de requêtes d'action (arguments ordonnés)
//! - ✅ Parsing d'enveloppes de réponse
//! - ✅ Extraction des SOAP Faults et des erreurs UPnP imbriquées
//! - ✅ Construction de réponses/faults (utile pour simuler un device
//!   dans les tests)
//!
//! ## Example
//!
//! ```
//! use pmocastupnp::soap::{build_soap_request, parse_soap_envelope};
//!
//! let xml = build_soap_request(
//!     "urn:schemas-upnp-org:service:AVTransport:1",
//!     "Play",
//!     &[("InstanceID", "0"), ("Speed", "1")],
//! )
//! .unwrap();
//! assert!(xml.contains("<u:Play"));
//!
//! let envelope = parse_soap_envelope(xml.as_bytes()).unwrap();
//! assert!(envelope.body.content.name.ends_with("Body"));
//! ```

mod builder;
mod envelope;
mod fault;

pub use builder::{build_soap_request, build_soap_response};
pub use envelope::{SoapBody, SoapEnvelope, SoapParseError, parse_soap_envelope};
pub use fault::{SoapFault, UpnpError, build_soap_fault, parse_soap_fault};
