//! # pmocastcontrol - Control point UPnP AV pour pmocast
//!
//! Tout ce qu'il faut pour piloter un MediaRenderer le temps d'une
//! session de lecture :
//!
//! - ✅ Découverte ponctuelle des renderers (SSDP + description.xml)
//! - ✅ Client AVTransport (SetAVTransportURI, Play, Stop,
//!   GetPositionInfo, GetTransportInfo)
//! - ✅ Superviseur de lecture (polling + annulation opérateur)
//!
//! La plomberie SSDP/SOAP vient de `pmocastupnp`; le serveur de fichier
//! éphémère vit dans `pmocastserve`.

pub mod avtransport_client;
pub mod capabilities;
pub mod discovery;
pub mod errors;
pub mod model;
pub mod provider;
pub mod session;
pub mod soap_client;
pub mod time_utils;

pub use avtransport_client::{AvTransportClient, PositionInfo, TransportInfo};
pub use capabilities::{PlaybackMonitor, PlaybackState, TransportControl};
pub use discovery::{
    DEFAULT_SEARCH_TARGETS, DiscoveredEndpoint, DiscoveryError, DiscoveryOptions,
    discover_renderers,
};
pub use errors::ControlError;
pub use model::{PositionSnapshot, RendererInfo};
pub use provider::{DescriptionError, HttpXmlDescriptionProvider};
pub use session::{SessionOptions, SessionOutcome, run_session};
