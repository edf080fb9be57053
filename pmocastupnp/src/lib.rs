//! # pmocastupnp - Plomberie UPnP côté control point
//!
//! Ce crate regroupe les deux protocoles de bas niveau dont un control
//! point a besoin, sans aucune logique de session :
//!
//! - ✅ [`ssdp`] : découverte SSDP (M-SEARCH multicast, collecte des
//!   réponses unicast et des annonces `ssdp:alive`)
//! - ✅ [`soap`] : enveloppes SOAP UPnP (construction de requêtes,
//!   parsing des réponses et des faults)
//!
//! La résolution des descriptions de devices et le pilotage AVTransport
//! vivent dans `pmocastcontrol`, qui s'appuie sur ce crate.

pub mod soap;
pub mod ssdp;
