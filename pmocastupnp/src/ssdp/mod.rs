//! # Module SSDP - Simple Service Discovery Protocol
//!
//! Découverte des devices UPnP côté control point :
//!
//! - ✅ Envoi de requêtes M-SEARCH sur le groupe multicast standard
//! - ✅ Collecte bornée des réponses unicast (HTTP/1.1 200)
//! - ✅ Prise en compte des annonces `NOTIFY ssdp:alive` reçues pendant
//!   la fenêtre de collecte
//!
//! Ce module ne fait aucun dédoublonnage : il restitue les événements
//! dans l'ordre d'arrivée et laisse l'appelant décider.

mod client;

pub use client::{SsdpClient, SsdpEvent};

/// Adresse multicast SSDP standard
pub const SSDP_MULTICAST_ADDR: &str = "239.255.255.250";

/// Port SSDP standard
pub const SSDP_PORT: u16 = 1900;

/// Durée de vie par défaut d'une annonce (secondes)
pub const MAX_AGE: u32 = 1800;
