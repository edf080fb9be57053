//! # pmocastserve - Serveur de fichier éphémère pour pmocast
//!
//! Quand la source à lire est un fichier local, le renderer doit
//! pouvoir venir le chercher en HTTP. Ce crate fournit:
//!
//! - ✅ Un serveur HTTP jetable qui publie UN fichier sous UN chemin
//! - ✅ La résolution d'une source opérateur (URL distante ou fichier)
//! - ✅ La détection de l'IP locale à annoncer au renderer
//!
//! Le serveur vit sur son propre thread avec un runtime tokio dédié;
//! l'appelant reste synchrone et le coupe par `stop()` (ou au drop).

pub mod ip_utils;
pub mod server;
pub mod source;

pub use ip_utils::guess_local_ip;
pub use server::{FileServer, ServeError};
pub use source::{ResolvedSource, is_http_url, resolve_media_source};
