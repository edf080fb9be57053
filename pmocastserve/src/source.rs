//! Résolution d'une source média donnée par l'opérateur.
//!
//! Une source est soit une URL déjà accessible au renderer (http/https,
//! passée telle quelle), soit un chemin de fichier local, auquel cas un
//! [`FileServer`] est démarré pour la publier.

use std::path::Path;

use tracing::debug;

use crate::server::{FileServer, ServeError};

/// Source prête à être envoyée au renderer.
#[derive(Debug)]
pub enum ResolvedSource {
    /// URL distante, le renderer la lit directement
    Remote(String),
    /// Fichier local publié par notre serveur éphémère
    Local(FileServer),
}

impl ResolvedSource {
    /// URI à passer à SetAVTransportURI.
    pub fn url(&self) -> &str {
        match self {
            ResolvedSource::Remote(url) => url,
            ResolvedSource::Local(server) => server.url(),
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, ResolvedSource::Local(_))
    }

    /// Coupe le serveur de fichier s'il y en a un. Sans effet pour une
    /// source distante ou après un premier appel.
    pub fn shutdown(&mut self) {
        if let ResolvedSource::Local(server) = self {
            server.stop();
        }
    }
}

/// Vrai si la source est une URL http(s), auquel cas on ne sert rien.
pub fn is_http_url(source: &str) -> bool {
    let lower = source.trim().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Résout une source opérateur en URI lisible par le renderer.
///
/// - URL http(s): renvoyée telle quelle, rien n'est servi.
/// - Chemin local: vérifie le fichier et démarre un serveur éphémère;
///   un chemin introuvable remonte [`ServeError::SourceNotFound`].
///
/// `host_ip` est l'adresse annoncée dans l'URL publiée; `port` 0 laisse
/// l'OS choisir.
pub fn resolve_media_source(
    source: &str,
    host_ip: &str,
    port: u16,
) -> Result<ResolvedSource, ServeError> {
    let trimmed = source.trim();

    if is_http_url(trimmed) {
        debug!("Source is already an HTTP URL, passing through");
        return Ok(ResolvedSource::Remote(trimmed.to_string()));
    }

    let server = FileServer::start(Path::new(trimmed), host_ip, port)?;
    Ok(ResolvedSource::Local(server))
}
