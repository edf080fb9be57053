//! Découverte one-shot des MediaRenderers du réseau local.
//!
//! Un run = un burst de M-SEARCH, une fenêtre d'écoute complète, puis
//! fetch des descriptions et filtrage AVTransport. La fenêtre est
//! toujours consommée en entier: les devices lents à répondre comptent
//! autant que les rapides, et une liste vide est un résultat valide.

use std::collections::HashSet;
use std::io;
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use pmocastupnp::ssdp::{SsdpClient, SsdpEvent};

use crate::model::RendererInfo;
use crate::provider::HttpXmlDescriptionProvider;

/// Cibles de recherche par défaut: les MediaRenderers déclarés, plus
/// ssdp:all pour les devices qui ne répondent qu'à la cible générique.
pub const DEFAULT_SEARCH_TARGETS: &[&str] = &[
    "urn:schemas-upnp-org:device:MediaRenderer:1",
    "ssdp:all",
];

/// Pause entre deux M-SEARCH du burst initial.
const MSEARCH_GAP: Duration = Duration::from_millis(200);

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("SSDP socket error: {0}")]
    Socket(#[from] io::Error),
}

/// Endpoint annoncé par SSDP, avant fetch de sa description.
#[derive(Debug, Clone)]
pub struct DiscoveredEndpoint {
    /// UDN extrait du USN, en minuscules (vide si le USN n'en porte pas)
    pub udn: String,
    pub location: String,
    pub server_header: String,
}

/// Paramètres d'un run de découverte.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// Fenêtre d'écoute totale, consommée en entier
    pub timeout: Duration,
    /// Valeur MX des M-SEARCH (délai max de réponse demandé aux devices)
    pub mx: u32,
    /// Timeout HTTP du fetch de chaque description.xml
    pub description_timeout_secs: u64,
    pub search_targets: Vec<String>,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            mx: 3,
            description_timeout_secs: 5,
            search_targets: DEFAULT_SEARCH_TARGETS
                .iter()
                .map(|st| st.to_string())
                .collect(),
        }
    }
}

/// Fournit les descriptions haut niveau à partir d'un endpoint découvert.
pub trait DeviceDescriptionProvider: Send + Sync {
    /// Construit un RendererInfo pour cet endpoint, ou None s'il ne
    /// s'agit pas d'un renderer AVTransport exploitable.
    fn build_renderer_info(&self, endpoint: &DiscoveredEndpoint) -> Option<RendererInfo>;
}

/// Lance une découverte complète avec le provider HTTP standard.
pub fn discover_renderers(options: &DiscoveryOptions) -> Result<Vec<RendererInfo>, DiscoveryError> {
    let provider = HttpXmlDescriptionProvider::new(options.description_timeout_secs);
    discover_renderers_with(options, &provider)
}

/// Variante paramétrée par provider (les tests injectent un provider
/// sans réseau).
pub fn discover_renderers_with<P: DeviceDescriptionProvider>(
    options: &DiscoveryOptions,
    provider: &P,
) -> Result<Vec<RendererInfo>, DiscoveryError> {
    let client = SsdpClient::new()?;

    for (i, st) in options.search_targets.iter().enumerate() {
        if i > 0 {
            thread::sleep(MSEARCH_GAP);
        }
        // Un M-SEARCH qui part mal n'annule pas le run: les autres
        // cibles et les NOTIFY spontanés restent exploitables
        if let Err(e) = client.send_msearch(st, options.mx) {
            warn!("M-SEARCH for {} failed: {}", st, e);
        }
    }

    let events = client.collect_events(options.timeout);
    debug!("SSDP window closed: {} raw events", events.len());

    let endpoints = dedupe_endpoints(events);
    info!("📡 {} unique endpoint(s) announced themselves", endpoints.len());

    Ok(collect_renderers(&endpoints, provider))
}

/// Réduit le flot d'événements SSDP à un endpoint par device.
///
/// Clé de dédoublonnage: UDN extrait du USN, sinon l'URL LOCATION. Les
/// annonces Alive et les réponses M-SEARCH comptent toutes les deux;
/// les ByeBye sont ignorés (le run est one-shot, pas un registre).
fn dedupe_endpoints(events: Vec<SsdpEvent>) -> Vec<DiscoveredEndpoint> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut endpoints = Vec::new();

    for event in events {
        let (usn, location, server) = match event {
            SsdpEvent::Alive {
                usn,
                location,
                server,
                ..
            }
            | SsdpEvent::SearchResponse {
                usn,
                location,
                server,
                ..
            } => (usn, location, server),
            SsdpEvent::ByeBye { .. } => continue,
        };

        let udn = extract_udn_from_usn(&usn).unwrap_or_default();
        let key = if udn.is_empty() {
            location.clone()
        } else {
            udn.clone()
        };

        if seen.insert(key) {
            endpoints.push(DiscoveredEndpoint {
                udn,
                location,
                server_header: server,
            });
        }
    }

    endpoints
}

/// Fetch + filtrage de chaque endpoint, en soft-fail par device.
fn collect_renderers<P: DeviceDescriptionProvider>(
    endpoints: &[DiscoveredEndpoint],
    provider: &P,
) -> Vec<RendererInfo> {
    endpoints
        .iter()
        .filter_map(|endpoint| {
            let info = provider.build_renderer_info(endpoint)?;
            debug!(
                "Renderer kept: udn={} name={} control={}",
                info.udn, info.friendly_name, info.avtransport_control_url
            );
            Some(info)
        })
        .collect()
}

/// Extrait l'UDN (`uuid:...`) d'un USN SSDP, en minuscules.
///
/// Un USN vaut soit l'UDN nu, soit `UDN::type`; tout ce qui ne contient
/// pas `uuid:` donne None.
fn extract_udn_from_usn(usn: &str) -> Option<String> {
    let lower = usn.trim().to_ascii_lowercase();
    if let Some(idx) = lower.find("uuid:") {
        let sub = &lower[idx..];
        if let Some(end) = sub.find("::") {
            Some(sub[..end].to_string())
        } else {
            Some(sub.to_string())
        }
    } else {
        None
    }
}
