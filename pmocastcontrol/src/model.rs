//! Types décrivant un renderer découvert et l'état d'une lecture.

use std::time::Duration;

use crate::capabilities::PlaybackState;

/// Description résolue d'un MediaRenderer, produite par la découverte.
///
/// Invariant: les champs AVTransport sont non vides. Un device dont la
/// description n'expose pas de service AVTransport avec controlURL est
/// écarté pendant la découverte et ne construit jamais de RendererInfo.
/// La valeur vit le temps d'un run; rien n'est persisté.
#[derive(Debug, Clone)]
pub struct RendererInfo {
    /// UDN en minuscules (vide si le device n'en annonce pas)
    pub udn: String,
    pub friendly_name: String,
    pub model_name: String,
    pub manufacturer: String,
    /// URL du description.xml (en-tête LOCATION de la réponse SSDP)
    pub location: String,
    /// En-tête SERVER de la réponse SSDP, informatif
    pub server_header: String,
    /// URN du service AVTransport annoncé
    pub avtransport_service_type: String,
    /// controlURL AVTransport, résolu en URL absolue
    pub avtransport_control_url: String,
}

/// Photo instantanée de la position de lecture, une par poll.
///
/// Jamais mutée: chaque poll en produit une nouvelle.
#[derive(Debug, Clone)]
pub struct PositionSnapshot {
    pub elapsed: Duration,
    /// `None` quand le device ne connaît pas la durée (flux, sentinelle
    /// NOT_IMPLEMENTED, valeur illisible)
    pub total: Option<Duration>,
    pub state: PlaybackState,
}

impl PositionSnapshot {
    pub fn new(elapsed_secs: u64, total_secs: Option<u64>, state: PlaybackState) -> Self {
        Self {
            elapsed: Duration::from_secs(elapsed_secs),
            total: total_secs.map(Duration::from_secs),
            state,
        }
    }
}
