//! Capacités de transport, abstraites derrière des traits pour que le
//! superviseur de session puisse être exercé contre un device simulé.

use crate::errors::ControlError;
use crate::model::PositionSnapshot;

/// High-level playback state reported by a renderer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
    Transitioning,
    NoMedia,
    /// Backend-specific or unknown state string.
    Unknown(String),
}

impl PlaybackState {
    /// Map a raw AVTransport CurrentTransportState string to a logical
    /// PlaybackState. Unrecognized strings never fail.
    pub fn from_upnp_state(raw: &str) -> Self {
        let s = raw.trim().to_ascii_uppercase();
        match s.as_str() {
            "STOPPED" => PlaybackState::Stopped,
            "PLAYING" => PlaybackState::Playing,
            "PAUSED_PLAYBACK" => PlaybackState::Paused,
            // States from the AVTransport spec that we normalize:
            "PAUSED_RECORDING" => PlaybackState::Paused,
            "RECORDING" => PlaybackState::Playing,
            "TRANSITIONING" => PlaybackState::Transitioning,
            // Common vendor-specific states:
            "BUFFERING" | "PREPARING" => PlaybackState::Transitioning,
            "NO_MEDIA_PRESENT" => PlaybackState::NoMedia,
            _ => PlaybackState::Unknown(raw.to_string()),
        }
    }

    /// Returns a human-readable label for the playback state.
    pub fn as_str(&self) -> &str {
        match self {
            PlaybackState::Stopped => "STOPPED",
            PlaybackState::Playing => "PLAYING",
            PlaybackState::Paused => "PAUSED",
            PlaybackState::Transitioning => "TRANSITIONING",
            PlaybackState::NoMedia => "NO_MEDIA",
            PlaybackState::Unknown(s) => s.as_str(),
        }
    }
}

/// Commandes de transport d'une session (URI + lecture + arrêt).
pub trait TransportControl {
    /// Installe la ressource à lire (URI + métadonnées DIDL, souvent
    /// vides) sans démarrer la lecture.
    fn set_uri(&self, uri: &str, metadata: &str) -> Result<(), ControlError>;

    /// Démarre la lecture de la ressource installée.
    fn play(&self) -> Result<(), ControlError>;

    /// Arrête la lecture. Les appelants traitent l'échec en best-effort.
    fn stop(&self) -> Result<(), ControlError>;
}

/// Observation de la lecture en cours.
pub trait PlaybackMonitor {
    /// Une photo position + état, obtenue par un aller-retour device.
    fn position_snapshot(&self) -> Result<PositionSnapshot, ControlError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_standard_states() {
        assert_eq!(
            PlaybackState::from_upnp_state("PLAYING"),
            PlaybackState::Playing
        );
        assert_eq!(
            PlaybackState::from_upnp_state("stopped"),
            PlaybackState::Stopped
        );
        assert_eq!(
            PlaybackState::from_upnp_state(" NO_MEDIA_PRESENT "),
            PlaybackState::NoMedia
        );
        assert_eq!(
            PlaybackState::from_upnp_state("PAUSED_PLAYBACK"),
            PlaybackState::Paused
        );
    }

    #[test]
    fn maps_vendor_buffering_to_transitioning() {
        assert_eq!(
            PlaybackState::from_upnp_state("BUFFERING"),
            PlaybackState::Transitioning
        );
        assert_eq!(
            PlaybackState::from_upnp_state("TRANSITIONING"),
            PlaybackState::Transitioning
        );
    }

    #[test]
    fn unknown_states_are_preserved() {
        let state = PlaybackState::from_upnp_state("CUSTOM_VENDOR_STATE");
        assert_eq!(
            state,
            PlaybackState::Unknown("CUSTOM_VENDOR_STATE".to_string())
        );
        assert_eq!(state.as_str(), "CUSTOM_VENDOR_STATE");
    }
}
