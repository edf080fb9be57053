//! Client AVTransport:1 (SetAVTransportURI, Play, Stop, GetTransportInfo,
//! GetPositionInfo).
//!
//! Chaque méthode fait un aller-retour SOAP synchrone sur la control URL
//! du renderer. L'arité et l'ordre des arguments suivent la déclaration
//! du service AVTransport.

use tracing::debug;

use pmocastupnp::soap::SoapEnvelope;

use crate::capabilities::{PlaybackMonitor, PlaybackState, TransportControl};
use crate::errors::ControlError;
use crate::model::{PositionSnapshot, RendererInfo};
use crate::soap_client::{
    SoapCallResult, ensure_success, extract_child_text, extract_optional_child_text,
    find_child_with_suffix, invoke_upnp_action,
};
use crate::time_utils::parse_upnp_time;

/// Timeout HTTP par défaut des actions de contrôle.
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone)]
pub struct AvTransportClient {
    pub control_url: String,
    pub service_type: String,
    timeout_secs: u64,
}

/// Réponse GetTransportInfo, champs bruts du device.
#[derive(Debug, Clone)]
pub struct TransportInfo {
    pub current_transport_state: String,
    pub current_transport_status: String,
    pub current_speed: String,
}

/// Réponse GetPositionInfo.
///
/// Les champs temporels restent des chaînes AVTransport brutes
/// (`H:MM:SS` ou sentinelle); [`crate::time_utils::parse_upnp_time`]
/// les convertit au moment de l'assemblage du snapshot.
#[derive(Debug, Clone, Default)]
pub struct PositionInfo {
    pub track: Option<u32>,
    pub track_duration: Option<String>,
    pub track_uri: Option<String>,
    pub rel_time: Option<String>,
}

impl AvTransportClient {
    pub fn new(control_url: String, service_type: String) -> Self {
        Self {
            control_url,
            service_type,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Construit un client à partir d'un renderer découvert.
    pub fn from_renderer(renderer: &RendererInfo) -> Self {
        Self::new(
            renderer.avtransport_control_url.clone(),
            renderer.avtransport_service_type.clone(),
        )
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    fn invoke(&self, action: &str, args: &[(&str, &str)]) -> Result<SoapCallResult, ControlError> {
        invoke_upnp_action(
            &self.control_url,
            &self.service_type,
            action,
            args,
            self.timeout_secs,
        )
    }

    /// Installe l'URI à lire sur le transport, sans démarrer la lecture.
    ///
    /// Un SOAP Fault du device est remonté en
    /// [`ControlError::UriRejected`] (code + description UPnP).
    pub fn set_av_transport_uri(
        &self,
        instance_id: u32,
        uri: &str,
        metadata: &str,
    ) -> Result<(), ControlError> {
        let instance_id_str = instance_id.to_string();
        let args = [
            ("InstanceID", instance_id_str.as_str()),
            ("CurrentURI", uri),
            ("CurrentURIMetaData", metadata),
        ];

        let result = self.invoke("SetAVTransportURI", &args)?;
        ensure_success("SetAVTransportURI", &result).map_err(as_uri_rejection)?;

        debug!("✅ SetAVTransportURI accepted: {}", uri);
        Ok(())
    }

    /// Démarre la lecture à vitesse normale.
    ///
    /// Un SOAP Fault du device est remonté en
    /// [`ControlError::PlaybackRejected`].
    pub fn play(&self, instance_id: u32) -> Result<(), ControlError> {
        let instance_id_str = instance_id.to_string();
        let args = [
            ("InstanceID", instance_id_str.as_str()),
            ("Speed", "1"),
        ];

        let result = self.invoke("Play", &args)?;
        ensure_success("Play", &result).map_err(as_playback_rejection)?;

        debug!("✅ Play accepted");
        Ok(())
    }

    /// Arrête la lecture. Les appelants de fin de session traitent un
    /// échec en best-effort.
    pub fn stop(&self, instance_id: u32) -> Result<(), ControlError> {
        let instance_id_str = instance_id.to_string();
        let args = [("InstanceID", instance_id_str.as_str())];

        let result = self.invoke("Stop", &args)?;
        ensure_success("Stop", &result)?;

        Ok(())
    }

    pub fn get_transport_info(&self, instance_id: u32) -> Result<TransportInfo, ControlError> {
        let instance_id_str = instance_id.to_string();
        let args = [("InstanceID", instance_id_str.as_str())];

        let result = self.invoke("GetTransportInfo", &args)?;
        let envelope = ensure_success("GetTransportInfo", &result)?;

        parse_transport_info(envelope)
    }

    pub fn get_position_info(&self, instance_id: u32) -> Result<PositionInfo, ControlError> {
        let instance_id_str = instance_id.to_string();
        let args = [("InstanceID", instance_id_str.as_str())];

        let result = self.invoke("GetPositionInfo", &args)?;
        let envelope = ensure_success("GetPositionInfo", &result)?;

        parse_position_info(envelope)
    }

    /// Photo position + état en deux actions (GetTransportInfo puis
    /// GetPositionInfo).
    pub fn snapshot(&self, instance_id: u32) -> Result<PositionSnapshot, ControlError> {
        let transport = self.get_transport_info(instance_id)?;
        let position = self.get_position_info(instance_id)?;

        let state = PlaybackState::from_upnp_state(&transport.current_transport_state);
        Ok(snapshot_from_parts(state, &position))
    }
}

impl TransportControl for AvTransportClient {
    fn set_uri(&self, uri: &str, metadata: &str) -> Result<(), ControlError> {
        self.set_av_transport_uri(0, uri, metadata)
    }

    fn play(&self) -> Result<(), ControlError> {
        AvTransportClient::play(self, 0)
    }

    fn stop(&self) -> Result<(), ControlError> {
        AvTransportClient::stop(self, 0)
    }
}

impl PlaybackMonitor for AvTransportClient {
    fn position_snapshot(&self) -> Result<PositionSnapshot, ControlError> {
        self.snapshot(0)
    }
}

/// Requalifie le refus d'un SetAVTransportURI.
fn as_uri_rejection(err: ControlError) -> ControlError {
    match err {
        ControlError::ActionRejected(_, code, desc) => ControlError::UriRejected(code, desc),
        other => other,
    }
}

/// Requalifie le refus d'un Play.
fn as_playback_rejection(err: ControlError) -> ControlError {
    match err {
        ControlError::ActionRejected(_, code, desc) => ControlError::PlaybackRejected(code, desc),
        other => other,
    }
}

fn parse_transport_info(envelope: &SoapEnvelope) -> Result<TransportInfo, ControlError> {
    let response = find_child_with_suffix(&envelope.body.content, "GetTransportInfoResponse")
        .ok_or_else(|| ControlError::missing_return_value("GetTransportInfoResponse"))?;

    let current_transport_state = extract_child_text(response, "CurrentTransportState")?;
    let current_transport_status = extract_child_text(response, "CurrentTransportStatus")?;
    let current_speed = extract_child_text(response, "CurrentSpeed")?;

    Ok(TransportInfo {
        current_transport_state,
        current_transport_status,
        current_speed,
    })
}

fn parse_position_info(envelope: &SoapEnvelope) -> Result<PositionInfo, ControlError> {
    let response = find_child_with_suffix(&envelope.body.content, "GetPositionInfoResponse")
        .ok_or_else(|| ControlError::missing_return_value("GetPositionInfoResponse"))?;

    // Track est un ui4; une valeur présente mais non numérique signale
    // une réponse malformée
    let track = match extract_optional_child_text(response, "Track") {
        None => None,
        Some(raw) => Some(
            raw.parse::<u32>()
                .map_err(|_| ControlError::bad_return_value("Track", &raw))?,
        ),
    };

    Ok(PositionInfo {
        track,
        track_duration: extract_optional_child_text(response, "TrackDuration"),
        track_uri: extract_optional_child_text(response, "TrackURI"),
        rel_time: extract_optional_child_text(response, "RelTime"),
    })
}

/// Assemble un snapshot à partir de l'état transport et de la position.
///
/// RelTime illisible compte comme 0 écoulé; TrackDuration illisible ou
/// nulle compte comme durée inconnue.
fn snapshot_from_parts(state: PlaybackState, position: &PositionInfo) -> PositionSnapshot {
    let elapsed = position
        .rel_time
        .as_deref()
        .and_then(parse_upnp_time)
        .unwrap_or(0);

    let total = position
        .track_duration
        .as_deref()
        .and_then(parse_upnp_time)
        .filter(|&secs| secs > 0);

    PositionSnapshot::new(elapsed, total, state)
}
