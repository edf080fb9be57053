//! Invocation HTTP des actions SOAP UPnP.
//!
//! Couche commune à toutes les actions AVTransport: POST du body SOAP
//! sur la control URL, header `SOAPACTION`, lecture du body même sur
//! HTTP 500 (les SOAP Faults arrivent avec un statut d'erreur).

use std::thread;
use std::time::Duration;

use pmocastupnp::soap::{SoapEnvelope, build_soap_request, parse_soap_envelope, parse_soap_fault};
use tracing::{debug, warn};
use ureq::Agent;
use xmltree::{Element, XMLNode};

use crate::errors::ControlError;

/// Pause avant la seconde (et dernière) tentative d'envoi.
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Résultat d'un appel SOAP:
/// - statut HTTP
/// - body XML brut (toujours)
/// - enveloppe SOAP parsée si le parsing a réussi
pub struct SoapCallResult {
    pub status: ureq::http::StatusCode,
    pub raw_body: String,
    pub envelope: Option<SoapEnvelope>,
}

/// Invoque une action SOAP UPnP sur une control URL.
///
/// Les erreurs de transport (connexion refusée, timeout, body
/// illisible) sont retentées une seule fois après un court backoff,
/// puis remontées en [`ControlError::DeviceUnreachable`]. Une réponse
/// HTTP reçue, même 4xx/5xx, n'est jamais retentée: le device a parlé.
///
/// # Arguments
///
/// * `control_url` - URL HTTP complète du control endpoint du service
/// * `service_type` - URN du service, ex: "urn:schemas-upnp-org:service:AVTransport:1"
/// * `action` - nom de l'action, ex: "GetTransportInfo"
/// * `args` - paires (nom, valeur) dans l'ordre déclaré par le service
/// * `timeout_secs` - timeout global par tentative HTTP
pub fn invoke_upnp_action(
    control_url: &str,
    service_type: &str,
    action: &str,
    args: &[(&str, &str)],
    timeout_secs: u64,
) -> Result<SoapCallResult, ControlError> {
    // 1. Body SOAP via pmocastupnp::soap
    let body_xml = build_soap_request(service_type, action, args)
        .map_err(|e| ControlError::RequestBuild(action.to_string(), e.to_string()))?;

    // 2. Agent qui ne convertit PAS les 4xx/5xx en erreurs: il faut
    //    pouvoir lire le body d'un HTTP 500 pour en extraire le Fault.
    let config = Agent::config_builder()
        .http_status_as_error(false)
        .timeout_global(Some(Duration::from_secs(timeout_secs)))
        .build();

    let agent: Agent = config.into();

    // 3. Header SOAPACTION: "urn:service#Action"
    let soap_action_header = format!(r#""{}#{}""#, service_type, action);

    // 4. Envoi, avec une seconde tentative sur erreur de transport
    let mut attempt = 0;
    loop {
        attempt += 1;
        match send_once(&agent, control_url, &soap_action_header, &body_xml) {
            Ok(result) => {
                debug!("📤 {} -> HTTP {}", action, result.status);
                return Ok(result);
            }
            Err(e) if attempt == 1 => {
                warn!("Transport error on {} (retrying once): {}", action, e);
                thread::sleep(RETRY_BACKOFF);
            }
            Err(e) => {
                return Err(ControlError::DeviceUnreachable(format!(
                    "{}: {}",
                    control_url, e
                )));
            }
        }
    }
}

fn send_once(
    agent: &Agent,
    control_url: &str,
    soap_action_header: &str,
    body_xml: &str,
) -> Result<SoapCallResult, ureq::Error> {
    let mut response = agent
        .post(control_url)
        .header("Content-Type", r#"text/xml; charset="utf-8""#)
        .header("SOAPACTION", soap_action_header)
        .send(body_xml)?;

    let status = response.status();

    // Body lu en entier quel que soit le statut HTTP
    let raw_body = response.body_mut().read_to_string()?;

    // Parsing best-effort: statut + body restent disponibles même si le
    // body n'est pas du SOAP valide
    let envelope = parse_soap_envelope(raw_body.as_bytes()).ok();

    Ok(SoapCallResult {
        status,
        raw_body,
        envelope,
    })
}

/// Vérifie qu'un appel SOAP a réussi et rend l'enveloppe de réponse.
///
/// Ordre de diagnostic:
/// 1. Fault SOAP dans l'enveloppe -> [`ControlError::ActionRejected`]
///    (le detail UPnP est plus précis que le statut HTTP qui le porte)
/// 2. Statut HTTP non-2xx sans fault -> [`ControlError::ActionFailed`]
/// 3. Pas d'enveloppe parsable -> [`ControlError::NoEnvelope`]
pub fn ensure_success<'a>(
    action: &str,
    result: &'a SoapCallResult,
) -> Result<&'a SoapEnvelope, ControlError> {
    if let Some(envelope) = &result.envelope {
        if let Some(fault) = parse_soap_fault(envelope) {
            return Err(ControlError::ActionRejected(
                action.to_string(),
                fault.code().to_string(),
                fault.description().to_string(),
            ));
        }
    }

    if !result.status.is_success() {
        return Err(ControlError::ActionFailed(
            action.to_string(),
            result.status.as_u16(),
            truncate_for_log(&result.raw_body),
        ));
    }

    result
        .envelope
        .as_ref()
        .ok_or_else(|| ControlError::NoEnvelope(action.to_string()))
}

/// Tronque un body de réponse pour un message d'erreur lisible.
fn truncate_for_log(raw: &str) -> String {
    const MAX: usize = 200;
    let trimmed = raw.trim();
    if trimmed.chars().count() <= MAX {
        trimmed.to_string()
    } else {
        let head: String = trimmed.chars().take(MAX).collect();
        format!("{}...", head)
    }
}

pub(crate) fn find_child_with_suffix<'a>(parent: &'a Element, suffix: &str) -> Option<&'a Element> {
    parent.children.iter().find_map(|node| match node {
        XMLNode::Element(elem) if elem.name.ends_with(suffix) => Some(elem),
        _ => None,
    })
}

/// Texte d'un élément enfant obligatoire d'une réponse SOAP.
pub(crate) fn extract_child_text(parent: &Element, suffix: &str) -> Result<String, ControlError> {
    find_child_with_suffix(parent, suffix)
        .and_then(|child| child.get_text())
        .map(|t| t.trim().to_string())
        .ok_or_else(|| ControlError::missing_return_value(suffix))
}

/// Texte d'un élément enfant optionnel. Un élément absent, vide ou sans
/// texte donne `None` (RelTime ou TrackDuration manquants sur certains
/// renderers).
pub(crate) fn extract_optional_child_text(parent: &Element, suffix: &str) -> Option<String> {
    find_child_with_suffix(parent, suffix)
        .and_then(|child| child.get_text())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmocastupnp::soap::build_soap_fault;
    use ureq::http::StatusCode;

    fn call_result(status: StatusCode, body: &str) -> SoapCallResult {
        SoapCallResult {
            status,
            raw_body: body.to_string(),
            envelope: parse_soap_envelope(body.as_bytes()).ok(),
        }
    }

    const STOP_RESPONSE: &str = r#"<?xml version="1.0"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Body>
    <u:StopResponse xmlns:u="urn:schemas-upnp-org:service:AVTransport:1"/>
  </s:Body>
</s:Envelope>"#;

    #[test]
    fn success_yields_envelope() {
        let result = call_result(StatusCode::OK, STOP_RESPONSE);
        let envelope = ensure_success("Stop", &result).unwrap();
        assert!(find_child_with_suffix(&envelope.body.content, "StopResponse").is_some());
    }

    #[test]
    fn fault_maps_to_action_rejected() {
        let fault_xml = build_soap_fault(
            "s:Client",
            "UPnPError",
            Some("716"),
            Some("Resource not found"),
        )
        .unwrap();
        let result = call_result(StatusCode::INTERNAL_SERVER_ERROR, &fault_xml);

        match ensure_success("SetAVTransportURI", &result) {
            Err(ControlError::ActionRejected(action, code, desc)) => {
                assert_eq!(action, "SetAVTransportURI");
                assert_eq!(code, "716");
                assert_eq!(desc, "Resource not found");
            }
            other => panic!("expected ActionRejected, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn non_success_without_fault_maps_to_action_failed() {
        let result = call_result(StatusCode::NOT_FOUND, "<html>dead control url</html>");

        match ensure_success("Play", &result) {
            Err(ControlError::ActionFailed(action, status, body)) => {
                assert_eq!(action, "Play");
                assert_eq!(status, 404);
                assert!(body.contains("dead control url"));
            }
            other => panic!("expected ActionFailed, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn success_without_envelope_maps_to_no_envelope() {
        let result = call_result(StatusCode::OK, "this is not xml at all");

        match ensure_success("GetPositionInfo", &result) {
            Err(ControlError::NoEnvelope(action)) => assert_eq!(action, "GetPositionInfo"),
            other => panic!("expected NoEnvelope, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn extract_child_text_ignores_namespace_prefixes() {
        let xml = r#"<u:Resp xmlns:u="urn:x"><u:CurrentSpeed>1</u:CurrentSpeed></u:Resp>"#;
        let elem = Element::parse(xml.as_bytes()).unwrap();

        assert_eq!(extract_child_text(&elem, "CurrentSpeed").unwrap(), "1");
        assert!(matches!(
            extract_child_text(&elem, "CurrentTransportState"),
            Err(ControlError::MissingReturnValue(_))
        ));
    }

    #[test]
    fn optional_extraction_treats_empty_as_absent() {
        let xml = r#"<Resp><RelTime>  </RelTime><TrackURI>http://x/a.mp3</TrackURI></Resp>"#;
        let elem = Element::parse(xml.as_bytes()).unwrap();

        assert_eq!(extract_optional_child_text(&elem, "RelTime"), None);
        assert_eq!(
            extract_optional_child_text(&elem, "TrackURI").as_deref(),
            Some("http://x/a.mp3")
        );
    }

    #[test]
    fn long_bodies_are_truncated_in_errors() {
        let long_body = "x".repeat(500);
        let result = call_result(StatusCode::BAD_GATEWAY, &long_body);

        match ensure_success("Stop", &result) {
            Err(ControlError::ActionFailed(_, _, body)) => {
                assert!(body.len() < 250);
                assert!(body.ends_with("..."));
            }
            other => panic!("expected ActionFailed, got {:?}", other.map(|_| ())),
        }
    }
}
