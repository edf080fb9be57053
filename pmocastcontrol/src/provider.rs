//! Récupération et parsing des description.xml UPnP.
//!
//! Le filtre renderer porte sur la présence d'un service AVTransport
//! avec controlURL, pas sur le deviceType: certains renderers annoncent
//! des deviceType exotiques mais parlent AVTransport, et un deviceType
//! MediaRenderer sans AVTransport ne nous sert à rien.

use std::io::{BufRead, BufReader};
use std::time::Duration;

use quick_xml::{Error as XmlError, Reader, events::Event};
use thiserror::Error;
use tracing::{debug, warn};
use ureq::Agent;

use crate::discovery::{DeviceDescriptionProvider, DiscoveredEndpoint};
use crate::model::RendererInfo;

#[derive(Debug, Error)]
pub enum DescriptionError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] ureq::Error),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),
}

/// Description de device parsée, avec l'endpoint AVTransport si la
/// serviceList en déclare un.
#[derive(Debug, Default)]
struct ParsedDeviceDescription {
    udn: Option<String>,
    device_type: Option<String>,
    friendly_name: Option<String>,
    manufacturer: Option<String>,
    model_name: Option<String>,

    avtransport_service_type: Option<String>,
    avtransport_control_url: Option<String>,
}

/// Provider HTTP: GET de description.xml + parsing streaming quick-xml.
pub struct HttpXmlDescriptionProvider {
    timeout_secs: u64,
}

impl HttpXmlDescriptionProvider {
    pub fn new(timeout_secs: u64) -> Self {
        Self { timeout_secs }
    }

    fn fetch_and_parse(
        &self,
        endpoint: &DiscoveredEndpoint,
    ) -> Result<ParsedDeviceDescription, DescriptionError> {
        debug!(
            "Fetching description for {} at {}",
            endpoint.udn, endpoint.location
        );

        let config = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(self.timeout_secs)))
            .build();

        let agent: Agent = config.into();

        let response = agent.get(&endpoint.location).call()?;

        // response: http::Response<ureq::Body>
        let (_parts, body) = response.into_parts();

        // body.into_reader() -> impl Read + 'static
        parse_device_description(BufReader::new(body.into_reader()))
    }

    fn build_renderer(
        &self,
        endpoint: &DiscoveredEndpoint,
        parsed: &ParsedDeviceDescription,
    ) -> Option<RendererInfo> {
        let (Some(service_type), Some(raw_control)) = (
            &parsed.avtransport_service_type,
            &parsed.avtransport_control_url,
        ) else {
            debug!(
                "No AVTransport service in description for {} at {} (deviceType={})",
                endpoint.udn,
                endpoint.location,
                parsed.device_type.as_deref().unwrap_or("unknown")
            );
            return None;
        };

        let udn = parsed
            .udn
            .as_deref()
            .unwrap_or(endpoint.udn.as_str())
            .to_ascii_lowercase();

        let friendly_name = parsed
            .friendly_name
            .clone()
            .unwrap_or_else(|| "(unnamed renderer)".to_string());

        Some(RendererInfo {
            udn,
            friendly_name,
            model_name: parsed.model_name.clone().unwrap_or_default(),
            manufacturer: parsed.manufacturer.clone().unwrap_or_default(),
            location: endpoint.location.clone(),
            server_header: endpoint.server_header.clone(),
            avtransport_service_type: service_type.clone(),
            avtransport_control_url: resolve_control_url(&endpoint.location, raw_control),
        })
    }
}

impl DeviceDescriptionProvider for HttpXmlDescriptionProvider {
    fn build_renderer_info(&self, endpoint: &DiscoveredEndpoint) -> Option<RendererInfo> {
        match self.fetch_and_parse(endpoint) {
            Ok(parsed) => self.build_renderer(endpoint, &parsed),
            Err(err) => {
                // Un device qui répond mal n'interrompt pas la découverte
                warn!(
                    "Failed to fetch/parse description for {} at {}: {}",
                    endpoint.udn, endpoint.location, err
                );
                None
            }
        }
    }
}

/// Parse un description.xml UPnP en streaming.
///
/// Les blocs `<device>` imbriqués sont suivis par profondeur: l'identité
/// (UDN, friendlyName...) vient du premier device qui la fournit, et un
/// service AVTransport compte quelle que soit sa profondeur. Premier
/// AVTransport trouvé gagne.
fn parse_device_description<R: BufRead>(
    source: R,
) -> Result<ParsedDeviceDescription, DescriptionError> {
    let mut reader = Reader::from_reader(source);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut parsed = ParsedDeviceDescription::default();

    let mut device_depth: u32 = 0;
    let mut in_service = false;
    let mut current_tag: Option<String> = None;

    // serviceType + controlURL du bloc <service> en cours
    let mut current_service_type: Option<String> = None;
    let mut current_control_url: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match name.as_str() {
                    "device" => {
                        device_depth += 1;
                        current_tag = None;
                    }
                    "service" => {
                        if device_depth > 0 {
                            in_service = true;
                            current_tag = None;
                            current_service_type = None;
                            current_control_url = None;
                        }
                    }
                    _ => {
                        if device_depth > 0 {
                            current_tag = Some(name);
                        }
                    }
                }
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match name.as_str() {
                    "device" => {
                        device_depth = device_depth.saturating_sub(1);
                    }
                    "service" => {
                        if device_depth > 0 && in_service {
                            // Fin d'un bloc <service>: si c'est AVTransport,
                            // retenir son endpoint (le premier gagne)
                            if let (Some(st), Some(ctrl)) =
                                (&current_service_type, &current_control_url)
                            {
                                let lower = st.to_ascii_lowercase();
                                if lower.contains("urn:schemas-upnp-org:service:avtransport:")
                                    && parsed.avtransport_service_type.is_none()
                                {
                                    parsed.avtransport_service_type = Some(st.clone());
                                    parsed.avtransport_control_url = Some(ctrl.clone());
                                }
                            }

                            in_service = false;
                            current_service_type = None;
                            current_control_url = None;
                        }
                    }
                    _ => {}
                }
                current_tag = None;
            }
            Event::Text(e) => {
                if device_depth > 0 {
                    if let Some(tag) = &current_tag {
                        // quick-xml ≥ 0.37 : unescape() → decode()
                        let text = e.decode().map_err(XmlError::Encoding)?.into_owned();

                        match tag.as_str() {
                            "UDN" => {
                                if parsed.udn.is_none() {
                                    parsed.udn = Some(text);
                                }
                            }
                            "deviceType" => {
                                if parsed.device_type.is_none() {
                                    parsed.device_type = Some(text);
                                }
                            }
                            "friendlyName" => {
                                if parsed.friendly_name.is_none() {
                                    parsed.friendly_name = Some(text);
                                }
                            }
                            "manufacturer" => {
                                if parsed.manufacturer.is_none() {
                                    parsed.manufacturer = Some(text);
                                }
                            }
                            "modelName" => {
                                if parsed.model_name.is_none() {
                                    parsed.model_name = Some(text);
                                }
                            }
                            "serviceType" if in_service => {
                                current_service_type = Some(text);
                            }
                            "controlURL" if in_service => {
                                current_control_url = Some(text);
                            }
                            _ => {}
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }

        buf.clear();
    }

    Ok(parsed)
}

/// Résout un controlURL éventuellement relatif contre l'URL de la
/// description.
///
/// - Absolu (http:// ou https://): retourné tel quel.
/// - Sinon: résolu contre le scheme://host[:port] de `description_url`.
fn resolve_control_url(description_url: &str, control_url: &str) -> String {
    if control_url.starts_with("http://") || control_url.starts_with("https://") {
        return control_url.to_string();
    }

    if let Some((scheme, rest)) = description_url.split_once("://") {
        let authority = match rest.find('/') {
            Some(pos) => &rest[..pos],
            None => rest,
        };
        let base = format!("{}://{}", scheme, authority);

        if control_url.starts_with('/') {
            return format!("{}{}", base, control_url);
        } else {
            return format!("{}/{}", base, control_url);
        }
    }

    // Base imparsable: renvoyer le controlURL brut
    control_url.to_string()
}
