//! SOAP Faults pour UPnP: construction et extraction

use super::SoapEnvelope;
use xmltree::{Element, XMLNode};

/// Erreur SOAP (Fault)
#[derive(Debug, Clone)]
pub struct SoapFault {
    /// Code d'erreur (ex: "s:Client")
    pub fault_code: String,

    /// Description de l'erreur
    pub fault_string: String,

    /// Détails UPnP optionnels
    pub upnp_error: Option<UpnpError>,
}

/// Erreur UPnP spécifique (élément `<UPnPError>` du detail)
#[derive(Debug, Clone)]
pub struct UpnpError {
    /// Code d'erreur UPnP (ex: "401", "716")
    pub error_code: String,

    /// Description de l'erreur
    pub error_description: String,
}

impl SoapFault {
    /// Code le plus spécifique disponible (code UPnP sinon faultcode)
    pub fn code(&self) -> &str {
        self.upnp_error
            .as_ref()
            .map(|e| e.error_code.as_str())
            .unwrap_or(self.fault_code.as_str())
    }

    /// Description la plus spécifique disponible
    pub fn description(&self) -> &str {
        self.upnp_error
            .as_ref()
            .filter(|e| !e.error_description.is_empty())
            .map(|e| e.error_description.as_str())
            .unwrap_or(self.fault_string.as_str())
    }
}

/// Extrait un SOAP Fault d'une enveloppe de réponse, s'il y en a un.
///
/// Retourne `None` pour une réponse d'action normale. Les champs absents
/// d'un fault malformé restent vides plutôt que de faire échouer
/// l'extraction: au point d'appel on sait déjà que le device a refusé.
pub fn parse_soap_fault(envelope: &SoapEnvelope) -> Option<SoapFault> {
    let fault_elem = find_child_with_suffix(&envelope.body.content, "Fault")?;

    let fault_code = child_text(fault_elem, "faultcode").unwrap_or_default();
    let fault_string = child_text(fault_elem, "faultstring").unwrap_or_default();

    let upnp_error = find_child_with_suffix(fault_elem, "detail")
        .and_then(|detail| find_child_with_suffix(detail, "UPnPError"))
        .map(|upnp| UpnpError {
            error_code: child_text(upnp, "errorCode").unwrap_or_default(),
            error_description: child_text(upnp, "errorDescription").unwrap_or_default(),
        });

    Some(SoapFault {
        fault_code,
        fault_string,
        upnp_error,
    })
}

fn find_child_with_suffix<'a>(parent: &'a Element, suffix: &str) -> Option<&'a Element> {
    parent.children.iter().find_map(|node| match node {
        XMLNode::Element(elem) if elem.name.ends_with(suffix) => Some(elem),
        _ => None,
    })
}

fn child_text(parent: &Element, suffix: &str) -> Option<String> {
    find_child_with_suffix(parent, suffix)
        .and_then(|e| e.get_text())
        .map(|t| t.trim().to_string())
}

/// Construit un SOAP Fault XML (utilisé pour simuler un device dans les
/// tests du control point).
///
/// # Arguments
///
/// * `fault_code` - Code du fault (ex: "s:Client")
/// * `fault_string` - Message d'erreur
/// * `upnp_error_code` - Code d'erreur UPnP optionnel (ex: "716")
/// * `upnp_error_desc` - Description d'erreur UPnP optionnelle
pub fn build_soap_fault(
    fault_code: &str,
    fault_string: &str,
    upnp_error_code: Option<&str>,
    upnp_error_desc: Option<&str>,
) -> Result<String, xmltree::Error> {
    let mut fault = Element::new("s:Fault");

    let mut faultcode_elem = Element::new("faultcode");
    faultcode_elem
        .children
        .push(XMLNode::Text(fault_code.to_string()));
    fault.children.push(XMLNode::Element(faultcode_elem));

    let mut faultstring_elem = Element::new("faultstring");
    faultstring_elem
        .children
        .push(XMLNode::Text(fault_string.to_string()));
    fault.children.push(XMLNode::Element(faultstring_elem));

    if let (Some(code), Some(desc)) = (upnp_error_code, upnp_error_desc) {
        let mut detail = Element::new("detail");

        let mut upnp_error = Element::new("UPnPError");
        upnp_error.attributes.insert(
            "xmlns".to_string(),
            "urn:schemas-upnp-org:control-1-0".to_string(),
        );

        let mut error_code_elem = Element::new("errorCode");
        error_code_elem.children.push(XMLNode::Text(code.to_string()));
        upnp_error.children.push(XMLNode::Element(error_code_elem));

        let mut error_desc_elem = Element::new("errorDescription");
        error_desc_elem.children.push(XMLNode::Text(desc.to_string()));
        upnp_error.children.push(XMLNode::Element(error_desc_elem));

        detail.children.push(XMLNode::Element(upnp_error));
        fault.children.push(XMLNode::Element(detail));
    }

    let mut body = Element::new("s:Body");
    body.children.push(XMLNode::Element(fault));

    let mut envelope = Element::new("s:Envelope");
    envelope.attributes.insert(
        "xmlns:s".to_string(),
        "http://schemas.xmlsoap.org/soap/envelope/".to_string(),
    );
    envelope.children.push(XMLNode::Element(body));

    let mut buf = Vec::new();
    let config = xmltree::EmitterConfig::new()
        .perform_indent(true)
        .indent_string("  ");
    envelope.write_with_config(&mut buf, config)?;

    Ok(String::from_utf8(buf).expect("emitter produces valid UTF-8"))
}
