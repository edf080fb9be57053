//! Construction de requêtes et de réponses SOAP

use xmltree::{Element, XMLNode};

fn build_soap_envelope_with_body(body_child: Element) -> Result<String, xmltree::Error> {
    // Body
    let mut body = Element::new("s:Body");
    body.children.push(XMLNode::Element(body_child));

    // Envelope
    let mut envelope = Element::new("s:Envelope");
    envelope.attributes.insert(
        "xmlns:s".to_string(),
        "http://schemas.xmlsoap.org/soap/envelope/".to_string(),
    );
    envelope.attributes.insert(
        "s:encodingStyle".to_string(),
        "http://schemas.xmlsoap.org/soap/encoding/".to_string(),
    );
    envelope.children.push(XMLNode::Element(body));

    let mut buf = Vec::new();
    let config = xmltree::EmitterConfig::new()
        .write_document_declaration(true)
        .perform_indent(true)
        .indent_string("  ");
    envelope.write_with_config(&mut buf, config)?;

    Ok(String::from_utf8(buf).expect("emitter produces valid UTF-8"))
}

/// Construit une requête d'action UPnP.
///
/// Les arguments sont émis dans l'ordre du slice; certains devices
/// rejettent les arguments désordonnés.
///
/// # Arguments
///
/// * `service_urn` - URN du service (ex: "urn:schemas-upnp-org:service:AVTransport:1")
/// * `action` - Nom de l'action (ex: "SetAVTransportURI")
/// * `args` - Paires (nom, valeur) ordonnées
pub fn build_soap_request(
    service_urn: &str,
    action: &str,
    args: &[(&str, &str)],
) -> Result<String, xmltree::Error> {
    let request_name = format!("u:{}", action);
    let mut request_elem = Element::new(&request_name);
    request_elem
        .attributes
        .insert("xmlns:u".to_string(), service_urn.to_string());

    for (name, value) in args {
        let mut child = Element::new(*name);
        child.children.push(XMLNode::Text((*value).to_string()));
        request_elem.children.push(XMLNode::Element(child));
    }

    build_soap_envelope_with_body(request_elem)
}

/// Construit une réponse d'action UPnP (`<u:{Action}Response>`).
///
/// Côté control point ce builder sert surtout à fabriquer des réponses
/// de device dans les tests.
pub fn build_soap_response(
    service_urn: &str,
    action: &str,
    values: Vec<(String, String)>,
) -> Result<String, xmltree::Error> {
    let response_name = format!("u:{}Response", action);
    let mut response_elem = Element::new(&response_name);
    response_elem
        .attributes
        .insert("xmlns:u".to_string(), service_urn.to_string());

    for (key, value) in values {
        let mut child = Element::new(&key);
        child.children.push(XMLNode::Text(value));
        response_elem.children.push(XMLNode::Element(child));
    }

    build_soap_envelope_with_body(response_elem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request_preserves_argument_order() {
        let xml = build_soap_request(
            "urn:schemas-upnp-org:service:AVTransport:1",
            "SetAVTransportURI",
            &[
                ("InstanceID", "0"),
                ("CurrentURI", "http://example/a.mp3"),
                ("CurrentURIMetaData", ""),
            ],
        )
        .unwrap();

        assert!(xml.contains("<u:SetAVTransportURI"));
        assert!(xml.contains("xmlns:u=\"urn:schemas-upnp-org:service:AVTransport:1\""));
        let instance = xml.find("<InstanceID>").unwrap();
        let uri = xml.find("<CurrentURI>").unwrap();
        let meta = xml.find("<CurrentURIMetaData").unwrap();
        assert!(instance < uri && uri < meta);
    }

    #[test]
    fn test_build_request_has_envelope_declaration() {
        let xml = build_soap_request(
            "urn:schemas-upnp-org:service:AVTransport:1",
            "Play",
            &[("InstanceID", "0"), ("Speed", "1")],
        )
        .unwrap();

        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("xmlns:s=\"http://schemas.xmlsoap.org/soap/envelope/\""));
        assert!(xml.contains("<Speed>1</Speed>"));
    }

    #[test]
    fn test_build_response() {
        let values = vec![
            ("Track".to_string(), "5".to_string()),
            ("TrackDuration".to_string(), "00:03:45".to_string()),
        ];

        let xml = build_soap_response(
            "urn:schemas-upnp-org:service:AVTransport:1",
            "GetPositionInfo",
            values,
        )
        .unwrap();

        assert!(xml.contains("GetPositionInfoResponse"));
        assert!(xml.contains("<Track>5</Track>"));
        assert!(xml.contains("<TrackDuration>00:03:45</TrackDuration>"));
    }

    #[test]
    fn test_build_empty_response() {
        let xml = build_soap_response(
            "urn:schemas-upnp-org:service:AVTransport:1",
            "Stop",
            Vec::new(),
        )
        .unwrap();

        assert!(xml.contains("StopResponse"));
        assert!(xml.contains("xmlns:u=\"urn:schemas-upnp-org:service:AVTransport:1\""));
    }
}
