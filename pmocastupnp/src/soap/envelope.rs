//! Enveloppes SOAP: structures et parsing des réponses

use std::io::BufReader;
use xmltree::Element;

/// Enveloppe SOAP complète
///
/// Un éventuel `<s:Header>` est ignoré: les réponses d'action UPnP n'en
/// portent pas en pratique, et rien ici n'en consomme.
#[derive(Debug, Clone)]
pub struct SoapEnvelope {
    /// Corps SOAP contenant l'action ou la réponse
    pub body: SoapBody,
}

/// Corps SOAP
#[derive(Debug, Clone)]
pub struct SoapBody {
    /// Contenu XML brut du corps
    pub content: Element,
}

impl SoapEnvelope {
    /// Crée une nouvelle enveloppe SOAP
    pub fn new(body: SoapBody) -> Self {
        Self { body }
    }
}

/// Erreur de parsing SOAP
#[derive(Debug, thiserror::Error)]
pub enum SoapParseError {
    #[error("XML parse error: {0}")]
    XmlError(#[from] xmltree::ParseError),

    #[error("Missing SOAP Envelope")]
    MissingEnvelope,

    #[error("Missing SOAP Body")]
    MissingBody,
}

/// Parse une enveloppe SOAP complète à partir de bytes XML.
///
/// Les noms sont comparés par suffixe ("Envelope", "Body") pour tolérer
/// les préfixes de namespace variables d'un device à l'autre.
pub fn parse_soap_envelope(xml: &[u8]) -> Result<SoapEnvelope, SoapParseError> {
    let reader = BufReader::new(xml);
    let root = Element::parse(reader)?;

    if !root.name.ends_with("Envelope") {
        return Err(SoapParseError::MissingEnvelope);
    }

    let body_elem = root
        .get_child("Body")
        .or_else(|| {
            root.children
                .iter()
                .find_map(|n| n.as_element().filter(|e| e.name.ends_with("Body")))
        })
        .ok_or(SoapParseError::MissingBody)?;

    Ok(SoapEnvelope {
        body: SoapBody {
            content: body_elem.clone(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_action_response() {
        let xml = r#"<?xml version="1.0"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Body>
    <u:GetTransportInfoResponse xmlns:u="urn:schemas-upnp-org:service:AVTransport:1">
      <CurrentTransportState>PLAYING</CurrentTransportState>
    </u:GetTransportInfoResponse>
  </s:Body>
</s:Envelope>"#;

        let envelope = parse_soap_envelope(xml.as_bytes()).unwrap();
        let response = envelope
            .body
            .content
            .children
            .iter()
            .find_map(|n| n.as_element())
            .unwrap();
        assert!(response.name.ends_with("GetTransportInfoResponse"));
    }

    #[test]
    fn test_parse_rejects_non_envelope() {
        let xml = r#"<?xml version="1.0"?><root><Body/></root>"#;
        assert!(matches!(
            parse_soap_envelope(xml.as_bytes()),
            Err(SoapParseError::MissingEnvelope)
        ));
    }

    #[test]
    fn test_parse_rejects_missing_body() {
        let xml = r#"<?xml version="1.0"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Header/>
</s:Envelope>"#;
        assert!(matches!(
            parse_soap_envelope(xml.as_bytes()),
            Err(SoapParseError::MissingBody)
        ));
    }

    #[test]
    fn test_parse_malformed_xml_is_an_error() {
        let xml = b"<s:Envelope><s:Body>";
        assert!(matches!(
            parse_soap_envelope(xml),
            Err(SoapParseError::XmlError(_))
        ));
    }
}
