/*!
The pmocast SSDP client is a *control point*.
It must **not** bind to UDP port 1900.

Reason:

* Port 1900 belongs to SSDP *servers* (UPnP device mode) answering M-SEARCH.
* A control point only needs to send M-SEARCH and receive unicast HTTP/200
  replies on its own ephemeral port.
* If a client binds 1900 next to a real device stack (even with
  SO_REUSEPORT) the kernel load-balances datagrams between the sockets and
  replies get lost randomly.

Therefore:

* SSDP client → bind(0.0.0.0:0), ephemeral port, send M-SEARCH, collect.

The client still joins the multicast group so that `ssdp:alive` NOTIFYs
sent during the collection window are seen as well.
*/
//! Client SSDP pour la découverte ponctuelle des devices UPnP

use super::{MAX_AGE, SSDP_MULTICAST_ADDR, SSDP_PORT};
use socket2::{Domain, Protocol, Socket, Type};
use std::collections::HashMap;
use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Événements SSDP intéressants pour un control point
#[derive(Debug, Clone)]
pub enum SsdpEvent {
    Alive {
        usn: String,
        nt: String,
        location: String,
        server: String,
        max_age: u32,
        from: SocketAddr,
    },
    ByeBye {
        usn: String,
        nt: String,
        from: SocketAddr,
    },
    SearchResponse {
        usn: String,
        st: String,
        location: String,
        server: String,
        max_age: u32,
        from: SocketAddr,
    },
}

/// Client SSDP: envoie des M-SEARCH puis collecte les réponses pendant
/// une fenêtre bornée.
pub struct SsdpClient {
    socket: UdpSocket,
}

impl SsdpClient {
    /// Crée un nouveau client SSDP
    pub fn new() -> std::io::Result<Self> {
        let socket2 = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
        socket2.set_reuse_address(true)?;

        let bind_addr: SocketAddr = "0.0.0.0:0"
            .parse()
            .expect("static bind address must parse");
        socket2.bind(&bind_addr.into())?;

        let socket: UdpSocket = socket2.into();
        socket.set_read_timeout(Some(Duration::from_secs(1)))?;
        socket.set_multicast_loop_v4(true)?; // utile en dev local

        let group: std::net::Ipv4Addr = SSDP_MULTICAST_ADDR
            .parse()
            .expect("static multicast address must parse");
        for iface in get_if_addrs::get_if_addrs()? {
            if let std::net::IpAddr::V4(ipv4) = iface.ip() {
                if !ipv4.is_loopback() {
                    match socket.join_multicast_v4(&group, &ipv4) {
                        Ok(()) => {
                            debug!("SSDP: joined {} on {}", SSDP_MULTICAST_ADDR, ipv4);
                        }
                        Err(e) => {
                            warn!(
                                "SSDP: failed to join {} on {}: {}",
                                SSDP_MULTICAST_ADDR, ipv4, e
                            );
                        }
                    }
                }
            }
        }

        info!("✅ SSDP client ready (ephemeral port)");

        Ok(Self { socket })
    }

    /// Envoie un M-SEARCH pour un search target donné
    pub fn send_msearch(&self, st: &str, mx: u32) -> std::io::Result<()> {
        let mx = mx.max(1); // MX doit être >= 1
        let msg = format!(
            "M-SEARCH * HTTP/1.1\r\n\
             HOST: {}:{}\r\n\
             MAN: \"ssdp:discover\"\r\n\
             MX: {}\r\n\
             ST: {}\r\n\
             USER-AGENT: pmocast SSDP client\r\n\
             \r\n",
            SSDP_MULTICAST_ADDR, SSDP_PORT, mx, st
        );

        let addr: SocketAddr = format!("{}:{}", SSDP_MULTICAST_ADDR, SSDP_PORT)
            .parse()
            .expect("static multicast endpoint must parse");

        match self.socket.send_to(msg.as_bytes(), addr) {
            Ok(_) => {
                info!("📤 M-SEARCH sent (ST={}, MX={})", st, mx);
                Ok(())
            }
            Err(e) => {
                warn!("❌ Failed to send M-SEARCH: {}", e);
                Err(e)
            }
        }
    }

    /// Collecte les événements SSDP pendant toute la fenêtre donnée.
    ///
    /// La collecte ne s'arrête jamais à la première réponse: plusieurs
    /// devices peuvent répondre tard dans la fenêtre (jusqu'à MX
    /// secondes après le M-SEARCH). Les datagrammes illisibles sont
    /// ignorés.
    pub fn collect_events(&self, window: Duration) -> Vec<SsdpEvent> {
        let deadline = Instant::now() + window;
        let mut events = Vec::new();
        let mut buf = [0u8; 8192];

        while Instant::now() < deadline {
            match self.socket.recv_from(&mut buf) {
                Ok((n, from)) => {
                    let data = String::from_utf8_lossy(&buf[..n]);
                    if let Some(event) = parse_message(&data, from) {
                        debug!("📥 SSDP event from {}: {:?}", from, event);
                        events.push(event);
                    }
                }
                Err(e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    // Read timeout, la fenêtre n'est pas finie
                    continue;
                }
                Err(e) => {
                    warn!("❌ SSDP client read error: {}", e);
                }
            }
        }

        debug!("SSDP collection window closed ({} events)", events.len());
        events
    }
}

fn parse_message(data: &str, from: SocketAddr) -> Option<SsdpEvent> {
    let mut lines = data.lines();
    let first_line = lines.next()?.trim();
    let upper = first_line.to_ascii_uppercase();
    let headers = parse_headers(lines);

    if upper.starts_with("NOTIFY ") {
        handle_notify(&headers, from)
    } else if upper.starts_with("HTTP/") && upper.contains(" 200 ") {
        handle_search_response(&headers, from)
    } else if upper.starts_with("M-SEARCH ") {
        // Another control point querying the network; we are not a device.
        None
    } else {
        trace!("Unknown SSDP message type from {}: {}", from, first_line);
        None
    }
}

fn handle_notify(headers: &HashMap<String, String>, from: SocketAddr) -> Option<SsdpEvent> {
    // Critical headers: NTS, NT, USN (required by UPnP spec)
    let nts = headers.get("NTS")?.to_ascii_lowercase();
    let nt = headers.get("NT")?.to_string();
    let usn = headers.get("USN")?.to_string();

    match nts.as_str() {
        "ssdp:alive" => {
            // LOCATION is required for alive notifications
            let location = match headers.get("LOCATION") {
                Some(loc) => loc.to_string(),
                None => {
                    trace!("NOTIFY ssdp:alive from {} without LOCATION, ignoring", from);
                    return None;
                }
            };

            Some(SsdpEvent::Alive {
                usn,
                nt,
                location,
                server: server_header(headers),
                max_age: parse_max_age(headers.get("CACHE-CONTROL")),
                from,
            })
        }
        "ssdp:byebye" => Some(SsdpEvent::ByeBye { usn, nt, from }),
        other => {
            trace!("Unknown NTS value from {}: {}", from, other);
            None
        }
    }
}

fn handle_search_response(
    headers: &HashMap<String, String>,
    from: SocketAddr,
) -> Option<SsdpEvent> {
    // Critical headers: ST, USN, LOCATION (required by UPnP spec)
    let (Some(st), Some(usn), Some(location)) = (
        headers.get("ST"),
        headers.get("USN"),
        headers.get("LOCATION"),
    ) else {
        trace!(
            "M-SEARCH response from {} missing ST/USN/LOCATION, ignoring",
            from
        );
        return None;
    };

    Some(SsdpEvent::SearchResponse {
        usn: usn.to_string(),
        st: st.to_string(),
        location: location.to_string(),
        server: server_header(headers),
        max_age: parse_max_age(headers.get("CACHE-CONTROL")),
        from,
    })
}

// SERVER is informational; many devices omit it.
fn server_header(headers: &HashMap<String, String>) -> String {
    headers
        .get("SERVER")
        .map(|s| s.to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

fn parse_headers<'a, I>(lines: I) -> HashMap<String, String>
where
    I: Iterator<Item = &'a str>,
{
    let mut headers = HashMap::new();
    for line in lines {
        let line = line.trim();

        // Empty line marks end of headers
        if line.is_empty() {
            break;
        }

        // Split on first ':' only (values may contain ':')
        if let Some(colon_pos) = line.find(':') {
            let (name, value_with_colon) = line.split_at(colon_pos);
            let value = &value_with_colon[1..];

            let name = name.trim().to_ascii_uppercase();
            let value = value.trim().to_string();

            if !name.is_empty() && !value.is_empty() {
                headers.insert(name, value);
            } else {
                trace!("Skipping malformed header: '{}'", line);
            }
        } else {
            trace!("Skipping line without colon: '{}'", line);
        }
    }
    headers
}

fn parse_max_age(value: Option<&String>) -> u32 {
    if let Some(v) = value {
        let lower = v.to_ascii_lowercase();
        if let Some(idx) = lower.find("max-age") {
            let after_key = &v[idx + 7..];
            let after_eq = after_key.trim_start().trim_start_matches('=').trim_start();
            let digits: String = after_eq
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            if let Ok(age) = digits.parse::<u32>() {
                return age;
            }
        }
        trace!(
            "Could not parse max-age from CACHE-CONTROL: '{}', using default {}",
            v, MAX_AGE
        );
    }
    MAX_AGE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_addr() -> SocketAddr {
        "192.168.1.50:1900".parse().unwrap()
    }

    #[test]
    fn parses_search_response() {
        let msg = "HTTP/1.1 200 OK\r\n\
                   CACHE-CONTROL: max-age=1800\r\n\
                   LOCATION: http://192.168.1.50:49152/description.xml\r\n\
                   SERVER: Linux/5.4 UPnP/1.0 TestRenderer/1.0\r\n\
                   ST: urn:schemas-upnp-org:device:MediaRenderer:1\r\n\
                   USN: uuid:abcd-1234::urn:schemas-upnp-org:device:MediaRenderer:1\r\n\
                   \r\n";

        match parse_message(msg, from_addr()) {
            Some(SsdpEvent::SearchResponse {
                usn,
                st,
                location,
                server,
                max_age,
                ..
            }) => {
                assert_eq!(
                    usn,
                    "uuid:abcd-1234::urn:schemas-upnp-org:device:MediaRenderer:1"
                );
                assert_eq!(st, "urn:schemas-upnp-org:device:MediaRenderer:1");
                assert_eq!(location, "http://192.168.1.50:49152/description.xml");
                assert_eq!(server, "Linux/5.4 UPnP/1.0 TestRenderer/1.0");
                assert_eq!(max_age, 1800);
            }
            other => panic!("expected SearchResponse, got {:?}", other),
        }
    }

    #[test]
    fn parses_alive_notify() {
        let msg = "NOTIFY * HTTP/1.1\r\n\
                   HOST: 239.255.255.250:1900\r\n\
                   NT: upnp:rootdevice\r\n\
                   NTS: ssdp:alive\r\n\
                   USN: uuid:abcd-1234::upnp:rootdevice\r\n\
                   LOCATION: http://192.168.1.50:49152/description.xml\r\n\
                   \r\n";

        match parse_message(msg, from_addr()) {
            Some(SsdpEvent::Alive {
                usn, nt, server, ..
            }) => {
                assert_eq!(usn, "uuid:abcd-1234::upnp:rootdevice");
                assert_eq!(nt, "upnp:rootdevice");
                // No SERVER header in this message
                assert_eq!(server, "Unknown");
            }
            other => panic!("expected Alive, got {:?}", other),
        }
    }

    #[test]
    fn ignores_byebye_payload_and_foreign_msearch() {
        let byebye = "NOTIFY * HTTP/1.1\r\n\
                      NT: upnp:rootdevice\r\n\
                      NTS: ssdp:byebye\r\n\
                      USN: uuid:abcd-1234::upnp:rootdevice\r\n\
                      \r\n";
        assert!(matches!(
            parse_message(byebye, from_addr()),
            Some(SsdpEvent::ByeBye { .. })
        ));

        let msearch = "M-SEARCH * HTTP/1.1\r\n\
                       HOST: 239.255.255.250:1900\r\n\
                       MAN: \"ssdp:discover\"\r\n\
                       ST: ssdp:all\r\n\
                       \r\n";
        assert!(parse_message(msearch, from_addr()).is_none());
    }

    #[test]
    fn search_response_missing_location_is_dropped() {
        let msg = "HTTP/1.1 200 OK\r\n\
                   ST: ssdp:all\r\n\
                   USN: uuid:abcd\r\n\
                   \r\n";
        assert!(parse_message(msg, from_addr()).is_none());
    }

    #[test]
    fn header_values_keep_embedded_colons() {
        let headers = parse_headers(
            "LOCATION: http://192.168.1.2:49152/desc.xml\r\nST: ssdp:all\r\n\r\n".lines(),
        );
        assert_eq!(
            headers.get("LOCATION").map(String::as_str),
            Some("http://192.168.1.2:49152/desc.xml")
        );
        assert_eq!(headers.get("ST").map(String::as_str), Some("ssdp:all"));
    }

    #[test]
    fn max_age_parsing_falls_back_to_default() {
        assert_eq!(parse_max_age(Some(&"max-age=120".to_string())), 120);
        assert_eq!(parse_max_age(Some(&"MAX-AGE = 90".to_string())), 90);
        assert_eq!(parse_max_age(Some(&"no-cache".to_string())), MAX_AGE);
        assert_eq!(parse_max_age(None), MAX_AGE);
    }
}
