//! Détection de l'adresse IP locale à annoncer au renderer.

use std::net::UdpSocket;

/// Devine l'adresse IP locale de la machine.
///
/// Crée un socket UDP et le "connecte" vers un serveur DNS public pour
/// demander à l'OS quelle interface servirait à joindre Internet, sans
/// émettre le moindre paquet. C'est cette adresse-là que le renderer
/// devra pouvoir joindre pour venir chercher le fichier.
///
/// Retourne `127.0.0.1` si la machine n'a aucune route (le renderer ne
/// pourra alors lire que ce qui tourne sur la même machine).
///
/// # Examples
///
/// ```
/// let ip = pmocastserve::guess_local_ip();
/// assert!(ip.parse::<std::net::IpAddr>().is_ok());
/// ```
pub fn guess_local_ip() -> String {
    match UdpSocket::bind("0.0.0.0:0") {
        Ok(socket) => {
            if socket.connect("8.8.8.8:80").is_ok() {
                if let Ok(local_addr) = socket.local_addr() {
                    return local_addr.ip().to_string();
                }
            }
            "127.0.0.1".to_string()
        }
        Err(_) => "127.0.0.1".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::IpAddr;

    #[test]
    fn returns_a_parsable_ipv4() {
        let ip = guess_local_ip();
        let parsed = ip.parse::<IpAddr>().expect("should be a valid IP");
        assert!(parsed.is_ipv4());
    }

    #[test]
    fn never_empty() {
        assert!(!guess_local_ip().is_empty());
    }
}
