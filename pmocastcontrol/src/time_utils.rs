//! Parsing et formatage des temps UPnP.
//!
//! AVTransport transporte les positions en `H:MM:SS` (heures sans zéro
//! initial, parfois sur plusieurs chiffres). Les devices signalent une
//! durée inconnue par `NOT_IMPLEMENTED`, `-:--:--` ou une chaîne vide.

/// Parse un temps AVTransport (`H:MM:SS` ou `H+:MM:SS`) en secondes.
///
/// Retourne `None` pour les sentinelles d'inconnue et pour tout ce qui
/// ne se découpe pas en trois champs numériques entiers, fractions de
/// seconde (`0:00:01.500`) comprises.
///
/// # Examples
///
/// ```
/// use pmocastcontrol::time_utils::parse_upnp_time;
///
/// assert_eq!(parse_upnp_time("0:01:23"), Some(83));
/// assert_eq!(parse_upnp_time("1:02:03"), Some(3723));
/// assert_eq!(parse_upnp_time("NOT_IMPLEMENTED"), None);
/// assert_eq!(parse_upnp_time("-:--:--"), None);
/// ```
pub fn parse_upnp_time(raw: &str) -> Option<u64> {
    let s = raw.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("NOT_IMPLEMENTED") || s == "-:--:--" {
        return None;
    }

    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 3 {
        return None;
    }

    let hours: u64 = parts[0].parse().ok()?;
    let minutes: u64 = parts[1].parse().ok()?;
    let seconds: u64 = parts[2].parse().ok()?;

    Some(hours * 3600 + minutes * 60 + seconds)
}

/// Formate des secondes pour l'affichage: `M:SS`, puis `H:MM:SS` à
/// partir d'une heure.
///
/// # Examples
///
/// ```
/// use pmocastcontrol::time_utils::format_clock;
///
/// assert_eq!(format_clock(83), "1:23");
/// assert_eq!(format_clock(225), "3:45");
/// assert_eq!(format_clock(3723), "1:02:03");
/// ```
pub fn format_clock(secs: u64) -> String {
    let minutes = secs / 60;
    let seconds = secs % 60;
    if minutes >= 60 {
        let hours = minutes / 60;
        let minutes = minutes % 60;
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_times() {
        assert_eq!(parse_upnp_time("0:00:00"), Some(0));
        assert_eq!(parse_upnp_time("0:01:23"), Some(83));
        assert_eq!(parse_upnp_time("0:03:45"), Some(225));
        assert_eq!(parse_upnp_time("12:00:01"), Some(43201));
    }

    #[test]
    fn trims_whitespace() {
        assert_eq!(parse_upnp_time(" 0:01:23 "), Some(83));
    }

    #[test]
    fn unknown_sentinels_map_to_none() {
        assert_eq!(parse_upnp_time(""), None);
        assert_eq!(parse_upnp_time("NOT_IMPLEMENTED"), None);
        assert_eq!(parse_upnp_time("not_implemented"), None);
        assert_eq!(parse_upnp_time("-:--:--"), None);
    }

    #[test]
    fn malformed_times_map_to_none() {
        assert_eq!(parse_upnp_time("1:23"), None);
        assert_eq!(parse_upnp_time("1:2:3:4"), None);
        assert_eq!(parse_upnp_time("a:bc:de"), None);
        assert_eq!(parse_upnp_time("0:00:01.500"), None);
    }

    #[test]
    fn formats_short_and_long_clocks() {
        assert_eq!(format_clock(0), "0:00");
        assert_eq!(format_clock(9), "0:09");
        assert_eq!(format_clock(83), "1:23");
        assert_eq!(format_clock(3599), "59:59");
        assert_eq!(format_clock(3600), "1:00:00");
        assert_eq!(format_clock(3723), "1:02:03");
    }
}
