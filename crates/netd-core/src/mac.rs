//! MAC address canonicalization shared by the ARP and NetBIOS probes.

/// Normalize a MAC address to lowercase colon-hex (`xx:xx:xx:xx:xx:xx`).
///
/// Accepts colon- or dash-separated input in any case. Returns `None` if
/// the input does not decode to exactly six octets.
pub fn normalize_mac(raw: &str) -> Option<String> {
    let cleaned = raw.trim().replace('-', ":");
    let parts: Vec<&str> = cleaned.split(':').collect();
    if parts.len() != 6 {
        return None;
    }

    let mut octets = Vec::with_capacity(6);
    for part in parts {
        if part.len() != 2 || !part.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        octets.push(part.to_ascii_lowercase());
    }

    Some(octets.join(":"))
}

/// `^[0-9a-f]{2}(:[0-9a-f]{2}){5}$`
pub fn is_canonical_mac(mac: &str) -> bool {
    let parts: Vec<&str> = mac.split(':').collect();
    parts.len() == 6
        && parts
            .iter()
            .all(|p| p.len() == 2 && p.chars().all(|c| c.is_ascii_hexdigit() && !c.is_uppercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_mixed_case_colons() {
        assert_eq!(
            normalize_mac("aa:BB:cc:dd:ee:ff"),
            Some("aa:bb:cc:dd:ee:ff".to_string())
        );
    }

    #[test]
    fn normalizes_dashes() {
        assert_eq!(
            normalize_mac("AA-BB-CC-DD-EE-FF"),
            Some("aa:bb:cc:dd:ee:ff".to_string())
        );
    }

    #[test]
    fn rejects_malformed() {
        assert_eq!(normalize_mac("not-a-mac"), None);
        assert_eq!(normalize_mac("aa:bb:cc:dd:ee"), None);
    }

    #[test]
    fn canonical_check_matches_spec_regex() {
        assert!(is_canonical_mac("aa:bb:cc:dd:ee:ff"));
        assert!(!is_canonical_mac("AA:bb:cc:dd:ee:ff"));
        assert!(!is_canonical_mac("aa:bb:cc:dd:ee"));
    }
}
