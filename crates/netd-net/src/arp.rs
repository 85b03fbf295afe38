//! ARP probe (C2).
//!
//! Runs the platform's ARP-listing command against a single address and
//! parses its output for a MAC/hostname pair. Grounded on the `ip neigh`
//! parsing in other_examples' dendrite `arp.rs`, generalized to also cover
//! BSD `arp -a` and Windows `arp -a` output shapes per spec section 4.2.

use netd_core::{normalize_mac, DeviceFields};
use std::net::Ipv4Addr;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, trace};

/// Which ARP-listing command this host has available, detected once at
/// startup rather than checked per-probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArpCommand {
    /// `arp -a <ip>` (BSD/macOS/Windows/most Linux distros)
    Arp,
    /// `ip neighbor show <ip>` (Linux, iproute2)
    IpNeighbor,
}

impl ArpCommand {
    /// Detect the available command, preferring `arp -a` per spec section 4.2.
    pub fn detect() -> Option<Self> {
        if std::process::Command::new("arp")
            .arg("-a")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok()
        {
            return Some(ArpCommand::Arp);
        }
        if std::process::Command::new("ip")
            .args(["neighbor", "show"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok()
        {
            return Some(ArpCommand::IpNeighbor);
        }
        None
    }
}

/// The ARP probe, bound to whichever command [`ArpCommand::detect`] found.
pub struct ArpProbe {
    command: ArpCommand,
}

impl ArpProbe {
    pub fn new(command: ArpCommand) -> Self {
        Self { command }
    }

    pub async fn probe(&self, ip: Ipv4Addr) -> DeviceFields {
        let output = match self.command {
            ArpCommand::Arp => Command::new("arp").arg("-a").arg(ip.to_string()).output().await,
            ArpCommand::IpNeighbor => {
                Command::new("ip")
                    .args(["neighbor", "show", &ip.to_string()])
                    .output()
                    .await
            }
        };

        let output = match output {
            Ok(o) => o,
            Err(e) => {
                debug!(%ip, error = %e, "arp probe command failed to run");
                return DeviceFields::default();
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        for line in stdout.lines() {
            if let Some(fields) = parse_line(line, ip) {
                trace!(%ip, ?fields, "arp probe matched line");
                return fields;
            }
        }

        DeviceFields::default()
    }
}

fn looks_like_mac_colon(token: &str) -> bool {
    let parts: Vec<&str> = token.split(':').collect();
    parts.len() == 6 && parts.iter().all(|p| p.len() == 2 && p.chars().all(|c| c.is_ascii_hexdigit()))
}

fn looks_like_mac_dash(token: &str) -> bool {
    let parts: Vec<&str> = token.split('-').collect();
    parts.len() == 6 && parts.iter().all(|p| p.len() == 2 && p.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Parse one line of ARP command output for `ip`, trying the three
/// alternative shapes of spec section 4.2 in order.
fn parse_line(line: &str, ip: Ipv4Addr) -> Option<DeviceFields> {
    let ip_str = ip.to_string();
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.is_empty() {
        return None;
    }

    // Shape 1: "hostname (ip) at xx:xx:xx:xx:xx:xx ..."
    let paren_ip = format!("({ip_str})");
    if let Some(idx) = tokens.iter().position(|&t| t == paren_ip) {
        if idx + 2 < tokens.len() && tokens[idx + 1].eq_ignore_ascii_case("at") {
            let mac_tok = tokens[idx + 2];
            if looks_like_mac_colon(mac_tok) {
                let mut fields = DeviceFields {
                    mac: normalize_mac(mac_tok),
                    ..Default::default()
                };
                if idx > 0 && tokens[idx - 1] != "?" {
                    fields.dns_hostname = Some(tokens[idx - 1].to_string());
                }
                return Some(fields);
            }
        }
    }

    if tokens[0] != ip_str {
        return None;
    }

    // Shape 3: Linux `ip neighbor show`: "<ip> dev IF lladdr xx:xx:... STATE"
    if let Some(idx) = tokens.iter().position(|&t| t == "lladdr") {
        if let Some(mac_tok) = tokens.get(idx + 1) {
            if looks_like_mac_colon(mac_tok) {
                return Some(DeviceFields {
                    mac: normalize_mac(mac_tok),
                    ..Default::default()
                });
            }
        }
    }

    // Shape 2: Windows-style: "<ip>   xx-xx-xx-xx-xx-xx   dynamic"
    if let Some(mac_tok) = tokens.get(1) {
        if looks_like_mac_dash(mac_tok) {
            return Some(DeviceFields {
                mac: normalize_mac(mac_tok),
                ..Default::default()
            });
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip() -> Ipv4Addr {
        "192.0.2.5".parse().unwrap()
    }

    #[test]
    fn parses_bsd_style_with_hostname() {
        let line = "host (192.0.2.5) at aa:BB:cc:dd:ee:ff on en0 ifscope [ethernet]";
        let fields = parse_line(line, ip()).unwrap();
        assert_eq!(fields.mac.as_deref(), Some("aa:bb:cc:dd:ee:ff"));
        assert_eq!(fields.dns_hostname.as_deref(), Some("host"));
    }

    #[test]
    fn bsd_style_with_literal_unknown_hostname_has_no_dns_hostname() {
        let line = "? (192.0.2.5) at aa:bb:cc:dd:ee:ff on en0";
        let fields = parse_line(line, ip()).unwrap();
        assert_eq!(fields.mac.as_deref(), Some("aa:bb:cc:dd:ee:ff"));
        assert_eq!(fields.dns_hostname, None);
    }

    #[test]
    fn parses_windows_style() {
        let line = "  192.0.2.5   AA-BB-CC-DD-EE-FF  dynamic";
        let fields = parse_line(line, ip()).unwrap();
        assert_eq!(fields.mac.as_deref(), Some("aa:bb:cc:dd:ee:ff"));
        assert_eq!(fields.dns_hostname, None);
    }

    #[test]
    fn parses_linux_ip_neighbor_style() {
        let line = "192.0.2.5 dev eth0 lladdr aa:bb:cc:dd:ee:ff REACHABLE";
        let fields = parse_line(line, ip()).unwrap();
        assert_eq!(fields.mac.as_deref(), Some("aa:bb:cc:dd:ee:ff"));
    }

    #[test]
    fn unrelated_line_is_skipped() {
        let line = "some.other.host (192.0.2.200) at 11:22:33:44:55:66 on en0";
        assert!(parse_line(line, ip()).is_none());
    }
}
