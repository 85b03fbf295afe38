//! NetBIOS probe (C2): NBSTAT node status query over UDP/137.
//!
//! Wire format grounded on other_examples' `rust_network_discovery_tool`
//! netbios scanner; the name-record classification follows spec section 4.2.

use netd_core::{normalize_mac, DeviceFields};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::timeout as tokio_timeout;

const NETBIOS_PORT: u16 = 137;
static TRANSACTION_ID: AtomicU16 = AtomicU16::new(1);

/// Bit 15 of the NBSTAT name flags: group (workgroup/domain) vs unique name.
const GROUP_FLAG: u16 = 0x8000;

pub struct NetBiosProbe {
    timeout: Duration,
}

impl NetBiosProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub async fn probe(&self, ip: Ipv4Addr) -> DeviceFields {
        self.query(ip).await.unwrap_or_default()
    }

    async fn query(&self, ip: Ipv4Addr) -> std::io::Result<DeviceFields> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        let target = SocketAddr::new(IpAddr::V4(ip), NETBIOS_PORT);
        let request = build_nbstat_request(TRANSACTION_ID.fetch_add(1, Ordering::Relaxed));
        socket.send_to(&request, target).await?;

        let mut buf = [0u8; 1024];
        let len = match tokio_timeout(self.timeout, socket.recv(&mut buf)).await {
            Ok(Ok(len)) => len,
            _ => return Ok(DeviceFields::default()),
        };

        Ok(parse_nbstat_response(&buf[..len]).unwrap_or_default())
    }
}

/// Build a Node Status Request for the wildcard name `*`, per NBSTAT
/// (RFC 1002 section 4.2.17/4.2.18).
fn build_nbstat_request(transaction_id: u16) -> Vec<u8> {
    let mut packet = Vec::with_capacity(50);

    packet.extend_from_slice(&transaction_id.to_be_bytes());
    packet.extend_from_slice(&[0x00, 0x00]); // flags: standard query
    packet.extend_from_slice(&[0x00, 0x01]); // questions: 1
    packet.extend_from_slice(&[0x00, 0x00]); // answer RRs
    packet.extend_from_slice(&[0x00, 0x00]); // authority RRs
    packet.extend_from_slice(&[0x00, 0x00]); // additional RRs

    // "*" padded to 16 chars with spaces, first-level encoded (nibble + 'A').
    packet.push(0x20);
    packet.push(b'C');
    packet.push(b'K');
    for _ in 0..15 {
        packet.push(b'C');
        packet.push(b'A');
    }
    packet.push(0x00); // name terminator

    packet.extend_from_slice(&[0x00, 0x21]); // qtype: NBSTAT
    packet.extend_from_slice(&[0x00, 0x01]); // qclass: IN
    packet
}

/// Parse a Node Status Response, applying the classification rules of
/// spec section 4.2: (0, GROUP) -> workgroup, (3, UNIQUE) -> user session,
/// (0, UNIQUE) not prefixed `IS~` -> netbios name. MAC comes from the
/// hardware address trailing the name table.
fn parse_nbstat_response(data: &[u8]) -> Option<DeviceFields> {
    // header(12) + qname(32) + null(1) + qtype(2) + qclass(2) = 49, then
    // TTL(4) + RDLENGTH(2) before the name count byte.
    let mut pos = 50;
    if data.len() < pos + 6 {
        return None;
    }
    let rdlength = u16::from_be_bytes([data[pos + 4], data[pos + 5]]) as usize;
    pos += 6;

    if rdlength < 1 || data.len() < pos + rdlength {
        return None;
    }

    let num_names = data[pos] as usize;
    pos += 1;
    if data.len() < pos + (num_names * 18) {
        return None;
    }

    let mut fields = DeviceFields::default();

    for _ in 0..num_names {
        let name_bytes = &data[pos..pos + 15];
        let suffix = data[pos + 15];
        let flags = u16::from_be_bytes([data[pos + 16], data[pos + 17]]);
        pos += 18;

        let name = String::from_utf8_lossy(name_bytes).trim_end().to_string();
        if name.is_empty() {
            continue;
        }
        let is_group = (flags & GROUP_FLAG) != 0;

        match (suffix, is_group) {
            (0x00, true) if fields.workgroup.is_none() => fields.workgroup = Some(name),
            (0x03, false) if fields.user_session.is_none() => fields.user_session = Some(name),
            (0x00, false) if fields.netbios_name.is_none() && !name.starts_with("IS~") => {
                fields.netbios_name = Some(name)
            }
            _ => {}
        }
    }

    if pos + 6 <= data.len() {
        let mac = format!(
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            data[pos], data[pos + 1], data[pos + 2], data[pos + 3], data[pos + 4], data[pos + 5]
        );
        fields.mac = normalize_mac(&mac);
    }

    if fields.workgroup.is_none() && fields.user_session.is_none() && fields.netbios_name.is_none() {
        return None;
    }

    Some(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_request_has_nbstat_query_type() {
        let request = build_nbstat_request(0x1234);
        assert_eq!(request[0], 0x12);
        assert_eq!(request[1], 0x34);
        assert_eq!(request[request.len() - 4], 0x00);
        assert_eq!(request[request.len() - 3], 0x21);
    }

    fn name_entry(name: &str, suffix: u8, is_group: bool) -> Vec<u8> {
        let mut entry = vec![0x20; 15];
        for (i, b) in name.as_bytes().iter().take(15).enumerate() {
            entry[i] = *b;
        }
        entry.push(suffix);
        let flags: u16 = if is_group { GROUP_FLAG } else { 0 };
        entry.extend_from_slice(&flags.to_be_bytes());
        entry
    }

    fn synth_response(entries: &[Vec<u8>], mac: [u8; 6]) -> Vec<u8> {
        // header(50) + TTL(4) + RDLENGTH(2) = 56, matching the offsets
        // `parse_nbstat_response` reads at pos=50 (pos+4/pos+5 for RDLENGTH).
        let mut data = vec![0u8; 56];
        let rdlength = 1 + entries.len() * 18 + 6;
        data[54] = (rdlength >> 8) as u8;
        data[55] = (rdlength & 0xff) as u8;
        data.push(entries.len() as u8);
        for e in entries {
            data.extend_from_slice(e);
        }
        data.extend_from_slice(&mac);
        data
    }

    #[test]
    fn classifies_workgroup_user_session_and_netbios_name() {
        let entries = vec![
            name_entry("HOST", 0x00, false),
            name_entry("WORKGRP", 0x00, true),
            name_entry("HOST", 0x03, false),
        ];
        let response = synth_response(&entries, [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
        let fields = parse_nbstat_response(&response).unwrap();
        assert_eq!(fields.netbios_name.as_deref(), Some("HOST"));
        assert_eq!(fields.workgroup.as_deref(), Some("WORKGRP"));
        assert_eq!(fields.user_session.as_deref(), Some("HOST"));
        assert_eq!(fields.mac.as_deref(), Some("aa:bb:cc:dd:ee:ff"));
    }

    #[test]
    fn skips_names_prefixed_is_tilde() {
        let entries = vec![name_entry("IS~HOST", 0x00, false)];
        let response = synth_response(&entries, [0, 0, 0, 0, 0, 0]);
        let fields = parse_nbstat_response(&response).unwrap_or_default();
        assert_eq!(fields.netbios_name, None);
    }
}
