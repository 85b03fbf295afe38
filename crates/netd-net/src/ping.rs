//! Ping probe (C2): ICMP echo, falling back to ICMP timestamp.
//!
//! Grounded on the pnet raw-socket ICMP echo implementation in the teacher
//! crate's `discovery.rs` (`icmp_echo_ipv4`), generalized with the
//! timestamp-retry fallback spec section 4.2 describes (mirroring the
//! source's "ping library version >= 2.67" capability gate, modeled here
//! as an explicit flag rather than inspecting a library version string).

use netd_core::DeviceFields;
use pnet::packet::icmp::{echo_request, IcmpCode, IcmpPacket, IcmpType, IcmpTypes, MutableIcmpPacket};
use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::packet::Packet;
use pnet::transport::{icmp_packet_iter, transport_channel, TransportChannelType, TransportProtocol};
use std::net::{IpAddr, Ipv4Addr};
use std::time::{Duration, Instant};
use tracing::debug;

/// ICMP type 13: Timestamp Request.
const ICMP_TIMESTAMP_REQUEST: u8 = 13;
/// ICMP type 14: Timestamp Reply.
const ICMP_TIMESTAMP_REPLY: u8 = 14;

/// Per spec section 5: ping has a hard 1-second floor regardless of the
/// job's configured per-address timeout.
pub const MIN_PING_TIMEOUT: Duration = Duration::from_secs(1);

pub struct PingProbe {
    timeout: Duration,
    /// Whether a timestamp retry should follow a failed echo request.
    /// The source only retries when the linked ping library reports
    /// version >= 2.67; we surface that as a constructor flag instead of
    /// probing a library version at runtime.
    retry_with_timestamp: bool,
}

impl PingProbe {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout: timeout.max(MIN_PING_TIMEOUT),
            retry_with_timestamp: true,
        }
    }

    #[cfg(test)]
    pub fn without_timestamp_retry(timeout: Duration) -> Self {
        Self {
            timeout: timeout.max(MIN_PING_TIMEOUT),
            retry_with_timestamp: false,
        }
    }

    /// Probe a single address. On success, sets `dns_hostname` to the IP
    /// itself as a liveness marker (spec section 4.2: "not a real hostname").
    pub async fn probe(&self, ip: Ipv4Addr) -> DeviceFields {
        let alive = self.echo(ip).await
            || (self.retry_with_timestamp && self.timestamp(ip).await);

        if alive {
            DeviceFields {
                dns_hostname: Some(ip.to_string()),
                ..Default::default()
            }
        } else {
            DeviceFields::default()
        }
    }

    async fn echo(&self, ip: Ipv4Addr) -> bool {
        let timeout = self.timeout;
        tokio::task::spawn_blocking(move || icmp_echo_request(ip, timeout))
            .await
            .unwrap_or(false)
    }

    async fn timestamp(&self, ip: Ipv4Addr) -> bool {
        let timeout = self.timeout;
        tokio::task::spawn_blocking(move || icmp_timestamp_request(ip, timeout))
            .await
            .unwrap_or(false)
    }
}

fn icmp_echo_request(target: Ipv4Addr, timeout: Duration) -> bool {
    let protocol = TransportChannelType::Layer4(TransportProtocol::Ipv4(IpNextHeaderProtocols::Icmp));
    let (mut tx, mut rx) = match transport_channel(1024, protocol) {
        Ok(chan) => chan,
        Err(e) => {
            debug!(%target, error = %e, "failed to open ICMP transport for echo");
            return false;
        }
    };

    let identifier = std::process::id() as u16;
    let payload = b"netdiscovery";
    let mut buffer = vec![0u8; echo_request::MutableEchoRequestPacket::minimum_packet_size() + payload.len()];
    let mut echo_packet = match echo_request::MutableEchoRequestPacket::new(&mut buffer) {
        Some(p) => p,
        None => return false,
    };
    echo_packet.set_icmp_type(IcmpTypes::EchoRequest);
    echo_packet.set_icmp_code(IcmpCode(0));
    echo_packet.set_identifier(identifier);
    echo_packet.set_sequence_number(1);
    echo_packet.set_payload(payload);
    let checksum = pnet::util::checksum(echo_packet.packet(), 1);
    echo_packet.set_checksum(checksum);

    if tx.send_to(echo_packet, IpAddr::V4(target)).is_err() {
        return false;
    }

    let start = Instant::now();
    let mut iter = icmp_packet_iter(&mut rx);
    while start.elapsed() < timeout {
        let Ok(Some((packet, IpAddr::V4(src)))) = iter.next_with_timeout(Duration::from_millis(100)) else {
            continue;
        };
        if src != target || packet.get_icmp_type() != IcmpTypes::EchoReply {
            continue;
        }
        if let Some(reply) = echo_request::EchoRequestPacket::new(packet.packet()) {
            if reply.get_identifier() == identifier {
                return true;
            }
        }
    }
    false
}

fn icmp_timestamp_request(target: Ipv4Addr, timeout: Duration) -> bool {
    let protocol = TransportChannelType::Layer4(TransportProtocol::Ipv4(IpNextHeaderProtocols::Icmp));
    let (mut tx, mut rx) = match transport_channel(1024, protocol) {
        Ok(chan) => chan,
        Err(e) => {
            debug!(%target, error = %e, "failed to open ICMP transport for timestamp");
            return false;
        }
    };

    let identifier = std::process::id() as u16;
    // 8-byte ICMP header + 3 x 4-byte timestamps (originate/receive/transmit).
    let mut buffer = vec![0u8; 20];
    {
        let mut packet = match MutableIcmpPacket::new(&mut buffer) {
            Some(p) => p,
            None => return false,
        };
        packet.set_icmp_type(IcmpType(ICMP_TIMESTAMP_REQUEST));
        packet.set_icmp_code(IcmpCode(0));
    }
    buffer[4..6].copy_from_slice(&identifier.to_be_bytes());
    buffer[6..8].copy_from_slice(&1u16.to_be_bytes());
    // Originate timestamp: milliseconds since UTC midnight, per RFC 792.
    // The exact clock value is immaterial; we only need a live reply.
    buffer[8..12].copy_from_slice(&0u32.to_be_bytes());

    let checksum = {
        let view = IcmpPacket::new(&buffer).expect("buffer sized for ICMP packet");
        pnet::packet::icmp::checksum(&view)
    };
    buffer[2..4].copy_from_slice(&checksum.to_be_bytes());

    let packet = match MutableIcmpPacket::owned(buffer) {
        Some(p) => p,
        None => return false,
    };
    if tx.send_to(packet, IpAddr::V4(target)).is_err() {
        return false;
    }

    let start = Instant::now();
    let mut iter = icmp_packet_iter(&mut rx);
    while start.elapsed() < timeout {
        let Ok(Some((packet, IpAddr::V4(src)))) = iter.next_with_timeout(Duration::from_millis(100)) else {
            continue;
        };
        if src != target || packet.get_icmp_type() != IcmpType(ICMP_TIMESTAMP_REPLY) {
            continue;
        }
        let payload = packet.packet();
        if payload.len() >= 6 {
            let reply_id = u16::from_be_bytes([payload[4], payload[5]]);
            if reply_id == identifier {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_floored_at_one_second() {
        let probe = PingProbe::new(Duration::from_millis(200));
        assert_eq!(probe.timeout, MIN_PING_TIMEOUT);
    }

    #[test]
    fn longer_timeout_passes_through() {
        let probe = PingProbe::new(Duration::from_secs(5));
        assert_eq!(probe.timeout, Duration::from_secs(5));
    }
}
