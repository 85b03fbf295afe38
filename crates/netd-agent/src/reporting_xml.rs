//! XML/HTTP realization of the `Reporter` seam (spec section 4.7/6):
//! NETDISCOVERY envelopes built with `quick-xml`, POSTed with `reqwest`.
//! Send failures are logged, never propagated (spec section 7
//! transport-send-failure is non-terminal).

use netd_core::DeviceResult;
use netd_engine::{Message, Reporter};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::warn;

#[derive(Debug, Serialize)]
struct Agent {
    #[serde(rename = "START", skip_serializing_if = "Option::is_none")]
    start: Option<u8>,
    #[serde(rename = "AGENTVERSION", skip_serializing_if = "Option::is_none")]
    agent_version: Option<String>,
    #[serde(rename = "NBIP", skip_serializing_if = "Option::is_none")]
    nbip: Option<u64>,
    #[serde(rename = "END", skip_serializing_if = "Option::is_none")]
    end: Option<u8>,
    #[serde(rename = "EXIT", skip_serializing_if = "Option::is_none")]
    exit: Option<u8>,
}

#[derive(Debug, Serialize)]
struct DeviceXml {
    #[serde(rename = "IP")]
    ip: String,
    #[serde(rename = "MAC", skip_serializing_if = "Option::is_none")]
    mac: Option<String>,
    #[serde(rename = "DNSHOSTNAME", skip_serializing_if = "Option::is_none")]
    dns_hostname: Option<String>,
    #[serde(rename = "SNMPHOSTNAME", skip_serializing_if = "Option::is_none")]
    snmp_hostname: Option<String>,
    #[serde(rename = "NETBIOSNAME", skip_serializing_if = "Option::is_none")]
    netbios_name: Option<String>,
    #[serde(rename = "WORKGROUP", skip_serializing_if = "Option::is_none")]
    workgroup: Option<String>,
    #[serde(rename = "USERSESSION", skip_serializing_if = "Option::is_none")]
    user_session: Option<String>,
    #[serde(rename = "AUTHSNMP", skip_serializing_if = "Option::is_none")]
    auth_snmp: Option<String>,
    #[serde(rename = "AUTHPORT", skip_serializing_if = "Option::is_none")]
    auth_port: Option<u16>,
    #[serde(rename = "AUTHPROTOCOL", skip_serializing_if = "Option::is_none")]
    auth_protocol: Option<String>,
    #[serde(rename = "ENTITY", skip_serializing_if = "Option::is_none")]
    entity: Option<String>,
}

impl From<&DeviceResult> for DeviceXml {
    fn from(result: &DeviceResult) -> Self {
        Self {
            ip: result.ip.to_string(),
            mac: result.fields.mac.clone(),
            dns_hostname: result.fields.dns_hostname.clone(),
            snmp_hostname: result.fields.snmp_hostname.clone(),
            netbios_name: result.fields.netbios_name.clone(),
            workgroup: result.fields.workgroup.clone(),
            user_session: result.fields.user_session.clone(),
            auth_snmp: result.fields.auth_snmp.clone(),
            auth_port: result.fields.auth_port,
            auth_protocol: result.fields.auth_protocol.clone(),
            entity: result.fields.entity.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename = "REQUEST")]
struct Envelope {
    #[serde(rename = "@deviceid")]
    deviceid: String,
    #[serde(rename = "AGENT", skip_serializing_if = "Option::is_none")]
    agent: Option<Agent>,
    #[serde(rename = "MODULEVERSION", skip_serializing_if = "Option::is_none")]
    module_version: Option<String>,
    #[serde(rename = "PROCESSNUMBER")]
    process_number: u32,
    #[serde(rename = "DEVICE", skip_serializing_if = "Option::is_none")]
    device: Option<DeviceXml>,
}

fn envelope_for(message: &Message, deviceid: &str, agent_version: &str, module_version: &str) -> Envelope {
    match message {
        Message::Start { pid, .. } => Envelope {
            deviceid: deviceid.to_string(),
            agent: Some(Agent {
                start: Some(1),
                agent_version: Some(agent_version.to_string()),
                nbip: None,
                end: None,
                exit: None,
            }),
            module_version: Some(module_version.to_string()),
            process_number: *pid,
            device: None,
        },
        Message::Nbip { pid, count } => Envelope {
            deviceid: deviceid.to_string(),
            agent: Some(Agent {
                start: None,
                agent_version: None,
                nbip: Some(*count),
                end: None,
                exit: None,
            }),
            module_version: None,
            process_number: *pid,
            device: None,
        },
        Message::Device { pid, record } => Envelope {
            deviceid: deviceid.to_string(),
            agent: None,
            module_version: Some(module_version.to_string()),
            process_number: *pid,
            device: Some(DeviceXml::from(record)),
        },
        Message::End { pid } => Envelope {
            deviceid: deviceid.to_string(),
            agent: Some(Agent {
                start: None,
                agent_version: None,
                nbip: None,
                end: Some(1),
                exit: None,
            }),
            module_version: Some(module_version.to_string()),
            process_number: *pid,
            device: None,
        },
        Message::Exit { pid } => Envelope {
            deviceid: deviceid.to_string(),
            agent: Some(Agent {
                start: None,
                agent_version: None,
                nbip: None,
                end: None,
                exit: Some(1),
            }),
            module_version: Some(module_version.to_string()),
            process_number: *pid,
            device: None,
        },
    }
}

/// POSTs NETDISCOVERY XML envelopes to the management server. Messages
/// are enqueued by `send` (non-blocking) and delivered in order by a
/// single background task, preserving the per-job ordering invariant
/// (spec section 5) even though HTTP delivery is async.
pub struct XmlHttpReporter {
    tx: mpsc::UnboundedSender<Message>,
}

impl XmlHttpReporter {
    pub fn new(client: reqwest::Client, server_url: String, deviceid: String, agent_version: String, module_version: String) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                let envelope = envelope_for(&message, &deviceid, &agent_version, &module_version);
                let body = match quick_xml::se::to_string(&envelope) {
                    Ok(body) => body,
                    Err(e) => {
                        warn!(error = %e, "failed to serialize NETDISCOVERY envelope");
                        continue;
                    }
                };
                if let Err(e) = client
                    .post(&server_url)
                    .header("Content-Type", "text/xml")
                    .body(body)
                    .send()
                    .await
                {
                    warn!(error = %e, "failed to POST discovery message");
                }
            }
        });

        Self { tx }
    }
}

impl Reporter for XmlHttpReporter {
    fn send(&self, message: Message) {
        let _ = self.tx.send(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_envelope_has_agent_start_and_version() {
        let message = Message::Start { pid: 42, agent_version: "1.2".to_string() };
        let envelope = envelope_for(&message, "agent-1", "1.2", "3.0");
        let xml = quick_xml::se::to_string(&envelope).unwrap();
        assert!(xml.contains("<START>1</START>"));
        assert!(xml.contains("<AGENTVERSION>1.2</AGENTVERSION>"));
        assert!(xml.contains("<PROCESSNUMBER>42</PROCESSNUMBER>"));
    }

    #[test]
    fn device_envelope_carries_ip_and_mac() {
        let record = DeviceResult {
            ip: "192.0.2.5".parse().unwrap(),
            fields: netd_core::DeviceFields {
                mac: Some("aa:bb:cc:dd:ee:ff".to_string()),
                ..Default::default()
            },
        };
        let message = Message::Device { pid: 1, record };
        let envelope = envelope_for(&message, "agent-1", "1.2", "3.0");
        let xml = quick_xml::se::to_string(&envelope).unwrap();
        assert!(xml.contains("<IP>192.0.2.5</IP>"));
        assert!(xml.contains("<MAC>aa:bb:cc:dd:ee:ff</MAC>"));
    }
}
