use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::net::UdpSocket;

use super::{Device, PollOptions, ResponseEnvelope, Transport, VarBind, VarValue, parse_oid};
use crate::error::Result;

/// Транспорт для тестов: отдает заранее заданные ответы и запоминает запросы
#[derive(Default)]
pub struct ScriptedTransport {
    responses: VecDeque<Vec<ResponseEnvelope>>,
    pub requests: Vec<(Vec<String>, Option<PollOptions>)>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, envelopes: Vec<ResponseEnvelope>) -> Self {
        self.responses.push_back(envelopes);
        self
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn target(&self) -> &str {
        "scripted:161"
    }

    async fn bulk_poll(
        &mut self,
        oids: &[&str],
        options: Option<PollOptions>,
    ) -> Result<Vec<ResponseEnvelope>> {
        self.requests
            .push((oids.iter().map(|o| o.to_string()).collect(), options));
        Ok(self.responses.pop_front().unwrap_or_default())
    }
}

pub fn vb(oid: &str, value: VarValue) -> VarBind {
    VarBind::new(oid, value)
}

pub fn text(oid: &str, value: &str) -> VarBind {
    VarBind::new(oid, VarValue::text(value))
}

/// Значение в ответе loopback-агента
#[derive(Debug, Clone)]
pub enum AgentValue {
    Integer(i64),
    Text(&'static str),
    EndOfMibView,
}

/// Ответ loopback-агента на один GETBULK
#[derive(Debug, Clone)]
pub enum AgentReply {
    Response {
        error_status: u32,
        error_index: u32,
        binds: Vec<(String, AgentValue)>,
    },
    /// Запрос остается без ответа
    Silent,
}

impl AgentReply {
    pub fn binds(binds: Vec<(String, AgentValue)>) -> Self {
        AgentReply::Response {
            error_status: 0,
            error_index: 0,
            binds,
        }
    }
}

/// SNMPv2c агент на loopback UDP с community `public`
pub struct LoopbackAgent {
    pub port: u16,
    max_repetitions: Arc<Mutex<Vec<u32>>>,
}

impl LoopbackAgent {
    /// Отвечает по сценарию; последний ответ повторяется на все следующие запросы
    pub async fn start(replies: Vec<AgentReply>) -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = socket.local_addr().unwrap().port();
        let max_repetitions = Arc::new(Mutex::new(Vec::new()));
        let seen = max_repetitions.clone();

        tokio::spawn(async move {
            let mut replies = VecDeque::from(replies);
            let mut buf = vec![0u8; 65_535];
            loop {
                let Ok((len, peer)) = socket.recv_from(&mut buf).await else {
                    return;
                };
                // для GETBULK поле error-index несет max-repetitions
                let (req_id, repetitions) = match snmp2::Pdu::from_bytes(&buf[..len]) {
                    Ok(pdu) => (pdu.req_id, pdu.error_index),
                    Err(_) => continue,
                };
                seen.lock().unwrap().push(repetitions);

                let reply = if replies.len() > 1 {
                    replies.pop_front()
                } else {
                    replies.front().cloned()
                };
                if let Some(AgentReply::Response {
                    error_status,
                    error_index,
                    binds,
                }) = reply
                {
                    let packet = encode_response(req_id, error_status, error_index, &binds);
                    let _ = socket.send_to(&packet, peer).await;
                }
            }
        });

        Self { port, max_repetitions }
    }

    pub fn device(&self) -> Device {
        Device::new("127.0.0.1", self.port)
    }

    /// max-repetitions каждого полученного запроса
    pub fn requests(&self) -> Vec<u32> {
        self.max_repetitions.lock().unwrap().clone()
    }
}

fn tlv(tag: u8, body: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    let len = body.len();
    if len < 0x80 {
        out.push(len as u8);
    } else if len < 0x100 {
        out.extend([0x81, len as u8]);
    } else {
        out.extend([0x82, (len >> 8) as u8, len as u8]);
    }
    out.extend_from_slice(body);
    out
}

fn integer(value: i64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    while start < 7
        && ((bytes[start] == 0 && bytes[start + 1] & 0x80 == 0)
            || (bytes[start] == 0xff && bytes[start + 1] & 0x80 != 0))
    {
        start += 1;
    }
    tlv(0x02, &bytes[start..])
}

fn encode_response(req_id: i32, error_status: u32, error_index: u32, binds: &[(String, AgentValue)]) -> Vec<u8> {
    let var_binds: Vec<u8> = binds
        .iter()
        .flat_map(|(oid, value)| {
            let oid = parse_oid(oid).unwrap();
            let value = match value {
                AgentValue::Integer(v) => integer(*v),
                AgentValue::Text(s) => tlv(0x04, s.as_bytes()),
                AgentValue::EndOfMibView => vec![0x82, 0x00],
            };
            tlv(0x30, &[tlv(0x06, oid.as_bytes()), value].concat())
        })
        .collect();

    let pdu = tlv(
        0xa2,
        &[
            integer(i64::from(req_id)),
            integer(i64::from(error_status)),
            integer(i64::from(error_index)),
            tlv(0x30, &var_binds),
        ]
        .concat(),
    );
    tlv(0x30, &[integer(1), tlv(0x04, b"public"), pdu].concat())
}
