use std::cmp::Ordering;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use snmp2::v3::{Auth, AuthProtocol, Cipher, Security};
use snmp2::{AsyncSession, Oid};
use tokio::time::timeout;
use tracing::{debug, warn};

use super::{
    ErrorStatus, PollOptions, ResponseEnvelope, Transport, VarBind, VarValue, compare_oids, is_under, parse_oid,
};
use crate::error::{PollError, Result};

const DEFAULT_SNMP_PORT: u16 = 161;
const TIMEOUT_INDICATION: &str = "No SNMP response received before timeout";
/// Предел строк одного обхода без явного max_rows
const MAX_WALK_ROWS: usize = 65_536;

/// Опрашиваемое устройство
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    DEFAULT_SNMP_PORT
}

impl Device {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Разбирает `host`, `host:port`, `[ipv6]` или `[ipv6]:port`
    pub fn parse(target: &str) -> Self {
        let target = target.trim();
        if let Some(rest) = target.strip_prefix('[') {
            let parsed = rest.split_once(']').and_then(|(host, tail)| match tail {
                "" => Some((host, DEFAULT_SNMP_PORT)),
                tail => tail.strip_prefix(':')?.parse().ok().map(|port| (host, port)),
            });
            return match parsed {
                Some((host, port)) => Self::new(host, port),
                None => Self::new(target, DEFAULT_SNMP_PORT),
            };
        }

        match target.rsplit_once(':') {
            Some((host, port)) if !host.contains(':') => match port.parse() {
                Ok(port) => Self::new(host, port),
                Err(_) => Self::new(target, DEFAULT_SNMP_PORT),
            },
            _ => Self::new(target, DEFAULT_SNMP_PORT),
        }
    }

    pub fn target(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.target())
    }
}

/// Параметры аутентификации, передаются в сессию без изменений
#[derive(Clone)]
pub enum Authentication {
    V2c {
        community: Vec<u8>,
    },
    V3 {
        username: Vec<u8>,
        /// Пустой пароль — noAuthNoPriv
        auth_password: Vec<u8>,
        auth_protocol: AuthProtocol,
        /// None — authNoPriv
        privacy: Option<(Cipher, Vec<u8>)>,
    },
}

impl fmt::Debug for Authentication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Authentication::V2c { .. } => write!(f, "SNMPv2c"),
            Authentication::V3 { username, privacy, .. } => write!(
                f,
                "SNMPv3(user={}, priv={})",
                String::from_utf8_lossy(username),
                privacy.is_some()
            ),
        }
    }
}

impl Authentication {
    pub fn version(&self) -> &'static str {
        match self {
            Authentication::V2c { .. } => "SNMPv2c",
            Authentication::V3 { .. } => "SNMPv3",
        }
    }
}

/// Транспорт поверх snmp2::AsyncSession (GETBULK)
pub struct SnmpTransport {
    session: AsyncSession,
    target: String,
    defaults: PollOptions,
    max_repetitions: u32,
}

/// Владеющая копия ответа, не привязанная к буферу сессии
struct BulkResponse {
    error_status: u32,
    error_index: u32,
    varbinds: Vec<(Oid<'static>, VarValue)>,
}

impl SnmpTransport {
    pub async fn connect(
        device: &Device,
        auth: &Authentication,
        defaults: PollOptions,
        max_repetitions: u32,
    ) -> Result<Self> {
        let target = device.target();

        let session = match auth {
            Authentication::V2c { community } => AsyncSession::new_v2c(target.as_str(), community, 2)
                .await
                .map_err(|e| PollError::Session(format!("{}: {}", target, e)))?,
            Authentication::V3 {
                username,
                auth_password,
                auth_protocol,
                privacy,
            } => {
                let level = match (auth_password.is_empty(), privacy) {
                    (true, _) => Auth::NoAuthNoPriv,
                    (false, None) => Auth::AuthNoPriv,
                    (false, Some((cipher, privacy_password))) => Auth::AuthPriv {
                        cipher: cipher.clone(),
                        privacy_password: privacy_password.clone(),
                    },
                };
                let security = Security::new(username, auth_password)
                    .with_auth_protocol(auth_protocol.clone())
                    .with_auth(level);

                let mut session = AsyncSession::new_v3(target.as_str(), 2, security)
                    .await
                    .map_err(|e| PollError::Session(format!("{}: {}", target, e)))?;
                session
                    .init()
                    .await
                    .map_err(|e| PollError::Session(format!("{}: {}", target, e)))?;
                session
            }
        };

        debug!(device = %target, version = auth.version(), "SNMP session ready");

        Ok(Self {
            session,
            target,
            defaults,
            max_repetitions: max_repetitions.max(1),
        })
    }

    /// Один GETBULK с таймаутом и повторами
    async fn request(
        &mut self,
        oids: &[Oid<'static>],
        options: &PollOptions,
    ) -> std::result::Result<BulkResponse, String> {
        let refs: Vec<&Oid<'_>> = oids.iter().collect();
        let max_repetitions = match options.max_rows {
            Some(rows) => u32::try_from(rows).unwrap_or(u32::MAX).clamp(1, self.max_repetitions),
            None => self.max_repetitions,
        };
        let mut last_error = TIMEOUT_INDICATION.to_string();

        for attempt in 0..=options.retries {
            match timeout(
                options.timeout,
                self.session.getbulk(&refs, 0, max_repetitions),
            )
            .await
            {
                Ok(Ok(pdu)) => {
                    let error_status = pdu.error_status;
                    let error_index = pdu.error_index;
                    let varbinds = pdu
                        .varbinds
                        .into_iter()
                        .map(|(oid, value)| (oid.to_owned(), VarValue::from(&value)))
                        .collect();

                    return Ok(BulkResponse {
                        error_status,
                        error_index,
                        varbinds,
                    });
                }
                Ok(Err(e)) => last_error = e.to_string(),
                Err(_) => last_error = TIMEOUT_INDICATION.to_string(),
            }

            warn!(device = %self.target, attempt, error = %last_error, "GETBULK failed");
        }

        Err(last_error)
    }

    /// Синхронный обход колонок: каждая строка ответа содержит по одной привязке на колонку
    async fn walk(
        &mut self,
        columns: &[Oid<'static>],
        roots: &[String],
        options: &PollOptions,
    ) -> Vec<ResponseEnvelope> {
        let width = columns.len();
        let mut envelopes = Vec::new();
        let mut current: Vec<Oid<'static>> = columns.to_vec();
        let mut last: Option<String> = None;
        let max_rows = options.max_rows.unwrap_or(MAX_WALK_ROWS);

        loop {
            let response = match self.request(&current, options).await {
                Ok(response) => response,
                Err(indication) => {
                    envelopes.push(ResponseEnvelope::indication(indication));
                    return envelopes;
                }
            };

            if response.error_status != 0 {
                envelopes.push(ResponseEnvelope {
                    error_indication: None,
                    error_status: ErrorStatus(response.error_status),
                    error_index: response.error_index,
                    var_binds: response
                        .varbinds
                        .into_iter()
                        .map(|(oid, value)| VarBind::new(oid.to_string(), value))
                        .collect(),
                });
                return envelopes;
            }

            let mut rows_in_response = 0;
            let mut next = None;
            for chunk in response.varbinds.chunks(width) {
                if chunk.len() < width {
                    break;
                }

                let row: Vec<VarBind> = chunk
                    .iter()
                    .map(|(oid, value)| VarBind::new(oid.to_string(), value.clone()))
                    .collect();

                // Конец таблицы определяется по первой колонке
                if row[0].value.is_end_of_walk() || !is_under(&row[0].oid, &roots[0]) {
                    return envelopes;
                }

                // Агент обязан возвращать строго возрастающие OID
                if let Some(previous) = &last {
                    if compare_oids(&row[0].oid, previous) != Ordering::Greater {
                        warn!(device = %self.target, oid = %row[0].oid, previous = %previous, "OID not increasing");
                        envelopes.push(ResponseEnvelope::indication(format!(
                            "OID not increasing: {} after {}",
                            row[0].oid, previous
                        )));
                        return envelopes;
                    }
                }
                last = Some(row[0].oid.clone());

                next = Some(chunk.iter().map(|(oid, _)| oid.clone()).collect());
                envelopes.push(ResponseEnvelope::row(row));
                rows_in_response += 1;

                if envelopes.len() >= max_rows {
                    if options.max_rows.is_none() {
                        warn!(device = %self.target, rows = max_rows, "walk row limit reached");
                    }
                    return envelopes;
                }
            }

            match next {
                Some(oids) if rows_in_response > 0 => current = oids,
                _ => return envelopes,
            }
        }
    }
}

#[async_trait]
impl Transport for SnmpTransport {
    fn target(&self) -> &str {
        &self.target
    }

    async fn bulk_poll(
        &mut self,
        oids: &[&str],
        options: Option<PollOptions>,
    ) -> Result<Vec<ResponseEnvelope>> {
        if oids.is_empty() {
            return Ok(Vec::new());
        }

        let options = options.unwrap_or_else(|| self.defaults.clone());
        let columns = oids
            .iter()
            .map(|oid| parse_oid(oid))
            .collect::<Result<Vec<_>>>()?;
        let roots: Vec<String> = columns.iter().map(|oid| oid.to_string()).collect();

        debug!(device = %self.target, columns = oids.len(), timeout = ?options.timeout, retries = options.retries, "bulk poll");
        let envelopes = self.walk(&columns, &roots, &options).await;
        debug!(device = %self.target, rows = envelopes.len(), "bulk poll finished");

        Ok(envelopes)
    }
}
