use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::properties::{PROPERTY_RETRIES, PROPERTY_TIMEOUT};
use super::vss_aggregator::VSS_ENTERPRISE_PREFIX;
use crate::error::{PollError, Result};
use crate::snmp::{PollOptions, Transport, VarValue};

const SYS_OBJECT_ID: &str = "1.3.6.1.2.1.1.2";

/// Вариант коннектора
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectorKind {
    /// Определить по sysObjectID
    #[default]
    Auto,
    HostResources,
    VssAggregator,
}

impl ConnectorKind {
    /// Определяет вариант по sysObjectID устройства
    pub fn from_sys_object_id(sys_object_id: &str) -> Self {
        let sys_object_id = crate::snmp::normalize_oid(sys_object_id);
        if sys_object_id.starts_with(VSS_ENTERPRISE_PREFIX) {
            ConnectorKind::VssAggregator
        } else {
            ConnectorKind::HostResources
        }
    }
}

impl fmt::Display for ConnectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectorKind::Auto => "auto",
            ConnectorKind::HostResources => "host-resources",
            ConnectorKind::VssAggregator => "vss-aggregator",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for ConnectorKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(ConnectorKind::Auto),
            "host-resources" | "generic" => Ok(ConnectorKind::HostResources),
            "vss-aggregator" | "vss" => Ok(ConnectorKind::VssAggregator),
            other => Err(format!("Неизвестный коннектор: {}", other)),
        }
    }
}

/// Получает sysObjectID устройства
pub async fn get_sys_object_id<T: Transport + ?Sized>(transport: &mut T) -> Result<String> {
    let options = PollOptions::new(PROPERTY_TIMEOUT, PROPERTY_RETRIES).first_row();
    let envelopes = transport.bulk_poll(&[SYS_OBJECT_ID], Some(options)).await?;

    let envelope = envelopes
        .into_iter()
        .next()
        .ok_or(PollError::MalformedRow { expected: 1, got: 0 })?;
    envelope.check()?;

    match envelope.var_binds.into_iter().next() {
        Some(vb) => match vb.value {
            VarValue::ObjectIdentifier(oid) => Ok(oid),
            other => Ok(other.to_string()),
        },
        None => Err(PollError::MalformedRow { expected: 1, got: 0 }),
    }
}

/// Определяет вариант коннектора; при ошибке возвращает host-resources
pub async fn detect_connector_kind<T: Transport + ?Sized>(transport: &mut T) -> ConnectorKind {
    match get_sys_object_id(transport).await {
        Ok(sys_object_id) => {
            let kind = ConnectorKind::from_sys_object_id(&sys_object_id);
            info!(device = %transport.target(), sys_object_id = %sys_object_id, kind = %kind, "connector detected");
            kind
        }
        Err(e) => {
            warn!(device = %transport.target(), error = %e, "sysObjectID unavailable, using host-resources");
            ConnectorKind::HostResources
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snmp::ResponseEnvelope;
    use crate::snmp::testing::{ScriptedTransport, vb};

    #[test]
    fn test_kind_from_sys_object_id() {
        assert_eq!(
            ConnectorKind::from_sys_object_id("1.3.6.1.4.1.21671.1.12"),
            ConnectorKind::VssAggregator
        );
        assert_eq!(
            ConnectorKind::from_sys_object_id("1.3.6.1.4.1.8072.3.2.10"),
            ConnectorKind::HostResources
        );
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("VSS-Aggregator".parse::<ConnectorKind>(), Ok(ConnectorKind::VssAggregator));
        assert_eq!("auto".parse::<ConnectorKind>(), Ok(ConnectorKind::Auto));
        assert!("cisco".parse::<ConnectorKind>().is_err());
        assert_eq!(ConnectorKind::HostResources.to_string(), "host-resources");
    }

    #[tokio::test]
    async fn test_detect_vendor() {
        let mut transport = ScriptedTransport::new().respond(vec![ResponseEnvelope::row(vec![vb(
            "1.3.6.1.2.1.1.2.0",
            VarValue::ObjectIdentifier("1.3.6.1.4.1.21671.1.12".into()),
        )])]);

        assert_eq!(detect_connector_kind(&mut transport).await, ConnectorKind::VssAggregator);
    }

    #[tokio::test]
    async fn test_detect_falls_back_on_timeout() {
        let mut transport = ScriptedTransport::new()
            .respond(vec![ResponseEnvelope::indication("No SNMP response received before timeout")]);

        assert_eq!(detect_connector_kind(&mut transport).await, ConnectorKind::HostResources);
    }
}
