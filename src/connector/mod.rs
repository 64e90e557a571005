use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::snmp::Transport;

pub mod detect;
pub mod host_resources;
pub mod processing;
pub mod properties;
pub mod types;
pub mod vss_aggregator;

pub use detect::{ConnectorKind, detect_connector_kind, get_sys_object_id};
pub use host_resources::HostResourcesMib;
pub use processing::{MetricExtractor, format_ticks, process_metrics, reduce_average};
pub use properties::{FieldTransform, PropertyField};
pub use types::{DeviceReport, MetricAccumulator, MetricRecord, MetricsReport, PropertyRecord, SectionError};
pub use vss_aggregator::VssAggregatorMib;

/// Общий интерфейс коннекторов MIB
#[async_trait]
pub trait Connector: Send {
    fn kind(&self) -> &'static str;

    fn target(&self) -> &str;

    async fn poll_properties(&mut self) -> Result<PropertyRecord>;

    async fn poll_metrics(&mut self) -> Result<MetricsReport>;

    /// Метрики по портам; по умолчанию их нет
    async fn poll_port_metrics(&mut self) -> Result<MetricAccumulator> {
        Ok(MetricAccumulator::new())
    }
}

/// Создает коннектор нужного варианта; `Auto` определяется по sysObjectID
pub async fn build_connector<T: Transport + 'static>(
    kind: ConnectorKind,
    mut transport: T,
) -> Box<dyn Connector> {
    let kind = match kind {
        ConnectorKind::Auto => detect_connector_kind(&mut transport).await,
        kind => kind,
    };

    match kind {
        ConnectorKind::VssAggregator => Box::new(VssAggregatorMib::new(transport)),
        _ => Box::new(HostResourcesMib::new(transport)),
    }
}

/// Какие разделы опрашивать
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollScope {
    #[default]
    All,
    Properties,
    Metrics,
}

impl PollScope {
    pub fn properties(&self) -> bool {
        matches!(self, PollScope::All | PollScope::Properties)
    }

    pub fn metrics(&self) -> bool {
        matches!(self, PollScope::All | PollScope::Metrics)
    }
}

impl fmt::Display for PollScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PollScope::All => "all",
            PollScope::Properties => "properties",
            PollScope::Metrics => "metrics",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for PollScope {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(PollScope::All),
            "properties" => Ok(PollScope::Properties),
            "metrics" => Ok(PollScope::Metrics),
            other => Err(format!("Неизвестный раздел опроса: {}", other)),
        }
    }
}

/// Собирает все разделы с устройства. Ошибка одного раздела не мешает другому.
pub async fn collect_report(connector: &mut dyn Connector, scope: PollScope) -> DeviceReport {
    let mut errors = Vec::new();
    let target = connector.target().to_string();

    let properties = if scope.properties() {
        keep_section("properties", connector.poll_properties().await, &target, &mut errors)
    } else {
        None
    };

    let (metrics, port_metrics) = if scope.metrics() {
        let metrics = keep_section("metrics", connector.poll_metrics().await, &target, &mut errors);
        let port_metrics = keep_section("port_metrics", connector.poll_port_metrics().await, &target, &mut errors)
            .filter(|ports| !ports.is_empty());
        (metrics, port_metrics)
    } else {
        (None, None)
    };

    DeviceReport {
        connector: connector.kind().to_string(),
        target,
        properties,
        metrics,
        port_metrics,
        errors,
    }
}

fn keep_section<T>(section: &str, result: Result<T>, target: &str, errors: &mut Vec<SectionError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(device = %target, section, error = %e, "section poll failed");
            errors.push(SectionError {
                section: section.to_string(),
                message: e.to_string(),
            });
            None
        }
    }
}
