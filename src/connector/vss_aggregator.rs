use async_trait::async_trait;
use tracing::{Instrument, Span, info, info_span, warn};

use super::Connector;
use super::processing::{MetricExtractor, process_metrics, require_columns};
use super::properties::{PropertyField, poll_property_catalog};
use super::types::{MetricAccumulator, MetricRecord, MetricsReport, PropertyRecord};
use crate::error::Result;
use crate::snmp::{Transport, VarBind, split_oid_index};

/// Enterprise-номер VSS Monitoring
pub const VSS_ENTERPRISE_PREFIX: &str = "1.3.6.1.4.1.21671.";

/// Свойства из VSSM-SMI-MIB
pub const VSS_PROPERTIES: &[PropertyField] = &[
    PropertyField::text("1.3.6.1.4.1.21671.4.1.1", "productID"),
    PropertyField::text("1.3.6.1.4.1.21671.4.1.2", "productVersion"),
    PropertyField::text("1.3.6.1.4.1.21671.4.2.1", "numberOfPorts"),
    PropertyField::text("1.3.6.1.4.1.21671.4.2.2", "chassisTemperature"),
    PropertyField::text("1.3.6.1.4.1.21671.4.2.3", "coreTemperature"),
    PropertyField::text("1.3.6.1.4.1.21671.4.2.4", "numberOfPowerSupplies"),
];

const NETWORK_ACTIVITY_COLUMNS: &[&str] = &[
    "1.3.6.1.4.1.21671.4.6.1.1.2",  // naPortID
    "1.3.6.1.4.1.21671.4.6.1.1.3",  // naRxThroughput
    "1.3.6.1.4.1.21671.4.6.1.1.4",  // naTxThroughput
    "1.3.6.1.4.1.21671.4.6.1.1.5",  // naPeakRxThroughput
    "1.3.6.1.4.1.21671.4.6.1.1.6",  // naPeakTxThroughput
    "1.3.6.1.4.1.21671.4.6.1.1.7",  // naRxUtilization
    "1.3.6.1.4.1.21671.4.6.1.1.8",  // naTxUtilization
    "1.3.6.1.4.1.21671.4.6.1.1.11", // naGoodPacketsRx
    "1.3.6.1.4.1.21671.4.6.1.1.12", // naGoodPacketsTx
    "1.3.6.1.4.1.21671.4.6.1.1.13", // naBadPacketsRx
    "1.3.6.1.4.1.21671.4.6.1.1.14", // naBadPacketsTx
    "1.3.6.1.4.1.21671.4.6.1.1.19", // naUnicastsRx
    "1.3.6.1.4.1.21671.4.6.1.1.20", // naUnicastsTx
    "1.3.6.1.4.1.21671.4.6.1.1.21", // naOverflowDropsRx
    "1.3.6.1.4.1.21671.4.6.1.1.22", // naOverflowDropsTx
];

/// Позиция колонки -> корзина
const NETWORK_ACTIVITY_BUCKETS: &[(usize, &str)] = &[
    (1, "rx_throughput"),
    (2, "tx_throughput"),
    (5, "rx_utilisation"),
    (6, "tx_utilisation"),
    (9, "bad_packets_rx"),
    (10, "bad_packets_tx"),
];

/// Таблица сетевой активности, по строке на порт
pub struct NetworkActivityExtractor;

impl MetricExtractor for NetworkActivityExtractor {
    fn columns(&self) -> &[&'static str] {
        NETWORK_ACTIVITY_COLUMNS
    }

    fn extract(&self, var_binds: &[VarBind], metrics: &mut MetricAccumulator) -> Result<()> {
        require_columns(var_binds, NETWORK_ACTIVITY_COLUMNS.len())?;
        let port = var_binds[0].value.to_string();

        for &(column, bucket) in NETWORK_ACTIVITY_BUCKETS {
            let record = MetricRecord::absolute(var_binds[column].as_f64()?).with_dimension("Port", port.clone());
            metrics.push(bucket, record);
        }
        Ok(())
    }
}

const PORT_STATUS_COLUMNS: &[&str] = &[
    "1.3.6.1.4.1.21671.4.3.1.1.2", // portID
    "1.3.6.1.4.1.21671.4.3.1.1.3", // portName
    "1.3.6.1.4.1.21671.4.3.1.1.4", // portClass
    "1.3.6.1.4.1.21671.4.3.1.1.5", // portState
    "1.3.6.1.4.1.21671.4.3.1.1.6", // portSpeed
    "1.3.6.1.4.1.21671.4.3.1.1.7", // portDuplex
    "1.3.6.1.4.1.21671.4.3.1.1.8", // portError
];

/// Таблица состояния портов
pub struct PortStatusExtractor;

impl MetricExtractor for PortStatusExtractor {
    fn columns(&self) -> &[&'static str] {
        PORT_STATUS_COLUMNS
    }

    fn extract(&self, var_binds: &[VarBind], metrics: &mut MetricAccumulator) -> Result<()> {
        require_columns(var_binds, PORT_STATUS_COLUMNS.len())?;

        let port = var_binds[0].value.to_string();
        let name = var_binds[1].value.to_string();
        let index = split_oid_index(&var_binds[0].oid, PORT_STATUS_COLUMNS[0]);

        let record = |value: f64| {
            MetricRecord::absolute(value)
                .with_dimension("Port", port.clone())
                .with_dimension("Name", name.clone())
                .with_dimension("Index", index.clone())
        };

        metrics.push("port_state", record(var_binds[3].as_f64()?));
        metrics.push("port_speed", record(var_binds[4].as_f64()?));
        metrics.push("port_errors", record(var_binds[6].as_f64()?));
        Ok(())
    }
}

/// Коннектор для агрегаторов VSS Monitoring (VSSM-SMI-MIB)
pub struct VssAggregatorMib<T> {
    transport: T,
    span: Span,
}

impl<T: Transport> VssAggregatorMib<T> {
    pub fn new(transport: T) -> Self {
        let span = info_span!("connector", kind = "vss-aggregator", device = %transport.target());
        Self::with_span(transport, span)
    }

    pub fn with_span(transport: T, span: Span) -> Self {
        Self { transport, span }
    }

    async fn walk<E: MetricExtractor>(&mut self, extractor: &E) -> Result<MetricAccumulator> {
        let envelopes = self.transport.bulk_poll(extractor.columns(), None).await?;
        process_metrics(&envelopes, extractor)
    }

    /// Пропускная способность, утилизация и ошибки по портам
    pub async fn poll_network_activity(&mut self) -> Result<MetricAccumulator> {
        let span = self.span.clone();
        self.walk(&NetworkActivityExtractor).instrument(span).await
    }

    /// Состояние, скорость и счетчик ошибок по портам
    pub async fn poll_port_status(&mut self) -> Result<MetricAccumulator> {
        let span = self.span.clone();
        self.walk(&PortStatusExtractor).instrument(span).await
    }

    async fn collect_properties(&mut self) -> Result<PropertyRecord> {
        let props = poll_property_catalog(&mut self.transport, VSS_PROPERTIES).await?;
        info!(fields = props.len(), "properties polled");
        Ok(props)
    }
}

#[async_trait]
impl<T: Transport> Connector for VssAggregatorMib<T> {
    fn kind(&self) -> &'static str {
        "vss-aggregator"
    }

    fn target(&self) -> &str {
        self.transport.target()
    }

    async fn poll_properties(&mut self) -> Result<PropertyRecord> {
        let span = self.span.clone();
        self.collect_properties().instrument(span).await
    }

    /// В VSSM-SMI-MIB нет колонок CPU и хранилища: отчет всегда пустой,
    /// метрики портов отдает poll_port_metrics
    async fn poll_metrics(&mut self) -> Result<MetricsReport> {
        self.span.in_scope(|| warn!("vendor MIB has no cpu/memory/disk columns"));
        Ok(MetricsReport::default())
    }

    async fn poll_port_metrics(&mut self) -> Result<MetricAccumulator> {
        let mut metrics = self.poll_network_activity().await?;
        metrics.extend(self.poll_port_status().await?);
        self.span
            .in_scope(|| info!(ports = metrics.get("port_state").len(), "port metrics polled"));
        Ok(metrics)
    }
}
