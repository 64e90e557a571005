use async_trait::async_trait;
use tracing::{Instrument, Span, info, info_span};

use super::Connector;
use super::processing::{MetricExtractor, ProcessorLoadExtractor, StorageExtractor, process_metrics};
use super::properties::{PropertyField, poll_property_catalog};
use super::types::{MetricAccumulator, MetricsReport, PropertyRecord};
use crate::error::Result;
use crate::snmp::Transport;

/// Группа system из SNMPv2-MIB
pub const SYSTEM_PROPERTIES: &[PropertyField] = &[
    PropertyField::text("1.3.6.1.2.1.1.1", "sysDescr"),
    PropertyField::text("1.3.6.1.2.1.1.2", "sysObjectID"),
    PropertyField::ticks("1.3.6.1.2.1.1.3", "sysUpTime"),
    PropertyField::text("1.3.6.1.2.1.1.4", "sysContact"),
    PropertyField::text("1.3.6.1.2.1.1.5", "sysName"),
    PropertyField::text("1.3.6.1.2.1.1.6", "sysLocation"),
    PropertyField::text("1.3.6.1.2.1.1.7", "sysServices"),
    PropertyField::ticks("1.3.6.1.2.1.1.8", "sysORLastChange"),
];

/// Коннектор для агентов с SNMPv2-MIB и HOST-RESOURCES-MIB
pub struct HostResourcesMib<T> {
    transport: T,
    span: Span,
}

impl<T: Transport> HostResourcesMib<T> {
    pub fn new(transport: T) -> Self {
        let span = info_span!("connector", kind = "host-resources", device = %transport.target());
        Self::with_span(transport, span)
    }

    pub fn with_span(transport: T, span: Span) -> Self {
        Self { transport, span }
    }

    async fn walk<E: MetricExtractor>(&mut self, extractor: &E) -> Result<MetricAccumulator> {
        let envelopes = self.transport.bulk_poll(extractor.columns(), None).await?;
        process_metrics(&envelopes, extractor)
    }

    async fn poll_cpu(&mut self) -> Result<MetricAccumulator> {
        self.walk(&ProcessorLoadExtractor).await
    }

    async fn poll_storage(&mut self) -> Result<MetricAccumulator> {
        self.walk(&StorageExtractor).await
    }

    async fn collect_properties(&mut self) -> Result<PropertyRecord> {
        let props = poll_property_catalog(&mut self.transport, SYSTEM_PROPERTIES).await?;
        info!(fields = props.len(), "properties polled");
        Ok(props)
    }

    async fn collect_metrics(&mut self) -> Result<MetricsReport> {
        let mut cpu = self.poll_cpu().await?;
        let mut storage = self.poll_storage().await?;

        let report = MetricsReport {
            cpu_utilisation: cpu.take("cpu"),
            memory_utilisation: storage.take("memory"),
            disk_utilisation: storage.take("disk"),
        };
        info!(
            cpu = report.cpu_utilisation.len(),
            memory = report.memory_utilisation.len(),
            disk = report.disk_utilisation.len(),
            "metrics polled"
        );
        Ok(report)
    }
}

#[async_trait]
impl<T: Transport> Connector for HostResourcesMib<T> {
    fn kind(&self) -> &'static str {
        "host-resources"
    }

    fn target(&self) -> &str {
        self.transport.target()
    }

    async fn poll_properties(&mut self) -> Result<PropertyRecord> {
        let span = self.span.clone();
        self.collect_properties().instrument(span).await
    }

    async fn poll_metrics(&mut self) -> Result<MetricsReport> {
        let span = self.span.clone();
        self.collect_metrics().instrument(span).await
    }
}
