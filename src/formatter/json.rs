use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::connector::{DeviceReport, MetricAccumulator, MetricsReport, PropertyRecord, reduce_average};

/// JSON структура отчета об опросе устройства
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceReportJson {
    pub connector: String,
    pub target: String,
    pub timestamp: String,
    pub status: String, // "success" | "partial" | "error"
    pub summary: ReportSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<PropertyRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricsReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_metrics: Option<MetricAccumulator>,
    pub errors: Vec<ErrorInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub property_count: usize,
    /// Число записей по каждой корзине метрик
    pub metric_counts: BTreeMap<String, usize>,
    pub average_cpu_load: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub section: String, // "properties" | "metrics" | "port_metrics"
    pub error_message: String,
    pub timeout: bool,
}

/// JSON форматтер для результатов опроса
pub struct JsonFormatter;

impl JsonFormatter {
    /// Конвертирует отчет в JSON структуру
    pub fn format_report(report: &DeviceReport) -> DeviceReportJson {
        let timestamp = chrono::Utc::now().to_rfc3339();

        let has_data = report.properties.is_some() || report.metrics.is_some() || report.port_metrics.is_some();
        let status = match (has_data, report.errors.is_empty()) {
            (_, true) => "success",
            (true, false) => "partial",
            (false, false) => "error",
        };

        DeviceReportJson {
            connector: report.connector.clone(),
            target: report.target.clone(),
            timestamp,
            status: status.to_string(),
            summary: Self::summarize(report),
            properties: report.properties.clone(),
            metrics: report.metrics.clone(),
            port_metrics: report.port_metrics.clone(),
            errors: Self::extract_errors(report),
        }
    }

    fn summarize(report: &DeviceReport) -> ReportSummary {
        let mut metric_counts = BTreeMap::new();
        let mut average_cpu_load = None;

        if let Some(metrics) = &report.metrics {
            metric_counts.insert("cpu_utilisation".to_string(), metrics.cpu_utilisation.len());
            metric_counts.insert("memory_utilisation".to_string(), metrics.memory_utilisation.len());
            metric_counts.insert("disk_utilisation".to_string(), metrics.disk_utilisation.len());
            average_cpu_load = reduce_average(&metrics.cpu_utilisation);
        }

        if let Some(ports) = &report.port_metrics {
            for (bucket, records) in ports.buckets() {
                metric_counts.insert(bucket.to_string(), records.len());
            }
        }

        ReportSummary {
            property_count: report.properties.as_ref().map_or(0, |p| p.len()),
            metric_counts,
            average_cpu_load,
        }
    }

    /// Извлекает ошибки из отчета
    fn extract_errors(report: &DeviceReport) -> Vec<ErrorInfo> {
        report
            .errors
            .iter()
            .map(|e| ErrorInfo {
                section: e.section.clone(),
                error_message: e.message.clone(),
                timeout: e.message.to_lowercase().contains("timeout"),
            })
            .collect()
    }

    /// Сериализует отчет в JSON строку
    pub fn to_json_string(report: &DeviceReport) -> anyhow::Result<String> {
        let json_report = Self::format_report(report);
        serde_json::to_string_pretty(&json_report)
            .map_err(|e| anyhow::anyhow!("Ошибка сериализации в JSON: {}", e))
    }

    /// Сериализует отчет в компактный JSON
    pub fn to_json_compact(report: &DeviceReport) -> anyhow::Result<String> {
        let json_report = Self::format_report(report);
        serde_json::to_string(&json_report)
            .map_err(|e| anyhow::anyhow!("Ошибка сериализации в JSON: {}", e))
    }
}
