use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Свойства устройства: имя поля -> значение
pub type PropertyRecord = BTreeMap<String, String>;

/// Одна метрика с измерениями (порт, раздел хранилища и т.п.)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub value: f64,
    pub dimension: BTreeMap<String, String>,
    pub is_absolute_number: bool,
}

impl MetricRecord {
    pub fn absolute(value: f64) -> Self {
        Self {
            value,
            dimension: BTreeMap::new(),
            is_absolute_number: true,
        }
    }

    pub fn with_dimension(mut self, name: &str, value: impl Into<String>) -> Self {
        self.dimension.insert(name.to_string(), value.into());
        self
    }
}

/// Накопитель метрик, сгруппированных по корзинам (`cpu`, `memory`, `disk`, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricAccumulator {
    buckets: BTreeMap<String, Vec<MetricRecord>>,
}

impl MetricAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bucket: &str, record: MetricRecord) {
        self.buckets
            .entry(bucket.to_string())
            .or_default()
            .push(record);
    }

    pub fn get(&self, bucket: &str) -> &[MetricRecord] {
        self.buckets.get(bucket).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Забирает корзину; пустой вектор, если она не заполнялась
    pub fn take(&mut self, bucket: &str) -> Vec<MetricRecord> {
        self.buckets.remove(bucket).unwrap_or_default()
    }

    /// Переносит все корзины другого накопителя
    pub fn extend(&mut self, other: MetricAccumulator) {
        for (bucket, records) in other.buckets {
            self.buckets.entry(bucket).or_default().extend(records);
        }
    }

    pub fn buckets(&self) -> impl Iterator<Item = (&str, &[MetricRecord])> {
        self.buckets.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Итог poll_metrics с фиксированным набором ключей
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub cpu_utilisation: Vec<MetricRecord>,
    pub memory_utilisation: Vec<MetricRecord>,
    pub disk_utilisation: Vec<MetricRecord>,
}

/// Полный результат опроса устройства
#[derive(Debug, Clone)]
pub struct DeviceReport {
    pub connector: String,
    pub target: String,
    pub properties: Option<PropertyRecord>,
    pub metrics: Option<MetricsReport>,
    /// Метрики портов; только у коннекторов, которые их поддерживают
    pub port_metrics: Option<MetricAccumulator>,
    pub errors: Vec<SectionError>,
}

/// Ошибка одного раздела опроса (свойства или метрики)
#[derive(Debug, Clone, PartialEq)]
pub struct SectionError {
    pub section: String,
    pub message: String,
}
