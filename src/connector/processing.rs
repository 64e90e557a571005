use tracing::debug;

use super::types::{MetricAccumulator, MetricRecord};
use crate::error::{PollError, Result};
use crate::snmp::{ResponseEnvelope, VarBind, split_oid_index};

/// Метки разделов hrStorage, которые относятся к памяти
pub const MEMORY_TYPES: &[&str] = &["memory", "swap space", "ram"];

const TICKS_PER_SECOND: u64 = 100;
const TICKS_PER_MINUTE: u64 = 60 * TICKS_PER_SECOND;
const TICKS_PER_HOUR: u64 = 60 * TICKS_PER_MINUTE;
const TICKS_PER_DAY: u64 = 24 * TICKS_PER_HOUR;

/// Стратегия извлечения метрик из одной строки обхода таблицы
pub trait MetricExtractor: Send + Sync {
    /// Колонки таблицы в порядке, в котором они приходят в строке
    fn columns(&self) -> &[&'static str];

    fn extract(&self, var_binds: &[VarBind], metrics: &mut MetricAccumulator) -> Result<()>;
}

/// Прогоняет все конверты через экстрактор. Первая ошибка прерывает обработку.
pub fn process_metrics<E: MetricExtractor + ?Sized>(
    envelopes: &[ResponseEnvelope],
    extractor: &E,
) -> Result<MetricAccumulator> {
    let mut metrics = MetricAccumulator::new();

    for envelope in envelopes {
        envelope.check()?;
        extractor.extract(&envelope.var_binds, &mut metrics)?;
    }

    debug!(rows = envelopes.len(), "metrics processed");
    Ok(metrics)
}

/// Проверяет, что в строке есть все колонки экстрактора
pub fn require_columns(var_binds: &[VarBind], expected: usize) -> Result<()> {
    if var_binds.len() < expected {
        return Err(PollError::MalformedRow {
            expected,
            got: var_binds.len(),
        });
    }
    Ok(())
}

/// `used / size * 100`, 0 при нулевом размере (например, пустой swap)
pub fn utilisation(size: f64, used: f64) -> f64 {
    if size > 0.0 { used / size * 100.0 } else { 0.0 }
}

pub fn is_memory_label(label: &str) -> bool {
    let label = label.to_lowercase();
    MEMORY_TYPES.iter().any(|t| label.contains(t))
}

/// Среднее значение метрик; None для пустого набора
pub fn reduce_average(records: &[MetricRecord]) -> Option<f64> {
    if records.is_empty() {
        return None;
    }
    let total: f64 = records.iter().map(|r| r.value).sum();
    Some(total / records.len() as f64)
}

/// Сотые доли секунды в вид "N days, H:MM:SS.cc"
pub fn format_ticks(ticks: u64) -> String {
    let days = ticks / TICKS_PER_DAY;
    let rest = ticks % TICKS_PER_DAY;
    let hours = rest / TICKS_PER_HOUR;
    let minutes = rest % TICKS_PER_HOUR / TICKS_PER_MINUTE;
    let seconds = rest % TICKS_PER_MINUTE / TICKS_PER_SECOND;
    let hundredths = rest % TICKS_PER_SECOND;

    let clock = format!("{}:{:02}:{:02}.{:02}", hours, minutes, seconds, hundredths);
    match days {
        0 => clock,
        1 => format!("1 day, {}", clock),
        n => format!("{} days, {}", n, clock),
    }
}

const HR_PROCESSOR_LOAD: &str = "1.3.6.1.2.1.25.3.3.1.2";

/// hrProcessorLoad: одна колонка, индекс процессора в измерении `Index`
pub struct ProcessorLoadExtractor;

impl MetricExtractor for ProcessorLoadExtractor {
    fn columns(&self) -> &[&'static str] {
        &[HR_PROCESSOR_LOAD]
    }

    fn extract(&self, var_binds: &[VarBind], metrics: &mut MetricAccumulator) -> Result<()> {
        require_columns(var_binds, 1)?;
        let load = &var_binds[0];

        let record = MetricRecord::absolute(load.as_f64()?)
            .with_dimension("Index", split_oid_index(&load.oid, HR_PROCESSOR_LOAD));
        metrics.push("cpu", record);
        Ok(())
    }
}

const HR_STORAGE_COLUMNS: &[&str] = &[
    "1.3.6.1.2.1.25.2.3.1.3", // hrStorageDescr
    "1.3.6.1.2.1.25.2.3.1.5", // hrStorageSize
    "1.3.6.1.2.1.25.2.3.1.6", // hrStorageUsed
];

/// hrStorageTable: утилизация каждого раздела, память отдельно от дисков
pub struct StorageExtractor;

impl MetricExtractor for StorageExtractor {
    fn columns(&self) -> &[&'static str] {
        HR_STORAGE_COLUMNS
    }

    fn extract(&self, var_binds: &[VarBind], metrics: &mut MetricAccumulator) -> Result<()> {
        require_columns(var_binds, HR_STORAGE_COLUMNS.len())?;

        let label = var_binds[0].value.to_string();
        let size = var_binds[1].as_f64()?;
        let used = var_binds[2].as_f64()?;

        let bucket = if is_memory_label(&label) { "memory" } else { "disk" };
        let record = MetricRecord::absolute(utilisation(size, used)).with_dimension("Storage", label);
        metrics.push(bucket, record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snmp::testing::{text, vb};
    use crate::snmp::{ErrorStatus, VarValue};

    fn storage_row(index: u32, label: &str, size: u64, used: u64) -> ResponseEnvelope {
        ResponseEnvelope::row(vec![
            text(&format!("1.3.6.1.2.1.25.2.3.1.3.{}", index), label),
            vb(&format!("1.3.6.1.2.1.25.2.3.1.5.{}", index), VarValue::Integer(size as i64)),
            vb(&format!("1.3.6.1.2.1.25.2.3.1.6.{}", index), VarValue::Integer(used as i64)),
        ])
    }

    #[test]
    fn test_utilisation_guards_zero_size() {
        assert_eq!(utilisation(0.0, 0.0), 0.0);
        assert_eq!(utilisation(200.0, 50.0), 25.0);
    }

    #[test]
    fn test_memory_classification() {
        assert!(is_memory_label("Swap Space"));
        assert!(is_memory_label("Physical memory"));
        assert!(is_memory_label("Virtual RAM"));
        assert!(!is_memory_label("C:\\"));
        assert!(!is_memory_label("/dev/sda1"));
    }

    #[test]
    fn test_storage_rows_split_into_buckets() {
        let envelopes = vec![
            storage_row(1, "Physical memory", 200, 50),
            storage_row(3, "Swap Space", 0, 0),
            storage_row(31, "/dev/sda1", 1000, 250),
        ];

        let mut metrics = process_metrics(&envelopes, &StorageExtractor).unwrap();
        let memory = metrics.take("memory");
        let disk = metrics.take("disk");

        assert_eq!(memory.len(), 2);
        assert_eq!(memory[0].value, 25.0);
        assert_eq!(memory[1].value, 0.0);
        assert_eq!(memory[1].dimension["Storage"], "Swap Space");
        assert_eq!(disk.len(), 1);
        assert_eq!(disk[0].dimension["Storage"], "/dev/sda1");
        assert!(disk[0].is_absolute_number);
    }

    #[test]
    fn test_processor_load_keeps_index() {
        let envelopes = vec![
            ResponseEnvelope::row(vec![vb("1.3.6.1.2.1.25.3.3.1.2.196608", VarValue::Integer(12))]),
            ResponseEnvelope::row(vec![vb("1.3.6.1.2.1.25.3.3.1.2.196609", VarValue::Integer(30))]),
        ];

        let metrics = process_metrics(&envelopes, &ProcessorLoadExtractor).unwrap();
        let cpu = metrics.get("cpu");
        assert_eq!(cpu.len(), 2);
        assert_eq!(cpu[1].value, 30.0);
        assert_eq!(cpu[1].dimension["Index"], "196609");
        assert_eq!(reduce_average(cpu), Some(21.0));
    }

    #[test]
    fn test_error_row_aborts_processing() {
        let envelopes = vec![
            storage_row(1, "Physical memory", 200, 50),
            ResponseEnvelope {
                error_status: ErrorStatus(5),
                ..Default::default()
            },
            storage_row(31, "/dev/sda1", 1000, 250),
        ];

        let err = process_metrics(&envelopes, &StorageExtractor).unwrap_err();
        assert_eq!(err, PollError::Protocol { status: "genErr".into(), at: "?".into() });
    }

    #[test]
    fn test_non_numeric_size_propagates() {
        let envelopes = vec![ResponseEnvelope::row(vec![
            text("1.3.6.1.2.1.25.2.3.1.3.1", "Physical memory"),
            text("1.3.6.1.2.1.25.2.3.1.5.1", "lots"),
            vb("1.3.6.1.2.1.25.2.3.1.6.1", VarValue::Integer(1)),
        ])];

        assert!(matches!(
            process_metrics(&envelopes, &StorageExtractor),
            Err(PollError::ValueCoercion { .. })
        ));
    }

    #[test]
    fn test_format_ticks() {
        assert_eq!(format_ticks(0), "0:00:00.00");
        assert_eq!(format_ticks(12_345), "0:02:03.45");
        assert_eq!(format_ticks(3 * TICKS_PER_DAY + 4 * TICKS_PER_HOUR + 506), "3 days, 4:00:05.06");
        assert!(format_ticks(u64::MAX).ends_with(".15"));
        assert_eq!(reduce_average(&[]), None);
    }
}
