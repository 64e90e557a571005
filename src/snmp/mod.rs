use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

pub mod envelope;
pub mod oid;
pub mod session;
#[cfg(test)]
pub mod testing;

pub use envelope::{ErrorStatus, ResponseEnvelope, VarBind, VarValue};
pub use oid::{compare_oids, is_under, normalize_oid, parse_oid, split_oid_index};
pub use session::{Authentication, Device, SnmpTransport};

pub use snmp2::v3::{AuthProtocol, Cipher};

/// Параметры одного bulk-запроса
#[derive(Debug, Clone, PartialEq)]
pub struct PollOptions {
    pub timeout: Duration,
    pub retries: u32,
    /// Ограничение на число строк обхода; None — до конца таблицы
    pub max_rows: Option<usize>,
}

impl PollOptions {
    pub fn new(timeout: Duration, retries: u32) -> Self {
        Self {
            timeout,
            retries,
            max_rows: None,
        }
    }

    pub fn first_row(mut self) -> Self {
        self.max_rows = Some(1);
        self
    }
}

impl Default for PollOptions {
    fn default() -> Self {
        Self::new(Duration::from_secs(10), 2)
    }
}

/// Транспорт, выполняющий bulk-опрос списка OID.
///
/// Возвращает по одному конверту на каждую строку обхода. Колонки опрашиваются
/// синхронно, поэтому привязки в строке идут в порядке `oids`.
/// Ошибки транспорта и агента приходят внутри конверта, а не как `Err`:
/// `Err` означает локальную ошибку (невалидный OID).
#[async_trait]
pub trait Transport: Send {
    /// Адрес опрашиваемого устройства, для логов
    fn target(&self) -> &str;

    async fn bulk_poll(
        &mut self,
        oids: &[&str],
        options: Option<PollOptions>,
    ) -> Result<Vec<ResponseEnvelope>>;
}
