//! Опрос MIB сетевых устройств по SNMP.
//!
//! Коннектор привязан к транспорту (устройство + аутентификация), опрашивает
//! фиксированный каталог OID и превращает привязки в словарь свойств или в
//! метрики утилизации CPU, памяти и дисков.
//!
//! ```no_run
//! use mib_poller::connector::{Connector, HostResourcesMib};
//! use mib_poller::snmp::{Authentication, Device, PollOptions, SnmpTransport};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let device = Device::parse("10.0.0.5");
//! let auth = Authentication::V2c { community: b"public".to_vec() };
//! let transport = SnmpTransport::connect(&device, &auth, PollOptions::default(), 10).await?;
//!
//! let mut connector = HostResourcesMib::new(transport);
//! let properties = connector.poll_properties().await?;
//! let metrics = connector.poll_metrics().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connector;
pub mod error;
pub mod formatter;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod snmp;

pub use error::{PollError, Result};
