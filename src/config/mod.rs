use std::env;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

pub mod settings;

pub use settings::{Settings, SnmpVersion};

use crate::connector::ConnectorKind;
use crate::snmp::{Authentication, Device, PollOptions};

/// Главная конфигурация приложения
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub settings: Settings,
}

impl AppConfig {
    /// Загружает конфигурацию из YAML файла; без файла — настройки по умолчанию
    pub fn load(path: Option<impl AsRef<Path>>) -> Result<Self> {
        let settings = match path {
            Some(path) => {
                let path = path.as_ref();
                let content = std::fs::read_to_string(path)
                    .context(format!("Не удалось прочитать файл: {}", path.display()))?;
                Self::parse(&content)?
            }
            None => Settings::default(),
        };

        Ok(Self { settings })
    }

    pub fn parse(content: &str) -> Result<Settings> {
        if content.trim().is_empty() {
            return Ok(Settings::default());
        }
        serde_yml::from_str(content).context("Не удалось распарсить YAML")
    }

    /// Получает target из переменной окружения или из настроек
    pub fn get_target(&self) -> Device {
        match env::var("SNMP_TARGET") {
            Ok(target) => Device::parse(&target),
            Err(_) => Device::new(&self.settings.device.host, self.settings.device.port),
        }
    }

    /// Получает timeout из переменной окружения или из настроек
    pub fn get_timeout(&self) -> u64 {
        env_parse("SNMP_TIMEOUT").unwrap_or(self.settings.connection.timeout)
    }

    pub fn get_retries(&self) -> u32 {
        env_parse("SNMP_RETRIES").unwrap_or(self.settings.connection.retries)
    }

    pub fn get_version(&self) -> SnmpVersion {
        match env::var("SNMP_VERSION").map(|v| v.to_lowercase()) {
            Ok(v) if v == "v3" || v == "3" => SnmpVersion::V3,
            Ok(v) if v == "v2c" || v == "2c" || v == "2" => SnmpVersion::V2c,
            _ => self.settings.auth.version,
        }
    }

    pub fn get_connector(&self) -> ConnectorKind {
        env::var("SNMP_CONNECTOR")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(self.settings.connector)
    }

    /// Получает community для SNMPv2c
    pub fn get_community(&self) -> Vec<u8> {
        env::var("SNMP_COMMUNITY")
            .unwrap_or_else(|_| self.settings.auth.v2c.community.clone())
            .into_bytes()
    }

    /// Получает username для SNMPv3
    pub fn get_username(&self) -> Vec<u8> {
        env::var("SNMP_USERNAME")
            .unwrap_or_else(|_| self.settings.auth.v3.username.clone())
            .into_bytes()
    }

    /// Получает auth password для SNMPv3
    pub fn get_auth_password(&self) -> Vec<u8> {
        env::var("SNMP_AUTH_PASSWORD")
            .unwrap_or_else(|_| self.settings.auth.v3.auth_password.clone())
            .into_bytes()
    }

    /// Получает privacy password для SNMPv3
    pub fn get_privacy_password(&self) -> Vec<u8> {
        env::var("SNMP_PRIVACY_PASSWORD")
            .unwrap_or_else(|_| self.settings.auth.v3.privacy_password.clone())
            .into_bytes()
    }

    /// Параметры аутентификации для выбранной версии SNMP
    pub fn authentication(&self) -> Authentication {
        match self.get_version() {
            SnmpVersion::V2c => Authentication::V2c {
                community: self.get_community(),
            },
            SnmpVersion::V3 => {
                let privacy_password = self.get_privacy_password();
                Authentication::V3 {
                    username: self.get_username(),
                    auth_password: self.get_auth_password(),
                    auth_protocol: self.settings.get_auth_protocol(),
                    privacy: (!privacy_password.is_empty())
                        .then(|| (self.settings.get_privacy_protocol(), privacy_password)),
                }
            }
        }
    }

    /// Таймаут и повторы транспорта по умолчанию
    pub fn poll_options(&self) -> PollOptions {
        PollOptions::new(Duration::from_secs(self.get_timeout()), self.get_retries())
    }

    pub fn max_repetitions(&self) -> u32 {
        self.settings.connection.max_repetitions
    }

    pub fn debug_config(&self) {
        info!(
            target_device = %self.get_target(),
            version = ?self.get_version(),
            connector = %self.get_connector(),
            timeout = self.get_timeout(),
            retries = self.get_retries(),
            "configuration loaded"
        );
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|s| s.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::{AuthProtocolName, CipherName};

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.connection.timeout, 10);
        assert_eq!(settings.connection.retries, 2);
        assert_eq!(settings.auth.v2c.community, "public");
        assert_eq!(settings.connector, ConnectorKind::Auto);
        assert_eq!(settings.server.listen, "0.0.0.0:3000");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let settings = AppConfig::parse(
            r#"
device:
  host: 10.20.0.7
connector: vss-aggregator
auth:
  version: v3
  v3:
    username: monitor
    auth_password: authpass
    auth_protocol: sha256
"#,
        )
        .unwrap();

        assert_eq!(settings.device.host, "10.20.0.7");
        assert_eq!(settings.device.port, 161);
        assert_eq!(settings.connector, ConnectorKind::VssAggregator);
        assert_eq!(settings.auth.version, SnmpVersion::V3);
        assert_eq!(settings.auth.v3.auth_protocol, AuthProtocolName::Sha256);
        assert_eq!(settings.auth.v3.cipher, CipherName::Aes128);
        assert_eq!(settings.connection.max_repetitions, 10);
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(AppConfig::parse("connector: [oops").is_err());
        assert!(AppConfig::parse("connector: cisco").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("poller.yaml");
        std::fs::write(&path, "connection:\n  timeout: 4\n  retries: 0\n").unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.settings.connection.timeout, 4);
        assert_eq!(config.settings.connection.retries, 0);

        let missing = AppConfig::load(Some(dir.path().join("missing.yaml")));
        assert!(missing.is_err());
        assert!(AppConfig::load(None::<&Path>).is_ok());
    }
}
