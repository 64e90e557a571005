use serde::{Deserialize, Serialize};
use snmp2::v3::{AuthProtocol, Cipher};

use crate::connector::ConnectorKind;

/// Базовые настройки приложения
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Опрашиваемое устройство
    pub device: DeviceSettings,
    /// Вариант коннектора
    pub connector: ConnectorKind,
    /// Настройки подключения
    pub connection: ConnectionSettings,
    /// Настройки аутентификации
    pub auth: AuthSettings,
    /// HTTP сервер
    pub server: ServerSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Таймаут для SNMP операций (секунды)
    pub timeout: u64,
    /// Количество повторов при ошибках
    pub retries: u32,
    /// max-repetitions для GETBULK
    pub max_repetitions: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnmpVersion {
    #[default]
    V2c,
    V3,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub version: SnmpVersion,
    /// Настройки SNMPv2c
    pub v2c: SnmpV2cSettings,
    /// Настройки SNMPv3
    pub v3: SnmpV3Settings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnmpV2cSettings {
    /// Community string
    pub community: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnmpV3Settings {
    /// Имя пользователя
    pub username: String,
    /// Пароль аутентификации; пустой — noAuthNoPriv
    pub auth_password: String,
    /// Пароль шифрования; пустой — authNoPriv
    pub privacy_password: String,
    pub auth_protocol: AuthProtocolName,
    pub cipher: CipherName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProtocolName {
    Md5,
    #[default]
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CipherName {
    Des,
    #[default]
    Aes128,
    Aes192,
    Aes256,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub listen: String,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 161,
        }
    }
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            timeout: 10,
            retries: 2,
            max_repetitions: 10,
        }
    }
}

impl Default for SnmpV2cSettings {
    fn default() -> Self {
        Self {
            community: "public".to_string(),
        }
    }
}

impl Default for SnmpV3Settings {
    fn default() -> Self {
        Self {
            username: String::new(),
            auth_password: String::new(),
            privacy_password: String::new(),
            auth_protocol: AuthProtocolName::default(),
            cipher: CipherName::default(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:3000".to_string(),
        }
    }
}

impl Settings {
    /// Протокол аутентификации SNMPv3
    pub fn get_auth_protocol(&self) -> AuthProtocol {
        match self.auth.v3.auth_protocol {
            AuthProtocolName::Md5 => AuthProtocol::Md5,
            AuthProtocolName::Sha1 => AuthProtocol::Sha1,
            AuthProtocolName::Sha224 => AuthProtocol::Sha224,
            AuthProtocolName::Sha256 => AuthProtocol::Sha256,
            AuthProtocolName::Sha384 => AuthProtocol::Sha384,
            AuthProtocolName::Sha512 => AuthProtocol::Sha512,
        }
    }

    /// Протокол шифрования SNMPv3
    pub fn get_privacy_protocol(&self) -> Cipher {
        match self.auth.v3.cipher {
            CipherName::Des => Cipher::Des,
            CipherName::Aes128 => Cipher::Aes128,
            CipherName::Aes192 => Cipher::Aes192,
            CipherName::Aes256 => Cipher::Aes256,
        }
    }
}
