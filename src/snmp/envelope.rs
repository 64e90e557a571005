use std::fmt;

use snmp2::Value;

use crate::error::{PollError, Result};

/// Декодированное значение SNMP, не зависящее от буфера сессии
#[derive(Debug, Clone, PartialEq)]
pub enum VarValue {
    Integer(i64),
    Unsigned(u64),
    Timeticks(u32),
    OctetString(Vec<u8>),
    ObjectIdentifier(String),
    IpAddress([u8; 4]),
    Boolean(bool),
    Null,
    NoSuchObject,
    NoSuchInstance,
    EndOfMibView,
    Other(String),
}

impl VarValue {
    pub fn text(s: &str) -> Self {
        VarValue::OctetString(s.as_bytes().to_vec())
    }

    /// Числовое значение; октетные строки допускаются, если содержат число
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            VarValue::Integer(v) => Some(*v as f64),
            VarValue::Unsigned(v) => Some(*v as f64),
            VarValue::Timeticks(v) => Some(*v as f64),
            VarValue::OctetString(bytes) => std::str::from_utf8(bytes)
                .ok()
                .and_then(|s| s.trim().parse::<f64>().ok()),
            _ => None,
        }
    }

    /// Значение в сотых долях секунды, если его можно так трактовать
    pub fn as_ticks(&self) -> Option<u64> {
        match self {
            VarValue::Timeticks(v) => Some(u64::from(*v)),
            VarValue::Unsigned(v) => Some(*v),
            VarValue::Integer(v) => u64::try_from(*v).ok(),
            VarValue::OctetString(bytes) => std::str::from_utf8(bytes)
                .ok()
                .and_then(|s| s.trim().parse::<u64>().ok()),
            _ => None,
        }
    }

    pub fn is_end_of_walk(&self) -> bool {
        matches!(
            self,
            VarValue::EndOfMibView | VarValue::NoSuchObject | VarValue::NoSuchInstance
        )
    }
}

impl fmt::Display for VarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarValue::Integer(v) => write!(f, "{}", v),
            VarValue::Unsigned(v) => write!(f, "{}", v),
            VarValue::Timeticks(v) => write!(f, "{}", v),
            VarValue::OctetString(bytes) => match std::str::from_utf8(bytes) {
                Ok(s) if !s.chars().any(|c| c.is_control() && !c.is_whitespace()) => {
                    write!(f, "{}", s)
                }
                _ => {
                    write!(f, "0x")?;
                    for b in bytes {
                        write!(f, "{:02x}", b)?;
                    }
                    Ok(())
                }
            },
            VarValue::ObjectIdentifier(oid) => write!(f, "{}", oid),
            VarValue::IpAddress([a, b, c, d]) => write!(f, "{}.{}.{}.{}", a, b, c, d),
            VarValue::Boolean(v) => write!(f, "{}", v),
            VarValue::Null => Ok(()),
            VarValue::NoSuchObject => write!(f, "noSuchObject"),
            VarValue::NoSuchInstance => write!(f, "noSuchInstance"),
            VarValue::EndOfMibView => write!(f, "endOfMibView"),
            VarValue::Other(s) => write!(f, "{}", s),
        }
    }
}

impl From<&Value<'_>> for VarValue {
    fn from(value: &Value<'_>) -> Self {
        match value {
            Value::Boolean(v) => VarValue::Boolean(*v),
            Value::Null => VarValue::Null,
            Value::Integer(v) => VarValue::Integer(*v),
            Value::OctetString(bytes) => VarValue::OctetString(bytes.to_vec()),
            Value::ObjectIdentifier(oid) => VarValue::ObjectIdentifier(oid.to_string()),
            Value::IpAddress(addr) => VarValue::IpAddress(*addr),
            Value::Counter32(v) => VarValue::Unsigned(u64::from(*v)),
            Value::Unsigned32(v) => VarValue::Unsigned(u64::from(*v)),
            Value::Timeticks(v) => VarValue::Timeticks(*v),
            Value::Counter64(v) => VarValue::Unsigned(*v),
            Value::EndOfMibView => VarValue::EndOfMibView,
            Value::NoSuchObject => VarValue::NoSuchObject,
            Value::NoSuchInstance => VarValue::NoSuchInstance,
            other => VarValue::Other(format!("{:?}", other)),
        }
    }
}

/// Пара (OID, значение) из ответа
#[derive(Debug, Clone, PartialEq)]
pub struct VarBind {
    pub oid: String,
    pub value: VarValue,
}

impl VarBind {
    pub fn new(oid: impl Into<String>, value: VarValue) -> Self {
        Self {
            oid: oid.into(),
            value,
        }
    }

    pub fn as_f64(&self) -> Result<f64> {
        self.value.as_f64().ok_or_else(|| PollError::ValueCoercion {
            oid: self.oid.clone(),
            value: self.value.to_string(),
        })
    }
}

/// error-status из PDU (RFC 3416)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ErrorStatus(pub u32);

impl ErrorStatus {
    pub fn is_error(&self) -> bool {
        self.0 != 0
    }

    pub fn name(&self) -> Option<&'static str> {
        let name = match self.0 {
            0 => "noError",
            1 => "tooBig",
            2 => "noSuchName",
            3 => "badValue",
            4 => "readOnly",
            5 => "genErr",
            6 => "noAccess",
            7 => "wrongType",
            8 => "wrongLength",
            9 => "wrongEncoding",
            10 => "wrongValue",
            11 => "noCreation",
            12 => "inconsistentValue",
            13 => "resourceUnavailable",
            14 => "commitFailed",
            15 => "undoFailed",
            16 => "authorizationError",
            17 => "notWritable",
            18 => "inconsistentName",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "unknownError({})", self.0),
        }
    }
}

/// Один ответ транспорта: одна строка обхода таблицы
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResponseEnvelope {
    pub error_indication: Option<String>,
    pub error_status: ErrorStatus,
    /// Номер привязки с ошибкой, начиная с 1; 0 — неизвестно
    pub error_index: u32,
    pub var_binds: Vec<VarBind>,
}

impl ResponseEnvelope {
    pub fn row(var_binds: Vec<VarBind>) -> Self {
        Self {
            var_binds,
            ..Default::default()
        }
    }

    pub fn indication(message: impl Into<String>) -> Self {
        Self {
            error_indication: Some(message.into()),
            ..Default::default()
        }
    }

    /// Проверяет конверт: сначала error-indication, затем error-status
    pub fn check(&self) -> Result<()> {
        if let Some(indication) = &self.error_indication {
            return Err(PollError::Transport(indication.clone()));
        }

        if self.error_status.is_error() {
            let at = match self.error_index {
                0 => None,
                index => self.var_binds.get(index as usize - 1),
            }
            .map(|vb| vb.oid.clone())
            .unwrap_or_else(|| "?".to_string());

            return Err(PollError::Protocol {
                status: self.error_status.to_string(),
                at,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binds() -> Vec<VarBind> {
        vec![
            VarBind::new("1.3.6.1.2.1.1.1.0", VarValue::text("Linux")),
            VarBind::new("1.3.6.1.2.1.1.2.0", VarValue::ObjectIdentifier("1.3.6.1.4.1.8072".into())),
            VarBind::new("1.3.6.1.2.1.1.3.0", VarValue::Timeticks(100)),
        ]
    }

    #[test]
    fn test_indication_wins_over_status() {
        let envelope = ResponseEnvelope {
            error_indication: Some("No SNMP response received before timeout".into()),
            error_status: ErrorStatus(5),
            error_index: 1,
            var_binds: binds(),
        };

        assert_eq!(
            envelope.check(),
            Err(PollError::Transport("No SNMP response received before timeout".into()))
        );
    }

    #[test]
    fn test_status_names_offending_oid() {
        let envelope = ResponseEnvelope {
            error_indication: None,
            error_status: ErrorStatus(2),
            error_index: 2,
            var_binds: binds(),
        };

        let err = envelope.check().unwrap_err();
        assert_eq!(err.to_string(), "noSuchName at 1.3.6.1.2.1.1.2.0");
    }

    #[test]
    fn test_status_with_unknown_index() {
        for index in [0, 42] {
            let envelope = ResponseEnvelope {
                error_indication: None,
                error_status: ErrorStatus(5),
                error_index: index,
                var_binds: binds(),
            };
            assert_eq!(envelope.check().unwrap_err().to_string(), "genErr at ?");
        }
    }

    #[test]
    fn test_value_coercion() {
        assert_eq!(VarValue::text(" 48 ").as_f64(), Some(48.0));
        assert_eq!(VarValue::Unsigned(7).as_f64(), Some(7.0));
        assert_eq!(VarValue::text("ModelX").as_f64(), None);

        let vb = VarBind::new("1.3.6.1.2.1.25.2.3.1.5.1", VarValue::Null);
        assert!(matches!(vb.as_f64(), Err(PollError::ValueCoercion { .. })));
    }

    #[test]
    fn test_display() {
        assert_eq!(VarValue::text("C:\\").to_string(), "C:\\");
        assert_eq!(VarValue::OctetString(vec![0x00, 0x1b, 0xff]).to_string(), "0x001bff");
        assert_eq!(VarValue::IpAddress([10, 0, 0, 1]).to_string(), "10.0.0.1");
        assert_eq!(ErrorStatus(99).to_string(), "unknownError(99)");
    }
}
