use std::time::Duration;

use tracing::debug;

use super::processing::format_ticks;
use super::types::PropertyRecord;
use crate::error::{PollError, Result};
use crate::snmp::{PollOptions, Transport, VarBind, VarValue};

/// Опрос свойств: один запрос, таймаут 2с, один повтор
pub const PROPERTY_TIMEOUT: Duration = Duration::from_secs(2);
pub const PROPERTY_RETRIES: u32 = 1;

/// Преобразование значения поля
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldTransform {
    Text,
    /// Сотые доли секунды -> "N days, H:MM:SS.cc"
    Ticks,
}

impl FieldTransform {
    pub fn apply(&self, value: &VarValue) -> String {
        match self {
            FieldTransform::Text => value.to_string(),
            FieldTransform::Ticks => match value.as_ticks() {
                Some(ticks) => format_ticks(ticks),
                None => value.to_string(),
            },
        }
    }
}

/// Элемент каталога свойств: OID, имя поля и преобразование
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyField {
    pub oid: &'static str,
    pub name: &'static str,
    pub transform: FieldTransform,
}

impl PropertyField {
    pub const fn text(oid: &'static str, name: &'static str) -> Self {
        Self {
            oid,
            name,
            transform: FieldTransform::Text,
        }
    }

    pub const fn ticks(oid: &'static str, name: &'static str) -> Self {
        Self {
            oid,
            name,
            transform: FieldTransform::Ticks,
        }
    }
}

/// Сопоставляет строку ответа с каталогом по позиции
pub fn extract_properties(catalog: &[PropertyField], var_binds: &[VarBind]) -> Result<PropertyRecord> {
    if var_binds.len() < catalog.len() {
        return Err(PollError::MalformedRow {
            expected: catalog.len(),
            got: var_binds.len(),
        });
    }

    Ok(catalog
        .iter()
        .zip(var_binds)
        .map(|(field, vb)| (field.name.to_string(), field.transform.apply(&vb.value)))
        .collect())
}

/// Опрашивает каталог свойств и проверяет первый конверт
pub async fn poll_property_catalog<T: Transport + ?Sized>(
    transport: &mut T,
    catalog: &[PropertyField],
) -> Result<PropertyRecord> {
    let oids: Vec<&str> = catalog.iter().map(|f| f.oid).collect();
    let options = PollOptions::new(PROPERTY_TIMEOUT, PROPERTY_RETRIES).first_row();

    let envelopes = transport.bulk_poll(&oids, Some(options)).await?;
    let envelope = envelopes
        .into_iter()
        .next()
        .ok_or_else(|| PollError::MalformedRow {
            expected: catalog.len(),
            got: 0,
        })?;

    envelope.check()?;
    let props = extract_properties(catalog, &envelope.var_binds)?;
    debug!(fields = props.len(), "properties extracted");

    Ok(props)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snmp::testing::{text, vb};

    const CATALOG: &[PropertyField] = &[
        PropertyField::text("1.3.6.1.2.1.1.1", "sysDescr"),
        PropertyField::ticks("1.3.6.1.2.1.1.3", "sysUpTime"),
    ];

    #[test]
    fn test_extract_by_position() {
        let binds = vec![
            text("1.3.6.1.2.1.1.1.0", "Linux core-sw"),
            vb("1.3.6.1.2.1.1.3.0", VarValue::Timeticks(8_640_000)),
        ];

        let props = extract_properties(CATALOG, &binds).unwrap();
        assert_eq!(props["sysDescr"], "Linux core-sw");
        assert_eq!(props["sysUpTime"], "1 day, 0:00:00.00");
    }

    #[test]
    fn test_short_row_is_malformed() {
        let binds = vec![text("1.3.6.1.2.1.1.1.0", "Linux")];
        assert_eq!(
            extract_properties(CATALOG, &binds),
            Err(PollError::MalformedRow {
                expected: 2,
                got: 1
            })
        );
    }

    #[test]
    fn test_ticks_transform_passes_through_non_numeric() {
        assert_eq!(FieldTransform::Ticks.apply(&VarValue::text("never")), "never");
        assert_eq!(FieldTransform::Ticks.apply(&VarValue::text("4500")), "0:00:45.00");
    }
}
