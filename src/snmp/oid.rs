use std::cmp::Ordering;

use snmp2::Oid;

use crate::error::{PollError, Result};

/// Приводит OID к каноническому виду: без пробелов и ведущей точки
pub fn normalize_oid(s: &str) -> &str {
    s.trim().trim_start_matches('.')
}

pub fn parse_oid(s: &str) -> Result<Oid<'static>> {
    let parts: std::result::Result<Vec<u64>, _> = normalize_oid(s)
        .split('.')
        .filter(|p| !p.is_empty())
        .map(|p| p.parse::<u64>())
        .collect();

    let parts = parts.map_err(|e| PollError::InvalidOid(format!("{}: {}", s, e)))?;
    Oid::from(&parts).map_err(|e| PollError::InvalidOid(format!("{}: {:?}", s, e)))
}

/// Возвращает индекс строки таблицы: все компоненты OID после префикса колонки.
/// Составные индексы (`instance.subindex`) сохраняются целиком.
/// Если OID не лежит под префиксом, возвращается последний компонент.
pub fn split_oid_index(oid: &str, prefix: &str) -> String {
    let oid = normalize_oid(oid);
    let prefix = normalize_oid(prefix);

    if let Some(rest) = oid.strip_prefix(prefix) {
        if let Some(index) = rest.strip_prefix('.') {
            if !index.is_empty() {
                return index.to_string();
            }
        }
    }

    oid.rsplit('.').next().unwrap_or(oid).to_string()
}

/// Проверяет, что OID лежит строго под корнем
pub fn is_under(oid: &str, root: &str) -> bool {
    let oid = normalize_oid(oid);
    let root = normalize_oid(root);
    oid.len() > root.len() && oid.starts_with(root) && oid.as_bytes()[root.len()] == b'.'
}

/// Лексикографическое сравнение OID по числовым компонентам
pub fn compare_oids(a: &str, b: &str) -> Ordering {
    let components = |s: &str| {
        normalize_oid(s)
            .split('.')
            .filter(|p| !p.is_empty())
            .map(|p| p.parse::<u64>().unwrap_or(u64::MAX))
            .collect::<Vec<_>>()
    };
    components(a).cmp(&components(b))
}
