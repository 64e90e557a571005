use thiserror::Error;

/// Результат операций опроса
pub type Result<T> = std::result::Result<T, PollError>;

/// Ошибки опроса MIB
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PollError {
    /// Транспорт сообщил об ошибке до того, как агент вернул статус (таймаут, недоступный хост)
    #[error("{0}")]
    Transport(String),

    /// Агент вернул ненулевой error-status
    #[error("{status} at {at}")]
    Protocol { status: String, at: String },

    #[error("Строка ответа содержит {got} привязок, каталог ожидает {expected}")]
    MalformedRow { expected: usize, got: usize },

    #[error("Значение '{value}' в {oid} не является числом")]
    ValueCoercion { oid: String, value: String },

    #[error("Невалидный OID: {0}")]
    InvalidOid(String),

    #[error("Не удалось создать SNMP сессию: {0}")]
    Session(String),
}
