use serde::Deserialize;

use crate::connector::{ConnectorKind, PollScope};

/// Тело запроса POST /poll
#[derive(Debug, Deserialize)]
pub struct PollRequest {
    pub ip: String,
    pub port: Option<u16>,
    pub community: String,
    pub connector: Option<ConnectorKind>,
    pub only: Option<PollScope>,
}
