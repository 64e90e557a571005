use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use tokio::time::{Duration, timeout};
use tracing::info;

use crate::config::AppConfig;
use crate::connector::{build_connector, collect_report};
use crate::formatter::json::{DeviceReportJson, JsonFormatter};
use crate::models::PollRequest;
use crate::snmp::{Authentication, Device, SnmpTransport};

const POLL_TIMEOUT_SECS: u64 = 60;

pub async fn handle_poll(
    State(config): State<Arc<AppConfig>>,
    Json(params): Json<PollRequest>,
) -> Result<(StatusCode, Json<DeviceReportJson>), (StatusCode, String)> {
    let device = Device::new(params.ip, params.port.unwrap_or(161));
    let auth = Authentication::V2c {
        community: params.community.into_bytes(),
    };
    let kind = params.connector.unwrap_or_else(|| config.get_connector());
    let scope = params.only.unwrap_or_default();

    info!(device = %device, connector = %kind, scope = %scope, "poll requested");

    let work = async {
        let transport =
            SnmpTransport::connect(&device, &auth, config.poll_options(), config.max_repetitions())
                .await
                .map_err(|e| (StatusCode::BAD_GATEWAY, e.to_string()))?;
        let mut connector = build_connector(kind, transport).await;
        Ok::<_, (StatusCode, String)>(collect_report(connector.as_mut(), scope).await)
    };

    let report = match timeout(Duration::from_secs(POLL_TIMEOUT_SECS), work).await {
        Ok(Ok(report)) => report,
        Ok(Err(e)) => return Err(e),
        Err(_) => {
            return Err((
                StatusCode::GATEWAY_TIMEOUT,
                "SNMP poll timeout".to_string(),
            ));
        }
    };

    let json = JsonFormatter::format_report(&report);
    let status = if json.status == "error" {
        StatusCode::BAD_GATEWAY
    } else {
        StatusCode::OK
    };

    Ok((status, Json(json)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::{ConnectorKind, PollScope};
    use crate::snmp::testing::{AgentReply, AgentValue, LoopbackAgent};

    #[test]
    fn test_poll_runs_on_worker_thread() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_stack_size(2 * 1024 * 1024)
            .enable_all()
            .build()
            .unwrap();

        let (status, Json(report)) = runtime.block_on(async {
            let binds = (1..=8)
                .map(|i| (format!("1.3.6.1.2.1.1.{}.0", i), AgentValue::Text("edge-01")))
                .collect();
            let agent = LoopbackAgent::start(vec![AgentReply::binds(binds)]).await;
            let request = PollRequest {
                ip: "127.0.0.1".into(),
                port: Some(agent.port),
                community: "public".into(),
                connector: Some(ConnectorKind::HostResources),
                only: Some(PollScope::Properties),
            };

            tokio::spawn(handle_poll(State(Arc::new(AppConfig::default())), Json(request)))
                .await
                .unwrap()
                .unwrap()
        });

        assert_eq!(status, StatusCode::OK);
        assert_eq!(report.status, "success");
        assert_eq!(report.summary.property_count, 8);
        assert_eq!(report.properties.unwrap()["sysName"], "edge-01");
    }
}
