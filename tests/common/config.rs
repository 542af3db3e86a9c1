//! Test configuration helpers for pointing an orchestrator at a mock service

use std::time::Duration;
use upscale_batch::{BatchOrchestrator, Config};
use wiremock::MockServer;

/// Configuration targeting `server` with short deadlines
pub fn config_for(server: &MockServer) -> Config {
    config_for_uri(&server.uri())
}

/// Configuration targeting an arbitrary base URL with short deadlines
pub fn config_for_uri(base_url: &str) -> Config {
    let mut config = Config::default();
    config.service.base_url = base_url.to_string();
    config.timeouts.simple = Duration::from_secs(2);
    config.timeouts.ai = Duration::from_secs(4);
    config
}

/// Orchestrator over HTTP against `server`
pub fn orchestrator_for(server: &MockServer) -> BatchOrchestrator {
    BatchOrchestrator::new(config_for(server)).expect("valid test config")
}

/// Orchestrator with a caller-adjusted configuration
pub fn orchestrator_with(
    server: &MockServer,
    adjust: impl FnOnce(&mut Config),
) -> BatchOrchestrator {
    let mut config = config_for(server);
    adjust(&mut config);
    BatchOrchestrator::new(config).expect("valid test config")
}

/// A base URL on which nothing is listening
pub fn closed_port_uri() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}
