//! Loading a TOML file and bootstrapping a gateway from it.

use std::collections::HashMap;
use std::io::Write;

use api_gateway::config::loader::{load_config, parse_config, ConfigError};
use api_gateway::config::LoadBalancerStrategy;
use api_gateway::Gateway;

const CONFIG: &str = r#"
[load_balancer]
strategy = "weighted"
health_check_interval_ms = 3600000

[[services]]
id = "orders-1"
name = "orders"
base_url = "http://127.0.0.1:7001"
weight = 2

[[services]]
id = "orders-2"
name = "orders"
base_url = "http://127.0.0.1:7002"

[[routes]]
id = "orders"
path = "/orders/:id"
method = "GET"
targets = ["orders-1", "orders-2"]

[[routes]]
id = "orders-eu"
path = "/orders/:id"
method = "GET"
targets = ["orders-2"]
priority = 10

  [[routes.conditions]]
  type = "query"
  field = "region"
  operator = "regex"
  value = "^eu-"
"#;

#[tokio::test]
async fn test_bootstrap_from_file() {
    let mut file = std::env::temp_dir();
    file.push(format!("api-gateway-{}.toml", std::process::id()));
    std::fs::File::create(&file)
        .unwrap()
        .write_all(CONFIG.as_bytes())
        .unwrap();

    let config = load_config(&file).unwrap();
    let _ = std::fs::remove_file(&file);
    assert_eq!(config.load_balancer.strategy, LoadBalancerStrategy::Weighted);

    let gateway = Gateway::from_config(&config).unwrap();
    assert_eq!(gateway.services().len(), 2);
    assert_eq!(gateway.routes().len(), 2);
    assert_eq!(gateway.services()[0].weight, 2);

    let headers = HashMap::new();
    let eu: HashMap<String, String> = [("region".to_string(), "eu-west".to_string())].into();
    let us: HashMap<String, String> = [("region".to_string(), "us-east".to_string())].into();
    assert_eq!(gateway.find_route("/orders/7", "GET", &headers, &eu).unwrap().id, "orders-eu");
    assert_eq!(gateway.find_route("/orders/7", "GET", &headers, &us).unwrap().id, "orders");
}

#[test]
fn test_invalid_config_lists_every_problem() {
    let raw = r#"
        [load_balancer]
        health_check_interval_ms = 0

        [[routes]]
        id = "r"
        path = "no-slash"
        method = "GET"
        targets = ["ghost"]
    "#;

    match parse_config(raw) {
        Err(ConfigError::Validation(errors)) => assert!(errors.len() >= 3, "{:?}", errors),
        other => panic!("expected validation errors, got {:?}", other),
    }
}

#[test]
fn test_missing_file_is_io_error() {
    let err = load_config(std::path::Path::new("/definitely/not/here.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}
