use tank_config::{AppConfig, ConfigError};

// 环境变量是进程级共享状态，所有断言放在同一个测试里顺序执行。
#[test]
fn load_config_from_env() {
    // Rust 2024 中 set_var 需要显式标注 unsafe（测试进程内可控）。
    unsafe {
        std::env::remove_var("TANK_TCP_PORT");
        std::env::remove_var("TANK_READ_TIMEOUT_MS");
        std::env::remove_var("TANK_MAX_CONNECTIONS");
        std::env::set_var("TANK_APP_URL", "https://tanks.example.com/");
    }

    let config = AppConfig::from_env().expect("config");
    assert_eq!(config.tcp_port, 8888);
    assert_eq!(config.read_timeout_ms, 5000);
    assert_eq!(config.max_connections, None);
    assert_eq!(config.listen_addr(), "0.0.0.0:8888");
    assert_eq!(
        config.sink_url(),
        "https://tanks.example.com/api/sensors/dingtek/data"
    );

    unsafe {
        std::env::set_var("TANK_TCP_PORT", "9100");
        std::env::set_var("TANK_MAX_CONNECTIONS", "64");
    }
    let config = AppConfig::from_env().expect("config");
    assert_eq!(config.tcp_port, 9100);
    assert_eq!(config.max_connections, Some(64));

    unsafe {
        std::env::set_var("TANK_TCP_PORT", "not-a-port");
    }
    let err = AppConfig::from_env().expect_err("invalid port");
    assert!(matches!(err, ConfigError::Invalid(key, _) if key == "TANK_TCP_PORT"));

    unsafe {
        std::env::remove_var("TANK_TCP_PORT");
        std::env::remove_var("TANK_MAX_CONNECTIONS");
        std::env::remove_var("TANK_APP_URL");
    }
}
