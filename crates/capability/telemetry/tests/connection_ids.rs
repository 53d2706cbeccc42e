use tank_telemetry::{metrics, new_connection_id, record_decode_failure};

#[test]
fn connection_ids_unique() {
    let first = new_connection_id();
    let second = new_connection_id();
    assert!(!first.is_empty());
    assert_ne!(first, second);
}

#[test]
fn counters_increase() {
    let before = metrics().snapshot().decode_failure;
    record_decode_failure();
    assert!(metrics().snapshot().decode_failure > before);
}
