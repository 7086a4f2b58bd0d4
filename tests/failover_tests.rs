//! Failover URI parsing and the reconnect schedule it drives.

use std::time::Duration;

use stomp_core::{FailoverTransport, FailoverUri};

#[test]
fn round_robin_with_exponential_backoff_clamped() {
    let mut transport = FailoverTransport::parse(
        "failover:(tcp://a:1,tcp://b:2)?randomize=false&initialReconnectDelay=100&backOffMultiplier=2&maxReconnectDelay=1000",
    )
    .expect("parse failed");

    let expected = [
        ("a", 1, 0),
        ("b", 2, 100),
        ("a", 1, 200),
        ("b", 2, 400),
        ("a", 1, 800),
        ("b", 2, 1000),
        ("a", 1, 1000),
        ("b", 2, 1000),
    ];
    for (host, port, delay_ms) in expected {
        let (broker, delay) = transport.next_broker().expect("schedule exhausted early");
        assert_eq!(broker.host, host);
        assert_eq!(broker.port, port);
        assert_eq!(delay, Duration::from_millis(delay_ms), "broker {}:{}", host, port);
        transport.note_failure();
    }
    assert_eq!(transport.consecutive_failures(), 8);
}

#[test]
fn delays_non_decreasing_and_bounded() {
    let mut transport = FailoverTransport::parse(
        "failover:tcp://only:1?initialReconnectDelay=10&maxReconnectDelay=5000",
    )
    .expect("parse failed");
    let mut last = Duration::ZERO;
    for _ in 0..20 {
        let (_, delay) = transport.next_broker().expect("schedule exhausted early");
        assert!(delay >= last, "delay shrank within a failure streak");
        assert!(delay <= Duration::from_millis(5000));
        last = delay;
    }
}

#[test]
fn linear_backoff_when_exponential_disabled() {
    let mut transport = FailoverTransport::parse(
        "failover:tcp://a:1?randomize=false&initialReconnectDelay=250&useExponentialBackOff=false",
    )
    .expect("parse failed");
    assert_eq!(transport.next_broker().unwrap().1, Duration::ZERO);
    for _ in 0..5 {
        assert_eq!(transport.next_broker().unwrap().1, Duration::from_millis(250));
    }
}

#[test]
fn success_restarts_the_schedule() {
    let mut transport = FailoverTransport::parse(
        "failover:(tcp://a:1,tcp://b:2)?randomize=false&initialReconnectDelay=100",
    )
    .expect("parse failed");
    transport.next_broker().unwrap();
    transport.note_failure();
    transport.next_broker().unwrap();
    transport.note_success();

    // back to the top of the list with a zero delay
    let (broker, delay) = transport.next_broker().unwrap();
    assert_eq!(broker.host, "a");
    assert_eq!(delay, Duration::ZERO);
    assert_eq!(transport.consecutive_failures(), 0);
}

#[test]
fn budget_exhaustion_is_terminal_not_an_error() {
    let mut transport = FailoverTransport::parse(
        "failover:(tcp://a:1,tcp://b:2)?randomize=false&maxReconnectAttempts=1",
    )
    .expect("parse failed");
    // first pass plus one retry pass
    for _ in 0..4 {
        assert!(transport.next_broker().is_some());
        transport.note_failure();
    }
    assert!(transport.next_broker().is_none());
    assert!(transport.next_broker().is_none());
}

#[test]
fn parse_errors_are_construction_time() {
    assert_eq!(
        FailoverTransport::parse("failover:udp://a:1").unwrap_err().kind(),
        "malformed-uri"
    );
    assert_eq!(
        FailoverTransport::parse("failover:tcp://a:1?mystery=1")
            .unwrap_err()
            .kind(),
        "unknown-option"
    );
    assert_eq!(
        FailoverTransport::parse("failover:tcp://a:1?initialReconnectDelay=soon")
            .unwrap_err()
            .kind(),
        "bad-option-value"
    );
}

#[test]
fn uri_accessor_exposes_parsed_configuration() {
    let uri: FailoverUri = "failover:(tcp://a:1,tcp://b:2)?priorityBackup=true"
        .parse()
        .expect("parse failed");
    let transport = FailoverTransport::new(uri.clone());
    assert_eq!(transport.uri(), &uri);
    assert!(transport.uri().options.priority_backup);
    assert_eq!(transport.uri().brokers.len(), 2);
}
