use lazytimer_core::{
    acquire_role, send_activation, ActivationConfig, ActivationError, ActivationEvent,
    ActivationListener, InstanceRole,
};
use std::io::Write;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

fn ephemeral_config() -> ActivationConfig {
    ActivationConfig {
        addr: "127.0.0.1:0".parse().unwrap(),
        accept_timeout: Duration::from_millis(500),
        ..ActivationConfig::default()
    }
}

fn primary() -> (ActivationListener, ActivationConfig) {
    let listener = ActivationListener::bind(ephemeral_config()).unwrap();
    let config = ActivationConfig {
        addr: listener.local_addr().unwrap(),
        ..ephemeral_config()
    };
    (listener, config)
}

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

#[test]
fn idle_poll_returns_quickly() {
    let config = ActivationConfig {
        accept_timeout: Duration::from_millis(10),
        ..ephemeral_config()
    };
    let listener = ActivationListener::bind(config).unwrap();

    let started = Instant::now();
    assert_eq!(listener.poll(), ActivationEvent::Idle);
    assert!(started.elapsed() < Duration::from_millis(250));
}

#[test]
fn second_launch_becomes_client_and_primary_sees_one_activation() {
    let (listener, config) = primary();

    let role = acquire_role(&config).unwrap();
    assert!(matches!(role, InstanceRole::Client));

    assert_eq!(listener.poll(), ActivationEvent::Activate);
    assert_eq!(listener.poll(), ActivationEvent::Idle);
}

#[test]
fn each_connection_signals_once() {
    let (listener, config) = primary();

    send_activation(&config).unwrap();
    send_activation(&config).unwrap();

    assert_eq!(listener.poll(), ActivationEvent::Activate);
    assert_eq!(listener.poll(), ActivationEvent::Activate);
}

#[test]
fn unknown_payload_is_ignored_and_listener_keeps_serving() {
    let (listener, config) = primary();

    let mut stream = TcpStream::connect(config.addr).unwrap();
    stream.write_all(b"shutdown").unwrap();
    drop(stream);
    assert_eq!(listener.poll(), ActivationEvent::Ignored);

    // Connect and close without sending anything.
    drop(TcpStream::connect(config.addr).unwrap());
    assert_ne!(listener.poll(), ActivationEvent::Activate);

    send_activation(&config).unwrap();
    assert_eq!(listener.poll(), ActivationEvent::Activate);
}

#[test]
fn payload_over_budget_is_not_mistaken_for_token() {
    let (listener, config) = primary();

    let mut stream = TcpStream::connect(config.addr).unwrap();
    let mut payload = b"activate".to_vec();
    payload.extend(std::iter::repeat(b'x').take(200));
    stream.write_all(&payload).unwrap();
    drop(stream);

    assert_eq!(listener.poll(), ActivationEvent::Ignored);
}

#[test]
fn exactly_one_of_two_concurrent_launches_becomes_primary() {
    let config = ActivationConfig {
        accept_timeout: Duration::from_millis(500),
        ..ActivationConfig::with_port(free_port())
    };
    let barrier = Arc::new(Barrier::new(2));

    let launches: Vec<_> = (0..2)
        .map(|_| {
            let config = config.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                acquire_role(&config).unwrap()
            })
        })
        .collect();
    let roles: Vec<InstanceRole> = launches
        .into_iter()
        .map(|launch| launch.join().unwrap())
        .collect();

    let primaries: Vec<&ActivationListener> = roles
        .iter()
        .filter_map(|role| match role {
            InstanceRole::Primary(listener) => Some(listener),
            InstanceRole::Client => None,
        })
        .collect();
    assert_eq!(primaries.len(), 1);
    assert_eq!(primaries[0].poll(), ActivationEvent::Activate);
}

#[test]
fn failing_as_both_primary_and_client_is_reported() {
    // TEST-NET-1 is never a local address, so bind and connect both fail.
    let config = ActivationConfig {
        addr: "192.0.2.1:65432".parse::<SocketAddr>().unwrap(),
        connect_timeout: Duration::from_millis(200),
        ..ActivationConfig::default()
    };

    let err = acquire_role(&config).unwrap_err();
    let ActivationError::Unavailable { addr, .. } = &err;
    assert_eq!(*addr, config.addr);
    assert!(err.to_string().contains("unavailable"));
}
