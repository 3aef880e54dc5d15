//! End-to-end runs of the harness against the recording transport.

use super::recording::{Call, Fault, RecordingTransport};
use super::test_config;
use crate::config::HarnessConfig;
use crate::error::SenderError;
use crate::sender::run;
use crate::signal::sine_block;
use crate::transport::{Interface, Protocol};

#[tokio::test]
async fn test_full_run_call_sequence() {
    let transport = RecordingTransport::new();
    run(&transport, &test_config()).await.unwrap();

    let calls = transport.calls();
    let setup = vec![
        Call::OpenContext,
        Call::OpenSession,
        Call::AllocateEndpoint(0),
        Call::SetProtocol(0, Protocol::RtpRs8mSource),
        Call::SetHost(0, "127.0.0.1".to_string()),
        Call::SetPort(0, 10001),
        Call::Connect(Interface::AudioSource, 0),
        Call::DeallocateEndpoint(0),
        Call::AllocateEndpoint(1),
        Call::SetProtocol(1, Protocol::Rs8mRepair),
        Call::SetHost(1, "127.0.0.1".to_string()),
        Call::SetPort(1, 10002),
        Call::Connect(Interface::AudioRepair, 1),
        Call::DeallocateEndpoint(1),
    ];
    assert_eq!(calls[..setup.len()], setup[..]);
    assert_eq!(
        calls[calls.len() - 2..],
        [Call::CloseSession, Call::CloseContext]
    );
}

#[tokio::test]
async fn test_default_budget_is_2205_writes_of_400_bytes() {
    let transport = RecordingTransport::new();
    let report = run(&transport, &test_config()).await.unwrap();

    let writes = transport.writes();
    assert_eq!(writes.len(), 2205);
    assert!(writes.iter().all(|&len| len == 400));

    assert_eq!(report.frames_written, 2205);
    assert_eq!(report.samples_written, 220_500);
    assert_eq!(report.bytes_written, 2205 * 400);
}

#[tokio::test]
async fn test_each_write_carries_its_own_sine_block() {
    let transport = RecordingTransport::new();
    let config = test_config();
    run(&transport, &config).await.unwrap();

    let params = config.sine_params();
    for index in [0usize, 1, 2204] {
        let written = transport.payload(index).unwrap();
        let expected = sine_block(index, config.block_size, &params);

        let written_bits: Vec<u32> = written.iter().map(|s| s.to_bits()).collect();
        let expected_bits: Vec<u32> = expected.iter().map(|s| s.to_bits()).collect();
        assert_eq!(written_bits, expected_bits, "block {index}");

        // Right channel mirrors the left
        for pair in written.chunks_exact(2) {
            assert_eq!(pair[1], -pair[0]);
        }
    }

    // Consecutive blocks are different slices of one tone
    assert_ne!(transport.payload(0), transport.payload(1));
    assert_eq!(transport.payload(2205), None);
}

#[tokio::test]
async fn test_writes_happen_only_after_both_binds() {
    let transport = RecordingTransport::new();
    run(&transport, &test_config()).await.unwrap();

    let calls = transport.calls();
    let first_write = calls
        .iter()
        .position(|c| matches!(c, Call::Write(_)))
        .unwrap();
    let last_write = calls
        .iter()
        .rposition(|c| matches!(c, Call::Write(_)))
        .unwrap();

    assert!(transport.position(&Call::Connect(Interface::AudioSource, 0)).unwrap() < first_write);
    assert!(transport.position(&Call::Connect(Interface::AudioRepair, 1)).unwrap() < first_write);
    assert!(last_write < transport.position(&Call::CloseSession).unwrap());
}

#[tokio::test]
async fn test_repair_bind_failure_stops_before_streaming() {
    let transport = RecordingTransport::failing_on(Fault::Connect(Interface::AudioRepair));
    let err = run(&transport, &test_config()).await.unwrap_err();

    assert!(matches!(
        err,
        SenderError::Bind {
            interface: Interface::AudioRepair,
            ..
        }
    ));
    assert_eq!(err.operation(), "sender_connect");
    assert!(err.is_setup_failure());

    // Nothing was written
    assert!(transport.writes().is_empty());

    // Both descriptors were released, the failed one included
    assert_eq!(transport.count(&Call::DeallocateEndpoint(0)), 1);
    assert_eq!(transport.count(&Call::DeallocateEndpoint(1)), 1);

    // What was acquired is released in reverse order
    let close_session = transport.position(&Call::CloseSession).unwrap();
    let close_context = transport.position(&Call::CloseContext).unwrap();
    assert!(close_session < close_context);
}

#[tokio::test]
async fn test_write_failure_aborts_without_retry() {
    let transport = RecordingTransport::failing_on(Fault::Write(10));
    let err = run(&transport, &test_config()).await.unwrap_err();

    assert!(matches!(err, SenderError::Write { frame: 10, .. }));
    assert!(!err.is_setup_failure());
    assert_eq!(transport.writes().len(), 11);

    let calls = transport.calls();
    assert_eq!(
        calls[calls.len() - 2..],
        [Call::CloseSession, Call::CloseContext]
    );
}

#[tokio::test]
async fn test_session_open_failure_closes_context() {
    let transport = RecordingTransport::failing_on(Fault::OpenSession);
    let err = run(&transport, &test_config()).await.unwrap_err();

    assert!(matches!(err, SenderError::SessionOpen(_)));
    assert_eq!(
        transport.calls(),
        vec![Call::OpenContext, Call::OpenSession, Call::CloseContext]
    );
}

#[tokio::test]
async fn test_context_open_failure_touches_nothing_else() {
    let transport = RecordingTransport::failing_on(Fault::OpenContext);
    let err = run(&transport, &test_config()).await.unwrap_err();

    assert_eq!(err.operation(), "context_open");
    assert_eq!(transport.calls(), vec![Call::OpenContext]);
}

#[tokio::test]
async fn test_session_close_failure_still_closes_context() {
    let transport = RecordingTransport::failing_on(Fault::CloseSession);
    let err = run(&transport, &test_config()).await.unwrap_err();

    assert!(matches!(err, SenderError::SessionClose(_)));
    assert_eq!(transport.count(&Call::CloseSession), 1);
    assert_eq!(transport.count(&Call::CloseContext), 1);
}

#[tokio::test]
async fn test_set_host_failure_releases_descriptor() {
    let transport = RecordingTransport::failing_on(Fault::SetHost);
    let err = run(&transport, &test_config()).await.unwrap_err();

    assert_eq!(err.operation(), "endpoint_set_host");
    assert_eq!(transport.count(&Call::DeallocateEndpoint(0)), 1);
    assert_eq!(transport.position(&Call::Connect(Interface::AudioSource, 0)), None);
    assert!(transport.writes().is_empty());
}

#[tokio::test]
async fn test_deallocate_failure_is_fatal() {
    let transport = RecordingTransport::failing_on(Fault::DeallocateEndpoint);
    let err = run(&transport, &test_config()).await.unwrap_err();

    assert!(matches!(err, SenderError::EndpointDeallocate(_)));
    // The repair endpoint is never allocated
    assert_eq!(transport.position(&Call::AllocateEndpoint(1)), None);
    assert!(transport.writes().is_empty());
}

#[tokio::test]
async fn test_invalid_config_makes_no_calls() {
    let transport = RecordingTransport::new();
    let config = HarnessConfig {
        block_size: 101,
        ..test_config()
    };

    let err = run(&transport, &config).await.unwrap_err();
    assert!(matches!(err, SenderError::InvalidConfig(_)));
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn test_alternate_parameters() {
    let transport = RecordingTransport::new();
    let config = HarnessConfig {
        receiver_host: "192.0.2.7".to_string(),
        source_port: 20001,
        repair_port: 20002,
        sample_rate: 8000,
        duration_secs: 1,
        block_size: 160,
        ..test_config()
    };

    let report = run(&transport, &config).await.unwrap();

    assert_eq!(report.frames_written, 50);
    assert!(transport.writes().iter().all(|&len| len == 640));
    assert_eq!(transport.count(&Call::SetPort(0, 20001)), 1);
    assert_eq!(transport.count(&Call::SetPort(1, 20002)), 1);
    assert_eq!(
        transport.count(&Call::SetHost(1, "192.0.2.7".to_string())),
        1
    );
}
