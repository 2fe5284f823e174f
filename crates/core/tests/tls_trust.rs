//! TLS fingerprint pinning and trust-on-first-use exercised over a real
//! handshake between a `core`-driven receiver and sender.

use core::{ReceiverConfig, SenderConfig, TlsClientConfig, TlsServerConfig, TransferEntry};
use logging_sink::ProgressSink;
use test_support::SelfSignedCert;

struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _event: &logging_sink::ProgressEvent) {}
    fn emit_line(&self, _line: &str) {}
}

fn entry(dir: &std::path::Path, name: &str, data: &[u8]) -> TransferEntry {
    let path = dir.join(name);
    std::fs::write(&path, data).unwrap();
    TransferEntry {
        absolute_source_path: path,
        relative_path: name.to_string(),
        size_bytes: data.len() as u64,
    }
}

async fn free_port() -> u16 {
    let (listener, port) = test_support::loopback_listener().await;
    drop(listener);
    port
}

fn tls_receiver_config(port: u16, output_dir: &std::path::Path, cert: &SelfSignedCert) -> ReceiverConfig {
    let mut config = ReceiverConfig::new(port, output_dir, "desk");
    config.tls = Some(TlsServerConfig {
        cert_path: cert.cert_path.clone(),
        key_path: cert.key_path.clone(),
    });
    config
}

#[tokio::test]
async fn fingerprint_pin_accepts_the_matching_certificate() {
    let source_dir = tempfile::tempdir().unwrap();
    let dest_dir = tempfile::tempdir().unwrap();
    let cert = SelfSignedCert::generate("127.0.0.1");
    let port = free_port().await;

    let (stop, _pairing) = core::start_receiver(tls_receiver_config(port, dest_dir.path(), &cert))
        .await
        .unwrap();

    let mut sender_config = SenderConfig::new("127.0.0.1", port);
    sender_config.tls = Some(TlsClientConfig {
        enabled: true,
        fingerprint: Some(cert.fingerprint.clone()),
        ..TlsClientConfig::default()
    });

    let entries = vec![entry(source_dir.path(), "a.txt", b"alpha")];
    let batch = core::send_entries(&entries, sender_config, &NullSink)
        .await
        .unwrap();

    assert_eq!(batch.file_count, 1);
    assert!(dest_dir.path().join("a.txt").exists());

    stop.stop().await;
}

#[tokio::test]
async fn fingerprint_pin_rejects_a_mismatched_certificate() {
    let source_dir = tempfile::tempdir().unwrap();
    let dest_dir = tempfile::tempdir().unwrap();
    let cert = SelfSignedCert::generate("127.0.0.1");
    let port = free_port().await;

    let (stop, _pairing) = core::start_receiver(tls_receiver_config(port, dest_dir.path(), &cert))
        .await
        .unwrap();

    let mut sender_config = SenderConfig::new("127.0.0.1", port);
    sender_config.tls = Some(TlsClientConfig {
        enabled: true,
        fingerprint: Some("0".repeat(64)),
        ..TlsClientConfig::default()
    });

    let entries = vec![entry(source_dir.path(), "a.txt", b"alpha")];
    let err = core::send_entries(&entries, sender_config, &NullSink)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("TLS fingerprint mismatch"));
    assert!(!dest_dir.path().join("a.txt").exists());

    stop.stop().await;
}

#[tokio::test]
async fn trust_on_first_use_detects_a_changed_certificate_on_restart() {
    let source_dir = tempfile::tempdir().unwrap();
    let dest_dir = tempfile::tempdir().unwrap();
    let known_hosts_dir = tempfile::tempdir().unwrap();
    let known_hosts_path = known_hosts_dir.path().join("known_hosts.json");

    let cert_a = SelfSignedCert::generate("127.0.0.1");
    let port = free_port().await;

    let (stop_a, _pairing) = core::start_receiver(tls_receiver_config(port, dest_dir.path(), &cert_a))
        .await
        .unwrap();

    let tofu_sender_config = |path: std::path::PathBuf| {
        let mut config = SenderConfig::new("127.0.0.1", port);
        config.tls = Some(TlsClientConfig {
            enabled: true,
            trust_on_first_use: true,
            known_hosts_path: Some(path),
            ..TlsClientConfig::default()
        });
        config
    };

    let first_entries = vec![entry(source_dir.path(), "a.txt", b"alpha")];
    core::send_entries(
        &first_entries,
        tofu_sender_config(known_hosts_path.clone()),
        &NullSink,
    )
    .await
    .unwrap();
    assert!(known_hosts_path.exists());

    stop_a.stop().await;

    let cert_b = SelfSignedCert::generate("127.0.0.1");
    let (stop_b, _pairing) = core::start_receiver(tls_receiver_config(port, dest_dir.path(), &cert_b))
        .await
        .unwrap();

    let second_entries = vec![entry(source_dir.path(), "b.txt", b"bravo")];
    let err = core::send_entries(
        &second_entries,
        tofu_sender_config(known_hosts_path.clone()),
        &NullSink,
    )
    .await
    .unwrap_err();

    assert!(err.to_string().contains("TLS fingerprint changed"));
    assert!(!dest_dir.path().join("b.txt").exists());

    stop_b.stop().await;
}
