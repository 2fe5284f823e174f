//! Cross-crate scenarios that only `core` is positioned to exercise: a real
//! receiver accepting real TCP connections from a real sender, driven
//! entirely through the facade surface.

use std::sync::Arc;

use core::{ReceiverConfig, SenderConfig, TransferEntry};
use logging_sink::ProgressSink;

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

#[tokio::test]
async fn single_file_round_trip_is_acknowledged_in_full() {
    let source_dir = tempfile::tempdir().unwrap();
    let dest_dir = tempfile::tempdir().unwrap();
    let port = free_port().await;

    let data: Vec<u8> = (0..262_161_u32).map(|i| (i % 251) as u8).collect();
    let entries = vec![entry(source_dir.path(), "payload.bin", &data)];

    let receiver_config = ReceiverConfig::new(port, dest_dir.path(), "desk");
    let (stop, _pairing) = core::start_receiver(receiver_config).await.unwrap();

    let sender_config = SenderConfig::new("127.0.0.1", port);
    let batch = core::send_entries(&entries, sender_config, &NullSink)
        .await
        .unwrap();

    assert_eq!(batch.file_count, 1);
    assert_eq!(batch.total_bytes, 262_161);
    assert_eq!(batch.resumed_bytes, 0);
    assert_eq!(batch.results[0].resumed_from, 0);
    assert_eq!(batch.results[0].bytes_sent, 262_161);

    let received = dest_dir.path().join("payload.bin");
    assert_eq!(std::fs::read(&received).unwrap(), data);

    stop.stop().await;
}

#[tokio::test]
async fn interrupted_temp_file_is_resumed_from_its_existing_length() {
    let source_dir = tempfile::tempdir().unwrap();
    let dest_dir = tempfile::tempdir().unwrap();
    let port = free_port().await;

    let data: Vec<u8> = (0..614_403_u32).map(|i| (i % 199) as u8).collect();
    let source_entry = entry(source_dir.path(), "big.bin", &data);

    let sha256_hex = checksums::hash_file_hex(&source_entry.absolute_source_path).unwrap();
    let digest_prefix = &sha256_hex[..16];
    let temp_name = format!("big.bin.{digest_prefix}.local-sent.part");
    let prefix_len = 122_891_usize;
    std::fs::write(dest_dir.path().join(&temp_name), &data[..prefix_len]).unwrap();

    let receiver_config = ReceiverConfig::new(port, dest_dir.path(), "desk");
    let (stop, _pairing) = core::start_receiver(receiver_config).await.unwrap();

    let sender_config = SenderConfig::new("127.0.0.1", port);
    let batch = core::send_entries(&[source_entry], sender_config, &NullSink)
        .await
        .unwrap();

    assert_eq!(batch.results[0].resumed_from, prefix_len as u64);
    assert_eq!(batch.resumed_bytes, prefix_len as u64);

    let received = dest_dir.path().join("big.bin");
    assert_eq!(std::fs::read(&received).unwrap(), data);

    stop.stop().await;
}

#[tokio::test]
async fn fully_matching_temp_file_is_treated_as_already_complete() {
    let source_dir = tempfile::tempdir().unwrap();
    let dest_dir = tempfile::tempdir().unwrap();
    let port = free_port().await;

    let data: Vec<u8> = (0..5000_u32).map(|i| (i % 97) as u8).collect();
    let source_entry = entry(source_dir.path(), "done.bin", &data);

    let sha256_hex = checksums::hash_file_hex(&source_entry.absolute_source_path).unwrap();
    let digest_prefix = &sha256_hex[..16];
    let temp_name = format!("done.bin.{digest_prefix}.local-sent.part");
    std::fs::write(dest_dir.path().join(&temp_name), &data).unwrap();

    let receiver_config = ReceiverConfig::new(port, dest_dir.path(), "desk");
    let (stop, _pairing) = core::start_receiver(receiver_config).await.unwrap();

    let sender_config = SenderConfig::new("127.0.0.1", port);
    let batch = core::send_entries(&[source_entry], sender_config, &NullSink)
        .await
        .unwrap();

    assert_eq!(batch.results[0].resumed_from, data.len() as u64);
    assert_eq!(batch.results[0].bytes_sent, 0);
    assert_eq!(std::fs::read(dest_dir.path().join("done.bin")).unwrap(), data);

    stop.stop().await;
}

#[tokio::test]
async fn zero_byte_file_is_accepted_with_no_payload() {
    let source_dir = tempfile::tempdir().unwrap();
    let dest_dir = tempfile::tempdir().unwrap();
    let port = free_port().await;

    let entries = vec![entry(source_dir.path(), "empty.bin", b"")];

    let receiver_config = ReceiverConfig::new(port, dest_dir.path(), "desk");
    let (stop, _pairing) = core::start_receiver(receiver_config).await.unwrap();

    let sender_config = SenderConfig::new("127.0.0.1", port);
    let batch = core::send_entries(&entries, sender_config, &NullSink)
        .await
        .unwrap();

    assert_eq!(batch.results[0].bytes_sent, 0);
    assert_eq!(batch.results[0].resumed_from, 0);
    assert!(dest_dir.path().join("empty.bin").exists());
    assert_eq!(std::fs::read(dest_dir.path().join("empty.bin")).unwrap(), b"");

    stop.stop().await;
}

#[tokio::test]
async fn pair_once_batch_chains_the_rotated_code_across_entries() {
    let source_dir = tempfile::tempdir().unwrap();
    let dest_dir = tempfile::tempdir().unwrap();
    let port = free_port().await;

    let entries = vec![
        entry(source_dir.path(), "a.txt", b"alpha"),
        entry(source_dir.path(), "b.txt", b"bravo"),
    ];

    let mut receiver_config = ReceiverConfig::new(port, dest_dir.path(), "desk");
    receiver_config.pair_code = Some("123456".to_string());
    receiver_config.rotate_per_transfer = true;
    receiver_config.generate_pair_code = true;
    receiver_config.on_pair_code_change = Some(Arc::new(|_code: String| {}));

    let (stop, _pairing) = core::start_receiver(receiver_config).await.unwrap();

    let mut sender_config = SenderConfig::new("127.0.0.1", port);
    sender_config.pair_code = Some("123456".to_string());
    let batch = core::send_entries(&entries, sender_config, &NullSink)
        .await
        .unwrap();

    assert_eq!(batch.results.len(), 2);
    // the receiver rotates after every successful transfer; the sender
    // chains each rotated code into the next entry's header, so both
    // uploads succeed even though only the first used the initial code.
    assert!(batch.results[0].next_pair_code.is_some());
    assert!(batch.results[1].next_pair_code.is_some());
    assert_ne!(batch.results[0].next_pair_code, batch.results[1].next_pair_code);
    assert!(dest_dir.path().join("a.txt").exists());
    assert!(dest_dir.path().join("b.txt").exists());

    stop.stop().await;
}
