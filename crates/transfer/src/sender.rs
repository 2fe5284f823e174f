use std::path::Path;
use std::time::Instant;

use logging_sink::{should_emit, Direction, ProgressEvent, ProgressSink};
use protocol::framing::{expect_type, FrameIo};
use protocol::wire::{Ack, Ready, TransferHeader};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::{info, warn};
use transport::{BoxedStream, ClientTrust};
use walk::TransferEntry;

use crate::error::TransferError;

/// How the sender should connect to the receiver.
#[derive(Debug, Clone)]
pub enum Connector {
    Plain,
    Tls(ClientTrust),
}

/// Per-batch send configuration.
pub struct SendOptions<'a> {
    pub host: &'a str,
    pub port: u16,
    pub connector: Connector,
    pub pair_code: Option<String>,
}

/// Outcome of sending one entry.
#[derive(Debug, Clone)]
pub struct EntryResult {
    pub relative_path: String,
    pub resumed_from: u64,
    pub bytes_sent: u64,
    pub next_pair_code: Option<String>,
}

/// Outcome of a whole batch.
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    pub file_count: u64,
    pub total_bytes: u64,
    pub resumed_bytes: u64,
    pub results: Vec<EntryResult>,
}

const CHUNK_SIZE: usize = 64 * 1024;

/// Sends `entries` to `host:port` sequentially, chaining the pair code
/// across entries when the receiver rotates it (component C7).
pub async fn send_entries(
    entries: &[TransferEntry],
    options: SendOptions<'_>,
    progress: &dyn ProgressSink,
) -> Result<BatchResult, TransferError> {
    let mut pair_code = options.pair_code;
    let mut batch = BatchResult::default();

    for entry in entries {
        let result = send_one(
            entry,
            options.host,
            options.port,
            &options.connector,
            pair_code.clone(),
            progress,
        )
        .await?;

        batch.file_count += 1;
        batch.total_bytes += entry.size_bytes;
        batch.resumed_bytes += result.resumed_from;
        pair_code = result.next_pair_code.clone().or(pair_code);
        batch.results.push(result);
    }

    Ok(batch)
}

async fn send_one(
    entry: &TransferEntry,
    host: &str,
    port: u16,
    connector: &Connector,
    pair_code: Option<String>,
    progress: &dyn ProgressSink,
) -> Result<EntryResult, TransferError> {
    let metadata = tokio::fs::metadata(&entry.absolute_source_path).await?;
    if !metadata.is_file() {
        return Err(TransferError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "source is not a regular file",
        )));
    }

    let source = entry.absolute_source_path.clone();
    let sha256_hex = tokio::task::spawn_blocking(move || checksums::hash_file_hex(&source))
        .await
        .expect("hashing task panicked")?;

    let stream: BoxedStream = match connector {
        Connector::Plain => transport::connect_plain(host, port).await?,
        Connector::Tls(trust) => transport::connect_tls(host, port, trust).await?,
    };
    let mut io = FrameIo::new(stream);

    let header = TransferHeader::new(
        entry.relative_path.clone(),
        entry.size_bytes,
        sha256_hex.clone(),
        pair_code,
    );
    io.write_frame(&header).await?;

    let ready: Ready = io.read_frame("ready").await?;
    expect_type("ready", &ready.frame_type)?;
    if !ready.ok {
        return Err(TransferError::RejectedByReceiver(
            ready.message.unwrap_or_else(|| "rejected".to_string()),
        ));
    }
    if ready.offset > entry.size_bytes {
        return Err(TransferError::InvalidResumeOffset);
    }

    let bytes_sent = if ready.offset < entry.size_bytes {
        stream_payload(&entry.relative_path, &entry.absolute_source_path, ready.offset, entry.size_bytes, &mut io, progress)
            .await?
    } else {
        0
    };
    io.shutdown_write().await?;

    let ack: Ack = io.read_frame("ack").await?;
    expect_type("ack", &ack.frame_type)?;
    if !ack.ok {
        return Err(TransferError::AckFailed(
            ack.message.unwrap_or_else(|| "unknown failure".to_string()),
        ));
    }

    info!(
        relative_path = %entry.relative_path,
        resumed_from = ready.offset,
        "entry sent and acknowledged"
    );

    Ok(EntryResult {
        relative_path: entry.relative_path.clone(),
        resumed_from: ready.offset,
        bytes_sent,
        next_pair_code: ack.next_pair_code,
    })
}

#[allow(clippy::too_many_arguments)]
async fn stream_payload(
    relative_path: &str,
    source_path: &Path,
    offset: u64,
    total_size: u64,
    io: &mut FrameIo<BoxedStream>,
    progress: &dyn ProgressSink,
) -> Result<u64, TransferError> {
    let mut file = tokio::fs::File::open(source_path).await?;
    if offset > 0 {
        file.seek(std::io::SeekFrom::Start(offset)).await?;
    }

    let mut buf = vec![0_u8; CHUNK_SIZE];
    let mut sent = offset;
    let started = Instant::now();
    let mut last_emitted_at: Option<std::time::Instant> = None;
    let mut last_percent = percent(sent, total_size);

    loop {
        let read = file.read(&mut buf).await?;
        if read == 0 {
            break;
        }
        io.write_payload(&buf[..read]).await?;
        sent += read as u64;

        let current_percent = percent(sent, total_size);
        if should_emit(last_emitted_at, last_percent, current_percent) {
            let elapsed = started.elapsed().as_secs_f64().max(0.001);
            progress.emit(&ProgressEvent {
                direction: Direction::Send,
                name: relative_path.to_string(),
                transferred_bytes: sent,
                total_bytes: total_size,
                bytes_per_second: (sent - offset) as f64 / elapsed,
            });
            last_emitted_at = Some(std::time::Instant::now());
            last_percent = current_percent;
        }
    }

    if sent != total_size {
        warn!(relative_path, sent, total_size, "file size changed during send");
    }

    Ok(sent - offset)
}

fn percent(transferred: u64, total: u64) -> f64 {
    if total == 0 {
        100.0
    } else {
        (transferred as f64 / total as f64) * 100.0
    }
}
