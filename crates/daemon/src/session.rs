//! Per-connection handling of the receiver side of a transfer (spec
//! component C8): header validation, pair admission, the optional confirm
//! hook, duplicate-aware target selection, resumable payload reception,
//! digest verification, and promotion of the finished file.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use logging_sink::{should_emit, Direction, ProgressEvent, ProgressSink};
use pairing::PairingHandle;
use protocol::framing::{expect_type, FrameIo};
use protocol::wire::{Ack, Ready, TransferHeader};
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use transport::BoxedStream;

use crate::confirm::{ConfirmHook, ConfirmRequest};
use crate::error::DaemonError;
use crate::target::{self, Selection};

const READ_CHUNK: usize = 64 * 1024;

/// Everything a connection handler needs that outlives any one session.
pub struct SessionContext {
    pub output_dir: PathBuf,
    pub pairing: PairingHandle,
    pub confirm: Option<Arc<dyn ConfirmHook>>,
    pub on_pair_code_change: Option<Arc<dyn Fn(String) + Send + Sync>>,
    pub progress: Arc<dyn ProgressSink>,
}

/// Runs one inbound transfer end to end. Rejections the protocol itself
/// models (bad pair code, confirm hook says no) return `Ok(())` after
/// telling the peer; only transport/filesystem failures and protocol
/// violations surface as `Err`.
pub async fn handle_connection(
    stream: BoxedStream,
    peer_addr: SocketAddr,
    ctx: &SessionContext,
) -> Result<(), DaemonError> {
    let _session_guard = ctx.pairing.begin_session();
    let mut io = FrameIo::new(stream);

    let header: TransferHeader = io.read_frame("header").await?;
    expect_type("header", &header.frame_type)?;

    if header.version != protocol::wire::PROTOCOL_VERSION {
        return reject(&mut io, format!("unsupported protocol version {}", header.version)).await;
    }
    if !checksums::hex::is_valid_sha256_hex(&header.sha256_hex) {
        return reject(&mut io, "malformed sha256_hex").await;
    }

    if let Err(err) = ctx.pairing.admit(header.pair_code.as_deref()) {
        warn!(peer = %peer_addr, "rejected: {err}");
        return reject(&mut io, err.to_string()).await;
    }

    if let Some(hook) = &ctx.confirm {
        let request = ConfirmRequest {
            from: peer_addr.ip().to_string(),
            relative_path: header.relative_path.clone(),
            file_size: header.file_size,
        };
        let decision = hook.confirm(request).await;
        if !decision.accept {
            let message = decision.message.unwrap_or_else(|| "rejected by operator".to_string());
            return reject(&mut io, message).await;
        }
    }

    let selection = target::select_target(&ctx.output_dir, &header.relative_path, &header.sha256_hex)?;
    if let Some(parent) = selection.temp_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let resume = crate::resume::compute_resume(&selection.temp_path, header.file_size, &header.sha256_hex)?;

    io.write_frame(&Ready::accept(resume.offset, selection.final_path.to_string_lossy())).await?;

    let mut hasher = resume.hasher;
    let mut received = resume.offset;

    if !resume.already_complete {
        received = receive_payload(
            &mut io,
            &selection.temp_path,
            &header.relative_path,
            resume.offset,
            header.file_size,
            &mut hasher,
            ctx.progress.as_ref(),
        )
        .await?;
    }

    let digest_hex = hasher.finalize_hex();
    if digest_hex != header.sha256_hex {
        let _ = tokio::fs::remove_file(&selection.temp_path).await;
        io.write_frame(&Ack::failure(format!(
            "sha256 mismatch: expected {}, computed {digest_hex}",
            header.sha256_hex
        )))
        .await?;
        return Err(DaemonError::DigestMismatch {
            expected: header.sha256_hex,
            got: digest_hex,
        });
    }

    let final_path = promote(selection).await?;
    ctx.progress
        .emit_line(&logging_sink::format_receive_outcome(Ok(&final_path.to_string_lossy())));

    let next_pair_code = ctx.pairing.rotate_after_success()?;
    if let (Some(code), Some(callback)) = (&next_pair_code, &ctx.on_pair_code_change) {
        callback(code.clone());
    }

    io.write_frame(&Ack::success(
        header.sha256_hex,
        received,
        final_path.to_string_lossy(),
        resume.offset,
        next_pair_code,
    ))
    .await?;
    io.shutdown_write().await.ok();

    info!(relative_path = %header.relative_path, received, "transfer complete");
    Ok(())
}

async fn reject(
    io: &mut FrameIo<BoxedStream>,
    message: impl Into<String>,
) -> Result<(), DaemonError> {
    io.write_frame(&Ready::reject(message)).await?;
    io.shutdown_write().await.ok();
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn receive_payload(
    io: &mut FrameIo<BoxedStream>,
    temp_path: &Path,
    relative_path: &str,
    offset: u64,
    file_size: u64,
    hasher: &mut checksums::StreamingHasher,
    progress: &dyn ProgressSink,
) -> Result<u64, DaemonError> {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .append(offset > 0)
        .truncate(offset == 0)
        .open(temp_path)
        .await?;

    let mut buf = vec![0_u8; READ_CHUNK];
    let mut received = offset;
    let started = Instant::now();
    let mut last_emitted_at: Option<Instant> = None;
    let mut last_percent = percent(received, file_size);

    while received < file_size {
        let n = io.read_payload(&mut buf).await?;
        if n == 0 {
            return Err(DaemonError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "connection closed before payload complete",
            )));
        }
        if received + n as u64 > file_size {
            return Err(DaemonError::SizeMismatch {
                declared: file_size,
                received: received + n as u64,
            });
        }
        hasher.update(&buf[..n]);
        file.write_all(&buf[..n]).await?;
        received += n as u64;

        let current_percent = percent(received, file_size);
        if should_emit(last_emitted_at, last_percent, current_percent) {
            let elapsed = started.elapsed().as_secs_f64().max(0.001);
            progress.emit(&ProgressEvent {
                direction: Direction::Receive,
                name: relative_path.to_string(),
                transferred_bytes: received,
                total_bytes: file_size,
                bytes_per_second: (received - offset) as f64 / elapsed,
            });
            last_emitted_at = Some(Instant::now());
            last_percent = current_percent;
        }
    }

    file.flush().await?;
    Ok(received)
}

fn percent(transferred: u64, total: u64) -> f64 {
    if total == 0 {
        100.0
    } else {
        (transferred as f64 / total as f64) * 100.0
    }
}

/// Moves a completed temp file to its final name, advancing past the
/// duplicate-suffix index on a race with another session and falling back
/// to copy-then-remove across filesystems (`EXDEV`).
///
/// Uses `hard_link` rather than `rename` for the non-clobbering case: a
/// plain rename silently replaces an existing destination file on both
/// Unix and Windows, which would defeat duplicate-aware naming if another
/// session claimed `final_path` between selection and promotion.
async fn promote(selection: Selection) -> Result<PathBuf, DaemonError> {
    let Selection {
        temp_path,
        mut final_path,
        mut index,
        base_file_name,
        ..
    } = selection;
    let parent = final_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    loop {
        match tokio::fs::hard_link(&temp_path, &final_path).await {
            Ok(()) => {
                tokio::fs::remove_file(&temp_path).await?;
                return Ok(final_path);
            }
            Err(err) if is_cross_device(&err) => {
                tokio::fs::copy(&temp_path, &final_path).await?;
                tokio::fs::remove_file(&temp_path).await?;
                return Ok(final_path);
            }
            Err(err) if is_name_collision(&err) => {
                index += 1;
                if index >= pathsafe::MAX_DUPLICATE_ATTEMPTS {
                    return Err(DaemonError::Path(pathsafe::PathError::NoFreeName {
                        attempts: pathsafe::MAX_DUPLICATE_ATTEMPTS,
                    }));
                }
                final_path = parent.join(pathsafe::duplicate_candidate(&base_file_name, index));
            }
            Err(err) => return Err(DaemonError::Io(err)),
        }
    }
}

fn is_cross_device(err: &std::io::Error) -> bool {
    #[cfg(unix)]
    {
        err.raw_os_error() == Some(libc::EXDEV)
    }
    #[cfg(not(unix))]
    {
        let _ = err;
        false
    }
}

fn is_name_collision(err: &std::io::Error) -> bool {
    if err.kind() == std::io::ErrorKind::AlreadyExists {
        return true;
    }
    #[cfg(unix)]
    {
        matches!(err.raw_os_error(), Some(libc::EEXIST) | Some(libc::ENOTEMPTY))
    }
    #[cfg(not(unix))]
    {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn promote_renames_temp_to_final() {
        let dir = tempfile::tempdir().unwrap();
        let temp_path = dir.path().join("a.txt.abc.local-sent.part");
        tokio::fs::write(&temp_path, b"hello").await.unwrap();

        let selection = Selection {
            final_path: dir.path().join("a.txt"),
            temp_path: temp_path.clone(),
            reused_temp: false,
            index: 0,
            base_file_name: "a.txt".to_string(),
        };

        let final_path = promote(selection).await.unwrap();
        assert_eq!(final_path, dir.path().join("a.txt"));
        assert!(!temp_path.exists());
        assert_eq!(tokio::fs::read(&final_path).await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn promote_advances_index_on_final_path_collision() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("a.txt"), b"existing").await.unwrap();
        let temp_path = dir.path().join("a.txt.abc.local-sent.part");
        tokio::fs::write(&temp_path, b"incoming").await.unwrap();

        let selection = Selection {
            final_path: dir.path().join("a.txt"),
            temp_path: temp_path.clone(),
            reused_temp: false,
            index: 0,
            base_file_name: "a.txt".to_string(),
        };

        let final_path = promote(selection).await.unwrap();
        assert_eq!(final_path, dir.path().join("a(1).txt"));
    }
}
