use std::sync::Arc;
use std::sync::Mutex;

use tokio::time::{Duration, Instant};
use tracing::{debug, info};

use crate::error::PairingError;
use crate::generator::{generate_distinct, PairCodeGenerator};

struct Inner {
    current_code: Option<String>,
    previous_code: Option<String>,
    previous_valid_until: Option<Instant>,
    active_transfers: u64,
    rotate_per_transfer: bool,
    ttl: Option<Duration>,
    generator: Option<Arc<dyn PairCodeGenerator>>,
}

impl Inner {
    fn admit(&self, pair_code: Option<&str>) -> Result<(), PairingError> {
        let Some(current) = self.current_code.as_deref() else {
            return Ok(());
        };
        if pair_code == Some(current) {
            return Ok(());
        }
        if let (Some(previous), Some(valid_until)) =
            (self.previous_code.as_deref(), self.previous_valid_until)
        {
            if pair_code == Some(previous) && Instant::now() <= valid_until {
                return Ok(());
            }
        }
        Err(PairingError::Mismatch)
    }
}

/// Shared, mutation-serialized pairing state (component C4).
///
/// Cloning a handle is cheap and shares the same underlying state; this is
/// how the receiver engine hands the same pairing state to every inbound
/// session task.
#[derive(Clone)]
pub struct PairingHandle(Arc<Mutex<Inner>>);

/// RAII guard tracking one in-flight inbound session. Holding a guard is
/// what prevents a TTL rotation from firing underneath that session.
pub struct SessionGuard(PairingHandle);

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let mut inner = self.0 .0.lock().unwrap();
        inner.active_transfers = inner.active_transfers.saturating_sub(1);
    }
}

impl PairingHandle {
    /// Builds pairing state. `initial_code` is `None` for an unpaired
    /// receiver that admits any header. `ttl` configures periodic
    /// rotation; `rotate_per_transfer` configures post-ack rotation.
    /// `generator` is required whenever either rotation mode is enabled.
    #[must_use]
    pub fn new(
        initial_code: Option<String>,
        rotate_per_transfer: bool,
        ttl: Option<Duration>,
        generator: Option<Arc<dyn PairCodeGenerator>>,
    ) -> Self {
        Self(Arc::new(Mutex::new(Inner {
            current_code: initial_code,
            previous_code: None,
            previous_valid_until: None,
            active_transfers: 0,
            rotate_per_transfer,
            ttl,
            generator,
        })))
    }

    /// Marks one inbound session as in-flight. The returned guard must be
    /// held for the lifetime of the session; dropping it (including on an
    /// early return or panic unwind) decrements the counter.
    #[must_use]
    pub fn begin_session(&self) -> SessionGuard {
        self.0.lock().unwrap().active_transfers += 1;
        SessionGuard(self.clone())
    }

    /// Checks `pair_code` against the current admission rules. Call this
    /// only after [`PairingHandle::begin_session`] so the increment is
    /// visible to a concurrent TTL tick before the check runs.
    pub fn admit(&self, pair_code: Option<&str>) -> Result<(), PairingError> {
        self.0.lock().unwrap().admit(pair_code)
    }

    /// Rotates the pair code after a successful transfer, if per-transfer
    /// rotation is configured. Returns the freshly generated code, which
    /// the caller embeds in the ack's `next_pair_code` field.
    pub fn rotate_after_success(&self) -> Result<Option<String>, PairingError> {
        let mut inner = self.0.lock().unwrap();
        if !inner.rotate_per_transfer {
            return Ok(None);
        }
        let generator = inner.generator.clone().ok_or(PairingError::NoGenerator)?;
        let next = generate_distinct(generator.as_ref(), inner.current_code.as_deref());
        inner.current_code = Some(next.clone());
        inner.previous_code = None;
        inner.previous_valid_until = None;
        Ok(Some(next))
    }

    /// Runs one TTL-driven rotation tick. Skipped silently if a session is
    /// in flight; otherwise advances `current` to a new code and keeps the
    /// old code valid as `previous` for one further TTL window. Returns
    /// the new current code when a rotation actually happened.
    fn rotate_on_tick(&self) -> Option<String> {
        let mut inner = self.0.lock().unwrap();
        if inner.active_transfers > 0 {
            debug!("ttl rotation tick skipped: session in flight");
            return None;
        }
        let generator = inner.generator.clone()?;
        let ttl = inner.ttl?;
        let old_current = inner.current_code.clone();
        let next = generate_distinct(generator.as_ref(), old_current.as_deref());
        inner.previous_code = old_current;
        inner.previous_valid_until = Some(Instant::now() + ttl);
        inner.current_code = Some(next.clone());
        info!("pair code rotated by ttl tick");
        Some(next)
    }

    /// Returns a snapshot of the current pair code, for diagnostics.
    #[must_use]
    pub fn current_code(&self) -> Option<String> {
        self.0.lock().unwrap().current_code.clone()
    }
}

/// Spawns the periodic TTL rotation task, if `ttl_seconds` is configured.
/// Returns `None` when TTL rotation is not enabled. The returned handle's
/// task is aborted when it is dropped. `on_rotate`, if given, is invoked
/// with the new current code whenever a tick actually rotates it.
pub fn spawn_ttl_rotation(
    handle: PairingHandle,
    ttl_seconds: Option<u64>,
    on_rotate: Option<Arc<dyn Fn(String) + Send + Sync>>,
) -> Option<tokio::task::JoinHandle<()>> {
    let ttl_seconds = ttl_seconds?;
    let period = Duration::from_secs(ttl_seconds);
    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await; // first tick fires immediately; consume it
        loop {
            ticker.tick().await;
            if let Some(new_code) = handle.rotate_on_tick() {
                if let Some(callback) = &on_rotate {
                    callback(new_code);
                }
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::PairCodeGenerator;
    use std::sync::Mutex as StdMutex;

    struct Sequence(StdMutex<std::vec::IntoIter<&'static str>>);

    impl PairCodeGenerator for Sequence {
        fn generate(&self) -> String {
            self.0
                .lock()
                .unwrap()
                .next()
                .unwrap_or("000000")
                .to_string()
        }
    }

    fn seq(codes: &[&'static str]) -> Arc<dyn PairCodeGenerator> {
        Arc::new(Sequence(StdMutex::new(codes.to_vec().into_iter())))
    }

    #[test]
    fn null_current_code_admits_anything() {
        let handle = PairingHandle::new(None, false, None, None);
        assert!(handle.admit(None).is_ok());
        assert!(handle.admit(Some("000000")).is_ok());
    }

    #[test]
    fn requires_matching_code_when_configured() {
        let handle = PairingHandle::new(Some("123456".into()), false, None, None);
        assert!(handle.admit(Some("123456")).is_ok());
        assert!(matches!(
            handle.admit(Some("000000")),
            Err(PairingError::Mismatch)
        ));
        assert!(matches!(handle.admit(None), Err(PairingError::Mismatch)));
    }

    #[test]
    fn per_transfer_rotation_updates_current_and_clears_previous() {
        let handle = PairingHandle::new(
            Some("123456".into()),
            true,
            None,
            Some(seq(&["654321"])),
        );
        let next = handle.rotate_after_success().unwrap();
        assert_eq!(next.as_deref(), Some("654321"));
        assert!(handle.admit(Some("654321")).is_ok());
        assert!(handle.admit(Some("123456")).is_err());
    }

    #[test]
    fn rotation_without_generator_is_an_error() {
        let handle = PairingHandle::new(Some("123456".into()), true, None, None);
        assert!(matches!(
            handle.rotate_after_success(),
            Err(PairingError::NoGenerator)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn ttl_rotation_keeps_previous_valid_during_grace() {
        let handle = PairingHandle::new(
            Some("777777".into()),
            false,
            Some(Duration::from_secs(2)),
            Some(seq(&["888888"])),
        );
        handle.rotate_on_tick();
        assert!(handle.admit(Some("777777")).is_ok());
        assert!(handle.admit(Some("888888")).is_ok());

        tokio::time::advance(Duration::from_secs(3)).await;
        assert!(handle.admit(Some("777777")).is_err());
        assert!(handle.admit(Some("888888")).is_ok());
    }

    #[test]
    fn ttl_tick_is_skipped_while_a_session_is_in_flight() {
        let handle = PairingHandle::new(
            Some("777777".into()),
            false,
            Some(Duration::from_secs(2)),
            Some(seq(&["888888"])),
        );
        let guard = handle.begin_session();
        handle.rotate_on_tick();
        assert_eq!(handle.current_code().as_deref(), Some("777777"));
        drop(guard);
        handle.rotate_on_tick();
        assert_eq!(handle.current_code().as_deref(), Some("888888"));
    }
}
