use std::future::Future;
use std::pin::Pin;

/// What a [`ConfirmHook`] is asked about before a transfer proceeds.
#[derive(Debug, Clone)]
pub struct ConfirmRequest {
    pub from: String,
    pub relative_path: String,
    pub file_size: u64,
}

/// A [`ConfirmHook`]'s answer.
#[derive(Debug, Clone)]
pub struct ConfirmDecision {
    pub accept: bool,
    pub message: Option<String>,
}

impl ConfirmDecision {
    #[must_use]
    pub fn accept() -> Self {
        Self {
            accept: true,
            message: None,
        }
    }

    #[must_use]
    pub fn reject(message: impl Into<String>) -> Self {
        Self {
            accept: false,
            message: Some(message.into()),
        }
    }
}

impl From<bool> for ConfirmDecision {
    fn from(accept: bool) -> Self {
        Self {
            accept,
            message: None,
        }
    }
}

/// A future returned by [`ConfirmHook::confirm`]. Boxed so the trait stays
/// object-safe without pulling in an async-trait macro for a single method.
pub type ConfirmFuture<'a> = Pin<Box<dyn Future<Output = ConfirmDecision> + Send + 'a>>;

/// Invoked between header validation and `ready` emission (component C9).
/// Absence means auto-accept.
pub trait ConfirmHook: Send + Sync {
    fn confirm(&self, request: ConfirmRequest) -> ConfirmFuture<'_>;
}

impl<F> ConfirmHook for F
where
    F: Fn(ConfirmRequest) -> ConfirmFuture<'static> + Send + Sync,
{
    fn confirm(&self, request: ConfirmRequest) -> ConfirmFuture<'_> {
        self(request)
    }
}
