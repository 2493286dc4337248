use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// A cloneable handle used to stop frame generation cooperatively.
///
/// Every clone shares the same flag, so a token handed to a signal handler
/// or another thread cancels the sequence that was generated with it.
///
/// # Example
///
/// ```
/// use morpher_morph::CancelToken;
///
/// let token = CancelToken::new();
/// let handle = token.clone();
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
