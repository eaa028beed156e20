//! Binding configuration

use crate::error::FirestoreError;
use std::rc::Rc;

/// Handler invoked with snapshot listener errors
pub type ErrorHandler = Rc<dyn Fn(&FirestoreError)>;

/// Options for configuring a binding
///
/// # Example
/// ```
/// use reactive_firestore::BindOptions;
///
/// let options = BindOptions::new()
///     .with_error_handler(|err| eprintln!("listener failed: {err}"));
/// assert!(options.error_handler.is_some());
/// ```
#[derive(Clone, Default)]
pub struct BindOptions {
    /// Called with errors delivered by the snapshot listener
    ///
    /// Errors never reach the bound value. When unset, errors are logged
    /// with `tracing::error!`.
    ///
    /// Default: None
    pub error_handler: Option<ErrorHandler>,
}

impl BindOptions {
    /// Creates default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Route listener errors to `handler`
    pub fn with_error_handler(mut self, handler: impl Fn(&FirestoreError) + 'static) -> Self {
        self.error_handler = Some(Rc::new(handler));
        self
    }

    pub(crate) fn handle_error(&self, error: &FirestoreError) {
        match &self.error_handler {
            Some(handler) => handler(error),
            None => tracing::error!(%error, "snapshot listener failed"),
        }
    }
}

impl std::fmt::Debug for BindOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindOptions")
            .field("error_handler", &self.error_handler.is_some())
            .finish()
    }
}
