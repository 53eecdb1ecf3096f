/// Disposer handle returned by every listener registration.
///
/// Dropping or calling [`Subscription::unsubscribe`] tears the listener down.
/// The disposer runs at most once, whichever happens first.
pub struct Subscription {
    dispose: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(dispose: impl FnOnce() + Send + 'static) -> Self {
        Self {
            dispose: Some(Box::new(dispose)),
        }
    }

    /// A subscription with nothing to tear down.
    pub fn noop() -> Self {
        Self { dispose: None }
    }

    /// Subscription that stops a spawned watcher task.
    pub fn from_task(handle: tokio::task::JoinHandle<()>) -> Self {
        Self::new(move || handle.abort())
    }

    pub fn unsubscribe(mut self) {
        self.run_disposer();
    }

    fn run_disposer(&mut self) {
        if let Some(dispose) = self.dispose.take() {
            dispose();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_disposer();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.dispose.is_some())
            .finish()
    }
}
