use tokio::sync::watch;

/// UI state snapshot with a loading flag.
pub(crate) trait LoadingState: Clone {
    fn is_loading(&self) -> bool;
    fn with_loading(&self, is_loading: bool) -> Self;
}

/// Marks a submission as in flight for as long as it is held. Dropping it clears the loading
/// flag, whether the submission finished, failed or was cancelled.
pub(crate) struct InFlight<'a, S: LoadingState> {
    state: &'a watch::Sender<S>,
}

impl<'a, S: LoadingState> InFlight<'a, S> {
    /// Sets the loading flag. Returns `None` if another submission already holds it.
    pub(crate) fn begin(state: &'a watch::Sender<S>) -> Option<InFlight<'a, S>> {
        let acquired = state.send_if_modified(|s| {
            if s.is_loading() {
                false
            } else {
                *s = s.with_loading(true);
                true
            }
        });
        acquired.then_some(InFlight { state })
    }
}

impl<S: LoadingState> Drop for InFlight<'_, S> {
    fn drop(&mut self) {
        self.state.send_modify(|s| *s = s.with_loading(false));
    }
}

/// Replaces the snapshot with the one built by `f`.
pub(crate) fn update<S>(state: &watch::Sender<S>, f: impl FnOnce(&S) -> S) {
    state.send_modify(|s| *s = f(s));
}
