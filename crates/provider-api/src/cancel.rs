use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex, Weak};

/// Shared state behind a [`CancellationToken`] and all of its clones.
struct TokenState {
    cancelled: AtomicBool,
    children: Mutex<Vec<Weak<TokenState>>>,
}

impl TokenState {
    fn cancel(&self) {
        self.cancelled.store(true, AtomicOrdering::Release);

        let children = match self.children.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        for child in children {
            if let Some(child) = child.upgrade() {
                child.cancel();
            }
        }
    }
}

/// Checkable flag marking a query generation as superseded.
///
/// Clones share one flag; staleness must always be decided by the flag, never
/// by token identity, because every provider call issued for one generation
/// shares that generation's token. Child tokens are cancelled together with
/// their parent but can also be cancelled individually, which is how a
/// per-provider metadata fetch is superseded without disturbing its siblings.
#[derive(Clone)]
pub struct CancellationToken {
    state: Arc<TokenState>,
}

impl CancellationToken {
    /// Create a fresh, uncancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(TokenState {
                cancelled: AtomicBool::new(false),
                children: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called on this
    /// token or any ancestor.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(AtomicOrdering::Acquire)
    }

    /// Mark the token (and every linked child) as cancelled.
    pub fn cancel(&self) {
        self.state.cancel();
    }

    /// Create a token linked to this one: cancelling the parent cancels the
    /// child, while cancelling the child leaves the parent untouched.
    #[must_use]
    pub fn child(&self) -> CancellationToken {
        let child = CancellationToken::new();
        if self.is_cancelled() {
            child.cancel();
            return child;
        }

        match self.state.children.lock() {
            Ok(mut children) => children.push(Arc::downgrade(&child.state)),
            Err(poisoned) => poisoned.into_inner().push(Arc::downgrade(&child.state)),
        }
        // The parent may have been cancelled while the child was being
        // linked; re-check so the child can never outlive that cancellation.
        if self.is_cancelled() {
            child.cancel();
        }
        child
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_uncancelled_and_cancels_once() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        token.cancel();
        assert!(token.is_cancelled());
        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn clones_share_the_flag() {
        let token = CancellationToken::new();
        let clone = token.clone();
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn cancelling_parent_cancels_children() {
        let parent = CancellationToken::new();
        let child = parent.child();
        let grandchild = child.child();
        parent.cancel();
        assert!(child.is_cancelled());
        assert!(grandchild.is_cancelled());
    }

    #[test]
    fn cancelling_child_leaves_parent_untouched() {
        let parent = CancellationToken::new();
        let child = parent.child();
        child.cancel();
        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());
    }

    #[test]
    fn child_of_cancelled_parent_starts_cancelled() {
        let parent = CancellationToken::new();
        parent.cancel();
        assert!(parent.child().is_cancelled());
    }
}
