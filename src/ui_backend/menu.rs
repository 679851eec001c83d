//! Scoped menu subscription
//!
//! Opening a menu acquires a subscription that stands in for the "click
//! outside closes it" listener. Dropping the subscription closes the menu,
//! whichever path drops it.

use super::state::SharedState;
use super::types::MenuKind;

#[derive(Debug)]
pub struct MenuSubscription {
    state: SharedState,
    kind: MenuKind,
    token: u64,
}

impl MenuSubscription {
    pub fn acquire(state: &SharedState, kind: MenuKind) -> Self {
        let token = state.claim_menu(kind);
        tracing::trace!(?kind, token, "Menu opened");
        Self {
            state: state.clone(),
            kind,
            token,
        }
    }

    pub fn kind(&self) -> MenuKind {
        self.kind
    }
}

impl Drop for MenuSubscription {
    fn drop(&mut self) {
        if self.state.release_menu(self.token) {
            tracing::trace!(kind = ?self.kind, token = self.token, "Menu closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_closes_menu() {
        let state = SharedState::default();
        {
            let sub = MenuSubscription::acquire(&state, MenuKind::ModeSwitcher);
            assert_eq!(sub.kind(), MenuKind::ModeSwitcher);
            assert_eq!(state.open_menu(), Some(MenuKind::ModeSwitcher));
        }
        assert!(state.open_menu().is_none());
    }

    #[test]
    fn test_replaced_subscription_does_not_close_successor() {
        let state = SharedState::default();
        let first = MenuSubscription::acquire(&state, MenuKind::ModeSwitcher);
        let second = MenuSubscription::acquire(&state, MenuKind::Actions);

        drop(first);
        assert_eq!(state.open_menu(), Some(MenuKind::Actions));
        drop(second);
        assert!(state.open_menu().is_none());
    }
}
