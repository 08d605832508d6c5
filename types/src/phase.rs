//! Phase derivation and cart/store consistency helpers.
//!
//! The phase is a read-only projection over [`AppState`]; there is no stored
//! state machine. The only transitions are the field mutations below, which
//! change what the projection reads.

use std::fmt;

use serde::Serialize;

use crate::state::{AppState, OrderStatus, PaymentStatus};

/// Where the user is in the auth -> browse -> cart -> order -> payment flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Unauth,
    AuthNoStore,
    PaymentPending,
    OrderPaid,
    OrderCanceled,
    OrderCreated,
    Quoted,
    CartDirty,
    Ready,
}

impl Phase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Phase::Unauth => "UNAUTH",
            Phase::AuthNoStore => "AUTH_NO_STORE",
            Phase::PaymentPending => "PAYMENT_PENDING",
            Phase::OrderPaid => "ORDER_PAID",
            Phase::OrderCanceled => "ORDER_CANCELED",
            Phase::OrderCreated => "ORDER_CREATED",
            Phase::Quoted => "QUOTED",
            Phase::CartDirty => "CART_DIRTY",
            Phase::Ready => "READY",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compute the phase. First match wins; a pending payment masks any order status.
#[must_use]
pub fn derive_phase(state: &AppState) -> Phase {
    if state.auth.is_none() {
        return Phase::Unauth;
    }
    if state.selected_store.is_none() {
        return Phase::AuthNoStore;
    }

    let payment_status = state.payment.as_ref().and_then(|p| p.status.as_ref());
    if matches!(payment_status, Some(PaymentStatus::Pending)) {
        return Phase::PaymentPending;
    }

    if let Some(order) = &state.order {
        return match order.status {
            Some(OrderStatus::Paid) => Phase::OrderPaid,
            Some(OrderStatus::Canceled) => Phase::OrderCanceled,
            _ => Phase::OrderCreated,
        };
    }

    if state.quote.is_some() {
        return Phase::Quoted;
    }
    if !state.cart.is_empty() {
        return Phase::CartDirty;
    }
    Phase::Ready
}

/// Largest cart version accepted from a session file: the largest integer a
/// JSON number holds exactly. Versions only reach it through a load, so every
/// bump from a loaded or fresh state still lands on a larger value.
pub const MAX_CART_VERSION: u64 = (1 << 53) - 1;

/// Advance the cart version and drop artifacts computed against the old cart.
///
/// Saturates at `u64::MAX`; loads reject anything above [`MAX_CART_VERSION`].
pub fn bump_cart_version(state: &mut AppState) {
    state.cart_version = state.cart_version.saturating_add(1);
    state.quote = None;
    state.pending_create_payload = None;
}

/// Clear everything scoped to the previously selected store.
pub fn reset_for_store_switch(state: &mut AppState) {
    state.cart.clear();
    bump_cart_version(state);
    state.order = None;
    state.payment = None;
}
