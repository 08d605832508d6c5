//! Phase derivation and cart consistency, through the public types API.

use chagee_types::{
    AppState, AuthInfo, CartItem, OrderSnapshot, OrderStatus, PaymentSnapshot, PaymentStatus,
    Phase, StoreRef, bump_cart_version, derive_phase, reset_for_store_switch,
};
use serde_json::json;

fn authed_with_store() -> AppState {
    let mut state = AppState::initial();
    state.auth = Some(AuthInfo::new("u1", "t"));
    state.selected_store = Some(StoreRef::new("S1"));
    state
}

#[test]
fn mid_cart_is_cart_dirty() {
    let mut state = authed_with_store();
    state.cart = vec![CartItem::new("A", 2)];
    state.cart_version = 3;

    assert_eq!(derive_phase(&state), Phase::CartDirty);
}

#[test]
fn payment_pending_outranks_paid_order() {
    let mut state = authed_with_store();
    state.order = Some(OrderSnapshot::with_status(OrderStatus::Paid));
    state.payment = Some(PaymentSnapshot::with_status(PaymentStatus::Pending));

    assert_eq!(derive_phase(&state), Phase::PaymentPending);
}

#[test]
fn phase_ignores_unrelated_fields() {
    let mut a = authed_with_store();
    a.cart = vec![CartItem::new("A", 1)];
    let mut b = a.clone();
    b.session.region = "MY".to_string();
    b.cart_version = 99;
    b.menu_cache = vec![json!({ "sku": "A" })];
    b.pending_login_phone = Some("+6580000000".to_string());

    assert_eq!(derive_phase(&a), derive_phase(&b));
}

#[test]
fn bump_invalidates_quote_and_payload() {
    let mut state = authed_with_store();
    state.quote = Some(serde_json::Map::new());
    state.pending_create_payload = Some(serde_json::Map::new());
    state.cart_version = 7;

    bump_cart_version(&mut state);

    assert_eq!(state.cart_version, 8);
    assert!(state.quote.is_none());
    assert!(state.pending_create_payload.is_none());
}

#[test]
fn store_switch_clears_store_scoped_state() {
    let mut state = authed_with_store();
    state.cart = vec![CartItem::new("A", 1)];
    state.cart_version = 4;
    state.quote = Some(serde_json::Map::new());
    state.order = Some(OrderSnapshot::with_status(OrderStatus::Created));
    state.payment = Some(PaymentSnapshot::with_status(PaymentStatus::Pending));

    reset_for_store_switch(&mut state);

    assert!(state.cart.is_empty());
    assert_eq!(state.cart_version, 5);
    assert!(state.quote.is_none());
    assert!(state.pending_create_payload.is_none());
    assert!(state.order.is_none());
    assert!(state.payment.is_none());
    assert_eq!(derive_phase(&state), Phase::Ready);
}
