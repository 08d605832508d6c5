//! Write-side shape of `session.json`.

use chagee_types::{
    AppState, CartItem, JsonObject, OrderSnapshot, PaymentSnapshot, PersistedAuth, SessionConfig,
    StoreRef,
};
use serde::Serialize;
use serde_json::Value;

use crate::decode::SESSION_SCHEMA_VERSION;

/// Borrowed view of [`AppState`] as persisted. `auth` is the token-free
/// projection, so the secret cannot reach this document.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SessionDocument<'a> {
    schema_version: u64,
    session: &'a SessionConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    auth: Option<PersistedAuth>,
    #[serde(skip_serializing_if = "Option::is_none")]
    selected_store: Option<&'a StoreRef>,
    stores_cache: &'a [Value],
    menu_cache: &'a [Value],
    menu_cache_by_store: &'a JsonObject,
    cart: &'a [CartItem],
    cart_version: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    quote: Option<&'a JsonObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pending_create_payload: Option<&'a JsonObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    order: Option<&'a OrderSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payment: Option<&'a PaymentSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pending_login_phone: Option<&'a str>,
}

impl<'a> SessionDocument<'a> {
    pub(crate) fn from_state(state: &'a AppState) -> Self {
        Self {
            schema_version: SESSION_SCHEMA_VERSION,
            session: &state.session,
            auth: state.auth.as_ref().map(chagee_types::AuthInfo::persisted),
            selected_store: state.selected_store.as_ref(),
            stores_cache: &state.stores_cache,
            menu_cache: &state.menu_cache,
            menu_cache_by_store: &state.menu_cache_by_store,
            cart: &state.cart,
            cart_version: state.cart_version,
            quote: state.quote.as_ref(),
            pending_create_payload: state.pending_create_payload.as_ref(),
            order: state.order.as_ref(),
            payment: state.payment.as_ref(),
            pending_login_phone: state.pending_login_phone.as_deref(),
        }
    }
}
