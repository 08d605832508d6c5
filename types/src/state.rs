//! Application state snapshot.
//!
//! [`AppState`] is owned by the application shell and mutated in place over the
//! process lifetime. Nothing in here touches disk; the session store persists a
//! projection of it and hands back a [`PartialAppState`] on load.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Free-form JSON object used for API payload snapshots and pass-through fields.
pub type JsonObject = serde_json::Map<String, Value>;

// ============================================================================
// Region defaults
// ============================================================================

pub const DEFAULT_REGION_CODE: &str = "SG";
pub const DEFAULT_LATITUDE: f64 = 1.3521;
pub const DEFAULT_LONGITUDE: f64 = 103.8198;
pub const DEFAULT_LOCATION_SOURCE: &str = "default";

// ============================================================================
// Session configuration
// ============================================================================

/// Ordering mode. Dry-run never submits orders to the live API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Mode {
    #[default]
    #[serde(rename = "dry-run")]
    DryRun,
    #[serde(rename = "live")]
    Live,
}

#[derive(Debug, Error)]
#[error("unknown mode `{0}` (expected `dry-run` or `live`)")]
pub struct UnknownModeError(pub String);

impl Mode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Mode::DryRun => "dry-run",
            Mode::Live => "live",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "dry-run" | "dryrun" | "dry" => Some(Mode::DryRun),
            "live" => Some(Mode::Live),
            _ => None,
        }
    }
}

impl FromStr for Mode {
    type Err = UnknownModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnknownModeError(s.to_string()))
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operating settings that are always present once the state is initialized.
///
/// Every field has a default so a partially written `session` object from an
/// older or newer build still decodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
    pub mode: Mode,
    pub json_output: bool,
    pub region: String,
    pub latitude: f64,
    pub longitude: f64,
    pub location_source: String,
    pub store_pinned: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: Mode::DryRun,
            json_output: false,
            region: DEFAULT_REGION_CODE.to_string(),
            latitude: DEFAULT_LATITUDE,
            longitude: DEFAULT_LONGITUDE,
            location_source: DEFAULT_LOCATION_SOURCE.to_string(),
            store_pinned: false,
        }
    }
}

// ============================================================================
// Auth
// ============================================================================

/// Authenticated user with the live API token.
///
/// Deliberately not `Serialize`: the token only ever leaves memory through the
/// credential store. Use [`AuthInfo::persisted`] for the on-disk projection.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthInfo {
    pub user_id: String,
    pub token: String,
}

impl AuthInfo {
    pub fn new(user_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            token: token.into(),
        }
    }

    #[must_use]
    pub fn persisted(&self) -> PersistedAuth {
        PersistedAuth {
            user_id: self.user_id.clone(),
        }
    }
}

// Manual Debug impl to prevent leaking the token in logs.
impl fmt::Debug for AuthInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthInfo")
            .field("user_id", &self.user_id)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// The part of [`AuthInfo`] that is written to the session document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedAuth {
    #[serde(rename = "userId")]
    pub user_id: String,
}

// ============================================================================
// Store, cart, order, payment
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreRef {
    #[serde(default)]
    pub store_no: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_name: Option<String>,
    /// API fields the CLI does not interpret (address, distance, hours, ...).
    #[serde(flatten)]
    pub extra: JsonObject,
}

impl StoreRef {
    pub fn new(store_no: impl Into<String>) -> Self {
        Self {
            store_no: store_no.into(),
            store_name: None,
            extra: JsonObject::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub qty: u32,
    #[serde(flatten)]
    pub extra: JsonObject,
}

impl CartItem {
    pub fn new(sku: impl Into<String>, qty: u32) -> Self {
        Self {
            sku: sku.into(),
            qty,
            extra: JsonObject::new(),
        }
    }
}

/// Order status as reported by the API. Unrecognized values round-trip verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    Created,
    Paid,
    Canceled,
    Other(String),
}

impl OrderStatus {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::Created => "created",
            OrderStatus::Paid => "paid",
            OrderStatus::Canceled => "canceled",
            OrderStatus::Other(raw) => raw,
        }
    }
}

impl From<String> for OrderStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "created" => OrderStatus::Created,
            "paid" => OrderStatus::Paid,
            "canceled" => OrderStatus::Canceled,
            _ => OrderStatus::Other(raw),
        }
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        match status {
            OrderStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentStatus {
    Pending,
    Other(String),
}

impl PaymentStatus {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Other(raw) => raw,
        }
    }
}

impl From<String> for PaymentStatus {
    fn from(raw: String) -> Self {
        if raw == "pending" {
            PaymentStatus::Pending
        } else {
            PaymentStatus::Other(raw)
        }
    }
}

impl From<PaymentStatus> for String {
    fn from(status: PaymentStatus) -> Self {
        match status {
            PaymentStatus::Pending => "pending".to_string(),
            PaymentStatus::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(flatten)]
    pub extra: JsonObject,
}

impl OrderSnapshot {
    #[must_use]
    pub fn with_status(status: OrderStatus) -> Self {
        Self {
            status: Some(status),
            extra: JsonObject::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PaymentStatus>,
    #[serde(flatten)]
    pub extra: JsonObject,
}

impl PaymentSnapshot {
    #[must_use]
    pub fn with_status(status: PaymentStatus) -> Self {
        Self {
            status: Some(status),
            extra: JsonObject::new(),
        }
    }
}

// ============================================================================
// AppState
// ============================================================================

/// Full mutable application snapshot.
///
/// Invariants maintained by the helpers in this crate:
/// - `cart_version` only increases, and every cart mutation bumps it.
/// - A bump clears `quote` and `pending_create_payload`.
/// - The phase is never stored; see [`crate::derive_phase`].
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub session: SessionConfig,
    pub auth: Option<AuthInfo>,
    pub selected_store: Option<StoreRef>,
    pub stores_cache: Vec<Value>,
    pub menu_cache: Vec<Value>,
    pub menu_cache_by_store: JsonObject,
    pub cart: Vec<CartItem>,
    pub cart_version: u64,
    pub quote: Option<JsonObject>,
    pub pending_create_payload: Option<JsonObject>,
    pub order: Option<OrderSnapshot>,
    pub payment: Option<PaymentSnapshot>,
    pub pending_login_phone: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::initial()
    }
}

impl AppState {
    /// Fresh state: default session config, empty cart at version 0, nothing else.
    #[must_use]
    pub fn initial() -> Self {
        Self {
            session: SessionConfig::default(),
            auth: None,
            selected_store: None,
            stores_cache: Vec::new(),
            menu_cache: Vec::new(),
            menu_cache_by_store: JsonObject::new(),
            cart: Vec::new(),
            cart_version: 0,
            quote: None,
            pending_create_payload: None,
            order: None,
            payment: None,
            pending_login_phone: None,
        }
    }

    /// Merge a loaded partial state over [`AppState::initial`].
    ///
    /// Fields absent from `partial` keep their initial values.
    #[must_use]
    pub fn from_partial(partial: PartialAppState) -> Self {
        let initial = Self::initial();
        Self {
            session: partial.session.unwrap_or(initial.session),
            auth: partial.auth,
            selected_store: partial.selected_store,
            stores_cache: partial.stores_cache.unwrap_or(initial.stores_cache),
            menu_cache: partial.menu_cache.unwrap_or(initial.menu_cache),
            menu_cache_by_store: partial
                .menu_cache_by_store
                .unwrap_or(initial.menu_cache_by_store),
            cart: partial.cart.unwrap_or(initial.cart),
            cart_version: partial.cart_version.unwrap_or(initial.cart_version),
            quote: partial.quote,
            pending_create_payload: partial.pending_create_payload,
            order: partial.order,
            payment: partial.payment,
            pending_login_phone: partial.pending_login_phone,
        }
    }

    #[must_use]
    pub fn phase(&self) -> crate::Phase {
        crate::derive_phase(self)
    }

    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.auth.as_ref().map(|auth| auth.user_id.as_str())
    }

    /// Add `qty` of `sku` to the cart, merging with an existing line.
    pub fn add_cart_item(&mut self, sku: impl Into<String>, qty: u32) {
        let sku = sku.into();
        match self.cart.iter_mut().find(|item| item.sku == sku) {
            Some(item) => item.qty = item.qty.saturating_add(qty),
            None => self.cart.push(CartItem::new(sku, qty)),
        }
        crate::bump_cart_version(self);
    }

    /// Remove the line for `sku`. Returns false (and leaves the version alone)
    /// when there was nothing to remove.
    pub fn remove_cart_item(&mut self, sku: &str) -> bool {
        let before = self.cart.len();
        self.cart.retain(|item| item.sku != sku);
        if self.cart.len() == before {
            return false;
        }
        crate::bump_cart_version(self);
        true
    }

    pub fn clear_cart(&mut self) {
        self.cart.clear();
        crate::bump_cart_version(self);
    }

    /// Select `store` for ordering.
    ///
    /// Switching to a different store number resets all store-scoped state.
    /// Returns true when that reset happened.
    pub fn select_store(&mut self, store: StoreRef) -> bool {
        let switched = self
            .selected_store
            .as_ref()
            .is_none_or(|current| current.store_no != store.store_no);
        if switched {
            crate::reset_for_store_switch(self);
        }
        self.selected_store = Some(store);
        switched
    }
}

/// State recovered from disk. Every field is optional; absent fields are filled
/// from [`AppState::initial`] by [`AppState::from_partial`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialAppState {
    pub session: Option<SessionConfig>,
    pub auth: Option<AuthInfo>,
    pub selected_store: Option<StoreRef>,
    pub stores_cache: Option<Vec<Value>>,
    pub menu_cache: Option<Vec<Value>>,
    pub menu_cache_by_store: Option<JsonObject>,
    pub cart: Option<Vec<CartItem>>,
    pub cart_version: Option<u64>,
    pub quote: Option<JsonObject>,
    pub pending_create_payload: Option<JsonObject>,
    pub order: Option<OrderSnapshot>,
    pub payment: Option<PaymentSnapshot>,
    pub pending_login_phone: Option<String>,
}
