//! Core domain types for the Chagee CLI.
//!
//! This crate contains the application state model with no IO, no async, and
//! minimal dependencies. Everything here can be used from any layer of the
//! application.
//!
//! - **`state`**: the mutable [`AppState`] snapshot, its persisted projections,
//!   and the partial form produced by a session load
//! - **`phase`**: the derived [`Phase`] projection and the cart/store helpers
//!   that keep quotes and orders consistent with the cart they belong to

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod phase;
mod state;

pub use phase::{
    MAX_CART_VERSION, Phase, bump_cart_version, derive_phase, reset_for_store_switch,
};
pub use state::{
    AppState, AuthInfo, CartItem, DEFAULT_LATITUDE, DEFAULT_LOCATION_SOURCE, DEFAULT_LONGITUDE,
    DEFAULT_REGION_CODE, JsonObject, Mode, OrderSnapshot, OrderStatus, PartialAppState,
    PaymentSnapshot, PaymentStatus, PersistedAuth, SessionConfig, StoreRef, UnknownModeError,
};
