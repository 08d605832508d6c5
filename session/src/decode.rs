//! Versioned decoding of the session document.
//!
//! Two generations exist on disk:
//!
//! - **v1** (no `schemaVersion`, or `1`): the state may sit under a `state` key
//!   and `auth.token` was written inline.
//! - **v2**: flat document, token kept in the credential store.
//!
//! Both are normalized to the v2 candidate by [`migrate`]. A v1 inline token is
//! lifted out for the credential store; in v2 and later an inline token is
//! discarded with a warning. Documents from newer builds, or with a version this
//! build cannot read, are decoded with the v2 field decoders on a best-effort
//! basis.
//!
//! Each recognized field has its own decoder. A field whose shape matches is
//! kept; bad parts inside it (a `session` subfield, a cart line, a non-string
//! order status) are defaulted or dropped on their own. A decoder yields the
//! value, nothing (field absent or `null`), or a [`FieldIssue`] that becomes a
//! load warning.

use std::fmt;

use chagee_types::{
    CartItem, JsonObject, MAX_CART_VERSION, OrderSnapshot, OrderStatus, PartialAppState,
    PaymentSnapshot, PaymentStatus, PersistedAuth, SessionConfig, StoreRef,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Schema version written by this build.
pub const SESSION_SCHEMA_VERSION: u64 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
enum SchemaGeneration {
    Legacy,
    Current,
    Newer(u64),
    /// `schemaVersion` present but not a non-negative integer. Read like
    /// [`SchemaGeneration::Newer`]: never trusted to carry a v1 layout.
    Unrecognized(String),
}

impl SchemaGeneration {
    fn of(root: &JsonObject) -> Self {
        let Some(raw) = present(root, "schemaVersion") else {
            return SchemaGeneration::Legacy;
        };
        match as_count(raw) {
            Some(0 | 1) => SchemaGeneration::Legacy,
            Some(SESSION_SCHEMA_VERSION) => SchemaGeneration::Current,
            Some(newer) => SchemaGeneration::Newer(newer),
            None => SchemaGeneration::Unrecognized(raw.to_string()),
        }
    }

    fn warning(&self) -> Option<String> {
        match self {
            SchemaGeneration::Legacy | SchemaGeneration::Current => None,
            SchemaGeneration::Newer(newer) => Some(format!(
                "session schemaVersion={newer} is newer than supported={SESSION_SCHEMA_VERSION}; \
                 attempting best-effort load"
            )),
            SchemaGeneration::Unrecognized(raw) => Some(format!(
                "session schemaVersion={raw} is not a recognized version; \
                 attempting best-effort load"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Object,
    Array,
    Count,
    String,
}

impl Shape {
    fn as_str(self) -> &'static str {
        match self {
            Shape::Object => "object",
            Shape::Array => "array",
            Shape::Count => "non-negative integer",
            Shape::String => "string",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum IssueKind {
    WrongShape { expected: Shape, found: &'static str },
    Invalid(String),
}

/// A persisted field (or part of one) that was present but unusable, and
/// therefore dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FieldIssue {
    field: String,
    kind: IssueKind,
}

impl FieldIssue {
    fn invalid(field: impl Into<String>, detail: impl fmt::Display) -> Self {
        Self {
            field: field.into(),
            kind: IssueKind::Invalid(detail.to_string()),
        }
    }

    fn wrong_shape(field: impl Into<String>, expected: Shape, value: &Value) -> Self {
        Self {
            field: field.into(),
            kind: IssueKind::WrongShape {
                expected,
                found: type_name(value),
            },
        }
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            IssueKind::WrongShape { expected, found } => write!(
                f,
                "session field `{}` ignored: expected {}, found {}",
                self.field,
                expected.as_str(),
                found
            ),
            IssueKind::Invalid(detail) => {
                write!(f, "session field `{}` ignored: {}", self.field, detail)
            }
        }
    }
}

/// Output of a successful decode. `state.auth` is always `None`; the caller
/// hydrates it from `auth` and the credential store.
#[derive(Debug, Default)]
pub(crate) struct DecodedSession {
    pub(crate) state: PartialAppState,
    pub(crate) auth: Option<PersistedAuth>,
    /// Token found inline in the document (v1 shape), to be moved to the
    /// credential store.
    pub(crate) inline_token: Option<String>,
}

/// Decode raw document text. `None` means nothing usable; the reason is in
/// `warnings`.
pub(crate) fn decode_document(raw: &str, warnings: &mut Vec<String>) -> Option<DecodedSession> {
    let root = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(root)) => root,
        Ok(_) => {
            warnings.push("session file is not a JSON object".to_string());
            return None;
        }
        Err(e) => {
            warnings.push(format!("session file is not valid JSON: {e}"));
            return None;
        }
    };

    let generation = SchemaGeneration::of(&root);
    warnings.extend(generation.warning());

    let (candidate, inline_token) = migrate(root, &generation, warnings);
    let decoded = sanitize(&candidate, inline_token, warnings);
    if decoded.state.session.is_none() {
        warnings.push("session file missing `session`; ignoring persisted state".to_string());
        return None;
    }
    Some(decoded)
}

/// Normalize any generation to the v2 candidate object and lift an inline token.
fn migrate(
    mut root: JsonObject,
    generation: &SchemaGeneration,
    warnings: &mut Vec<String>,
) -> (JsonObject, Option<String>) {
    let legacy = *generation == SchemaGeneration::Legacy;
    let mut candidate = if legacy {
        match root.remove("state") {
            Some(Value::Object(nested)) => nested,
            Some(other) => {
                root.insert("state".to_string(), other);
                root
            }
            None => root,
        }
    } else {
        root
    };

    let inline_token = match candidate.get_mut("auth") {
        Some(Value::Object(auth)) => match auth.remove("token") {
            Some(Value::String(token)) if !token.is_empty() => Some(token),
            _ => None,
        },
        _ => None,
    };
    if inline_token.is_some() && !legacy {
        warnings.push(
            "session auth.token ignored: tokens are kept in the credential store".to_string(),
        );
        return (candidate, None);
    }
    (candidate, inline_token)
}

fn keep<T>(result: Result<Option<T>, FieldIssue>, warnings: &mut Vec<String>) -> Option<T> {
    match result {
        Ok(value) => value,
        Err(issue) => {
            warnings.push(issue.to_string());
            None
        }
    }
}

fn sanitize(
    candidate: &JsonObject,
    inline_token: Option<String>,
    warnings: &mut Vec<String>,
) -> DecodedSession {
    let session = keep(decode_session(candidate, warnings), warnings);
    let selected_store = keep(decode_store(candidate, warnings), warnings);
    let stores_cache = keep(decode_array(candidate, "storesCache"), warnings);
    let menu_cache = keep(decode_array(candidate, "menuCache"), warnings);
    let menu_cache_by_store = keep(decode_object(candidate, "menuCacheByStore"), warnings);

    let cart = decode_cart(candidate, warnings);
    // Lines lost from a present cart mean any quote no longer matches it.
    let cart_damaged = !matches!(cart, Ok(None | Some((_, 0))));
    let cart = keep(cart, warnings).map(|(items, _)| items);
    let cart_version = keep(decode_cart_version(candidate), warnings);

    let mut quote = keep(decode_object(candidate, "quote"), warnings);
    let mut pending_create_payload =
        keep(decode_object(candidate, "pendingCreatePayload"), warnings);
    if cart_damaged && (quote.is_some() || pending_create_payload.is_some()) {
        warnings.push(
            "session quote discarded: it was computed for cart lines that could not be loaded"
                .to_string(),
        );
        quote = None;
        pending_create_payload = None;
    }

    let order = keep(decode_snapshot(candidate, "order"), warnings).map(|(status, extra)| {
        OrderSnapshot {
            status: status.map(OrderStatus::from),
            extra,
        }
    });
    let payment = keep(decode_snapshot(candidate, "payment"), warnings).map(|(status, extra)| {
        PaymentSnapshot {
            status: status.map(PaymentStatus::from),
            extra,
        }
    });

    let state = PartialAppState {
        session,
        auth: None,
        selected_store,
        stores_cache,
        menu_cache,
        menu_cache_by_store,
        cart,
        cart_version,
        quote,
        pending_create_payload,
        order,
        payment,
        pending_login_phone: keep(decode_string(candidate, "pendingLoginPhone"), warnings),
    };

    let auth = keep(decode_auth(candidate, warnings), warnings);
    // A token without a user id has nowhere to go.
    let inline_token = inline_token.filter(|_| auth.is_some());

    DecodedSession {
        state,
        auth,
        inline_token,
    }
}

fn present<'a>(candidate: &'a JsonObject, field: &str) -> Option<&'a Value> {
    candidate.get(field).filter(|value| !value.is_null())
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Non-negative integer. Integral floats (`3.0`) written by other tools are accepted.
fn as_count(value: &Value) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    match value.as_f64() {
        Some(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => {
            Some(f as u64)
        }
        _ => None,
    }
}

fn object_field<'a>(
    candidate: &'a JsonObject,
    field: &str,
) -> Result<Option<&'a JsonObject>, FieldIssue> {
    match present(candidate, field) {
        None => Ok(None),
        Some(Value::Object(object)) => Ok(Some(object)),
        Some(other) => Err(FieldIssue::wrong_shape(field, Shape::Object, other)),
    }
}

fn array_field<'a>(
    candidate: &'a JsonObject,
    field: &str,
) -> Result<Option<&'a Vec<Value>>, FieldIssue> {
    match present(candidate, field) {
        None => Ok(None),
        Some(Value::Array(items)) => Ok(Some(items)),
        Some(other) => Err(FieldIssue::wrong_shape(field, Shape::Array, other)),
    }
}

fn decode_object(candidate: &JsonObject, field: &str) -> Result<Option<JsonObject>, FieldIssue> {
    object_field(candidate, field).map(|object| object.cloned())
}

fn decode_array(candidate: &JsonObject, field: &str) -> Result<Option<Vec<Value>>, FieldIssue> {
    array_field(candidate, field).map(|items| items.cloned())
}

fn decode_string(candidate: &JsonObject, field: &str) -> Result<Option<String>, FieldIssue> {
    match present(candidate, field) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(FieldIssue::wrong_shape(field, Shape::String, other)),
    }
}

/// Cart version, capped at [`MAX_CART_VERSION`] so later bumps keep increasing.
fn decode_cart_version(candidate: &JsonObject) -> Result<Option<u64>, FieldIssue> {
    const FIELD: &str = "cartVersion";
    let Some(value) = present(candidate, FIELD) else {
        return Ok(None);
    };
    match as_count(value) {
        Some(version) if version <= MAX_CART_VERSION => Ok(Some(version)),
        Some(version) => Err(FieldIssue::invalid(
            FIELD,
            format!("{version} exceeds the maximum of {MAX_CART_VERSION}"),
        )),
        None => Err(FieldIssue::wrong_shape(FIELD, Shape::Count, value)),
    }
}

/// One nested member of an accepted object. Absent or `null` keeps the
/// default; anything that does not deserialize is reported and also keeps it.
fn member<T: DeserializeOwned>(
    object: &JsonObject,
    parent: &str,
    key: &str,
    warnings: &mut Vec<String>,
) -> Option<T> {
    let value = present(object, key)?;
    T::deserialize(value)
        .map_err(|e| warnings.push(FieldIssue::invalid(format!("{parent}.{key}"), e).to_string()))
        .ok()
}

fn decode_session(
    candidate: &JsonObject,
    warnings: &mut Vec<String>,
) -> Result<Option<SessionConfig>, FieldIssue> {
    const FIELD: &str = "session";
    let Some(object) = object_field(candidate, FIELD)? else {
        return Ok(None);
    };

    let mut session = SessionConfig::default();
    if let Some(mode) = member(object, FIELD, "mode", warnings) {
        session.mode = mode;
    }
    if let Some(json_output) = member(object, FIELD, "jsonOutput", warnings) {
        session.json_output = json_output;
    }
    if let Some(region) = member(object, FIELD, "region", warnings) {
        session.region = region;
    }
    if let Some(latitude) = member(object, FIELD, "latitude", warnings) {
        session.latitude = latitude;
    }
    if let Some(longitude) = member(object, FIELD, "longitude", warnings) {
        session.longitude = longitude;
    }
    if let Some(location_source) = member(object, FIELD, "locationSource", warnings) {
        session.location_source = location_source;
    }
    if let Some(store_pinned) = member(object, FIELD, "storePinned", warnings) {
        session.store_pinned = store_pinned;
    }
    Ok(Some(session))
}

fn decode_store(
    candidate: &JsonObject,
    warnings: &mut Vec<String>,
) -> Result<Option<StoreRef>, FieldIssue> {
    let Some(object) = object_field(candidate, "selectedStore")? else {
        return Ok(None);
    };

    let mut extra = object.clone();
    let store_no = match extra.remove("storeNo") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(store_no)) => store_no,
        // Some API responses carry numeric store numbers.
        Some(Value::Number(store_no)) => store_no.to_string(),
        Some(other) => {
            warnings.push(
                FieldIssue::wrong_shape("selectedStore.storeNo", Shape::String, &other)
                    .to_string(),
            );
            String::new()
        }
    };
    let store_name = match extra.remove("storeName") {
        Some(Value::String(name)) => Some(name),
        None | Some(Value::Null) => None,
        Some(other) => {
            extra.insert("storeName".to_string(), other);
            None
        }
    };

    Ok(Some(StoreRef {
        store_no,
        store_name,
        extra,
    }))
}

/// Each line is decoded on its own; unusable lines are dropped. Returns the
/// kept lines and how many were dropped.
fn decode_cart(
    candidate: &JsonObject,
    warnings: &mut Vec<String>,
) -> Result<Option<(Vec<CartItem>, usize)>, FieldIssue> {
    let Some(lines) = array_field(candidate, "cart")? else {
        return Ok(None);
    };

    let mut items = Vec::with_capacity(lines.len());
    for (index, line) in lines.iter().enumerate() {
        match CartItem::deserialize(line) {
            Ok(item) => items.push(item),
            Err(e) => warnings.push(FieldIssue::invalid(format!("cart[{index}]"), e).to_string()),
        }
    }
    let dropped = lines.len() - items.len();
    Ok(Some((items, dropped)))
}

/// Order and payment snapshots: the object is kept whatever its `status` holds.
/// A string status is split out; any other status stays verbatim in the
/// pass-through fields.
fn decode_snapshot(
    candidate: &JsonObject,
    field: &str,
) -> Result<Option<(Option<String>, JsonObject)>, FieldIssue> {
    let Some(object) = object_field(candidate, field)? else {
        return Ok(None);
    };

    let mut extra = object.clone();
    let status = match extra.remove("status") {
        Some(Value::String(status)) => Some(status),
        None | Some(Value::Null) => None,
        Some(other) => {
            extra.insert("status".to_string(), other);
            None
        }
    };
    Ok(Some((status, extra)))
}

/// `auth` keeps only the user id. An absent or empty id drops auth silently.
fn decode_auth(
    candidate: &JsonObject,
    warnings: &mut Vec<String>,
) -> Result<Option<PersistedAuth>, FieldIssue> {
    let Some(object) = object_field(candidate, "auth")? else {
        return Ok(None);
    };
    Ok(member::<String>(object, "auth", "userId", warnings)
        .filter(|user_id| !user_id.is_empty())
        .map(|user_id| PersistedAuth { user_id }))
}
