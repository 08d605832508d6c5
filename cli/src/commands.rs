use std::io::{Read, Write};

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use serde::Serialize;

use chagee_session::SessionStore;
use chagee_types::{AppState, AuthInfo, Phase, StoreRef};

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Show the current phase, store and cart
    Status,
    /// Record a login; the token is read from stdin
    Login {
        /// User id returned by the login call
        user_id: String,
    },
    /// Forget the stored token and drop auth
    Logout,
    /// Select the store to order from
    Store {
        /// Store number
        store_no: String,
    },
    /// Edit the cart
    #[command(subcommand)]
    Cart(CartCommand),
    /// Print the storage file locations
    Path,
}

#[derive(Subcommand, Debug)]
pub(crate) enum CartCommand {
    /// Add a quantity of a SKU
    Add {
        sku: String,
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        qty: u32,
    },
    /// Remove a SKU line
    Remove { sku: String },
    /// Empty the cart
    Clear,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusReport<'a> {
    phase: Phase,
    mode: &'a str,
    region: &'a str,
    user_id: Option<&'a str>,
    store_no: Option<&'a str>,
    cart_items: usize,
    cart_version: u64,
}

impl<'a> StatusReport<'a> {
    fn new(state: &'a AppState) -> Self {
        Self {
            phase: state.phase(),
            mode: state.session.mode.as_str(),
            region: &state.session.region,
            user_id: state.user_id(),
            store_no: state.selected_store.as_ref().map(|s| s.store_no.as_str()),
            cart_items: state.cart.len(),
            cart_version: state.cart_version,
        }
    }
}

pub(crate) fn run(
    command: &Command,
    state: &mut AppState,
    store: &SessionStore,
    json: bool,
    input: &mut impl Read,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        Command::Status => print_status(state, json, out)?,
        Command::Login { user_id } => {
            let user_id = user_id.trim();
            if user_id.is_empty() {
                bail!("user id must not be empty");
            }
            let token = read_token(input)?;

            if let Some(previous) = state.user_id()
                && previous != user_id
            {
                store
                    .credentials()
                    .clear(previous)
                    .context("failed to clear previous user's token")?;
            }
            state.auth = Some(AuthInfo::new(user_id, token));
            state.pending_login_phone = None;
            tracing::info!(user_id, "Logged in");
            writeln!(out, "logged in as {user_id}")?;
        }
        Command::Logout => match state.auth.take() {
            Some(auth) => {
                store
                    .credentials()
                    .clear(&auth.user_id)
                    .context("failed to clear stored token")?;
                tracing::info!(user_id = %auth.user_id, "Logged out");
                writeln!(out, "logged out {}", auth.user_id)?;
            }
            None => writeln!(out, "not logged in")?,
        },
        Command::Store { store_no } => {
            let store_no = store_no.trim();
            if store_no.is_empty() {
                bail!("store number must not be empty");
            }
            let switched = state.select_store(StoreRef::new(store_no));
            state.session.store_pinned = true;
            if switched {
                writeln!(out, "selected store {store_no}; cart cleared")?;
            } else {
                writeln!(out, "store {store_no} already selected")?;
            }
        }
        Command::Cart(cart) => run_cart(cart, state, out)?,
        Command::Path => {
            writeln!(out, "session: {}", store.path().display())?;
            writeln!(
                out,
                "tokens:  {} ({} backend)",
                store.credentials().fallback_path().display(),
                store.credentials().backend().label()
            )?;
        }
    }
    Ok(())
}

fn run_cart(command: &CartCommand, state: &mut AppState, out: &mut impl Write) -> Result<()> {
    match command {
        CartCommand::Add { sku, qty } => {
            state.add_cart_item(sku.as_str(), *qty);
            writeln!(out, "added {qty} x {sku} (cart v{})", state.cart_version)?;
        }
        CartCommand::Remove { sku } => {
            if state.remove_cart_item(sku) {
                writeln!(out, "removed {sku} (cart v{})", state.cart_version)?;
            } else {
                writeln!(out, "{sku} is not in the cart")?;
            }
        }
        CartCommand::Clear => {
            state.clear_cart();
            writeln!(out, "cart cleared (cart v{})", state.cart_version)?;
        }
    }
    Ok(())
}

fn read_token(input: &mut impl Read) -> Result<String> {
    let mut raw = String::new();
    input
        .read_to_string(&mut raw)
        .context("failed to read token from stdin")?;
    let token = raw.trim();
    if token.is_empty() {
        bail!("no token on stdin");
    }
    Ok(token.to_string())
}

fn print_status(state: &AppState, json: bool, out: &mut impl Write) -> Result<()> {
    let report = StatusReport::new(state);
    if json {
        serde_json::to_writer(&mut *out, &report)?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(out, "phase:  {}", report.phase)?;
    writeln!(out, "mode:   {}", report.mode)?;
    writeln!(out, "region: {}", report.region)?;
    writeln!(out, "user:   {}", report.user_id.unwrap_or("-"))?;
    writeln!(out, "store:  {}", report.store_no.unwrap_or("-"))?;
    writeln!(
        out,
        "cart:   {} item(s), version {}",
        report.cart_items, report.cart_version
    )?;
    Ok(())
}
