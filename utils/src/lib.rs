//! Shared filesystem utilities for the Chagee CLI.
//!
//! - **`atomic_write`**: Crash-safe file persistence (temp + rename)
//! - **`secure_dir`**: Owner-only storage directories

mod atomic_write;
mod secure_dir;

pub use atomic_write::{atomic_write, recover_bak_file};
pub use secure_dir::ensure_secure_dir;
