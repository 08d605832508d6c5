mod cli;
mod credentials;
mod persistence;
mod state;
