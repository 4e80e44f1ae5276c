//! Integration tests driving the coordinator through its public surface.

mod helpers;
mod lifecycle;
mod persistence;
mod revocation;
mod scenarios;
