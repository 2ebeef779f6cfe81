//! HTTP handlers. Each one is a thin adapter over the speech ports in
//! `AppState`; locking happens in the gate middleware before they run.

pub mod conversation;
pub mod health;
pub mod tts;
