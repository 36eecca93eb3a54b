//! # Complaint Desk
//!
//! Client-side core of the complaint classification desk: the access gate,
//! the session context, the complaint working set with its analytics and
//! filters, and the client for the remote classification API.
//!
//! Rendering is not part of this crate. A front end drives a [`desk::Desk`]
//! and draws the [`desk::ViewState`] it returns.

pub mod analytics;
pub mod api;
pub mod complaint;
pub mod config;
pub mod desk;
pub mod error;
pub mod filter;
pub mod gate;
pub mod ledger;
pub mod session;
pub mod store;
pub mod types;
pub mod validation;
