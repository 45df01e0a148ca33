//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own session state and backend orchestration so route
//! handlers can stay focused on protocol translation.

pub mod session;
