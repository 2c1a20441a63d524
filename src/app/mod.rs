//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the business rules for the massage mask: link
//! servicing, command dispatch, timer expiry and pattern scheduling.
//! All interaction with hardware happens through **port traits** defined
//! in [`ports`], keeping this layer fully testable without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
