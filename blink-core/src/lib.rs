#![no_std]

// Shared logic for the multiblink LED scheduler.
//
// This crate stays portable across MCU firmware and host tooling by avoiding
// the Rust standard library and exposing abstractions the other crates can
// adopt.

pub mod pattern;
pub mod scheduler;
pub mod telemetry;
