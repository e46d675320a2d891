// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Chaddi integration tests.
//!
//! Provides a mock chat platform, inbound event builders and, with the
//! `harness` feature, an end-to-end harness around the real dispatcher.

pub mod events;
#[cfg(feature = "harness")]
pub mod harness;
pub mod mock_platform;

#[cfg(feature = "harness")]
pub use harness::TestHarness;
pub use mock_platform::{MockPlatform, Outbound};
