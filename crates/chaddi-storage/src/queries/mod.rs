// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules, one per table family.

pub mod accounts;
pub mod activity;
pub mod groups;
pub mod jobs;
pub mod rolls;
