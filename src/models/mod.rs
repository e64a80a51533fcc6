// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod breakdown;
pub mod receipt;
pub mod user;

pub use breakdown::{CategorySpend, SpendingBreakdown};
pub use receipt::{Receipt, ReceiptItem};
pub use user::{LoginProfile, User};
