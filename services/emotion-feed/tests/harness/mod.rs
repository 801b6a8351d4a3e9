// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Test harness for abuse simulation against the emotion feed.
//!
//! Floods run on a manual clock, so the sliding windows are exercised
//! deterministically and without sleeping.

pub mod attacks;
pub mod generators;
pub mod metrics;
