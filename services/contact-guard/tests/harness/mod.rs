// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Test harness for contact form abuse simulation.
//!
//! Drives the guard with scripted traffic on a simulated clock so whole
//! rate-limit windows can be covered without sleeping.

#![allow(dead_code)]

pub mod attacks;
pub mod generators;
pub mod metrics;
