// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! Types and literal codecs shared by the packet filter compiler and
//! its consumers.
//!
//! This crate is `no_std` so that the code generator side may consume
//! the same address representations as the rule front end.

#![no_std]
#![deny(unreachable_patterns)]
#![deny(unused_must_use)]

#[cfg(any(feature = "std", test))]
#[macro_use]
extern crate std;

#[macro_use]
extern crate alloc;

pub mod codec;
pub mod ip;
pub mod mac;

pub use codec::*;
pub use ip::*;
pub use mac::*;

/// The overall version of the rule representation. Anytime a field
/// is added to, removed from, or reinterpreted in the rule types this
/// number must increment, so that a saved filter is never handed to a
/// generator that disagrees on its layout.
pub const API_VERSION: u64 = 1;
