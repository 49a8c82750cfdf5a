// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! The front end of the packet filter compiler.
//!
//! Rules arrive as `tc flower` style token sequences and leave as
//! validated [`engine::rule::Rule`] values, collected in insertion
//! order by an [`engine::filter::Filter`]. Lowering a filter into a
//! classification program is the business of a separate generator.

#![cfg_attr(not(feature = "std"), no_std)]
#![allow(clippy::len_without_is_empty)]
#![deny(unreachable_patterns)]
#![deny(unused_must_use)]

#[macro_use]
extern crate alloc;

pub mod api;
pub mod engine;
#[cfg(feature = "std")]
pub mod print;
