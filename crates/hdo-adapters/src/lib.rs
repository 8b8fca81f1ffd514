// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION HDO.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Feed adapters
//!
//! The engine in `hdo-core` works on already decoded feeds. This crate fetches
//! them: [`FeedSource`] is the seam the poll coordinator depends on and
//! [`Distribuce24Client`] its HTTP implementation.

pub mod distribuce24;
pub mod source;

pub use distribuce24::{DEFAULT_REGION_URL, DEFAULT_SCHEDULE_URL, Distribuce24Client};
pub use source::FeedSource;
