// Copyright 2026 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame-level errors.
//!
//! Recoverable problems (a duplicate child id, a behavior panic) are logged
//! and skipped; only violations the pipeline cannot continue past surface
//! here, from [`Context::mainloop`](crate::Context::mainloop).

use thiserror::Error;

pub use overstory_hit::ShapeError;

/// Fatal errors aborting a frame.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// An element's transform was mutated by another thread while the
    /// hit-test phase was reading its world matrix. The concurrency rules
    /// forbid this; the frame is aborted rather than hit-testing against a
    /// torn matrix.
    #[error("element {element} transform mutated during hit-testing")]
    ConcurrencyViolation {
        /// The element whose matrix was caught mid-change.
        element: i64,
    },

    /// A shape failed to resolve during element construction.
    #[error(transparent)]
    Shape(#[from] ShapeError),
}
