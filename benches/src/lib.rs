// Copyright 2026 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Criterion benchmarks for the Overstory workspace live under
//! `benches/`; this crate intentionally exports nothing.
