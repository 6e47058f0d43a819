// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Top-level parsing for module source code.
//!
//! The parser structures declarations, imports and exports and steps over
//! every other construct by balancing brackets. While it steps it keeps
//! enough context to tell function bodies from blocks, which is how it
//! finds the first `await` outside any function.
//!
//! ## Structure
//!
//! - `parser.rs` - `Parser` core: token tracking, bracket frames, ASI
//! - `statements.rs` - Statement, import and export forms
//! - `patterns.rs` - Binding patterns

mod parser;
mod patterns;
mod statements;

pub use parser::Parser;
