// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Support for redefining types in place.
//!
//! **DDD Context:** Scaffold — Inline

pub mod method_rebase_resolver;

pub use method_rebase_resolver::{DISABLED, MethodRebaseResolver, Resolution};
