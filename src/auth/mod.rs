// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Admin Authentication
//!
//! The admin API (`/v1/admin/*`) is protected by a single shared bearer
//! token taken from `ADMIN_TOKEN`.
//!
//! ## Rules
//!
//! - No `ADMIN_TOKEN` configured: every admin request is rejected with 403
//! - Missing or malformed `Authorization` header: 401
//! - Wrong token: 401
//!
//! Site visitors are never authenticated here; their login state lives in the
//! session store.

pub mod error;
pub mod extractor;

pub use error::AuthError;
pub use extractor::AdminOnly;
