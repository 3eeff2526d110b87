// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Session tokens for the Converse API.
//!
//! ## Auth Flow
//!
//! 1. Client logs in with `POST /v1/auth/login`
//! 2. Server issues an HS256 JWT with claims `{userId, iat, exp}` (24 h)
//! 3. Client sends `Authorization: Bearer <token>`
//! 4. The `Auth` extractor verifies signature and expiry; `userId` becomes
//!    the owning user id of every record the request touches
//!
//! Clock skew tolerance is 60 seconds.

pub mod claims;
pub mod error;
pub mod extractor;

pub use claims::{issue_session_token, AuthConfig, AuthenticatedUser};
pub use error::AuthError;
pub use extractor::Auth;
