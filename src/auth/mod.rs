// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Cookie sessions for the auction API.
//!
//! ## Auth Flow
//!
//! 1. `POST /login` verifies the username and password against the stored
//!    Argon2id verifier
//! 2. The server creates a session (address, username, role) and sets an
//!    `HttpOnly` `session` cookie
//! 3. Handlers take the `Auth` extractor, which resolves the cookie against
//!    the session store
//!
//! Missing, unknown and expired sessions all fail with the login errno.

pub mod error;
pub mod extractor;
pub mod password;
pub mod roles;
pub mod session;

pub use error::AuthError;
pub use extractor::{AdminOnly, Auth, OptionalAuth};
pub use password::{hash_password, verify_password};
pub use roles::Role;
pub use session::{AuthenticatedUser, SessionStore, SESSION_COOKIE};
