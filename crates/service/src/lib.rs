//! Service layer: framework-independent account workflows on top of `models`.
//! - Collaborators (stores, hasher, token issuer) sit behind traits.
//! - `server` only shapes HTTP around `auth::AuthService`.

pub mod auth;
