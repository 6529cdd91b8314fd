//! Auth module: domain, collaborator traits, implementations and the service
//! that ties register/login/logout/profile together.

pub mod domain;
pub mod errors;
pub mod hasher;
pub mod repository;
pub mod repo;
pub mod service;
pub mod token;
pub mod validation;

pub use service::AuthService;
