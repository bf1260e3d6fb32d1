//! Database module for the InnoBridge server
//!
//! This module handles database connections and the data access
//! layer for accounts, role profiles, and login sessions.

pub mod models;
pub mod operations;

pub use models::{Account, CompanyProfile, InvestorProfile, Role, Session, UniversityProfile};
pub use operations::{AccountRepo, AccountStore};
