//! # Repositories
//!
//! Read-side data access, one repository per aggregate.
//!
//! Stock quantities are NOT writable through any repository: every
//! quantity mutation goes through [`crate::engine::TransactionEngine`],
//! which owns the ledger and journal write path.

pub mod ledger;
pub mod product;
pub mod purchase;
pub mod report;
pub mod sale;
