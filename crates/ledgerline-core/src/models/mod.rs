//! Data models for budget-tracker entities.
//!
//! This module contains the data structures exchanged with the budget
//! tracker API:
//!
//! - `Transaction`, `TransactionType`: income/expense records
//! - `User`, `UserRole`: the authenticated account
//! - `TokenPair`, `LoginResponse`: authentication wire shapes

pub mod transaction;
pub mod user;

pub use transaction::{NewTransaction, Transaction, TransactionType, TransactionsResponse};
pub use user::{LoginResponse, TokenPair, User, UserRole};
