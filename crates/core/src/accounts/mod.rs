//! Accounts module - domain models for monitored game accounts.

mod accounts_model;

pub use accounts_model::{
    parse_resin_threshold_name, resin_threshold_name, Account, AccountCredentials, AccountId,
};
