//! Expense management.
//!
//! This module contains everything related to individual expenses:
//! - The `Expense` model and the `NewExpense` payload
//! - Database functions for storing, querying and deleting expenses
//! - The service functions that validate and default incoming expenses
//! - Route handlers for the expense endpoints

mod core;
mod create_endpoint;
mod delete_endpoint;
mod list_endpoints;
mod service;
mod update_endpoint;

pub use core::{Expense, NewExpense, create_expense_table};
pub use create_endpoint::{USER_ID_HEADER, create_expense_endpoint};
pub use delete_endpoint::delete_expense_endpoint;
pub use list_endpoints::{
    get_all_expenses_endpoint, get_merchant_range_expenses_endpoint, get_range_expenses_endpoint,
};
pub use service::{create_expense, list_expenses, list_expenses_in_range};
pub use update_endpoint::update_expense_endpoint;
