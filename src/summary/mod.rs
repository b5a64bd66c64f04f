//! Grouped counts and summaries of a user's expenses.

mod aggregation;
mod endpoints;
mod queries;
mod timeframe;

pub use aggregation::{MerchantSummary, TimeframeCount, UserSummary};
pub use endpoints::{
    get_expense_count_endpoint, get_merchant_summary_endpoint, get_user_summary_endpoint,
};
pub use timeframe::Timeframe;
