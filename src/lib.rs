#[macro_use] pub mod core;
#[macro_use] pub mod types;

pub mod cli;
pub mod config;
pub mod currency;
pub mod declaration;
pub mod errors;
pub mod report;
pub mod statement;
pub mod time;
pub mod transactions;
pub mod util;
pub mod valuation;

mod formatting;
mod http;
