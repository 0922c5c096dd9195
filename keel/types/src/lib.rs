mod address;
mod commitment;
mod error;
mod filter;
mod pubkey;
mod user_stats;

pub use {address::*, commitment::*, error::*, filter::*, pubkey::*, user_stats::*};
