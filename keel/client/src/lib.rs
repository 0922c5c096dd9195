mod error;
mod referral;
mod rpc;
mod traits;

pub use {error::*, referral::*, rpc::*, traits::*};
