//! Wire-level helpers: the token exchange and response classification.

mod classify;
mod token;

pub(crate) use classify::classify;
pub(crate) use token::exchange_client_credentials;
