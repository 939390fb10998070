mod token;
mod tunnel;

pub use token::TokenData;
pub use tunnel::Tunnel;
