//! Authentication infrastructure module
//!
//! Signed session tokens and team passcodes.

mod passcode;
mod token;

pub use passcode::{
    FixedPasscodeGenerator, IssuedPasscode, PasscodeAuthenticator, PasscodeGenerator,
    PasscodeHashCost, RandomPasscodeGenerator, secret_matches,
};
pub use token::SignedTokenCodec;
