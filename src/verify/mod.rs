//! Email verification flow: token issuance, redemption, and the
//! session-keyed resend throttle.

pub mod handlers;
mod machine;
mod resend;
mod token;

pub use machine::{RedeemOutcome, VerificationService};
pub use resend::{ResendPolicy, ResendThrottle};
pub use token::{generate_token, Delivery, TokenIssuer};
