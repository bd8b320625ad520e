//! Business logic behind the PunchOut endpoints.

pub mod identity;
pub mod order_return;
pub mod session_token;
