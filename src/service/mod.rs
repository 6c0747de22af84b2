pub mod email_service;
pub mod handler;
pub mod otp_service;
pub mod token_service;
pub mod user_service;
