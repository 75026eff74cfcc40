pub mod auth;
pub mod campaigns;
pub mod email;
pub mod extract;
pub mod health;
pub mod recipients;
