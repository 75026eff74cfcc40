pub mod assist;
pub mod bulk;
pub mod campaign;
pub mod email;
pub mod recipient;
pub mod session;
