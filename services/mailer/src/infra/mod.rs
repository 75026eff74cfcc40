pub mod db;
pub mod http;
pub mod nylas;
pub mod openai;
pub mod retry;
pub mod session;
