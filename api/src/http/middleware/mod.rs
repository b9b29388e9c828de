/// Middleware modules

pub mod access_log;
pub mod request_id;
pub mod session_gate;
