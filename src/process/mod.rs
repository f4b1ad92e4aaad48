// Process supervision module
//
// Lifecycle management for the ngrok agent child process and the
// asynchronous consumption of its log output.

pub mod log_stream;
pub mod supervisor;

pub use log_stream::{extract_addr, LogLine, LogStream};
pub use supervisor::NgrokSupervisor;
