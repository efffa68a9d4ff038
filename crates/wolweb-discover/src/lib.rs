//! wolweb-discover: Finds devices on the local subnet.
//!
//! Probes every host address of the local IPv4 network so the OS fills its
//! neighbor cache, then reads and parses that cache into `(ip, mac)`
//! candidates. OS access goes through the capability traits in
//! `wolweb_core::probe`; `system` holds the real implementations.

pub mod error;
pub mod neighbor;
pub mod scanner;
pub mod subnet;
pub mod system;
