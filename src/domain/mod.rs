//! Domain model and ports. Nothing in here talks to the network or disk.

pub mod gateway;
pub mod payment;
pub mod ports;
