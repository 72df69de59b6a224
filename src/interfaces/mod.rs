//! Inbound/outbound data interfaces for the replay binary.

pub mod csv;
