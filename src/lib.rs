//! Order Tracking - real-time socket layer for a food delivery marketplace
//!
//! Customers, restaurants, couriers and admins connect over WebSockets to
//! one of four namespaces, authenticate with a signed token, and receive
//! order status, location and broadcast events fanned out through rooms.

pub mod adapters;
pub mod app;
pub mod config;
pub mod domain;
pub mod ports;
