//! Fuel Service - delivery orders, LPOs and per-truck fuel ledgers.

pub mod config;
pub mod domain;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
