//! REST API layer

pub mod actor;
pub mod audit;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod mapper;
pub mod openapi;
pub mod routes;
