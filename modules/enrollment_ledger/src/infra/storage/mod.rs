//! Storage layer - database entities, migrations and row operations

pub mod entity;
pub mod ledger;
pub mod mapper;
pub mod migrations;
pub mod repositories;
