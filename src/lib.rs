pub mod logger;
pub mod settings;

pub mod client;
pub mod sandbox;

pub mod application_impl;
pub mod application_port;
pub mod domain_model;
pub mod domain_port;
pub mod infra_http;
pub mod infra_local;
pub mod infra_redis;
