// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

mod otel;

pub mod binding;
pub mod bindings;
pub mod client;
pub mod configs;
pub mod errors;
pub mod provider;
pub mod schema;
