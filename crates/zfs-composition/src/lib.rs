// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! ZFS space composition metrics.
//!
//! Samples free space per pool and the space used by each dataset and by its
//! snapshots, then reports every value as a gauge. The `zfs` binary
//! is invoked at most once per check interval; polls in between reuse the
//! cached sample.
//!
//! A poll cycle runs through the modules in this order:
//!
//! 1. [`cache`] decides whether the cached sample is stale
//! 2. [`sampler`] runs the queries through a [`command::CommandRunner`] and
//!    builds typed records ([`sample`]) from the parsed rows ([`table`])
//! 3. [`correlator`] groups the records under their pool
//! 4. [`emitter`] sanitizes the readings and hands them to one of the [`sinks`]

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod cache;
pub mod command;
pub mod config;
pub mod correlator;
pub mod emitter;
pub mod error;
pub mod hostname;
pub mod poller;
pub mod sample;
pub mod sampler;
pub mod sinks;
pub mod table;
