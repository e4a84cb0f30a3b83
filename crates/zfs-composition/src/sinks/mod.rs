// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! [`ReportSink`](crate::emitter::ReportSink) implementations for the
//! supported monitoring daemons.

pub mod collectd;
pub mod dogstatsd;

pub use collectd::CollectdSink;
pub use dogstatsd::DogStatsDSink;
