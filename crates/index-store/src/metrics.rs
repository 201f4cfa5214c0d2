/*
 * Copyright 2026-present ScyllaDB
 * SPDX-License-Identifier: LicenseRef-ScyllaDB-Source-Available-1.0
 */

use prometheus::IntCounter;
use prometheus::IntCounterVec;
use prometheus::Opts;
use prometheus::Registry;

pub const INTERNAL_DESTINATION: &str = "internal";
pub const EXTERNAL_DESTINATION: &str = "external";

/// Engine counters. Created unregistered; the host registers them against
/// its own registry.
pub struct Metrics {
    pub written: IntCounterVec,
    pub write_failures: IntCounterVec,
    pub classify_fallbacks: IntCounter,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            written: IntCounterVec::new(
                Opts::new(
                    "index_store_written_mutations",
                    "Index mutations routed to a destination store",
                ),
                &["destination"],
            )
            .expect("written mutations counter should be created"),
            write_failures: IntCounterVec::new(
                Opts::new(
                    "index_store_write_failures",
                    "Index write batches rejected by a destination store",
                ),
                &["destination"],
            )
            .expect("write failures counter should be created"),
            classify_fallbacks: IntCounter::new(
                "index_store_classify_fallbacks",
                "Batches routed to the internal store after a metadata lookup failure",
            )
            .expect("classify fallbacks counter should be created"),
        }
    }

    pub fn register(&self, registry: &Registry) -> prometheus::Result<()> {
        registry.register(Box::new(self.written.clone()))?;
        registry.register(Box::new(self.write_failures.clone()))?;
        registry.register(Box::new(self.classify_fallbacks.clone()))?;
        Ok(())
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
