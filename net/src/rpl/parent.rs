// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2023.

//! RPL parent data (component C4), extending a neighbor entry (§3).

use crate::rpl::instance::DagHandle;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct MetricContainer {
    /// ETX path metric reported by this parent, scaled by `mrhof::ETX_DIVISOR`.
    pub etx: u16,
}

impl MetricContainer {
    pub const NONE: MetricContainer = MetricContainer { etx: 0 };
}

#[derive(Copy, Clone, Debug)]
pub struct RplParentData {
    pub dag: DagHandle,
    pub rank: u16,
    pub dtsn: u8,
    pub metric: MetricContainer,
    pub last_tx_time: u32,
    pub link_metric: u16,
    pub link_metric_valid: bool,
    pub updated: bool,
}

impl RplParentData {
    pub fn new(dag: DagHandle, rank: u16) -> Self {
        RplParentData {
            dag,
            rank,
            dtsn: 0,
            metric: MetricContainer::NONE,
            last_tx_time: 0,
            link_metric: crate::config::INIT_LINK_METRIC,
            link_metric_valid: false,
            updated: false,
        }
    }
}
