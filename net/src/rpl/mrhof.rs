// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2023.

//! Minimum Rank with Hysteresis Objective Function, OCP 1 (RFC 6719),
//! grounded on `rpl-mrhof.c`'s `net_rpl_mrhof_*` family.

use crate::rpl::instance::{DagHandle, RplInstance, INFINITE_RANK};
use crate::rpl::objective::ObjectiveFunction;
use crate::rpl::parent::RplParentData;

/// Scale factor applied to ETX values (RFC 6551, `rpl.h`'s
/// `NET_RPL_MC_ETX_DIVISOR`).
pub const ETX_DIVISOR: u16 = 256;

const MAX_LINK_METRIC: u16 = 10 * ETX_DIVISOR;
const MAX_PATH_COST: u32 = 100 * ETX_DIVISOR as u32;
const PARENT_SWITCH_THRESHOLD_DIV: u16 = 2;
const ETX_SCALE: u32 = 100;
const ETX_ALPHA: u32 = 90;

pub struct Mrhof;

impl Mrhof {
    fn path_cost(&self, parent: &RplParentData) -> u32 {
        (parent.metric.etx as u32 + parent.link_metric as u32).min(MAX_PATH_COST)
    }
}

impl ObjectiveFunction for Mrhof {
    fn reset(&self, _dag: DagHandle) {}

    fn calc_rank(&self, _instance: &RplInstance, parent: Option<&RplParentData>, base_rank: u16) -> u16 {
        let Some(parent) = parent else {
            return INFINITE_RANK;
        };
        let base = if base_rank == 0 { parent.rank } else { base_rank };
        let increase = if parent.link_metric_valid {
            parent.link_metric
        } else {
            crate::config::INIT_LINK_METRIC
        };
        if INFINITE_RANK - base < increase {
            INFINITE_RANK
        } else {
            base + increase
        }
    }

    fn best_parent<'a>(
        &self,
        _instance: &RplInstance,
        current_preferred: Option<&'a RplParentData>,
        a: &'a RplParentData,
        b: &'a RplParentData,
    ) -> bool {
        let min_diff = (ETX_DIVISOR / PARENT_SWITCH_THRESHOLD_DIV) as u32;
        let cost_a = self.path_cost(a);
        let cost_b = self.path_cost(b);

        if let Some(pref) = current_preferred {
            let is_a_current = core::ptr::eq(a, pref);
            let is_b_current = core::ptr::eq(b, pref);
            if is_a_current || is_b_current {
                if cost_a.abs_diff(cost_b) < min_diff {
                    return is_a_current;
                }
            }
        }
        cost_a < cost_b
    }

    fn best_dag(&self, dag_a: (bool, u8, u16), dag_b: (bool, u8, u16)) -> bool {
        let (grounded_a, pref_a, rank_a) = dag_a;
        let (grounded_b, pref_b, rank_b) = dag_b;
        if grounded_a != grounded_b {
            return grounded_a;
        }
        if pref_a != pref_b {
            return pref_a > pref_b;
        }
        rank_a < rank_b
    }

    fn update_mc(&self, _instance: &RplInstance, path_rank: u16) -> u16 {
        path_rank
    }

    fn neighbor_link_cb(&self, parent: &mut RplParentData, status_ok: bool, num_tx: u8) {
        if status_ok {
            return;
        }
        let packet_etx = (num_tx as u32) * ETX_DIVISOR as u32;
        let recorded = parent.link_metric as u32;
        let new_etx = if parent.link_metric_valid {
            (recorded * ETX_ALPHA + packet_etx * (ETX_SCALE - ETX_ALPHA)) / ETX_SCALE
        } else {
            parent.link_metric_valid = true;
            packet_etx
        };
        parent.link_metric = new_etx.min(MAX_LINK_METRIC as u32) as u16;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpl::instance::DagHandle;

    #[test]
    fn link_metric_moving_average_tracks_losses() {
        let mrhof = Mrhof;
        let mut parent = RplParentData::new(DagHandle(0), 256);
        parent.link_metric = ETX_DIVISOR;
        parent.link_metric_valid = true;
        mrhof.neighbor_link_cb(&mut parent, false, 2);
        assert!(parent.link_metric > ETX_DIVISOR);
    }
}
