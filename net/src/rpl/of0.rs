// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2023.

//! Objective Function Zero, OCP 0 (RFC 6552), grounded on
//! `rpl-of0.c`'s `net_rpl_of0_*` family.

use crate::rpl::instance::{DagHandle, RplInstance, INFINITE_RANK};
use crate::rpl::objective::ObjectiveFunction;
use crate::rpl::parent::RplParentData;

pub struct Of0;

impl ObjectiveFunction for Of0 {
    fn reset(&self, _dag: DagHandle) {}

    fn calc_rank(&self, instance: &RplInstance, parent: Option<&RplParentData>, base_rank: u16) -> u16 {
        let base = match (base_rank, parent) {
            (0, None) => return INFINITE_RANK,
            (0, Some(p)) => p.rank,
            (b, _) => b,
        };
        let increment = instance.min_hop_rank_inc;
        match base.checked_add(increment) {
            Some(r) if r >= base => r,
            _ => INFINITE_RANK,
        }
    }

    fn best_parent<'a>(
        &self,
        instance: &RplInstance,
        current_preferred: Option<&'a RplParentData>,
        a: &'a RplParentData,
        b: &'a RplParentData,
    ) -> bool {
        let min_hop = (instance.min_hop_rank_inc as u32).max(1);
        let dag_rank_a = a.rank as u32 / min_hop;
        let dag_rank_b = b.rank as u32 / min_hop;
        let rank_a = dag_rank_a * min_hop + a.link_metric as u32;
        let rank_b = dag_rank_b * min_hop + b.link_metric as u32;
        let min_difference = min_hop + min_hop / 2;

        if let Some(pref) = current_preferred {
            let is_a_current = core::ptr::eq(a, pref);
            let is_b_current = core::ptr::eq(b, pref);
            if is_a_current || is_b_current {
                let diff = rank_a.abs_diff(rank_b);
                if diff < min_difference {
                    return is_a_current;
                }
            }
        }
        rank_a < rank_b
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

    fn update_mc(&self, _instance: &RplInstance, _path_rank: u16) -> u16 {
        0
    }

    fn neighbor_link_cb(&self, _parent: &mut RplParentData, _status_ok: bool, _num_tx: u8) {}
}
