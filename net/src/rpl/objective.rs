// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2023.

//! The pluggable Objective Function contract (RFC 6550 §16, spec
//! §4.4.1). Exactly mirrors the alias-based dispatch `rpl-of0.c` and
//! `rpl-mrhof.c` use in the original, but as a trait object selected
//! once per instance by `Ocp` rather than a link-time alias.

use crate::rpl::instance::{DagHandle, Ocp, RplInstance};
use crate::rpl::mrhof::Mrhof;
use crate::rpl::of0::Of0;
use crate::rpl::parent::RplParentData;

pub trait ObjectiveFunction {
    fn reset(&self, dag: DagHandle);
    fn calc_rank(&self, instance: &RplInstance, parent: Option<&RplParentData>, base_rank: u16) -> u16;
    /// Returns `true` if `a` is the better parent of the pair.
    fn best_parent<'a>(
        &self,
        instance: &RplInstance,
        current_preferred: Option<&'a RplParentData>,
        a: &'a RplParentData,
        b: &'a RplParentData,
    ) -> bool;
    /// `(grounded, preference, rank)` per candidate; `true` if `a` wins.
    fn best_dag(&self, dag_a: (bool, u8, u16), dag_b: (bool, u8, u16)) -> bool;
    fn update_mc(&self, instance: &RplInstance, path_rank: u16) -> u16;
    fn neighbor_link_cb(&self, parent: &mut RplParentData, status_ok: bool, num_tx: u8);
}

pub fn for_ocp(ocp: Ocp) -> &'static dyn ObjectiveFunction {
    match ocp {
        Ocp::Of0 => &Of0,
        Ocp::Mrhof => &Mrhof,
    }
}
