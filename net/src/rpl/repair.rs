// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2023.

//! Local and global repair (RFC 6550 §8.2, spec §4.4.7). These are
//! free functions over a single `RplDag`/`RplInstance` pair rather
//! than methods on `RplEngine`, since both call sites (DIO handling
//! and DAO-ACK rejection) need only the one DAG in question plus a
//! trickle handle to reset.

use crate::lollipop;
use crate::rpl::instance::{RplDag, RplInstance, INFINITE_RANK};
use crate::rpl::trickle::Trickle;

/// Sets the DAG to infinite rank and clears its preferred parent.
/// Callers are responsible for walking the neighbor table to drop the
/// now-orphaned parents and for emitting the No-Path DAO / removing
/// the default route for the lost preferred parent, since that needs
/// the shared neighbor table lock this module does not hold.
pub fn local_repair(dag: &mut RplDag, trickle: &mut Trickle) {
    dag.rank = INFINITE_RANK;
    dag.preferred_parent = None;
    dag.joined = false;
    trickle.reset();
}

/// Root-only: bump DAG version and instance DTSN, reset Trickle so
/// the new version propagates.
pub fn global_repair(dag: &mut RplDag, instance: &mut RplInstance, trickle: &mut Trickle) {
    dag.version = lollipop::increment(dag.version);
    instance.dtsn = lollipop::increment(instance.dtsn);
    trickle.reset();
}

/// A non-root node observing a newer DAG version: adopt it and clear
/// the parent set so rank is recomputed from scratch against the new
/// version (§4.4.3 rule 3). The caller still owns sending the
/// No-Path DAO / dropping the previous preferred parent's route.
pub fn global_repair_descendant(dag: &mut RplDag, new_version: u8) {
    dag.version = new_version;
    dag.preferred_parent = None;
    dag.rank = INFINITE_RANK;
    dag.min_rank = INFINITE_RANK;
    dag.joined = false;
}
