// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2023.

//! RPL instance and DAG lifecycle (component C4, spec §3 "RPL DAG / Instance").

use crate::ip::IPAddr;
use crate::nbr::NeighborHandle;

pub const INFINITE_RANK: u16 = u16::MAX;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct InstanceHandle(pub u8);

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct DagHandle(pub u8);

impl DagHandle {
    pub const NONE: DagHandle = DagHandle(u8::MAX);
}

/// Mode of operation, RFC 6550 §6.3.1.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Mop {
    NoDownwardRoutes = 0,
    NonStoring = 1,
    StoringNoMulticast = 2,
    StoringWithMulticast = 3,
}

impl Mop {
    pub fn from_wire(v: u8) -> Option<Mop> {
        match v {
            0 => Some(Mop::NoDownwardRoutes),
            1 => Some(Mop::NonStoring),
            2 => Some(Mop::StoringNoMulticast),
            3 => Some(Mop::StoringWithMulticast),
            _ => None,
        }
    }

    pub fn requires_dao(&self) -> bool {
        !matches!(self, Mop::NoDownwardRoutes)
    }
}

/// RFC 6550 objective code point.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Ocp {
    Of0 = 0,
    Mrhof = 1,
}

impl Ocp {
    pub fn from_wire(v: u16) -> Option<Ocp> {
        match v {
            0 => Some(Ocp::Of0),
            1 => Some(Ocp::Mrhof),
            _ => None,
        }
    }
}

pub struct RplInstance {
    pub in_use: bool,
    pub instance_id: u8,
    pub ocp: Ocp,
    pub mop: Mop,
    pub dio_interval_min: u8,
    pub dio_doublings: u8,
    pub dio_redundancy: u8,
    pub default_lifetime: u8,
    pub lifetime_unit: u16,
    pub min_hop_rank_inc: u16,
    pub max_rank_inc: u16,
    pub dtsn: u8,
    pub current_dag: DagHandle,
    pub default_route_installed: bool,
}

impl RplInstance {
    pub const EMPTY: RplInstance = RplInstance {
        in_use: false,
        instance_id: 0,
        ocp: Ocp::Of0,
        mop: Mop::StoringNoMulticast,
        dio_interval_min: crate::config::DIO_INTERVAL_MIN,
        dio_doublings: crate::config::DIO_DOUBLINGS,
        dio_redundancy: crate::config::DIO_REDUNDANCY,
        default_lifetime: crate::config::DEFAULT_LIFETIME,
        lifetime_unit: crate::config::LIFETIME_UNIT,
        min_hop_rank_inc: crate::config::MIN_HOP_RANK_INC,
        max_rank_inc: crate::config::MIN_HOP_RANK_INC * 7,
        dtsn: 0,
        current_dag: DagHandle::NONE,
        default_route_installed: false,
    };

    pub fn root_rank(&self) -> u16 {
        self.min_hop_rank_inc
    }
}

pub struct RplDag {
    pub in_use: bool,
    pub instance: InstanceHandle,
    pub dag_id: IPAddr,
    pub version: u8,
    pub rank: u16,
    pub min_rank: u16,
    pub preference: u8,
    pub grounded: bool,
    pub joined: bool,
    pub prefix: IPAddr,
    pub prefix_len: u8,
    pub prefix_lifetime: u32,
    pub preferred_parent: Option<NeighborHandle>,
}

impl RplDag {
    pub const EMPTY: RplDag = RplDag {
        in_use: false,
        instance: InstanceHandle(0),
        dag_id: IPAddr::UNSPECIFIED,
        version: 0,
        rank: INFINITE_RANK,
        min_rank: INFINITE_RANK,
        preference: 0,
        grounded: false,
        joined: false,
        prefix: IPAddr::UNSPECIFIED,
        prefix_len: 0,
        prefix_lifetime: 0,
        preferred_parent: None,
    };

    pub fn is_root(&self, instance: &RplInstance) -> bool {
        self.rank == instance.root_rank() && self.preferred_parent.is_none()
    }
}
