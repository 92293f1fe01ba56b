// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2023.

//! The RPL engine (component C4): instance/DAG lifecycle, parent set
//! maintenance, Trickle-governed DIO emission, DAO scheduling, and
//! local/global repair (RFC 6550, spec §4.4).

pub mod dao;
pub mod dio;
pub mod dis;
pub mod hbh;
pub mod instance;
pub mod mrhof;
pub mod objective;
pub mod of0;
pub mod parent;
pub mod repair;
pub mod trickle;

use crate::error::{NetError, NetResult};
use crate::ip::IPAddr;
use crate::lollipop;
use crate::nbr::{InterfaceId, NeighborExtra, NeighborHandle, NeighborTable};
use crate::route::{Preference, RouteSource, RouteTable};
use dao::{DaoAckMessage, DaoMessage, DaoOutcome, DaoScheduler};
use dio::DioMessage;
use instance::{DagHandle, InstanceHandle, Mop, Ocp, RplDag, RplInstance, INFINITE_RANK};
use objective::for_ocp;
use parent::RplParentData;
use trickle::Trickle;

/// Ties the instance/DAG pools together with their Trickle timers and
/// DAO scheduling state. `NI` is `MAX_INSTANCES`, `ND` the total DAG
/// pool (`MAX_INSTANCES * MAX_DAG_PER_INSTANCE`).
pub struct RplEngine<const NI: usize, const ND: usize> {
    instances: [RplInstance; NI],
    dags: [RplDag; ND],
    trickles: [Trickle; NI],
    dao: [DaoScheduler; NI],
}

impl<const NI: usize, const ND: usize> RplEngine<NI, ND> {
    pub fn new() -> Self {
        RplEngine {
            instances: core::array::from_fn(|_| RplInstance::EMPTY),
            dags: core::array::from_fn(|_| RplDag::EMPTY),
            trickles: core::array::from_fn(|_| {
                Trickle::new(
                    crate::config::DIO_INTERVAL_MIN,
                    crate::config::DIO_DOUBLINGS,
                    crate::config::DIO_REDUNDANCY,
                )
            }),
            dao: core::array::from_fn(|_| DaoScheduler::new()),
        }
    }

    pub fn instance(&self, h: InstanceHandle) -> Option<&RplInstance> {
        self.instances.get(h.0 as usize).filter(|i| i.in_use)
    }

    pub fn dag(&self, h: DagHandle) -> Option<&RplDag> {
        if h == DagHandle::NONE {
            return None;
        }
        self.dags.get(h.0 as usize).filter(|d| d.in_use)
    }

    pub fn dag_mut(&mut self, h: DagHandle) -> Option<&mut RplDag> {
        if h == DagHandle::NONE {
            return None;
        }
        self.dags.get_mut(h.0 as usize).filter(|d| d.in_use)
    }

    fn find_instance(&self, instance_id: u8) -> Option<InstanceHandle> {
        self.instances
            .iter()
            .position(|i| i.in_use && i.instance_id == instance_id)
            .map(|i| InstanceHandle(i as u8))
    }

    fn find_dag(&self, instance: InstanceHandle, dag_id: &IPAddr) -> Option<DagHandle> {
        self.dags
            .iter()
            .position(|d| d.in_use && d.instance == instance && d.dag_id == *dag_id)
            .map(|i| DagHandle(i as u8))
    }

    fn alloc_instance(&mut self) -> Option<InstanceHandle> {
        let idx = self.instances.iter().position(|i| !i.in_use)?;
        self.instances[idx] = RplInstance::EMPTY;
        self.instances[idx].in_use = true;
        Some(InstanceHandle(idx as u8))
    }

    fn alloc_dag(&mut self) -> Option<DagHandle> {
        let idx = self.dags.iter().position(|d| !d.in_use)?;
        self.dags[idx] = RplDag::EMPTY;
        self.dags[idx].in_use = true;
        Some(DagHandle(idx as u8))
    }

    pub fn trickle_mut(&mut self, instance: InstanceHandle) -> &mut Trickle {
        &mut self.trickles[instance.0 as usize]
    }

    pub fn dao_scheduler_mut(&mut self, instance: InstanceHandle) -> &mut DaoScheduler {
        &mut self.dao[instance.0 as usize]
    }

    pub fn reset_all_trickle(&mut self) {
        for (i, inst) in self.instances.iter().enumerate() {
            if inst.in_use {
                self.trickles[i].reset();
            }
        }
    }

    /// DIO receive, spec §4.4.3. `nbrs`/`sender` give access to the
    /// shared neighbor table so the sender's parent data can be
    /// created or updated in place.
    pub fn handle_dio<const N: usize>(
        &mut self,
        nbrs: &mut NeighborTable<N>,
        sender_iface: InterfaceId,
        sender: NeighborHandle,
        msg: &DioMessage,
    ) -> NetResult<dio::DioOutcome> {
        // A DioMessage's `mop` field is already a validated `Mop` (the
        // wire-layer parser drops anything outside 0..=3 before this
        // point); the only build-time restriction left to apply is a
        // forced MOP override (`config::MOP`), if configured.
        if let Some(forced) = crate::config::MOP {
            if msg.mop as u8 != forced {
                return Ok(dio::DioOutcome::Dropped);
            }
        }

        let instance_handle = match self.find_instance(msg.instance_id) {
            Some(h) => h,
            None => {
                let Some(h) = self.alloc_instance() else {
                    return Err(NetError::NoFreeEntry);
                };
                let inst = &mut self.instances[h.0 as usize];
                inst.instance_id = msg.instance_id;
                inst.ocp = msg.ocp;
                inst.mop = msg.mop;
                inst.dio_interval_min = msg.dio_interval_min;
                inst.dio_doublings = msg.dio_doublings;
                inst.dio_redundancy = msg.dio_redundancy;
                inst.default_lifetime = msg.default_lifetime;
                inst.lifetime_unit = msg.lifetime_unit;
                inst.min_hop_rank_inc = msg.min_hop_rank_inc;
                inst.max_rank_inc = msg.max_rank_inc;
                h
            }
        };

        let dag_handle = match self.find_dag(instance_handle, &msg.dag_id) {
            Some(h) => h,
            None => {
                let Some(h) = self.alloc_dag() else {
                    return Err(NetError::NoFreeEntry);
                };
                let dag = &mut self.dags[h.0 as usize];
                dag.instance = instance_handle;
                dag.dag_id = msg.dag_id;
                dag.version = msg.version;
                dag.preference = msg.preference;
                dag.grounded = msg.grounded;
                dag.min_rank = INFINITE_RANK;
                if let Some((prefix, len)) = msg.prefix {
                    dag.prefix = prefix;
                    dag.prefix_len = len;
                }
                self.instances[instance_handle.0 as usize].current_dag = h;
                self.trickles[instance_handle.0 as usize].reset();
                h
            }
        };

        let dag = &self.dags[dag_handle.0 as usize];
        if lollipop::greater(msg.version, dag.version) {
            let is_root = dag.rank == self.instances[instance_handle.0 as usize].root_rank()
                && dag.preferred_parent.is_none();
            if is_root {
                let dag_mut = &mut self.dags[dag_handle.0 as usize];
                dag_mut.version = msg.version;
                self.trickles[instance_handle.0 as usize].reset();
                return Ok(dio::DioOutcome::NoChange);
            }
            repair::global_repair_descendant(
                &mut self.dags[dag_handle.0 as usize],
                msg.version,
            );
            self.trickles[instance_handle.0 as usize].reset();
            return Ok(dio::DioOutcome::GlobalRepairStarted);
        } else if lollipop::greater(dag.version, msg.version) {
            if dag.joined {
                self.trickles[instance_handle.0 as usize].reset();
            }
            return Ok(dio::DioOutcome::InconsistentDropped);
        }

        if dag.rank == msg.rank {
            self.trickles[instance_handle.0 as usize].note_consistent();
        }

        if !nbrs.is_linked(sender) {
            return Ok(dio::DioOutcome::Dropped);
        }
        if nbrs.extra(sender).and_then(|e| e.as_rpl_parent()).is_none() {
            nbrs.set_extra(
                sender,
                NeighborExtra::RplParent(RplParentData::new(dag_handle, msg.rank)),
            );
        }
        let max_rank_inc = self.instances[instance_handle.0 as usize].max_rank_inc;
        let min_rank = self.dags[dag_handle.0 as usize].min_rank;
        if let Some(p) = nbrs.extra_mut(sender).and_then(|e| e.as_rpl_parent_mut()) {
            if msg.rank > min_rank && msg.rank - min_rank > max_rank_inc {
                return Ok(dio::DioOutcome::Dropped);
            }
            p.rank = msg.rank;
            p.dtsn = msg.dtsn;
            p.updated = true;
        }

        let outcome = self.run_parent_event(nbrs, instance_handle, dag_handle, sender, sender_iface);
        Ok(outcome)
    }

    fn run_parent_event<const N: usize>(
        &mut self,
        nbrs: &mut NeighborTable<N>,
        instance_h: InstanceHandle,
        dag_h: DagHandle,
        candidate: NeighborHandle,
        _iface: InterfaceId,
    ) -> dio::DioOutcome {
        let ocp = self.instances[instance_h.0 as usize].ocp;
        let of = for_ocp(ocp);

        let current_preferred = self.dags[dag_h.0 as usize].preferred_parent;
        let candidate_rank = nbrs
            .extra(candidate)
            .and_then(|e| e.as_rpl_parent())
            .map(|p| p.rank);
        let Some(candidate_rank) = candidate_rank else {
            return dio::DioOutcome::NoChange;
        };

        let should_switch = match current_preferred {
            None => true,
            Some(cur) if cur == candidate => false,
            Some(cur) => {
                let cur_data = nbrs.extra(cur).and_then(|e| e.as_rpl_parent()).copied();
                let cand_data = nbrs.extra(candidate).and_then(|e| e.as_rpl_parent()).copied();
                match (cur_data, cand_data) {
                    (Some(cur_d), Some(cand_d)) => {
                        let instance = &self.instances[instance_h.0 as usize];
                        !of.best_parent(instance, Some(&cur_d), &cur_d, &cand_d)
                    }
                    _ => false,
                }
            }
        };

        if should_switch {
            self.dags[dag_h.0 as usize].preferred_parent = Some(candidate);
            self.trickles[instance_h.0 as usize].reset();
        }

        let instance = &self.instances[instance_h.0 as usize];
        let new_rank = of.calc_rank(
            instance,
            nbrs.extra(candidate).and_then(|e| e.as_rpl_parent()),
            0,
        );
        self.dags[dag_h.0 as usize].rank = new_rank;
        if new_rank < self.dags[dag_h.0 as usize].min_rank {
            self.dags[dag_h.0 as usize].min_rank = new_rank;
        }
        self.dags[dag_h.0 as usize].joined = new_rank != INFINITE_RANK;

        let _ = candidate_rank;
        if new_rank == INFINITE_RANK {
            repair::local_repair(
                &mut self.dags[dag_h.0 as usize],
                &mut self.trickles[instance_h.0 as usize],
            );
            dio::DioOutcome::Dropped
        } else if should_switch {
            dio::DioOutcome::ParentUpdated
        } else {
            dio::DioOutcome::NoChange
        }
    }

    /// DAO-ACK receive (§4.4.4): cancels retransmission on match, or
    /// reports that local repair is warranted on rejection.
    pub fn handle_dao_ack(&mut self, instance_id: u8, ack: &DaoAckMessage) -> bool {
        let Some(h) = self.find_instance(instance_id) else {
            return false;
        };
        let sched = &mut self.dao[h.0 as usize];
        let matched = sched.on_ack(ack.sequence);
        matched && ack.is_rejection()
    }

    pub fn mop_of(&self, instance: InstanceHandle) -> Mop {
        self.instances[instance.0 as usize].mop
    }

    /// DAO receive, storing mode (§4.4.5). `sender` must already be a
    /// known neighbor; `was_multicast` distinguishes a flood DAO (no
    /// loop detection, no forwarding) from a unicast one. `R` is the
    /// downward route store's pool size.
    pub fn handle_dao<const N: usize, const R: usize>(
        &mut self,
        nbrs: &mut NeighborTable<N>,
        routes: &mut RouteTable<R>,
        sender_iface: InterfaceId,
        sender: NeighborHandle,
        was_multicast: bool,
        msg: &DaoMessage,
    ) -> NetResult<DaoOutcome> {
        let Some(instance_h) = self.find_instance(msg.instance_id) else {
            return Ok(DaoOutcome::Dropped);
        };
        let dag_h = if msg.has_dag_id {
            match self.find_dag(instance_h, &msg.dag_id) {
                Some(h) => h,
                None => return Ok(DaoOutcome::Dropped),
            }
        } else {
            self.instances[instance_h.0 as usize].current_dag
        };
        if dag_h == DagHandle::NONE {
            return Ok(DaoOutcome::Dropped);
        }

        // Loop detection (rpl.c `handle_dao`): a unicast DAO from a
        // node already known as a lower-rank descendant, or from our
        // own preferred parent, means a loop has formed upstream.
        if !was_multicast {
            let sender_is_lower_descendant = nbrs
                .extra(sender)
                .and_then(|e| e.as_rpl_parent())
                .filter(|p| p.dag == dag_h)
                .map(|p| p.rank < self.dags[dag_h.0 as usize].rank)
                .unwrap_or(false);
            let sender_is_preferred_parent = self.dags[dag_h.0 as usize].preferred_parent == Some(sender);
            if sender_is_lower_descendant || sender_is_preferred_parent {
                if let Some(p) = nbrs.extra_mut(sender).and_then(|e| e.as_rpl_parent_mut()) {
                    p.rank = INFINITE_RANK;
                    p.updated = true;
                }
                return Ok(DaoOutcome::LoopDetected);
            }
        }

        if msg.is_no_path() {
            let recorded = routes.note_no_path(sender_iface, &msg.target_prefix, msg.target_prefix_len, sender);
            if !recorded {
                return Ok(DaoOutcome::Dropped);
            }
            return if self.dags[dag_h.0 as usize].preferred_parent.is_some() {
                Ok(DaoOutcome::NoPathForwarded)
            } else {
                Ok(DaoOutcome::NoPathConsumed)
            };
        }

        let instance = &self.instances[instance_h.0 as usize];
        let lifetime_s = Some(instance.default_lifetime as u32 * instance.lifetime_unit as u32);
        let source = if was_multicast { RouteSource::MulticastDao } else { RouteSource::UnicastDao };
        routes
            .route_add(
                sender_iface,
                msg.target_prefix,
                msg.target_prefix_len,
                sender,
                dag_h,
                lifetime_s,
                Preference::Medium,
                source,
            )
            .map_err(|_| NetError::NoFreeEntry)?;

        let dag = &self.dags[dag_h.0 as usize];
        if !was_multicast && dag.preferred_parent.is_some() {
            Ok(DaoOutcome::Forwarded)
        } else if dag.is_root(&self.instances[instance_h.0 as usize]) && msg.ack_requested {
            Ok(DaoOutcome::AckRequired)
        } else {
            Ok(DaoOutcome::RouteInstalled)
        }
    }

    /// Builds and arms a DAO for `prefix/prefix_len` toward `parent`
    /// (§4.4.4, scenario §8.4). `parent` must already be bound to a
    /// link-layer address in the neighbor cache; unlike `handle_dio`,
    /// which creates that binding itself, sending a DAO presumes the
    /// neighbor relationship already exists.
    pub fn dao_send<const N: usize>(
        &mut self,
        nbrs: &NeighborTable<N>,
        parent: NeighborHandle,
        prefix: IPAddr,
        prefix_len: u8,
        lifetime: u8,
        now_ms: u32,
    ) -> NetResult<DaoMessage> {
        if !nbrs.is_linked(parent) {
            return Err(NetError::NotFound);
        }
        let instance_h = self
            .instances
            .iter()
            .position(|i| i.in_use)
            .map(|i| InstanceHandle(i as u8))
            .ok_or(NetError::NotFound)?;
        let instance_id = self.instances[instance_h.0 as usize].instance_id;
        let dag_h = self.instances[instance_h.0 as usize].current_dag;
        let dag = self.dag(dag_h).ok_or(NetError::NotFound)?;

        let sched = &mut self.dao[instance_h.0 as usize];
        let sequence = sched.pending_sequence.map(|s| s.wrapping_add(1)).unwrap_or(1);
        let ack_requested = crate::config::DAO_ACK;
        sched.arm_after_send(sequence, ack_requested, now_ms);

        Ok(DaoMessage {
            instance_id,
            has_dag_id: true,
            ack_requested,
            sequence,
            dag_id: dag.dag_id,
            target_prefix: prefix,
            target_prefix_len: prefix_len,
            lifetime,
            path_sequence: 0,
            path_control: 0,
        })
    }

    /// Builds a unicast DIO from `instance_h`'s current DAG state, for
    /// emission in response to a unicast DIS (§4.4.8).
    pub fn build_dio(&self, instance_h: InstanceHandle) -> Option<DioMessage> {
        let instance = self.instance(instance_h)?;
        let dag = self.dag(instance.current_dag)?;
        Some(DioMessage {
            instance_id: instance.instance_id,
            version: dag.version,
            rank: dag.rank,
            grounded: dag.grounded,
            mop: instance.mop,
            preference: dag.preference,
            dtsn: instance.dtsn,
            dag_id: dag.dag_id,
            ocp: instance.ocp,
            dio_interval_min: instance.dio_interval_min,
            dio_doublings: instance.dio_doublings,
            dio_redundancy: instance.dio_redundancy,
            min_hop_rank_inc: instance.min_hop_rank_inc,
            max_rank_inc: instance.max_rank_inc,
            default_lifetime: instance.default_lifetime,
            lifetime_unit: instance.lifetime_unit,
            prefix: if dag.prefix_len > 0 { Some((dag.prefix, dag.prefix_len)) } else { None },
        })
    }

    /// DIS receive dispatch (§4.4.8): a multicast DIS resets Trickle
    /// on every instance in use; a unicast one gets a unicast DIO back
    /// per instance in use, via `emit_dio`.
    pub fn handle_dis(&mut self, was_multicast: bool, mut emit_dio: impl FnMut(DioMessage)) {
        match dis::action_for(was_multicast) {
            dis::DisAction::ResetAllTrickle => self.reset_all_trickle(),
            dis::DisAction::RespondUnicast => {
                for i in 0..NI {
                    if self.instances[i].in_use {
                        if let Some(dio) = self.build_dio(InstanceHandle(i as u8)) {
                            emit_dio(dio);
                        }
                    }
                }
            }
        }
    }
}

impl<const NI: usize, const ND: usize> Default for RplEngine<NI, ND> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ip::MacAddress;

    fn addr(last: u8) -> IPAddr {
        let mut a = IPAddr::UNSPECIFIED;
        a.0[0] = 0x20;
        a.0[1] = 0x01;
        a.0[15] = last;
        a
    }

    fn dio_msg(rank: u16, dag_id: IPAddr) -> DioMessage {
        DioMessage {
            instance_id: 1,
            version: 240,
            rank,
            grounded: true,
            mop: Mop::StoringNoMulticast,
            preference: 0,
            dtsn: 0,
            dag_id,
            ocp: Ocp::Of0,
            dio_interval_min: 12,
            dio_doublings: 8,
            dio_redundancy: 10,
            min_hop_rank_inc: 256,
            max_rank_inc: 256 * 7,
            default_lifetime: 30,
            lifetime_unit: 60,
            prefix: Some((addr(0), 64)),
        }
    }

    #[test]
    fn dio_join_computes_rank_from_parent() {
        let mut nbrs: NeighborTable<4> = NeighborTable::new();
        let mut engine: RplEngine<2, 2> = RplEngine::new();
        let iface = InterfaceId(0);
        let parent = nbrs.alloc().unwrap();
        nbrs.link(parent, iface, MacAddress::Short(5)).unwrap();

        let outcome = engine.handle_dio(&mut nbrs, iface, parent, &dio_msg(256, addr(0))).unwrap();
        assert_eq!(outcome, dio::DioOutcome::ParentUpdated);
        let dag_h = engine.instances[0].current_dag;
        assert!(engine.dags[dag_h.0 as usize].rank > 256);
    }

    #[test]
    fn unicast_dis_gets_a_unicast_dio_back() {
        let mut nbrs: NeighborTable<4> = NeighborTable::new();
        let mut engine: RplEngine<2, 2> = RplEngine::new();
        let iface = InterfaceId(0);
        let parent = nbrs.alloc().unwrap();
        // Unlinked sender: handle_dio still creates the instance/DAG
        // (only the parent-event step is skipped).
        engine.handle_dio(&mut nbrs, iface, parent, &dio_msg(256, addr(0))).unwrap();

        let mut emitted = None;
        engine.handle_dis(false, |msg| emitted = Some(msg));
        let dio = emitted.expect("a unicast DIS must produce a unicast DIO");
        assert_eq!(dio.instance_id, 1);
    }

    #[test]
    fn multicast_dis_resets_trickle_without_emitting() {
        let mut engine: RplEngine<2, 2> = RplEngine::new();
        let mut emitted = 0;
        engine.handle_dis(true, |_| emitted += 1);
        assert_eq!(emitted, 0);
    }

    #[test]
    fn dao_send_requires_a_linked_neighbor() {
        let mut nbrs: NeighborTable<4> = NeighborTable::new();
        let mut engine: RplEngine<2, 2> = RplEngine::new();
        let parent = nbrs.alloc().unwrap();
        engine.handle_dio(&mut nbrs, InterfaceId(0), parent, &dio_msg(256, addr(0))).unwrap();

        assert_eq!(
            engine.dao_send(&nbrs, parent, addr(9), 64, 30, 0).unwrap_err(),
            NetError::NotFound
        );

        nbrs.link(parent, InterfaceId(0), MacAddress::Short(7)).unwrap();
        let msg = engine.dao_send(&nbrs, parent, addr(9), 64, 30, 0).unwrap();
        assert_eq!(msg.target_prefix_len, 64);
        assert!(msg.ack_requested);
    }

    #[test]
    fn dao_receive_installs_route_with_no_preferred_parent() {
        let mut nbrs: NeighborTable<4> = NeighborTable::new();
        let mut routes: RouteTable<4> = RouteTable::new();
        let mut engine: RplEngine<2, 2> = RplEngine::new();
        let iface = InterfaceId(0);
        let root_neighbor = nbrs.alloc().unwrap();
        engine.handle_dio(&mut nbrs, iface, root_neighbor, &dio_msg(256, addr(0))).unwrap();

        let sender = nbrs.alloc().unwrap();
        nbrs.link(sender, iface, MacAddress::Short(2)).unwrap();

        let msg = DaoMessage {
            instance_id: 1,
            has_dag_id: true,
            ack_requested: false,
            sequence: 1,
            dag_id: addr(0),
            target_prefix: addr(5),
            target_prefix_len: 64,
            lifetime: 30,
            path_sequence: 0,
            path_control: 0,
        };
        let outcome = engine.handle_dao(&mut nbrs, &mut routes, iface, sender, false, &msg).unwrap();
        assert_eq!(outcome, DaoOutcome::RouteInstalled);
        assert!(routes.route_lookup(Some(iface), &addr(5)).is_some());
    }

    #[test]
    fn dao_no_path_marks_route_and_is_consumed_without_a_parent() {
        let mut nbrs: NeighborTable<4> = NeighborTable::new();
        let mut routes: RouteTable<4> = RouteTable::new();
        let mut engine: RplEngine<2, 2> = RplEngine::new();
        let iface = InterfaceId(0);
        let root_neighbor = nbrs.alloc().unwrap();
        engine.handle_dio(&mut nbrs, iface, root_neighbor, &dio_msg(256, addr(0))).unwrap();
        let dag_h = engine.instances[0].current_dag;

        let sender = nbrs.alloc().unwrap();
        nbrs.link(sender, iface, MacAddress::Short(3)).unwrap();
        routes
            .route_add(iface, addr(5), 64, sender, dag_h, Some(1800), Preference::Medium, RouteSource::UnicastDao)
            .unwrap();

        let msg = DaoMessage {
            instance_id: 1,
            has_dag_id: true,
            ack_requested: false,
            sequence: 2,
            dag_id: addr(0),
            target_prefix: addr(5),
            target_prefix_len: 64,
            lifetime: 0,
            path_sequence: 0,
            path_control: 0,
        };
        let outcome = engine.handle_dao(&mut nbrs, &mut routes, iface, sender, false, &msg).unwrap();
        assert_eq!(outcome, DaoOutcome::NoPathConsumed);
        assert!(routes.route_lookup(Some(iface), &addr(5)).unwrap().no_path_received);
    }

    #[test]
    fn dao_from_lower_rank_descendant_is_loop_detected() {
        let mut nbrs: NeighborTable<4> = NeighborTable::new();
        let mut routes: RouteTable<4> = RouteTable::new();
        let mut engine: RplEngine<2, 2> = RplEngine::new();
        let iface = InterfaceId(0);
        let root_neighbor = nbrs.alloc().unwrap();
        engine.handle_dio(&mut nbrs, iface, root_neighbor, &dio_msg(256, addr(0))).unwrap();
        let dag_h = engine.instances[0].current_dag;
        engine.dags[dag_h.0 as usize].rank = 512;

        let sender = nbrs.alloc().unwrap();
        nbrs.link(sender, iface, MacAddress::Short(4)).unwrap();
        nbrs.set_extra(sender, NeighborExtra::RplParent(RplParentData::new(dag_h, 256)));

        let msg = DaoMessage {
            instance_id: 1,
            has_dag_id: true,
            ack_requested: false,
            sequence: 3,
            dag_id: addr(0),
            target_prefix: addr(5),
            target_prefix_len: 64,
            lifetime: 30,
            path_sequence: 0,
            path_control: 0,
        };
        let outcome = engine.handle_dao(&mut nbrs, &mut routes, iface, sender, false, &msg).unwrap();
        assert_eq!(outcome, DaoOutcome::LoopDetected);
        let rank = nbrs.extra(sender).and_then(|e| e.as_rpl_parent()).unwrap().rank;
        assert_eq!(rank, INFINITE_RANK);
    }
}
