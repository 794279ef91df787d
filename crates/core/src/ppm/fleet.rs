//! Fleet telemetry snapshot
//!
//! Merges local telemetry with the fresh part of the peer status table. Stale
//! records are skipped here and nowhere else, so every consumer of a
//! `FleetSnapshot` sees the same fleet.

use heapless::Vec;

use super::config::CruiseStatus;
use super::math::abs;
use crate::traits::{PeerBus, PeerStatus, MAX_PEERS};

/// Fresh peer records in table order
pub fn fresh_peers<B: PeerBus>(bus: &B, now_ms: u32) -> Vec<PeerStatus, MAX_PEERS> {
    let mut peers = Vec::new();
    for index in 0..MAX_PEERS {
        if let Some(status) = bus.status(index) {
            if status.is_fresh(now_ms) {
                // Capacity equals the table size
                let _ = peers.push(status);
            }
        }
    }
    peers
}

/// Telemetry of this node plus fresh peers for one loop cycle
#[derive(Debug, Clone)]
pub struct FleetSnapshot {
    pub rpm_local: f32,
    /// Fresh rpm with the smallest magnitude, local first, first wins ties
    pub rpm_lowest: f32,
    /// Mean rpm over local and fresh peers
    pub mid_rpm: f32,
    /// Merged cruise status
    pub cruise: CruiseStatus,
    peers: Vec<PeerStatus, MAX_PEERS>,
}

impl FleetSnapshot {
    /// Snapshot with only local telemetry
    pub fn local(rpm_local: f32, cruise: CruiseStatus) -> Self {
        Self {
            rpm_local,
            rpm_lowest: rpm_local,
            mid_rpm: rpm_local,
            cruise,
            peers: Vec::new(),
        }
    }

    /// Collect the fleet view; peers are only consulted when `multi_node`
    ///
    /// The cruise status starts from the local one and is overridden by the
    /// most recently received active status among fresh peers.
    pub fn collect<B: PeerBus>(
        rpm_local: f32,
        local_cruise: CruiseStatus,
        bus: &B,
        multi_node: bool,
        now_ms: u32,
    ) -> Self {
        let mut snapshot = Self::local(rpm_local, local_cruise);
        if !multi_node {
            return snapshot;
        }

        snapshot.peers = fresh_peers(bus, now_ms);

        let mut rpm_sum = rpm_local;
        let mut newest_cruise_age: Option<u32> = None;
        for peer in snapshot.peers.iter() {
            rpm_sum += peer.rpm;
            if abs(peer.rpm) < abs(snapshot.rpm_lowest) {
                snapshot.rpm_lowest = peer.rpm;
            }
            if peer.cruise.is_active() {
                let age = now_ms.wrapping_sub(peer.rx_time_ms);
                if newest_cruise_age.map_or(true, |newest| age < newest) {
                    newest_cruise_age = Some(age);
                    snapshot.cruise = peer.cruise;
                }
            }
        }
        snapshot.mid_rpm = rpm_sum / (snapshot.peers.len() + 1) as f32;
        snapshot
    }

    /// Fresh peers in table order
    pub fn peers(&self) -> &[PeerStatus] {
        &self.peers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MockBus;

    fn peer(id: u8, rpm: f32, cruise: CruiseStatus, rx_time_ms: u32) -> Option<PeerStatus> {
        Some(PeerStatus {
            id,
            rpm,
            cruise,
            rx_time_ms,
        })
    }

    #[test]
    fn single_node_ignores_bus() {
        let bus = MockBus::new();
        bus.set_peer(0, peer(1, 10.0, CruiseStatus::ActiveLeft, 1_000));
        let fleet = FleetSnapshot::collect(500.0, CruiseStatus::Inactive, &bus, false, 1_000);
        assert_eq!(fleet.mid_rpm, 500.0);
        assert_eq!(fleet.rpm_lowest, 500.0);
        assert_eq!(fleet.cruise, CruiseStatus::Inactive);
        assert!(fleet.peers().is_empty());
    }

    #[test]
    fn stale_peers_are_excluded() {
        let bus = MockBus::new();
        bus.set_peer(0, peer(1, 100.0, CruiseStatus::ActiveLeft, 800));
        bus.set_peer(2, peer(3, 300.0, CruiseStatus::Inactive, 990));
        let fleet = FleetSnapshot::collect(500.0, CruiseStatus::Inactive, &bus, true, 1_000);
        assert_eq!(fleet.peers().len(), 1);
        assert_eq!(fleet.peers()[0].id, 3);
        assert_eq!(fleet.mid_rpm, 400.0);
        assert_eq!(fleet.rpm_lowest, 300.0);
        assert_eq!(fleet.cruise, CruiseStatus::Inactive);
    }

    #[test]
    fn lowest_magnitude_keeps_sign_and_first_tie() {
        let bus = MockBus::new();
        bus.set_peer(0, peer(1, -200.0, CruiseStatus::Inactive, 1_000));
        bus.set_peer(1, peer(2, 200.0, CruiseStatus::Inactive, 1_000));
        let fleet = FleetSnapshot::collect(900.0, CruiseStatus::Inactive, &bus, true, 1_000);
        assert_eq!(fleet.rpm_lowest, -200.0);

        // Local is scanned first and wins an exact tie
        let fleet = FleetSnapshot::collect(-200.0, CruiseStatus::Inactive, &bus, true, 1_000);
        assert_eq!(fleet.rpm_lowest, -200.0);
        let fleet = FleetSnapshot::collect(200.0, CruiseStatus::Inactive, &bus, true, 1_000);
        assert_eq!(fleet.rpm_lowest, 200.0);
    }

    #[test]
    fn newest_active_cruise_wins() {
        let bus = MockBus::new();
        bus.set_peer(0, peer(1, 0.0, CruiseStatus::ActiveRight, 990));
        bus.set_peer(1, peer(2, 0.0, CruiseStatus::ActiveLeft, 995));
        bus.set_peer(2, peer(3, 0.0, CruiseStatus::Inactive, 999));
        let fleet = FleetSnapshot::collect(0.0, CruiseStatus::Inactive, &bus, true, 1_000);
        assert_eq!(fleet.cruise, CruiseStatus::ActiveLeft);
    }

    #[test]
    fn local_cruise_stands_without_active_peer() {
        let bus = MockBus::new();
        bus.set_peer(0, peer(1, 0.0, CruiseStatus::Inactive, 1_000));
        let fleet = FleetSnapshot::collect(0.0, CruiseStatus::ActiveRight, &bus, true, 1_000);
        assert_eq!(fleet.cruise, CruiseStatus::ActiveRight);
    }
}
