//! Peer bus collaborator
//!
//! Framing, arbitration and status-table upkeep belong to the bus driver.
//! The core only reads the status table and issues fire-and-forget sends.

use core::cell::{Cell, RefCell};

use crate::ppm::CruiseStatus;

/// Number of peer status records kept by the bus driver
pub const MAX_PEERS: usize = 3;

/// Age (ms) after which a peer record no longer counts as part of the fleet
pub const MAX_PEER_AGE_MS: u32 = 100;

/// Bus send error types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// Transmit queue is full
    QueueFull,
    /// Destination id is not known to the driver
    UnknownPeer,
}

impl core::fmt::Display for BusError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BusError::QueueFull => write!(f, "bus transmit queue full"),
            BusError::UnknownPeer => write!(f, "unknown bus peer"),
        }
    }
}

/// Latest status frame received from one peer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeerStatus {
    pub id: u8,
    /// Electrical speed (erpm, signed)
    pub rpm: f32,
    pub cruise: CruiseStatus,
    /// Receive timestamp (ms, wrapping)
    pub rx_time_ms: u32,
}

impl PeerStatus {
    /// Whether the record is young enough to take part in fleet decisions
    pub fn is_fresh(&self, now_ms: u32) -> bool {
        now_ms.wrapping_sub(self.rx_time_ms) < MAX_PEER_AGE_MS
    }
}

/// Peer bus interface (platform-independent)
pub trait PeerBus {
    /// Status record at `index` (0..MAX_PEERS), `None` if the slot is unused
    fn status(&self, index: usize) -> Option<PeerStatus>;

    /// Absolute current command (A)
    fn send_current(&self, id: u8, amps: f32) -> Result<(), BusError>;

    /// Current relative to the peer's limits (-1.0..=1.0)
    fn send_current_rel(&self, id: u8, rel: f32) -> Result<(), BusError>;

    /// Brake current relative to the peer's limits (0.0..=1.0)
    fn send_current_brake_rel(&self, id: u8, rel: f32) -> Result<(), BusError>;

    /// Speed command carrying the fleet cruise status
    fn send_rpm(&self, id: u8, erpm: f32, cruise: CruiseStatus) -> Result<(), BusError>;

    fn send_duty(&self, id: u8, duty: f32) -> Result<(), BusError>;

    fn send_position(&self, id: u8, degrees: f32) -> Result<(), BusError>;

    /// Tell a peer that this node lost its command stream
    fn notify_timeout(&self, id: u8) -> Result<(), BusError>;
}

impl<T: PeerBus + ?Sized> PeerBus for &T {
    fn status(&self, index: usize) -> Option<PeerStatus> {
        (**self).status(index)
    }
    fn send_current(&self, id: u8, amps: f32) -> Result<(), BusError> {
        (**self).send_current(id, amps)
    }
    fn send_current_rel(&self, id: u8, rel: f32) -> Result<(), BusError> {
        (**self).send_current_rel(id, rel)
    }
    fn send_current_brake_rel(&self, id: u8, rel: f32) -> Result<(), BusError> {
        (**self).send_current_brake_rel(id, rel)
    }
    fn send_rpm(&self, id: u8, erpm: f32, cruise: CruiseStatus) -> Result<(), BusError> {
        (**self).send_rpm(id, erpm, cruise)
    }
    fn send_duty(&self, id: u8, duty: f32) -> Result<(), BusError> {
        (**self).send_duty(id, duty)
    }
    fn send_position(&self, id: u8, degrees: f32) -> Result<(), BusError> {
        (**self).send_position(id, degrees)
    }
    fn notify_timeout(&self, id: u8) -> Result<(), BusError> {
        (**self).notify_timeout(id)
    }
}

// ============================================================================
// Mock Implementation (always available for testing)
// ============================================================================

/// Message captured by [`MockBus`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PeerMessage {
    Current(f32),
    CurrentRel(f32),
    BrakeRel(f32),
    Rpm(f32, CruiseStatus),
    Duty(f32),
    Position(f32),
    Timeout,
}

/// Capacity of the mock's sent-message log
pub const MOCK_BUS_LOG: usize = 32;

/// Mock bus with a settable status table and a bounded log of sends
#[derive(Default)]
pub struct MockBus {
    peers: Cell<[Option<PeerStatus>; MAX_PEERS]>,
    sent: RefCell<heapless::Vec<(u8, PeerMessage), MOCK_BUS_LOG>>,
    full: Cell<bool>,
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_peer(&self, index: usize, status: Option<PeerStatus>) {
        let mut peers = self.peers.get();
        if let Some(slot) = peers.get_mut(index) {
            *slot = status;
        }
        self.peers.set(peers);
    }

    /// Make every send fail with `BusError::QueueFull`
    pub fn set_queue_full(&self, full: bool) {
        self.full.set(full);
    }

    /// Messages sent since the last `clear`, oldest first
    pub fn sent(&self) -> heapless::Vec<(u8, PeerMessage), MOCK_BUS_LOG> {
        self.sent.borrow().clone()
    }

    /// Last message sent to `id`
    pub fn last_to(&self, id: u8) -> Option<PeerMessage> {
        self.sent
            .borrow()
            .iter()
            .rev()
            .find(|(to, _)| *to == id)
            .map(|(_, msg)| *msg)
    }

    pub fn clear(&self) {
        self.sent.borrow_mut().clear();
    }

    fn push(&self, id: u8, message: PeerMessage) -> Result<(), BusError> {
        if self.full.get() {
            return Err(BusError::QueueFull);
        }
        let mut sent = self.sent.borrow_mut();
        if sent.is_full() {
            sent.remove(0);
        }
        sent.push((id, message)).map_err(|_| BusError::QueueFull)
    }
}

impl PeerBus for MockBus {
    fn status(&self, index: usize) -> Option<PeerStatus> {
        self.peers.get().get(index).copied().flatten()
    }

    fn send_current(&self, id: u8, amps: f32) -> Result<(), BusError> {
        self.push(id, PeerMessage::Current(amps))
    }

    fn send_current_rel(&self, id: u8, rel: f32) -> Result<(), BusError> {
        self.push(id, PeerMessage::CurrentRel(rel))
    }

    fn send_current_brake_rel(&self, id: u8, rel: f32) -> Result<(), BusError> {
        self.push(id, PeerMessage::BrakeRel(rel))
    }

    fn send_rpm(&self, id: u8, erpm: f32, cruise: CruiseStatus) -> Result<(), BusError> {
        self.push(id, PeerMessage::Rpm(erpm, cruise))
    }

    fn send_duty(&self, id: u8, duty: f32) -> Result<(), BusError> {
        self.push(id, PeerMessage::Duty(duty))
    }

    fn send_position(&self, id: u8, degrees: f32) -> Result<(), BusError> {
        self.push(id, PeerMessage::Position(degrees))
    }

    fn notify_timeout(&self, id: u8) -> Result<(), BusError> {
        self.push(id, PeerMessage::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(id: u8, rx_time_ms: u32) -> PeerStatus {
        PeerStatus {
            id,
            rpm: 0.0,
            cruise: CruiseStatus::Inactive,
            rx_time_ms,
        }
    }

    #[test]
    fn freshness_uses_max_age() {
        let status = peer(7, 1_000);
        assert!(status.is_fresh(1_099));
        assert!(!status.is_fresh(1_100));
    }

    #[test]
    fn freshness_survives_timestamp_wrap() {
        let status = peer(7, u32::MAX - 10);
        assert!(status.is_fresh(20));
    }

    #[test]
    fn mock_status_table() {
        let bus = MockBus::new();
        bus.set_peer(1, Some(peer(4, 0)));
        assert_eq!(bus.status(0), None);
        assert_eq!(bus.status(1).map(|p| p.id), Some(4));
        assert_eq!(bus.status(MAX_PEERS), None);
    }

    #[test]
    fn mock_logs_sends_per_peer() {
        let bus = MockBus::new();
        bus.send_current_rel(3, 0.5).unwrap();
        bus.notify_timeout(4).unwrap();
        bus.send_duty(3, 0.1).unwrap();
        assert_eq!(bus.last_to(3), Some(PeerMessage::Duty(0.1)));
        assert_eq!(bus.last_to(4), Some(PeerMessage::Timeout));
        assert_eq!(bus.sent().len(), 3);
    }

    #[test]
    fn mock_queue_full() {
        let bus = MockBus::new();
        bus.set_queue_full(true);
        assert_eq!(bus.send_position(1, 90.0), Err(BusError::QueueFull));
        assert!(bus.sent().is_empty());
    }
}
