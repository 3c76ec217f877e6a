use huddle_core::{PeerId, RoomId, UserData};
use std::collections::{HashMap, HashSet};

/// Result of registering a member in a room.
#[derive(Debug)]
pub struct JoinOutcome {
    /// Members that were already present, in insertion-independent order.
    pub existing: Vec<(PeerId, UserData)>,
    /// The join created the room.
    pub is_first: bool,
    /// The id was already a member; only its user data was refreshed.
    pub rejoined: bool,
}

/// Authoritative membership map. Pure state; the actor drives it and owns all
/// notification fan-out.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: HashMap<RoomId, HashMap<PeerId, UserData>>,
    memberships: HashMap<PeerId, HashSet<RoomId>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `peer_id` in `room`. Re-joining with the same id updates the
    /// stored user data instead of duplicating the member.
    pub fn join(&mut self, room: &RoomId, peer_id: PeerId, user_data: UserData) -> JoinOutcome {
        let is_first = !self.rooms.contains_key(room);
        let members = self.rooms.entry(room.clone()).or_default();

        let rejoined = members.contains_key(&peer_id);
        let existing = members
            .iter()
            .filter(|(id, _)| **id != peer_id)
            .map(|(id, data)| (id.clone(), data.clone()))
            .collect();

        members.insert(peer_id.clone(), user_data);
        self.memberships.entry(peer_id).or_default().insert(room.clone());

        JoinOutcome {
            existing,
            is_first,
            rejoined,
        }
    }

    /// Remove `peer_id` from `room`. Idempotent: an id that is not a member
    /// leaves the registry untouched and yields no one to notify. Returns the
    /// remaining members when a removal actually happened.
    pub fn leave(&mut self, room: &RoomId, peer_id: &PeerId) -> Option<Vec<PeerId>> {
        let members = self.rooms.get_mut(room)?;
        members.remove(peer_id)?;

        if let Some(joined) = self.memberships.get_mut(peer_id) {
            joined.remove(room);
            if joined.is_empty() {
                self.memberships.remove(peer_id);
            }
        }

        let remaining: Vec<PeerId> = members.keys().cloned().collect();
        if members.is_empty() {
            self.rooms.remove(room);
        }
        Some(remaining)
    }

    /// Treat a transport drop exactly like an explicit leave of every room the
    /// identity had joined. Returns, per affected room, the members left to
    /// notify.
    pub fn disconnect(&mut self, peer_id: &PeerId) -> Vec<(RoomId, Vec<PeerId>)> {
        let joined: Vec<RoomId> = self
            .memberships
            .get(peer_id)
            .map(|rooms| rooms.iter().cloned().collect())
            .unwrap_or_default();

        joined
            .into_iter()
            .filter_map(|room| {
                let remaining = self.leave(&room, peer_id)?;
                Some((room, remaining))
            })
            .collect()
    }

    /// The id has joined at least one room and not left/disconnected.
    pub fn is_member(&self, peer_id: &PeerId) -> bool {
        self.memberships.contains_key(peer_id)
    }

    pub fn members(&self, room: &RoomId) -> Vec<PeerId> {
        self.rooms
            .get(room)
            .map(|members| members.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
