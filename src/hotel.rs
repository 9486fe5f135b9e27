//! A fixed-capacity timeout tracker: occupants check into a room with a deadline, and either
//!  check out before the deadline, or are evicted once it has passed.
//!
//! The hotel does not own a clock or a callback. The progress loop passes in the current time,
//!  and handles evicted occupants itself, which keeps the hotel free of borrows into the code
//!  that reacts to timeouts.

use std::time::Instant;
use tracing::trace;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Ord, PartialOrd)]
pub struct RoomId(usize);

impl RoomId {
    pub fn index(&self) -> usize {
        self.0
    }
}

struct Room<T> {
    occupant: T,
    deadline: Instant,
}

pub struct Hotel<T> {
    rooms: Vec<Option<Room<T>>>,
    vacant: Vec<usize>,
}

impl<T: Copy> Hotel<T> {
    pub fn new(num_rooms: usize) -> Hotel<T> {
        Hotel {
            rooms: (0..num_rooms).map(|_| None).collect(),
            vacant: (0..num_rooms).rev().collect(),
        }
    }

    /// Returns `None` if all rooms are occupied
    pub fn checkin(&mut self, occupant: T, deadline: Instant) -> Option<RoomId> {
        let index = self.vacant.pop()?;
        self.rooms[index] = Some(Room { occupant, deadline });
        Some(RoomId(index))
    }

    /// Check the occupant of a room out before its deadline. Checking out a vacant room is a
    ///  no-op.
    pub fn checkout(&mut self, room: RoomId) -> Option<T> {
        let checked_out = self.rooms.get_mut(room.0)
            .and_then(|r| r.take())
            .map(|r| r.occupant);

        if checked_out.is_some() {
            self.vacant.push(room.0);
        }
        checked_out
    }

    /// Evict all occupants whose deadline is at or before `now`, vacating their rooms. The evicted
    ///  occupants are returned in the order of their deadlines.
    pub fn evict_expired(&mut self, now: Instant) -> Vec<(RoomId, T)> {
        let mut expired = self.rooms.iter()
            .enumerate()
            .filter_map(|(index, room)| match room {
                Some(r) if r.deadline <= now => Some((r.deadline, RoomId(index))),
                _ => None,
            })
            .collect::<Vec<_>>();
        expired.sort();

        expired.into_iter()
            .filter_map(|(_, room)| {
                let occupant = self.checkout(room)?;
                trace!("evicting occupant of room {}", room.0);
                Some((room, occupant))
            })
            .collect()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.rooms.iter()
            .flatten()
            .map(|r| r.deadline)
            .min()
    }

    pub fn num_rooms(&self) -> usize {
        self.rooms.len()
    }

    pub fn occupancy(&self) -> usize {
        self.rooms.len() - self.vacant.len()
    }
}
