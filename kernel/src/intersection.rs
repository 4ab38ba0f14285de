//! Four-way intersection coordinator.
//!
//! A concurrency-control exemplar, independent of the virtual-memory and
//! process subsystems: vehicle threads call [`before_entry`] before
//! entering the intersection and [`after_exit`] after leaving it. Admission
//! is gated by the pairwise trajectory-compatibility predicate below, never
//! by anything resembling demand paging or process state — this module
//! uses locks and condition variables only, per spec.md §1.

extern crate alloc;

use alloc::vec::Vec;

use crate::process::sync::{CondVar, Mutex, MutexGuard};

/// Number of arms of the intersection (and compass directions).
pub const NUM_DIRECTIONS: usize = 4;

/// A compass direction, doubling as an arm of the intersection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Direction {
    North = 0,
    East = 1,
    South = 2,
    West = 3,
}

impl Direction {
    pub const ALL: [Direction; NUM_DIRECTIONS] =
        [Direction::North, Direction::East, Direction::South, Direction::West];

    fn index(self) -> usize {
        self as usize
    }
}

/// The three path shapes a trajectory can take, per spec.md §4.G's modular
/// arithmetic on `(destination - origin) mod 4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathType {
    Left,
    Straight,
    Right,
}

/// Classifies a trajectory. Panics (debug-only assertion) on `origin ==
/// destination`, which is not a meaningful vehicle trajectory.
pub fn path_type(origin: Direction, destination: Direction) -> PathType {
    debug_assert_ne!(origin.index(), destination.index(), "a vehicle must turn or go straight");
    match (destination.index() + NUM_DIRECTIONS - origin.index()) % NUM_DIRECTIONS {
        1 => PathType::Left,
        2 => PathType::Straight,
        3 => PathType::Right,
        _ => unreachable!(),
    }
}

/// Pairwise trajectory compatibility per spec.md §4.G: two vehicles may
/// share the intersection iff any of (i) same origin, (ii) different
/// destinations with at least one a right turn, or (iii) opposing
/// straight-through movements.
fn compatible(o1: Direction, d1: Direction, o2: Direction, d2: Direction) -> bool {
    if o1.index() == o2.index() {
        return true;
    }
    if d1.index() != d2.index()
        && (path_type(o1, d1) == PathType::Right || path_type(o2, d2) == PathType::Right)
    {
        return true;
    }
    if o1.index() == d2.index() && o2.index() == d1.index() {
        return true;
    }
    false
}

struct Waiter {
    id: u64,
    origin: Direction,
    destination: Direction,
}

struct State {
    /// `occupants[o][d]` counts vehicles currently inside whose origin is
    /// `o` and destination is `d`.
    occupants: [[u32; NUM_DIRECTIONS]; NUM_DIRECTIONS],
    /// FIFO of blocked vehicle records, in arrival order.
    fifo: Vec<Waiter>,
    next_id: u64,
}

impl State {
    /// Whether `(origin, destination)` conflicts with no current occupant.
    fn admissible(&self, origin: Direction, destination: Direction) -> bool {
        self.blocking_arm(origin, destination).is_none()
    }

    /// The destination arm of some occupant that `(origin, destination)`
    /// conflicts with, if any.
    fn blocking_arm(&self, origin: Direction, destination: Direction) -> Option<Direction> {
        for o in Direction::ALL {
            for d in Direction::ALL {
                if self.occupants[o.index()][d.index()] == 0 {
                    continue;
                }
                if !compatible(origin, destination, o, d) {
                    return Some(d);
                }
            }
        }
        None
    }
}

/// The intersection: one lock plus one condition variable per arm, per
/// spec.md §5 ("the intersection lock is a leaf: held alone").
pub struct Intersection {
    state: Mutex<State>,
    arm_cv: [CondVar; NUM_DIRECTIONS],
}

impl Intersection {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(State {
                occupants: [[0; NUM_DIRECTIONS]; NUM_DIRECTIONS],
                fifo: Vec::new(),
                next_id: 0,
            }),
            arm_cv: [CondVar::new(), CondVar::new(), CondVar::new(), CondVar::new()],
        }
    }

    /// Blocks the calling thread until `(origin, destination)` may safely
    /// enter the intersection, per spec.md §4.G's admission algorithm.
    pub fn before_entry(&self, origin: Direction, destination: Direction) {
        let mut state = self.state.lock();

        // Fast path: no conflict and nobody else is already waiting. A
        // non-empty FIFO forces even a conflict-free arrival to queue, so a
        // steady stream of compatible newcomers cannot indefinitely deny an
        // already-queued vehicle its turn to recheck.
        if state.fifo.is_empty() && state.admissible(origin, destination) {
            state.occupants[origin.index()][destination.index()] += 1;
            return;
        }

        let id = state.next_id;
        state.next_id += 1;
        state.fifo.push(Waiter { id, origin, destination });

        state = self.wait_until_admissible(state, origin, destination);

        match state.fifo.first() {
            Some(front) if front.id == id => {
                state.fifo.remove(0);
            }
            _ => {
                state.fifo.retain(|w| w.id != id);
            }
        }

        state.occupants[origin.index()][destination.index()] += 1;
    }

    /// Repeatedly waits on the arm condition variable of whichever occupant
    /// currently blocks `(origin, destination)`, re-evaluating on each wake,
    /// until no occupant conflicts.
    fn wait_until_admissible<'a>(
        &'a self,
        mut state: MutexGuard<'a, State>,
        origin: Direction,
        destination: Direction,
    ) -> MutexGuard<'a, State> {
        loop {
            match state.blocking_arm(origin, destination) {
                Some(arm) => state = self.arm_cv[arm.index()].wait(state),
                None => return state,
            }
        }
    }

    /// Records a vehicle's departure. If no occupant remains for exactly
    /// this `(origin, destination)` trajectory, broadcasts on that
    /// destination's condition variable: the predicate can only become more
    /// permissive on exit, and only waiters blocked on that arm can newly
    /// become admissible.
    pub fn after_exit(&self, origin: Direction, destination: Direction) {
        let now_empty = {
            let mut state = self.state.lock();
            let cell = &mut state.occupants[origin.index()][destination.index()];
            assert!(*cell > 0, "after_exit: no matching occupant recorded");
            *cell -= 1;
            *cell == 0
        };

        if now_empty {
            self.arm_cv[destination.index()].broadcast();
        }
    }

    /// Test/instrumentation accessor: current total occupancy.
    pub fn occupancy(&self) -> u32 {
        let state = self.state.lock();
        state.occupants.iter().flatten().sum()
    }
}

impl Default for Intersection {
    fn default() -> Self {
        Self::new()
    }
}

/// The global intersection instance, per spec.md §9's singleton-with-
/// defined-init-order pattern.
pub static INTERSECTION: Intersection = Intersection::new();

/// Initializes the intersection coordinator. Must run before the first
/// driver call (spec.md/SPEC_FULL.md §9 boot-order constraint).
pub fn init() {
    log::info!("intersection coordinator initialized");
}

pub fn before_entry(origin: Direction, destination: Direction) {
    INTERSECTION.before_entry(origin, destination);
}

pub fn after_exit(origin: Direction, destination: Direction) {
    INTERSECTION.after_exit(origin, destination);
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    #[test]
    fn path_type_classifies_all_three_shapes() {
        assert_eq!(path_type(Direction::North, Direction::West), PathType::Left);
        assert_eq!(path_type(Direction::North, Direction::South), PathType::Straight);
        assert_eq!(path_type(Direction::North, Direction::East), PathType::Right);
    }

    #[test]
    fn same_origin_is_always_compatible() {
        assert!(compatible(
            Direction::North,
            Direction::South,
            Direction::North,
            Direction::East
        ));
    }

    #[test]
    fn opposing_straights_are_compatible() {
        assert!(compatible(
            Direction::North,
            Direction::South,
            Direction::South,
            Direction::North
        ));
    }

    #[test]
    fn a_right_turn_is_compatible_with_a_crossing_path() {
        // North->East is a right turn; West->South crosses but doesn't
        // conflict with a right turn sharing no destination.
        assert!(compatible(
            Direction::North,
            Direction::East,
            Direction::West,
            Direction::South
        ));
    }

    #[test]
    fn crossing_straights_conflict() {
        assert!(!compatible(
            Direction::North,
            Direction::South,
            Direction::West,
            Direction::East
        ));
    }

    #[test]
    fn solo_vehicle_is_admitted_immediately() {
        let isx = Intersection::new();
        isx.before_entry(Direction::North, Direction::South);
        assert_eq!(isx.occupancy(), 1);
        isx.after_exit(Direction::North, Direction::South);
        assert_eq!(isx.occupancy(), 0);
    }

    #[test]
    #[should_panic(expected = "no matching occupant")]
    fn after_exit_without_a_matching_occupant_panics() {
        let isx = Intersection::new();
        isx.after_exit(Direction::North, Direction::South);
    }

    #[test]
    fn s5_four_opposing_straights_are_all_admitted_concurrently() {
        use std::sync::Arc;
        use std::thread;

        let isx = Arc::new(Intersection::new());
        let pairs = [
            (Direction::North, Direction::South),
            (Direction::South, Direction::North),
            (Direction::East, Direction::West),
            (Direction::West, Direction::East),
        ];

        let handles: Vec<_> = pairs
            .into_iter()
            .map(|(o, d)| {
                let isx = Arc::clone(&isx);
                thread::spawn(move || isx.before_entry(o, d))
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(isx.occupancy(), 4);

        for (o, d) in pairs {
            isx.after_exit(o, d);
        }
        assert_eq!(isx.occupancy(), 0);
    }

    #[test]
    fn conflicting_vehicle_blocks_until_the_occupant_exits() {
        use std::sync::{Arc, Barrier};
        use std::thread;
        use std::time::Duration;

        let isx = Arc::new(Intersection::new());
        isx.before_entry(Direction::North, Direction::South);

        let barrier = Arc::new(Barrier::new(2));
        let waiter = {
            let isx = Arc::clone(&isx);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                // Conflicts with the North->South occupant (crossing straights).
                isx.before_entry(Direction::West, Direction::East);
            })
        };

        barrier.wait();
        // Give the waiter thread a chance to actually block.
        thread::sleep(Duration::from_millis(20));
        assert_eq!(isx.occupancy(), 1, "waiter must not have entered yet");

        isx.after_exit(Direction::North, Direction::South);
        waiter.join().unwrap();
        assert_eq!(isx.occupancy(), 1);

        isx.after_exit(Direction::West, Direction::East);
        assert_eq!(isx.occupancy(), 0);
    }
}
