//! Player slot assignment
//!
//! Maps the four player slots to open controllers. A slot first looks for a
//! controller matching its stored identity; slots left empty then take the
//! remaining controllers in enumeration order.

use super::identity::ControllerIdentity;
use super::types::{InstanceId, MAX_PLAYERS};

/// An open controller considered for assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub instance_id: InstanceId,
    /// `None` when the backend has no joystick handle for this controller
    pub identity: Option<ControllerIdentity>,
}

/// Resolve slot assignments
///
/// # Arguments
/// * `preferences` - Stored identity per slot (`None` skips the matching pass for that slot)
/// * `candidates` - Open controllers in enumeration order
///
/// # Returns
/// * Assigned instance id per slot; a controller never appears twice
pub fn resolve_assignments(
    preferences: &[Option<ControllerIdentity>; MAX_PLAYERS],
    candidates: &[Candidate],
) -> [Option<InstanceId>; MAX_PLAYERS] {
    let mut assigned = [None; MAX_PLAYERS];
    let mut pool: Vec<&Candidate> = candidates.iter().collect();

    // Preference pass: closest native player index among identity matches
    for (slot, preference) in preferences.iter().enumerate() {
        let Some(wanted) = preference else {
            continue;
        };

        let mut best: Option<(usize, i64)> = None;
        for (pos, candidate) in pool.iter().enumerate() {
            let Some(identity) = &candidate.identity else {
                continue;
            };
            if identity != wanted {
                continue;
            }
            let distance = wanted.player_index_distance(identity);
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((pos, distance));
            }
        }

        if let Some((pos, _)) = best {
            assigned[slot] = Some(pool.remove(pos).instance_id);
        }
    }

    // Fill pass: leftover controllers go to empty slots in order
    let mut remaining = pool.into_iter();
    for slot in assigned.iter_mut().filter(|s| s.is_none()) {
        match remaining.next() {
            Some(candidate) => *slot = Some(candidate.instance_id),
            None => break,
        }
    }

    assigned
}
