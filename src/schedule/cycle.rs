//! Naming a cycle among the targets layering could not place.

use std::collections::{BTreeMap, BTreeSet};

/// Follow each stuck target's first outstanding dependency until a target
/// repeats, and return that loop starting from its smallest member. The
/// returned path repeats its first target at the end.
///
/// `stuck` maps each unscheduled target to the dependencies it still waits
/// on. Every such dependency is itself unscheduled, so the walk always
/// closes; an empty map yields an empty path.
pub(crate) fn trace_cycle(stuck: &BTreeMap<String, BTreeSet<String>>) -> Vec<String> {
    let Some(start) = stuck.keys().next() else {
        return Vec::new();
    };
    let mut walk: Vec<&str> = Vec::new();
    let mut position: BTreeMap<&str, usize> = BTreeMap::new();
    let mut current = start.as_str();
    loop {
        if let Some(&at) = position.get(current) {
            return closed_loop(walk.split_off(at));
        }
        position.insert(current, walk.len());
        walk.push(current);
        let next = stuck
            .get(current)
            .and_then(|waiting| waiting.iter().find(|dep| stuck.contains_key(*dep)));
        match next {
            Some(dep) => current = dep.as_str(),
            None => return Vec::new(),
        }
    }
}

fn closed_loop(mut members: Vec<&str>) -> Vec<String> {
    if let Some(smallest) = members
        .iter()
        .enumerate()
        .min_by_key(|(_, name)| **name)
        .map(|(index, _)| index)
    {
        members.rotate_left(smallest);
    }
    members
        .iter()
        .chain(members.first())
        .map(|name| (*name).to_owned())
        .collect()
}
