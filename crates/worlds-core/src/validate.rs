//! Defensive re-validation of a resolved graph.
//!
//! The front end is the authority on these checks; the compiler runs them
//! again so a graph that slipped through surfaces as a list of
//! [`Violation`]s instead of a corrupt image.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::id::RecordKind;
use crate::model::Graph;

/// A structural problem found in a graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Violation {
    /// Two records of the same category share a name.
    DuplicateName {
        /// Category of the records.
        kind: RecordKind,
        /// The repeated name.
        name: String,
    },
    /// An instance's species reference is out of range.
    UnknownSpecies {
        /// The instance.
        instance: String,
    },
    /// A world lists an instance reference that is out of range.
    UnknownInstance {
        /// The world.
        world: String,
        /// Position of the bad entry in `contains`.
        position: usize,
    },
    /// An instance is listed by more than one world (or twice by one).
    DuplicatePlacement {
        /// The instance.
        instance: String,
        /// The world that listed it first.
        first: String,
        /// The world that listed it again.
        second: String,
    },
    /// A transfer refers to an instance or world that does not exist.
    UnknownTransferTarget {
        /// Position of the transfer in declaration order.
        position: usize,
        /// `"instance"` or `"to"`.
        field: &'static str,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateName { kind, name } => write!(f, "duplicate {kind} name '{name}'"),
            Self::UnknownSpecies { instance } => {
                write!(f, "instance '{instance}' has an unknown species")
            }
            Self::UnknownInstance { world, position } => {
                write!(f, "world '{world}' contains an unknown instance at {position}")
            }
            Self::DuplicatePlacement {
                instance,
                first,
                second,
            } => write!(
                f,
                "instance '{instance}' is placed in '{first}' and again in '{second}'"
            ),
            Self::UnknownTransferTarget { position, field } => {
                write!(f, "transfer {position} has an unknown '{field}' target")
            }
        }
    }
}

/// Check a graph for every condition the front end is expected to reject.
///
/// Returns violations in discovery order: names per category first, then
/// references, then placement, then transfers. An empty vector means the
/// graph satisfies the compiler's preconditions.
pub fn validate(graph: &Graph) -> Vec<Violation> {
    let mut out = Vec::new();

    check_names(
        RecordKind::Animal,
        graph.animals.iter().map(|a| a.name.as_str()),
        &mut out,
    );
    check_names(
        RecordKind::Instance,
        graph.instances.iter().map(|i| i.name.as_str()),
        &mut out,
    );
    check_names(
        RecordKind::World,
        graph.worlds.iter().map(|w| w.name.as_str()),
        &mut out,
    );

    for inst in &graph.instances {
        if graph.animal(inst.species).is_none() {
            out.push(Violation::UnknownSpecies {
                instance: inst.name.clone(),
            });
        }
    }

    // instance index -> index of the first world that placed it
    let mut placed: HashMap<usize, usize> = HashMap::new();
    for (wi, world) in graph.worlds.iter().enumerate() {
        for (pos, &r) in world.contains.iter().enumerate() {
            let Some(inst) = graph.instance(r) else {
                out.push(Violation::UnknownInstance {
                    world: world.name.clone(),
                    position: pos,
                });
                continue;
            };
            if let Some(&first) = placed.get(&r.index()) {
                out.push(Violation::DuplicatePlacement {
                    instance: inst.name.clone(),
                    first: graph.worlds[first].name.clone(),
                    second: world.name.clone(),
                });
            } else {
                placed.insert(r.index(), wi);
            }
        }
    }

    for (pos, t) in graph.transfers.iter().enumerate() {
        if graph.instance(t.instance).is_none() {
            out.push(Violation::UnknownTransferTarget {
                position: pos,
                field: "instance",
            });
        }
        if graph.world(t.to).is_none() {
            out.push(Violation::UnknownTransferTarget {
                position: pos,
                field: "to",
            });
        }
    }

    out
}

fn check_names<'a>(
    kind: RecordKind,
    names: impl Iterator<Item = &'a str>,
    out: &mut Vec<Violation>,
) {
    let mut seen: HashSet<&'a str> = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            out.push(Violation::DuplicateName {
                kind,
                name: name.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{AnimalRef, InstanceRef, WorldRef};

    #[test]
    fn clean_graph_has_no_violations() {
        let mut b = Graph::builder();
        let cat = b.animal("cat", "G1", "meow");
        let i1 = b.instance("i1", cat);
        let w1 = b.world("w1", [i1]);
        b.transfer(i1, w1);
        assert!(validate(&b.build()).is_empty());
    }

    #[test]
    fn duplicate_names_reported_per_category() {
        let mut b = Graph::builder();
        let cat = b.animal("cat", "G1", "meow");
        b.animal("cat", "G2", "purr");
        b.instance("cat", cat);
        let g = b.build();

        // Same name across categories is fine; only the animal clash counts.
        assert_eq!(
            validate(&g),
            vec![Violation::DuplicateName {
                kind: RecordKind::Animal,
                name: "cat".into(),
            }]
        );
    }

    #[test]
    fn dangling_references_reported() {
        let mut b = Graph::builder();
        b.instance("ghost", AnimalRef(9));
        b.world("w1", [InstanceRef(5)]);
        b.transfer(InstanceRef(0), WorldRef(3));
        let v = validate(&b.build());

        assert!(v.contains(&Violation::UnknownSpecies {
            instance: "ghost".into()
        }));
        assert!(v.contains(&Violation::UnknownInstance {
            world: "w1".into(),
            position: 0
        }));
        assert!(v.contains(&Violation::UnknownTransferTarget {
            position: 0,
            field: "to"
        }));
        assert_eq!(v.len(), 3);
    }

    #[test]
    fn double_placement_names_both_worlds() {
        let mut b = Graph::builder();
        let cat = b.animal("cat", "G1", "meow");
        let i1 = b.instance("i1", cat);
        b.world("w1", [i1]);
        b.world("w2", [i1]);
        assert_eq!(
            validate(&b.build()),
            vec![Violation::DuplicatePlacement {
                instance: "i1".into(),
                first: "w1".into(),
                second: "w2".into(),
            }]
        );
    }
}
