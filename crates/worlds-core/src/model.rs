//! The resolved domain graph consumed by the encoder.
//!
//! Records are stored per category in declaration order. Cross-references
//! are typed declaration indices ([`AnimalRef`], [`InstanceRef`],
//! [`WorldRef`]) rather than raw names; the front end resolves names
//! before handing the graph over.

use crate::id::{AnimalRef, InstanceRef, WorldRef};

/// An animal species.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Animal {
    /// Unique name of the species.
    pub name: String,
    /// Gene string.
    pub gene: String,
    /// The sound the species makes.
    pub sound: String,
}

/// A named individual of some species.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instance {
    /// Unique name of the instance.
    pub name: String,
    /// The species this instance belongs to.
    pub species: AnimalRef,
}

/// A world and the instances it contains at construction time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct World {
    /// Unique name of the world.
    pub name: String,
    /// Instances initially placed in this world, in declaration order.
    pub contains: Vec<InstanceRef>,
}

/// A runtime event moving an instance into another world.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transfer {
    /// The instance being moved.
    pub instance: InstanceRef,
    /// The destination world.
    pub to: WorldRef,
}

/// A complete, resolved program.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Graph {
    /// Animal declarations, in order.
    pub animals: Vec<Animal>,
    /// Instance declarations, in order.
    pub instances: Vec<Instance>,
    /// World declarations, in order.
    pub worlds: Vec<World>,
    /// Transfer events, in order of application.
    pub transfers: Vec<Transfer>,
}

impl Graph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start building a graph with typed references.
    pub fn builder() -> GraphBuilder {
        GraphBuilder::default()
    }

    /// Look up an animal by reference.
    pub fn animal(&self, r: AnimalRef) -> Option<&Animal> {
        self.animals.get(r.index())
    }

    /// Look up an instance by reference.
    pub fn instance(&self, r: InstanceRef) -> Option<&Instance> {
        self.instances.get(r.index())
    }

    /// Look up a world by reference.
    pub fn world(&self, r: WorldRef) -> Option<&World> {
        self.worlds.get(r.index())
    }

    /// Total number of records that end up in the memory image.
    pub fn record_count(&self) -> usize {
        self.animals.len() + self.instances.len() + self.worlds.len()
    }
}

/// Incremental graph construction.
///
/// Each `add` method returns the typed reference of the record it created,
/// so later declarations can point at it without going through names.
///
/// # Examples
///
/// ```
/// use worlds_core::Graph;
///
/// let mut b = Graph::builder();
/// let cat = b.animal("cat", "G1", "meow");
/// let tom = b.instance("tom", cat);
/// let house = b.world("house", [tom]);
/// let yard = b.world("yard", Vec::new());
/// b.transfer(tom, yard);
/// let graph = b.build();
///
/// assert_eq!(graph.record_count(), 4);
/// assert_eq!(graph.world(house).unwrap().contains, vec![tom]);
/// ```
#[derive(Debug, Default)]
pub struct GraphBuilder {
    graph: Graph,
}

impl GraphBuilder {
    /// Declare an animal species.
    pub fn animal(
        &mut self,
        name: impl Into<String>,
        gene: impl Into<String>,
        sound: impl Into<String>,
    ) -> AnimalRef {
        let r = AnimalRef(self.graph.animals.len() as u32);
        self.graph.animals.push(Animal {
            name: name.into(),
            gene: gene.into(),
            sound: sound.into(),
        });
        r
    }

    /// Declare an instance of `species`.
    pub fn instance(&mut self, name: impl Into<String>, species: AnimalRef) -> InstanceRef {
        let r = InstanceRef(self.graph.instances.len() as u32);
        self.graph.instances.push(Instance {
            name: name.into(),
            species,
        });
        r
    }

    /// Declare a world containing `contains`.
    pub fn world(
        &mut self,
        name: impl Into<String>,
        contains: impl IntoIterator<Item = InstanceRef>,
    ) -> WorldRef {
        let r = WorldRef(self.graph.worlds.len() as u32);
        self.graph.worlds.push(World {
            name: name.into(),
            contains: contains.into_iter().collect(),
        });
        r
    }

    /// Append a transfer event.
    pub fn transfer(&mut self, instance: InstanceRef, to: WorldRef) {
        self.graph.transfers.push(Transfer { instance, to });
    }

    /// Finish building.
    pub fn build(self) -> Graph {
        self.graph
    }
}
