//! Seeded random graph generation.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use worlds_core::{AnimalRef, Graph, InstanceRef, WorldRef};

/// Builds random, fully resolved graphs from a seed.
///
/// Every generated graph satisfies the upstream guarantees: names are
/// unique per category, every reference resolves, and each instance is
/// placed in exactly one world. Strings draw from the whole one-byte
/// character range and may be empty. The same seed always yields the same
/// graph.
#[derive(Clone, Debug)]
pub struct GraphGen {
    seed: u64,
    animals: usize,
    instances: usize,
    worlds: usize,
    transfers: usize,
    max_str: usize,
}

impl GraphGen {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            animals: 4,
            instances: 8,
            worlds: 3,
            transfers: 4,
            max_str: 12,
        }
    }

    pub fn animals(mut self, n: usize) -> Self {
        self.animals = n;
        self
    }

    pub fn instances(mut self, n: usize) -> Self {
        self.instances = n;
        self
    }

    pub fn worlds(mut self, n: usize) -> Self {
        self.worlds = n;
        self
    }

    pub fn transfers(mut self, n: usize) -> Self {
        self.transfers = n;
        self
    }

    /// Longest random string suffix.
    pub fn max_str(mut self, n: usize) -> Self {
        self.max_str = n;
        self
    }

    pub fn generate(&self) -> Graph {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut b = Graph::builder();

        // Instances need a species and a world to live in.
        let needs_homes = self.instances > 0;
        let animals = if needs_homes {
            self.animals.max(1)
        } else {
            self.animals
        };
        let worlds = if needs_homes {
            self.worlds.max(1)
        } else {
            self.worlds
        };

        for i in 0..animals {
            let name = self.name(&mut rng, 'a', i);
            let gene = self.text(&mut rng);
            let sound = self.text(&mut rng);
            b.animal(name, gene, sound);
        }

        let mut homes: Vec<Vec<InstanceRef>> = vec![Vec::new(); worlds];
        for i in 0..self.instances {
            let species = AnimalRef(rng.random_range(0..animals) as u32);
            let name = self.name(&mut rng, 'i', i);
            let r = b.instance(name, species);
            homes[rng.random_range(0..worlds)].push(r);
        }

        for (i, contains) in homes.into_iter().enumerate() {
            let name = self.name(&mut rng, 'w', i);
            b.world(name, contains);
        }

        if self.instances > 0 {
            for _ in 0..self.transfers {
                let inst = InstanceRef(rng.random_range(0..self.instances) as u32);
                let to = WorldRef(rng.random_range(0..worlds) as u32);
                b.transfer(inst, to);
            }
        }

        b.build()
    }

    /// `<prefix><index>-<suffix>`. The dash ends the index, so the suffix
    /// can never extend it into another index.
    fn name(&self, rng: &mut ChaCha8Rng, prefix: char, index: usize) -> String {
        format!("{prefix}{index}-{}", self.text(rng))
    }

    fn text(&self, rng: &mut ChaCha8Rng) -> String {
        let len = rng.random_range(0..=self.max_str);
        (0..len)
            .map(|_| char::from(rng.random_range(0x00u8..=0xff)))
            .collect()
    }
}
