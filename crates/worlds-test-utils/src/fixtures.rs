//! Hand-built graphs shared across test suites.

use worlds_core::Graph;

/// One cat, one instance, one world:
///
/// ```text
/// animal   cat  gene G1  sound meow
/// instance i1   of cat
/// world    w1   contains i1
/// ```
pub fn cat_in_w1() -> Graph {
    let mut b = Graph::builder();
    let cat = b.animal("cat", "G1", "meow");
    let i1 = b.instance("i1", cat);
    b.world("w1", [i1]);
    b.build()
}

/// [`cat_in_w1`] plus an empty world `w2` and a transfer of `i1` into it.
pub fn cat_moves_to_w2() -> Graph {
    let mut b = Graph::builder();
    let cat = b.animal("cat", "G1", "meow");
    let i1 = b.instance("i1", cat);
    b.world("w1", [i1]);
    let w2 = b.world("w2", Vec::new());
    b.transfer(i1, w2);
    b.build()
}

/// Three species, five instances across three worlds, and transfers that
/// move one instance twice.
pub fn zoo() -> Graph {
    let mut b = Graph::builder();
    let cat = b.animal("cat", "G1", "meow");
    let dog = b.animal("dog", "G22", "woof");
    let owl = b.animal("owl", "", "hoot");

    let tom = b.instance("tom", cat);
    let rex = b.instance("rex", dog);
    let fido = b.instance("fido", dog);
    let hedwig = b.instance("hedwig", owl);
    let kit = b.instance("kit", cat);

    let house = b.world("house", [tom, rex]);
    let park = b.world("park", [fido, kit]);
    let forest = b.world("forest", [hedwig]);

    b.transfer(rex, park);
    b.transfer(hedwig, house);
    b.transfer(rex, forest);
    b.build()
}

/// One narration as `(world, gene, animal, instance, sound)`.
pub type Expected = (&'static str, &'static str, &'static str, &'static str, &'static str);

/// Expected narration of [`zoo`] after all transfers, in instance order.
pub fn zoo_narration() -> Vec<Expected> {
    vec![
        ("house", "G1", "cat", "tom", "meow"),
        ("forest", "G22", "dog", "rex", "woof"),
        ("park", "G22", "dog", "fido", "woof"),
        ("house", "", "owl", "hedwig", "hoot"),
        ("park", "G1", "cat", "kit", "meow"),
    ]
}
