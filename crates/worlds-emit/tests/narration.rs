//! End-to-end narration: build the image, emit the program, run it.
//!
//! The interpreter executes exactly the emitted body, so these tests check
//! the load/add chains themselves rather than the emitter's compile-time
//! resolution of them.

use proptest::prelude::*;
use worlds_core::Graph;
use worlds_emit::{emit, render, EmitConfig, Machine, Program};
use worlds_image::{ImageBuilder, ImageConfig, INSTANCE_WORLD_REF};
use worlds_test_utils::{fixtures, GraphGen, RecordingSink};

// ── Helpers ─────────────────────────────────────────────────────

fn compile(graph: &Graph) -> Program {
    let image = ImageBuilder::new(graph, ImageConfig::default())
        .build()
        .expect("image builds");
    emit(graph, &image, &EmitConfig::default()).expect("program emits")
}

fn run(program: &Program) -> (u32, RecordingSink, Machine) {
    let mut machine = Machine::new(&program.image);
    let mut sink = RecordingSink::new();
    let ret = machine.run(&program.body, &mut sink).expect("no trap");
    (ret, sink, machine)
}

/// Where each instance ends up after all transfers, by plain graph logic.
fn final_worlds(graph: &Graph) -> Vec<String> {
    let mut current: Vec<Option<&str>> = vec![None; graph.instances.len()];
    for w in &graph.worlds {
        for r in &w.contains {
            current[r.index()] = Some(w.name.as_str());
        }
    }
    for t in &graph.transfers {
        current[t.instance.index()] = Some(graph.world(t.to).unwrap().name.as_str());
    }
    current
        .into_iter()
        .map(|w| w.expect("every generated instance is placed").to_string())
        .collect()
}

// ── Scenarios ───────────────────────────────────────────────────

#[test]
fn cat_in_w1_narrates() {
    let program = compile(&fixtures::cat_in_w1());
    let (ret, sink, _) = run(&program);

    assert_eq!(ret, 0);
    assert_eq!(sink.tuples(), vec![("w1", "G1", "cat", "i1", "meow")]);
    assert!(sink.undecoded.is_empty());
}

#[test]
fn transfer_redirects_narration_to_w2() {
    let program = compile(&fixtures::cat_moves_to_w2());
    let (_, sink, machine) = run(&program);

    assert_eq!(sink.tuples(), vec![("w2", "G1", "cat", "i1", "meow")]);

    let i1 = program.image.instances().get("i1").unwrap();
    let w2 = program.image.worlds().get("w2").unwrap();
    let slot = (i1.get() + INSTANCE_WORLD_REF) as usize;
    assert_eq!(&machine.memory()[slot..slot + 4], &w2.get().to_le_bytes());
    // The initial image is untouched.
    assert_eq!(
        program.image.world_of(i1),
        program.image.worlds().get("w1")
    );
}

#[test]
fn zoo_narrates_in_declaration_order() {
    let program = compile(&fixtures::zoo());
    let (_, sink, _) = run(&program);

    assert_eq!(sink.tuples(), fixtures::zoo_narration());
    assert_eq!(
        program.narration_order().as_slice(),
        &["tom", "rex", "fido", "hedwig", "kit"]
    );
}

#[test]
fn static_resolution_matches_runtime_addresses() {
    let program = compile(&fixtures::zoo());
    let mut machine = Machine::new(&program.image);
    let mut seen = Vec::new();
    let mut capture = |_: &worlds_image::ImageView<'_>, args: [u32; 5]| seen.push(args);
    machine.run(&program.body, &mut capture).unwrap();

    let expected: Vec<_> = program.narrations.iter().map(|n| n.args()).collect();
    assert_eq!(seen, expected);
}

#[test]
fn rendered_module_declares_imports_exports_and_data() {
    let config = EmitConfig::default();
    let program = compile(&fixtures::cat_moves_to_w2());
    let text = render(&program, &config);

    assert!(text.starts_with("(module\n"));
    assert!(text.contains(r#"(import "main" "log" (func $narrate (param i32 i32 i32 i32 i32)))"#));
    assert!(text.contains("(memory $mem 1 256)"));
    assert!(text.contains(r#"(export "add" (func $entry))"#));
    assert!(text.contains("(i32.store offset=12"));
    assert_eq!(text.matches("(call $narrate").count(), 1);
    assert!(text.contains("(return\n   (i32.const 0)\n  )"));
    // Animal header [12, 14, 17] then the field bytes.
    assert!(text.contains(r#"(data (i32.const 0) "\0c\00\00\00\0e\00\00\00\11\00\00\00G1catmeow"#));
}

// ── Properties ──────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn narration_follows_last_transfer(seed in any::<u64>(), transfers in 0usize..10) {
        let graph = GraphGen::new(seed).transfers(transfers).generate();
        let program = compile(&graph);
        let (_, sink, _) = run(&program);

        prop_assert!(sink.undecoded.is_empty());
        prop_assert_eq!(sink.calls.len(), graph.instances.len());
        let expected = graph.instances.iter().zip(final_worlds(&graph));
        for (call, (inst, world)) in sink.calls.iter().zip(expected) {
            let species = graph.animal(inst.species).unwrap();
            prop_assert_eq!(&call.world, &world);
            prop_assert_eq!(&call.instance, &inst.name);
            prop_assert_eq!(&call.animal, &species.name);
            prop_assert_eq!(&call.gene, &species.gene);
            prop_assert_eq!(&call.sound, &species.sound);
        }
    }
}
