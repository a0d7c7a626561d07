//! # Boundary random walk
//!
//! Drives a 12x12 grid through 1,000 single-flip generations: each step
//! picks a cut edge, flips one endpoint across the boundary, and reads the
//! incrementally maintained properties. Prints the evolving boundary
//! statistics every 100 steps.
//!
//! Run with: `cargo run --example chain_walk --features std`

use std::collections::BTreeSet;
use std::rc::Rc;

use hashbrown::HashMap;

use partition_core::geographic::new_geographic;
use partition_core::graph::{AdjacencyGraph, AttrValue};
use partition_core::partition::{InitialAssignment, PartId, Partition};
use partition_core::updaters::tally::register_tally;
use partition_core::updaters::{Updaters, CUT_EDGES, PERIMETERS};

const SIDE: u32 = 12;
const STEPS: u32 = 1_000;

// ── grid construction ────────────────────────────────────────────────────────

fn build_grid() -> Rc<AdjacencyGraph> {
    let mut g = AdjacencyGraph::new();
    for i in 0..SIDE * SIDE {
        g.add_node(i);
        let (row, col) = (i / SIDE, i % SIDE);
        let on_rim = row == 0 || col == 0 || row == SIDE - 1 || col == SIDE - 1;
        g.set_node_attr(i, "boundary_node", AttrValue::Bool(on_rim))
            .expect("node exists");
        if on_rim {
            let sides = [row == 0, col == 0, row == SIDE - 1, col == SIDE - 1]
                .iter()
                .filter(|&&s| s)
                .count();
            g.set_node_attr(i, "boundary_perim", AttrValue::Float(sides as f64))
                .expect("node exists");
        }
        g.set_node_attr(i, "population", AttrValue::Int(50 + (i as i64 * 7) % 100))
            .expect("node exists");
    }
    for row in 0..SIDE {
        for col in 0..SIDE {
            let n = row * SIDE + col;
            if col + 1 < SIDE {
                g.add_edge(n, n + 1).expect("nodes exist");
                g.set_edge_attr((n, n + 1), "shared_perim", AttrValue::Float(1.0))
                    .expect("edge exists");
            }
            if row + 1 < SIDE {
                g.add_edge(n, n + SIDE).expect("nodes exist");
                g.set_edge_attr((n, n + SIDE), "shared_perim", AttrValue::Float(1.0))
                    .expect("edge exists");
            }
        }
    }
    Rc::new(g)
}

// ── deterministic pseudo-randomness ──────────────────────────────────────────

struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }
}

// ── proposal: flip one endpoint of a random cut edge ─────────────────────────

fn propose(
    partition: &Partition<AdjacencyGraph>,
    rng: &mut Lcg,
) -> Option<HashMap<u32, PartId>> {
    let cut = partition.property(CUT_EDGES).ok()?;
    let cut: BTreeSet<(u32, u32)> = cut.as_edge_set()?.iter().copied().collect();
    if cut.is_empty() {
        return None;
    }
    let edge = *cut.iter().nth(rng.next() as usize % cut.len())?;
    let (node, other) = if rng.next() % 2 == 0 {
        (edge.0, edge.1)
    } else {
        (edge.1, edge.0)
    };
    let donor = partition.part_of(node).ok()?;
    if partition.parts()[&donor].len() <= 1 {
        return None;
    }
    let target = partition.part_of(other).ok()?;
    Some([(node, target)].iter().copied().collect())
}

fn main() {
    let graph = build_grid();
    let halves: HashMap<u32, PartId> =
        (0..SIDE * SIDE).map(|n| (n, u32::from(n % SIDE >= SIDE / 2))).collect();

    let mut extra = Updaters::new();
    register_tally(&mut extra, "population", "population");
    let mut current = new_geographic(
        Rc::clone(&graph),
        InitialAssignment::FromMap(halves),
        extra,
    )
    .expect("grid carries the geographic attributes");

    let mut rng = Lcg(0x0dd_ba11);
    let mut accepted = 0u32;

    println!("walking a {SIDE}x{SIDE} grid for {STEPS} generations\n");

    for step in 1..=STEPS {
        let Some(flips) = propose(&current, &mut rng) else {
            continue;
        };
        current = Rc::clone(&current)
            .merge(flips)
            .expect("proposal references live nodes and parts");
        accepted += 1;

        if step % 100 == 0 {
            let cut = current
                .property(CUT_EDGES)
                .expect("baseline updater")
                .as_edge_set()
                .map(|set| set.len())
                .unwrap_or(0);
            let perims = current.property(PERIMETERS).expect("baseline updater");
            let perims = perims.as_part_scalars().expect("per-part scalars");
            let pops = current.property("population").expect("registered tally");
            let pops = pops.as_part_scalars().expect("per-part scalars");
            println!(
                "step {step:4}  {current}  cut edges: {cut:3}  perimeters: [{:.0}, {:.0}]  population: [{:.0}, {:.0}]",
                perims.get(&0).copied().unwrap_or(0.0),
                perims.get(&1).copied().unwrap_or(0.0),
                pops.get(&0).copied().unwrap_or(0.0),
                pops.get(&1).copied().unwrap_or(0.0),
            );
        }
    }

    println!("\naccepted {accepted} of {STEPS} proposals");
    println!("final state: {current}");
    let sizes: Vec<usize> = current.parts().values().map(|set| set.len()).collect();
    println!("part sizes: {sizes:?}");
}
