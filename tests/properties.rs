//! Property tests: bidirectionality, cascade completeness, revert and merge
//! fidelity under random operation sequences.

use proptest::prelude::*;

use program_graph_kernel::{
    check_integrity, DeltaIndex, GraphError, GraphItem, IndexSnapshot, ItemGraph, ItemId,
    ItemIndex, ItemType, Relation,
};

// ─────────────────────────────────────────────────────────────────────────────
// Operations
// ─────────────────────────────────────────────────────────────────────────────

/// Relations exercised by random `link`/`unlink` calls.
const LINKABLE: [Relation; 12] = [
    Relation::Dependencies,
    Relation::Incoming,
    Relation::Superclass,
    Relation::Superinterfaces,
    Relation::ReturnType,
    Relation::ParamTypes,
    Relation::ThrowsTypes,
    Relation::FieldType,
    Relation::ArrayBaseClass,
    Relation::UsedByArrayClass,
    Relation::OuterClass,
    Relation::InnerClasses,
];

#[derive(Debug, Clone)]
enum Op {
    Create { parent: Option<usize>, kind: usize },
    Link { source: usize, relation: usize, target: usize },
    Unlink { source: usize, relation: usize, target: usize },
    Remove { victim: usize },
    Revert { target: usize },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (proptest::option::of(0usize..64), 0..ItemType::ALL.len())
            .prop_map(|(parent, kind)| Op::Create { parent, kind }),
        4 => (0usize..64, 0..LINKABLE.len(), 0usize..64)
            .prop_map(|(source, relation, target)| Op::Link { source, relation, target }),
        1 => (0usize..64, 0..LINKABLE.len(), 0usize..64)
            .prop_map(|(source, relation, target)| Op::Unlink { source, relation, target }),
        1 => (0usize..64).prop_map(|victim| Op::Remove { victim }),
        1 => (0usize..64).prop_map(|target| Op::Revert { target }),
    ]
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    proptest::collection::vec(op_strategy(), 1..60)
}

fn pick(ids: &[ItemId], n: usize) -> Option<ItemId> {
    (!ids.is_empty()).then(|| ids[n % ids.len()])
}

/// Apply one operation, ignoring contract errors. Returns the removed ID.
///
/// `Revert` only means something on a delta; see [`apply_to_delta`].
fn apply<G: ItemGraph>(graph: &mut G, op: &Op, counter: &mut usize) -> Option<ItemId> {
    let live: Vec<ItemId> = graph.items().map(|node| node.id()).collect();
    match op {
        Op::Create { parent, kind } => {
            let item_type = ItemType::ALL[*kind];
            let containers: Vec<ItemId> = graph
                .items()
                .filter(|node| node.item_type().can_contain(item_type))
                .map(|node| node.id())
                .collect();
            let parent = parent.and_then(|n| pick(&containers, n));
            *counter += 1;
            graph
                .create_item(parent, &format!("N{counter}"), item_type, false)
                .ok();
            None
        }
        Op::Link { source, relation, target } => {
            if let (Some(s), Some(t)) = (pick(&live, *source), pick(&live, *target)) {
                let _ = graph.link(s, LINKABLE[*relation], t);
            }
            None
        }
        Op::Unlink { source, relation, target } => {
            if let (Some(s), Some(t)) = (pick(&live, *source), pick(&live, *target)) {
                let _ = graph.unlink(s, LINKABLE[*relation], t);
            }
            None
        }
        Op::Remove { victim } => {
            let id = pick(&live, *victim)?;
            graph.remove_item(id).ok().map(|_| id)
        }
        Op::Revert { .. } => None,
    }
}

fn apply_to_delta(delta: &mut DeltaIndex<'_>, op: &Op, counter: &mut usize) -> Option<ItemId> {
    if let Op::Revert { target } = op {
        let live: Vec<ItemId> = delta.items().map(|node| node.id()).collect();
        if let Some(id) = pick(&live, *target) {
            let _ = delta.revert_item(id);
        }
        return None;
    }
    apply(delta, op, counter)
}

fn referenced_anywhere<G: ItemGraph>(graph: &G, id: ItemId) -> bool {
    graph.items().any(|node| {
        Relation::ALL
            .iter()
            .any(|relation| node.links().contains(*relation, id))
    })
}

fn seeded(ops: &[Op]) -> ItemIndex {
    let mut index = ItemIndex::new("v1");
    let mut counter = 0;
    for n in 0..4 {
        index
            .create_item(None, &format!("Seed{n}"), ItemType::Class, false)
            .unwrap();
    }
    for op in ops {
        apply(&mut index, op, &mut counter);
    }
    index
}

// ─────────────────────────────────────────────────────────────────────────────
// Properties
// ─────────────────────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_every_operation_keeps_links_bidirectional(ops in ops_strategy()) {
        let mut index = seeded(&[]);
        let mut counter = 0;
        for op in &ops {
            let removed = apply(&mut index, op, &mut counter);
            let violations = check_integrity(&index);
            prop_assert!(violations.is_empty(), "after {:?}: {:?}", op, violations);
            if let Some(id) = removed {
                prop_assert!(!index.contains(id));
                prop_assert!(!referenced_anywhere(&index, id), "{} still referenced", id);
            }
        }
    }

    #[test]
    fn prop_delta_operations_keep_links_bidirectional(base_ops in ops_strategy(), delta_ops in ops_strategy()) {
        let base = seeded(&base_ops);
        let before = IndexSnapshot::capture(&base).fingerprint().unwrap();

        let mut delta = DeltaIndex::new(&base, "v2");
        let mut counter = 1_000;
        for op in &delta_ops {
            apply_to_delta(&mut delta, op, &mut counter);
            let violations = check_integrity(&delta);
            prop_assert!(violations.is_empty(), "after {:?}: {:?}", op, violations);
        }

        prop_assert_eq!(IndexSnapshot::capture(&base).fingerprint().unwrap(), before);
    }

    #[test]
    fn prop_merge_reproduces_delta_state(base_ops in ops_strategy(), delta_ops in ops_strategy()) {
        let mut base = seeded(&base_ops);

        let mut delta = DeltaIndex::new(&base, "v2");
        let mut counter = 1_000;
        for op in &delta_ops {
            apply_to_delta(&mut delta, op, &mut counter);
        }
        let expected = IndexSnapshot::capture(&delta).items;
        let changes = delta.into_changes();

        base.merge(changes).unwrap();

        prop_assert_eq!(IndexSnapshot::capture(&base).items, expected);
        prop_assert!(check_integrity(&base).is_empty());
    }

    #[test]
    fn prop_base_edits_before_merge_are_caught(
        base_ops in ops_strategy(),
        delta_ops in ops_strategy(),
        late_ops in ops_strategy(),
    ) {
        let mut base = seeded(&base_ops);

        let mut delta = DeltaIndex::new(&base, "v2");
        let mut counter = 1_000;
        for op in &delta_ops {
            apply_to_delta(&mut delta, op, &mut counter);
        }
        let expected = IndexSnapshot::capture(&delta).items;
        let changes = delta.into_changes();

        let revision = base.revision();
        let mut late_counter = 2_000;
        for op in &late_ops {
            apply(&mut base, op, &mut late_counter);
        }
        let edited = base.revision() != revision;
        let before = IndexSnapshot::capture(&base).fingerprint().unwrap();

        let result = base.merge(changes);

        if edited {
            prop_assert!(matches!(result, Err(GraphError::StaleDelta { .. })), "{:?}", result);
            prop_assert_eq!(IndexSnapshot::capture(&base).fingerprint().unwrap(), before);
        } else {
            prop_assert!(result.is_ok(), "{:?}", result);
            prop_assert_eq!(IndexSnapshot::capture(&base).items, expected);
        }
        prop_assert!(check_integrity(&base).is_empty());
    }

    #[test]
    fn prop_consolidation_preserves_structure(ops in ops_strategy()) {
        let mut index = seeded(&ops);
        let live = index.len();
        let edges = IndexSnapshot::capture(&index).edge_count();

        index.consolidate_ids();

        prop_assert_eq!(index.len(), live);
        prop_assert_eq!(index.slot_count(), live);
        prop_assert_eq!(IndexSnapshot::capture(&index).edge_count(), edges);
        prop_assert!(check_integrity(&index).is_empty());
    }
}
