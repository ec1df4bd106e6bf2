//! Integration tests for graph population, lookup and cascade removal.

use program_graph_kernel::{
    check_integrity, DeltaEntry, DeltaIndex, GraphItem, IndexConfig, ItemGraph, ItemIndex,
    ItemType, Relation,
};

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn assert_consistent<G: ItemGraph>(graph: &G) {
    let violations = check_integrity(graph);
    assert!(violations.is_empty(), "integrity violations: {violations:?}");
}

/// Whether `id` appears anywhere in any live item's links.
fn referenced_anywhere<G: ItemGraph>(graph: &G, id: program_graph_kernel::ItemId) -> bool {
    graph.items().any(|node| {
        Relation::ALL
            .iter()
            .any(|relation| node.links().contains(*relation, id))
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Containment
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_project_package_class_containment() {
    let mut index = ItemIndex::new("v1");
    let mut factory = index.factory();
    let p = factory.create_project("P").unwrap();
    let k = factory.create_package(Some(p), "P:k").unwrap();
    let c = factory.create_class(Some(k), "P:k:C").unwrap();

    assert_eq!(index.get(p).unwrap().children(), &[k]);
    assert_eq!(index.get(k).unwrap().children(), &[c]);
    assert_eq!(index.get(k).unwrap().parent(), Some(p));
    assert_eq!(index.get(c).unwrap().parent(), Some(k));
    assert_consistent(&index);
}

#[test]
fn test_dependency_is_mirrored_as_incoming() {
    let mut index = ItemIndex::new("v1");
    let a = index.factory().create_class(None, "A").unwrap();
    let b = index.factory().create_class(None, "B").unwrap();

    index.link(a, Relation::Dependencies, b).unwrap();

    assert_eq!(index.get(a).unwrap().dependencies(), &[b]);
    assert_eq!(index.get(b).unwrap().incoming(), &[a]);
    assert_consistent(&index);
}

// ─────────────────────────────────────────────────────────────────────────────
// Delta Isolation
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_removing_child_in_delta_keeps_base_child() {
    let mut v1 = ItemIndex::new("v1");
    let a = v1.factory().create_class(None, "A").unwrap();
    let m = v1.factory().create_method(a, "M", &[]).unwrap();

    let mut v2 = DeltaIndex::new(&v1, "v2");
    v2.remove_item(m).unwrap();

    assert_eq!(v1.get(a).unwrap().children(), &[m]);
    assert!(v2.get(a).unwrap().children().is_empty());
    assert!(v1.contains(m));
    assert!(!v2.contains(m));
    assert_consistent(&v1);
    assert_consistent(&v2);
}

// ─────────────────────────────────────────────────────────────────────────────
// Cascade Removal
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_removing_return_type_clears_method_attribute() {
    let mut index = ItemIndex::new("v1");
    let owner = index.factory().create_class(None, "Owner").unwrap();
    let r = index.factory().create_class(None, "R").unwrap();
    let run = index.factory().create_method(owner, "run", &[]).unwrap();
    index.link(run, Relation::ReturnType, r).unwrap();
    assert!(index.get(r).unwrap().links().used_by_methods_and_fields().contains(&run));

    index.remove_item(r).unwrap();

    assert_eq!(index.get(run).unwrap().links().return_type(), None);
    assert!(!referenced_anywhere(&index, r));
    assert_consistent(&index);
}

#[test]
fn test_removing_type_strips_every_relation_kind() {
    let mut index = ItemIndex::new("v1");
    let mut factory = index.factory();
    let package = factory.create_package(None, "k").unwrap();
    let target = factory.create_class(Some(package), "Target").unwrap();
    let inner = factory.create_class(Some(target), "Inner").unwrap();
    let array = factory.array_of(target, 1).unwrap();
    let user = factory.create_class(Some(package), "User").unwrap();
    let method = factory.create_method(user, "use", &[target, target]).unwrap();
    let field = factory.create_field(user, "f").unwrap();

    let graph = factory.graph_mut();
    graph.link(user, Relation::Superclass, target).unwrap();
    graph.link(user, Relation::Superinterfaces, target).unwrap();
    graph.link(user, Relation::Dependencies, target).unwrap();
    graph.link(target, Relation::Dependencies, user).unwrap();
    graph.link(method, Relation::ReturnType, target).unwrap();
    graph.link(method, Relation::ThrowsTypes, target).unwrap();
    graph.link(field, Relation::FieldType, target).unwrap();
    assert_consistent(&index);

    index.remove_item(target).unwrap();

    assert!(!referenced_anywhere(&index, target));
    assert!(index.get(method).unwrap().links().param_types().is_empty());
    assert_eq!(index.get(inner).unwrap().parent(), None);
    assert_eq!(index.get(inner).unwrap().links().outer_class(), None);
    assert_eq!(index.get(array).unwrap().links().array_base_class(), None);
    assert_consistent(&index);
}

// ─────────────────────────────────────────────────────────────────────────────
// Signature Matching
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_wildcard_parameter_matches_concrete_type() {
    let mut index = ItemIndex::new("v1");
    let mut factory = index.factory();
    let class = factory.create_class(None, "C").unwrap();
    let wildcard = factory.wildcard().unwrap();
    let int = factory.primitive("int").unwrap();
    let f = factory.create_method(class, "f", &[wildcard]).unwrap();

    assert_eq!(index.find_method(Some(class), "f", &[int]), Some(f));
    assert_eq!(index.find_method_exact(Some(class), "f", &[int]), None);
}

#[test]
fn test_concrete_parameter_matches_wildcard_query() {
    let mut index = ItemIndex::new("v1");
    let mut factory = index.factory();
    let class = factory.create_class(None, "C").unwrap();
    let wildcard = factory.wildcard().unwrap();
    let int = factory.primitive("int").unwrap();
    let f = factory.create_method(class, "f", &[int]).unwrap();

    assert_eq!(index.find_method(Some(class), "f", &[wildcard]), Some(f));
    assert_eq!(index.find_method(Some(class), "f", &[int, int]), None);
}

#[test]
fn test_array_parameters_match_structurally() {
    let mut index = ItemIndex::new("v1");
    let mut factory = index.factory();
    let class = factory.create_class(None, "C").unwrap();
    let wildcard = factory.wildcard().unwrap();
    let int = factory.primitive("int").unwrap();
    let ints = factory.array_of(int, 1).unwrap();
    let any_array = factory.array_of(wildcard, 1).unwrap();
    let int_matrix = factory.array_of(int, 2).unwrap();
    let f = factory.create_method(class, "f", &[ints]).unwrap();

    assert_eq!(index.find_method(Some(class), "f", &[any_array]), Some(f));
    assert_eq!(index.find_method(Some(class), "f", &[int_matrix]), None);
    assert!(!index.types_match(int, ints));
}

#[test]
fn test_lookup_by_parent_name_chain() {
    let mut index = ItemIndex::new("v1");
    let mut factory = index.factory();
    let p1 = factory.create_project("P1").unwrap();
    let p2 = factory.create_project("P2").unwrap();
    let k1 = factory.create_package(Some(p1), "k").unwrap();
    let k2 = factory.create_package(Some(p2), "k").unwrap();
    let c1 = factory.create_class(Some(k1), "C").unwrap();
    let c2 = factory.create_class(Some(k2), "C").unwrap();

    assert_ne!(c1, c2);
    assert_eq!(index.find_class(Some(k1), "C"), Some(c1));
    assert_eq!(index.find_class(Some(k2), "C"), Some(c2));
    assert_eq!(index.find_packages("k"), vec![k1, k2]);
    assert_eq!(index.find_all_with_same_name(ItemType::Class, "C"), vec![c1, c2]);
}

#[test]
fn test_small_prefix_buckets_still_resolve_exact_names() {
    let config = IndexConfig {
        name_prefix_len: 2,
        ..IndexConfig::default()
    };
    let mut index = ItemIndex::with_config("v1", config).unwrap();
    let ids: Vec<_> = ["ListA", "ListB", "Lister", "Li"]
        .iter()
        .map(|name| index.factory().create_class(None, name).unwrap())
        .collect();

    assert_eq!(index.find_class(None, "Lister"), Some(ids[2]));
    assert_eq!(index.find_class(None, "Li"), Some(ids[3]));
    assert_eq!(index.find_class(None, "List"), None);
}

// ─────────────────────────────────────────────────────────────────────────────
// Parallel Delta Construction
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_delta_over_many_items_keeps_order() {
    let mut base = ItemIndex::new("v1");
    let package = base.factory().create_package(None, "bulk").unwrap();
    for n in 0..2_499 {
        base.create_item(Some(package), &format!("C{n}"), ItemType::Class, false)
            .unwrap();
    }
    assert_eq!(base.len(), 2_500);

    let delta = DeltaIndex::new(&base, "v2");

    assert!(delta.construction_batches() > 2);
    assert_eq!(delta.len(), 2_500);
    assert_eq!(delta.slot_count(), 2_500);
    for (position, entry) in delta.items().enumerate() {
        let DeltaEntry::Overlay(item) = entry else {
            panic!("slot {position} is not an overlay");
        };
        let base_item = base.get(item.id()).unwrap();
        assert_eq!(item.id().index(), position);
        assert!(std::ptr::eq(item.base(), base_item));
        assert_eq!(item.links(), base_item.links());
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Visitor Walks
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_walk_follows_containment() {
    use program_graph_kernel::{visitor::from_fn, Field};

    let mut index = ItemIndex::new("v1");
    let mut factory = index.factory();
    let p = factory.create_project("P").unwrap();
    let k = factory.create_package(Some(p), "k").unwrap();
    let c = factory.create_class(Some(k), "C").unwrap();
    let m = factory.create_method(c, "m", &[]).unwrap();
    let other = factory.create_class(None, "Other").unwrap();
    index.link(c, Relation::Dependencies, other).unwrap();

    let mut visitor = from_fn(|_item, field| matches!(field, Field::Children(_)));
    assert_eq!(index.walk(p, &mut visitor), vec![p, k, c, m]);

    assert!(index.describe(m).ends_with("P / k / C / m #3"));
}
