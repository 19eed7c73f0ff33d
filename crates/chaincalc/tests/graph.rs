//! End-to-end graph scenarios
//!
//! Exercises the public graph-manager operations the way a front end
//! would: build chains of referenced values, then watch what each upstream
//! edit recomputes.

use chaincalc::prelude::*;

fn graph() -> GraphManager<MemoryStore> {
    GraphManager::new(MemoryStore::new())
}

fn reference(id: &NodeId) -> String {
    format!("{{{{{id}}}}}")
}

#[test]
fn exact_decimals_survive_chaining() {
    let mut g = graph();

    let a = g.create_node("0.1+0.2").unwrap();
    assert_eq!(a.value_text(), "0.3");

    // The float artifact (0.30000000000000004) would poison every
    // downstream node; exact decimals must not.
    let b = g.create_node(&format!("{}*10", reference(&a.id))).unwrap();
    assert_eq!(b.value_text(), "3");

    let c = g.create_node(&format!("{}-3", reference(&b.id))).unwrap();
    assert_eq!(c.value_text(), "0");
}

#[test]
fn cascade_recomputes_whole_chain_in_order() {
    let mut g = graph();

    let a = g.create_node("1").unwrap();
    let b = g.create_node(&format!("{}+1", reference(&a.id))).unwrap();
    let c = g.create_node(&format!("{}+1", reference(&b.id))).unwrap();
    let d = g.create_node(&format!("{}+1", reference(&c.id))).unwrap();

    let outcome = g.update_formula(&a.id, "100").unwrap();

    assert!(outcome.is_complete());
    assert_eq!(
        outcome.affected,
        vec![b.id.clone(), c.id.clone(), d.id.clone()]
    );
    assert_eq!(g.node(&d.id).unwrap().value_text(), "103");
}

#[test]
fn cascade_uses_current_values_across_a_diamond() {
    let mut g = graph();

    let base = g.create_node("10").unwrap();
    let left = g
        .create_node(&format!("{}*2", reference(&base.id)))
        .unwrap();
    let right = g
        .create_node(&format!("{}*3", reference(&base.id)))
        .unwrap();
    let join = g
        .create_node(&format!(
            "{}+{}",
            reference(&left.id),
            reference(&right.id)
        ))
        .unwrap();
    assert_eq!(join.value_text(), "50");

    let outcome = g.update_formula(&base.id, "100").unwrap();

    // The join node is recomputed once, after both arms
    assert_eq!(outcome.affected.len(), 3);
    assert_eq!(outcome.affected[2], join.id);
    assert_eq!(g.node(&join.id).unwrap().value_text(), "500");
}

#[test]
fn cycle_attempts_never_mutate_the_graph() {
    let mut g = graph();

    let a = g.create_node("1").unwrap();
    let b = g.create_node(&format!("{}+1", reference(&a.id))).unwrap();
    let c = g.create_node(&format!("{}+1", reference(&b.id))).unwrap();

    // Direct, transitive, and self cycles are all rejected
    for formula in [
        reference(&b.id),
        format!("{}+5", reference(&c.id)),
        reference(&a.id),
    ] {
        let err = g.update_formula(&a.id, &formula).unwrap_err();
        assert!(matches!(err, Error::CircularDependency { .. }));
    }

    // The chain still computes as before
    let outcome = g.update_formula(&a.id, "2").unwrap();
    assert!(outcome.is_complete());
    assert_eq!(g.node(&c.id).unwrap().value_text(), "4");
}

#[test]
fn failed_node_feeds_stale_value_downstream() {
    let mut g = graph();

    let a = g.create_node("5").unwrap();
    let p = g.create_node("100").unwrap();
    let broken = g
        .create_node(&format!("{}+{}", reference(&a.id), reference(&p.id)))
        .unwrap();
    let downstream = g
        .create_node(&format!("{}*2", reference(&broken.id)))
        .unwrap();
    assert_eq!(downstream.value_text(), "210");

    // Delete the second parent behind the manager's back
    g.store_mut().delete(&p.id);

    let outcome = g.update_formula(&a.id, "6").unwrap();

    // `broken` failed, but `downstream` was still recomputed from its
    // stale value
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].id, broken.id);
    assert_eq!(outcome.affected, vec![downstream.id.clone()]);
    assert_eq!(g.node(&broken.id).unwrap().value_text(), "105");
    assert_eq!(g.node(&downstream.id).unwrap().value_text(), "210");
}

#[test]
fn failed_node_can_be_repaired_individually() {
    let mut g = graph();

    let a = g.create_node("5").unwrap();
    let p = g.create_node("100").unwrap();
    let broken = g
        .create_node(&format!("{}+{}", reference(&a.id), reference(&p.id)))
        .unwrap();

    g.store_mut().delete(&p.id);
    let outcome = g.update_formula(&a.id, "6").unwrap();
    assert!(!outcome.is_complete());

    // Repointing the failed node at live parents brings it back
    let repaired = g
        .update_formula(&broken.id, &format!("{}+1", reference(&a.id)))
        .unwrap();
    assert!(repaired.is_complete());
    assert_eq!(g.node(&broken.id).unwrap().value_text(), "7");
}

#[test]
fn delete_is_guarded_then_allowed() {
    let mut g = graph();

    let a = g.create_node("1").unwrap();
    let b = g.create_node(&format!("{}+1", reference(&a.id))).unwrap();

    assert!(matches!(
        g.delete_node(&a.id).unwrap_err(),
        Error::DependentsExist { .. }
    ));

    // Detach the child, then the delete goes through
    g.update_formula(&b.id, "42").unwrap();
    g.delete_node(&a.id).unwrap();
    assert_eq!(g.len(), 1);
    assert_eq!(g.node(&b.id).unwrap().value_text(), "42");
}

#[test]
fn updates_are_deterministic() {
    let mut g = graph();

    let a = g.create_node("2").unwrap();
    let b = g.create_node(&format!("{}^10", reference(&a.id))).unwrap();
    assert_eq!(b.value_text(), "1024");

    let first = g.update_formula(&a.id, "1/7").unwrap();
    let first_value = g.node(&b.id).unwrap().value_text();

    let second = g.update_formula(&a.id, "1/7").unwrap();
    let second_value = g.node(&b.id).unwrap().value_text();

    assert_eq!(first.value, second.value);
    assert_eq!(first_value, second_value);
}

#[test]
fn division_by_zero_surfaces_from_create() {
    let mut g = graph();
    let err = g.create_node("5/0").unwrap_err();
    assert!(matches!(err, Error::Formula(FormulaError::DivisionByZero)));
    assert!(g.is_empty());
}
