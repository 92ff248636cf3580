use super::*;
use stc_solver::TypeStore;
use std::cell::Cell;

fn unresolved(name: &str) -> UnresolvedVariableEvent {
    UnresolvedVariableEvent {
        node: NodeIndex(0),
        name: name.to_string(),
        resolved_type: None,
    }
}

#[test]
fn test_empty_hook_set_handles_nothing() {
    let store = TypeStore::new();
    let mut hooks = HookSet::new();
    let mut event = unresolved("x");
    assert_eq!(hooks.handle_unresolved_variable(&store, &mut event), Handled::No);
    assert_eq!(event.resolved_type, None);
}

#[test]
fn test_hook_fills_result_slot() {
    let store = TypeStore::new();
    let mut hooks = HookSet::new().on_unresolved_variable(|db, event| {
        if event.name == "env" {
            event.resolved_type = Some(db.string_type());
            return Handled::Yes;
        }
        Handled::No
    });

    let mut env = unresolved("env");
    assert_eq!(hooks.handle_unresolved_variable(&store, &mut env), Handled::Yes);
    assert_eq!(env.resolved_type, Some(store.string_type()));

    let mut other = unresolved("other");
    assert_eq!(hooks.handle_unresolved_variable(&store, &mut other), Handled::No);
}

#[test]
fn test_chain_offers_event_to_every_handler() {
    let store = TypeStore::new();
    let calls = Cell::new(0);
    let mut chain = ExtensionChain::new();
    chain.push(HookSet::new().on_missing_method(|_, _| {
        calls.set(calls.get() + 1);
        Handled::Yes
    }));
    chain.push(HookSet::new().on_missing_method(|_, event| {
        calls.set(calls.get() + 1);
        event.return_type = Some(TypeId::INT);
        Handled::No
    }));

    let mut event = MissingMethodEvent {
        node: NodeIndex(4),
        receiver: store.object_type(),
        name: "frobnicate".to_string(),
        arg_types: vec![],
        return_type: None,
    };
    assert_eq!(chain.handle_missing_method(&store, &mut event), Handled::Yes);
    assert_eq!(calls.get(), 2);
    assert_eq!(event.return_type, Some(TypeId::INT));
    assert_eq!(chain.len(), 2);
}

#[test]
fn test_handled_or() {
    assert_eq!(Handled::No.or(Handled::No), Handled::No);
    assert_eq!(Handled::No.or(Handled::Yes), Handled::Yes);
    assert!(Handled::Yes.or(Handled::No).is_handled());
}
