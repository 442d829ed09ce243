//! Integration tests for the dependency injector against a full
//! bootstrap session: greedy-prefix resolution, currying, and the
//! internal registry namespace.

use embark_core::{arg, BootError, BootSession, InvokePolicy, Unit};

fn session() -> BootSession {
    BootSession::builder()
        .external("a", arg(1i64))
        .external("b", arg(2i64))
        .build()
}

fn collect_unit(params: &[&str]) -> Unit {
    Unit::with_params(params.to_vec(), |_cx, args| {
        let values: Vec<i64> = args
            .iter()
            .map(|a| a.downcast_ref::<i64>().copied().unwrap_or(-1))
            .collect();
        Ok(arg(values))
    })
    .unwrap()
}

#[test]
fn wrapper_behaves_like_the_original_call() {
    let session = session();
    let unit = collect_unit(&["a", "b", "c"]);

    let bound = session
        .inject(&unit, InvokePolicy::AllowPartial)
        .unwrap()
        .into_partial()
        .expect("c is unresolved");
    assert_eq!(bound.residual(), 1);

    // Invoking the wrapper with x must behave identically to calling the
    // original with (a, b, x).
    let via_wrapper = bound.call(&[arg(9i64)]).unwrap();
    let direct = unit
        .call(session.injector().context(), &[arg(1i64), arg(2i64), arg(9i64)])
        .unwrap();
    assert_eq!(
        via_wrapper.downcast_ref::<Vec<i64>>(),
        direct.downcast_ref::<Vec<i64>>()
    );
    assert_eq!(
        via_wrapper.downcast_ref::<Vec<i64>>(),
        Some(&vec![1, 2, 9])
    );
}

#[test]
fn fully_resolvable_unit_invokes_under_both_policies() {
    let session = session();
    let unit = collect_unit(&["a", "b"]);

    for policy in [InvokePolicy::MustInvoke, InvokePolicy::AllowPartial] {
        let value = session
            .inject(&unit, policy)
            .unwrap()
            .into_value()
            .expect("no residual, no wrapper");
        assert_eq!(value.downcast_ref::<Vec<i64>>(), Some(&vec![1, 2]));
    }
}

#[test]
fn unresolvable_leading_name_makes_everything_residual() {
    let session = session();
    let unit = collect_unit(&["nope", "also_nope"]);

    let bound = session
        .inject(&unit, InvokePolicy::AllowPartial)
        .unwrap()
        .into_partial()
        .unwrap();
    assert_eq!(bound.residual(), 2);

    let value = bound.call(&[arg(7i64), arg(8i64)]).unwrap();
    assert_eq!(value.downcast_ref::<Vec<i64>>(), Some(&vec![7, 8]));
}

#[test]
fn greedy_prefix_stops_at_the_first_gap() {
    let session = session();
    // `b` exists in the registry but sits behind the unresolvable `x`.
    let unit = collect_unit(&["x", "b", "y"]);

    let bound = session
        .inject(&unit, InvokePolicy::AllowPartial)
        .unwrap()
        .into_partial()
        .unwrap();
    assert_eq!(bound.residual(), 3);
    assert_eq!(bound.signature().params(), &["x", "b", "y"]);
}

#[test]
fn must_invoke_with_residual_fails() {
    let session = session();
    let unit = collect_unit(&["a", "b", "c"]);

    let err = session.inject(&unit, InvokePolicy::MustInvoke).unwrap_err();
    assert!(matches!(err, BootError::InjectionArity { residual: 1 }));
}

#[test]
fn internal_slot_read_too_early_is_a_resolution_error() {
    let session = BootSession::builder().internal_slot("server").build();
    let unit = Unit::with_params(["$server"], |_cx, args| Ok(args[0].clone())).unwrap();

    let err = session
        .inject(&unit, InvokePolicy::AllowPartial)
        .unwrap_err();
    assert!(matches!(err, BootError::UsedTooEarly { ref name } if name == "$server"));

    // Once populated, the same unit resolves.
    session.fill_internal("server", arg("listening")).unwrap();
    let value = session
        .inject(&unit, InvokePolicy::MustInvoke)
        .unwrap()
        .into_value()
        .unwrap();
    assert_eq!(value.downcast_ref::<&str>(), Some(&"listening"));
}

#[test]
fn external_entry_shadows_internal_namespace() {
    // Advisory warning only; the external value wins.
    let session = BootSession::builder()
        .internal_slot("server")
        .external("$server", arg("shadowed"))
        .build();

    let unit = Unit::with_params(["$server"], |_cx, args| Ok(args[0].clone())).unwrap();
    let value = session
        .inject(&unit, InvokePolicy::MustInvoke)
        .unwrap()
        .into_value()
        .unwrap();
    assert_eq!(value.downcast_ref::<&str>(), Some(&"shadowed"));
}
