//! End-to-end scenarios: comment text in, registry instances out.

use parspec_core::error::{RegistryError, TreeError};
use parspec_core::{LoadOptions, OpenChoice, Registry, SchemaNode, Value};

fn registry(lines: &[&str]) -> Registry {
    let mut reg = Registry::with_options(LoadOptions::strict());
    reg.load_lines("Scenario.hh", lines).unwrap();
    reg.finish_load().unwrap();
    reg
}

const WRM: &[&str] = &[
    "``[model-spec]``",
    "* `\"wrm`\" ``[wrm-typed-spec]`` the water retention model",
    "",
    "``[wrm-ab-spec]``",
    "* `\"alpha`\" ``[double]``",
    "* `\"n`\" ``[double]`` **2.0**",
    "",
    "``[wrm-van-genuchten-spec]``",
    "* `\"m`\" ``[double]``",
];

#[test]
fn typed_standard_adds_type_and_parameters() {
    let reg = registry(WRM);
    let mut model = reg.get("model-spec").unwrap();
    assert!(!model.is_complete());

    let open = model.open_alternations();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].path, vec!["wrm"]);
    assert_eq!(
        open[0].choice,
        OpenChoice::Type {
            field: "wrm".into(),
            valid: vec!["ab".into(), "van-genuchten".into()],
        }
    );

    let wrm = model.node_mut("wrm").unwrap();
    wrm.set("wrm type", "ab").unwrap();
    assert_eq!(wrm.get("wrm type"), Some(&Value::from("ab")));
    let params = wrm.node("ab parameters").unwrap();
    assert_eq!(params.type_name(), "wrm-ab-spec");
    assert_eq!(params.get("n"), Some(&Value::Double(2.0)));
    assert!(!wrm.is_complete());

    wrm.node_mut("ab parameters")
        .unwrap()
        .set("alpha", 0.1)
        .unwrap();
    assert!(model.is_complete());
    assert!(model.open_alternations().is_empty());
}

#[test]
fn typed_type_is_set_once_and_must_be_known() {
    let reg = registry(WRM);
    let mut model = reg.get("model-spec").unwrap();
    let wrm = model.node_mut("wrm").unwrap();

    let err = wrm.set("wrm type", "nope").unwrap_err();
    match err {
        TreeError::UnknownType { valid, .. } => assert_eq!(valid, "ab, van-genuchten"),
        other => panic!("unexpected {:?}", other),
    }

    // Spaces in the requested type are looked up hyphenated.
    wrm.set("wrm type", "van genuchten").unwrap();
    assert!(wrm.contains("van genuchten parameters"));
    assert!(matches!(
        wrm.set("wrm type", "ab"),
        Err(TreeError::TypeAlreadySet { .. })
    ));
}

#[test]
fn typed_instances_do_not_share_selected_types() {
    let reg = registry(WRM);
    let mut first = reg.get("model-spec").unwrap();
    let second = reg.get("model-spec").unwrap();
    first
        .node_mut("wrm")
        .unwrap()
        .set("wrm type", "ab")
        .unwrap();
    let untouched = second.node("wrm").unwrap();
    assert_eq!(untouched.get("wrm type"), None);
    assert!(!untouched.contains("ab parameters"));
    assert!(!reg.get("model-spec").unwrap().node("wrm").unwrap().contains("ab parameters"));
}

const PLACEMENTS: &[&str] = &[
    "``[outer-spec]``",
    "* `\"inline`\" ``[my-typedinline-spec]``",
    "* `\"my a`\" ``[my-typedsublist-spec]``",
    "* `\"dashed`\" ``[my-typedsublistdash-spec]``",
    "",
    "``[my-a-spec]``",
    "* `\"a parameter`\" ``[int]``",
];

#[test]
fn inline_placement_merges_the_variant() {
    let reg = registry(PLACEMENTS);
    let mut outer = reg.get("outer-spec").unwrap();
    let inline = outer.node_mut("inline").unwrap();
    assert!(inline.contains("my type"));
    inline.set("my type", "a").unwrap();
    inline.set("a parameter", 4).unwrap();
    assert_eq!(inline.get("a parameter"), Some(&Value::Int(4)));
    assert!(inline.is_complete());
}

#[test]
fn sublist_placement_nests_under_field_and_type() {
    let reg = registry(PLACEMENTS);
    let mut outer = reg.get("outer-spec").unwrap();
    let sub = outer.node_mut("my a").unwrap();
    assert!(!sub.has_value());
    sub.set("my type", "a").unwrap();
    assert!(sub.has_value());
    sub.node_mut("my: a")
        .unwrap()
        .set("a parameter", 1)
        .unwrap();

    let value = outer
        .node("my a")
        .and_then(|n| n.node("my: a"))
        .and_then(|n| n.get("a parameter"));
    assert_eq!(value, Some(&Value::Int(1)));
    // The virtual selector is never a real parameter.
    assert!(outer.node("my a").unwrap().parameter("my type").is_none());
}

#[test]
fn sublist_dash_placement_hyphenates_the_key() {
    let reg = registry(PLACEMENTS);
    let mut outer = reg.get("outer-spec").unwrap();
    let dashed = outer.node_mut("dashed").unwrap();
    dashed.set("my type", "a").unwrap();
    assert!(dashed.contains("my-a"));
    assert!(!dashed.contains("my: a"));
}

#[test]
fn lists_of_typed_specs_resolve_both_layers() {
    let reg = registry(WRM);
    let mut list = reg.get("wrm-typed-spec-list").unwrap();
    assert_eq!(list.type_name(), "wrm-typed-spec-list");
    let entry = list.append("soil").unwrap();
    assert!(matches!(entry, SchemaNode::Typed(_)));
    entry.set("wrm type", "van-genuchten").unwrap();
    assert!(!list.is_complete());
    list.node_mut("soil")
        .unwrap()
        .node_mut("van-genuchten parameters")
        .unwrap()
        .set("m", 0.5)
        .unwrap();
    assert!(list.is_complete());
}

#[test]
fn one_of_with_shared_name_prunes_progressively() {
    let reg = registry(&[
        "ONE OF",
        "* `\"a`\" ``[double]``",
        "* `\"b`\" ``[double]``",
        "* `\"letter_or_number`\" ``[double]``",
        "OR",
        "* `\"one`\" ``[double]``",
        "* `\"two`\" ``[double]``",
        "* `\"letter_or_number`\" ``[double]``",
        "OR",
        "* `\"blue`\" ``[double]``",
        "* `\"red`\" ``[double]``",
        "END",
    ]);
    let mut spec = reg.get("scenario-spec").unwrap();
    spec.set("letter_or_number", 1.0).unwrap();
    match &spec.open_alternations()[0].choice {
        OpenChoice::OneOf { branches } => assert_eq!(branches.len(), 2),
        other => panic!("unexpected {:?}", other),
    }

    spec.set("a", 2.0).unwrap();
    assert!(spec.open_alternations().is_empty());
    assert!(!spec.is_complete());
    assert!(matches!(
        spec.set("red", 1.0),
        Err(TreeError::PrunedBranch { .. })
    ));
    spec.set("b", 3.0).unwrap();
    assert!(spec.is_complete());
}

#[test]
fn conflicting_alternations_reject_the_second_write() {
    let reg = registry(&[
        "``[multi-spec]``",
        "ONE OF",
        "* `\"a`\" ``[double]``",
        "OR",
        "* `\"b`\" ``[double]``",
        "END",
        "ONE OF",
        "* `\"c`\" ``[double]``",
        "* `\"a`\" ``[double]``",
        "OR",
        "* `\"d`\" ``[double]``",
        "END",
    ]);
    let mut spec = reg.get("multi-spec").unwrap();
    spec.set("d", 1.0).unwrap();
    assert!(matches!(
        spec.set("a", 1.0),
        Err(TreeError::PrunedBranch { .. })
    ));
    // The failed write left the first alternation untouched.
    assert_eq!(spec.get("a"), None);
    assert_eq!(spec.open_alternations().len(), 1);
    spec.set("b", 2.0).unwrap();
    assert!(spec.is_complete());
}

#[test]
fn shared_sub_spec_survives_narrowing() {
    let reg = registry(&[
        "``[outer-spec]``",
        "ONE OF",
        "* `\"a`\" ``[double]``",
        "* `\"sub`\" ``[inner-spec]``",
        "OR",
        "* `\"b`\" ``[double]``",
        "* `\"sub`\" ``[inner-spec]``",
        "END",
        "",
        "``[inner-spec]``",
        "* `\"x`\" ``[double]``",
    ]);
    let mut spec = reg.get("outer-spec").unwrap();
    spec.node_mut("sub").unwrap().set("x", 1.0).unwrap();
    spec.set("b", 2.0).unwrap();

    let sub = spec.as_spec().unwrap().parameter("sub").and_then(|p| p.node()).unwrap();
    assert_eq!(sub.get("x"), Some(&Value::Double(1.0)));
    assert!(spec.is_complete());
    assert!(matches!(spec.set("a", 1.0), Err(TreeError::PrunedBranch { .. })));
}

#[test]
fn conditional_branches_follow_the_case() {
    let reg = registry(&[
        "IF",
        "* `\"use source`\" ``[bool]``",
        "THEN",
        "* `\"source key`\" ``[string]``",
        "ELSE",
        "* `\"constant`\" ``[double]``",
        "END",
    ]);
    let mut spec = reg.get("scenario-spec").unwrap();
    assert!(matches!(
        spec.set("constant", 1.0),
        Err(TreeError::CaseNotSet { .. })
    ));
    spec.set("use source", true).unwrap();
    assert!(matches!(
        spec.set("constant", 1.0),
        Err(TreeError::BranchMismatch { .. })
    ));
    assert!(!spec.is_complete());
    spec.set("source key", "flow").unwrap();
    assert!(spec.is_complete());
}

#[test]
fn keys_desugar_to_key_or_suffix() {
    let reg = registry(&[
        "``[eval-spec]``",
        "* `\"factor`\" ``[double]`` **1.0**",
        "KEYS:",
        "- `\"temperature`\" **DOMAIN-temperature** the temperature field",
    ]);
    let mut spec = reg.get("eval-spec").unwrap();
    assert_eq!(spec.as_spec().unwrap().keys(), ["temperature".to_owned()]);
    assert!(spec.is_complete());

    spec.set("temperature suffix", "T").unwrap();
    assert_eq!(spec.get("temperature suffix"), Some(&Value::from("T")));
    assert!(matches!(
        spec.set("temperature key", "surface-temperature"),
        Err(TreeError::PrunedBranch { .. })
    ));

    let fresh = reg.get("eval-spec").unwrap();
    let suffix = fresh.parameter("temperature suffix").unwrap();
    assert_eq!(suffix.default(), Some(&Value::from("temperature")));
}

#[test]
fn includes_are_merged_recursively() {
    let reg = registry(&[
        "``[base-spec]``",
        "* `\"shared`\" ``[int]`` **3**",
        "",
        "``[middle-spec]``",
        "* `\"middle`\" ``[bool]`` **false**",
        "INCLUDES:",
        "- `\"base-spec`\"",
        "",
        "``[top-spec]``",
        "* `\"own`\" ``[double]``",
        "* ``[middle-spec]`` everything from middle",
    ]);
    let top = reg.get("top-spec").unwrap();
    assert_eq!(top.get("shared"), Some(&Value::Int(3)));
    assert_eq!(top.get("middle"), Some(&Value::Bool(false)));
    assert!(top.contains("own"));
}

#[test]
fn recursive_lists_are_lazy() {
    let reg = registry(&[
        "``[tree-spec]``",
        "* `\"v`\" ``[int]``",
        "* `\"children`\" ``[tree-spec-list]``",
    ]);
    let mut tree = reg.get("tree-spec").unwrap();
    let child = tree.node_mut("children").unwrap().append("left").unwrap();
    child.set("v", 2).unwrap();
    assert!(child.node("children").is_some());
}

#[test]
fn eager_cycles_are_reported() {
    let lines = [
        "``[a-spec]``",
        "* `\"b`\" ``[b-spec]``",
        "",
        "``[b-spec]``",
        "* `\"a`\" ``[a-spec]``",
    ];

    let mut strict = Registry::with_options(LoadOptions::strict());
    strict.load_lines("Cycle.hh", &lines).unwrap();
    let err = strict.finish_load().unwrap_err();
    assert_eq!(err.pass, 3);
    assert!(err.message.contains("cycle"), "{}", err);

    let mut lenient = Registry::new();
    lenient.load_lines("Cycle.hh", &lines).unwrap();
    assert_eq!(lenient.finish_load().unwrap().len(), 1);
    assert!(matches!(
        lenient.get("a-spec"),
        Err(RegistryError::Cycle(_))
    ));
}

#[test]
fn dangling_references_fail_at_resolution() {
    let mut reg = Registry::new();
    reg.load_lines("Dangling.hh", &["* `\"x`\" ``[missing-spec]``"])
        .unwrap();
    let problems = reg.finish_load().unwrap();
    assert_eq!(problems.len(), 1);
    assert!(problems[0].message.contains("missing-spec"));
    assert!(matches!(
        reg.get("dangling-spec"),
        Err(RegistryError::UnknownSpec(name)) if name == "missing-spec"
    ));
}
