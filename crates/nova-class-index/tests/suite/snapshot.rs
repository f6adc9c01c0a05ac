use nova_class_index::{
    AnnotationInstance, AnnotationTarget, Index, IndexBuilder, IndexConfig, IndexError, IndexSnapshot, Name,
    RelationshipCounts,
};
use nova_classfile::{Annotation, ClassFile, ClassMember, ConstValue, ElementValue, ModuleDescriptor};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;

use super::support::{class, init_tracing, interface};

const PROPTEST_CASES: u32 = 64;

enum Step {
    Unit(ClassFile),
    Module(ModuleDescriptor),
    Annotation(AnnotationInstance),
}

fn steps() -> Vec<Step> {
    let tag = |value: i32| {
        Annotation::new("Lapp/Tag;").with_element("value", ElementValue::Const(ConstValue::Int(value)))
    };
    let mut module = ModuleDescriptor::new("app.core");
    module.annotations.push(tag(0));

    vec![
        Step::Unit(interface("app/Service").with_annotation(tag(1))),
        Step::Unit(interface("app/Named").implements("app/Service")),
        Step::Unit(interface("app/Tagged").implements("app/Named").implements("ext/Marker")),
        Step::Unit(
            class("app/Base")
                .implements("app/Named")
                .with_field(ClassMember::new("id", "J").with_annotation(tag(2)))
                .references("app/Util"),
        ),
        Step::Unit(
            class("app/Impl")
                .extends("app/Base")
                .implements("app/Tagged")
                .with_method(ClassMember::new("run", "(I)V").with_parameter_annotation(0, tag(1)))
                .references("app/Util")
                .references("ext/Helper"),
        ),
        Step::Unit(class("app/Util").references("ext/Helper")),
        Step::Unit(class("app/Leaf").extends("app/Impl").with_annotation(tag(3))),
        Step::Module(module),
        Step::Annotation(AnnotationInstance::new(
            Name::from("app.Tag"),
            Some(AnnotationTarget::Class(Name::from("ext.Foreign"))),
            Vec::new(),
        )),
    ]
}

fn build(order: &[usize]) -> Index {
    let steps = steps();
    let mut builder = IndexBuilder::new();
    for &i in order {
        match &steps[i] {
            Step::Unit(record) => {
                builder.add_unit(record).unwrap();
            }
            Step::Module(record) => {
                builder.add_module(record).unwrap();
            }
            Step::Annotation(instance) => {
                builder.add_annotation(instance.clone());
            }
        }
    }
    builder.finish()
}

fn canonical() -> Vec<usize> {
    (0..steps().len()).collect()
}

#[test]
fn snapshot_lists_and_counts() {
    init_tracing();
    let snapshot = build(&canonical()).snapshot();

    let classes: Vec<String> = snapshot.classes.iter().map(|c| c.name().to_dotted()).collect();
    assert_eq!(
        classes,
        vec!["app.Base", "app.Impl", "app.Leaf", "app.Named", "app.Service", "app.Tagged", "app.Util"]
    );
    assert_eq!(snapshot.modules.len(), 1);
    assert_eq!(
        snapshot.users,
        vec![
            (Name::from("app.Util"), vec![Name::from("app.Base"), Name::from("app.Impl")]),
            (Name::from("ext.Helper"), vec![Name::from("app.Impl"), Name::from("app.Util")]),
        ]
    );
    assert_eq!(
        snapshot.counts,
        RelationshipCounts {
            // app.Tag
            annotations: 1,
            // java.lang.Object, app.Base, app.Impl
            subclasses: 3,
            // app.Service, app.Named, ext.Marker
            subinterfaces: 3,
            // app.Named, app.Service, app.Tagged, ext.Marker
            implementors: 4,
        }
    );
}

#[test]
fn snapshot_of_empty_index() {
    let snapshot = IndexBuilder::new().finish().snapshot();
    assert!(snapshot.classes.is_empty() && snapshot.modules.is_empty() && snapshot.users.is_empty());
    assert_eq!(snapshot.counts, RelationshipCounts::default());
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: PROPTEST_CASES,
        ..ProptestConfig::default()
    })]

    #[test]
    fn snapshot_is_independent_of_insertion_order(order in Just(canonical()).prop_shuffle()) {
        let expected = build(&canonical()).snapshot();
        let actual = build(&order).snapshot();
        prop_assert_eq!(&actual, &expected);
        prop_assert_eq!(actual.to_json_pretty().unwrap(), expected.to_json_pretty().unwrap());
    }
}

#[test]
fn persisted_snapshot_round_trips() {
    let snapshot = build(&canonical()).snapshot();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("classes.ncix");

    snapshot.save(&path).unwrap();
    let loaded = IndexSnapshot::load(&path).unwrap();
    assert_eq!(loaded, snapshot);

    // Overwriting an existing snapshot goes through the same temp-file path.
    IndexBuilder::new().finish().snapshot().save(&path).unwrap();
    assert!(IndexSnapshot::load(&path).unwrap().classes.is_empty());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn truncated_or_foreign_files_are_rejected() {
    let dir = tempfile::tempdir().unwrap();

    let foreign = dir.path().join("foreign.bin");
    std::fs::write(&foreign, b"PK\x03\x04 not a snapshot").unwrap();
    assert!(matches!(IndexSnapshot::load(&foreign), Err(IndexError::BadMagic)));

    let mut bytes = Vec::new();
    build(&canonical()).snapshot().write_to(&mut bytes).unwrap();
    let truncated = dir.path().join("truncated.ncix");
    std::fs::write(&truncated, &bytes[..bytes.len() / 2]).unwrap();
    assert!(IndexSnapshot::load(&truncated).is_err());

    assert!(matches!(
        IndexSnapshot::load(&dir.path().join("missing.ncix")),
        Err(IndexError::Io(_))
    ));
}

#[test]
fn index_rebuilt_from_snapshot_answers_the_same_queries() {
    let original = build(&canonical());
    let snapshot = original.snapshot();
    let mut bytes = Vec::new();
    snapshot.write_to(&mut bytes).unwrap();
    let decoded = IndexSnapshot::read_from(bytes.as_slice()).unwrap();

    let rebuilt = Index::from_snapshot(&decoded, IndexConfig::default());
    assert_eq!(rebuilt.snapshot(), snapshot);

    for query in ["app.Service", "app.Named", "ext.Marker"] {
        let mut expected: Vec<_> = original.implementors(query).cloned().collect();
        let mut actual: Vec<_> = rebuilt.implementors(query).cloned().collect();
        expected.sort();
        actual.sort();
        assert_eq!(actual, expected, "{query}");
    }
    assert_eq!(rebuilt.unit("app/Impl").unwrap().methods().len(), 1);
    assert_eq!(rebuilt.module("app.core").unwrap().annotations().len(), 1);
}

#[test]
fn json_rendering_uses_dotted_names() {
    let json = build(&canonical()).snapshot().to_json_pretty().unwrap();
    assert!(json.contains("\"app.Impl\""));
    assert!(!json.contains("app/Impl"));
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["counts"]["implementors"], 4);
}

#[test]
fn replayed_units_share_the_rebuilt_name_table() {
    let mut bytes = Vec::new();
    build(&canonical()).snapshot().write_to(&mut bytes).unwrap();
    let decoded = IndexSnapshot::read_from(bytes.as_slice()).unwrap();
    let rebuilt = Index::from_snapshot(&decoded, IndexConfig::default());

    let object = rebuilt.names().get("java.lang.Object").unwrap();
    let base = rebuilt.unit("app.Base").unwrap();
    let util = rebuilt.unit("app.Util").unwrap();
    assert!(base.super_name().unwrap().ptr_eq(&object));
    assert!(util.super_name().unwrap().ptr_eq(&object));
    assert!(base.name().prefix().unwrap().ptr_eq(util.name().prefix().unwrap()));

    let subclass = rebuilt.direct_subclasses("app.Base").next().unwrap();
    assert!(subclass.ptr_eq(rebuilt.unit("app.Impl").unwrap().name()));

    let tag = rebuilt.names().get("app.Tag").unwrap();
    for site in rebuilt.annotations("app.Tag") {
        assert!(site.name().ptr_eq(&tag));
    }
    let module = rebuilt.module("app.core").unwrap();
    assert!(module.annotations()[0].name().ptr_eq(&tag));
}

fn two_method_snapshot() -> serde_json::Value {
    let mut builder = IndexBuilder::new();
    builder
        .add_unit(
            &class("p/A")
                .with_method(ClassMember::new("b", "()V"))
                .with_method(ClassMember::new("a", "()V")),
        )
        .unwrap();
    serde_json::from_str(&builder.finish().snapshot().to_json_pretty().unwrap()).unwrap()
}

#[test]
fn loaded_member_tables_are_validated() {
    let value = two_method_snapshot();
    assert_eq!(
        value["classes"][0]["methods"]["order"]["Sorted"]["declaration"],
        json!([1, 0])
    );
    let loaded: IndexSnapshot = serde_json::from_value(value.clone()).unwrap();
    let index = Index::from_snapshot(&loaded, IndexConfig::default());
    let declared: Vec<_> = index.unit("p.A").unwrap().unsorted_methods().iter().map(|m| m.name()).collect();
    assert_eq!(declared, vec!["b", "a"]);

    for declaration in [json!([0, 0]), json!([1]), json!([2, 0]), json!([1, 0, 2])] {
        let mut edited = value.clone();
        edited["classes"][0]["methods"]["order"]["Sorted"]["declaration"] = declaration.clone();
        assert!(
            serde_json::from_value::<IndexSnapshot>(edited).is_err(),
            "accepted declaration table {declaration}"
        );
    }

    let mut unsorted = value.clone();
    if let Some(records) = unsorted["classes"][0]["methods"]["records"].as_array_mut() {
        records.reverse();
    }
    assert!(serde_json::from_value::<IndexSnapshot>(unsorted).is_err());

    let mut undeclared = value;
    undeclared["classes"][0]["methods"]["order"] = json!("Declared");
    assert!(serde_json::from_value::<IndexSnapshot>(undeclared).is_err());
}
