use nova_class_index::{AnnotationInstance, AnnotationTarget, Index, IndexBuilder, IndexConfig, IndexError, MergePolicy, Name};
use nova_classfile::{Annotation, ClassFile};

use super::support::{class, init_tracing, interface, sorted};

fn left() -> IndexBuilder {
    let mut builder = IndexBuilder::new();
    builder.add_unit(&interface("p/I")).unwrap();
    builder.add_unit(&class("p/Shared")).unwrap();
    builder
        .add_unit(&class("p/Clash").implements("p/I").with_annotation(Annotation::new("Lp/Left;")))
        .unwrap();
    builder
}

fn right() -> Index {
    let mut builder = IndexBuilder::new();
    builder.add_unit(&class("p/Shared")).unwrap();
    builder
        .add_unit(&class("p/Clash").extends("p/Base").with_annotation(Annotation::new("Lp/Right;")))
        .unwrap();
    builder.add_unit(&class("p/Extra").implements("p/I")).unwrap();
    builder.finish()
}

#[test]
fn reject_fails_before_mutating() {
    init_tracing();
    let mut builder = left();
    let before = builder.clone().finish().snapshot();

    let err = builder.merge(&right(), MergePolicy::Reject).unwrap_err();
    match err {
        IndexError::MergeConflict { names } => assert_eq!(names, vec![Name::from("p.Clash")]),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(builder.finish().snapshot(), before);
}

#[test]
fn identical_units_do_not_conflict() {
    let mut builder = left();
    let mut other = IndexBuilder::new();
    other.add_unit(&class("p/Shared")).unwrap();
    other.add_unit(&class("p/New")).unwrap();

    let outcome = builder.merge(&other.finish(), MergePolicy::Reject).unwrap();
    assert_eq!(outcome.added, 1);
    assert_eq!(outcome.identical, 1);
    assert!(outcome.replaced.is_empty() && outcome.kept_existing.is_empty());
}

#[test]
fn keep_existing_ignores_incoming_versions() {
    let mut builder = left();
    let outcome = builder.merge(&right(), MergePolicy::KeepExisting).unwrap();
    assert_eq!(outcome.kept_existing, vec![Name::from("p.Clash")]);
    assert_eq!(outcome.added, 1);

    let index = builder.finish();
    assert_eq!(sorted(index.implementors("p.I")), vec!["p.Clash", "p.Extra"]);
    assert_eq!(index.annotations("p.Left").len(), 1);
    assert_eq!(index.annotations("p.Right").len(), 0);
    assert_eq!(index.direct_subclasses("p.Base").len(), 0);
}

#[test]
fn replace_takes_incoming_versions() {
    let mut builder = left();
    let outcome = builder.merge(&right(), MergePolicy::Replace).unwrap();
    assert_eq!(outcome.replaced, vec![Name::from("p.Clash")]);

    let index = builder.finish();
    assert_eq!(sorted(index.implementors("p.I")), vec!["p.Extra"]);
    assert_eq!(index.annotations("p.Left").len(), 0);
    assert_eq!(index.annotations("p.Right").len(), 1);
    assert_eq!(sorted(index.direct_subclasses("p.Base")), vec!["p.Clash"]);
}

#[test]
fn merge_from_uses_configured_policy() {
    let mut builder = left();
    assert!(matches!(
        builder.merge_from(&right()),
        Err(IndexError::MergeConflict { .. })
    ));

    let mut replacing = IndexBuilder::with_config(IndexConfig {
        merge_policy: MergePolicy::Replace,
        ..IndexConfig::default()
    });
    replacing.merge(&left().finish(), MergePolicy::Reject).unwrap();
    let outcome = replacing.merge_from(&right()).unwrap();
    assert_eq!(outcome.replaced, vec![Name::from("p.Clash")]);
}

#[test]
fn merge_order_does_not_matter() {
    let parts: Vec<Index> = (0..4)
        .map(|i| {
            let mut builder = IndexBuilder::new();
            builder.add_unit(&interface(&format!("p/I{i}"))).unwrap();
            let mut record: ClassFile = class(&format!("p/C{i}")).implements(format!("p/I{i}"));
            if i > 0 {
                record = record.implements(format!("p/I{}", i - 1));
            }
            builder.add_unit(&record).unwrap();
            builder.finish()
        })
        .collect();

    let mut forward = IndexBuilder::new();
    for part in &parts {
        forward.merge(part, MergePolicy::Reject).unwrap();
    }
    let mut backward = IndexBuilder::new();
    for part in parts.iter().rev() {
        backward.merge(part, MergePolicy::Reject).unwrap();
    }
    assert_eq!(forward.finish().snapshot(), backward.finish().snapshot());
}

#[test]
fn standalone_annotations_are_carried_over() {
    let mut other = IndexBuilder::new();
    other.add_annotation(AnnotationInstance::new(
        Name::from("p.Loose"),
        None,
        Vec::new(),
    ));
    let mut builder = IndexBuilder::new();
    let outcome = builder.merge(&other.finish(), MergePolicy::Reject).unwrap();
    assert_eq!(outcome.annotations_added, 1);
    assert_eq!(builder.finish().annotations("p.Loose").len(), 1);
}

#[test]
fn keep_existing_still_merges_standalone_sites_on_kept_units() {
    let mut other = IndexBuilder::new();
    other
        .add_unit(&class("p/Clash").extends("p/Base").with_annotation(Annotation::new("Lp/Right;")))
        .unwrap();
    let standalone = AnnotationInstance::new(
        Name::from("p.Audit"),
        Some(AnnotationTarget::Class(Name::from("p.Clash"))),
        Vec::new(),
    );
    assert!(other.add_annotation(standalone.clone()));

    let mut builder = left();
    let outcome = builder.merge(&other.finish(), MergePolicy::KeepExisting).unwrap();
    assert_eq!(outcome.kept_existing, vec![Name::from("p.Clash")]);
    assert_eq!(outcome.annotations_added, 1);

    let index = builder.finish();
    assert_eq!(index.annotations("p.Right").len(), 0);
    let audit: Vec<_> = index.annotations("p.Audit").collect();
    assert_eq!(audit, vec![&standalone]);
}

#[test]
fn merged_units_share_the_receiving_name_table() {
    let mut builder = left();
    builder.merge(&right(), MergePolicy::Reject).unwrap_err();
    builder.merge(&right(), MergePolicy::Replace).unwrap();

    let index = builder.finish();
    let extra = index.unit("p.Extra").unwrap();
    let interface = index.unit("p.I").unwrap();
    assert!(extra.interface_names()[0].ptr_eq(interface.name()));
    assert!(extra.name().ptr_eq(&index.names().get("p.Extra").unwrap()));
    let site = index.annotations("p.Right").next().unwrap();
    assert!(site.target().unwrap().owner().ptr_eq(index.unit("p.Clash").unwrap().name()));
}
