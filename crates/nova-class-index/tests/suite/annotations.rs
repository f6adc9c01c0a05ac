use std::collections::HashSet;

use nova_class_index::{AnnotationTarget, Equivalence, IndexBuilder, Name, Value};
use nova_classfile::{Annotation, ClassMember, ConstValue, ElementValue};

use super::support::{class, init_tracing};

fn route(path: &str) -> Annotation {
    Annotation::new("Lweb/Route;").with_element("path", ElementValue::Const(ConstValue::String(path.to_string())))
}

fn routes(paths: &[&str]) -> Annotation {
    Annotation::new("Lweb/Routes;").with_element(
        "value",
        ElementValue::Array(
            paths
                .iter()
                .map(|p| ElementValue::Annotation(Box::new(route(p))))
                .collect(),
        ),
    )
}

#[test]
fn usage_sites_cover_every_target_kind() {
    init_tracing();
    let mut builder = IndexBuilder::new();
    builder
        .add_unit(
            &class("app/Controller")
                .with_annotation(route("/"))
                .with_field(ClassMember::new("prefix", "Ljava/lang/String;").with_annotation(route("/f")))
                .with_method(
                    ClassMember::new("get", "(Ljava/lang/String;)V")
                        .with_annotation(route("/m"))
                        .with_parameter_annotation(0, route("/p")),
                ),
        )
        .unwrap();
    let index = builder.finish();

    let mut kinds: Vec<&str> = index
        .annotations("web.Route")
        .map(|a| match a.target() {
            Some(AnnotationTarget::Class(_)) => "class",
            Some(AnnotationTarget::Field { .. }) => "field",
            Some(AnnotationTarget::Method { .. }) => "method",
            Some(AnnotationTarget::MethodParameter { position: 0, .. }) => "parameter",
            other => panic!("unexpected target {other:?}"),
        })
        .collect();
    kinds.sort();
    assert_eq!(kinds, vec!["class", "field", "method", "parameter"]);
    assert!(index
        .annotations("web.Route")
        .all(|a| a.target().map(AnnotationTarget::owner) == Some(&Name::from("app.Controller"))));
}

#[test]
fn repeatable_annotations_are_unpacked_onto_the_container_target() {
    let mut builder = IndexBuilder::new();
    builder
        .add_unit(&class("app/Single").with_annotation(route("/one")))
        .unwrap();
    builder
        .add_unit(&class("app/Many").with_annotation(routes(&["/a", "/b"])))
        .unwrap();
    let index = builder.finish();

    assert_eq!(index.annotations("web.Route").len(), 1);
    let all = index.annotations_with_repeatable("web.Route", "web.Routes");
    assert_eq!(all.len(), 3);

    let many = Name::from("app.Many");
    let unpacked: Vec<_> = all
        .iter()
        .filter(|a| a.target() == Some(&AnnotationTarget::Class(many.clone())))
        .map(|a| a.value("path").cloned())
        .collect();
    assert_eq!(
        unpacked,
        vec![Some(Value::String("/a".to_string())), Some(Value::String("/b".to_string()))]
    );
    assert_eq!(index.annotations_with_repeatable("web.Missing", "web.Routes").len(), 0);
}

#[test]
fn distinct_usages_collapse_equal_values() {
    let mut builder = IndexBuilder::new();
    for (name, path) in [("app/A", "/x"), ("app/B", "/x"), ("app/C", "/y")] {
        builder.add_unit(&class(name).with_annotation(route(path))).unwrap();
    }
    let index = builder.finish();

    let sites: Vec<_> = index.annotations("web.Route").collect();
    assert_eq!(sites.len(), 3);
    assert_eq!(sites.iter().copied().collect::<HashSet<_>>().len(), 3);

    let distinct = index.distinct_annotations("web.Route");
    assert_eq!(distinct.len(), 2);
    let proxies: HashSet<Equivalence<'_>> = sites.iter().copied().map(Equivalence::new).collect();
    assert_eq!(proxies.len(), 2);
    assert!(distinct.iter().all(|proxy| proxy.name() == &Name::from("web.Route")));
}

#[test]
fn nested_and_enum_values_are_interned() {
    let mut builder = IndexBuilder::new();
    builder
        .add_unit(
            &class("app/Entity").with_annotation(
                Annotation::new("Ljpa/Table;")
                    .with_element(
                        "kind",
                        ElementValue::Enum {
                            type_descriptor: "Ljpa/Kind;".to_string(),
                            const_name: "VIEW".to_string(),
                        },
                    )
                    .with_element("type", ElementValue::Class("[Ljava/lang/String;".to_string()))
                    .with_element("route", ElementValue::Annotation(Box::new(route("/e")))),
            ),
        )
        .unwrap();
    let index = builder.finish();

    let table = index.annotations("jpa.Table").next().unwrap();
    match table.value("kind") {
        Some(Value::Enum { type_name, constant }) => {
            assert_eq!(type_name.to_dotted(), "jpa.Kind");
            assert_eq!(constant, "VIEW");
        }
        other => panic!("unexpected value {other:?}"),
    }
    match table.value("type") {
        Some(Value::Class(ty)) => assert_eq!(ty.to_string(), "java.lang.String[]"),
        other => panic!("unexpected value {other:?}"),
    }
    let nested = table.value("route").and_then(Value::as_nested).unwrap();
    assert!(nested.target().is_none());
    assert!(index.names().get("jpa/Kind").is_some());
}
