use nova_classfile::{
    parse_field_descriptor, parse_method_descriptor, Annotation, BaseType, ClassFile, ClassMember,
    Error, FieldType, ReturnType, ACC_ABSTRACT, ACC_INTERFACE, MAX_ARRAY_DIMENSIONS,
};

#[test]
fn every_base_type_round_trips_through_its_tag() {
    for tag in ['B', 'C', 'D', 'F', 'I', 'J', 'S', 'Z'] {
        let FieldType::Base(base) = parse_field_descriptor(&tag.to_string()).unwrap() else {
            panic!("{tag} is a base type");
        };
        assert_eq!(base.tag(), tag);
    }
    assert!(parse_field_descriptor("V").is_err());
}

#[test]
fn method_descriptor_with_arrays_and_objects() {
    let desc = parse_method_descriptor("([[IJLjava/util/List;)Ljava/lang/Object;").unwrap();
    assert_eq!(
        desc.params,
        vec![
            FieldType::Array {
                dimensions: 2,
                element: Box::new(FieldType::Base(BaseType::Int)),
            },
            FieldType::Base(BaseType::Long),
            FieldType::Object("java/util/List"),
        ]
    );
    assert_eq!(
        desc.return_type,
        ReturnType::Type(FieldType::Object("java/lang/Object"))
    );
    assert_eq!(parse_method_descriptor("()V").unwrap().return_type, ReturnType::Void);
}

#[test]
fn malformed_descriptors_are_rejected() {
    for bad in [
        "",
        "L;",
        "Ljava/lang/String",
        "Ljava.lang.String;",
        "II",
        "[",
        "Q",
        "(I",
        "(I)",
        "()VV",
        "I)V",
    ] {
        let field = parse_field_descriptor(bad);
        let method = parse_method_descriptor(bad);
        assert!(field.is_err() && method.is_err(), "{bad:?} should be rejected");
    }
    assert!(matches!(
        parse_field_descriptor("Lfoo"),
        Err(Error::InvalidDescriptor(desc)) if desc == "Lfoo"
    ));
}

#[test]
fn array_dimension_limit() {
    let max = format!("{}I", "[".repeat(MAX_ARRAY_DIMENSIONS));
    assert!(matches!(
        parse_field_descriptor(&max).unwrap(),
        FieldType::Array { dimensions: 255, .. }
    ));
    let over = format!("{}I", "[".repeat(MAX_ARRAY_DIMENSIONS + 1));
    assert!(parse_field_descriptor(&over).is_err());
}

#[test]
fn record_builders() {
    let record = ClassFile::interface("com/example/Service")
        .implements("java/lang/AutoCloseable")
        .with_annotation(Annotation::new("Lcom/example/Marker;"))
        .with_method(ClassMember::new("close", "()V").with_flags(ACC_ABSTRACT));

    assert!(record.is_interface());
    assert_eq!(record.access_flags & ACC_INTERFACE, ACC_INTERFACE);
    assert_eq!(record.super_class.as_deref(), Some("java/lang/Object"));
    assert_eq!(record.interfaces, vec!["java/lang/AutoCloseable".to_string()]);
    assert_eq!(record.annotations[0].type_internal_name(), Some("com/example/Marker"));
}
