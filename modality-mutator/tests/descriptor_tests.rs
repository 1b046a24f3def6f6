use modality_mutator::{
    describe_mutator, get_param, BoundParams, DescriptorError, MutatorDescriptor,
    MutatorLayer, MutatorMetadata, MutatorOperation, MutatorParamDescriptor,
    MutatorStatefulness, OrganizationCustomMetadata, ParamBinding, ParamDecl, ParamHolder,
    ValueDistributionKind, ValueDistributionScaling,
};
use modality_types::{AttrType, AttrValue};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

struct MyMutatorParams;

impl ParamHolder for MyMutatorParams {
    fn declared_params() -> Vec<ParamDecl> {
        vec![
            MutatorParamDescriptor::builder("p", AttrType::Float)
                .description("My special parameter")
                .default_value(7.0)
                .value_min(2.0)
                .value_max(99.0)
                .into(),
            ParamDecl::Other("value".into()),
        ]
    }
}

fn my_mutator_metadata() -> MutatorMetadata {
    MutatorMetadata::named("MyMutator")
        .with_description("My special mutator")
        .with_operation(MutatorOperation::Corrupt)
        .with_organization_custom_metadata(
            OrganizationCustomMetadata::new(
                "mycorp",
                [("my_key".to_owned(), AttrValue::from("my_val"))],
            )
            .unwrap(),
        )
}

fn attr(key: &str, value: impl Into<AttrValue>) -> (String, AttrValue) {
    (key.to_owned(), value.into())
}

// ── Parameter reads ──────────────────────────────────────────────

#[test]
fn unbound_param_reads_default() {
    let d = describe_mutator::<MyMutatorParams>(my_mutator_metadata()).unwrap();
    let params = BoundParams::unbound(d.params());
    assert_eq!(params.get_f64("p"), Some(7.0));
    assert!(!params.is_bound());
}

#[test]
fn bound_param_reads_override() {
    let d = describe_mutator::<MyMutatorParams>(my_mutator_metadata()).unwrap();
    let binding = ParamBinding::new().with("p", 42.0);
    let params = BoundParams::new(d.params(), Some(&binding));
    assert_eq!(params.get_f64("p"), Some(42.0));
}

#[test]
fn empty_binding_falls_back_to_default() {
    let d = describe_mutator::<MyMutatorParams>(my_mutator_metadata()).unwrap();
    let binding = ParamBinding::new();
    assert_eq!(
        get_param(&d.params()[0], Some(&binding)),
        Some(AttrValue::from(7.0))
    );
}

#[test]
fn param_without_default_or_override_is_absent() {
    let p = MutatorParamDescriptor::builder("q", AttrType::String)
        .build()
        .unwrap();
    assert_eq!(get_param(&p, None), None);
    assert_eq!(get_param(&p, Some(&ParamBinding::new().with("other", "x"))), None);
}

#[test]
fn undeclared_names_are_not_visible() {
    let d = describe_mutator::<MyMutatorParams>(my_mutator_metadata()).unwrap();
    let binding = ParamBinding::new().with("value", "sneaky");
    let params = BoundParams::new(d.params(), Some(&binding));
    assert_eq!(params.get("value"), None);
}

#[test]
fn typed_getters() {
    let decls: Vec<ParamDecl> = vec![
        MutatorParamDescriptor::builder("n", AttrType::Integer).into(),
        MutatorParamDescriptor::builder("on", AttrType::Bool).into(),
        MutatorParamDescriptor::builder("label", AttrType::String).into(),
    ];
    let d = MutatorDescriptor::new(MutatorMetadata::default(), decls).unwrap();
    let binding: ParamBinding = [
        ("n", AttrValue::from(3_i64)),
        ("on", AttrValue::from(true)),
        ("label", AttrValue::from("left")),
    ]
    .into_iter()
    .collect();
    let params = BoundParams::new(d.params(), Some(&binding));

    assert_eq!(params.get_i64("n"), Some(3));
    assert_eq!(params.get_f64("n"), Some(3.0));
    assert_eq!(params.get_bool("on"), Some(true));
    assert_eq!(params.get_str("label"), Some("left"));
    assert_eq!(params.get_str("n"), None);
}

// ── Declaration errors ───────────────────────────────────────────

#[test]
fn min_above_max_is_rejected() {
    let err = MutatorParamDescriptor::builder("p", AttrType::Float)
        .value_min(10.0)
        .value_max(1.0)
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        DescriptorError::InvalidBounds {
            name: "p".into(),
            min: AttrValue::from(10.0),
            max: AttrValue::from(1.0),
        }
    );
}

#[test]
fn integer_bounds_compare_exactly() {
    let err = MutatorParamDescriptor::builder("n", AttrType::Integer)
        .value_min(9_007_199_254_740_993_i64)
        .value_max(9_007_199_254_740_992_i64)
        .build()
        .unwrap_err();
    assert!(matches!(err, DescriptorError::InvalidBounds { .. }));

    assert!(MutatorParamDescriptor::builder("n", AttrType::Integer)
        .value_min(9_007_199_254_740_992_i64)
        .value_max(9_007_199_254_740_993_i64)
        .build()
        .is_ok());
}

#[test]
fn equal_or_non_numeric_bounds_are_accepted() {
    assert!(MutatorParamDescriptor::builder("p", AttrType::Integer)
        .value_min(5_i64)
        .value_max(5_i64)
        .build()
        .is_ok());
    assert!(MutatorParamDescriptor::builder("s", AttrType::String)
        .value_min("z")
        .value_max("a")
        .build()
        .is_ok());
}

#[test]
fn bad_param_names() {
    for name in ["", "a.b", "café"] {
        assert_eq!(
            MutatorParamDescriptor::builder(name, AttrType::Bool).build(),
            Err(DescriptorError::InvalidParamName(name.into())),
            "{name:?}"
        );
    }
}

#[test]
fn unsupported_value_type() {
    assert!(matches!(
        MutatorParamDescriptor::builder("t", AttrType::Timestamp).build(),
        Err(DescriptorError::UnsupportedValueType { .. })
    ));
}

#[test]
fn default_must_fit_declared_type() {
    assert_eq!(
        MutatorParamDescriptor::builder("p", AttrType::Integer)
            .default_value(1.5)
            .build(),
        Err(DescriptorError::DefaultTypeMismatch {
            name: "p".into(),
            expected: AttrType::Integer,
            actual: AttrType::Float,
        })
    );
    assert!(MutatorParamDescriptor::builder("p", AttrType::Float)
        .default_value(2_i64)
        .build()
        .is_ok());
}

#[test]
fn duplicate_params_are_rejected() {
    let decls = vec![
        ParamDecl::from(MutatorParamDescriptor::builder("p", AttrType::Bool)),
        ParamDecl::from(MutatorParamDescriptor::builder("p", AttrType::Integer)),
    ];
    assert_eq!(
        MutatorDescriptor::new(MutatorMetadata::default(), decls),
        Err(DescriptorError::DuplicateParam("p".into()))
    );
}

#[test]
fn organization_segment_is_validated() {
    assert_eq!(
        OrganizationCustomMetadata::new("my.corp", Vec::<(String, AttrValue)>::new()),
        Err(DescriptorError::InvalidOrganizationSegment("my.corp".into()))
    );
}

// ── Description attributes ───────────────────────────────────────

#[test]
fn describes_my_mutator() {
    let d = describe_mutator::<MyMutatorParams>(my_mutator_metadata()).unwrap();
    assert_eq!(
        d.description_attributes(),
        vec![
            attr("mutator.name", "MyMutator"),
            attr("mutator.description", "My special mutator"),
            attr("mutator.operation", "corrupt"),
            attr("mutator.mycorp.my_key", "my_val"),
            attr("mutator.params.p.name", "p"),
            attr("mutator.params.p.value_type", "Float"),
            attr("mutator.params.p.description", "My special parameter"),
            attr("mutator.params.p.value_min", 2.0),
            attr("mutator.params.p.value_max", 99.0),
            attr("mutator.params.p.default_value", 7.0),
        ]
    );
}

#[test]
fn describes_every_optional_field() {
    struct Full;
    impl ParamHolder for Full {
        fn declared_params() -> Vec<ParamDecl> {
            let org = OrganizationCustomMetadata::new(
                "acme",
                [("unit".to_owned(), AttrValue::from("ms"))],
            )
            .unwrap();
            vec![MutatorParamDescriptor::builder("delay", AttrType::Integer)
                .least_effect_value(0_i64)
                .value_distribution_kind(ValueDistributionKind::Discrete)
                .value_distribution_scaling(ValueDistributionScaling::Linear)
                .value_distribution_option("short", 10_i64)
                .value_distribution_option("long", 1000_i64)
                .organization_custom_metadata(org)
                .into()]
        }
    }

    let metadata = MutatorMetadata::named("Delay")
        .with_layer(MutatorLayer::Operational)
        .with_group("network")
        .with_statefulness(MutatorStatefulness::Intermittent);
    let d = describe_mutator::<Full>(metadata).unwrap();

    assert_eq!(
        d.description_attributes(),
        vec![
            attr("mutator.name", "Delay"),
            attr("mutator.layer", "operational"),
            attr("mutator.group", "network"),
            attr("mutator.statefulness", "intermittent"),
            attr("mutator.params.delay.name", "delay"),
            attr("mutator.params.delay.value_type", "Integer"),
            attr("mutator.params.delay.least_effect_value", 0_i64),
            attr("mutator.params.delay.value_distribution.kind", "discrete"),
            attr("mutator.params.delay.value_distribution.scaling", "linear"),
            attr("mutator.params.delay.value_distribution.option_set.long", 1000_i64),
            attr("mutator.params.delay.value_distribution.option_set.short", 10_i64),
            attr("mutator.params.delay.acme.unit", "ms"),
        ]
    );
}

#[test]
fn holder_without_params() {
    let d = describe_mutator::<()>(MutatorMetadata::default()).unwrap();
    assert!(d.params().is_empty());
    assert!(d.description_attributes().is_empty());
}

// ── Properties ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn bounds_validation_matches_ordering(min in -1e6_f64..1e6, max in -1e6_f64..1e6) {
        let result = MutatorParamDescriptor::builder("p", AttrType::Float)
            .value_min(min)
            .value_max(max)
            .build();
        prop_assert_eq!(result.is_ok(), min <= max);
    }

    #[test]
    fn override_wins_over_default(default in any::<i64>(), bound in proptest::option::of(any::<i64>())) {
        let p = MutatorParamDescriptor::builder("n", AttrType::Integer)
            .default_value(default)
            .build()
            .unwrap();
        let binding = bound.map(|v| ParamBinding::new().with("n", v));
        prop_assert_eq!(
            get_param(&p, binding.as_ref()).and_then(|v| v.as_i64()),
            Some(bound.unwrap_or(default))
        );
    }
}
