use super::{environment_for, expression};
use crate::component::*;
use pretty_assertions::assert_eq;
use valinfer_host::types::PrimitiveType;
use valinfer_host::*;

fn class(env: &TypeEnvironment, name: &str) -> TypeId {
    env.lookup(name)
        .unwrap_or_else(|| panic!("{name} is not declared"))
}

fn parameterized(ty: TypeId, arguments: Vec<TypeBinding>) -> TypeBinding {
    TypeBinding::Parameterized { ty, arguments }
}

#[test]
fn test_arrays_yield_their_element_type() {
    let env = TypeEnvironment::bootstrap();
    let int = TypeBinding::Primitive(PrimitiveType::Int);

    assert_eq!(
        component_of(&TypeBinding::array_of(env.string_type()), &env),
        Some(env.string_type())
    );
    assert_eq!(
        component_of(&TypeBinding::array_of(TypeBinding::array_of(int.clone())), &env),
        Some(TypeBinding::array_of(int))
    );
}

#[test]
fn test_parameterized_iterables_yield_their_argument() {
    let env = TypeEnvironment::bootstrap();
    let list = parameterized(class(&env, "java.util.ArrayList"), vec![env.string_type()]);
    let iterable = parameterized(env.iterable_id(), vec![env.object_type()]);

    assert_eq!(component_of(&list, &env), Some(env.string_type()));
    assert_eq!(component_of(&iterable, &env), Some(env.object_type()));
}

#[test]
fn test_generic_iterable_yields_its_own_type_variable() {
    let env = TypeEnvironment::bootstrap();
    let iterable = env.iterable_id();

    assert_eq!(
        component_of(&TypeBinding::Generic(iterable), &env),
        Some(TypeBinding::TypeVariable {
            declaring: iterable,
            index: 0,
        })
    );
}

#[test]
fn test_generic_subclass_yields_its_type_variable() {
    let (env, _) = environment_for(
        r#"
        package demo;
        class Bag<T> implements Iterable<T> { }
        "#,
    );
    let bag = class(&env, "demo.Bag");

    assert_eq!(
        component_of(&env.declared_type(bag), &env),
        Some(TypeBinding::TypeVariable {
            declaring: bag,
            index: 0,
        })
    );
}

#[test]
fn test_raw_and_non_iterable_types_have_no_component() {
    let env = TypeEnvironment::bootstrap();
    let map = parameterized(
        class(&env, "java.util.HashMap"),
        vec![env.string_type(), env.string_type()],
    );

    assert_eq!(
        component_of(&TypeBinding::Class(class(&env, "java.util.ArrayList")), &env),
        None
    );
    assert_eq!(component_of(&TypeBinding::Class(env.iterable_id()), &env), None);
    assert_eq!(component_of(&env.string_type(), &env), None);
    assert_eq!(component_of(&map, &env), None);
    assert_eq!(component_of(&TypeBinding::Null, &env), None);
    assert_eq!(
        component_of(&TypeBinding::Primitive(PrimitiveType::Int), &env),
        None
    );
}

#[test]
fn test_first_declared_path_wins() {
    let (env, _) = environment_for(
        r#"
        package demo;
        interface Strings extends Iterable<String> { }
        interface Integers extends Iterable<Integer> { }
        abstract class Both implements Strings, Integers { }
        "#,
    );

    assert_eq!(
        component_of(&TypeBinding::Class(class(&env, "demo.Both")), &env),
        Some(env.string_type())
    );
}

#[test]
fn test_collection_expression_is_resolved_once() {
    let (env, context) = environment_for("package demo; class A { }");
    let mut scope = BlockScope::new(&env, context, None);
    scope.declare_local(
        "names",
        parameterized(class(&env, "java.util.List"), vec![env.string_type()]),
    );
    let resolver = Resolver::new(&env, &NoHooks);
    let collection = expression("names");

    assert_eq!(
        component_type(&collection, &scope, &resolver),
        Some(env.string_type())
    );
    assert_eq!(
        component_type(&collection, &scope, &resolver),
        Some(env.string_type())
    );
    assert_eq!(resolver.invocation_count(collection.id), 1);
}

#[test]
fn test_unresolvable_collection_has_no_component() {
    let env = TypeEnvironment::bootstrap();
    let scope = BlockScope::new(&env, TypeContext::default(), None);
    let resolver = Resolver::new(&env, &NoHooks);

    assert_eq!(component_type(&expression("missing"), &scope, &resolver), None);
}
