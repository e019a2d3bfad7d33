#![allow(clippy::unwrap_used, clippy::expect_used)]

use moon_ir::luau::TypeInfo;
use moon_ir::sema::{TypeDeclKind, TypeKind, WellKnownType};
use moon_ir::TypeId;
use pretty_assertions::assert_eq;

use crate::metadata::MetadataRegistry;
use crate::test_support::Fixture;
use crate::types::TypeMapper;

fn render(fx: &Fixture, ty: TypeId) -> String {
    let registry = MetadataRegistry::new();
    let mapper = TypeMapper::new(&fx.sema, &fx.interner, &registry);
    moon_fmt::render_type(&mapper.map(ty), &*fx.interner)
}

fn render_return(fx: &Fixture, ty: TypeId) -> String {
    let registry = MetadataRegistry::new();
    let mapper = TypeMapper::new(&fx.sema, &fx.interner, &registry);
    moon_fmt::render_type(&mapper.map_return(ty), &*fx.interner)
}

#[test]
fn primitives() {
    let fx = Fixture::new();
    assert_eq!(render(&fx, TypeId::BOOL), "boolean");
    assert_eq!(render(&fx, TypeId::INT), "number");
    assert_eq!(render(&fx, TypeId::DECIMAL), "number");
    assert_eq!(render(&fx, TypeId::CHAR), "string");
    assert_eq!(render(&fx, TypeId::STRING), "string");
    assert_eq!(render(&fx, TypeId::OBJECT), "any");
    assert_eq!(render(&fx, TypeId::DYNAMIC), "any");
}

#[test]
fn void_is_unit_in_return_position() {
    let fx = Fixture::new();
    assert_eq!(render_return(&fx, TypeId::VOID), "()");
    assert_eq!(render_return(&fx, TypeId::INT), "number");
}

#[test]
fn nullable_never_doubles() {
    let mut fx = Fixture::new();
    let once = fx.nullable(TypeId::INT);
    assert_eq!(render(&fx, once), "number?");
    let twice = fx.sema.types.intern(TypeKind::Nullable(once));
    assert_eq!(render(&fx, twice), "number?");
}

#[test]
fn arrays_and_lists_are_arrays() {
    let mut fx = Fixture::new();
    let array = fx.array(TypeId::STRING);
    let list = fx.list_of(TypeId::INT);
    assert_eq!(render(&fx, array), "{ string }");
    assert_eq!(render(&fx, list), "{ number }");
    let readonly = fx.library_of("IReadOnlyList", WellKnownType::IReadOnlyList, vec![TypeId::BOOL]);
    assert_eq!(render(&fx, readonly), "{ boolean }");
}

#[test]
fn sets_and_dictionaries_are_mapped() {
    let mut fx = Fixture::new();
    let set = fx.library_of("HashSet", WellKnownType::HashSet, vec![TypeId::STRING]);
    let dict = fx.dictionary_of(TypeId::STRING, TypeId::INT);
    assert_eq!(render(&fx, set), "{ [string]: boolean }");
    assert_eq!(render(&fx, dict), "{ [string]: number }");
}

#[test]
fn delegates_are_functions() {
    let mut fx = Fixture::new();
    let action = fx.library_of("Action", WellKnownType::Action, vec![TypeId::INT]);
    let func = fx.library_of("Func", WellKnownType::Func, vec![TypeId::INT, TypeId::STRING]);
    assert_eq!(render(&fx, action), "(number) -> ()");
    assert_eq!(render(&fx, func), "(number) -> string");
}

#[test]
fn task_maps_to_its_result() {
    let mut fx = Fixture::new();
    let task = fx.library_of("Task", WellKnownType::Task, vec![TypeId::STRING]);
    assert_eq!(render(&fx, task), "string");
}

#[test]
fn tuples_map_each_element() {
    let mut fx = Fixture::new();
    let tuple = fx.tuple(&[TypeId::INT, TypeId::STRING]);
    assert_eq!(render(&fx, tuple), "(number, string)");
}

#[test]
fn user_types_use_mangled_names() {
    let mut fx = Fixture::new();
    let (outer, outer_ty) = fx.declare("Outer", TypeDeclKind::Class);
    let (_, inner_ty) = fx.declare_nested("Inner", TypeDeclKind::Class, outer);
    assert_eq!(render(&fx, outer_ty), "Outer");
    assert_eq!(render(&fx, inner_ty), "Outer_Inner");
}

#[test]
fn generic_user_types_echo_arguments() {
    let mut fx = Fixture::new();
    let (boxed, _) = fx.declare("Box", TypeDeclKind::Class);
    let t = fx.type_param("T");
    let constructed = fx.sema.constructed(boxed, vec![TypeId::INT]);
    let open = fx.sema.constructed(boxed, vec![t]);
    assert_eq!(render(&fx, constructed), "Box<number>");
    assert_eq!(render(&fx, open), "Box<T>");
}

#[test]
fn enums_index_their_table() {
    let mut fx = Fixture::new();
    let (_, color) = fx.declare("Color", TypeDeclKind::Enum);
    assert_eq!(render(&fx, color), "index<typeof(Color), keyof<typeof(Color)>>");
}

#[test]
fn params_tail_keeps_nullable_element() {
    let mut fx = Fixture::new();
    let elem = fx.nullable(TypeId::STRING);
    let params = fx.array(elem);
    let registry = MetadataRegistry::new();
    let mapper = TypeMapper::new(&fx.sema, &fx.interner, &registry);
    let mapped = mapper.map_params(params);
    assert!(matches!(&mapped, TypeInfo::Variadic(inner) if inner.is_optional()));
    assert_eq!(moon_fmt::render_type(&mapped, &*fx.interner), "...string?");
}

#[test]
fn error_type_degrades_to_any() {
    let fx = Fixture::new();
    assert_eq!(render(&fx, TypeId::ERROR), "any");
}

#[test]
fn type_parameters_keep_constraints_out_of_text() {
    let mut fx = Fixture::new();
    let (_, iface_ty) = fx.declare("IShape", TypeDeclKind::Interface);
    let name = fx.name("T");
    let t = fx.sema.types.intern(TypeKind::TypeParam {
        name,
        constraints: vec![iface_ty],
    });
    let registry = MetadataRegistry::new();
    let mapper = TypeMapper::new(&fx.sema, &fx.interner, &registry);
    let mapped = mapper.map(t);
    match &mapped {
        TypeInfo::GenericName { constraints, .. } => assert_eq!(constraints.len(), 1),
        other => panic!("expected a generic name, got {other:?}"),
    }
    assert_eq!(moon_fmt::render_type(&mapped, &*fx.interner), "T");
}
