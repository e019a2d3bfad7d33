use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;
use crate::StringInterner;

/// Addresses of every heap-allocated node reachable from `ty`.
fn node_addresses(ty: &TypeInfo, out: &mut Vec<usize>) {
    out.push(std::ptr::from_ref(ty) as usize);
    match ty {
        TypeInfo::Basic(_) => {}
        TypeInfo::Optional(inner) | TypeInfo::Variadic(inner) | TypeInfo::Array(inner) => {
            node_addresses(inner, out);
        }
        TypeInfo::KeyOf(inner) => node_addresses(inner, out),
        TypeInfo::Tuple { elements, variadic } => {
            for e in elements {
                node_addresses(e, out);
            }
            if let Some(v) = variadic {
                node_addresses(v, out);
            }
        }
        TypeInfo::Mapped { key, value } => {
            node_addresses(key, out);
            node_addresses(value, out);
        }
        TypeInfo::IndexOf { target, key } => {
            node_addresses(target, out);
            node_addresses(key, out);
        }
        TypeInfo::Function { params, ret } => {
            for p in params {
                node_addresses(p, out);
            }
            node_addresses(ret, out);
        }
        TypeInfo::Interface(fields) => {
            for f in fields {
                node_addresses(&f.ty, out);
            }
        }
        TypeInfo::GenericName {
            args, constraints, ..
        } => {
            for a in args.iter().chain(constraints) {
                node_addresses(a, out);
            }
        }
        TypeInfo::TypeOf(expr) => out.push(std::ptr::from_ref(&**expr) as usize),
    }
}

fn assert_disjoint(a: &TypeInfo, b: &TypeInfo) {
    let mut left = Vec::new();
    let mut right = Vec::new();
    node_addresses(a, &mut left);
    node_addresses(b, &mut right);
    for addr in &left {
        assert!(!right.contains(addr), "clone shares node at {addr:#x}");
    }
}

fn type_info_strategy() -> impl Strategy<Value = TypeInfo> {
    let interner = StringInterner::new();
    let names: Vec<crate::Name> = ["number", "string", "boolean", "Foo", "T"]
        .iter()
        .map(|s| interner.intern(s))
        .collect();
    let leaf = prop::sample::select(names.clone()).prop_map(TypeInfo::Basic);
    leaf.prop_recursive(5, 48, 4, move |inner| {
        let field_names = names.clone();
        prop_oneof![
            inner.clone().prop_map(TypeInfo::optional),
            inner.clone().prop_map(TypeInfo::array),
            inner.clone().prop_map(TypeInfo::variadic),
            (inner.clone(), inner.clone()).prop_map(|(k, v)| TypeInfo::mapped(k, v)),
            (prop::collection::vec(inner.clone(), 0..3), inner.clone()).prop_map(
                |(params, ret)| TypeInfo::Function {
                    params,
                    ret: Box::new(ret),
                }
            ),
            (
                prop::collection::vec(inner.clone(), 1..3),
                prop::option::of(inner.clone())
            )
                .prop_map(|(elements, variadic)| TypeInfo::Tuple {
                    elements,
                    variadic: variadic.map(Box::new),
                }),
            prop::collection::vec(inner.clone(), 1..3).prop_map(move |tys| {
                TypeInfo::Interface(
                    tys.into_iter()
                        .zip(field_names.iter().cycle())
                        .map(|(ty, &name)| FieldType {
                            name,
                            ty,
                            access: FieldAccess::Read,
                        })
                        .collect(),
                )
            }),
        ]
    })
}

proptest! {
    #[test]
    fn deep_clone_is_equal_and_unaliased(ty in type_info_strategy()) {
        let copy = ty.clone();
        prop_assert_eq!(&copy, &ty);
        assert_disjoint(&ty, &copy);
    }
}

#[test]
fn params_template_clones_do_not_alias() {
    let interner = StringInterner::new();
    let template = TypeInfo::variadic(TypeInfo::optional(TypeInfo::Basic(
        interner.intern("number"),
    )));
    let first = template.clone();
    let mut second = template.clone();
    if let TypeInfo::Variadic(inner) = &mut second {
        **inner = TypeInfo::Basic(interner.intern("string"));
    }
    assert_eq!(first, template);
    assert_ne!(second, template);
    assert_disjoint(&first, &template);
}

#[test]
fn optional_is_not_doubled() {
    let interner = StringInterner::new();
    let number = TypeInfo::Basic(interner.intern("number"));
    let once = TypeInfo::optional(number);
    let twice = TypeInfo::optional(once.clone());
    assert_eq!(once, twice);
}

#[test]
fn not_folds_comparisons() {
    let interner = StringInterner::new();
    let x = Expr::ident(interner.intern("x"));
    let eq = Expr::binary(BinOp::Eq, x.clone(), Expr::Nil);
    assert_eq!(eq.not(), Expr::binary(BinOp::NotEq, x.clone(), Expr::Nil));
    assert_eq!(x.clone().not().not(), x);
}
