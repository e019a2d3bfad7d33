//! Property-based tests for the renderer.
//!
//! Random Luau trees are generated and checked for:
//! 1. Stability: rendering the same tree twice yields identical bytes
//! 2. Clone transparency: a deep clone renders exactly like the original
//! 3. Shape: top-level output ends in exactly one newline

#![allow(
    clippy::redundant_closure_for_method_calls,
    reason = "Proptest macros generate code with these patterns"
)]

use moon_fmt::{render_chunk, render_expr};
use moon_ir::luau::{BinOp, Block, Chunk, Expr, Stmt, TableField, UnOp};
use moon_ir::{Name, StringInterner};
use proptest::prelude::*;

fn names(interner: &StringInterner) -> Vec<Name> {
    ["a", "b", "count", "self", "Foo"]
        .iter()
        .map(|s| interner.intern(s))
        .collect()
}

fn binop_strategy() -> impl Strategy<Value = BinOp> {
    prop::sample::select(vec![
        BinOp::Add,
        BinOp::Sub,
        BinOp::Mul,
        BinOp::Div,
        BinOp::FloorDiv,
        BinOp::Mod,
        BinOp::Pow,
        BinOp::Concat,
        BinOp::Eq,
        BinOp::NotEq,
        BinOp::Lt,
        BinOp::GtEq,
        BinOp::And,
        BinOp::Or,
    ])
}

fn expr_strategy(names: Vec<Name>) -> impl Strategy<Value = Expr> {
    let member_names = names.clone();
    let leaf = prop_oneof![
        Just(Expr::Nil),
        any::<bool>().prop_map(Expr::Bool),
        (-1000i64..1000).prop_map(Expr::int),
        "[a-z ]{0,8}".prop_map(Expr::String),
        prop::sample::select(names).prop_map(Expr::Ident),
    ];
    leaf.prop_recursive(6, 64, 4, move |inner| {
        let member_names = member_names.clone();
        prop_oneof![
            (binop_strategy(), inner.clone(), inner.clone())
                .prop_map(|(op, l, r)| Expr::binary(op, l, r)),
            (
                prop::sample::select(vec![UnOp::Neg, UnOp::Not, UnOp::Len]),
                inner.clone()
            )
                .prop_map(|(op, e)| Expr::unary(op, e)),
            (inner.clone(), prop::collection::vec(inner.clone(), 0..3))
                .prop_map(|(callee, args)| callee.call(args)),
            (inner.clone(), prop::sample::select(member_names))
                .prop_map(|(object, name)| object.member(name)),
            (inner.clone(), inner.clone(), inner.clone())
                .prop_map(|(c, a, b)| Expr::if_else(c, a, b)),
            prop::collection::vec(inner.clone(), 0..4).prop_map(|items| {
                Expr::Table(items.into_iter().map(TableField::Positional).collect())
            }),
        ]
    })
}

fn chunk_strategy(names: Vec<Name>) -> impl Strategy<Value = Chunk> {
    let local_names = names.clone();
    let stmt = prop_oneof![
        (prop::sample::select(local_names), expr_strategy(names.clone()))
            .prop_map(|(name, value)| Stmt::local(name, value)),
        expr_strategy(names.clone()).prop_map(|e| Stmt::Return(vec![e])),
        (expr_strategy(names.clone()), expr_strategy(names))
            .prop_map(|(cond, value)| Stmt::if_then(cond, Block::new(vec![Stmt::ret(value)]))),
    ];
    prop::collection::vec(stmt, 0..6).prop_map(|stmts| Chunk::new(Block::new(stmts)))
}

proptest! {
    #[test]
    fn rendering_is_stable(chunk in chunk_strategy(names(&StringInterner::new()))) {
        // Names are indices; any interner with the same insertion order works.
        let interner = StringInterner::new();
        let _ = names(&interner);
        let first = render_chunk(&chunk, &interner);
        let second = render_chunk(&chunk, &interner);
        prop_assert_eq!(&first, &second);
        prop_assert!(first.is_empty() || (first.ends_with('\n') && !first.ends_with("\n\n")));
    }

    #[test]
    fn deep_clone_renders_identically(expr in expr_strategy(names(&StringInterner::new()))) {
        let interner = StringInterner::new();
        let _ = names(&interner);
        let copy = expr.clone();
        prop_assert_eq!(render_expr(&expr, &interner), render_expr(&copy, &interner));
    }
}
