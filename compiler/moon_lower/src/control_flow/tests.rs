#![allow(clippy::unwrap_used, clippy::expect_used)]

use moon_diagnostic::LowerError;
use moon_ir::ast::{CatchClause, LocalDecl, StmtKind, SwitchLabel, SwitchSection, UsingResource};
use moon_ir::sema::TypeDeclKind;
use moon_ir::{AstBuilder, ExprId, Span, StmtId, TypeId};
use pretty_assertions::assert_eq;

use crate::test_support::Fixture;

/// `name = value;`
fn set(b: &mut AstBuilder<'_>, name: &str, value: i64) -> StmtId {
    let target = b.local(name, TypeId::INT);
    let value = b.int(value);
    let assign = b.assign(target, value);
    b.expr_stmt(assign)
}

fn try_stmt(b: &mut AstBuilder<'_>, body: &[StmtId], catches: Vec<CatchClause>, finally: Option<&[StmtId]>) -> StmtId {
    let body = b.block(body);
    let finally = match finally {
        Some(stmts) => b.block(stmts),
        None => StmtId::INVALID,
    };
    b.stmt(StmtKind::Try {
        body,
        catches,
        finally,
    })
}

#[test]
fn return_inside_try_is_replayed_after_the_call() {
    let fx = Fixture::new();
    let interner = fx.interner.clone();
    let mut b = AstBuilder::new(&interner);
    let one = b.int(1);
    let ret = b.ret(Some(one));
    let cleanup = set(&mut b, "x", 2);
    let stmt = try_stmt(&mut b, &[ret], Vec::new(), Some(&[cleanup]));
    b.top_level(stmt);
    let unit = b.finish("try.cs");

    assert_eq!(
        fx.body(&unit),
        "local _exitKind, _exitValue = CS.try(function()\n  return CS.TRY_RETURN, 1\nend, nil, function()\n  x = 2\nend)\n\
         \n\
         if _exitKind == CS.TRY_RETURN then\n  return _exitValue\nend\n"
    );
}

#[test]
fn try_without_exits_is_a_plain_call() {
    let fx = Fixture::new();
    let interner = fx.interner.clone();
    let mut b = AstBuilder::new(&interner);
    let work = set(&mut b, "x", 1);
    let cleanup = set(&mut b, "x", 2);
    let stmt = try_stmt(&mut b, &[work], Vec::new(), Some(&[cleanup]));
    b.top_level(stmt);
    let unit = b.finish("try.cs");

    assert_eq!(
        fx.body(&unit),
        "CS.try(function()\n  x = 1\nend, nil, function()\n  x = 2\nend)\n"
    );
}

#[test]
fn break_and_continue_inside_try_reach_the_loop() {
    let fx = Fixture::new();
    let interner = fx.interner.clone();
    let mut b = AstBuilder::new(&interner);
    let brk = b.stmt(StmtKind::Break);
    let cont = b.stmt(StmtKind::Continue);
    let flag = b.local("done", TypeId::BOOL);
    let then = b.block(&[brk]);
    let branch = b.if_(flag, then, Some(cont));
    let stmt = try_stmt(&mut b, &[branch], Vec::new(), None);
    let cond = b.bool(true);
    let body = b.block(&[stmt]);
    let lp = b.while_(cond, body);
    b.top_level(lp);
    let unit = b.finish("loop.cs");

    let text = fx.body(&unit);
    assert!(text.contains("return CS.TRY_BREAK"), "{text}");
    assert!(text.contains("return CS.TRY_CONTINUE"), "{text}");
    assert!(text.contains("local _exitKind = CS.try(function()"), "{text}");
    assert!(text.contains("if _exitKind == CS.TRY_BREAK then\n    break\n  end"), "{text}");
    assert!(text.contains("if _exitKind == CS.TRY_CONTINUE then\n    continue\n  end"), "{text}");
}

#[test]
fn nested_try_dispatches_through_the_outer_closure() {
    let fx = Fixture::new();
    let interner = fx.interner.clone();
    let mut b = AstBuilder::new(&interner);
    let seven = b.int(7);
    let ret = b.ret(Some(seven));
    let inner_cleanup = set(&mut b, "x", 1);
    let inner = try_stmt(&mut b, &[ret], Vec::new(), Some(&[inner_cleanup]));
    let outer_cleanup = set(&mut b, "x", 2);
    let outer = try_stmt(&mut b, &[inner], Vec::new(), Some(&[outer_cleanup]));
    b.top_level(outer);
    let unit = b.finish("nested.cs");

    let text = fx.body(&unit);
    // Inner dispatch re-raises to the outer try; outer dispatch returns.
    assert!(
        text.contains("if _exitKind == CS.TRY_RETURN then\n    return CS.TRY_RETURN, _exitValue\n  end"),
        "{text}"
    );
    assert!(
        text.contains("local _exitKind_1, _exitValue_1 = CS.try("),
        "{text}"
    );
    assert!(
        text.ends_with("if _exitKind_1 == CS.TRY_RETURN then\n  return _exitValue_1\nend\n"),
        "{text}"
    );
}

#[test]
fn second_catch_clause_is_unsupported() {
    let fx = Fixture::new();
    let interner = fx.interner.clone();
    let mut b = AstBuilder::new(&interner);
    let work = set(&mut b, "x", 1);
    let first = b.block(&[]);
    let second = b.block(&[]);
    let catches = vec![
        CatchClause {
            ty: TypeId::ERROR,
            name: None,
            body: first,
            span: Span::DUMMY,
        },
        CatchClause {
            ty: TypeId::ERROR,
            name: None,
            body: second,
            span: Span::new(10, 20),
        },
    ];
    let stmt = try_stmt(&mut b, &[work], catches, None);
    b.top_level(stmt);
    let unit = b.finish("catch.cs");

    let err = fx.compile(&unit).unwrap_err();
    assert!(matches!(err, LowerError::Unsupported { .. }));
    assert_eq!(err.span(), Span::new(10, 20));
}

#[test]
fn typed_catch_rethrows_other_errors() {
    let mut fx = Fixture::new();
    let (_, my_error) = fx.declare("MyError", TypeDeclKind::Class);
    let interner = fx.interner.clone();
    let mut b = AstBuilder::new(&interner);
    let work = set(&mut b, "x", 1);
    let handled = set(&mut b, "x", 0);
    let handler = b.block(&[handled]);
    let catches = vec![CatchClause {
        ty: my_error,
        name: Some(b.name("e")),
        body: handler,
        span: Span::DUMMY,
    }];
    let stmt = try_stmt(&mut b, &[work], catches, None);
    b.top_level(stmt);
    let unit = b.finish("catch.cs");

    assert_eq!(
        fx.body(&unit),
        "CS.try(function()\n  x = 1\nend, function(e)\n  if not CS.is(e, MyError) then\n    CS.throw(e)\n  end\n  x = 0\nend)\n"
    );
}

#[test]
fn rethrow_uses_the_catch_variable() {
    let fx = Fixture::new();
    let interner = fx.interner.clone();
    let mut b = AstBuilder::new(&interner);
    let work = set(&mut b, "x", 1);
    let rethrow = b.stmt(StmtKind::Throw(ExprId::INVALID));
    let handler = b.block(&[rethrow]);
    let catches = vec![CatchClause {
        ty: TypeId::ERROR,
        name: None,
        body: handler,
        span: Span::DUMMY,
    }];
    let stmt = try_stmt(&mut b, &[work], catches, None);
    b.top_level(stmt);
    let unit = b.finish("catch.cs");

    assert_eq!(
        fx.body(&unit),
        "CS.try(function()\n  x = 1\nend, function(_ex)\n  CS.throw(_ex)\nend)\n"
    );
}

#[test]
fn using_statement_scopes_the_resource_and_disposes_in_finally() {
    let fx = Fixture::new();
    let interner = fx.interner.clone();
    let mut b = AstBuilder::new(&interner);
    let source = b.local("other", TypeId::OBJECT);
    let resource = UsingResource::Decl(LocalDecl {
        name: b.name("r"),
        ty: TypeId::OBJECT,
        init: source,
    });
    let work = set(&mut b, "x", 1);
    let body = b.block(&[work]);
    let stmt = b.stmt(StmtKind::Using { resource, body });
    b.top_level(stmt);
    let unit = b.finish("using.cs");

    assert_eq!(
        fx.body(&unit),
        "do\n\
         \x20 local r = other\n\
         \x20 CS.try(function()\n\
         \x20   x = 1\n\
         \x20 end, nil, function()\n\
         \x20   if r ~= nil then\n\
         \x20     r:Dispose()\n\
         \x20   end\n\
         \x20 end)\n\
         end\n"
    );
}

#[test]
fn using_declarations_dispose_innermost_first() {
    let fx = Fixture::new();
    let interner = fx.interner.clone();
    let mut b = AstBuilder::new(&interner);
    let first_init = b.local("a", TypeId::OBJECT);
    let first = b.stmt(StmtKind::UsingDecl(LocalDecl {
        name: b.name("outer"),
        ty: TypeId::OBJECT,
        init: first_init,
    }));
    let second_init = b.local("b", TypeId::OBJECT);
    let second = b.stmt(StmtKind::UsingDecl(LocalDecl {
        name: b.name("inner"),
        ty: TypeId::OBJECT,
        init: second_init,
    }));
    let work = set(&mut b, "x", 1);
    let block = b.block(&[first, second, work]);
    b.top_level(block);
    let unit = b.finish("using.cs");

    let text = fx.body(&unit);
    let inner = text.find("inner:Dispose()").unwrap();
    let outer = text.find("outer:Dispose()").unwrap();
    assert!(inner < outer, "{text}");
    assert!(text.contains("local inner = b"), "{text}");
}

#[test]
fn continue_inside_switch_sets_a_flag() {
    let fx = Fixture::new();
    let interner = fx.interner.clone();
    let mut b = AstBuilder::new(&interner);
    let x = b.local("x", TypeId::INT);
    let one = b.int(1);
    let pattern = b.constant_pattern(one);
    let cont = b.stmt(StmtKind::Continue);
    let section_body = b.stmts(&[cont]);
    let brk = b.stmt(StmtKind::Break);
    let default_body = b.stmts(&[brk]);
    let switch = b.stmt(StmtKind::Switch {
        subject: x,
        sections: vec![
            SwitchSection {
                labels: vec![SwitchLabel::Case {
                    pattern,
                    guard: ExprId::INVALID,
                }],
                body: section_body,
                span: Span::DUMMY,
            },
            SwitchSection {
                labels: vec![SwitchLabel::Default],
                body: default_body,
                span: Span::DUMMY,
            },
        ],
    });
    let after = set(&mut b, "y", 1);
    let body = b.block(&[switch, after]);
    let cond = b.local("running", TypeId::BOOL);
    let lp = b.while_(cond, body);
    b.top_level(lp);
    let unit = b.finish("switch.cs");

    assert_eq!(
        fx.body(&unit),
        "while running do\n\
         \x20 local _continue = false\n\
         \x20 repeat\n\
         \x20   if x == 1 then\n\
         \x20     _continue = true\n\
         \x20     break\n\
         \x20   end\n\
         \x20 until true\n\
         \x20 if _continue then\n\
         \x20   continue\n\
         \x20 end\n\
         \x20 y = 1\n\
         end\n"
    );
}

#[test]
fn break_outside_a_loop_is_an_invalid_tree() {
    let fx = Fixture::new();
    let interner = fx.interner.clone();
    let mut b = AstBuilder::new(&interner);
    let brk = b.stmt(StmtKind::Break);
    b.top_level(brk);
    let unit = b.finish("break.cs");

    assert!(matches!(fx.compile(&unit), Err(LowerError::InvalidTree { .. })));
}
