#![allow(clippy::unwrap_used, clippy::expect_used)]

use moon_ir::ast::{BinaryOp, ExprKind, ForEachBinding, IncDecOp, Initializer, MemberInit, StmtKind};
use moon_ir::sema::{MethodSymbol, TypeDeclKind, WellKnownMember, WellKnownType};
use moon_ir::{AstBuilder, ExprId, StmtId, SymbolId, TypeId};
use pretty_assertions::assert_eq;

use crate::metadata::MetadataRegistry;
use crate::test_support::Fixture;

/// `var r = value;` as the only top-level statement.
fn bind_result(b: &mut AstBuilder<'_>, value: ExprId, ty: TypeId) {
    let stmt = b.let_("r", ty, Some(value));
    b.top_level(stmt);
}

/// `y = name;`
fn copy_to_y(b: &mut AstBuilder<'_>, name: &str, ty: TypeId) -> StmtId {
    let target = b.local("y", ty);
    let value = b.local(name, ty);
    let assign = b.assign(target, value);
    let stmt = b.expr_stmt(assign);
    b.block(&[stmt])
}

#[test]
fn string_addition_concatenates() {
    let fx = Fixture::new();
    let interner = fx.interner.clone();
    let mut b = AstBuilder::new(&interner);
    let prefix = b.string("n=");
    let n = b.local("n", TypeId::INT);
    let text = b.binary(BinaryOp::Add, prefix, n, TypeId::STRING);
    bind_result(&mut b, text, TypeId::STRING);
    let o = b.local("o", TypeId::OBJECT);
    let bang = b.string("!");
    let value = b.binary(BinaryOp::Add, o, bang, TypeId::STRING);
    let second = b.let_("s", TypeId::STRING, Some(value));
    b.top_level(second);
    let unit = b.finish("concat.cs");

    assert_eq!(
        fx.body(&unit),
        "local r = \"n=\" .. n\n\nlocal s = tostring(o) .. \"!\"\n"
    );
}

/// `target op= value;`
fn compound(b: &mut AstBuilder<'_>, op: BinaryOp, name: &str, value: ExprId, ty: TypeId) {
    let target = b.local(name, ty);
    let assign = b.expr(ExprKind::CompoundAssign { op, target, value }, ty);
    let stmt = b.expr_stmt(assign);
    b.top_level(stmt);
}

#[test]
fn integer_division_and_remainder_truncate() {
    let fx = Fixture::new();
    let interner = fx.interner.clone();
    let mut b = AstBuilder::new(&interner);
    let a = b.local("a", TypeId::INT);
    let two = b.int(2);
    let quotient = b.binary(BinaryOp::Div, a, two, TypeId::INT);
    let first = b.let_("q", TypeId::INT, Some(quotient));
    b.top_level(first);
    let a = b.local("a", TypeId::INT);
    let three = b.int(3);
    let remainder = b.binary(BinaryOp::Mod, a, three, TypeId::INT);
    let second = b.let_("m", TypeId::INT, Some(remainder));
    b.top_level(second);
    let two = b.int(2);
    compound(&mut b, BinaryOp::Div, "x", two, TypeId::INT);
    let three = b.int(3);
    compound(&mut b, BinaryOp::Mod, "x", three, TypeId::INT);
    let d = b.local("d", TypeId::DOUBLE);
    let cast = b.expr(
        ExprKind::Cast {
            expr: d,
            target: TypeId::INT,
        },
        TypeId::INT,
    );
    let third = b.let_("i", TypeId::INT, Some(cast));
    b.top_level(third);
    let two = b.float(2.0);
    compound(&mut b, BinaryOp::Div, "e", two, TypeId::DOUBLE);
    let unit = b.finish("div.cs");

    assert_eq!(
        fx.body(&unit),
        "local q = (math.modf(a / 2))\n\
         \n\
         local m = math.fmod(a, 3)\n\
         \n\
         x = (math.modf(x / 2))\n\
         \n\
         x = math.fmod(x, 3)\n\
         \n\
         local i = (math.modf(d))\n\
         \n\
         e /= 2\n"
    );
}

#[test]
fn negative_integer_operands_round_toward_zero() {
    let fx = Fixture::new();
    let interner = fx.interner.clone();
    let mut b = AstBuilder::new(&interner);
    let seven = b.int(7);
    let minus_seven = b.expr(
        ExprKind::Unary {
            op: moon_ir::ast::UnaryOp::Neg,
            operand: seven,
        },
        TypeId::INT,
    );
    let two = b.int(2);
    let quotient = b.binary(BinaryOp::Div, minus_seven, two, TypeId::INT);
    let first = b.let_("q", TypeId::INT, Some(quotient));
    b.top_level(first);
    let a = b.local("a", TypeId::INT);
    let minus_a = b.expr(
        ExprKind::Unary {
            op: moon_ir::ast::UnaryOp::Neg,
            operand: a,
        },
        TypeId::INT,
    );
    let three = b.int(3);
    let remainder = b.binary(BinaryOp::Mod, minus_a, three, TypeId::INT);
    let second = b.let_("m", TypeId::INT, Some(remainder));
    b.top_level(second);
    let unit = b.finish("negative.cs");

    assert_eq!(
        fx.body(&unit),
        "local q = (math.modf(-7 / 2))\n\nlocal m = math.fmod(-a, 3)\n"
    );
}

#[test]
fn bitwise_operators_use_bit32() {
    let fx = Fixture::new();
    let interner = fx.interner.clone();
    let mut b = AstBuilder::new(&interner);
    let a = b.local("a", TypeId::INT);
    let mask = b.int(255);
    let value = b.binary(BinaryOp::BitAnd, a, mask, TypeId::INT);
    bind_result(&mut b, value, TypeId::INT);
    let unit = b.finish("bits.cs");

    assert_eq!(fx.body(&unit), "local r = bit32.band(a, 255)\n");
}

#[test]
fn boolean_xor_is_inequality() {
    let fx = Fixture::new();
    let interner = fx.interner.clone();
    let mut b = AstBuilder::new(&interner);
    let p = b.local("p", TypeId::BOOL);
    let q = b.local("q", TypeId::BOOL);
    let value = b.binary(BinaryOp::BitXor, p, q, TypeId::BOOL);
    bind_result(&mut b, value, TypeId::BOOL);
    let unit = b.finish("xor.cs");

    assert_eq!(fx.body(&unit), "local r = p ~= q\n");
}

#[test]
fn coalesce_and_conditional_are_if_expressions() {
    let mut fx = Fixture::new();
    let maybe = fx.nullable(TypeId::STRING);
    let interner = fx.interner.clone();
    let mut b = AstBuilder::new(&interner);
    let a = b.local("a", maybe);
    let fallback = b.string("none");
    let coalesce = b.binary(BinaryOp::Coalesce, a, fallback, TypeId::STRING);
    let first = b.let_("r", TypeId::STRING, Some(coalesce));
    b.top_level(first);

    let c = b.local("c", TypeId::BOOL);
    let one = b.int(1);
    let two = b.int(2);
    let pick = b.expr(
        ExprKind::Conditional {
            cond: c,
            then_value: one,
            else_value: two,
        },
        TypeId::INT,
    );
    let second = b.let_("s", TypeId::INT, Some(pick));
    b.top_level(second);
    let unit = b.finish("if.cs");

    assert_eq!(
        fx.body(&unit),
        "local r = if a ~= nil then a else \"none\"\n\nlocal s = if c then 1 else 2\n"
    );
}

#[test]
fn uninitialized_local_keeps_its_type() {
    let fx = Fixture::new();
    let interner = fx.interner.clone();
    let mut b = AstBuilder::new(&interner);
    let stmt = b.let_("count", TypeId::INT, None);
    b.top_level(stmt);
    let unit = b.finish("local.cs");

    assert_eq!(fx.body(&unit), "local count: number\n");
}

#[test]
fn foreach_over_a_range_is_a_numeric_for() {
    let fx = Fixture::new();
    let interner = fx.interner.clone();
    let mut b = AstBuilder::new(&interner);
    let start = b.int(1);
    let end = b.int(5);
    let range = b.range(start, end, None, TypeId::INT);
    let body = copy_to_y(&mut b, "i", TypeId::INT);
    let binding = ForEachBinding::Single {
        name: b.name("i"),
        ty: TypeId::INT,
    };
    let stmt = b.stmt(StmtKind::ForEach {
        binding,
        source: range,
        body,
    });
    b.top_level(stmt);
    let unit = b.finish("range.cs");

    assert_eq!(fx.body(&unit), "for i = 1, 5 do\n  y = i\nend\n");
}

#[test]
fn foreach_over_a_descending_range_keeps_the_step() {
    let fx = Fixture::new();
    let interner = fx.interner.clone();
    let mut b = AstBuilder::new(&interner);
    let start = b.int(10);
    let end = b.int(0);
    let step = b.int(-2);
    let range = b.range(start, end, Some(step), TypeId::INT);
    let body = copy_to_y(&mut b, "i", TypeId::INT);
    let binding = ForEachBinding::Single {
        name: b.name("i"),
        ty: TypeId::INT,
    };
    let stmt = b.stmt(StmtKind::ForEach {
        binding,
        source: range,
        body,
    });
    b.top_level(stmt);
    let unit = b.finish("range.cs");

    assert_eq!(fx.body(&unit), "for i = 10, 0, -2 do\n  y = i\nend\n");
}

#[test]
fn foreach_over_a_list_uses_ipairs() {
    let mut fx = Fixture::new();
    let list = fx.list_of(TypeId::INT);
    let interner = fx.interner.clone();
    let mut b = AstBuilder::new(&interner);
    let xs = b.local("xs", list);
    let body = copy_to_y(&mut b, "x", TypeId::INT);
    let binding = ForEachBinding::Single {
        name: b.name("x"),
        ty: TypeId::INT,
    };
    let stmt = b.stmt(StmtKind::ForEach {
        binding,
        source: xs,
        body,
    });
    b.top_level(stmt);
    let unit = b.finish("list.cs");

    assert_eq!(fx.body(&unit), "for _index, x in ipairs(xs) do\n  y = x\nend\n");
}

#[test]
fn foreach_over_a_dictionary_builds_pairs() {
    let mut fx = Fixture::new();
    let dict = fx.dictionary_of(TypeId::STRING, TypeId::INT);
    let interner = fx.interner.clone();
    let mut b = AstBuilder::new(&interner);
    let source = b.local("ages", dict);
    let body = copy_to_y(&mut b, "entry", TypeId::OBJECT);
    let binding = ForEachBinding::Single {
        name: b.name("entry"),
        ty: TypeId::OBJECT,
    };
    let stmt = b.stmt(StmtKind::ForEach {
        binding,
        source,
        body,
    });
    b.top_level(stmt);
    let unit = b.finish("dict.cs");

    assert_eq!(
        fx.body(&unit),
        "for _key, _value in pairs(ages) do\n\
         \x20 local entry = {\n\
         \x20   Key = _key,\n\
         \x20   Value = _value,\n\
         \x20 }\n\
         \x20 y = entry\n\
         end\n"
    );
}

#[test]
fn foreach_deconstructing_a_dictionary_binds_both_names() {
    let mut fx = Fixture::new();
    let dict = fx.dictionary_of(TypeId::STRING, TypeId::INT);
    let interner = fx.interner.clone();
    let mut b = AstBuilder::new(&interner);
    let source = b.local("ages", dict);
    let body = copy_to_y(&mut b, "age", TypeId::INT);
    let binding = ForEachBinding::Deconstruct(vec![b.name("name"), b.name("age")]);
    let stmt = b.stmt(StmtKind::ForEach {
        binding,
        source,
        body,
    });
    b.top_level(stmt);
    let unit = b.finish("dict.cs");

    assert_eq!(fx.body(&unit), "for name, age in pairs(ages) do\n  y = age\nend\n");
}

#[test]
fn foreach_over_a_string_walks_characters() {
    let fx = Fixture::new();
    let interner = fx.interner.clone();
    let mut b = AstBuilder::new(&interner);
    let source = b.local("word", TypeId::STRING);
    let body = copy_to_y(&mut b, "c", TypeId::CHAR);
    let binding = ForEachBinding::Single {
        name: b.name("c"),
        ty: TypeId::CHAR,
    };
    let stmt = b.stmt(StmtKind::ForEach {
        binding,
        source,
        body,
    });
    b.top_level(stmt);
    let unit = b.finish("chars.cs");

    assert_eq!(
        fx.body(&unit),
        "for c in string.gmatch(word, \".\") do\n  y = c\nend\n"
    );
}

#[test]
fn conditional_access_guards_the_receiver() {
    let mut fx = Fixture::new();
    let (person, person_ty) = fx.declare("Person", TypeDeclKind::Class);
    let name_field = fx.field(person, "Name", TypeId::STRING, false);
    let maybe_person = fx.nullable(person_ty);
    let interner = fx.interner.clone();
    let mut b = AstBuilder::new(&interner);
    let p = b.local("p", maybe_person);
    let receiver = b.expr(ExprKind::ConditionalReceiver, person_ty);
    let access = b.member(receiver, "Name", name_field, TypeId::STRING);
    let maybe_name = fx.sema.types.nullable(TypeId::STRING);
    let value = b.expr(ExprKind::ConditionalAccess { receiver: p, access }, maybe_name);
    bind_result(&mut b, value, maybe_name);
    let unit = b.finish("access.cs");

    assert_eq!(
        fx.body(&unit),
        "local _t = p\n\
         \n\
         if _t ~= nil then\n  _t = _t.Name\nend\n\
         \n\
         local r = _t\n"
    );
}

#[test]
fn object_initializer_assigns_after_construction() {
    let mut fx = Fixture::new();
    let (person, person_ty) = fx.declare("Person", TypeDeclKind::Class);
    let name_field = fx.field(person, "Name", TypeId::STRING, false);
    let interner = fx.interner.clone();
    let mut b = AstBuilder::new(&interner);
    let ann = b.string("Ann");
    let args = b.exprs(&[]);
    let created = b.expr(
        ExprKind::New {
            args,
            ctor: SymbolId::NONE,
            initializer: Some(Initializer::Object(vec![MemberInit {
                name: b.name("Name"),
                symbol: name_field,
                value: ann,
            }])),
        },
        person_ty,
    );
    bind_result(&mut b, created, person_ty);
    let unit = b.finish("new.cs");

    assert_eq!(
        fx.body(&unit),
        "local _object = Person.new()\n\
         \n\
         _object.Name = \"Ann\"\n\
         \n\
         local r = _object\n"
    );
}

#[test]
fn collection_initializers_become_table_literals() {
    let mut fx = Fixture::new();
    let list = fx.list_of(TypeId::INT);
    let interner = fx.interner.clone();
    let mut b = AstBuilder::new(&interner);
    let one = b.int(1);
    let two = b.int(2);
    let items = b.exprs(&[one, two]);
    let args = b.exprs(&[]);
    let created = b.expr(
        ExprKind::New {
            args,
            ctor: SymbolId::NONE,
            initializer: Some(Initializer::Collection(items)),
        },
        list,
    );
    bind_result(&mut b, created, list);
    let unit = b.finish("list.cs");

    assert_eq!(fx.body(&unit), "local r = { 1, 2 }\n");
}

#[test]
fn lowered_values_render_through_the_lowerer() {
    let fx = Fixture::new();
    let interner = fx.interner.clone();
    let mut b = AstBuilder::new(&interner);
    let x = b.local("x", TypeId::INT);
    let negated = b.expr(
        ExprKind::Unary {
            op: moon_ir::ast::UnaryOp::Neg,
            operand: x,
        },
        TypeId::INT,
    );
    let unit = b.finish("neg.cs");

    let registry = MetadataRegistry::new();
    let mut lowerer = fx.lowerer(&unit.arena, &registry);
    let lowered = lowerer.lower_expr(negated).unwrap();
    assert!(!lowered.has_prereqs());
    assert_eq!(fx.render_expr(&lowered.value), "-x");
}

fn incdec(b: &mut AstBuilder<'_>, op: IncDecOp, name: &str) -> ExprId {
    let target = b.local(name, TypeId::INT);
    b.expr(ExprKind::IncDec { op, target }, TypeId::INT)
}

#[test]
fn increments_used_as_values_keep_evaluation_order() {
    let fx = Fixture::new();
    let interner = fx.interner.clone();
    let mut b = AstBuilder::new(&interner);
    // var r = k++ + k;
    let bumped = incdec(&mut b, IncDecOp::PostIncrement, "k");
    let k = b.local("k", TypeId::INT);
    let sum = b.binary(BinaryOp::Add, bumped, k, TypeId::INT);
    let first = b.let_("r", TypeId::INT, Some(sum));
    b.top_level(first);
    // var s = k + k++;
    let k = b.local("k", TypeId::INT);
    let bumped = incdec(&mut b, IncDecOp::PostIncrement, "k");
    let sum = b.binary(BinaryOp::Add, k, bumped, TypeId::INT);
    let second = b.let_("s", TypeId::INT, Some(sum));
    b.top_level(second);
    // var t = --k;
    let lowered = incdec(&mut b, IncDecOp::PreDecrement, "k");
    let third = b.let_("t", TypeId::INT, Some(lowered));
    b.top_level(third);
    let unit = b.finish("incdec.cs");

    assert_eq!(
        fx.body(&unit),
        "local _old = k\n\
         \n\
         k = _old + 1\n\
         \n\
         local r = _old + k\n\
         \n\
         local _arg = k\n\
         \n\
         local _old_1 = k\n\
         \n\
         k = _old_1 + 1\n\
         \n\
         local s = _arg + _old_1\n\
         \n\
         local _value = k - 1\n\
         \n\
         k = _value\n\
         \n\
         local t = _value\n"
    );
}

#[test]
fn assignment_used_as_a_value_reads_the_target() {
    let fx = Fixture::new();
    let interner = fx.interner.clone();
    let mut b = AstBuilder::new(&interner);
    let y = b.local("y", TypeId::INT);
    let five = b.int(5);
    let assign = b.assign(y, five);
    bind_result(&mut b, assign, TypeId::INT);
    let unit = b.finish("assign.cs");

    assert_eq!(fx.body(&unit), "y = 5\n\nlocal r = y\n");
}

#[test]
fn extension_methods_are_colon_calls() {
    let mut fx = Fixture::new();
    let (helpers, _) = fx.declare("TextExtensions", TypeDeclKind::Class);
    let shout = fx.method(
        helpers,
        "Shout",
        MethodSymbol {
            is_extension: true,
            ..MethodSymbol::returning(TypeId::STRING).with_static()
        },
    );
    let string = fx.library("String", WellKnownType::String);
    let to_upper = fx.method(
        string,
        "ToUpper",
        MethodSymbol::returning(TypeId::STRING).with_well_known(WellKnownMember::StringToUpper),
    );
    let interner = fx.interner.clone();
    let mut b = AstBuilder::new(&interner);
    let word = b.local("word", TypeId::STRING);
    let callee = b.member(word, "Shout", shout, TypeId::STRING);
    let bang = b.string("!");
    let call = b.call(callee, &[bang], shout, TypeId::STRING);
    bind_result(&mut b, call, TypeId::STRING);
    let word = b.local("word", TypeId::STRING);
    let callee = b.member(word, "ToUpper", to_upper, TypeId::STRING);
    let call = b.call(callee, &[], to_upper, TypeId::STRING);
    let second = b.let_("u", TypeId::STRING, Some(call));
    b.top_level(second);
    let unit = b.finish("ext.cs");

    assert_eq!(
        fx.body(&unit),
        "local r = word:Shout(\"!\")\n\nlocal u = word:upper()\n"
    );
}

#[test]
fn method_group_captures_its_receiver() {
    let mut fx = Fixture::new();
    let (counter, counter_ty) = fx.declare("Counter", TypeDeclKind::Class);
    let increment = fx.method(counter, "Increment", MethodSymbol::returning(TypeId::VOID));
    let interner = fx.interner.clone();
    let mut b = AstBuilder::new(&interner);
    let target = b.local("counter", counter_ty);
    let group = b.member(target, "Increment", increment, TypeId::OBJECT);
    let stmt = b.let_("f", TypeId::OBJECT, Some(group));
    b.top_level(stmt);
    let unit = b.finish("group.cs");

    assert_eq!(
        fx.body(&unit),
        "local _recv = counter\n\
         \n\
         local f = function(...)\n  return _recv:Increment(...)\nend\n"
    );
}

#[test]
fn fractional_range_step_is_kept() {
    let fx = Fixture::new();
    let interner = fx.interner.clone();
    let mut b = AstBuilder::new(&interner);
    let start = b.int(0);
    let end = b.int(1);
    let step = b.float(0.25);
    let range = b.range(start, end, Some(step), TypeId::DOUBLE);
    let body = copy_to_y(&mut b, "t", TypeId::DOUBLE);
    let binding = ForEachBinding::Single {
        name: b.name("t"),
        ty: TypeId::DOUBLE,
    };
    let stmt = b.stmt(StmtKind::ForEach {
        binding,
        source: range,
        body,
    });
    b.top_level(stmt);
    let unit = b.finish("range.cs");

    assert_eq!(fx.body(&unit), "for t = 0, 1, 0.25 do\n  y = t\nend\n");
}

/// `foreach (var x in items) y = x; var all = items.ToList();` over an
/// opaque enumerable.
fn iterate_and_collect(fx: &mut Fixture) -> moon_ir::SourceUnit {
    let sequence = fx.library_of("IEnumerable", WellKnownType::IEnumerable, vec![TypeId::INT]);
    let owner = fx.library("IEnumerable", WellKnownType::IEnumerable);
    let list = fx.list_of(TypeId::INT);
    let to_list = fx.method(
        owner,
        "ToList",
        MethodSymbol::returning(list).with_well_known(WellKnownMember::EnumerableCollect),
    );
    let interner = fx.interner.clone();
    let mut b = AstBuilder::new(&interner);
    let items = b.local("items", sequence);
    let body = copy_to_y(&mut b, "x", TypeId::INT);
    let binding = ForEachBinding::Single {
        name: b.name("x"),
        ty: TypeId::INT,
    };
    let stmt = b.stmt(StmtKind::ForEach {
        binding,
        source: items,
        body,
    });
    b.top_level(stmt);
    let items = b.local("items", sequence);
    let callee = b.member(items, "ToList", to_list, list);
    let call = b.call(callee, &[], to_list, list);
    let collected = b.let_("all", list, Some(call));
    b.top_level(collected);
    b.finish("iter.cs")
}

#[test]
fn opaque_enumerables_iterate_directly_without_helpers() {
    let mut fx = Fixture::new();
    let unit = iterate_and_collect(&mut fx);

    assert_eq!(
        fx.body(&unit),
        "for _index, x in items do\n  y = x\nend\n\
         \n\
         local _list = {}\n\
         \n\
         for _index_1, _item in items do\n  table.insert(_list, _item)\nend\n\
         \n\
         local all = _list\n"
    );
}

#[test]
fn iterator_helpers_route_opaque_enumerables_through_the_runtime() {
    let mut fx = Fixture::new();
    fx.options.macros.enable_iterator_helpers = true;
    let unit = iterate_and_collect(&mut fx);

    assert_eq!(
        fx.body(&unit),
        "for _index, x in CS.iter(items) do\n  y = x\nend\n\
         \n\
         local all = CS.collect(items)\n"
    );
}

#[test]
fn conditional_access_chain_nests_guards() {
    let mut fx = Fixture::new();
    let (node, node_ty) = fx.declare("Node", TypeDeclKind::Class);
    let maybe_node = fx.nullable(node_ty);
    let next = fx.field(node, "Next", maybe_node, false);
    let name_field = fx.field(node, "Name", TypeId::STRING, false);
    let maybe_name = fx.nullable(TypeId::STRING);
    let interner = fx.interner.clone();
    let mut b = AstBuilder::new(&interner);
    // p?.Next?.Name
    let p = b.local("p", maybe_node);
    let outer_receiver = b.expr(ExprKind::ConditionalReceiver, node_ty);
    let next_access = b.member(outer_receiver, "Next", next, maybe_node);
    let inner_receiver = b.expr(ExprKind::ConditionalReceiver, node_ty);
    let name_access = b.member(inner_receiver, "Name", name_field, TypeId::STRING);
    let inner = b.expr(
        ExprKind::ConditionalAccess {
            receiver: next_access,
            access: name_access,
        },
        maybe_name,
    );
    let chain = b.expr(ExprKind::ConditionalAccess { receiver: p, access: inner }, maybe_name);
    bind_result(&mut b, chain, maybe_name);
    let unit = b.finish("chain.cs");

    assert_eq!(
        fx.body(&unit),
        "local _t = p\n\
         \n\
         if _t ~= nil then\n\
         \x20 local _t_1 = _t.Next\n\
         \x20 if _t_1 ~= nil then\n\
         \x20   _t_1 = _t_1.Name\n\
         \x20 end\n\
         \x20 _t = _t_1\n\
         end\n\
         \n\
         local r = _t\n"
    );
}
