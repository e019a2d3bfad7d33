//! End-to-end compilation: units in, Luau text out.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use moon_diagnostic::emitter::TextEmitter;
use moon_ir::ast::{
    ExprKind, FieldDecl, ForEachBinding, Member, MethodBody, MethodDecl, PatternKind, SlicePattern,
    StmtKind, TypeDecl,
};
use moon_ir::sema::{SymbolKind, TypeDeclKind};
use moon_ir::{AstBuilder, ExprId, SemanticModel, SharedInterner, SourceUnit, Span, SymbolId, TypeId};
use moonc::{compile_batch, Compilation, CompileOptions, Job, ScriptType};
use pretty_assertions::assert_eq;

const HEADER: &str =
    "local CS = require(game:GetService(\"ReplicatedStorage\"):WaitForChild(\"RuntimeLib\"))\n\n";

fn options(script_type: ScriptType) -> CompileOptions {
    CompileOptions::default().with_script_type(script_type)
}

fn type_decl(
    symbol: SymbolId,
    name: moon_ir::Name,
    kind: TypeDeclKind,
    members: Vec<Member>,
) -> TypeDecl {
    TypeDecl {
        symbol,
        name,
        kind,
        is_static: false,
        type_params: Vec::new(),
        attributes: Vec::new(),
        base: None,
        interfaces: Vec::new(),
        members,
        nested: Vec::new(),
        span: Span::DUMMY,
    }
}

fn field(
    sema: &mut SemanticModel,
    owner: SymbolId,
    name: moon_ir::Name,
    ty: TypeId,
    init: ExprId,
    is_static: bool,
) -> Member {
    let symbol = sema.declare_member(
        owner,
        name,
        SymbolKind::Field {
            is_static,
            is_const: false,
            ty,
        },
    );
    Member::Field(FieldDecl {
        symbol,
        name,
        ty,
        init,
        is_static,
        is_const: false,
        span: Span::DUMMY,
    })
}

/// `struct Point { int X; int Y; }`
fn point_unit(interner: &SharedInterner, sema: &mut SemanticModel) -> SourceUnit {
    let name = interner.intern("Point");
    let (point, _) = sema.declare_type(name, TypeDeclKind::Struct, None);
    let x = field(sema, point, interner.intern("X"), TypeId::INT, ExprId::INVALID, false);
    let y = field(sema, point, interner.intern("Y"), TypeId::INT, ExprId::INVALID, false);
    let mut b = AstBuilder::new(interner);
    b.add_type(type_decl(point, name, TypeDeclKind::Struct, vec![x, y]));
    b.finish("Point.cs")
}

#[test]
fn two_field_struct_module() {
    let interner = SharedInterner::new();
    let mut sema = SemanticModel::new();
    let units = vec![point_unit(&interner, &mut sema)];

    let output = Compilation::new(&sema, &units, options(ScriptType::Module), interner.clone()).compile();
    assert!(output.is_ok());
    let luau = &output.unit("Point.cs").unwrap().luau;
    let expected = format!(
        "{HEADER}\
         export type Point = {{ X: number, Y: number }}\n\
         \n\
         local Point\n\
         \n\
         do\n\
         \x20 Point = {{}}\n\
         \x20 function Point.new(X: number?, Y: number?): Point\n\
         \x20   return {{\n\
         \x20     X = if X == nil then 0 else X,\n\
         \x20     Y = if Y == nil then 0 else Y,\n\
         \x20   }}\n\
         \x20 end\n\
         end\n\
         \n\
         CS.defineGlobal(\"Point\", Point)\n\
         \n\
         return {{\n\
         \x20 Point = Point,\n\
         }}\n"
    );
    assert_eq!(luau, &expected);
}

#[test]
fn scripts_do_not_return_exports() {
    let interner = SharedInterner::new();
    let mut sema = SemanticModel::new();
    let units = vec![point_unit(&interner, &mut sema)];

    for script_type in [ScriptType::Script, ScriptType::LocalScript] {
        let output = Compilation::new(&sema, &units, options(script_type), interner.clone()).compile();
        let luau = &output.units[0].luau;
        assert!(luau.ends_with("CS.defineGlobal(\"Point\", Point)\n"), "{luau}");
        assert!(!luau.contains("return {"), "{luau}");
    }
}

#[test]
fn static_initializers_run_before_the_global_is_defined() {
    let interner = SharedInterner::new();
    let mut sema = SemanticModel::new();
    let name = interner.intern("Settings");
    let (settings, _) = sema.declare_type(name, TypeDeclKind::Class, None);
    let mut b = AstBuilder::new(&interner);
    let volume = b.int(7);
    let title = b.string("moon");
    let members = vec![
        field(&mut sema, settings, interner.intern("Volume"), TypeId::INT, volume, true),
        field(&mut sema, settings, interner.intern("Title"), TypeId::STRING, title, true),
    ];
    let mut decl = type_decl(settings, name, TypeDeclKind::Class, members);
    decl.is_static = true;
    b.add_type(decl);
    let units = vec![b.finish("Settings.cs")];

    let output = Compilation::new(&sema, &units, options(ScriptType::Module), interner.clone()).compile();
    let luau = &output.units[0].luau;
    let volume = luau.find("Settings.Volume = 7").unwrap();
    let title = luau.find("Settings.Title = \"moon\"").unwrap();
    let global = luau.find("CS.defineGlobal(\"Settings\", Settings)").unwrap();
    let exports = luau.find("return {").unwrap();
    assert!(volume < title && title < global && global < exports, "{luau}");
}

#[test]
fn list_pattern_with_rest_slices_the_middle() {
    let interner = SharedInterner::new();
    let mut sema = SemanticModel::new();
    let ints = sema.types.array(TypeId::INT);
    let mut b = AstBuilder::new(&interner);

    let xs = b.local("xs", ints);
    let one = b.int(1);
    let three = b.int(3);
    let four = b.int(4);
    let head = vec![b.constant_pattern(one)];
    let tail = vec![b.constant_pattern(three), b.constant_pattern(four)];
    let pattern = b.pattern(PatternKind::List {
        head,
        slice: Some(SlicePattern {
            binding: Some(b.name("rest")),
        }),
        tail,
        binding: None,
    });
    let test = b.expr(ExprKind::Is { expr: xs, pattern }, TypeId::BOOL);
    let r = b.local("r", ints);
    let rest = b.local("rest", ints);
    let assign = b.assign(r, rest);
    let assign = b.expr_stmt(assign);
    let then = b.block(&[assign]);
    let stmt = b.if_(test, then, None);
    b.top_level(stmt);
    let units = vec![b.finish("Match.cs")];

    let output = Compilation::new(&sema, &units, options(ScriptType::Script), interner.clone()).compile();
    let luau = &output.units[0].luau;
    assert!(
        luau.contains(
            "if type(xs) == \"table\" and #xs >= 3 and xs[1] == 1 and xs[#xs - 1] == 3 and xs[#xs] == 4 then\n  rest = CS.slice(xs, 2, #xs - 2)\n"
        ),
        "{luau}"
    );
    assert!(luau.ends_with("if _matched then\n  r = rest\nend\n"), "{luau}");
}

#[test]
fn try_finally_propagates_every_exit() {
    let interner = SharedInterner::new();
    let sema = SemanticModel::new();
    let mut b = AstBuilder::new(&interner);

    // while (running) { try { if (a) break; if (c) continue; return 1; } finally { n = 0; } }
    let brk = b.stmt(StmtKind::Break);
    let a = b.local("a", TypeId::BOOL);
    let on_a = b.if_(a, brk, None);
    let cont = b.stmt(StmtKind::Continue);
    let c = b.local("c", TypeId::BOOL);
    let on_c = b.if_(c, cont, None);
    let one = b.int(1);
    let ret = b.ret(Some(one));
    let body = b.block(&[on_a, on_c, ret]);
    let n = b.local("n", TypeId::INT);
    let zero = b.int(0);
    let reset = b.assign(n, zero);
    let reset = b.expr_stmt(reset);
    let finally = b.block(&[reset]);
    let try_stmt = b.stmt(StmtKind::Try {
        body,
        catches: Vec::new(),
        finally,
    });
    let loop_body = b.block(&[try_stmt]);
    let running = b.local("running", TypeId::BOOL);
    let lp = b.while_(running, loop_body);
    b.top_level(lp);
    let units = vec![b.finish("Loop.cs")];

    let output = Compilation::new(&sema, &units, options(ScriptType::Script), interner.clone()).compile();
    let luau = &output.units[0].luau;
    assert!(luau.contains("local _exitKind, _exitValue = CS.try(function()"), "{luau}");
    assert!(luau.contains("return CS.TRY_BREAK"), "{luau}");
    assert!(luau.contains("return CS.TRY_CONTINUE"), "{luau}");
    assert!(luau.contains("return CS.TRY_RETURN, 1"), "{luau}");
    assert!(luau.contains("  end, nil, function()\n    n = 0\n  end)"), "{luau}");
    assert!(
        luau.contains("  if _exitKind == CS.TRY_RETURN then\n    return _exitValue\n  end\n"),
        "{luau}"
    );
    assert!(luau.contains("  if _exitKind == CS.TRY_BREAK then\n    break\n  end\n"), "{luau}");
    assert!(luau.contains("  if _exitKind == CS.TRY_CONTINUE then\n    continue\n  end\n"), "{luau}");
}

#[test]
fn foreach_dispatches_on_the_source_shape() {
    let interner = SharedInterner::new();
    let mut sema = SemanticModel::new();
    let ints = sema.types.array(TypeId::INT);
    let mut b = AstBuilder::new(&interner);

    let each = |b: &mut AstBuilder<'_>, var: &str, source: ExprId| {
        let binding = ForEachBinding::Single {
            name: b.name(var),
            ty: TypeId::INT,
        };
        let body = b.block(&[]);
        let stmt = b.stmt(StmtKind::ForEach {
            binding,
            source,
            body,
        });
        b.top_level(stmt);
    };
    let lo = b.int(0);
    let hi = b.int(9);
    let range = b.range(lo, hi, None, TypeId::INT);
    each(&mut b, "i", range);
    let xs = b.local("xs", ints);
    each(&mut b, "x", xs);
    let word = b.local("word", TypeId::STRING);
    each(&mut b, "ch", word);
    let units = vec![b.finish("Loops.cs")];

    let output = Compilation::new(&sema, &units, options(ScriptType::Script), interner.clone()).compile();
    assert_eq!(
        output.units[0].luau,
        format!(
            "{HEADER}\
             for i = 0, 9 do\n\
             end\n\
             \n\
             for _index, x in ipairs(xs) do\n\
             end\n\
             \n\
             for ch in string.gmatch(word, \".\") do\n\
             end\n"
        )
    );
}

#[test]
fn failing_unit_reports_a_diagnostic_and_others_still_compile() {
    let interner = SharedInterner::new();
    let mut sema = SemanticModel::new();
    let good = point_unit(&interner, &mut sema);

    let name = interner.intern("Pair");
    let (pair, _) = sema.declare_type(name, TypeDeclKind::Class, None);
    let ctor = |span: Span| MethodDecl {
        symbol: SymbolId::NONE,
        name,
        type_params: Vec::new(),
        params: Vec::new(),
        ret: TypeId::VOID,
        body: MethodBody::None,
        is_static: false,
        is_async: false,
        attributes: Vec::new(),
        ctor_initializer: None,
        span,
    };
    let mut b = AstBuilder::new(&interner);
    b.add_type(type_decl(
        pair,
        name,
        TypeDeclKind::Class,
        vec![
            Member::Constructor(ctor(Span::new(0, 10))),
            Member::Constructor(ctor(Span::new(12, 30))),
        ],
    ));
    let bad = b.finish("Pair.cs");
    let units = vec![good, bad];

    let output = Compilation::new(&sema, &units, options(ScriptType::Module), interner.clone()).compile();
    assert!(!output.is_ok());
    assert!(output.unit("Point.cs").is_some());
    assert!(output.unit("Pair.cs").is_none());
    assert_eq!(output.errors.len(), 1);
    assert_eq!(output.errors[0].unit, "Pair.cs");

    let mut emitter = TextEmitter::new(Vec::new());
    output.emit_diagnostics(&mut emitter);
    assert_eq!(emitter.error_count(), 1);
    let text = String::from_utf8(emitter.into_inner()).unwrap();
    assert!(text.contains("Pair.cs @ 12..30"), "{text}");
}

#[test]
fn batch_compilations_are_isolated_and_ordered() {
    let interner = SharedInterner::new();
    let mut first_sema = SemanticModel::new();
    let first_units = vec![point_unit(&interner, &mut first_sema)];
    let second_sema = SemanticModel::new();
    let mut b = AstBuilder::new(&interner);
    let hello = b.string("hello");
    let stmt = b.let_("greeting", TypeId::STRING, Some(hello));
    b.top_level(stmt);
    let second_units = vec![b.finish("Greeting.cs")];

    let jobs = [
        Job {
            sema: &first_sema,
            units: &first_units,
            options: options(ScriptType::Module),
        },
        Job {
            sema: &second_sema,
            units: &second_units,
            options: options(ScriptType::Script),
        },
    ];
    let outputs = compile_batch(&jobs, &interner);
    assert_eq!(outputs.len(), 2);
    assert_eq!(outputs[0].units[0].name, "Point.cs");
    assert_eq!(
        outputs[1].units[0].luau,
        format!("{HEADER}local greeting = \"hello\"\n")
    );

    // Sequential compilation yields the same text.
    let again = Compilation::new(&first_sema, &first_units, options(ScriptType::Module), interner.clone()).compile();
    assert_eq!(again.units, outputs[0].units);
}

#[test]
fn registry_is_rebuilt_for_each_compile() {
    let interner = SharedInterner::new();
    let mut sema = SemanticModel::new();
    let units = vec![point_unit(&interner, &mut sema)];
    let mut compilation = Compilation::new(&sema, &units, options(ScriptType::Module), interner.clone());

    let first = compilation.compile();
    assert_eq!(compilation.registry().len(), 1);
    let second = compilation.compile();
    assert_eq!(compilation.registry().len(), 1);
    assert_eq!(first.units, second.units);
}
