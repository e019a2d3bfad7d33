//! Classes, records and structs with behaviour.
//!
//! ```text
//! local Foo
//! do
//!   Foo = setmetatable({}, { __index = Base, __tostring = function() return "Foo" end })
//!   Foo.__index = Foo
//!   function Foo.new(...)
//!     local self = setmetatable({}, Foo)
//!     return self:constructor(...) or self
//!   end
//!   function Foo:constructor(..) .. end
//!   <methods and accessors>
//!   <metadata, static initializers, static constructor>
//! end
//! CS.defineGlobal("Foo", Foo)
//! ```

use moon_diagnostic::{LowerError, LowerResult};
use moon_ir::ast::{CtorInitializer, Member, MethodBody, MethodDecl, Param, PropertyDecl, TypeDecl};
use moon_ir::luau::{BinOp, Binding, Block, Expr, Function, FunctionName, Stmt, TableField};
use moon_ir::{ExprId, Name, TypeId};

use crate::control_flow::generators::contains_yield;
use crate::control_flow::Frame;
use crate::lower::{Callable, Lowerer};

impl Lowerer<'_> {
    pub(super) fn lower_class(&mut self, decl: &TypeDecl, name: Name, out: &mut Vec<Stmt>) -> LowerResult<()> {
        let ctors: Vec<&MethodDecl> = decl
            .members
            .iter()
            .filter_map(|m| match m {
                Member::Constructor(ctor) => Some(ctor),
                _ => None,
            })
            .collect();
        if let Some(second) = ctors.get(1) {
            return Err(LowerError::unsupported("constructor overloads", second.span));
        }
        let ctor = ctors.first().copied();
        if let Some(ctor) = ctor {
            if let Some(CtorInitializer::This(_)) = ctor.ctor_initializer {
                return Err(LowerError::unsupported("`this(..)` constructor chaining", ctor.span));
            }
        }

        out.push(Stmt::local_uninit(vec![name]));
        let mut body = Vec::new();
        body.push(Stmt::assign(Expr::Ident(name), self.class_table(name)));

        if !decl.is_static {
            let table = Expr::Ident(name);
            body.push(Stmt::assign(
                table.member(self.names.index_meta),
                Expr::Ident(name),
            ));
            body.push(self.new_function(name));
            body.push(self.lower_constructor(decl, name, ctor)?);
        }

        for member in &decl.members {
            match member {
                Member::Method(method) => self.lower_method(decl, name, method, &mut body)?,
                Member::Property(prop) if !prop.is_auto() => {
                    self.lower_accessors(name, prop, &mut body)?;
                }
                _ => {}
            }
        }

        self.metadata_fields(decl, name, &mut body);
        self.static_initializers(decl, name, &mut body)?;
        self.static_constructor(decl, &mut body)?;

        out.push(Stmt::Do(Block::new(body)));
        out.push(self.define_global(name));
        Ok(())
    }

    /// `setmetatable({}, { __index = Base, __tostring = function() return "Foo" end })`
    fn class_table(&self, name: Name) -> Expr {
        let mut meta = Vec::new();
        if let Some(base) = self.scope.and_then(|s| s.base) {
            meta.push(TableField::Named(self.names.index_meta, Expr::Ident(base)));
        }
        let tostring = Function {
            body: Block::new(vec![Stmt::ret(Expr::string(self.text(name)))]),
            ..Function::default()
        };
        meta.push(TableField::Named(
            self.names.tostring_meta,
            Expr::function(tostring),
        ));
        self.global_call(
            self.names.setmetatable,
            vec![Expr::Table(Vec::new()), Expr::Table(meta)],
        )
    }

    /// `function Foo.new(...)`
    fn new_function(&self, name: Name) -> Stmt {
        let this = self.names.self_;
        let instance = self.global_call(
            self.names.setmetatable,
            vec![Expr::Table(Vec::new()), Expr::Ident(name)],
        );
        let construct = Expr::Ident(this).method_call(self.names.constructor, vec![Expr::Vararg]);
        let func = Function {
            variadic: Some(None),
            body: Block::new(vec![
                Stmt::local(this, instance),
                Stmt::ret(Expr::binary(BinOp::Or, construct, Expr::Ident(this))),
            ]),
            ..Function::default()
        };
        Stmt::FunctionDecl {
            name: FunctionName {
                path: vec![name, self.names.new],
                method: None,
            },
            func,
        }
    }

    /// `function Foo:constructor(..)`: instance initializers, the base
    /// constructor, then the body.
    fn lower_constructor(
        &mut self,
        decl: &TypeDecl,
        name: Name,
        ctor: Option<&MethodDecl>,
    ) -> LowerResult<Stmt> {
        self.reset_temps();
        let params: &[Param] = ctor.map_or(&[], |c| c.params.as_slice());
        let (mut func, mut stmts) = self.lower_params(params)?;

        let this = self.self_expr();
        for member in &decl.members {
            let (member_name, value) = match member {
                Member::Field(field) if !field.is_static && !field.is_const => {
                    (field.name, self.initial_value(field.init, field.ty, &mut stmts)?)
                }
                Member::Property(prop) if !prop.is_static && prop.is_auto() => {
                    (prop.name, self.initial_value(prop.init, prop.ty, &mut stmts)?)
                }
                Member::Event(event) if !event.is_static => (event.name, self.new_signal()),
                _ => continue,
            };
            if value != Expr::Nil {
                stmts.push(Stmt::assign(this.clone().member(member_name), value));
            }
        }

        if let Some(base) = self.scope.and_then(|s| s.base) {
            let base_args: &[ExprId] = match ctor.and_then(|c| c.ctor_initializer) {
                Some(CtorInitializer::Base(args)) => self.arena.expr_list(args),
                _ => &[],
            };
            let mut args = vec![this];
            args.extend(self.ordered(base_args, &mut stmts)?);
            stmts.push(Stmt::Expr(
                Expr::Ident(base)
                    .member(self.names.constructor)
                    .call(args),
            ));
        }

        if let Some(MethodBody::Block(body)) = ctor.map(|c| c.body) {
            let frame = Frame::Function { generator: false };
            let (block, _) = self.with_frame(frame, |this| this.lower_block(body))?;
            stmts.extend(block.stmts);
        }
        if !matches!(stmts.last(), Some(Stmt::Return(_))) {
            stmts.push(Stmt::ret(Expr::Nil));
        }
        func.body = Block::new(stmts);

        Ok(Stmt::FunctionDecl {
            name: FunctionName {
                path: vec![name],
                method: Some(self.names.constructor),
            },
            func,
        })
    }

    fn lower_method(
        &mut self,
        decl: &TypeDecl,
        name: Name,
        method: &MethodDecl,
        out: &mut Vec<Stmt>,
    ) -> LowerResult<()> {
        if matches!(method.body, MethodBody::None) {
            return Ok(());
        }
        self.reset_temps();
        tracing::debug!(method = self.text(method.name), "lowering method");

        let is_generator = self.registry.is_generator(decl.symbol, method.symbol)
            || matches!(method.body, MethodBody::Block(body) if contains_yield(self.arena, body));
        let mut func = self.lower_callable(Callable {
            params: &method.params,
            body: method.body,
            ret: method.ret,
            is_generator,
            annotate_return: !method.is_async && !is_generator,
        })?;
        func.type_params.clone_from(&method.type_params);

        if method.is_async {
            if !method.is_static {
                func.params.insert(0, Binding::new(self.names.self_));
            }
            out.push(Stmt::assign(
                Expr::Ident(name).member(method.name),
                self.wrap_async(func),
            ));
            return Ok(());
        }

        out.push(Self::member_function(name, method.name, method.is_static, func));
        Ok(())
    }

    /// `function Foo:get_X(): T` / `function Foo:set_X(value: T)`
    fn lower_accessors(&mut self, name: Name, prop: &PropertyDecl, out: &mut Vec<Stmt>) -> LowerResult<()> {
        if let Some(getter @ (MethodBody::Block(_) | MethodBody::Expr(_))) = prop.getter {
            self.reset_temps();
            let func = self.lower_callable(Callable {
                params: &[],
                body: getter,
                ret: prop.ty,
                is_generator: false,
                annotate_return: true,
            })?;
            let accessor = self.accessor("get_", prop.name);
            out.push(Self::member_function(name, accessor, prop.is_static, func));
        }
        if let Some(setter @ (MethodBody::Block(_) | MethodBody::Expr(_))) = prop.setter {
            self.reset_temps();
            let params = [Param {
                name: self.interner.intern("value"),
                ty: prop.ty,
                default: ExprId::INVALID,
                is_params: false,
            }];
            let func = self.lower_callable(Callable {
                params: &params,
                body: setter,
                ret: TypeId::VOID,
                is_generator: false,
                annotate_return: false,
            })?;
            let accessor = self.accessor("set_", prop.name);
            out.push(Self::member_function(name, accessor, prop.is_static, func));
        }
        Ok(())
    }

    /// `function T.m(..)` for statics, `function T:m(..)` otherwise.
    fn member_function(owner: Name, member: Name, is_static: bool, func: Function) -> Stmt {
        let name = if is_static {
            FunctionName {
                path: vec![owner, member],
                method: None,
            }
        } else {
            FunctionName {
                path: vec![owner],
                method: Some(member),
            }
        };
        Stmt::FunctionDecl { name, func }
    }
}
