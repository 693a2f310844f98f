//! Expression resolution and constant folding
//!
//! Every `resolve_*` function returns the handle that should replace the
//! resolved node in its parent: the node itself, or a freshly allocated
//! literal when the expression folded.

use log::trace;

use super::scope::ScopeId;
use super::Resolver;
use crate::frontend::ast::{
    BinaryOp, Expr, ExprId, Literal, Operand, PostfixOp, PrefixOp, Symbol, SymbolRef, VarId,
};
use crate::types::{RangeType, Type};
use crate::utils::{Error, ErrorKind, Result};

impl Resolver<'_> {
    pub(super) fn resolve_expr(&mut self, id: ExprId) -> Result<ExprId> {
        match self.program.expr(id).kind.clone() {
            Expr::Literal(literal) => Ok(self.typed(id, literal.ty())),
            Expr::Symbol(_) => self.resolve_symbol(id, self.symbols.current(), false),
            Expr::Prefix { op, inner } => self.resolve_prefix(id, op, inner),
            Expr::Postfix { op, inner } => self.resolve_postfix(id, op, inner),
            Expr::Binary { op, left, right } => self.resolve_binary(id, op, left, right),
            Expr::Conditional { cond, on_true, on_false } => self.resolve_conditional(id, cond, on_true, on_false),
            Expr::Collection { items } => self.resolve_collection(id, items),
            Expr::Var(var) => self.resolve_local_var(id, var),
        }
    }

    // ==================== Helpers ====================

    /// Resolved type; `Void` only for nodes not yet resolved
    pub(super) fn expr_type(&self, id: ExprId) -> Type {
        self.program.type_of(id).cloned().unwrap_or(Type::Void)
    }

    pub(super) fn describe_expr(&self, id: ExprId) -> String {
        self.program.describe(&self.expr_type(id))
    }

    pub(super) fn expr_error(&self, id: ExprId, kind: ErrorKind) -> Error {
        self.error(self.program.expr(id).line, kind)
    }

    fn typed(&mut self, id: ExprId, ty: Type) -> ExprId {
        self.program.expr_mut(id).ty = Some(ty);
        id
    }

    /// Allocate a literal replacing `at`
    fn fold(&mut self, at: ExprId, literal: Literal) -> ExprId {
        let line = self.program.expr(at).line;
        trace!("line {line}: folded to {literal:?}");
        let ty = literal.ty();
        let id = self.program.add_expr(line, Expr::Literal(literal));
        self.typed(id, ty)
    }

    /// Type `id` with `range`, folding a single value unless an operand
    /// has side effects
    fn finish_range(&mut self, id: ExprId, range: RangeType, operands: &[ExprId]) -> ExprId {
        match range.as_point() {
            Some(value) if !operands.iter().any(|&operand| self.has_side_effects(operand)) => {
                self.fold(id, Literal::Int(value))
            }
            _ => self.typed(id, Type::Range(range)),
        }
    }

    pub(super) fn set_binary(&mut self, id: ExprId, op: BinaryOp, left: ExprId, right: Operand) {
        self.program.expr_mut(id).kind = Expr::Binary { op, left, right };
    }

    fn int_literal(&self, id: ExprId) -> Option<i64> {
        match self.program.literal(id) {
            Some(Literal::Int(value)) => Some(*value),
            _ => None,
        }
    }

    fn bool_literal(&self, id: ExprId) -> Option<bool> {
        match self.program.literal(id) {
            Some(Literal::Bool(value)) => Some(*value),
            _ => None,
        }
    }

    /// The symbol a resolved name or member access refers to
    pub(super) fn symbol_of(&self, id: ExprId) -> Option<Symbol> {
        match &self.program.expr(id).kind {
            Expr::Symbol(reference) => reference.symbol.clone(),
            Expr::Binary { op: BinaryOp::Dot, right: Operand::Expr(member), .. } => self.symbol_of(*member),
            _ => None,
        }
    }

    /// Calls, assignments, increments, allocations and declarations
    fn has_side_effects(&self, id: ExprId) -> bool {
        match &self.program.expr(id).kind {
            Expr::Literal(_) | Expr::Symbol(_) => false,
            Expr::Var(_) => true,
            Expr::Prefix { op, inner } => {
                matches!(op, PrefixOp::Increment | PrefixOp::Decrement | PrefixOp::New) || self.has_side_effects(*inner)
            }
            Expr::Postfix { op, inner } => op != &PostfixOp::Bang || self.has_side_effects(*inner),
            Expr::Binary { op, left, right } => {
                if *op == BinaryOp::Call || op.is_assignment() {
                    return true;
                }
                self.has_side_effects(*left)
                    || match right {
                        Operand::None => false,
                        Operand::Expr(right) => self.has_side_effects(*right),
                        Operand::Args(args) => args.iter().any(|&arg| self.has_side_effects(arg)),
                    }
            }
            Expr::Conditional { cond, on_true, on_false } => {
                [*cond, *on_true, *on_false].iter().any(|&e| self.has_side_effects(e))
            }
            Expr::Collection { items } => items.iter().any(|&item| self.has_side_effects(item)),
        }
    }

    // ==================== Names ====================

    /// Look `id` up in `scope` (members only when `member`), memoizing the
    /// symbol. Constants with literal values are inlined unless looked up
    /// in an enum.
    fn resolve_symbol(&mut self, id: ExprId, scope: ScopeId, member: bool) -> Result<ExprId> {
        let Expr::Symbol(SymbolRef { name, symbol }) = self.program.expr(id).kind.clone() else {
            return Err(self.expr_error(id, ErrorKind::invalid_expression("expected a name")));
        };
        let symbol = match symbol {
            Some(symbol) => symbol,
            None => {
                let found = if member {
                    self.symbols.lookup_member(scope, &name)
                } else {
                    self.symbols.lookup_from(scope, &name)
                };
                let symbol = found.cloned().ok_or_else(|| {
                    self.expr_error(id, ErrorKind::SymbolNotFound { name: name.clone() })
                })?;
                self.program.expr_mut(id).kind = Expr::Symbol(SymbolRef { name: name.clone(), symbol: Some(symbol.clone()) });
                symbol
            }
        };

        let ty = match symbol {
            Symbol::Const(konst) => {
                self.resolve_const(konst)?;
                let k = self.program.constant(konst);
                if !self.symbols.is_enum(scope) {
                    if let Some(literal) = k.value.and_then(|value| self.program.literal(value)).cloned() {
                        return Ok(self.fold(id, literal));
                    }
                }
                k.ty.clone()
            }
            Symbol::Field(field) => self.program.field(field).ty.clone(),
            Symbol::Method(method) => self.program.method(method).ty.clone(),
            Symbol::Var(var) => self.program.var(var).ty.clone(),
            Symbol::StringLength => Some(Type::length()),
            Symbol::Type(_) | Symbol::Class(_) | Symbol::Enum(_) => {
                return Err(self.expr_error(id, ErrorKind::invalid_expression(format!("{name} is a type"))));
            }
        };
        // declared types are resolved after constants
        let ty = ty.ok_or_else(|| self.expr_error(id, ErrorKind::ExpectedConstant))?;
        Ok(self.typed(id, ty))
    }

    /// Scope of a class or enum named by `id`, for static member access
    fn static_scope(&mut self, id: ExprId) -> Result<Option<ScopeId>> {
        let Expr::Symbol(SymbolRef { name, symbol }) = self.program.expr(id).kind.clone() else {
            return Ok(None);
        };
        let symbol = match symbol {
            Some(symbol) => Some(symbol),
            None => self.symbols.lookup(&name).cloned(),
        };
        let (scope, ty) = match symbol {
            Some(Symbol::Class(class)) => (self.class_scopes[class.index()], Type::ClassStorage(class)),
            Some(Symbol::Enum(e)) => (self.enum_scopes[e.index()], Type::Enum(e)),
            _ => return Ok(None),
        };
        self.program.expr_mut(id).kind = Expr::Symbol(SymbolRef { name, symbol: symbol.clone() });
        self.typed(id, ty);
        Ok(Some(scope))
    }

    // ==================== Unary ====================

    fn resolve_prefix(&mut self, id: ExprId, op: PrefixOp, inner: ExprId) -> Result<ExprId> {
        if op == PrefixOp::New {
            return self.resolve_new(id, inner);
        }
        if matches!(op, PrefixOp::Less | PrefixOp::LessOrEqual) {
            return Err(self.expr_error(id, ErrorKind::invalid_expression("range type in expression")));
        }

        let inner = self.resolve_expr(inner)?;
        self.program.expr_mut(id).kind = Expr::Prefix { op, inner };
        let ty = self.expr_type(inner);
        match op {
            PrefixOp::Increment | PrefixOp::Decrement => {
                self.require_numeric(inner, &ty)?;
                self.check_lvalue(inner)?;
                let delta = if op == PrefixOp::Increment { 1 } else { -1 };
                let ty = ty.as_range().map_or(ty, |range| Type::Range(range.offset(delta)));
                Ok(self.typed(id, ty))
            }
            PrefixOp::Minus => {
                self.require_numeric(inner, &ty)?;
                if let Some(Literal::Double(value)) = self.program.literal(inner) {
                    let value = -*value;
                    return Ok(self.fold(id, Literal::Double(value)));
                }
                Ok(match ty.as_range() {
                    Some(range) => self.finish_range(id, range.neg(), &[inner]),
                    None => self.typed(id, ty),
                })
            }
            PrefixOp::Tilde => {
                if !ty.is_integer() {
                    return Err(self.expr_error(inner, ErrorKind::type_mismatch("integer", self.program.describe(&ty))));
                }
                Ok(match ty.as_range() {
                    Some(range) => self.finish_range(id, range.complement(), &[inner]),
                    None => self.typed(id, ty),
                })
            }
            PrefixOp::Not => {
                self.coerce(inner, &Type::Bool)?;
                Ok(match self.bool_literal(inner) {
                    Some(value) => self.fold(id, Literal::Bool(!value)),
                    None => self.typed(id, Type::Bool),
                })
            }
            PrefixOp::New | PrefixOp::Less | PrefixOp::LessOrEqual => {
                Err(self.expr_error(id, ErrorKind::invalid_expression("unexpected prefix operator")))
            }
        }
    }

    /// `new T()` or `new T[n]`
    fn resolve_new(&mut self, id: ExprId, inner: ExprId) -> Result<ExprId> {
        if let Expr::Binary { op: BinaryOp::Index, left, right: Operand::Expr(length) } = self.program.expr(inner).kind {
            let element = self.to_type(left)?;
            let length = self.resolve_expr(length)?;
            self.set_binary(inner, BinaryOp::Index, left, Operand::Expr(length));
            let length_ty = self.expr_type(length);
            if !length_ty.is_integer() || length_ty.is_long() {
                return Err(self.expr_error(length, ErrorKind::type_mismatch("int", self.program.describe(&length_ty))));
            }
            let ty = Type::ArrayPointer { element: Box::new(element), mutable: true };
            self.typed(inner, ty.clone());
            return Ok(self.typed(id, ty));
        }
        match self.to_type(inner)? {
            Type::ClassStorage(class) => Ok(self.typed(id, Type::ClassPointer { class, mutable: true })),
            other => {
                let kind = ErrorKind::type_mismatch("class or array", self.program.describe(&other));
                Err(self.expr_error(inner, kind))
            }
        }
    }

    fn resolve_postfix(&mut self, id: ExprId, op: PostfixOp, inner: ExprId) -> Result<ExprId> {
        if op == PostfixOp::Bang {
            return Err(self.expr_error(id, ErrorKind::invalid_expression("unexpected '!'")));
        }
        let inner = self.resolve_expr(inner)?;
        self.program.expr_mut(id).kind = Expr::Postfix { op, inner };
        let ty = self.expr_type(inner);
        self.require_numeric(inner, &ty)?;
        self.check_lvalue(inner)?;
        Ok(self.typed(id, ty))
    }

    fn require_numeric(&self, id: ExprId, ty: &Type) -> Result<()> {
        if ty.is_numeric() {
            Ok(())
        } else {
            Err(self.expr_error(id, ErrorKind::type_mismatch("numeric", self.program.describe(ty))))
        }
    }

    /// Assignable places: variables, fields and array elements
    fn check_lvalue(&self, id: ExprId) -> Result<()> {
        let assignable = match &self.program.expr(id).kind {
            Expr::Symbol(_) | Expr::Binary { op: BinaryOp::Dot, .. } => {
                matches!(self.symbol_of(id), Some(Symbol::Var(_) | Symbol::Field(_)))
            }
            Expr::Binary { op: BinaryOp::Index, left, .. } => self.expr_type(*left).is_array(),
            _ => false,
        };
        if assignable {
            Ok(())
        } else {
            Err(self.expr_error(id, ErrorKind::invalid_expression("cannot assign to this expression")))
        }
    }

    // ==================== Binary ====================

    fn resolve_binary(&mut self, id: ExprId, op: BinaryOp, left: ExprId, right: Operand) -> Result<ExprId> {
        match op {
            BinaryOp::Dot => return self.resolve_dot(id, left, right),
            BinaryOp::Call => return self.resolve_call(id, left, right),
            _ => {}
        }
        let Operand::Expr(right) = right else {
            let reason = if op == BinaryOp::Index { "missing index" } else { "missing operand" };
            return Err(self.expr_error(id, ErrorKind::invalid_expression(reason)));
        };
        let left = self.resolve_expr(left)?;
        let right = self.resolve_expr(right)?;
        self.set_binary(id, op, left, Operand::Expr(right));

        match op {
            BinaryOp::Index => self.resolve_index(id, left, right),
            BinaryOp::Equal | BinaryOp::NotEqual => self.resolve_equality(id, op, left, right),
            _ if op.is_relational() => self.resolve_relational(id, op, left, right),
            BinaryOp::CondAnd | BinaryOp::CondOr => self.resolve_logical(id, op, left, right),
            _ if op.is_assignment() => self.resolve_assignment(id, op, left, right),
            _ => self.resolve_arithmetic(id, op, left, right),
        }
    }

    fn resolve_arithmetic(&mut self, id: ExprId, op: BinaryOp, left: ExprId, right: ExprId) -> Result<ExprId> {
        let (left_ty, right_ty) = (self.expr_type(left), self.expr_type(right));

        if op == BinaryOp::Add && (left_ty.is_string() || right_ty.is_string()) {
            if let (Some(a), Some(b)) = (self.program.literal(left), self.program.literal(right)) {
                let text = a.concat_text() + &b.concat_text();
                return Ok(self.fold(id, Literal::String(text)));
            }
            return Ok(self.typed(id, Type::StringPointer));
        }

        if let (Some(a), Some(b), Some(int_op)) = (left_ty.as_range(), right_ty.as_range(), op.int_op()) {
            let range = RangeType::apply(int_op, a, b).map_err(|kind| self.expr_error(id, kind))?;
            return Ok(self.finish_range(id, range, &[left, right]));
        }

        let ty = if op.is_integer_only() {
            for (operand, ty) in [(left, &left_ty), (right, &right_ty)] {
                if !ty.is_integer() {
                    return Err(self.expr_error(operand, ErrorKind::type_mismatch("integer", self.program.describe(ty))));
                }
            }
            Type::integer_result(&left_ty, &right_ty)
        } else {
            self.require_numeric(left, &left_ty)?;
            self.require_numeric(right, &right_ty)?;
            Type::numeric_result(&left_ty, &right_ty)
        };
        Ok(self.typed(id, ty))
    }

    fn resolve_equality(&mut self, id: ExprId, op: BinaryOp, left: ExprId, right: ExprId) -> Result<ExprId> {
        let (left_ty, right_ty) = (self.expr_type(left), self.expr_type(right));
        let comparable = Type::unify(&left_ty, &right_ty).is_some()
            || super::is_assignable(self.program, &left_ty, &right_ty)
            || super::is_assignable(self.program, &right_ty, &left_ty);
        if !comparable {
            let kind = ErrorKind::type_mismatch(self.program.describe(&left_ty), self.program.describe(&right_ty));
            return Err(self.expr_error(right, kind));
        }

        let equal = match (self.program.literal(left), self.program.literal(right)) {
            (Some(Literal::Double(a)), Some(Literal::Int(b))) | (Some(Literal::Int(b)), Some(Literal::Double(a))) => {
                Some(*a == *b as f64)
            }
            (Some(a), Some(b)) => Some(a == b),
            _ => match (left_ty.as_range(), right_ty.as_range()) {
                (Some(a), Some(b)) if a.max < b.min || b.max < a.min => Some(false),
                _ => None,
            },
        };
        self.finish_comparison(id, left, right, equal.map(|equal| equal == (op == BinaryOp::Equal)))
    }

    fn resolve_relational(&mut self, id: ExprId, op: BinaryOp, left: ExprId, right: ExprId) -> Result<ExprId> {
        let (left_ty, right_ty) = (self.expr_type(left), self.expr_type(right));
        self.require_numeric(left, &left_ty)?;
        self.require_numeric(right, &right_ty)?;

        let decided = match (left_ty.as_range(), right_ty.as_range()) {
            (Some(a), Some(b)) => {
                // (always true, always false)
                let (yes, no) = match op {
                    BinaryOp::Less => (a.max < b.min, a.min >= b.max),
                    BinaryOp::LessOrEqual => (a.max <= b.min, a.min > b.max),
                    BinaryOp::Greater => (a.min > b.max, a.max <= b.min),
                    _ => (a.min >= b.max, a.max < b.min),
                };
                if yes {
                    Some(true)
                } else if no {
                    Some(false)
                } else {
                    None
                }
            }
            _ => match (self.number_literal(left), self.number_literal(right)) {
                (Some(a), Some(b)) => Some(match op {
                    BinaryOp::Less => a < b,
                    BinaryOp::LessOrEqual => a <= b,
                    BinaryOp::Greater => a > b,
                    _ => a >= b,
                }),
                _ => None,
            },
        };
        self.finish_comparison(id, left, right, decided)
    }

    fn number_literal(&self, id: ExprId) -> Option<f64> {
        match self.program.literal(id) {
            Some(Literal::Int(value)) => Some(*value as f64),
            Some(Literal::Double(value)) => Some(*value),
            _ => None,
        }
    }

    fn finish_comparison(&mut self, id: ExprId, left: ExprId, right: ExprId, decided: Option<bool>) -> Result<ExprId> {
        Ok(match decided {
            Some(value) if !self.has_side_effects(left) && !self.has_side_effects(right) => {
                self.fold(id, Literal::Bool(value))
            }
            _ => self.typed(id, Type::Bool),
        })
    }

    fn resolve_logical(&mut self, id: ExprId, op: BinaryOp, left: ExprId, right: ExprId) -> Result<ExprId> {
        self.coerce(left, &Type::Bool)?;
        self.coerce(right, &Type::Bool)?;
        let short_circuit = op == BinaryOp::CondOr;
        match (self.bool_literal(left), self.bool_literal(right)) {
            // `true || x`, `false && x`
            (Some(value), _) if value == short_circuit => Ok(self.fold(id, Literal::Bool(value))),
            // `false || x`, `true && x`
            (Some(_), _) => Ok(right),
            (None, _) => Ok(self.typed(id, Type::Bool)),
        }
    }

    fn resolve_assignment(&mut self, id: ExprId, op: BinaryOp, left: ExprId, right: ExprId) -> Result<ExprId> {
        self.check_lvalue(left)?;
        let (left_ty, right_ty) = (self.expr_type(left), self.expr_type(right));
        match op.compound_base() {
            None => self.coerce(right, &left_ty)?,
            Some(BinaryOp::Add) if left_ty.is_string() => {}
            Some(base) => {
                let integer_only = base.is_integer_only();
                for (operand, ty) in [(left, &left_ty), (right, &right_ty)] {
                    let ok = if integer_only { ty.is_integer() } else { ty.is_numeric() };
                    if !ok {
                        let expected = if integer_only { "integer" } else { "numeric" };
                        return Err(self.expr_error(operand, ErrorKind::type_mismatch(expected, self.program.describe(ty))));
                    }
                }
                if let (Some(a), Some(b), Some(int_op)) = (left_ty.as_range(), right_ty.as_range(), base.int_op()) {
                    // surfaces division and modulo by a provable zero
                    RangeType::apply(int_op, a, b).map_err(|kind| self.expr_error(id, kind))?;
                }
            }
        }
        Ok(self.typed(id, left_ty))
    }

    fn resolve_index(&mut self, id: ExprId, left: ExprId, right: ExprId) -> Result<ExprId> {
        let index_ty = self.expr_type(right);
        if !index_ty.is_integer() || index_ty.is_long() {
            return Err(self.expr_error(right, ErrorKind::IndexNotInt32));
        }
        let ty = self.expr_type(left);
        if let Some(element) = ty.element() {
            let element = element.clone();
            return Ok(self.typed(id, element));
        }
        if !ty.is_string() {
            let kind = ErrorKind::type_mismatch("array or string", self.program.describe(&ty));
            return Err(self.expr_error(left, kind));
        }
        if let (Some(Literal::String(text)), Some(index)) = (self.program.literal(left), self.int_literal(right)) {
            let c = usize::try_from(index).ok().and_then(|i| text.chars().nth(i));
            if let Some(c) = c {
                return Ok(self.fold(id, Literal::Int(c as i64)));
            }
        }
        Ok(self.typed(id, Type::Char))
    }

    // ==================== Members and Calls ====================

    fn resolve_dot(&mut self, id: ExprId, left: ExprId, right: Operand) -> Result<ExprId> {
        let Operand::Expr(member) = right else {
            return Err(self.expr_error(id, ErrorKind::invalid_expression("expected member name")));
        };
        let member_name = match &self.program.expr(member).kind {
            Expr::Symbol(reference) => reference.name.clone(),
            _ => return Err(self.expr_error(member, ErrorKind::invalid_expression("expected member name"))),
        };

        if let Some(scope) = self.static_scope(left)? {
            let resolved = self.resolve_symbol(member, scope, true)?;
            if resolved != member {
                return Ok(resolved);
            }
            let ty = self.expr_type(member);
            return Ok(self.typed(id, ty));
        }

        let left = self.resolve_expr(left)?;
        self.set_binary(id, BinaryOp::Dot, left, Operand::Expr(member));
        let left_ty = self.expr_type(left);

        if left_ty.is_string() && member_name == "Length" {
            if let Some(Literal::String(text)) = self.program.literal(left) {
                let length = text.chars().count() as i64;
                return Ok(self.fold(id, Literal::Int(length)));
            }
            self.program.expr_mut(member).kind =
                Expr::Symbol(SymbolRef { name: member_name, symbol: Some(Symbol::StringLength) });
            self.typed(member, Type::length());
            return Ok(self.typed(id, Type::length()));
        }
        if let (Type::ArrayStorage { length, .. }, "Length") = (&left_ty, member_name.as_str()) {
            let length = *length as i64;
            return Ok(self.fold(id, Literal::Int(length)));
        }
        let Some(class) = left_ty.class() else {
            let kind = ErrorKind::SymbolNotFound { name: member_name };
            return Err(self.expr_error(member, kind));
        };

        let resolved = self.resolve_symbol(member, self.class_scopes[class.index()], true)?;
        if resolved != member {
            return Ok(resolved);
        }
        let ty = self.expr_type(member);
        Ok(self.typed(id, ty))
    }

    fn resolve_call(&mut self, id: ExprId, callee: ExprId, args: Operand) -> Result<ExprId> {
        let Operand::Args(args) = args else {
            return Err(self.expr_error(id, ErrorKind::invalid_expression("missing arguments")));
        };
        let callee = self.resolve_expr(callee)?;
        let Some(Symbol::Method(method)) = self.symbol_of(callee) else {
            return Err(self.expr_error(callee, ErrorKind::invalid_expression("not a method")));
        };

        let params = self.program.method(method).params.clone();
        if params.len() != args.len() {
            let kind = ErrorKind::ArgumentCountMismatch { expected: params.len(), got: args.len() };
            return Err(self.expr_error(id, kind));
        }
        let mut resolved = Vec::with_capacity(args.len());
        for (arg, param) in args.into_iter().zip(params) {
            let arg = self.resolve_expr(arg)?;
            let param_ty = self.program.var(param).ty.clone();
            let param_ty = param_ty.ok_or_else(|| self.expr_error(arg, ErrorKind::ExpectedConstant))?;
            self.coerce(arg, &param_ty)?;
            resolved.push(arg);
        }
        self.set_binary(id, BinaryOp::Call, callee, Operand::Args(resolved));
        let ty = self.program.method(method).ty.clone().unwrap_or(Type::Void);
        Ok(self.typed(id, ty))
    }

    // ==================== Other Expressions ====================

    fn resolve_conditional(&mut self, id: ExprId, cond: ExprId, on_true: ExprId, on_false: ExprId) -> Result<ExprId> {
        let cond = self.resolve_bool(cond)?;
        let on_true = self.resolve_expr(on_true)?;
        let on_false = self.resolve_expr(on_false)?;
        self.program.expr_mut(id).kind = Expr::Conditional { cond, on_true, on_false };
        let ty = self.unify(on_true, on_false)?;
        Ok(match self.bool_literal(cond) {
            Some(true) => on_true,
            Some(false) => on_false,
            None => self.typed(id, ty),
        })
    }

    fn unify(&self, left: ExprId, right: ExprId) -> Result<Type> {
        let (left_ty, right_ty) = (self.expr_type(left), self.expr_type(right));
        Type::unify(&left_ty, &right_ty).ok_or_else(|| {
            let kind = ErrorKind::type_mismatch(self.program.describe(&left_ty), self.program.describe(&right_ty));
            self.expr_error(right, kind)
        })
    }

    fn resolve_collection(&mut self, id: ExprId, items: Vec<ExprId>) -> Result<ExprId> {
        if items.is_empty() {
            return Err(self.expr_error(id, ErrorKind::invalid_expression("cannot infer type of an empty array")));
        }
        let mut resolved = Vec::with_capacity(items.len());
        for item in items {
            resolved.push(self.resolve_expr(item)?);
        }
        let mut element = self.expr_type(resolved[0]);
        for &item in &resolved[1..] {
            let item_ty = self.expr_type(item);
            element = Type::unify(&element, &item_ty).ok_or_else(|| {
                let kind = ErrorKind::type_mismatch(self.program.describe(&element), self.program.describe(&item_ty));
                self.expr_error(item, kind)
            })?;
        }
        let length = u32::try_from(resolved.len()).map_err(|_| self.expr_error(id, ErrorKind::IntegerTooBig))?;
        self.program.expr_mut(id).kind = Expr::Collection { items: resolved };
        Ok(self.typed(id, Type::ArrayStorage { element: Box::new(element), length }))
    }

    fn resolve_local_var(&mut self, id: ExprId, var: VarId) -> Result<ExprId> {
        let (name, type_expr, value) = {
            let v = self.program.var(var);
            (v.name.clone(), v.type_expr, v.value)
        };
        let ty = self.to_type(type_expr)?;
        if let Some(value) = value {
            let value = self.resolve_expr(value)?;
            self.coerce(value, &ty)?;
            self.program.var_mut(var).value = Some(value);
        }
        self.program.var_mut(var).ty = Some(ty.clone());
        self.symbols.define(&name, Symbol::Var(var)).map_err(|kind| self.expr_error(id, kind))?;
        Ok(self.typed(id, ty))
    }
}
