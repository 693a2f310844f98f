//! Abstract Syntax Tree definitions for Ci
//!
//! Nodes live in arenas owned by [`Program`] and are addressed by copyable
//! handles. The external parser builds a program through the constructors at
//! the bottom of this file; the resolver then attaches types and rewrites
//! parent handles when it folds a subtree into a literal.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::types::{IntOp, Type};

macro_rules! arena_id {
    ($($(#[$doc:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
            pub struct $name(pub u32);

            impl $name {
                pub fn index(self) -> usize {
                    self.0 as usize
                }
            }
        )*
    };
}

arena_id!(
    /// Source file
    FileId,
    ExprId,
    StmtId,
    ClassId,
    EnumId,
    ConstId,
    FieldId,
    MethodId,
    /// Local variable or method parameter
    VarId,
);

// ==================== Expressions ====================

/// Literal value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
}

impl Literal {
    pub fn ty(&self) -> Type {
        match self {
            Literal::Null => Type::Null,
            Literal::Bool(_) => Type::Bool,
            Literal::Int(value) => Type::range(*value, *value),
            Literal::Double(_) => Type::DOUBLE,
            Literal::String(_) => Type::StringPointer,
        }
    }

    /// Text used when the literal is concatenated to a string
    pub fn concat_text(&self) -> String {
        match self {
            Literal::Null => String::new(),
            Literal::Bool(b) => if *b { "True" } else { "False" }.to_string(),
            Literal::Int(value) => value.to_string(),
            Literal::Double(value) => value.to_string(),
            Literal::String(s) => s.clone(),
        }
    }
}

/// Prefix operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrefixOp {
    Increment,
    Decrement,
    Minus,
    /// Bitwise complement `~`
    Tilde,
    /// Logical not `!`
    Not,
    New,
    /// `<b` in a type position
    Less,
    /// `<=b` in a type position
    LessOrEqual,
}

/// Postfix operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostfixOp {
    Increment,
    Decrement,
    /// `T!` mutable pointer marker in a type position
    Bang,
}

/// Binary operators, including member access, calls, indexing and assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Dot,
    Call,
    Index,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Xor,
    ShiftLeft,
    ShiftRight,
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    CondAnd,
    CondOr,
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    AndAssign,
    OrAssign,
    XorAssign,
    ShiftLeftAssign,
    ShiftRightAssign,
}

impl BinaryOp {
    /// Interval operator for arithmetic and bitwise operators
    pub fn int_op(self) -> Option<IntOp> {
        Some(match self {
            Self::Add => IntOp::Add,
            Self::Sub => IntOp::Sub,
            Self::Mul => IntOp::Mul,
            Self::Div => IntOp::Div,
            Self::Mod => IntOp::Mod,
            Self::And => IntOp::And,
            Self::Or => IntOp::Or,
            Self::Xor => IntOp::Xor,
            Self::ShiftLeft => IntOp::ShiftLeft,
            Self::ShiftRight => IntOp::ShiftRight,
            _ => return None,
        })
    }

    /// Operator applied by a compound assignment (`+=` -> `+`)
    pub fn compound_base(self) -> Option<BinaryOp> {
        Some(match self {
            Self::AddAssign => Self::Add,
            Self::SubAssign => Self::Sub,
            Self::MulAssign => Self::Mul,
            Self::DivAssign => Self::Div,
            Self::ModAssign => Self::Mod,
            Self::AndAssign => Self::And,
            Self::OrAssign => Self::Or,
            Self::XorAssign => Self::Xor,
            Self::ShiftLeftAssign => Self::ShiftLeft,
            Self::ShiftRightAssign => Self::ShiftRight,
            _ => return None,
        })
    }

    pub fn is_assignment(self) -> bool {
        self == Self::Assign || self.compound_base().is_some()
    }

    /// Operators that only accept integer operands
    pub fn is_integer_only(self) -> bool {
        matches!(
            self,
            Self::Mod | Self::And | Self::Or | Self::Xor | Self::ShiftLeft | Self::ShiftRight
        )
    }

    pub fn is_relational(self) -> bool {
        matches!(self, Self::Less | Self::LessOrEqual | Self::Greater | Self::GreaterOrEqual)
    }
}

/// Right-hand side of a binary expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    /// `T[]` in a type position
    None,
    Expr(ExprId),
    /// Call arguments
    Args(Vec<ExprId>),
}

/// What a name resolved to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Symbol {
    /// Builtin scalar or string type
    Type(Type),
    Class(ClassId),
    Enum(EnumId),
    Const(ConstId),
    Field(FieldId),
    Method(MethodId),
    Var(VarId),
    StringLength,
}

/// Reference to a named symbol, memoized once looked up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolRef {
    pub name: String,
    #[serde(default)]
    pub symbol: Option<Symbol>,
}

/// Expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Literal(Literal),
    Symbol(SymbolRef),
    Prefix { op: PrefixOp, inner: ExprId },
    Postfix { op: PostfixOp, inner: ExprId },
    Binary { op: BinaryOp, left: ExprId, right: Operand },
    Conditional { cond: ExprId, on_true: ExprId, on_false: ExprId },
    Collection { items: Vec<ExprId> },
    /// Local variable declaration
    Var(VarId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprNode {
    pub kind: Expr,
    pub line: u32,
    /// Filled in by the resolver
    #[serde(default)]
    pub ty: Option<Type>,
}

// ==================== Statements ====================

/// Statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    Block(Vec<StmtId>),
    If { cond: ExprId, on_true: StmtId, on_false: Option<StmtId> },
    While { cond: ExprId, body: StmtId },
    DoWhile { body: StmtId, cond: ExprId },
    For {
        init: Option<ExprId>,
        cond: Option<ExprId>,
        advance: Option<ExprId>,
        body: StmtId,
    },
    Switch { value: ExprId, cases: Vec<Case>, default: Option<Vec<StmtId>> },
    Return(Option<ExprId>),
    Break,
    Continue,
    Throw(ExprId),
    Delete(ExprId),
    Expr(ExprId),
    Const(ConstId),
}

/// `case a: case b: body`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub values: Vec<ExprId>,
    pub body: Vec<StmtId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StmtNode {
    pub kind: Stmt,
    pub line: u32,
}

// ==================== Declarations ====================

/// Cycle-detection marker shared by classes and constants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VisitStatus {
    #[default]
    Unvisited,
    InProgress,
    Resolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Visibility {
    #[default]
    Private,
    Internal,
    Protected,
    Public,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CallType {
    Static,
    #[default]
    Normal,
    Abstract,
    Virtual,
    Override,
    Sealed,
}

/// Class definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Class {
    pub name: String,
    pub file: FileId,
    pub line: u32,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub call_type: CallType,
    pub base_name: Option<String>,
    /// Resolved base class
    #[serde(default)]
    pub base: Option<ClassId>,
    pub consts: Vec<ConstId>,
    pub fields: Vec<FieldId>,
    pub methods: Vec<MethodId>,
    #[serde(default)]
    pub status: VisitStatus,
}

/// Enum definition; its values are constants typed as the enum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enum {
    pub name: String,
    pub file: FileId,
    pub line: u32,
    #[serde(default)]
    pub is_public: bool,
    pub values: Vec<ConstId>,
}

/// Where a constant is declared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstOwner {
    Program(FileId),
    Class(ClassId),
    Enum(EnumId),
    /// Constant declared by a statement inside a method body
    Local,
}

/// Constant definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Const {
    pub name: String,
    pub line: u32,
    pub owner: ConstOwner,
    #[serde(default)]
    pub visibility: Visibility,
    pub type_expr: Option<ExprId>,
    /// Always present except for enumerators without an explicit value
    pub value: Option<ExprId>,
    #[serde(default)]
    pub status: VisitStatus,
    #[serde(default)]
    pub ty: Option<Type>,
}

/// Class field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub line: u32,
    #[serde(default)]
    pub visibility: Visibility,
    pub type_expr: ExprId,
    #[serde(default)]
    pub ty: Option<Type>,
}

/// Method definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    pub line: u32,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub call_type: CallType,
    #[serde(default)]
    pub is_mutator: bool,
    /// `None` for `void`
    pub type_expr: Option<ExprId>,
    pub params: Vec<VarId>,
    /// `None` for abstract methods
    pub body: Option<StmtId>,
    /// Resolved return type
    #[serde(default)]
    pub ty: Option<Type>,
}

/// Local variable or parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Var {
    pub name: String,
    pub line: u32,
    pub type_expr: ExprId,
    pub value: Option<ExprId>,
    #[serde(default)]
    pub ty: Option<Type>,
}

// ==================== Program ====================

/// A complete program: every source file of one compilation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub files: Vec<PathBuf>,
    pub exprs: Vec<ExprNode>,
    pub stmts: Vec<StmtNode>,
    pub classes: Vec<Class>,
    pub enums: Vec<Enum>,
    pub consts: Vec<Const>,
    pub fields: Vec<Field>,
    pub methods: Vec<Method>,
    pub vars: Vec<Var>,
    /// Top-level constants
    #[serde(default)]
    pub globals: Vec<ConstId>,
    /// Classes in base-before-derived order, filled in by the resolver
    #[serde(default)]
    pub ordered: Vec<ClassId>,
}

fn next_id(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    // ---------- accessors ----------

    pub fn expr(&self, id: ExprId) -> &ExprNode {
        &self.exprs[id.index()]
    }

    pub fn expr_mut(&mut self, id: ExprId) -> &mut ExprNode {
        &mut self.exprs[id.index()]
    }

    pub fn stmt(&self, id: StmtId) -> &StmtNode {
        &self.stmts[id.index()]
    }

    pub fn stmt_mut(&mut self, id: StmtId) -> &mut StmtNode {
        &mut self.stmts[id.index()]
    }

    pub fn class(&self, id: ClassId) -> &Class {
        &self.classes[id.index()]
    }

    pub fn class_mut(&mut self, id: ClassId) -> &mut Class {
        &mut self.classes[id.index()]
    }

    pub fn enumeration(&self, id: EnumId) -> &Enum {
        &self.enums[id.index()]
    }

    pub fn constant(&self, id: ConstId) -> &Const {
        &self.consts[id.index()]
    }

    pub fn constant_mut(&mut self, id: ConstId) -> &mut Const {
        &mut self.consts[id.index()]
    }

    pub fn field(&self, id: FieldId) -> &Field {
        &self.fields[id.index()]
    }

    pub fn field_mut(&mut self, id: FieldId) -> &mut Field {
        &mut self.fields[id.index()]
    }

    pub fn method(&self, id: MethodId) -> &Method {
        &self.methods[id.index()]
    }

    pub fn method_mut(&mut self, id: MethodId) -> &mut Method {
        &mut self.methods[id.index()]
    }

    pub fn var(&self, id: VarId) -> &Var {
        &self.vars[id.index()]
    }

    pub fn var_mut(&mut self, id: VarId) -> &mut Var {
        &mut self.vars[id.index()]
    }

    pub fn class_ids(&self) -> impl Iterator<Item = ClassId> {
        (0..next_id(self.classes.len())).map(ClassId)
    }

    pub fn enum_ids(&self) -> impl Iterator<Item = EnumId> {
        (0..next_id(self.enums.len())).map(EnumId)
    }

    pub fn find_class(&self, name: &str) -> Option<ClassId> {
        self.class_ids().find(|id| self.class(*id).name == name)
    }

    /// Resolved type of an expression
    pub fn type_of(&self, id: ExprId) -> Option<&Type> {
        self.expr(id).ty.as_ref()
    }

    pub fn literal(&self, id: ExprId) -> Option<&Literal> {
        match &self.expr(id).kind {
            Expr::Literal(literal) => Some(literal),
            _ => None,
        }
    }

    /// `true` if `class` is `ancestor` or derives from it
    pub fn derives_from(&self, class: ClassId, ancestor: ClassId) -> bool {
        let mut current = Some(class);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.class(id).base;
        }
        false
    }

    /// Human-readable type name for diagnostics
    pub fn describe(&self, ty: &Type) -> String {
        match ty {
            Type::Void => "void".to_string(),
            Type::Null => "null".to_string(),
            Type::Bool => "bool".to_string(),
            Type::Char => "char".to_string(),
            Type::Integer(crate::types::IntegerType::Int32) => "int".to_string(),
            Type::Integer(crate::types::IntegerType::Int64) => "long".to_string(),
            Type::Floating(crate::types::FloatingType::Float) => "float".to_string(),
            Type::Floating(crate::types::FloatingType::Double) => "double".to_string(),
            Type::Range(range) => range.to_string(),
            Type::StringPointer => "string".to_string(),
            Type::StringStorage => "string()".to_string(),
            Type::ArrayPointer { element, mutable } => {
                format!("{}[]{}", self.describe(element), if *mutable { "!" } else { "" })
            }
            Type::ArrayStorage { element, length } => format!("{}[{}]", self.describe(element), length),
            Type::ClassPointer { class, mutable } => {
                format!("{}{}", self.class(*class).name, if *mutable { "!" } else { "" })
            }
            Type::ClassStorage(class) => format!("{}()", self.class(*class).name),
            Type::Enum(id) => self.enumeration(*id).name.clone(),
        }
    }

    // ---------- construction ----------

    pub fn add_file(&mut self, path: impl Into<PathBuf>) -> FileId {
        self.files.push(path.into());
        FileId(next_id(self.files.len() - 1))
    }

    pub fn add_expr(&mut self, line: u32, kind: Expr) -> ExprId {
        self.exprs.push(ExprNode { kind, line, ty: None });
        ExprId(next_id(self.exprs.len() - 1))
    }

    pub fn add_stmt(&mut self, line: u32, kind: Stmt) -> StmtId {
        self.stmts.push(StmtNode { kind, line });
        StmtId(next_id(self.stmts.len() - 1))
    }

    pub fn int(&mut self, line: u32, value: i64) -> ExprId {
        self.add_expr(line, Expr::Literal(Literal::Int(value)))
    }

    pub fn string(&mut self, line: u32, value: &str) -> ExprId {
        self.add_expr(line, Expr::Literal(Literal::String(value.to_string())))
    }

    pub fn boolean(&mut self, line: u32, value: bool) -> ExprId {
        self.add_expr(line, Expr::Literal(Literal::Bool(value)))
    }

    pub fn name(&mut self, line: u32, name: &str) -> ExprId {
        self.add_expr(line, Expr::Symbol(SymbolRef { name: name.to_string(), symbol: None }))
    }

    pub fn prefix(&mut self, line: u32, op: PrefixOp, inner: ExprId) -> ExprId {
        self.add_expr(line, Expr::Prefix { op, inner })
    }

    pub fn postfix(&mut self, line: u32, op: PostfixOp, inner: ExprId) -> ExprId {
        self.add_expr(line, Expr::Postfix { op, inner })
    }

    pub fn binary(&mut self, line: u32, op: BinaryOp, left: ExprId, right: ExprId) -> ExprId {
        self.add_expr(line, Expr::Binary { op, left, right: Operand::Expr(right) })
    }

    pub fn member(&mut self, line: u32, object: ExprId, name: &str) -> ExprId {
        let name = self.name(line, name);
        self.binary(line, BinaryOp::Dot, object, name)
    }

    pub fn call(&mut self, line: u32, callee: ExprId, args: Vec<ExprId>) -> ExprId {
        self.add_expr(line, Expr::Binary { op: BinaryOp::Call, left: callee, right: Operand::Args(args) })
    }

    /// `base[index]`, or `base[]` in a type position
    pub fn index(&mut self, line: u32, base: ExprId, index: Option<ExprId>) -> ExprId {
        let right = index.map_or(Operand::None, Operand::Expr);
        self.add_expr(line, Expr::Binary { op: BinaryOp::Index, left: base, right })
    }

    pub fn local_var(&mut self, line: u32, name: &str, type_expr: ExprId, value: Option<ExprId>) -> ExprId {
        let var = self.add_var(line, name, type_expr, value);
        self.add_expr(line, Expr::Var(var))
    }

    pub fn add_var(&mut self, line: u32, name: &str, type_expr: ExprId, value: Option<ExprId>) -> VarId {
        self.vars.push(Var { name: name.to_string(), line, type_expr, value, ty: None });
        VarId(next_id(self.vars.len() - 1))
    }

    pub fn add_class(&mut self, file: FileId, line: u32, name: &str, base_name: Option<&str>) -> ClassId {
        self.classes.push(Class {
            name: name.to_string(),
            file,
            line,
            is_public: false,
            call_type: CallType::Normal,
            base_name: base_name.map(str::to_string),
            base: None,
            consts: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            status: VisitStatus::Unvisited,
        });
        ClassId(next_id(self.classes.len() - 1))
    }

    pub fn add_const(
        &mut self,
        owner: ConstOwner,
        line: u32,
        name: &str,
        type_expr: Option<ExprId>,
        value: Option<ExprId>,
    ) -> ConstId {
        self.consts.push(Const {
            name: name.to_string(),
            line,
            owner,
            visibility: Visibility::Private,
            type_expr,
            value,
            status: VisitStatus::Unvisited,
            ty: None,
        });
        let id = ConstId(next_id(self.consts.len() - 1));
        match owner {
            ConstOwner::Program(_) => self.globals.push(id),
            ConstOwner::Class(class) => self.class_mut(class).consts.push(id),
            ConstOwner::Enum(e) => self.enums[e.index()].values.push(id),
            ConstOwner::Local => {}
        }
        id
    }

    pub fn add_field(&mut self, class: ClassId, line: u32, name: &str, type_expr: ExprId) -> FieldId {
        self.fields.push(Field {
            name: name.to_string(),
            line,
            visibility: Visibility::Private,
            type_expr,
            ty: None,
        });
        let id = FieldId(next_id(self.fields.len() - 1));
        self.class_mut(class).fields.push(id);
        id
    }

    pub fn add_method(
        &mut self,
        class: ClassId,
        line: u32,
        name: &str,
        type_expr: Option<ExprId>,
        params: Vec<VarId>,
        body: Option<StmtId>,
    ) -> MethodId {
        self.methods.push(Method {
            name: name.to_string(),
            line,
            visibility: Visibility::Public,
            call_type: CallType::Normal,
            is_mutator: false,
            type_expr,
            params,
            body,
            ty: None,
        });
        let id = MethodId(next_id(self.methods.len() - 1));
        self.class_mut(class).methods.push(id);
        id
    }

    pub fn add_enum(&mut self, file: FileId, line: u32, name: &str) -> EnumId {
        self.enums.push(Enum {
            name: name.to_string(),
            file,
            line,
            is_public: false,
            values: Vec::new(),
        });
        EnumId(next_id(self.enums.len() - 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builders_link_members() {
        let mut program = Program::new();
        let file = program.add_file("a.ci");
        let class = program.add_class(file, 1, "Shape", None);
        let ty = program.name(2, "int");
        let field = program.add_field(class, 2, "sides", ty);
        let value = program.int(3, 4);
        let konst = program.add_const(ConstOwner::Class(class), 3, "Four", None, Some(value));

        assert_eq!(program.class(class).fields, vec![field]);
        assert_eq!(program.class(class).consts, vec![konst]);
        assert_eq!(program.find_class("Shape"), Some(class));
        assert_eq!(program.literal(value), Some(&Literal::Int(4)));
    }

    #[test]
    fn test_describe_types() {
        let mut program = Program::new();
        let file = program.add_file("a.ci");
        let class = program.add_class(file, 1, "Node", None);
        let array = Type::ArrayPointer { element: Box::new(Type::range(0, 255)), mutable: true };
        assert_eq!(program.describe(&array), "0..255[]!");
        assert_eq!(program.describe(&Type::ClassPointer { class, mutable: false }), "Node");
        assert_eq!(program.describe(&Type::ClassStorage(class)), "Node()");
    }

    #[test]
    fn test_program_json_round_trip_keeps_resolution_defaults() {
        let json = r#"{
            "files": ["a.ci"], "exprs": [], "stmts": [],
            "classes": [{"name": "A", "file": 0, "line": 1, "base_name": null,
                         "consts": [], "fields": [], "methods": []}],
            "enums": [], "consts": [], "fields": [], "methods": [], "vars": []
        }"#;
        let program: Program = serde_json::from_str(json).unwrap();
        assert_eq!(program.class(ClassId(0)).status, VisitStatus::Unvisited);
        assert!(program.ordered.is_empty());
    }
}
