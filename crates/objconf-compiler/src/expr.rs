//! Expression tree nodes.
//!
//! The parser produces most of these for declaration bodies; the item compiler
//! synthesizes the rest (self-registration and body wrapping). Only the node
//! kinds the compiler emits or inspects are modelled here:
//!
//! - [`LiteralExpr`]: a constant [`Value`]
//! - [`VariableExpr`]: a name looked up in the closure scope, then the object
//! - [`ScopeExpr`]: one of the evaluation scopes (`locals`, `this`, `globals`)
//! - [`IndexExpr`]: `target[key]` / `target.key`
//! - [`SetExpr`]: assignment with a merge operator (`=` or `+=`)
//! - [`DictExpr`]: a block of expressions, optionally inline
//! - [`ArrayExpr`]: an array literal
//! - [`ImportExpr`]: `import "template-name"`
//! - [`ImportDefaultTemplatesExpr`]: the implicit default-template import marker

use objconf_core::{DebugInfo, Value};

/// An expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal value
    Literal(LiteralExpr),
    /// Variable reference
    Variable(VariableExpr),
    /// Scope reference
    Scope(ScopeExpr),
    /// Indexing / member access
    Index(Box<IndexExpr>),
    /// Assignment with operator
    Set(Box<SetExpr>),
    /// Block of expressions
    Dict(DictExpr),
    /// Array literal
    Array(ArrayExpr),
    /// Template import by name
    Import(Box<ImportExpr>),
    /// Default template import marker
    ImportDefaultTemplates(ImportDefaultTemplatesExpr),
}

impl Expr {
    /// Get the provenance of this expression.
    pub fn debug_info(&self) -> &DebugInfo {
        match self {
            Self::Literal(e) => &e.debug_info,
            Self::Variable(e) => &e.debug_info,
            Self::Scope(e) => &e.debug_info,
            Self::Index(e) => &e.debug_info,
            Self::Set(e) => &e.debug_info,
            Self::Dict(e) => &e.debug_info,
            Self::Array(e) => &e.debug_info,
            Self::Import(e) => &e.debug_info,
            Self::ImportDefaultTemplates(e) => &e.debug_info,
        }
    }

    /// A literal.
    pub fn literal(value: impl Into<Value>, debug_info: DebugInfo) -> Self {
        Self::Literal(LiteralExpr {
            value: value.into(),
            debug_info,
        })
    }

    /// A variable reference.
    pub fn variable(name: impl Into<String>, debug_info: DebugInfo) -> Self {
        Self::Variable(VariableExpr {
            name: name.into(),
            debug_info,
        })
    }

    /// `target[key]`.
    pub fn index(target: Expr, key: Expr, debug_info: DebugInfo) -> Self {
        Self::Index(Box::new(IndexExpr {
            target,
            key,
            debug_info,
        }))
    }

    /// `scope.key`, the indexer the compiler uses to address attributes.
    pub fn indexer(scope: ScopeSpecifier, key: &str, debug_info: DebugInfo) -> Self {
        let target = Self::Scope(ScopeExpr {
            scope,
            debug_info: debug_info.clone(),
        });
        let key = Self::literal(key, debug_info.clone());
        Self::index(target, key, debug_info)
    }

    /// `target <op> operand`.
    pub fn set(target: Expr, op: SetOp, operand: Expr, debug_info: DebugInfo) -> Self {
        Self::Set(Box::new(SetExpr {
            target,
            op,
            operand,
            debug_info,
        }))
    }

    /// A non-inline block.
    pub fn dict(exprs: Vec<Expr>, debug_info: DebugInfo) -> Self {
        Self::Dict(DictExpr::new(exprs, debug_info))
    }

    /// An inline block.
    pub fn inline_dict(exprs: Vec<Expr>, debug_info: DebugInfo) -> Self {
        let mut dict = DictExpr::new(exprs, debug_info);
        dict.make_inline();
        Self::Dict(dict)
    }

    /// An array literal.
    pub fn array(items: Vec<Expr>, debug_info: DebugInfo) -> Self {
        Self::Array(ArrayExpr { items, debug_info })
    }

    /// `import <name>`.
    pub fn import(name: Expr, debug_info: DebugInfo) -> Self {
        Self::Import(Box::new(ImportExpr { name, debug_info }))
    }

    /// The default-template import marker.
    pub fn import_default_templates(debug_info: DebugInfo) -> Self {
        Self::ImportDefaultTemplates(ImportDefaultTemplatesExpr { debug_info })
    }

    /// Whether this is the default-template import marker.
    #[inline]
    pub fn is_import_default_templates(&self) -> bool {
        matches!(self, Self::ImportDefaultTemplates(_))
    }
}

/// A literal value.
#[derive(Debug, Clone, PartialEq)]
pub struct LiteralExpr {
    /// The value
    pub value: Value,
    /// Source location
    pub debug_info: DebugInfo,
}

/// A variable reference.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableExpr {
    /// Variable name
    pub name: String,
    /// Source location
    pub debug_info: DebugInfo,
}

/// Evaluation scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeSpecifier {
    /// Closure variables captured by the declaration.
    Local,
    /// The object being built.
    This,
    /// Process-wide constants. The reference evaluator exposes none.
    Global,
}

impl ScopeSpecifier {
    /// The keyword for this scope.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeSpecifier::Local => "locals",
            ScopeSpecifier::This => "this",
            ScopeSpecifier::Global => "globals",
        }
    }
}

/// A scope reference.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeExpr {
    /// Which scope
    pub scope: ScopeSpecifier,
    /// Source location
    pub debug_info: DebugInfo,
}

/// `target[key]`.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexExpr {
    /// Indexed value
    pub target: Expr,
    /// Key
    pub key: Expr,
    /// Source location
    pub debug_info: DebugInfo,
}

/// Merge operators for assignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetOp {
    /// `=`: overwrite.
    Set,
    /// `+=`: append / union / merge, depending on the value type.
    Add,
}

impl SetOp {
    /// Source form of the operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            SetOp::Set => "=",
            SetOp::Add => "+=",
        }
    }
}

/// An assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct SetExpr {
    /// Assigned place (a variable or an index chain rooted at a scope)
    pub target: Expr,
    /// Merge operator
    pub op: SetOp,
    /// Assigned value
    pub operand: Expr,
    /// Source location
    pub debug_info: DebugInfo,
}

/// A block of expressions.
///
/// A non-inline block evaluates into a fresh dictionary and yields it. An
/// inline block evaluates in the enclosing object's scope and yields nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct DictExpr {
    /// Expressions in evaluation order
    pub exprs: Vec<Expr>,
    /// Whether the block shares its parent's scope
    pub inline: bool,
    /// Source location
    pub debug_info: DebugInfo,
}

impl DictExpr {
    /// Create a non-inline block.
    pub fn new(exprs: Vec<Expr>, debug_info: DebugInfo) -> Self {
        Self {
            exprs,
            inline: false,
            debug_info,
        }
    }

    /// Evaluate in the enclosing scope instead of a new dictionary.
    pub fn make_inline(&mut self) {
        self.inline = true;
    }
}

/// An array literal.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayExpr {
    /// Elements
    pub items: Vec<Expr>,
    /// Source location
    pub debug_info: DebugInfo,
}

/// `import <name>`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportExpr {
    /// Evaluates to the template name
    pub name: Expr,
    /// Source location
    pub debug_info: DebugInfo,
}

/// Marker that makes an object inherit its type's default templates.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportDefaultTemplatesExpr {
    /// Source location
    pub debug_info: DebugInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexer_shape() {
        let di = DebugInfo::point("a.conf", 1, 1);
        let expr = Expr::indexer(ScopeSpecifier::This, "templates", di.clone());

        let Expr::Index(index) = expr else {
            panic!("expected index expression");
        };
        assert!(matches!(
            index.target,
            Expr::Scope(ScopeExpr {
                scope: ScopeSpecifier::This,
                ..
            })
        ));
        assert_eq!(index.key, Expr::literal("templates", di.clone()));
        assert_eq!(index.debug_info, di);
    }

    #[test]
    fn inline_dict_sets_flag() {
        let Expr::Dict(dict) = Expr::inline_dict(vec![], DebugInfo::default()) else {
            panic!("expected dict");
        };
        assert!(dict.inline);

        let Expr::Dict(dict) = Expr::dict(vec![], DebugInfo::default()) else {
            panic!("expected dict");
        };
        assert!(!dict.inline);
    }

    #[test]
    fn import_marker_detection() {
        assert!(Expr::import_default_templates(DebugInfo::default()).is_import_default_templates());
        assert!(!Expr::literal(1i64, DebugInfo::default()).is_import_default_templates());
    }

    #[test]
    fn debug_info_is_per_node() {
        let di = DebugInfo::new("a.conf", 4, 2, 4, 20);
        let expr = Expr::set(
            Expr::variable("address", DebugInfo::default()),
            SetOp::Set,
            Expr::literal("10.0.0.1", DebugInfo::default()),
            di.clone(),
        );
        assert_eq!(expr.debug_info(), &di);
    }

    #[test]
    fn operator_and_scope_names() {
        assert_eq!(SetOp::Add.as_str(), "+=");
        assert_eq!(ScopeSpecifier::This.as_str(), "this");
    }
}
