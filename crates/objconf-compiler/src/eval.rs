//! Reference evaluator for compiled item trees.
//!
//! Evaluates the node subset defined in [`crate::expr`] against an object's
//! attribute dictionary. This is what gives the compiled tree its meaning:
//!
//! - inline blocks run in the object's own scope, non-inline blocks build a
//!   nested dictionary
//! - `=` overwrites, `+=` merges via [`Value::add`]; a missing key behaves as
//!   `null`, so the first `+=` acts as an assignment
//! - assigning through an index chain creates missing intermediate dictionaries
//! - scopes are only reachable through an indexer; a bare `this` is an error
//! - imports evaluate a template's tree into the same object, with the
//!   template's own closure scope
//!
//! Templates are looked up through a [`TemplateResolver`] supplied by the
//! caller, so the evaluator never touches process-wide state.

use std::sync::Arc;

use thiserror::Error;
use tracing::trace;

use objconf_core::{DebugInfo, Dictionary, Value, ValueError};

use crate::expr::{DictExpr, Expr, IndexExpr, ScopeSpecifier, SetExpr, SetOp};
use crate::item::ConfigItem;

/// Maximum nesting of template imports before evaluation is aborted.
pub const MAX_IMPORT_DEPTH: usize = 64;

/// Errors that occur while evaluating an expression tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// A variable is neither in the closure scope nor on the object.
    #[error("Tried to access undefined script variable '{name}' (in {debug_info})")]
    UnknownVariable { name: String, debug_info: DebugInfo },

    /// The left-hand side of an assignment is not assignable.
    #[error("Expression cannot be assigned to (in {debug_info})")]
    InvalidAssignmentTarget { debug_info: DebugInfo },

    /// An index key did not evaluate to a string or number.
    #[error("Index key of type '{type_name}' is not supported (in {debug_info})")]
    InvalidKey {
        type_name: &'static str,
        debug_info: DebugInfo,
    },

    /// An operator failed on its operands.
    #[error("{source} (in {debug_info})")]
    Value {
        source: ValueError,
        debug_info: DebugInfo,
    },

    /// An import named a template that does not exist.
    #[error("Import references unknown template: '{name}' of type '{type_name}' (in {debug_info})")]
    UnknownTemplate {
        type_name: String,
        name: String,
        debug_info: DebugInfo,
    },

    /// An import named a concrete object.
    #[error("Object '{name}' of type '{type_name}' is not a template and cannot be imported (in {debug_info})")]
    NotATemplate {
        type_name: String,
        name: String,
        debug_info: DebugInfo,
    },

    /// A scope was read as a whole instead of through an index.
    #[error("Scope '{scope}' can only be accessed through an indexer (in {debug_info})")]
    ScopeNotReadable {
        scope: &'static str,
        debug_info: DebugInfo,
    },

    /// Imports nested deeper than [`MAX_IMPORT_DEPTH`], usually an import cycle.
    #[error("Too many nested imports; is there an import cycle? (in {debug_info})")]
    ImportDepthExceeded { debug_info: DebugInfo },
}

/// Source of templates for `import` and default-template imports.
pub trait TemplateResolver {
    /// Look up a compiled item of `type_name` by name.
    fn template(&self, type_name: &str, name: &str) -> Option<Arc<ConfigItem>>;

    /// Default templates of `type_name`, in import order.
    fn default_templates(&self, type_name: &str) -> Vec<Arc<ConfigItem>>;
}

/// A resolver that knows no templates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTemplates;

impl TemplateResolver for NoTemplates {
    fn template(&self, _type_name: &str, _name: &str) -> Option<Arc<ConfigItem>> {
        None
    }

    fn default_templates(&self, _type_name: &str) -> Vec<Arc<ConfigItem>> {
        Vec::new()
    }
}

/// Evaluation state for one object.
pub struct Frame<'a> {
    /// Closure variables, read-only.
    pub locals: Option<&'a Dictionary>,
    /// Attributes of the object being built.
    pub this: &'a mut Dictionary,
    /// Type of the object being built; imports resolve templates of this type.
    pub type_name: &'a str,
    /// Template lookup.
    pub resolver: &'a dyn TemplateResolver,
    depth: usize,
}

impl<'a> Frame<'a> {
    /// Create a frame for evaluating an object of `type_name` into `this`.
    pub fn new(
        type_name: &'a str,
        this: &'a mut Dictionary,
        locals: Option<&'a Dictionary>,
        resolver: &'a dyn TemplateResolver,
    ) -> Self {
        Self {
            locals,
            this,
            type_name,
            resolver,
            depth: 0,
        }
    }

    fn lookup(&self, name: &str) -> Option<&Value> {
        self.locals
            .and_then(|locals| locals.get(name))
            .or_else(|| self.this.get(name))
    }
}

impl Expr {
    /// Evaluate this expression in `frame`.
    pub fn evaluate(&self, frame: &mut Frame<'_>) -> Result<Value, EvalError> {
        match self {
            Expr::Literal(e) => Ok(e.value.clone()),
            Expr::Variable(e) => frame.lookup(&e.name).cloned().ok_or_else(|| {
                EvalError::UnknownVariable {
                    name: e.name.clone(),
                    debug_info: e.debug_info.clone(),
                }
            }),
            Expr::Scope(e) => Err(EvalError::ScopeNotReadable {
                scope: e.scope.as_str(),
                debug_info: e.debug_info.clone(),
            }),
            Expr::Index(e) => evaluate_index(e, frame),
            Expr::Set(e) => {
                evaluate_set(e, frame)?;
                Ok(Value::Empty)
            }
            Expr::Dict(e) => evaluate_dict(e, frame),
            Expr::Array(e) => e
                .items
                .iter()
                .map(|item| item.evaluate(frame))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Expr::Import(e) => {
                let name = e.name.evaluate(frame)?;
                let name = match name {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                let template = frame.resolver.template(frame.type_name, &name).ok_or_else(|| {
                    EvalError::UnknownTemplate {
                        type_name: frame.type_name.to_string(),
                        name: name.clone(),
                        debug_info: e.debug_info.clone(),
                    }
                })?;

                if !template.is_abstract() {
                    return Err(EvalError::NotATemplate {
                        type_name: frame.type_name.to_string(),
                        name,
                        debug_info: e.debug_info.clone(),
                    });
                }

                import_template(&template, frame, &e.debug_info)?;
                Ok(Value::Empty)
            }
            Expr::ImportDefaultTemplates(e) => {
                for template in frame.resolver.default_templates(frame.type_name) {
                    import_template(&template, frame, &e.debug_info)?;
                }
                Ok(Value::Empty)
            }
        }
    }
}

fn import_template(
    template: &ConfigItem,
    frame: &mut Frame<'_>,
    debug_info: &DebugInfo,
) -> Result<(), EvalError> {
    if frame.depth >= MAX_IMPORT_DEPTH {
        return Err(EvalError::ImportDepthExceeded {
            debug_info: debug_info.clone(),
        });
    }

    trace!(
        type_name = frame.type_name,
        template = template.name(),
        depth = frame.depth,
        "importing template"
    );

    let mut inner = Frame {
        locals: template.scope().map(Arc::as_ref),
        this: &mut *frame.this,
        type_name: frame.type_name,
        resolver: frame.resolver,
        depth: frame.depth + 1,
    };
    template.expression().evaluate(&mut inner)?;
    Ok(())
}

fn evaluate_dict(dict: &DictExpr, frame: &mut Frame<'_>) -> Result<Value, EvalError> {
    if dict.inline {
        for expr in &dict.exprs {
            expr.evaluate(frame)?;
        }
        return Ok(Value::Empty);
    }

    let mut nested = Dictionary::default();
    {
        let mut inner = Frame {
            locals: frame.locals,
            this: &mut nested,
            type_name: frame.type_name,
            resolver: frame.resolver,
            depth: frame.depth,
        };
        for expr in &dict.exprs {
            expr.evaluate(&mut inner)?;
        }
    }
    Ok(Value::Dictionary(nested))
}

fn evaluate_key(key: &Expr, frame: &mut Frame<'_>) -> Result<String, EvalError> {
    match key.evaluate(frame)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.0.to_string()),
        other => Err(EvalError::InvalidKey {
            type_name: other.type_name(),
            debug_info: key.debug_info().clone(),
        }),
    }
}

fn evaluate_index(index: &IndexExpr, frame: &mut Frame<'_>) -> Result<Value, EvalError> {
    let key = evaluate_key(&index.key, frame)?;

    if let Expr::Scope(scope) = &index.target {
        let found = match scope.scope {
            ScopeSpecifier::This => frame.this.get(&key),
            ScopeSpecifier::Local => frame.locals.and_then(|l| l.get(&key)),
            ScopeSpecifier::Global => None,
        };
        return Ok(found.cloned().unwrap_or_default());
    }

    match index.target.evaluate(frame)? {
        Value::Dictionary(mut d) => Ok(d.remove(&key).unwrap_or_default()),
        Value::Array(mut a) => {
            let slot = key.parse::<f64>().ok().filter(|i| *i >= 0.0 && i.fract() == 0.0);
            match slot {
                Some(i) if (i as usize) < a.len() => Ok(a.swap_remove(i as usize)),
                _ => Ok(Value::Empty),
            }
        }
        Value::Empty => Ok(Value::Empty),
        other => Err(EvalError::Value {
            source: ValueError::NotIndexable(other.type_name()),
            debug_info: index.debug_info.clone(),
        }),
    }
}

/// Resolve an assignment target into the path of keys below `this`.
fn assignment_path(target: &Expr, frame: &mut Frame<'_>) -> Result<Vec<String>, EvalError> {
    match target {
        Expr::Variable(v) => Ok(vec![v.name.clone()]),
        Expr::Index(index) => {
            let mut path = match &index.target {
                Expr::Scope(s) if s.scope == ScopeSpecifier::This => Vec::new(),
                Expr::Scope(_) => {
                    return Err(EvalError::InvalidAssignmentTarget {
                        debug_info: index.debug_info.clone(),
                    });
                }
                other => assignment_path(other, frame)?,
            };
            path.push(evaluate_key(&index.key, frame)?);
            Ok(path)
        }
        other => Err(EvalError::InvalidAssignmentTarget {
            debug_info: other.debug_info().clone(),
        }),
    }
}

fn evaluate_set(set: &SetExpr, frame: &mut Frame<'_>) -> Result<(), EvalError> {
    let path = assignment_path(&set.target, frame)?;
    let operand = set.operand.evaluate(frame)?;

    let Some((last, parents)) = path.split_last() else {
        return Err(EvalError::InvalidAssignmentTarget {
            debug_info: set.debug_info.clone(),
        });
    };

    let mut dict: &mut Dictionary = frame.this;
    for key in parents {
        let slot = dict.entry(key.clone()).or_default();
        if slot.is_empty() {
            *slot = Value::Dictionary(Dictionary::default());
        }
        dict = match slot {
            Value::Dictionary(d) => d,
            other => {
                return Err(EvalError::Value {
                    source: ValueError::NotIndexable(other.type_name()),
                    debug_info: set.debug_info.clone(),
                });
            }
        };
    }

    let value = match set.op {
        SetOp::Set => operand,
        SetOp::Add => {
            let current = dict.remove(last).unwrap_or_default();
            current.add(operand).map_err(|source| EvalError::Value {
                source,
                debug_info: set.debug_info.clone(),
            })?
        }
    };
    dict.insert(last.clone(), value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::ScopeExpr;

    fn di() -> DebugInfo {
        DebugInfo::point("test.conf", 1, 1)
    }

    fn assign(key: &str, op: SetOp, value: Expr) -> Expr {
        Expr::set(Expr::indexer(ScopeSpecifier::This, key, di()), op, value, di())
    }

    fn run(expr: &Expr, this: &mut Dictionary, locals: Option<&Dictionary>) -> Result<Value, EvalError> {
        let mut frame = Frame::new("Host", this, locals, &NoTemplates);
        expr.evaluate(&mut frame)
    }

    #[test]
    fn set_overwrites() {
        let mut this = Dictionary::default();
        let block = Expr::inline_dict(
            vec![
                assign("address", SetOp::Set, Expr::literal("10.0.0.1", di())),
                assign("address", SetOp::Set, Expr::literal("10.0.0.2", di())),
            ],
            di(),
        );
        run(&block, &mut this, None).unwrap();
        assert_eq!(this["address"], Value::from("10.0.0.2"));
    }

    #[test]
    fn add_on_missing_key_assigns() {
        let mut this = Dictionary::default();
        let expr = assign(
            "groups",
            SetOp::Add,
            Expr::array(vec![Expr::literal("linux", di())], di()),
        );
        run(&expr, &mut this, None).unwrap();
        assert_eq!(this["groups"], Value::from(vec![Value::from("linux")]));
    }

    #[test]
    fn add_appends_arrays() {
        let mut this = Dictionary::default();
        this.insert("groups".into(), Value::from(vec![Value::from("linux")]));
        let expr = assign(
            "groups",
            SetOp::Add,
            Expr::array(vec![Expr::literal("web", di())], di()),
        );
        run(&expr, &mut this, None).unwrap();
        assert_eq!(
            this["groups"],
            Value::from(vec![Value::from("linux"), Value::from("web")])
        );
    }

    #[test]
    fn add_type_mismatch_is_error() {
        let mut this = Dictionary::default();
        this.insert("port".into(), Value::from(vec![]));
        let expr = assign("port", SetOp::Add, Expr::literal(1i64, di()));
        let err = run(&expr, &mut this, None).unwrap_err();
        assert!(matches!(err, EvalError::Value { .. }));
    }

    #[test]
    fn nested_assignment_creates_dictionaries() {
        let mut this = Dictionary::default();
        let target = Expr::index(
            Expr::indexer(ScopeSpecifier::This, "vars", di()),
            Expr::literal("os", di()),
            di(),
        );
        let expr = Expr::set(target, SetOp::Set, Expr::literal("Linux", di()), di());
        run(&expr, &mut this, None).unwrap();

        let vars = this["vars"].as_dictionary().unwrap();
        assert_eq!(vars["os"], Value::from("Linux"));
    }

    #[test]
    fn nested_assignment_through_scalar_fails() {
        let mut this = Dictionary::default();
        this.insert("vars".into(), Value::from("oops"));
        let target = Expr::index(
            Expr::indexer(ScopeSpecifier::This, "vars", di()),
            Expr::literal("os", di()),
            di(),
        );
        let expr = Expr::set(target, SetOp::Set, Expr::literal("Linux", di()), di());
        assert!(run(&expr, &mut this, None).is_err());
    }

    #[test]
    fn variables_prefer_locals() {
        let mut locals = Dictionary::default();
        locals.insert("x".into(), Value::from(1i64));
        let mut this = Dictionary::default();
        this.insert("x".into(), Value::from(2i64));
        this.insert("y".into(), Value::from(3i64));

        let x = run(&Expr::variable("x", di()), &mut this, Some(&locals)).unwrap();
        let y = run(&Expr::variable("y", di()), &mut this, Some(&locals)).unwrap();
        assert_eq!(x, Value::from(1i64));
        assert_eq!(y, Value::from(3i64));
    }

    #[test]
    fn unknown_variable() {
        let mut this = Dictionary::default();
        let err = run(&Expr::variable("nope", di()), &mut this, None).unwrap_err();
        assert!(matches!(err, EvalError::UnknownVariable { ref name, .. } if name == "nope"));
    }

    #[test]
    fn assigning_to_locals_is_rejected() {
        let mut this = Dictionary::default();
        let expr = Expr::set(
            Expr::indexer(ScopeSpecifier::Local, "x", di()),
            SetOp::Set,
            Expr::literal(1i64, di()),
            di(),
        );
        let err = run(&expr, &mut this, None).unwrap_err();
        assert!(matches!(err, EvalError::InvalidAssignmentTarget { .. }));
    }

    #[test]
    fn non_inline_dict_builds_value() {
        let mut this = Dictionary::default();
        let expr = assign(
            "vars",
            SetOp::Set,
            Expr::dict(
                vec![assign("os", SetOp::Set, Expr::literal("Linux", di()))],
                di(),
            ),
        );
        run(&expr, &mut this, None).unwrap();

        assert!(!this.contains_key("os"));
        assert_eq!(this["vars"].as_dictionary().unwrap()["os"], Value::from("Linux"));
    }

    #[test]
    fn index_reads() {
        let mut this = Dictionary::default();
        this.insert(
            "list".into(),
            Value::from(vec![Value::from("a"), Value::from("b")]),
        );
        let expr = Expr::index(
            Expr::variable("list", di()),
            Expr::literal(1i64, di()),
            di(),
        );
        assert_eq!(run(&expr, &mut this, None).unwrap(), Value::from("b"));

        let missing = Expr::indexer(ScopeSpecifier::This, "missing", di());
        assert_eq!(run(&missing, &mut this, None).unwrap(), Value::Empty);
    }

    #[test]
    fn bare_scope_read_is_rejected() {
        let mut this = Dictionary::default();
        this.insert("address".into(), Value::from("10.0.0.1"));

        for scope in [ScopeSpecifier::This, ScopeSpecifier::Local, ScopeSpecifier::Global] {
            let expr = Expr::Scope(ScopeExpr {
                scope,
                debug_info: di(),
            });
            let err = run(&expr, &mut this, None).unwrap_err();
            assert!(
                matches!(err, EvalError::ScopeNotReadable { scope: s, .. } if s == scope.as_str())
            );
        }
    }

    #[test]
    fn nested_index_reads_through_this() {
        let mut vars = Dictionary::default();
        vars.insert("os".into(), Value::from("Linux"));
        let mut this = Dictionary::default();
        this.insert("vars".into(), Value::from(vars));

        let expr = Expr::index(
            Expr::indexer(ScopeSpecifier::This, "vars", di()),
            Expr::literal("os", di()),
            di(),
        );
        assert_eq!(run(&expr, &mut this, None).unwrap(), Value::from("Linux"));
    }

    #[test]
    fn unknown_import() {
        let mut this = Dictionary::default();
        let expr = Expr::import(Expr::literal("generic-host", di()), di());
        let err = run(&expr, &mut this, None).unwrap_err();
        assert!(matches!(err, EvalError::UnknownTemplate { ref name, .. } if name == "generic-host"));
    }

    #[test]
    fn default_import_without_templates_is_noop() {
        let mut this = Dictionary::default();
        let expr = Expr::import_default_templates(di());
        assert_eq!(run(&expr, &mut this, None).unwrap(), Value::Empty);
        assert!(this.is_empty());
    }
}
