
use std::collections::HashMap;
use std::fmt;

use gc::{Finalize, Gc, GcCell, Trace};

use crate::expr::{Error, Expr};

// Clone-by-reference environment. A frame can be captured by a closure
// stored inside that same frame, so frames are traced rather than counted.
#[derive(Clone, Finalize, Trace)]
pub struct Environment(Gc<GcCell<EnvironmentData>>);

#[derive(Finalize, Trace)]
struct EnvironmentData {
    parent: Option<Environment>,
    local: HashMap<String, Expr>,
}

#[derive(Clone, Debug, Finalize, PartialEq, Trace)]
pub struct Procedure(ProcEnum);

#[derive(Clone, Debug, Finalize, PartialEq, Trace)]
enum ProcEnum {
    Builtin(Builtin),
    Lambda(Lambda),
}

pub type BuiltinFn = fn(Vec<Expr>) -> Result<Expr, Error>;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Builtin {
    name: &'static str,
    func: BuiltinFn,
}

impl Finalize for Builtin {}

// Contains no managed pointers.
unsafe impl Trace for Builtin {
    gc::unsafe_empty_trace!();
}

#[derive(Clone, Debug, Finalize, PartialEq, Trace)]
struct Lambda {
    params: Vec<String>,
    body: Expr,
    env: Environment,
}

/// The forms evaluated by fixed interpreter rules rather than procedure
/// application. Dispatch is by this enumeration, never by comparing list
/// contents in the evaluator itself.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum SpecialForm {
    Quote,
    If,
    Define,
    Set,
    Lambda,
    Begin,
}

impl Environment {
    fn from_data(data: EnvironmentData) -> Environment {
        Environment(Gc::new(GcCell::new(data)))
    }

    /// The root frame, from a prebuilt binding map. It has no parent.
    pub fn from_hashmap(hmap: HashMap<String, Expr>) -> Environment {
        Environment::from_data(EnvironmentData {
            parent: None,
            local: hmap,
        })
    }

    /// A fresh empty frame whose parent is `self`.
    pub fn extend(&self) -> Environment {
        Environment::from_data(EnvironmentData {
            parent: Some(self.clone()),
            local: HashMap::new(),
        })
    }

    /// Bind in this frame only, shadowing or overwriting.
    pub fn define(&self, name: &str, value: Expr) {
        self.0.borrow_mut().local.insert(name.to_string(), value);
    }

    /// Innermost-outward search along the parent chain.
    pub fn lookup(&self, name: &str) -> Result<Expr, Error> {
        let data = self.0.borrow();
        match data.local.get(name) {
            Some(value) => Ok(value.clone()),
            None => match data.parent {
                Some(ref parent) => parent.lookup(name),
                None => Err(Error::UndefinedSymbol(name.to_string())),
            },
        }
    }

    /// Overwrite an existing binding in the frame where it is found.
    pub fn assign(&self, name: &str, value: Expr) -> Result<(), Error> {
        let mut data = self.0.borrow_mut();
        if let Some(slot) = data.local.get_mut(name) {
            *slot = value;
            return Ok(());
        }
        match data.parent {
            Some(ref parent) => parent.assign(name, value),
            None => Err(Error::UndefinedSymbol(name.to_string())),
        }
    }

    fn as_ptr(&self) -> *const () {
        &*self.0 as *const GcCell<EnvironmentData> as *const ()
    }
}

// Frame identity, not contents: a frame chain can be cyclic through a
// captured closure.
impl PartialEq for Environment {
    fn eq(&self, other: &Environment) -> bool {
        self.as_ptr() == other.as_ptr()
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<environment {:x}>", self.as_ptr() as usize)
    }
}

impl Procedure {
    pub fn builtin(name: &'static str, func: BuiltinFn) -> Procedure {
        Procedure(ProcEnum::Builtin(Builtin { name, func }))
    }

    fn lambda(params: Vec<String>, body: Expr, env: Environment) -> Procedure {
        Procedure(ProcEnum::Lambda(Lambda { params, body, env }))
    }

    /// Apply to already-evaluated arguments.
    pub fn apply(&self, args: Vec<Expr>) -> Result<Expr, Error> {
        match self.0 {
            ProcEnum::Builtin(ref builtin) => (builtin.func)(args),
            ProcEnum::Lambda(ref lambda) => {
                if args.len() != lambda.params.len() {
                    return Err(Error::arity("lambda", lambda.params.len(),
                        args.len()));
                }
                let env = lambda.env.extend();
                for (param, arg) in lambda.params.iter().zip(args) {
                    env.define(param, arg);
                }
                lambda.body.eval(&env)
            }
        }
    }
}

impl fmt::Display for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            ProcEnum::Builtin(ref builtin) => {
                write!(f, "#<builtin {}>", builtin.name)
            }
            ProcEnum::Lambda(ref lambda) => {
                write!(f, "#<lambda ({})>", lambda.params.join(" "))
            }
        }
    }
}

impl SpecialForm {
    fn from_symbol(name: &str) -> Option<SpecialForm> {
        match name {
            "quote" => Some(SpecialForm::Quote),
            "if" => Some(SpecialForm::If),
            "define" => Some(SpecialForm::Define),
            "set!" => Some(SpecialForm::Set),
            "lambda" => Some(SpecialForm::Lambda),
            "begin" => Some(SpecialForm::Begin),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            SpecialForm::Quote => "quote",
            SpecialForm::If => "if",
            SpecialForm::Define => "define",
            SpecialForm::Set => "set!",
            SpecialForm::Lambda => "lambda",
            SpecialForm::Begin => "begin",
        }
    }

    fn eval(self, operands: &[Expr], env: &Environment) -> Result<Expr, Error> {
        match self {
            SpecialForm::Quote => match operands {
                [datum] => Ok(datum.clone()),
                _ => Err(Error::arity(self.name(), 1, operands.len())),
            },
            SpecialForm::If => match operands {
                [test, conseq, alt] => {
                    if test.eval(env)?.is_truthy() {
                        conseq.eval(env)
                    } else {
                        alt.eval(env)
                    }
                }
                _ => Err(Error::arity(self.name(), 3, operands.len())),
            },
            SpecialForm::Define => match operands {
                [name, value_expr] => {
                    let name = name.as_symbol().ok_or_else(||
                        Error::type_mismatch(self.name(), "a symbol",
                            name.clone()))?;
                    let value = value_expr.eval(env)?;
                    env.define(name, value.clone());
                    Ok(value)
                }
                _ => Err(Error::arity(self.name(), 2, operands.len())),
            },
            SpecialForm::Set => match operands {
                [name, value_expr] => {
                    let name = name.as_symbol().ok_or_else(||
                        Error::type_mismatch(self.name(), "a symbol",
                            name.clone()))?;
                    let value = value_expr.eval(env)?;
                    env.assign(name, value.clone())?;
                    Ok(value)
                }
                _ => Err(Error::arity(self.name(), 2, operands.len())),
            },
            SpecialForm::Lambda => match operands {
                [formals, body] => {
                    let items = formals.as_list().ok_or_else(||
                        Error::type_mismatch(self.name(), "a parameter list",
                            formals.clone()))?;
                    let mut params = Vec::with_capacity(items.len());
                    for item in items {
                        let param = item.as_symbol().ok_or_else(||
                            Error::type_mismatch(self.name(),
                                "a parameter symbol", item.clone()))?;
                        if params.iter().any(|p| p == param) {
                            return Err(Error::type_mismatch(self.name(),
                                "distinct parameter names", item.clone()));
                        }
                        params.push(param.to_string());
                    }
                    Ok(Expr::procedure(Procedure::lambda(params, body.clone(),
                        env.clone())))
                }
                _ => Err(Error::arity(self.name(), 2, operands.len())),
            },
            SpecialForm::Begin => {
                // Not transactional: bindings made before a failing
                // subexpression stay committed.
                let (last, init) = operands.split_last().ok_or_else(||
                    Error::arity(self.name(), 1, 0))?;
                for expr in init {
                    expr.eval(env)?;
                }
                last.eval(env)
            }
        }
    }
}

impl Expr {
    /// Evaluate against an environment chain. Strictly eager; recursion depth
    /// is bounded by the host call stack.
    pub fn eval(&self, env: &Environment) -> Result<Expr, Error> {
        if let Some(name) = self.as_symbol() {
            return env.lookup(name);
        }
        let items = match self.as_list() {
            Some(items) => items,
            // Numbers, booleans, and procedures are self-evaluating.
            None => return Ok(self.clone()),
        };
        let (operator, operands) = match items.split_first() {
            Some(split) => split,
            // So is the empty list.
            None => return Ok(self.clone()),
        };
        if let Some(form) = operator.as_symbol().and_then(SpecialForm::from_symbol) {
            return form.eval(operands, env);
        }
        let procedure = operator.eval(env)?;
        let mut args = Vec::with_capacity(operands.len());
        for operand in operands {
            args.push(operand.eval(env)?);
        }
        match procedure.as_procedure() {
            Some(procc) => procc.apply(args),
            None => Err(Error::NotCallable(procedure)),
        }
    }
}
