
use std::collections::HashMap;
use std::f64::consts;

use crate::equality::ExprEq;
use crate::expr::{Error, Expr};
use crate::runtime::{BuiltinFn, Environment, Procedure};

fn number_args(name: &'static str, args: &[Expr]) -> Result<Vec<f64>, Error> {
    args.iter()
        .map(|arg| arg.as_number().ok_or_else(||
            Error::type_mismatch(name, "a number", arg.clone())))
        .collect()
}

fn list_arg<'a>(name: &'static str, arg: &'a Expr) -> Result<&'a [Expr], Error> {
    arg.as_list().ok_or_else(|| Error::type_mismatch(name, "a list", arg.clone()))
}

fn sum(args: Vec<Expr>) -> Result<Expr, Error> {
    let mut total = 0.0;
    for n in number_args("+", &args)? {
        total += n;
    }
    Ok(Expr::number(total))
}

fn product(args: Vec<Expr>) -> Result<Expr, Error> {
    let mut total = 1.0;
    for n in number_args("*", &args)? {
        total *= n;
    }
    Ok(Expr::number(total))
}

fn difference(args: Vec<Expr>) -> Result<Expr, Error> {
    let nums = number_args("-", &args)?;
    match nums.split_first() {
        None => Err(Error::arity("-", 1, 0)),
        // One argument negates.
        Some((&first, [])) => Ok(Expr::number(-first)),
        Some((&first, rest)) => {
            let mut total = first;
            for n in rest {
                total -= n;
            }
            Ok(Expr::number(total))
        }
    }
}

// IEEE-754 throughout: dividing by zero gives an infinity, not an error.
fn quotient(args: Vec<Expr>) -> Result<Expr, Error> {
    let nums = number_args("/", &args)?;
    match nums.split_first() {
        None => Err(Error::arity("/", 1, 0)),
        // One argument reciprocates.
        Some((&first, [])) => Ok(Expr::number(1.0 / first)),
        Some((&first, rest)) => {
            let mut total = first;
            for n in rest {
                total /= n;
            }
            Ok(Expr::number(total))
        }
    }
}

fn num_comparison<F>(name: &'static str, args: Vec<Expr>, cmp: F)
    -> Result<Expr, Error> where F: Fn(f64, f64) -> bool {

    let nums = number_args(name, &args)?;
    if nums.len() < 2 {
        return Err(Error::arity(name, 2, nums.len()));
    }
    let mut condition = true;
    for pair in nums.windows(2) {
        if !cmp(pair[0], pair[1]) {
            condition = false;
        }
    }
    Ok(Expr::boolean(condition))
}

fn num_eq(args: Vec<Expr>) -> Result<Expr, Error> {
    num_comparison("=", args, |n, m| n == m)
}

fn less(args: Vec<Expr>) -> Result<Expr, Error> {
    num_comparison("<", args, |n, m| n < m)
}

fn greater(args: Vec<Expr>) -> Result<Expr, Error> {
    num_comparison(">", args, |n, m| n > m)
}

fn less_equal(args: Vec<Expr>) -> Result<Expr, Error> {
    num_comparison("<=", args, |n, m| n <= m)
}

fn greater_equal(args: Vec<Expr>) -> Result<Expr, Error> {
    num_comparison(">=", args, |n, m| n >= m)
}

fn abs(args: Vec<Expr>) -> Result<Expr, Error> {
    match number_args("abs", &args)?.as_slice() {
        [n] => Ok(Expr::number(n.abs())),
        nums => Err(Error::arity("abs", 1, nums.len())),
    }
}

fn round(args: Vec<Expr>) -> Result<Expr, Error> {
    match number_args("round", &args)?.as_slice() {
        [n] => Ok(Expr::number(n.round())),
        nums => Err(Error::arity("round", 1, nums.len())),
    }
}

fn expt(args: Vec<Expr>) -> Result<Expr, Error> {
    match number_args("expt", &args)?.as_slice() {
        [base, exponent] => Ok(Expr::number(base.powf(*exponent))),
        nums => Err(Error::arity("expt", 2, nums.len())),
    }
}

fn max(args: Vec<Expr>) -> Result<Expr, Error> {
    let nums = number_args("max", &args)?;
    match nums.split_first() {
        None => Err(Error::arity("max", 1, 0)),
        Some((&first, rest)) => {
            Ok(Expr::number(rest.iter().fold(first, |a, &b| a.max(b))))
        }
    }
}

fn min(args: Vec<Expr>) -> Result<Expr, Error> {
    let nums = number_args("min", &args)?;
    match nums.split_first() {
        None => Err(Error::arity("min", 1, 0)),
        Some((&first, rest)) => {
            Ok(Expr::number(rest.iter().fold(first, |a, &b| a.min(b))))
        }
    }
}

// Section: pairs and lists

fn car(args: Vec<Expr>) -> Result<Expr, Error> {
    match args.as_slice() {
        [arg] => match list_arg("car", arg)?.first() {
            Some(item) => Ok(item.clone()),
            None => Err(Error::type_mismatch("car", "a non-empty list",
                arg.clone())),
        },
        _ => Err(Error::arity("car", 1, args.len())),
    }
}

fn cdr(args: Vec<Expr>) -> Result<Expr, Error> {
    match args.as_slice() {
        [arg] => match list_arg("cdr", arg)?.split_first() {
            Some((_, rest)) => Ok(Expr::list(rest.to_vec())),
            None => Err(Error::type_mismatch("cdr", "a non-empty list",
                arg.clone())),
        },
        _ => Err(Error::arity("cdr", 1, args.len())),
    }
}

fn cons(args: Vec<Expr>) -> Result<Expr, Error> {
    match args.as_slice() {
        [head, tail] => {
            let rest = list_arg("cons", tail)?;
            let mut items = Vec::with_capacity(rest.len() + 1);
            items.push(head.clone());
            items.extend_from_slice(rest);
            Ok(Expr::list(items))
        }
        _ => Err(Error::arity("cons", 2, args.len())),
    }
}

fn list(args: Vec<Expr>) -> Result<Expr, Error> {
    Ok(Expr::list(args))
}

fn append(args: Vec<Expr>) -> Result<Expr, Error> {
    let mut items = Vec::new();
    for arg in &args {
        items.extend_from_slice(list_arg("append", arg)?);
    }
    Ok(Expr::list(items))
}

fn length(args: Vec<Expr>) -> Result<Expr, Error> {
    match args.as_slice() {
        [arg] => Ok(Expr::number(list_arg("length", arg)?.len() as f64)),
        _ => Err(Error::arity("length", 1, args.len())),
    }
}

fn is_null(args: Vec<Expr>) -> Result<Expr, Error> {
    match args.as_slice() {
        [arg] => Ok(Expr::boolean(arg.as_list().map_or(false, |items| items.is_empty()))),
        _ => Err(Error::arity("null?", 1, args.len())),
    }
}

fn is_list(args: Vec<Expr>) -> Result<Expr, Error> {
    match args.as_slice() {
        [arg] => Ok(Expr::boolean(arg.as_list().is_some())),
        _ => Err(Error::arity("list?", 1, args.len())),
    }
}

fn map(args: Vec<Expr>) -> Result<Expr, Error> {
    match args.as_slice() {
        [proc, arglist] => {
            let procc = proc.as_procedure()
                .ok_or_else(|| Error::NotCallable(proc.clone()))?;
            let items = list_arg("map", arglist)?;
            let mapped = items.iter()
                .map(|item| procc.apply(vec![item.clone()]))
                .collect::<Result<Vec<Expr>, Error>>()?;
            Ok(Expr::list(mapped))
        }
        _ => Err(Error::arity("map", 2, args.len())),
    }
}

fn apply(args: Vec<Expr>) -> Result<Expr, Error> {
    match args.as_slice() {
        [proc, arglist] => {
            let procc = proc.as_procedure()
                .ok_or_else(|| Error::NotCallable(proc.clone()))?;
            let items = list_arg("apply", arglist)?;
            procc.apply(items.to_vec())
        }
        _ => Err(Error::arity("apply", 2, args.len())),
    }
}

// Section: predicates

fn is_number(args: Vec<Expr>) -> Result<Expr, Error> {
    match args.as_slice() {
        [arg] => Ok(Expr::boolean(arg.as_number().is_some())),
        _ => Err(Error::arity("number?", 1, args.len())),
    }
}

fn is_symbol(args: Vec<Expr>) -> Result<Expr, Error> {
    match args.as_slice() {
        [arg] => Ok(Expr::boolean(arg.as_symbol().is_some())),
        _ => Err(Error::arity("symbol?", 1, args.len())),
    }
}

fn is_boolean(args: Vec<Expr>) -> Result<Expr, Error> {
    match args.as_slice() {
        [arg] => Ok(Expr::boolean(arg.as_boolean().is_some())),
        _ => Err(Error::arity("boolean?", 1, args.len())),
    }
}

fn is_procedure(args: Vec<Expr>) -> Result<Expr, Error> {
    match args.as_slice() {
        [arg] => Ok(Expr::boolean(arg.as_procedure().is_some())),
        _ => Err(Error::arity("procedure?", 1, args.len())),
    }
}

fn not(args: Vec<Expr>) -> Result<Expr, Error> {
    match args.as_slice() {
        [arg] => Ok(Expr::boolean(!arg.is_truthy())),
        _ => Err(Error::arity("not", 1, args.len())),
    }
}

fn eq(args: Vec<Expr>) -> Result<Expr, Error> {
    match args.as_slice() {
        [a, b] => Ok(Expr::boolean(ExprEq::eq(a, b))),
        _ => Err(Error::arity("eq?", 2, args.len())),
    }
}

fn equal(args: Vec<Expr>) -> Result<Expr, Error> {
    match args.as_slice() {
        [a, b] => Ok(Expr::boolean(a.equal(b))),
        _ => Err(Error::arity("equal?", 2, args.len())),
    }
}

// The evaluator's only boundary-crossing side effect. Returns its argument.
fn print(args: Vec<Expr>) -> Result<Expr, Error> {
    match args.as_slice() {
        [arg] => {
            println!("{}", arg);
            Ok(arg.clone())
        }
        _ => Err(Error::arity("print", 1, args.len())),
    }
}

/// The root environment: every built-in procedure plus the math constants.
/// The reader and evaluator never reference this set.
pub fn initial_environment() -> Environment {
    fn native(name: &'static str, func: BuiltinFn) -> Expr {
        Expr::procedure(Procedure::builtin(name, func))
    }

    let pre_hashmap = hashmap! {
        "+" => native("+", sum),
        "-" => native("-", difference),
        "*" => native("*", product),
        "/" => native("/", quotient),
        "=" => native("=", num_eq),
        "<" => native("<", less),
        ">" => native(">", greater),
        "<=" => native("<=", less_equal),
        ">=" => native(">=", greater_equal),
        "abs" => native("abs", abs),
        "round" => native("round", round),
        "expt" => native("expt", expt),
        "max" => native("max", max),
        "min" => native("min", min),
        "car" => native("car", car),
        "cdr" => native("cdr", cdr),
        "cons" => native("cons", cons),
        "list" => native("list", list),
        "append" => native("append", append),
        "length" => native("length", length),
        "null?" => native("null?", is_null),
        "list?" => native("list?", is_list),
        "map" => native("map", map),
        "apply" => native("apply", apply),
        "number?" => native("number?", is_number),
        "symbol?" => native("symbol?", is_symbol),
        "boolean?" => native("boolean?", is_boolean),
        "procedure?" => native("procedure?", is_procedure),
        "not" => native("not", not),
        "eq?" => native("eq?", eq),
        "equal?" => native("equal?", equal),
        "print" => native("print", print),
        "pi" => Expr::number(consts::PI),
        "e" => Expr::number(consts::E),
    };

    let mut hashmap = HashMap::new();
    for (key, value) in pre_hashmap {
        hashmap.insert(key.to_string(), value);
    }

    Environment::from_hashmap(hashmap)
}

#[cfg(test)]
mod test {
    use crate::expr::{Error, Expr};
    use crate::read::read;
    use super::initial_environment;

    fn evaluate(input: &str) -> Result<Expr, Error> {
        read(input).unwrap().eval(&initial_environment())
    }

    fn comparison(input: &str, output: Expr) {
        assert_eq!(evaluate(input), Ok(output));
    }

    #[test]
    fn test_arithmetic() {
        comparison("(- 10 1 2)", Expr::number(7.0));
        comparison("(- 3)", Expr::number(-3.0));
        comparison("(/ 10 4)", Expr::number(2.5));
        comparison("(* 2 3 4)", Expr::number(24.0));
    }

    #[test]
    fn test_comparisons_chain() {
        comparison("(< 1 2 3)", Expr::boolean(true));
        comparison("(< 1 3 2)", Expr::boolean(false));
        comparison("(>= 3 3 2)", Expr::boolean(true));
        comparison("(= 2 2)", Expr::boolean(true));
    }

    #[test]
    fn test_comparison_needs_two_arguments() {
        assert_eq!(evaluate("(< 1)"), Err(Error::arity("<", 2, 1)));
    }

    #[test]
    fn test_arithmetic_type_checked() {
        assert_eq!(evaluate("(+ 1 (list))"),
            Err(Error::type_mismatch("+", "a number", Expr::list(Vec::new()))));
    }

    #[test]
    fn test_list_primitives() {
        comparison("(car (list 1 2 3))", Expr::number(1.0));
        comparison("(cdr (list 1 2 3))",
            Expr::list(vec![Expr::number(2.0), Expr::number(3.0)]));
        comparison("(cons 1 (list 2 3))",
            Expr::list(vec![Expr::number(1.0), Expr::number(2.0),
                Expr::number(3.0)]));
        comparison("(append (list 1) (list 2 3))",
            Expr::list(vec![Expr::number(1.0), Expr::number(2.0),
                Expr::number(3.0)]));
        comparison("(length (list 1 2 3))", Expr::number(3.0));
    }

    #[test]
    fn test_car_of_empty_list_fails() {
        assert!(evaluate("(car (list))").is_err());
        assert!(evaluate("(cdr (list))").is_err());
    }

    #[test]
    fn test_predicates() {
        comparison("(null? (list))", Expr::boolean(true));
        comparison("(null? (list 1))", Expr::boolean(false));
        comparison("(null? 1)", Expr::boolean(false));
        comparison("(list? (list 1))", Expr::boolean(true));
        comparison("(number? 3)", Expr::boolean(true));
        comparison("(symbol? (quote x))", Expr::boolean(true));
        comparison("(procedure? car)", Expr::boolean(true));
        comparison("(procedure? (lambda (x) x))", Expr::boolean(true));
        comparison("(boolean? #f)", Expr::boolean(true));
        comparison("(not #f)", Expr::boolean(true));
        comparison("(not 0)", Expr::boolean(false));
    }

    #[test]
    fn test_apply() {
        comparison("(apply + (list 1 2 3))", Expr::number(6.0));
        comparison("(apply (lambda (x y) (* x y)) (list 3 4))",
            Expr::number(12.0));
    }

    #[test]
    fn test_map() {
        comparison("(map (lambda (x) (* x x)) (list 1 2 3))",
            Expr::list(vec![Expr::number(1.0), Expr::number(4.0),
                Expr::number(9.0)]));
    }

    #[test]
    fn test_supplemental_numerics() {
        comparison("(abs -4)", Expr::number(4.0));
        comparison("(expt 2 10)", Expr::number(1024.0));
        comparison("(round 2.5)", Expr::number(3.0));
        comparison("(max 1 5 3)", Expr::number(5.0));
        comparison("(min 1 5 3)", Expr::number(1.0));
    }

    #[test]
    fn test_division_by_zero_is_infinite() {
        comparison("(/ 1 0)", Expr::number(f64::INFINITY));
    }
}
