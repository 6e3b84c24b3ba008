//! 評価器（evaluator）
//!
//! 目的:
//! - 正格・副作用なしの簡易評価器。唯一の副作用は `exit()` による終了要求で、
//!   これは `Effects` を介して呼び出し元へ伝わる。
//! - 環境 `Env` は値として受け渡す。`evaluate` は古い環境を消費し、新しい環境を返す。
//!
//! 仕様要点:
//! - 整数演算はオーバーフローを検査してエラーにする。
//! - `/` は常に `Real` を返す。`^` は非負整数指数のとき整数計算、それ以外は `Real`。
//! - 型名を関数として呼ぶと変換になる（`Int(2.9)` → `2`）。

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::ast::{BinOp, Expr, UnaryOp};
use crate::errors::EvalError;
use crate::stack::ensure_sufficient_stack;
use crate::typesys::TypeDirectory;

pub type Scope = Rc<HashMap<String, Value>>;

/// 式の評価で入れ子にできる深さの上限。
pub const MAX_EVAL_DEPTH: usize = 10_000;

pub type BuiltinFn = fn(Vec<Value>, &mut Effects) -> Result<Value, EvalError>;

#[derive(Clone, Debug)]
pub enum Value {
    Unit,
    Bool(bool),
    Int(i64),
    Real(f64),
    Str(String),
    List(Vec<Value>),
    Type(String),
    Builtin(Builtin),
    Closure(Closure),
}

#[derive(Clone)]
pub struct Builtin {
    pub name: Rc<str>,
    pub arity: usize,
    pub f: BuiltinFn,
    pub applied: Vec<Value>,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builtin")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("applied", &self.applied)
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct Closure {
    pub param: String,
    pub body: Rc<Expr>,
    pub captured: Scope,
}

/// 評価中に発生した副作用の記録。
#[derive(Debug, Default)]
pub struct Effects {
    pub halt_requested: bool,
    depth: usize,
}

/// 束縛と型ディレクトリをまとめた評価環境。複製は安価（内部は `Rc`）。
#[derive(Clone, Debug)]
pub struct Env {
    bindings: Scope,
    types: TypeDirectory,
    halted: bool,
}

impl Env {
    pub fn new(types: TypeDirectory) -> Self {
        Self {
            bindings: Rc::new(HashMap::new()),
            types,
            halted: false,
        }
    }

    pub fn types(&self) -> &TypeDirectory {
        &self.types
    }

    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    /// `exit()` が呼ばれた後かどうか。
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// 名前を束縛した新しい環境を返す。
    pub fn bind(self, name: impl Into<String>, value: Value) -> Self {
        let mut bindings = self.bindings;
        Rc::make_mut(&mut bindings).insert(name.into(), value);
        Self { bindings, ..self }
    }

    fn absorb(mut self, fx: Effects) -> Self {
        self.halted |= fx.halt_requested;
        self
    }
}

/// 組み込み関数を登録し、そのハンドルと新しい環境を返す。
pub fn register_builtin_callable(
    name: &str,
    arity: usize,
    f: BuiltinFn,
    env: Env,
) -> (Value, Env) {
    let handle = Value::Builtin(Builtin {
        name: name.into(),
        arity,
        f,
        applied: Vec::new(),
    });
    let env = env.bind(name, handle.clone());
    (handle, env)
}

/// 値を名前へ束縛し、そのハンドルと新しい環境を返す。
pub fn bind_name(name: &str, value: Value, env: Env) -> (Value, Env) {
    let env = env.bind(name, value.clone());
    (value, env)
}

/// 既定の型ディレクトリと基本的な束縛（`true` / `false` / `len`）を持つ環境。
pub fn initial_env() -> Env {
    let env = Env::new(TypeDirectory::prelude());
    let (_, env) = bind_name("true", Value::Bool(true), env);
    let (_, env) = bind_name("false", Value::Bool(false), env);
    let (_, env) = register_builtin_callable("len", 1, builtin_len, env);
    env
}

fn builtin_len(args: Vec<Value>, _fx: &mut Effects) -> Result<Value, EvalError> {
    let n = match &args[0] {
        Value::List(items) => items.len(),
        Value::Str(s) => s.chars().count(),
        other => {
            return Err(EvalError::new(
                "EVAL050",
                format!("len: unsupported value {}", to_display_string(other)),
            ))
        }
    };
    i64::try_from(n)
        .map(Value::Int)
        .map_err(|_| EvalError::new("EVAL060", "len: length exceeds Int range"))
}

/// トップレベル式を評価し、結果と新しい環境を返す。
pub fn evaluate(expr: &Expr, env: Env) -> Result<(Value, Env), EvalError> {
    let mut fx = Effects::default();
    match expr {
        Expr::Bind { name, value } => {
            let v = eval_in(value, &env.bindings, &mut fx)?;
            let env = env.bind(name.clone(), v.clone()).absorb(fx);
            Ok((v, env))
        }
        _ => {
            let v = eval_in(expr, &env.bindings, &mut fx)?;
            Ok((v, env.absorb(fx)))
        }
    }
}

fn eval_in(expr: &Expr, scope: &Scope, fx: &mut Effects) -> Result<Value, EvalError> {
    if fx.depth >= MAX_EVAL_DEPTH {
        return Err(EvalError::new("EVAL070", "recursion limit exceeded"));
    }
    fx.depth += 1;
    let result = ensure_sufficient_stack(|| eval_node(expr, scope, fx));
    fx.depth -= 1;
    result
}

fn eval_node(expr: &Expr, scope: &Scope, fx: &mut Effects) -> Result<Value, EvalError> {
    match expr {
        Expr::Unit => Ok(Value::Unit),
        Expr::Int(i) => Ok(Value::Int(*i)),
        Expr::Real(r) => Ok(Value::Real(*r)),
        Expr::Str(s) => Ok(Value::Str(s.clone())),
        Expr::Var(name) => scope
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::new("EVAL001", format!("unbound name: {}", name))),
        Expr::TypeRef(name) => Ok(Value::Type(name.clone())),
        Expr::List(items) => items
            .iter()
            .map(|e| eval_in(e, scope, fx))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        Expr::Lambda { param, body } => Ok(Value::Closure(Closure {
            param: param.clone(),
            body: Rc::clone(body),
            captured: Rc::clone(scope),
        })),
        Expr::Call { func, args } => {
            let f = eval_in(func, scope, fx)?;
            let args = args
                .iter()
                .map(|e| eval_in(e, scope, fx))
                .collect::<Result<Vec<_>, _>>()?;
            apply(f, args, fx)
        }
        Expr::Unary { op, operand } => {
            let v = eval_in(operand, scope, fx)?;
            apply_unary(*op, v)
        }
        Expr::BinOp { op, left, right } => {
            let l = eval_in(left, scope, fx)?;
            let r = eval_in(right, scope, fx)?;
            apply_binop(*op, l, r)
        }
        Expr::Bind { name, .. } => Err(EvalError::new(
            "EVAL090",
            format!("binding {} is only allowed at top level", name),
        )),
    }
}

fn apply(f: Value, args: Vec<Value>, fx: &mut Effects) -> Result<Value, EvalError> {
    match f {
        Value::Builtin(mut b) => {
            let needed = b.arity - b.applied.len();
            if args.len() < needed {
                b.applied.extend(args);
                return Ok(Value::Builtin(b));
            }
            let mut args = args;
            let rest = args.split_off(needed);
            let mut all = std::mem::take(&mut b.applied);
            all.extend(args);
            let result = (b.f)(all, fx)?;
            if rest.is_empty() {
                Ok(result)
            } else {
                apply(result, rest, fx)
            }
        }
        Value::Closure(c) => {
            if args.is_empty() {
                return Err(EvalError::new(
                    "EVAL020",
                    format!("function of {} expects an argument", c.param),
                ));
            }
            let mut args = args.into_iter();
            let mut result = Value::Closure(c);
            while let Some(arg) = args.next() {
                result = match result {
                    Value::Closure(c) => call_closure(&c, arg, fx)?,
                    other => {
                        let mut rest = vec![arg];
                        rest.extend(args);
                        return apply(other, rest, fx);
                    }
                };
            }
            Ok(result)
        }
        Value::Type(name) => {
            let [arg]: [Value; 1] = args.try_into().map_err(|args: Vec<Value>| {
                EvalError::new(
                    "EVAL020",
                    format!("{} conversion expects 1 argument, got {}", name, args.len()),
                )
            })?;
            convert(&name, arg)
        }
        other => Err(EvalError::new(
            "EVAL021",
            format!("{} is not callable", to_display_string(&other)),
        )),
    }
}

fn call_closure(c: &Closure, arg: Value, fx: &mut Effects) -> Result<Value, EvalError> {
    let mut scope = Rc::clone(&c.captured);
    Rc::make_mut(&mut scope).insert(c.param.clone(), arg);
    eval_in(&c.body, &scope, fx)
}

fn convert(type_name: &str, v: Value) -> Result<Value, EvalError> {
    let fail = |v: &Value| {
        EvalError::new(
            "EVAL064",
            format!("cannot convert {} to {}", to_display_string(v), type_name),
        )
    };
    match (type_name, v) {
        ("Int", Value::Int(i)) => Ok(Value::Int(i)),
        ("Int", Value::Bool(b)) => Ok(Value::Int(i64::from(b))),
        ("Int", Value::Real(r)) => {
            let t = r.trunc();
            if t.is_finite() && t >= i64::MIN as f64 && t < i64::MAX as f64 {
                Ok(Value::Int(t as i64))
            } else {
                Err(fail(&Value::Real(r)))
            }
        }
        ("Int", Value::Str(s)) => match s.trim().parse::<i64>() {
            Ok(i) => Ok(Value::Int(i)),
            Err(_) => Err(fail(&Value::Str(s))),
        },
        ("Real", Value::Int(i)) => Ok(Value::Real(i as f64)),
        ("Real", Value::Real(r)) => Ok(Value::Real(r)),
        ("Real", Value::Str(s)) => match s.trim().parse::<f64>() {
            Ok(r) => Ok(Value::Real(r)),
            Err(_) => Err(fail(&Value::Str(s))),
        },
        ("String", Value::Str(s)) => Ok(Value::Str(s)),
        ("String", other) => Ok(Value::Str(to_display_string(&other))),
        ("Bool", Value::Bool(b)) => Ok(Value::Bool(b)),
        ("Bool", Value::Int(i)) => Ok(Value::Bool(i != 0)),
        ("Bool", Value::Str(s)) => Ok(Value::Bool(!s.is_empty())),
        ("Bool", Value::List(items)) => Ok(Value::Bool(!items.is_empty())),
        ("List", Value::List(items)) => Ok(Value::List(items)),
        ("List", Value::Str(s)) => Ok(Value::List(
            s.chars().map(|c| Value::Str(c.to_string())).collect(),
        )),
        (_, other) => Err(fail(&other)),
    }
}

fn apply_unary(op: UnaryOp, v: Value) -> Result<Value, EvalError> {
    match (op, v) {
        (UnaryOp::Neg, Value::Int(i)) => i
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| EvalError::new("EVAL060", "negation overflows Int")),
        (UnaryOp::Neg, Value::Real(r)) => Ok(Value::Real(-r)),
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (op, v) => Err(EvalError::new(
            "EVAL050",
            format!(
                "{}: unsupported operand {}",
                if op == UnaryOp::Neg { "-" } else { "!" },
                to_display_string(&v)
            ),
        )),
    }
}

fn to_real(v: &Value) -> Option<f64> {
    match v {
        Value::Int(i) => Some(*i as f64),
        Value::Real(r) => Some(*r),
        _ => None,
    }
}

fn overflow(op: BinOp) -> EvalError {
    EvalError::new(
        "EVAL060",
        format!("({}) result exceeds Int range", op.symbol()),
    )
}

fn apply_binop(op: BinOp, l: Value, r: Value) -> Result<Value, EvalError> {
    use BinOp::*;
    match op {
        Eq => return values_equal(&l, &r).map(Value::Bool),
        Ne => return values_equal(&l, &r).map(|b| Value::Bool(!b)),
        Lt | Le | Gt | Ge => {
            let ord = compare(&l, &r)?;
            let b = match op {
                Lt => ord == Ordering::Less,
                Le => ord != Ordering::Greater,
                Gt => ord == Ordering::Greater,
                _ => ord != Ordering::Less,
            };
            return Ok(Value::Bool(b));
        }
        _ => {}
    }
    match (op, l, r) {
        (Add, Value::Int(a), Value::Int(b)) => {
            a.checked_add(b).map(Value::Int).ok_or_else(|| overflow(op))
        }
        (Sub, Value::Int(a), Value::Int(b)) => {
            a.checked_sub(b).map(Value::Int).ok_or_else(|| overflow(op))
        }
        (Mul, Value::Int(a), Value::Int(b)) => {
            a.checked_mul(b).map(Value::Int).ok_or_else(|| overflow(op))
        }
        (Rem, Value::Int(_), Value::Int(0)) => {
            Err(EvalError::new("EVAL061", "(%) division by zero"))
        }
        (Rem, Value::Int(a), Value::Int(b)) => {
            a.checked_rem(b).map(Value::Int).ok_or_else(|| overflow(op))
        }
        (Pow, Value::Int(a), Value::Int(b)) if b >= 0 => {
            let exp = u32::try_from(b).map_err(|_| overflow(op))?;
            a.checked_pow(exp).map(Value::Int).ok_or_else(|| overflow(op))
        }
        (Add, Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
        (Add, Value::List(mut a), Value::List(b)) => {
            a.extend(b);
            Ok(Value::List(a))
        }
        (op, l, r) => {
            let (Some(a), Some(b)) = (to_real(&l), to_real(&r)) else {
                return Err(EvalError::new(
                    "EVAL050",
                    format!(
                        "({}): unsupported operands {} and {}",
                        op.symbol(),
                        to_display_string(&l),
                        to_display_string(&r)
                    ),
                ));
            };
            let v = match op {
                Add => a + b,
                Sub => a - b,
                Mul => a * b,
                Div => a / b,
                Rem => a % b,
                _ => a.powf(b),
            };
            Ok(Value::Real(v))
        }
    }
}

fn values_equal(a: &Value, b: &Value) -> Result<bool, EvalError> {
    Ok(match (a, b) {
        (Value::Unit, Value::Unit) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::Type(x), Value::Type(y)) => x == y,
        (Value::List(xs), Value::List(ys)) => {
            if xs.len() != ys.len() {
                return Ok(false);
            }
            for (x, y) in xs.iter().zip(ys) {
                if !values_equal(x, y)? {
                    return Ok(false);
                }
            }
            true
        }
        (Value::Builtin(_) | Value::Closure(_), _) | (_, Value::Builtin(_) | Value::Closure(_)) => {
            return Err(EvalError::new("EVAL050", "functions cannot be compared"))
        }
        _ => match (to_real(a), to_real(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
    })
}

fn compare(a: &Value, b: &Value) -> Result<Ordering, EvalError> {
    let unsupported = || {
        EvalError::new(
            "EVAL050",
            format!(
                "cannot order {} and {}",
                to_display_string(a),
                to_display_string(b)
            ),
        )
    };
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Ok(x.cmp(y)),
        (Value::Str(x), Value::Str(y)) => Ok(x.cmp(y)),
        (Value::List(xs), Value::List(ys)) => {
            for (x, y) in xs.iter().zip(ys) {
                let ord = compare(x, y)?;
                if ord != Ordering::Equal {
                    return Ok(ord);
                }
            }
            Ok(xs.len().cmp(&ys.len()))
        }
        _ => match (to_real(a), to_real(b)) {
            (Some(x), Some(y)) => x
                .partial_cmp(&y)
                .ok_or_else(|| EvalError::new("EVAL090", "NaN comparison")),
            _ => Err(unsupported()),
        },
    }
}

fn format_real(r: f64) -> String {
    if r.is_nan() {
        return "nan".into();
    }
    if r.is_infinite() {
        return if r > 0.0 { "inf".into() } else { "-inf".into() };
    }
    let s = format!("{}", r);
    if s.contains(['.', 'e', 'E']) {
        s
    } else {
        s + ".0"
    }
}

fn escape_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// 値を表示用の文字列へ変換する。出力は字句解析器で再び読める形にする。
pub fn to_display_string(v: &Value) -> String {
    match v {
        Value::Unit => "()".into(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Real(r) => format_real(*r),
        Value::Str(s) => escape_str(s),
        Value::List(items) => {
            let parts: Vec<String> =
                ensure_sufficient_stack(|| items.iter().map(to_display_string).collect());
            format!("[{}]", parts.join(", "))
        }
        Value::Type(name) => name.clone(),
        Value::Builtin(b) => format!("<builtin {}>", b.name),
        Value::Closure(c) => format!("<lambda {}>", c.param),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expr;

    fn eval_str(src: &str) -> Result<Value, EvalError> {
        let env = initial_env();
        let expr = parse_expr(src, env.types()).expect("parse");
        evaluate(&expr, env).map(|(v, _)| v)
    }

    fn show(src: &str) -> String {
        to_display_string(&eval_str(src).unwrap())
    }

    #[test]
    /// 止まらない自己適用が再帰上限のエラーになり、上限内の入れ子は評価できることを確認する。
    fn recursion_limit_is_reported() {
        assert_eq!(
            eval_str("(x -> x(x))(x -> x(x))").unwrap_err().0.code,
            "EVAL070"
        );
        let src = format!("{}1{}", "[".repeat(300), "]".repeat(300));
        assert!(matches!(eval_str(&src), Ok(Value::List(_))));
    }

    #[test]
    /// 算術演算の基本的な結果を検証する。
    fn arithmetic_basics() {
        assert_eq!(show("1 + 2"), "3");
        assert_eq!(show("7 / 2"), "3.5");
        assert_eq!(show("7 % 3"), "1");
        assert_eq!(show("2 ^ 10"), "1024");
        assert_eq!(show("2 ^ -1"), "0.5");
        assert_eq!(show("1 + 0.5"), "1.5");
        assert_eq!(show("4 / 2"), "2.0");
    }

    #[test]
    /// 整数オーバーフローとゼロ除算がエラーになることを確認する。
    fn overflow_and_division_by_zero() {
        assert_eq!(eval_str("9223372036854775807 + 1").unwrap_err().0.code, "EVAL060");
        assert_eq!(eval_str("1 % 0").unwrap_err().0.code, "EVAL061");
        assert_eq!(show("1 / 0"), "inf");
    }

    #[test]
    /// 文字列・リストの連結と比較を確認する。
    fn strings_and_lists() {
        assert_eq!(show("\"ab\" + \"c\""), "\"abc\"");
        assert_eq!(show("[1] + [2, 3]"), "[1, 2, 3]");
        assert_eq!(show("[1, 2] < [1, 3]"), "true");
        assert_eq!(show("len(\"héllo\")"), "5");
        assert_eq!(show("\"a\\\"b\""), "\"a\\\"b\"");
    }

    #[test]
    /// 型名による変換を検証する。
    fn type_conversions() {
        assert_eq!(show("Int(2.9)"), "2");
        assert_eq!(show("Real(2)"), "2.0");
        assert_eq!(show("String(42)"), "\"42\"");
        assert_eq!(show("Int(\" 7 \")"), "7");
        assert_eq!(show("Int"), "Int");
        assert_eq!(eval_str("Int(\"x\")").unwrap_err().0.code, "EVAL064");
        assert_eq!(eval_str("Int(1, 2)").unwrap_err().0.code, "EVAL020");
    }

    #[test]
    /// ラムダのカリー化と部分適用を確認する。
    fn lambdas_and_partial_application() {
        assert_eq!(show("(x -> y -> x * y)(3, 4)"), "12");
        assert_eq!(show("(x -> y -> x - y)(10)(4)"), "6");
        assert_eq!(show("x -> x"), "<lambda x>");
        assert_eq!(show("len"), "<builtin len>");
        assert_eq!(eval_str("1(2)").unwrap_err().0.code, "EVAL021");
    }

    #[test]
    /// 束縛が新しい環境に反映され、元の環境は変わらないことを確認する。
    fn binding_threads_environment() {
        let env = initial_env();
        let before = env.clone();
        let expr = crate::ast::Expr::Bind {
            name: "x".into(),
            value: Box::new(crate::ast::Expr::Int(5)),
        };
        let (v, env) = evaluate(&expr, env).unwrap();
        assert!(matches!(v, Value::Int(5)));
        assert!(matches!(env.lookup("x"), Some(Value::Int(5))));
        assert!(before.lookup("x").is_none());
    }

    #[test]
    /// 未束縛の名前がエラーコード付きで報告されるか確認する。
    fn unbound_name_is_reported() {
        let err = eval_str("nope + 1").unwrap_err();
        assert_eq!(err.0.code, "EVAL001");
        assert!(err.0.msg.contains("nope"));
    }

    #[test]
    /// 組み込み関数の終了要求が環境の停止フラグへ反映されるか検証する。
    fn halt_effect_is_absorbed_into_env() {
        fn stop(_: Vec<Value>, fx: &mut Effects) -> Result<Value, EvalError> {
            fx.halt_requested = true;
            Ok(Value::Unit)
        }
        let (_, env) = register_builtin_callable("stop", 0, stop, initial_env());
        let expr = parse_expr("stop()", env.types()).unwrap();
        assert!(!env.is_halted());
        let (v, env) = evaluate(&expr, env).unwrap();
        assert!(matches!(v, Value::Unit));
        assert!(env.is_halted());
    }

    #[test]
    /// 実数の表示が常に小数部または指数部を持つことを確認する。
    fn real_display_keeps_fraction() {
        assert_eq!(format_real(3.0), "3.0");
        assert_eq!(format_real(-0.25), "-0.25");
        assert_eq!(format_real(f64::NAN), "nan");
    }
}
