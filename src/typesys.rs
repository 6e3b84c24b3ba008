//! 型ディレクトリと実行時の型解決
//!
//! 目的:
//! - 「この識別子は既知の型名か」という問い合わせに答える登録簿を提供する。
//! - 評価結果の値から表示用の型記述子を求める。
//!
//! 設計ノート:
//! - `TypeDirectory` はセッション中は追記のみ。登録は値を消費して新しい
//!   ディレクトリを返す形にしてあり、既存の参照を壊さない。
//! - 内部は `Rc` で共有するため、環境ごとの複製は安価。

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::evaluator::Value;
use crate::stack::ensure_sufficient_stack;

/// 既定で登録される型名。
pub const PRELUDE_TYPES: &[&str] = &[
    "Unit", "Bool", "Int", "Real", "String", "List", "Function", "Type",
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub name: String,
    pub params: Vec<TypeDescriptor>,
}

impl TypeDescriptor {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    pub fn with_param(mut self, param: TypeDescriptor) -> Self {
        self.params.push(param);
        self
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for p in &self.params {
            if p.params.is_empty() {
                write!(f, " {}", p)?;
            } else {
                ensure_sufficient_stack(|| write!(f, " ({})", p))?;
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
pub struct TypeDirectory {
    types: Rc<BTreeMap<String, TypeDescriptor>>,
}

impl TypeDirectory {
    /// 既定の型名をすべて登録したディレクトリを返す。
    pub fn prelude() -> Self {
        PRELUDE_TYPES
            .iter()
            .fold(Self::default(), |dir, name| {
                dir.register(TypeDescriptor::named(*name))
            })
    }

    /// 型を追加した新しいディレクトリを返す。同名の型が既にあれば変更しない。
    pub fn register(self, desc: TypeDescriptor) -> Self {
        if self.types.contains_key(&desc.name) {
            return self;
        }
        let mut types = self.types;
        Rc::make_mut(&mut types).insert(desc.name.clone(), desc);
        Self { types }
    }

    pub fn lookup(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// 登録済みの型記述子を取り出す。未登録なら名前だけの記述子を返す。
    fn descriptor(&self, name: &str) -> TypeDescriptor {
        self.lookup(name)
            .cloned()
            .unwrap_or_else(|| TypeDescriptor::named(name))
    }
}

/// 評価結果の値に対応する型記述子を求める。
///
/// リストは要素がすべて同じ型のときに限り要素型を引数に持つ（`List Int`）。
pub fn resolve_type(value: &Value, types: &TypeDirectory) -> TypeDescriptor {
    match value {
        Value::Unit => types.descriptor("Unit"),
        Value::Bool(_) => types.descriptor("Bool"),
        Value::Int(_) => types.descriptor("Int"),
        Value::Real(_) => types.descriptor("Real"),
        Value::Str(_) => types.descriptor("String"),
        Value::Type(_) => types.descriptor("Type"),
        Value::Builtin(_) | Value::Closure(_) => types.descriptor("Function"),
        Value::List(items) => {
            let list = types.descriptor("List");
            let mut elems = items
                .iter()
                .map(|v| ensure_sufficient_stack(|| resolve_type(v, types)));
            match elems.next() {
                Some(first) if elems.all(|t| t == first) => list.with_param(first),
                _ => list,
            }
        }
    }
}
