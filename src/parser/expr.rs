// パス: src/parser/expr.rs
// 役割: 文・式の解析に関する `Parser` 実装をまとめる
// 意図: 中置演算やラムダ式など複雑なロジックを専用モジュールに切り分ける
// 関連ファイル: src/parser/mod.rs, src/ast.rs

use std::rc::Rc;

use super::*;
use crate::ast::UnaryOp;
use crate::stack::ensure_sufficient_stack;

impl<'s, 't> Parser<'s, 't> {
    /// `名前 = 式` の束縛、またはただの式を解析する。
    pub(super) fn parse_stmt(&mut self) -> Result<Expr, ParseError> {
        let head = self.peek();
        let is_binding = head.kind == TokenKind::Id
            && matches!(self.peek_at(1), Some(t) if t.kind == TokenKind::Op && t.text == "=");
        if !is_binding {
            return self.parse_expr();
        }
        if self.is_type_name(head.text) {
            return Err(self.error(
                "PAR020",
                format!("cannot bind the type name {}", head.text),
                head.pos,
            ));
        }
        self.pop_any();
        self.pop_any(); // '='
        let value = self.parse_expr()?;
        Ok(Expr::Bind {
            name: head.text.to_string(),
            value: Box::new(value),
        })
    }

    pub(super) fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.nested(Self::parse_expr_inner)
    }

    /// 入れ子の深さを数えながら `f` を実行する。上限を超えたら PAR040。
    fn nested(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<Expr, ParseError>,
    ) -> Result<Expr, ParseError> {
        if self.depth >= MAX_NESTING {
            let pos = self.peek().pos;
            return Err(self.error("PAR040", "expression nested too deeply", pos));
        }
        self.depth += 1;
        let result = ensure_sufficient_stack(|| f(self));
        self.depth -= 1;
        result
    }

    fn parse_expr_inner(&mut self) -> Result<Expr, ParseError> {
        let head = self.peek();
        let is_lambda = head.kind == TokenKind::Id
            && matches!(self.peek_at(1), Some(t) if t.kind == TokenKind::Op && t.text == "->");
        if is_lambda {
            return self.parse_lambda();
        }
        self.parse_infix_level(0)
    }

    fn parse_lambda(&mut self) -> Result<Expr, ParseError> {
        let param = self.pop(TokenKind::Id, "parameter name")?;
        if self.is_type_name(param.text) {
            return Err(self.error(
                "PAR021",
                format!("cannot use the type name {} as a parameter", param.text),
                param.pos,
            ));
        }
        self.pop_any(); // '->'
        let body = self.parse_expr()?;
        Ok(Expr::Lambda {
            param: param.text.to_string(),
            body: Rc::new(body),
        })
    }

    fn parse_infix_level(&mut self, level: usize) -> Result<Expr, ParseError> {
        let Some(spec) = INFIX_LEVELS.get(level) else {
            return self.parse_unary();
        };
        let mut lhs = self.parse_infix_level(level + 1)?;
        match spec.assoc {
            Assoc::Left => {
                while let Some(op) = spec.lookup(&self.peek()) {
                    self.pop_any();
                    let rhs = self.parse_infix_level(level + 1)?;
                    lhs = binop(op, lhs, rhs);
                }
            }
            Assoc::Non => {
                if let Some(op) = spec.lookup(&self.peek()) {
                    self.pop_any();
                    let rhs = self.parse_infix_level(level + 1)?;
                    lhs = binop(op, lhs, rhs);
                    let next = self.peek();
                    if spec.lookup(&next).is_some() {
                        return Err(self.error(
                            "PAR030",
                            "comparison operators cannot be chained",
                            next.pos,
                        ));
                    }
                }
            }
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = if self.accept_op("-").is_some() {
            UnaryOp::Neg
        } else if self.accept_op("!").is_some() {
            UnaryOp::Not
        } else {
            return self.parse_power();
        };
        let operand = self.nested(Self::parse_unary)?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    /// `^` は右結合で、指数側には単項演算子を許す（`2 ^ -1`）。
    fn parse_power(&mut self) -> Result<Expr, ParseError> {
        let base = self.parse_postfix()?;
        if self.accept_op("^").is_some() {
            let exp = self.nested(Self::parse_unary)?;
            return Ok(binop(BinOp::Pow, base, exp));
        }
        Ok(base)
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        while self.accept(TokenKind::GroupOpen).is_some() {
            let args = self.parse_comma_list(TokenKind::GroupClose, "')'")?;
            expr = Expr::Call {
                func: Box::new(expr),
                args,
            };
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let t = self.peek();
        match t.kind {
            TokenKind::Int => {
                self.pop_any();
                t.text.parse::<i64>().map(Expr::Int).map_err(|_| {
                    self.error("PAR010", "integer literal out of range", t.pos)
                })
            }
            TokenKind::Real => {
                self.pop_any();
                t.text
                    .parse::<f64>()
                    .map(Expr::Real)
                    .map_err(|_| self.error("PAR011", "malformed real literal", t.pos))
            }
            TokenKind::Str => {
                self.pop_any();
                decode_string(t.text)
                    .map(Expr::Str)
                    .map_err(|msg| self.error("PAR012", msg, t.pos))
            }
            TokenKind::Id => {
                self.pop_any();
                if self.is_type_name(t.text) {
                    Ok(Expr::TypeRef(t.text.to_string()))
                } else {
                    Ok(Expr::Var(t.text.to_string()))
                }
            }
            TokenKind::GroupOpen => {
                self.pop_any();
                if self.accept(TokenKind::GroupClose).is_some() {
                    return Ok(Expr::Unit);
                }
                let inner = self.parse_expr()?;
                self.pop(TokenKind::GroupClose, "')'")?;
                Ok(inner)
            }
            TokenKind::ListOpen => {
                self.pop_any();
                let items = self.parse_comma_list(TokenKind::ListClose, "']'")?;
                Ok(Expr::List(items))
            }
            _ => Err(self.unexpected(&t, "an expression")),
        }
    }

    /// 開き括弧の直後から、閉じ括弧までのカンマ区切りの式を読む。
    fn parse_comma_list(
        &mut self,
        close: TokenKind,
        close_desc: &str,
    ) -> Result<Vec<Expr>, ParseError> {
        let mut items = Vec::new();
        if self.accept(close).is_some() {
            return Ok(items);
        }
        loop {
            items.push(self.parse_expr()?);
            if self.accept_op(",").is_some() {
                continue;
            }
            self.pop(close, close_desc)?;
            return Ok(items);
        }
    }
}

fn binop(op: BinOp, left: Expr, right: Expr) -> Expr {
    Expr::BinOp {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}
