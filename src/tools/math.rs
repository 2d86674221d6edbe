//! BasicMath 工具：字符白名单 + 有界递归下降求值
//!
//! 语法（Python 算术子集）：
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := unary (('*' | '/' | '//') unary)*
//! unary  := ('+' | '-') unary | power
//! power  := atom ('**' unary)?
//! atom   := number | '(' expr ')'
//! ```
//! 整数运算保持整数（i128，超出范围报错），`/` 总是得到浮点数，`//` 向下取整。
//! 浮点数按 Python repr 输出：指数小于 -4 或不小于 16 时用科学计数法（`1e+16`、`1e-05`）。

use async_trait::async_trait;

use crate::tools::{Tool, ToolError};

const ALLOWED_CHARS: &str = "0123456789+-*/(). ";
/// 括号 / 一元符号嵌套上限
const MAX_DEPTH: usize = 64;
/// 整数幂的指数上限
const MAX_EXPONENT: i128 = 1024;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i128),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }
}

impl std::fmt::Display for Number {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{i}"),
            Number::Float(x) => f.write_str(&float_repr(*x)),
        }
    }
}

/// 最短往返表示，规则同 Python 的 float repr
fn float_repr(x: f64) -> String {
    if !x.is_finite() {
        return x.to_string();
    }
    if x == 0.0 {
        return if x.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }
    let sci = format!("{x:e}");
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    if (-4..16).contains(&exp) {
        let plain = x.to_string();
        if plain.contains('.') {
            plain
        } else {
            format!("{plain}.0")
        }
    } else {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exp.abs())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Num(Number),
    Plus,
    Minus,
    Star,
    Slash,
    FloorDiv,
    Pow,
    LParen,
    RParen,
}

fn tokenize(src: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' => i += 1,
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let lit: String = chars[start..i].iter().collect();
                tokens.push(Token::Num(parse_number(&lit)?));
            }
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' if chars.get(i + 1) == Some(&'*') => {
                tokens.push(Token::Pow);
                i += 2;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' if chars.get(i + 1) == Some(&'/') => {
                tokens.push(Token::FloorDiv);
                i += 2;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            other => return Err(format!("unexpected character '{other}'")),
        }
    }
    Ok(tokens)
}

fn parse_number(lit: &str) -> Result<Number, String> {
    if lit.contains('.') {
        if lit == "." || lit.matches('.').count() > 1 {
            return Err(format!("invalid number '{lit}'"));
        }
        lit.parse::<f64>()
            .map(Number::Float)
            .map_err(|_| format!("invalid number '{lit}'"))
    } else {
        lit.parse::<i128>()
            .map(Number::Int)
            .map_err(|_| format!("integer literal too large '{lit}'"))
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token> {
        let t = self.peek();
        self.pos += 1;
        t
    }

    fn enter(&mut self) -> Result<(), String> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err("expression nested too deeply".to_string());
        }
        Ok(())
    }

    fn expr(&mut self) -> Result<Number, String> {
        let mut acc = self.term()?;
        while let Some(op @ (Token::Plus | Token::Minus)) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            acc = binary(op, acc, rhs)?;
        }
        Ok(acc)
    }

    fn term(&mut self) -> Result<Number, String> {
        let mut acc = self.unary()?;
        while let Some(op @ (Token::Star | Token::Slash | Token::FloorDiv)) = self.peek() {
            self.pos += 1;
            let rhs = self.unary()?;
            acc = binary(op, acc, rhs)?;
        }
        Ok(acc)
    }

    fn unary(&mut self) -> Result<Number, String> {
        match self.peek() {
            Some(op @ (Token::Plus | Token::Minus)) => {
                self.pos += 1;
                self.enter()?;
                let v = self.unary()?;
                self.depth -= 1;
                if op == Token::Plus {
                    Ok(v)
                } else {
                    negate(v)
                }
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<Number, String> {
        let base = self.atom()?;
        if self.peek() == Some(Token::Pow) {
            self.pos += 1;
            self.enter()?;
            let exp = self.unary()?;
            self.depth -= 1;
            return binary(Token::Pow, base, exp);
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<Number, String> {
        match self.next() {
            Some(Token::Num(n)) => Ok(n),
            Some(Token::LParen) => {
                self.enter()?;
                let v = self.expr()?;
                self.depth -= 1;
                match self.next() {
                    Some(Token::RParen) => Ok(v),
                    _ => Err("missing closing parenthesis".to_string()),
                }
            }
            Some(_) => Err("invalid syntax".to_string()),
            None => Err("unexpected end of expression".to_string()),
        }
    }
}

fn negate(v: Number) -> Result<Number, String> {
    match v {
        Number::Int(i) => i
            .checked_neg()
            .map(Number::Int)
            .ok_or_else(|| "integer overflow".to_string()),
        Number::Float(f) => Ok(Number::Float(-f)),
    }
}

fn binary(op: Token, lhs: Number, rhs: Number) -> Result<Number, String> {
    use Number::{Float, Int};
    let overflow = || "integer overflow".to_string();
    let result = match (op, lhs, rhs) {
        (Token::Plus, Int(a), Int(b)) => Int(a.checked_add(b).ok_or_else(overflow)?),
        (Token::Minus, Int(a), Int(b)) => Int(a.checked_sub(b).ok_or_else(overflow)?),
        (Token::Star, Int(a), Int(b)) => Int(a.checked_mul(b).ok_or_else(overflow)?),
        (Token::Plus, a, b) => Float(a.as_f64() + b.as_f64()),
        (Token::Minus, a, b) => Float(a.as_f64() - b.as_f64()),
        (Token::Star, a, b) => Float(a.as_f64() * b.as_f64()),
        (Token::Slash | Token::FloorDiv, _, b) if b.as_f64() == 0.0 => {
            return Err(if op == Token::Slash {
                "division by zero".to_string()
            } else {
                "integer division or modulo by zero".to_string()
            })
        }
        (Token::Slash, a, b) => Float(a.as_f64() / b.as_f64()),
        (Token::FloorDiv, Int(a), Int(b)) => {
            let q = a.checked_div_euclid(b).ok_or_else(overflow)?;
            // div_euclid 在除数为负时向上取整，修正为 Python 的向下取整
            Int(q - i128::from(a.rem_euclid(b) != 0 && b < 0))
        }
        (Token::FloorDiv, a, b) => Float((a.as_f64() / b.as_f64()).floor()),
        (Token::Pow, Int(a), Int(b)) if b >= 0 => {
            if b > MAX_EXPONENT {
                return Err("exponent too large".to_string());
            }
            Int(a.checked_pow(b as u32).ok_or_else(overflow)?)
        }
        (Token::Pow, a, b) => {
            if a.as_f64() == 0.0 && b.as_f64() < 0.0 {
                return Err("0.0 cannot be raised to a negative power".to_string());
            }
            let v = a.as_f64().powf(b.as_f64());
            if v.is_nan() {
                return Err("result is not a real number".to_string());
            }
            Float(v)
        }
        _ => return Err("invalid syntax".to_string()),
    };
    if let Float(f) = result {
        if f.is_infinite() {
            return Err("numerical result out of range".to_string());
        }
    }
    Ok(result)
}

/// 求值入口：先检查白名单，再解析。白名单违规返回 InvalidInput，其余为 Parse。
pub fn evaluate(expression: &str) -> Result<Number, ToolError> {
    if !expression.chars().all(|c| ALLOWED_CHARS.contains(c)) {
        return Err(ToolError::InvalidInput(
            "Invalid mathematical expression. Only basic operations are allowed.".to_string(),
        ));
    }
    let tokens = tokenize(expression).map_err(ToolError::Parse)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr().map_err(ToolError::Parse)?;
    if parser.pos != parser.tokens.len() {
        return Err(ToolError::Parse("invalid syntax".to_string()));
    }
    Ok(value)
}

/// BasicMath 工具
pub struct MathTool;

#[async_trait]
impl Tool for MathTool {
    fn name(&self) -> &str {
        "BasicMath"
    }

    fn description(&self) -> &str {
        "Performs basic mathematical calculations. Input: mathematical expression using +, -, *, /, ()."
    }

    async fn execute(&self, input: &str) -> Result<String, ToolError> {
        evaluate(input.trim()).map(|n| n.to_string())
    }

    fn describe_failure(&self, err: &ToolError) -> String {
        match err {
            ToolError::InvalidInput(msg) => msg.clone(),
            ToolError::Parse(msg) => format!("Error evaluating mathematical expression: {msg}"),
            other => format!("Error evaluating mathematical expression: {other}"),
        }
    }
}
