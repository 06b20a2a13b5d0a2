use crate::scanner::Token;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Ternary {
        condition: Box<Expr>,
        true_expr: Box<Expr>,
        false_expr: Box<Expr>,
    },
    Assign {
        name: Token,
        value: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        paren: Token,
        arguments: Vec<Expr>,
    },
    Grouping {
        expression: Box<Expr>,
    },
    Literal {
        value: Value,
    },
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },
    Unary {
        operator: Token,
        right: Box<Expr>,
    },
    Variable {
        name: Token,
    },
}

impl Expr {
    pub fn binary(left: Expr, operator: Token, right: Expr) -> Expr {
        Expr::Binary {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }
    }

    pub fn logical(left: Expr, operator: Token, right: Expr) -> Expr {
        Expr::Logical {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }
    }

    pub fn literal(value: impl Into<Value>) -> Expr {
        Expr::Literal { value: value.into() }
    }
}

/// Render an expression in fully parenthesized prefix form, e.g. `(* (- 123) (group 45.67))`.
pub fn print_ast(root: &Expr) -> String {
    let mut printed = String::new();
    format_expr(root, &mut printed);
    printed
}

pub(crate) fn format_expr(expr: &Expr, output: &mut String) {
    match expr {
        Expr::Ternary {
            condition,
            true_expr,
            false_expr,
        } => {
            parenthesize("?", &[condition.as_ref(), true_expr.as_ref(), false_expr.as_ref()], output);
        }
        Expr::Assign { name, value } => {
            output.push_str("(= ");
            output.push_str(&name.lexeme);
            output.push(' ');
            format_expr(value, output);
            output.push(')');
        }
        Expr::Binary { left, operator, right } | Expr::Logical { left, operator, right } => {
            parenthesize(&operator.lexeme, &[left.as_ref(), right.as_ref()], output);
        }
        Expr::Call { callee, arguments, .. } => {
            let mut parts: Vec<&Expr> = vec![callee.as_ref()];
            parts.extend(arguments.iter());
            parenthesize("call", &parts, output);
        }
        Expr::Grouping { expression } => {
            parenthesize("group", &[expression.as_ref()], output);
        }
        Expr::Literal { value } => match value {
            Value::String(text) => {
                output.push('"');
                output.push_str(text);
                output.push('"');
            }
            _ => output.push_str(&value.to_string()),
        },
        Expr::Unary { operator, right } => {
            parenthesize(&operator.lexeme, &[right.as_ref()], output);
        }
        Expr::Variable { name } => {
            output.push_str(&name.lexeme);
        }
    }
}

fn parenthesize(name: &str, exprs: &[&Expr], output: &mut String) {
    output.push('(');
    output.push_str(name);
    for expr in exprs {
        output.push(' ');
        format_expr(expr, output);
    }
    output.push(')');
}
