use crate::expr::{format_expr, Expr};
use crate::scanner::Token;

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Block {
        statements: Vec<Stmt>,
    },
    Expression {
        expression: Expr,
    },
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    Print {
        keyword: Token,
        expression: Expr,
    },
    Var {
        name: Token,
        initializer: Option<Expr>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
}

/// Render a statement in the same prefix form as [`crate::expr::print_ast`].
pub fn print_stmt(root: &Stmt) -> String {
    let mut printed = String::new();
    format_stmt(root, &mut printed);
    printed
}

fn format_stmt(stmt: &Stmt, output: &mut String) {
    match stmt {
        Stmt::Block { statements } => {
            output.push_str("(block");
            for statement in statements {
                output.push(' ');
                format_stmt(statement, output);
            }
            output.push(')');
        }
        Stmt::Expression { expression } => {
            output.push_str("(; ");
            format_expr(expression, output);
            output.push(')');
        }
        Stmt::If {
            condition,
            then_branch,
            else_branch,
        } => {
            output.push_str("(if ");
            format_expr(condition, output);
            output.push(' ');
            format_stmt(then_branch, output);
            if let Some(else_branch) = else_branch {
                output.push(' ');
                format_stmt(else_branch, output);
            }
            output.push(')');
        }
        Stmt::Print { expression, .. } => {
            output.push_str("(print ");
            format_expr(expression, output);
            output.push(')');
        }
        Stmt::Var { name, initializer } => {
            output.push_str("(var ");
            output.push_str(&name.lexeme);
            if let Some(initializer) = initializer {
                output.push(' ');
                format_expr(initializer, output);
            }
            output.push(')');
        }
        Stmt::While { condition, body } => {
            output.push_str("(while ");
            format_expr(condition, output);
            output.push(' ');
            format_stmt(body, output);
            output.push(')');
        }
    }
}
