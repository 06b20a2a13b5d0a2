use std::io::Write;
use std::result;

use crate::environment::Environment;
use crate::error::{RuntimeError, RuntimeErrorKind, TypeMismatch};
use crate::expr::Expr;
use crate::scanner::{Token, TokenType};
use crate::stmt::Stmt;
use crate::value::Value;

type ValueResult = result::Result<Value, RuntimeError>;
type StatementResult = result::Result<(), RuntimeError>;

/// Executes statements against a top-level environment that lives as long as
/// the interpreter, so bindings persist across `interpret` calls.
pub struct Interpreter<'a> {
    environment: Environment,
    output_writer: &'a mut dyn Write,
}

impl<'a> Interpreter<'a> {
    pub fn new(output_writer: &'a mut dyn Write) -> Interpreter<'a> {
        Interpreter {
            environment: Environment::new(),
            output_writer,
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Run statements in order, stopping at the first runtime error.
    pub fn interpret(&mut self, statements: &[Stmt]) -> StatementResult {
        tracing::debug!(count = statements.len(), "interpreting statements");
        for statement in statements {
            self.execute_statement(statement)?;
        }
        Ok(())
    }

    fn execute_statement(&mut self, statement: &Stmt) -> StatementResult {
        match statement {
            Stmt::Block { statements } => self.block_statement(statements),
            Stmt::Expression { expression } => {
                self.evaluate(expression)?;
                Ok(())
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => self.if_statement(condition, then_branch, else_branch.as_deref()),
            Stmt::Print { keyword, expression } => self.print_statement(keyword, expression),
            Stmt::Var { name, initializer } => self.var_statement(name, initializer.as_ref()),
            Stmt::While { condition, body } => self.while_statement(condition, body),
        }
    }

    fn block_statement(&mut self, statements: &[Stmt]) -> StatementResult {
        self.environment.push();
        let result = statements
            .iter()
            .try_for_each(|statement| self.execute_statement(statement));
        // make sure to restore the scope chain even after an error
        self.environment.pop();
        result
    }

    fn if_statement(&mut self, condition: &Expr, then_branch: &Stmt, else_branch: Option<&Stmt>) -> StatementResult {
        if self.evaluate(condition)?.is_truthy() {
            self.execute_statement(then_branch)
        } else if let Some(else_statement) = else_branch {
            self.execute_statement(else_statement)
        } else {
            Ok(())
        }
    }

    fn print_statement(&mut self, keyword: &Token, expression: &Expr) -> StatementResult {
        let value = self.evaluate(expression)?;
        writeln!(self.output_writer, "{value}")
            .map_err(|error| RuntimeError::new(keyword, RuntimeErrorKind::Output(error.to_string())))
    }

    fn var_statement(&mut self, name: &Token, initializer: Option<&Expr>) -> StatementResult {
        let value = match initializer {
            Some(initializer) => self.evaluate(initializer)?,
            None => Value::Nil,
        };
        self.environment.define(&name.lexeme, value);
        Ok(())
    }

    fn while_statement(&mut self, condition: &Expr, body: &Stmt) -> StatementResult {
        while self.evaluate(condition)?.is_truthy() {
            self.execute_statement(body)?;
        }
        Ok(())
    }

    fn evaluate(&mut self, expression: &Expr) -> ValueResult {
        match expression {
            Expr::Ternary {
                condition,
                true_expr,
                false_expr,
            } => self.evaluate_ternary(condition, true_expr, false_expr),
            Expr::Assign { name, value } => self.evaluate_assign(name, value),
            Expr::Binary { left, operator, right } => self.evaluate_binary(left, operator, right),
            Expr::Call {
                callee,
                paren,
                arguments,
            } => self.evaluate_call(callee, paren, arguments),
            Expr::Grouping { expression } => self.evaluate(expression),
            Expr::Literal { value } => Ok(value.clone()),
            Expr::Logical { left, operator, right } => self.evaluate_logical(left, operator, right),
            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),
            Expr::Variable { name } => self.environment.get(name),
        }
    }

    // Both branches are evaluated before the condition picks one, side effects included.
    fn evaluate_ternary(&mut self, condition: &Expr, true_expr: &Expr, false_expr: &Expr) -> ValueResult {
        let condition = self.evaluate(condition)?;
        let true_value = self.evaluate(true_expr)?;
        let false_value = self.evaluate(false_expr)?;
        if condition.is_truthy() {
            Ok(true_value)
        } else {
            Ok(false_value)
        }
    }

    fn evaluate_assign(&mut self, name: &Token, value: &Expr) -> ValueResult {
        let result = self.evaluate(value)?;
        self.environment.assign(name, result.clone())?;
        Ok(result)
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> ValueResult {
        let left = self.evaluate(left)?;
        let right = self.evaluate(right)?;

        let evaluated = match operator.token_type {
            TokenType::EqualEqual => Value::Boolean(is_equal(&left, &right)),
            TokenType::BangEqual => Value::Boolean(!is_equal(&left, &right)),
            TokenType::Plus => add(&left, &right, operator)?,
            _ => {
                let (left_number, right_number) = number_operands(&left, &right, operator)?;
                match operator.token_type {
                    TokenType::Minus => Value::Number(left_number - right_number),
                    TokenType::Star => Value::Number(left_number * right_number),
                    TokenType::Slash => {
                        if right_number == 0.0 {
                            return Err(RuntimeError::new(operator, RuntimeErrorKind::DivisionByZero));
                        }
                        Value::Number(left_number / right_number)
                    }
                    TokenType::Greater => Value::Boolean(left_number > right_number),
                    TokenType::GreaterEqual => Value::Boolean(left_number >= right_number),
                    TokenType::Less => Value::Boolean(left_number < right_number),
                    TokenType::LessEqual => Value::Boolean(left_number <= right_number),
                    _ => return Err(unsupported_operator(operator)),
                }
            }
        };
        Ok(evaluated)
    }

    fn evaluate_call(&mut self, callee: &Expr, paren: &Token, arguments: &[Expr]) -> ValueResult {
        let _callee = self.evaluate(callee)?;
        for argument in arguments {
            self.evaluate(argument)?;
        }
        // no value of the language is callable
        Err(RuntimeError::new(paren, RuntimeErrorKind::NotCallable))
    }

    fn evaluate_logical(&mut self, left: &Expr, operator: &Token, right: &Expr) -> ValueResult {
        let left_evaluated = self.evaluate(left)?;

        // short circuit if possible
        let decided = match operator.token_type {
            TokenType::Or => left_evaluated.is_truthy(),
            TokenType::And => !left_evaluated.is_truthy(),
            _ => return Err(unsupported_operator(operator)),
        };
        if decided {
            return Ok(left_evaluated);
        }

        self.evaluate(right)
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> ValueResult {
        let operand = self.evaluate(right)?;
        match operator.token_type {
            TokenType::Bang => Ok(Value::Boolean(!operand.is_truthy())),
            TokenType::Minus => {
                let number = operand
                    .as_number()
                    .ok_or_else(|| RuntimeError::new(operator, TypeMismatch::NumberOperand))?;
                Ok(Value::Number(-number))
            }
            _ => Err(unsupported_operator(operator)),
        }
    }
}

// Expression trees can be built by hand, so the operator token is not guaranteed to fit the node.
fn unsupported_operator(operator: &Token) -> RuntimeError {
    RuntimeError::new(operator, RuntimeErrorKind::UnsupportedOperator(operator.lexeme.clone()))
}

fn is_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Nil, Value::Nil) => true,
        (Value::Nil, _) | (_, Value::Nil) => false,
        _ => left == right,
    }
}

fn add(left: &Value, right: &Value, operator: &Token) -> ValueResult {
    if let (Value::Number(left), Value::Number(right)) = (left, right) {
        return Ok(Value::Number(left + right));
    }

    if left.is_string() || right.is_string() {
        if let Some(right_text) = right.concatenation_text() {
            return Ok(Value::String(format!("{left}{right_text}")));
        }
    }

    Err(RuntimeError::new(operator, TypeMismatch::AdditionOperands))
}

fn number_operands(left: &Value, right: &Value, operator: &Token) -> result::Result<(f64, f64), RuntimeError> {
    match (left.as_number(), right.as_number()) {
        (Some(left), Some(right)) => Ok((left, right)),
        _ => Err(RuntimeError::new(operator, TypeMismatch::NumberOperands)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Diagnostics;
    use crate::parser::parse;
    use crate::scanner::scan_tokens;

    fn statements(code: &str) -> Vec<Stmt> {
        let mut diagnostics = Diagnostics::new();
        let tokens = scan_tokens(code, &mut diagnostics);
        let statements = parse(&tokens, &mut diagnostics);
        assert!(!diagnostics.had_error(), "unexpected errors: {:?}", diagnostics.errors());
        statements
    }

    #[test]
    fn block_scope_is_released_after_runtime_error() {
        let mut buffer = Vec::new();
        let mut interpreter = Interpreter::new(&mut buffer);
        let result = interpreter.interpret(&statements("{ { print missing; } }"));
        assert!(result.is_err());
        assert_eq!(1, interpreter.environment().depth());
    }

    fn operator(token_type: TokenType, lexeme: &str) -> Token {
        Token {
            token_type,
            lexeme: lexeme.to_string(),
            literal: None,
            line: 7,
        }
    }

    #[test]
    fn mismatched_operator_tokens_are_runtime_errors() {
        let expressions = [
            Expr::binary(Expr::literal(1.0), operator(TokenType::And, "and"), Expr::literal(2.0)),
            Expr::logical(Expr::literal(true), operator(TokenType::Plus, "+"), Expr::literal(false)),
            Expr::Unary {
                operator: operator(TokenType::Star, "*"),
                right: Box::new(Expr::literal(3.0)),
            },
        ];

        for expression in expressions {
            let mut buffer = Vec::new();
            let mut interpreter = Interpreter::new(&mut buffer);
            let error = interpreter
                .interpret(&[Stmt::Expression { expression }])
                .unwrap_err();
            assert!(matches!(error.kind, RuntimeErrorKind::UnsupportedOperator(_)), "{error}");
            assert_eq!(7, error.line());
        }
    }

    #[test]
    fn equality_treats_nil_specially() {
        assert!(is_equal(&Value::Nil, &Value::Nil));
        assert!(!is_equal(&Value::Nil, &Value::Boolean(false)));
        assert!(!is_equal(&Value::Number(1.0), &Value::Boolean(true)));
        assert!(is_equal(&Value::from("x"), &Value::from("x")));
    }

    #[test]
    fn failed_output_is_a_runtime_error() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut writer = Broken;
        let mut interpreter = Interpreter::new(&mut writer);
        let error = interpreter.interpret(&statements("\n\nprint 1;")).unwrap_err();
        assert!(matches!(error.kind, RuntimeErrorKind::Output(_)));
        assert_eq!(3, error.line());
    }
}
