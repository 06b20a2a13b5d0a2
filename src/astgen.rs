//! Generates Rust enum definitions for AST node families from compact grammar
//! lines such as `Binary -> left: Expr, operator: Token, right: Expr`.

use std::fmt::Write;

use thiserror::Error;

pub const EXPR_GRAMMAR: &[&str] = &[
    "Ternary  -> condition: Expr, trueExpr: Expr, falseExpr: Expr",
    "Assign   -> name: Token, value: Expr",
    "Binary   -> left: Expr, operator: Token, right: Expr",
    "Call     -> callee: Expr, paren: Token, arguments: List[Expr]",
    "Grouping -> expression: Expr",
    "Literal  -> value: object",
    "Logical  -> left: Expr, operator: Token, right: Expr",
    "Unary    -> operator: Token, right: Expr",
    "Variable -> name: Token",
];

pub const STMT_GRAMMAR: &[&str] = &[
    "Block      -> statements: List[Stmt]",
    "Expression -> expression: Expr",
    "If         -> condition: Expr, thenBranch: Stmt, elseBranch: Stmt?",
    "Print      -> keyword: Token, expression: Expr",
    "Var        -> name: Token, initializer: Expr?",
    "While      -> condition: Expr, body: Stmt",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AstGenError {
    #[error("Missing '->' in node description '{0}'")]
    MissingArrow(String),
    #[error("Missing node name in '{0}'")]
    MissingName(String),
    #[error("Malformed field '{field}' in node '{node}'")]
    MalformedField { node: String, field: String },
    #[error("Unsupported field type '{0}'")]
    UnsupportedType(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSpec {
    pub name: String,
    pub fields: Vec<FieldSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub type_name: String,
}

/// Parse one `Name -> field: Type, ...` line.
pub fn parse_node(line: &str) -> Result<NodeSpec, AstGenError> {
    let (name, fields) = line
        .split_once("->")
        .ok_or_else(|| AstGenError::MissingArrow(line.to_string()))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(AstGenError::MissingName(line.to_string()));
    }

    let fields = fields
        .split(',')
        .map(str::trim)
        .filter(|field| !field.is_empty())
        .map(|field| -> Result<FieldSpec, AstGenError> {
            let (field_name, type_name) = field
                .split_once(':')
                .map(|(field_name, type_name)| (field_name.trim(), type_name.trim()))
                .filter(|(field_name, type_name)| !field_name.is_empty() && !type_name.is_empty())
                .ok_or_else(|| AstGenError::MalformedField {
                    node: name.to_string(),
                    field: field.to_string(),
                })?;
            Ok(FieldSpec {
                name: snake_case(field_name),
                type_name: type_name.to_string(),
            })
        })
        .collect::<Result<Vec<_>, AstGenError>>()?;

    Ok(NodeSpec {
        name: name.to_string(),
        fields,
    })
}

/// Map a grammar type to the Rust type of a field inside the `base_name` enum.
pub fn rust_type(type_name: &str, base_name: &str) -> Result<String, AstGenError> {
    if let Some(inner) = type_name.strip_suffix('?') {
        return Ok(format!("Option<{}>", rust_type(inner, base_name)?));
    }
    if let Some(inner) = type_name.strip_prefix("List[").and_then(|rest| rest.strip_suffix(']')) {
        // Vec already provides the indirection a recursive type needs
        let element = match inner {
            "Expr" | "Stmt" | "Token" => inner.to_string(),
            _ => return Err(AstGenError::UnsupportedType(type_name.to_string())),
        };
        return Ok(format!("Vec<{element}>"));
    }

    match type_name {
        "Expr" | "Stmt" if type_name == base_name => Ok(format!("Box<{type_name}>")),
        "Expr" | "Stmt" | "Token" => Ok(type_name.to_string()),
        "object" => Ok("Value".to_string()),
        _ => Err(AstGenError::UnsupportedType(type_name.to_string())),
    }
}

/// Generate the source of a module defining the `base_name` enum.
pub fn define_ast(base_name: &str, grammar: &[&str]) -> Result<String, AstGenError> {
    let nodes = grammar
        .iter()
        .map(|line| parse_node(line))
        .collect::<Result<Vec<_>, _>>()?;

    let mut source = String::new();
    // writing into a String cannot fail
    let _ = writeln!(source, "// Generated by generate_ast. Do not edit.");
    let _ = writeln!(source);
    for import in imports(base_name, &nodes) {
        let _ = writeln!(source, "use {import};");
    }
    let _ = writeln!(source);
    let _ = writeln!(source, "#[derive(Debug, Clone, PartialEq)]");
    let _ = writeln!(source, "pub enum {base_name} {{");
    for node in &nodes {
        if node.fields.is_empty() {
            let _ = writeln!(source, "    {},", node.name);
            continue;
        }
        let _ = writeln!(source, "    {} {{", node.name);
        for field in &node.fields {
            let _ = writeln!(source, "        {}: {},", field.name, rust_type(&field.type_name, base_name)?);
        }
        let _ = writeln!(source, "    }},");
    }
    let _ = writeln!(source, "}}");

    Ok(source)
}

fn imports(base_name: &str, nodes: &[NodeSpec]) -> Vec<&'static str> {
    let uses = |needle: &str| {
        nodes
            .iter()
            .flat_map(|node| node.fields.iter())
            .any(|field| field.type_name.contains(needle))
    };

    let mut imports = Vec::new();
    if base_name != "Expr" && uses("Expr") {
        imports.push("crate::expr::Expr");
    }
    if uses("Token") {
        imports.push("crate::scanner::Token");
    }
    if base_name != "Stmt" && uses("Stmt") {
        imports.push("crate::stmt::Stmt");
    }
    if uses("object") {
        imports.push("crate::value::Value");
    }
    imports
}

fn snake_case(name: &str) -> String {
    let mut converted = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                converted.push('_');
            }
            converted.extend(c.to_lowercase());
        } else {
            converted.push(c);
        }
    }
    converted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_node_line() {
        let node = parse_node("If -> condition: Expr, thenBranch: Stmt, elseBranch: Stmt?").unwrap();
        assert_eq!("If", node.name);
        let names: Vec<&str> = node.fields.iter().map(|field| field.name.as_str()).collect();
        assert_eq!(vec!["condition", "then_branch", "else_branch"], names);
        assert_eq!("Stmt?", node.fields[2].type_name);
    }

    #[test]
    fn maps_types_per_family() {
        assert_eq!(Ok("Box<Expr>".to_string()), rust_type("Expr", "Expr"));
        assert_eq!(Ok("Expr".to_string()), rust_type("Expr", "Stmt"));
        assert_eq!(Ok("Option<Box<Stmt>>".to_string()), rust_type("Stmt?", "Stmt"));
        assert_eq!(Ok("Option<Expr>".to_string()), rust_type("Expr?", "Stmt"));
        assert_eq!(Ok("Vec<Expr>".to_string()), rust_type("List[Expr]", "Expr"));
        assert_eq!(Ok("Value".to_string()), rust_type("object", "Expr"));
        assert_eq!(
            Err(AstGenError::UnsupportedType("Map[Expr]".to_string())),
            rust_type("Map[Expr]", "Expr")
        );
    }

    #[test]
    fn rejects_malformed_lines() {
        assert_eq!(
            Err(AstGenError::MissingArrow("Binary left: Expr".to_string())),
            parse_node("Binary left: Expr")
        );
        assert_eq!(
            Err(AstGenError::MissingName(" -> left: Expr".to_string())),
            parse_node(" -> left: Expr")
        );
        assert!(matches!(
            parse_node("Binary -> left Expr"),
            Err(AstGenError::MalformedField { .. })
        ));
    }

    #[test]
    fn generates_stmt_enum() {
        let source = define_ast("Stmt", STMT_GRAMMAR).unwrap();
        assert!(source.contains("use crate::expr::Expr;"));
        assert!(source.contains("use crate::scanner::Token;"));
        assert!(!source.contains("use crate::stmt::Stmt;"));
        assert!(source.contains("pub enum Stmt {"));
        assert!(source.contains("    If {\n        condition: Expr,\n        then_branch: Box<Stmt>,\n        else_branch: Option<Box<Stmt>>,\n    },"));
        assert!(source.contains("        initializer: Option<Expr>,"));
    }

    #[test]
    fn generates_expr_enum() {
        let source = define_ast("Expr", EXPR_GRAMMAR).unwrap();
        assert!(source.contains("use crate::value::Value;"));
        assert!(source.contains("        true_expr: Box<Expr>,"));
        assert!(source.contains("        arguments: Vec<Expr>,"));
        assert!(source.contains("    Literal {\n        value: Value,\n    },"));
    }
}
