//! Structured instruction model
//!
//! Programs are supplied as data, never as text. An [`Instruction`] is one of
//! the three counter-machine primitives, a label marker, or a call to a
//! registered macro. A [`MacroDef`] bundles a macro's formal parameters, body
//! and activation-private locals.

use std::fmt;

/// One instruction of a counter-machine program, as supplied by the caller
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Instruction {
    /// `var = var + 1`
    Inc(String),
    /// `var = max(var - 1, 0)`
    Dec(String),
    /// `if var != 0 { goto label }`
    Jnz(String, String),
    /// Label marker; stripped before execution
    Label(String),
    /// Call of a registered macro with positional arguments
    Call(String, Vec<String>),
}

impl Instruction {
    pub fn inc(var: impl Into<String>) -> Self {
        Instruction::Inc(var.into())
    }

    pub fn dec(var: impl Into<String>) -> Self {
        Instruction::Dec(var.into())
    }

    pub fn jnz(var: impl Into<String>, label: impl Into<String>) -> Self {
        Instruction::Jnz(var.into(), label.into())
    }

    pub fn label(name: impl Into<String>) -> Self {
        Instruction::Label(name.into())
    }

    pub fn call<I, S>(name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Instruction::Call(name.into(), args.into_iter().map(Into::into).collect())
    }

    /// Whether this is a label marker rather than an executable instruction
    pub fn is_label(&self) -> bool {
        matches!(self, Instruction::Label(_))
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Inc(var) => write!(f, "inc {}", var),
            Instruction::Dec(var) => write!(f, "dec {}", var),
            Instruction::Jnz(var, label) => write!(f, "jnz {} {}", var, label),
            Instruction::Label(name) => write!(f, "{}:", name),
            Instruction::Call(name, args) => write!(f, "{}({})", name, args.join(", ")),
        }
    }
}

/// Definition of a parameterised, possibly recursive macro
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroDef {
    pub params: Vec<String>,
    pub body: Vec<Instruction>,
    pub locals: Vec<String>,
}

impl MacroDef {
    pub fn new<I, S>(params: I, body: Vec<Instruction>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MacroDef {
            params: params.into_iter().map(Into::into).collect(),
            body,
            locals: Vec::new(),
        }
    }

    /// Declare the locals that get a fresh variable in every activation
    pub fn with_locals<I, S>(mut self, locals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.locals = locals.into_iter().map(Into::into).collect();
        self
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Pretty-print the definition under the given name
    ///
    /// Labels sit at column zero, instructions are indented:
    ///
    /// ```text
    /// zeros(y)
    /// A:
    ///     dec y
    ///     jnz y A
    /// ```
    pub fn render(&self, name: &str) -> String {
        let mut out = format!("{}({})", name, self.params.join(", "));
        if !self.locals.is_empty() {
            out.push_str(&format!("  locals [{}]", self.locals.join(", ")));
        }
        for instr in &self.body {
            out.push('\n');
            if !instr.is_label() {
                out.push_str("    ");
            }
            out.push_str(&instr.to_string());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_display() {
        assert_eq!(Instruction::inc("x").to_string(), "inc x");
        assert_eq!(Instruction::jnz("x", "A").to_string(), "jnz x A");
        assert_eq!(Instruction::label("A").to_string(), "A:");
        assert_eq!(
            Instruction::call("add", ["y", "x1", "x2"]).to_string(),
            "add(y, x1, x2)"
        );
    }

    #[test]
    fn test_render_macro() {
        let def = MacroDef::new(
            ["label"],
            vec![Instruction::inc("_z"), Instruction::jnz("_z", "label")],
        )
        .with_locals(["_z"]);

        assert_eq!(
            def.render("goto"),
            "goto(label)  locals [_z]\n    inc _z\n    jnz _z label"
        );
    }
}
