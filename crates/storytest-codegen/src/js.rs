//! JavaScript syntax tree and printer
//!
//! Covers only the constructs generated tests need. Printing is
//! deterministic: two-space indentation, double-quoted strings, `;`
//! after every simple statement.

use std::fmt::Write as _;

/// Expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Identifier reference
    Ident(String),
    /// String literal
    Str(String),
    /// Boolean literal
    Bool(bool),
    /// `object.property`
    Member(Box<Expr>, String),
    /// `callee(args)`
    Call(Box<Expr>, Vec<Expr>),
    /// `new callee(args)`
    New(Box<Expr>, Vec<Expr>),
    /// `await expr`
    Await(Box<Expr>),
    /// `!expr`
    Not(Box<Expr>),
    /// `left in right`
    In(Box<Expr>, Box<Expr>),
    /// Object literal; a value equal to its key's identifier prints as shorthand
    Object(Vec<(String, Expr)>),
    /// Arrow function
    Arrow(Box<Arrow>),
}

impl Expr {
    /// Identifier
    #[inline]
    #[must_use]
    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Ident(name.into())
    }

    /// String literal
    #[inline]
    #[must_use]
    pub fn str(value: impl Into<String>) -> Self {
        Expr::Str(value.into())
    }

    /// Member access
    #[inline]
    #[must_use]
    pub fn dot(self, property: impl Into<String>) -> Self {
        Expr::Member(Box::new(self), property.into())
    }

    /// Call with arguments
    #[inline]
    #[must_use]
    pub fn call(self, args: Vec<Expr>) -> Self {
        Expr::Call(Box::new(self), args)
    }

    /// Await this expression
    #[inline]
    #[must_use]
    pub fn awaited(self) -> Self {
        Expr::Await(Box::new(self))
    }

    /// Logical negation
    #[inline]
    #[must_use]
    pub fn negate(self) -> Self {
        Expr::Not(Box::new(self))
    }

    /// Object literal from pairs
    #[must_use]
    pub fn object<K: Into<String>>(props: impl IntoIterator<Item = (K, Expr)>) -> Self {
        Expr::Object(props.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    fn is_primary(&self) -> bool {
        matches!(
            self,
            Expr::Ident(_) | Expr::Str(_) | Expr::Bool(_) | Expr::Member(..) | Expr::Call(..) | Expr::Object(_)
        )
    }
}

/// Arrow function parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    /// Plain binding
    Ident(String),
    /// `{ a, b }` destructuring
    Destructure(Vec<String>),
}

/// Arrow function body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArrowBody {
    /// Concise expression body
    Expr(Expr),
    /// Block body
    Block(Vec<Stmt>),
}

/// Arrow function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arrow {
    /// `async` arrow
    pub is_async: bool,
    /// Parameters
    pub params: Vec<Param>,
    /// Body
    pub body: ArrowBody,
}

impl Arrow {
    /// Async arrow with a block body
    #[must_use]
    pub fn async_block(params: Vec<Param>, body: Vec<Stmt>) -> Expr {
        Expr::Arrow(Box::new(Self {
            is_async: true,
            params,
            body: ArrowBody::Block(body),
        }))
    }

    /// Sync arrow with a block body
    #[must_use]
    pub fn block(params: Vec<Param>, body: Vec<Stmt>) -> Expr {
        Expr::Arrow(Box::new(Self {
            is_async: false,
            params,
            body: ArrowBody::Block(body),
        }))
    }

    /// Sync arrow with an expression body
    #[must_use]
    pub fn concise(params: Vec<Param>, body: Expr) -> Expr {
        Expr::Arrow(Box::new(Self {
            is_async: false,
            params,
            body: ArrowBody::Expr(body),
        }))
    }
}

/// Statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    /// `const name = init;`
    Const(String, Expr),
    /// `expr;`
    Expr(Expr),
    /// `return expr;`
    Return(Expr),
    /// `throw expr;`
    Throw(Expr),
    /// `if (test) { ... } else { ... }`
    If {
        /// Condition
        test: Expr,
        /// Then branch
        consequent: Vec<Stmt>,
        /// Else branch, omitted when empty
        alternate: Vec<Stmt>,
    },
    /// `try { ... } catch (param) { ... } finally { ... }`
    Try {
        /// Protected block
        block: Vec<Stmt>,
        /// Catch parameter and handler
        handler: Option<(String, Vec<Stmt>)>,
        /// Finally block, omitted when empty
        finalizer: Vec<Stmt>,
    },
}

/// Render statements as source text
#[must_use]
pub fn print(stmts: &[Stmt]) -> String {
    let mut printer = Printer::default();
    for stmt in stmts {
        printer.stmt(stmt);
    }
    printer.out
}

/// Quote a string as a JavaScript double-quoted literal
#[must_use]
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

#[derive(Default)]
struct Printer {
    out: String,
    indent: usize,
}

impl Printer {
    fn line_start(&mut self) {
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
    }

    fn block(&mut self, stmts: &[Stmt]) {
        if stmts.is_empty() {
            self.out.push_str("{}");
            return;
        }
        self.out.push_str("{\n");
        self.indent += 1;
        for stmt in stmts {
            self.stmt(stmt);
        }
        self.indent -= 1;
        self.line_start();
        self.out.push('}');
    }

    fn stmt(&mut self, stmt: &Stmt) {
        self.line_start();
        match stmt {
            Stmt::Const(name, init) => {
                let _ = write!(self.out, "const {name} = ");
                self.expr(init);
                self.out.push_str(";\n");
            }
            Stmt::Expr(expr) => {
                self.expr(expr);
                self.out.push_str(";\n");
            }
            Stmt::Return(expr) => {
                self.out.push_str("return ");
                self.expr(expr);
                self.out.push_str(";\n");
            }
            Stmt::Throw(expr) => {
                self.out.push_str("throw ");
                self.expr(expr);
                self.out.push_str(";\n");
            }
            Stmt::If {
                test,
                consequent,
                alternate,
            } => {
                self.out.push_str("if (");
                self.expr(test);
                self.out.push_str(") ");
                self.block(consequent);
                if !alternate.is_empty() {
                    self.out.push_str(" else ");
                    self.block(alternate);
                }
                self.out.push('\n');
            }
            Stmt::Try {
                block,
                handler,
                finalizer,
            } => {
                self.out.push_str("try ");
                self.block(block);
                if let Some((param, body)) = handler {
                    let _ = write!(self.out, " catch ({param}) ");
                    self.block(body);
                }
                if !finalizer.is_empty() {
                    self.out.push_str(" finally ");
                    self.block(finalizer);
                }
                self.out.push('\n');
            }
        }
    }

    fn operand(&mut self, expr: &Expr) {
        if expr.is_primary() {
            self.expr(expr);
        } else {
            self.out.push('(');
            self.expr(expr);
            self.out.push(')');
        }
    }

    fn args(&mut self, args: &[Expr]) {
        self.out.push('(');
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.expr(arg);
        }
        self.out.push(')');
    }

    fn expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Ident(name) => self.out.push_str(name),
            Expr::Str(value) => self.out.push_str(&quote(value)),
            Expr::Bool(value) => self.out.push_str(if *value { "true" } else { "false" }),
            Expr::Member(object, property) => {
                self.operand(object);
                self.out.push('.');
                self.out.push_str(property);
            }
            Expr::Call(callee, args) => {
                self.operand(callee);
                self.args(args);
            }
            Expr::New(callee, args) => {
                self.out.push_str("new ");
                self.operand(callee);
                self.args(args);
            }
            Expr::Await(inner) => {
                self.out.push_str("await ");
                self.operand(inner);
            }
            Expr::Not(inner) => {
                self.out.push('!');
                self.operand(inner);
            }
            Expr::In(left, right) => {
                self.operand(left);
                self.out.push_str(" in ");
                self.operand(right);
            }
            Expr::Object(props) => self.object(props),
            Expr::Arrow(arrow) => self.arrow(arrow),
        }
    }

    fn object(&mut self, props: &[(String, Expr)]) {
        if props.is_empty() {
            self.out.push_str("{}");
            return;
        }
        self.out.push_str("{ ");
        for (i, (key, value)) in props.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            let key_text = if is_identifier(key) {
                key.clone()
            } else {
                quote(key)
            };
            match value {
                Expr::Ident(name) if name == key => self.out.push_str(name),
                _ => {
                    let _ = write!(self.out, "{key_text}: ");
                    self.expr(value);
                }
            }
        }
        self.out.push_str(" }");
    }

    fn arrow(&mut self, arrow: &Arrow) {
        if arrow.is_async {
            self.out.push_str("async ");
        }
        self.out.push('(');
        for (i, param) in arrow.params.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            match param {
                Param::Ident(name) => self.out.push_str(name),
                Param::Destructure(names) => {
                    let _ = write!(self.out, "{{ {} }}", names.join(", "));
                }
            }
        }
        self.out.push_str(") => ");
        match &arrow.body {
            ArrowBody::Expr(Expr::Object(props)) => {
                self.out.push('(');
                self.object(props);
                self.out.push(')');
            }
            ArrowBody::Expr(body) => self.expr(body),
            ArrowBody::Block(stmts) => self.block(stmts),
        }
    }
}
