//! Tree-walking evaluator: executes a parsed statement list against a
//! lexically-scoped environment chain.

use crate::ast::{Expr, FunctionDecl, Stmt};
use crate::environment::Environment;
use crate::error::{Reporter, RuntimeError};
use crate::token::{Token, TokenType};
use crate::value::{LoxFunction, Value};
use std::io::{self, Write};
use std::rc::Rc;
use std::time::Instant;

/// What executing a statement produced, beyond a plain `RuntimeError`.
/// `Return` unwinds through any number of enclosing blocks/if/while
/// statements until it reaches the call that invoked the function body.
pub enum ExecSignal {
    None,
    Return(Value),
}

type ExecResult = Result<ExecSignal, RuntimeError>;
type EvalResult = Result<Value, RuntimeError>;

pub struct Interpreter {
    globals: Environment,
    environment: Environment,
    output: Box<dyn Write>,
    start_time: Instant,
}

impl Interpreter {
    /// Builds an interpreter that prints to the real process stdout.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Builds an interpreter that writes `print` output to `output`
    /// instead of stdout, so a caller (tests, an embedding) can capture it.
    pub fn with_output(output: Box<dyn Write>) -> Self {
        let globals = Environment::new_global();
        crate::builtin::install(&globals);
        Interpreter {
            environment: globals.clone(),
            globals,
            output,
            start_time: Instant::now(),
        }
    }

    /// The instant this interpreter was constructed; the built-in `clock`
    /// reports seconds elapsed since this moment.
    pub fn start_time(&self) -> Instant {
        self.start_time
    }

    /// Executes every statement in order, stopping and reporting at the
    /// first runtime error.
    pub fn interpret(&mut self, statements: &[Stmt], reporter: &Reporter) {
        for stmt in statements {
            match self.execute(stmt) {
                Ok(_) => {}
                Err(e) => {
                    reporter.runtime_error(&e);
                    return;
                }
            }
        }
    }

    fn execute(&mut self, stmt: &Stmt) -> ExecResult {
        log::trace!("executing {}", stmt_kind(stmt));
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(ExecSignal::None)
            }
            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                let _ = writeln!(self.output, "{}", value);
                Ok(ExecSignal::None)
            }
            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                self.environment.define(name.lexeme.clone(), value);
                Ok(ExecSignal::None)
            }
            Stmt::Block(statements) => {
                let enclosed = Environment::new_enclosed(&self.environment);
                self.execute_block(statements, enclosed)
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(ExecSignal::None)
                }
            }
            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    match self.execute(body)? {
                        ExecSignal::None => {}
                        signal => return Ok(signal),
                    }
                }
                Ok(ExecSignal::None)
            }
            Stmt::Function(decl) => {
                let function = Value::Fn(Rc::new(LoxFunction {
                    declaration: Rc::clone(decl),
                    closure: self.environment.clone(),
                }));
                self.environment.define(decl.name.lexeme.clone(), function);
                Ok(ExecSignal::None)
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                Ok(ExecSignal::Return(value))
            }
        }
    }

    /// Runs a statement list under `environment`, restoring the caller's
    /// current environment on every exit path (normal, return, or error).
    fn execute_block(&mut self, statements: &[Stmt], environment: Environment) -> ExecResult {
        let previous = std::mem::replace(&mut self.environment, environment);
        let mut result = Ok(ExecSignal::None);
        for stmt in statements {
            match self.execute(stmt) {
                Ok(ExecSignal::None) => continue,
                other => {
                    result = other;
                    break;
                }
            }
        }
        self.environment = previous;
        result
    }

    fn evaluate(&mut self, expr: &Expr) -> EvalResult {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Grouping(inner) => self.evaluate(inner),
            Expr::Variable(name) => self.environment.get(name),
            Expr::Assign { name, value } => {
                let value = self.evaluate(value)?;
                self.environment.assign(name, value.clone())?;
                Ok(value)
            }
            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),
            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),
            Expr::Logical {
                left,
                operator,
                right,
            } => self.evaluate_logical(left, operator, right),
            Expr::Call {
                callee,
                paren,
                arguments,
            } => self.evaluate_call(callee, paren, arguments),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> EvalResult {
        let right = self.evaluate(right)?;
        match operator.kind {
            TokenType::Bang => Ok(Value::Bool(!right.is_truthy())),
            TokenType::Minus => match right {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(RuntimeError::new(operator, "Operand must be a number.")),
            },
            _ => unreachable!("parser only produces ! and - as unary operators"),
        }
    }

    fn evaluate_logical(&mut self, left: &Expr, operator: &Token, right: &Expr) -> EvalResult {
        let left = self.evaluate(left)?;
        match operator.kind {
            TokenType::Or if left.is_truthy() => Ok(left),
            TokenType::And if !left.is_truthy() => Ok(left),
            _ => self.evaluate(right),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> EvalResult {
        let left = self.evaluate(left)?;
        let right = self.evaluate(right)?;
        use TokenType::*;
        match operator.kind {
            EqualEqual => Ok(Value::Bool(left == right)),
            BangEqual => Ok(Value::Bool(left != right)),
            Greater => numeric_cmp(operator, &left, &right, |a, b| a > b),
            GreaterEqual => numeric_cmp(operator, &left, &right, |a, b| a >= b),
            Less => numeric_cmp(operator, &left, &right, |a, b| a < b),
            LessEqual => numeric_cmp(operator, &left, &right, |a, b| a <= b),
            Minus => numeric_op(operator, &left, &right, |a, b| a - b),
            Slash => numeric_op(operator, &left, &right, |a, b| a / b),
            Star => numeric_op(operator, &left, &right, |a, b| a * b),
            Plus => match (&left, &right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => {
                    Ok(Value::string(format!("{}{}", a, b)))
                }
                _ => Err(RuntimeError::new(
                    operator,
                    "Operands must be two numbers or two strings.",
                )),
            },
            _ => unreachable!("parser only produces binary operators handled above"),
        }
    }

    fn evaluate_call(&mut self, callee: &Expr, paren: &Token, arguments: &[Expr]) -> EvalResult {
        let callee = self.evaluate(callee)?;
        let mut args = Vec::with_capacity(arguments.len());
        for arg in arguments {
            args.push(self.evaluate(arg)?);
        }

        if !callee.is_callable() {
            return Err(RuntimeError::new(
                paren,
                "Can only call functions and classes.",
            ));
        }
        if args.len() != callee.arity() {
            return Err(RuntimeError::new(
                paren,
                format!(
                    "Expected {} arguments but got {}.",
                    callee.arity(),
                    args.len()
                ),
            ));
        }

        match callee {
            Value::NativeFn(native) => Ok((native.func)(self, &args)),
            Value::Fn(function) => self.call_function(&function, args),
            _ => unreachable!("checked callable above"),
        }
    }

    fn call_function(&mut self, function: &Rc<LoxFunction>, args: Vec<Value>) -> EvalResult {
        let name = &function.declaration.name.lexeme;
        log::debug!("calling {}({} args)", name, args.len());
        let call_env = Environment::new_enclosed(&function.closure);
        bind_params(&function.declaration, &args, &call_env);
        let result = self.execute_block(&function.declaration.body, call_env);
        match result {
            Ok(ExecSignal::None) => {
                log::debug!("returning from {} (implicit nil)", name);
                Ok(Value::Nil)
            }
            Ok(ExecSignal::Return(value)) => {
                log::debug!("returning from {}", name);
                Ok(value)
            }
            Err(e) => {
                log::debug!("returning from {} via runtime error", name);
                Err(e)
            }
        }
    }
}

fn stmt_kind(stmt: &Stmt) -> &'static str {
    match stmt {
        Stmt::Block(_) => "block",
        Stmt::Expression(_) => "expression statement",
        Stmt::Function(_) => "function declaration",
        Stmt::If { .. } => "if",
        Stmt::Print(_) => "print",
        Stmt::Return { .. } => "return",
        Stmt::Var { .. } => "var declaration",
        Stmt::While { .. } => "while",
    }
}

fn bind_params(decl: &FunctionDecl, args: &[Value], env: &Environment) {
    for (param, arg) in decl.params.iter().zip(args.iter()) {
        env.define(param.lexeme.clone(), arg.clone());
    }
}

fn numeric_op(
    operator: &Token,
    left: &Value,
    right: &Value,
    op: impl Fn(f64, f64) -> f64,
) -> EvalResult {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(op(*a, *b))),
        _ => Err(RuntimeError::new(operator, "Operands must be numbers.")),
    }
}

fn numeric_cmp(
    operator: &Token,
    left: &Value,
    right: &Value,
    op: impl Fn(f64, f64) -> bool,
) -> EvalResult {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(op(*a, *b))),
        _ => Err(RuntimeError::new(operator, "Operands must be numbers.")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Reporter;
    use crate::parser::Parser;
    use crate::scanner::Scanner;
    use std::cell::RefCell;

    /// A `Write` sink backed by a shared buffer, so a test can hand one
    /// handle to the interpreter and keep another to read the captured
    /// text back out afterward.
    #[derive(Clone)]
    struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Parses and runs `src` against a fresh interpreter, returning the
    /// captured stdout text and whether a runtime error occurred.
    fn run(src: &str) -> (String, bool) {
        let reporter = Reporter::new();
        let tokens = Scanner::new(src).scan_tokens(&reporter);
        let stmts = Parser::new(tokens, &reporter).parse();
        assert!(!reporter.had_error(), "unexpected parse error in {:?}", src);

        let buffer = Rc::new(RefCell::new(Vec::new()));
        let mut interp = Interpreter::with_output(Box::new(SharedBuffer(buffer.clone())));
        interp.interpret(&stmts, &reporter);

        let output = String::from_utf8(buffer.borrow().clone()).expect("stdout is valid utf-8");
        (output, reporter.had_runtime_error())
    }

    #[test]
    fn arithmetic_precedence() {
        let (output, had_error) = run("print 1 + 2 * 3;");
        assert!(!had_error);
        assert_eq!(output, "7\n");
    }

    #[test]
    fn redeclaring_a_variable_in_terms_of_itself() {
        let (output, had_error) = run("var a = \"hi\"; var a = a + \"!\"; print a;");
        assert!(!had_error);
        assert_eq!(output, "hi!\n");
    }

    #[test]
    fn block_scoping_shadows_and_restores() {
        let (output, had_error) = run("var a = 1; { var a = 2; print a; } print a;");
        assert!(!had_error);
        assert_eq!(output, "2\n1\n");
    }

    #[test]
    fn closures_capture_environment_by_reference() {
        let (output, had_error) = run(
            "fun make() { var i = 0; fun inc() { i = i + 1; print i; } return inc; } \
             var c = make(); c(); c(); c();",
        );
        assert!(!had_error);
        assert_eq!(output, "1\n2\n3\n");
    }

    #[test]
    fn for_loop_desugars_and_runs() {
        let (output, had_error) = run("for (var i = 0; i < 3; i = i + 1) print i;");
        assert!(!had_error);
        assert_eq!(output, "0\n1\n2\n");
    }

    #[test]
    fn string_equality_true_then_runtime_error_on_mismatched_plus() {
        let (output, had_error) = run("print \"ab\" == \"a\" + \"b\"; print 1 + \"x\";");
        assert!(had_error);
        assert_eq!(output, "true\n");
    }

    #[test]
    fn undefined_variable_is_runtime_error() {
        let (_, had_error) = run("print missing;");
        assert!(had_error);
    }

    #[test]
    fn calling_non_callable_is_runtime_error() {
        let (_, had_error) = run("var x = 1; x();");
        assert!(had_error);
    }

    #[test]
    fn arity_mismatch_is_runtime_error() {
        let (_, had_error) = run("fun f(a) { return a; } f(1, 2);");
        assert!(had_error);
    }

    #[test]
    fn division_by_zero_yields_infinity_not_error() {
        let (output, had_error) = run("print 1 / 0;");
        assert!(!had_error);
        assert_eq!(output, "inf\n");
    }

    #[test]
    fn logical_or_short_circuits() {
        // If short-circuit failed, boom() would run and divide by zero,
        // which still isn't an error in this language, so assert on the
        // output instead: the right operand must never be evaluated or
        // printed.
        let (output, had_error) =
            run("fun boom() { print \"evaluated\"; return true; } print true or boom();");
        assert!(!had_error);
        assert_eq!(output, "true\n");
    }

    #[test]
    fn while_propagates_return_out_of_function_call() {
        let (output, had_error) = run(
            "fun first_even(n) { var i = 0; while (i < n) { if (i == 2) { return i; } i = i + 1; } return -1; } \
             print first_even(10);",
        );
        assert!(!had_error);
        assert_eq!(output, "2\n");
    }
}
