//! Native functions registered into the global environment.

use crate::environment::Environment;
use crate::interpreter::Interpreter;
use crate::value::{NativeFunction, Value};
use std::rc::Rc;

/// Installs every native function into `globals`, mirroring the
/// registration step the reference interpreters perform at startup.
pub fn install(globals: &Environment) {
    globals.define(
        "clock",
        Value::NativeFn(Rc::new(NativeFunction {
            name: "clock",
            arity: 0,
            func: clock,
        })),
    );
}

/// Seconds elapsed since the owning interpreter was constructed, so each
/// interpreter instance's `clock()` has its own epoch.
fn clock(interpreter: &Interpreter, _args: &[Value]) -> Value {
    Value::Number(interpreter.start_time().elapsed().as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_is_registered_with_zero_arity() {
        let globals = Environment::new_global();
        install(&globals);
        let tok = crate::token::Token::new(
            crate::token::TokenType::Identifier,
            "clock",
            Value::Nil,
            1,
        );
        let v = globals.get(&tok).unwrap();
        assert_eq!(v.arity(), 0);
        assert!(v.is_callable());
    }

    #[test]
    fn clock_epoch_is_per_interpreter() {
        let a = Interpreter::new();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let b = Interpreter::new();
        // b was constructed after a, so b's elapsed time since its own
        // epoch must be smaller than a's elapsed time since its epoch.
        assert!(a.start_time().elapsed() > b.start_time().elapsed());
    }
}
