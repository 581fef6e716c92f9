use crate::{
    runtime,
    value::{StandardFunction, Value, ValueKind},
};

/// Fixed native-function table. Consulted only after an identifier misses
/// the whole environment chain, so user bindings shadow natives.
pub fn lookup(name: &str) -> Option<Value> {
    let function = match name {
        "log" | "print" => StandardFunction {
            name: "log",
            callback: native_log,
        },
        "loop" => StandardFunction {
            name: "loop",
            callback: native_loop,
        },
        _ => return None,
    };
    Some(Value::new(ValueKind::StandardFunction(function)))
}

fn native_log(args: &[Value]) -> Value {
    for arg in args {
        print!("{arg} ");
    }
    println!();
    Value::empty()
}

fn native_loop(args: &[Value]) -> Value {
    if args.len() != 2 {
        return Value::error(format!(
            "`loop` expects a count and a function, received {} argument(s)",
            args.len()
        ));
    }
    let times = match &*args[0].0 {
        ValueKind::Integer(value) => *value,
        _ => {
            return Value::error(format!(
                "`loop` count must be INTEGER, received {}",
                args[0].type_name()
            ));
        }
    };
    for _ in 0..times {
        let result = runtime::apply_function(&args[1], &[]);
        if result.is_error() {
            return result;
        }
    }
    Value::empty()
}
