//! Host process capability.
//!
//! The registry only needs four things from its host: a process id, the
//! working directory, an exit hook and the argument vector. [`ProcessHost`]
//! provides them from the running process; [`ValueHost`] adapts an untyped
//! object handed over by an embedder after checking its shape.

use std::io;
use std::path::PathBuf;

use cli_john_core::{Context, Object, TypeSpec, Value};

use crate::error::{CliError, Result};

/// What the registry requires from the host process.
pub trait HostProcess {
    /// Process id.
    fn pid(&self) -> u32;

    /// Current working directory.
    fn cwd(&self) -> io::Result<PathBuf>;

    /// Terminates the process (or whatever the host treats as exit).
    ///
    /// The registry never calls this itself; it is part of the handle so
    /// embedders can decide exit codes from subscribers.
    fn exit(&self, code: i32);

    /// Full argument vector, including program and script path.
    fn argv(&self) -> Vec<String>;
}

/// The running process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessHost;

impl HostProcess for ProcessHost {
    fn pid(&self) -> u32 {
        std::process::id()
    }

    fn cwd(&self) -> io::Result<PathBuf> {
        std::env::current_dir()
    }

    fn exit(&self, code: i32) {
        std::process::exit(code)
    }

    /// A native executable has no separate script path, so the program path
    /// fills both leading slots to keep the two-entry layout.
    fn argv(&self) -> Vec<String> {
        let mut args = std::env::args();
        let program = args.next().unwrap_or_default();
        [program.clone(), program].into_iter().chain(args).collect()
    }
}

/// A host described by an untyped object with `pid`, `cwd`, `exit` and
/// `argv` fields.
///
/// # Examples
///
/// ```
/// use cli_john::{HostProcess, ValueHost};
/// use cli_john_core::{Context, Object, Value};
///
/// let ctx = Context::default();
/// let handle = Value::from(
///     Object::new()
///         .with_field("pid", 42)
///         .with_field("cwd", Value::function("cwd", |_| Value::from("/srv")))
///         .with_field("exit", Value::function("exit", |_| Value::Undefined))
///         .with_field("argv", vec!["node", "app.js", "build"]),
/// );
///
/// let host = ValueHost::from_value(&ctx, &handle).unwrap();
/// assert_eq!(host.pid(), 42);
/// assert_eq!(host.argv(), ["node", "app.js", "build"]);
///
/// assert!(ValueHost::from_value(&ctx, &Value::from("not a process")).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct ValueHost {
    handle: Object,
}

impl ValueHost {
    /// Checks the shape of `value` with the context's matcher and wraps it.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::InvalidHost`] unless `value` is an object with a
    /// numeric `pid`, function `cwd` and `exit`, and a string-array `argv`.
    pub fn from_value(ctx: &Context, value: &Value) -> Result<Self> {
        let Some(handle) = value.as_object() else {
            return Err(CliError::InvalidHost(format!(
                "expected an object, got {}",
                value.category()
            )));
        };

        const REQUIRED: [(&str, &str); 4] = [
            ("pid", "number"),
            ("cwd", "function"),
            ("exit", "function"),
            ("argv", "string[]"),
        ];
        let fields: Vec<Value> = REQUIRED
            .iter()
            .map(|(key, _)| handle.get(key).cloned().unwrap_or_default())
            .collect();
        let specs: Vec<TypeSpec> = REQUIRED.iter().map(|(_, spec)| TypeSpec::from(*spec)).collect();

        if !ctx.checker().check(&fields, &specs) {
            let missing = REQUIRED
                .iter()
                .zip(&fields)
                .filter(|((_, spec), field)| !ctx.checker().matches(field, &TypeSpec::from(*spec)))
                .map(|((key, spec), _)| format!("{key}: {spec}"))
                .collect::<Vec<_>>()
                .join(", ");
            return Err(CliError::InvalidHost(format!("fields failed the check: {missing}")));
        }

        Ok(Self {
            handle: handle.clone(),
        })
    }

    fn field(&self, key: &str) -> &Value {
        static UNDEFINED: Value = Value::Undefined;
        self.handle.get(key).unwrap_or(&UNDEFINED)
    }
}

impl HostProcess for ValueHost {
    fn pid(&self) -> u32 {
        match self.field("pid") {
            Value::Number(n) if *n >= 0.0 => *n as u32,
            _ => 0,
        }
    }

    fn cwd(&self) -> io::Result<PathBuf> {
        match self.field("cwd").call(&[]) {
            Value::String(dir) => Ok(PathBuf::from(dir)),
            other => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("cwd() returned {}", other.category()),
            )),
        }
    }

    fn exit(&self, code: i32) {
        self.field("exit").call(&[Value::from(code)]);
    }

    fn argv(&self) -> Vec<String> {
        self.field("argv")
            .as_array()
            .unwrap_or_default()
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect()
    }
}
