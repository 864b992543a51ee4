/*!
The end of the pipeline: a [`CallSite`] is either a handler closed over its
model, ready to run, or one of the outcomes that replace running it (help,
a `[parse]` diagram, a failure report, or an internal error).
*/

use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt::{self, Debug, Display},
    future::Future,
    io,
    sync::Arc,
};

use futures::future::BoxFuture;
use tracing::{debug, warn};

use crate::{
    directives::Directives,
    errors::Failure,
    model::Model,
    printers::{print_failure, print_handler_error, print_internal},
    symbol::{Tag, Value},
};

/**
A handler's return value, turned into a process exit code. An `Err` carries
the message that the call site prints to its error writer before exiting
with 1.
*/
pub trait IntoExitCode {
    fn into_exit_code(self) -> Result<i32, String>;
}

impl IntoExitCode for i32 {
    #[inline]
    fn into_exit_code(self) -> Result<i32, String> {
        Ok(self)
    }
}

impl IntoExitCode for u8 {
    #[inline]
    fn into_exit_code(self) -> Result<i32, String> {
        Ok(i32::from(self))
    }
}

impl IntoExitCode for () {
    #[inline]
    fn into_exit_code(self) -> Result<i32, String> {
        Ok(0)
    }
}

impl<T: IntoExitCode, E: Display> IntoExitCode for Result<T, E> {
    fn into_exit_code(self) -> Result<i32, String> {
        match self {
            Ok(value) => value.into_exit_code(),
            Err(err) => Err(err.to_string()),
        }
    }
}

/// A handler with its model already moved in
pub(crate) enum Invocable {
    Sync(Box<dyn FnOnce() -> Result<i32, String> + Send>),
    Async(BoxFuture<'static, Result<i32, String>>),
}

type Prepare = Arc<dyn Fn(Value) -> Option<Invocable> + Send + Sync>;

/// Handlers, keyed by the model type they accept
#[derive(Clone, Default)]
pub(crate) struct HandlerRegistry {
    handlers: HashMap<TypeId, Prepare>,
}

impl HandlerRegistry {
    pub fn insert<M, R, F>(&mut self, handler: F)
    where
        M: Model,
        R: IntoExitCode,
        F: Fn(M) -> R + Send + Sync + 'static,
    {
        let handler = Arc::new(handler);

        self.handlers.insert(
            TypeId::of::<M>(),
            Arc::new(move |model: Value| {
                let model: M = *model.downcast().ok()?;
                let handler = Arc::clone(&handler);
                Some(Invocable::Sync(Box::new(move || {
                    handler(model).into_exit_code()
                })))
            }),
        );
    }

    pub fn insert_async<M, Fut, F>(&mut self, handler: F)
    where
        M: Model,
        F: Fn(M) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: IntoExitCode,
    {
        let handler = Arc::new(handler);

        self.handlers.insert(
            TypeId::of::<M>(),
            Arc::new(move |model: Value| {
                let model: M = *model.downcast().ok()?;
                let handler = Arc::clone(&handler);
                Some(Invocable::Async(Box::pin(async move {
                    handler(model).await.into_exit_code()
                })))
            }),
        );
    }

    #[must_use]
    pub fn contains(&self, model: TypeId) -> bool {
        self.handlers.contains_key(&model)
    }

    /// Close the handler for `model`'s type over it. `None` if there's no
    /// such handler.
    pub fn prepare(&self, model: Value) -> Option<Invocable> {
        let type_id = (*model).type_id();
        self.handlers.get(&type_id).and_then(|prepare| prepare(model))
    }
}

impl Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

pub(crate) enum Target {
    Invoke(Invocable),
    Help {
        text: String,
        exit_code: i32,
    },
    Diagram {
        text: String,
        exit_code: i32,
    },
    Failure {
        failure: Failure,
        exit_code: i32,
        help_tag: Option<Tag>,
    },
    Internal {
        message: String,
        exit_code: i32,
    },
}

/// What a [`CallSite`] will do when it's invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallSiteKind {
    /// Run a synchronous handler
    Invoke,

    /// Run an async handler
    InvokeAsync,

    /// Print the usage message
    Help,

    /// Print the `[parse]` diagram
    Diagram,

    /// Report the arguments' errors
    Failure,

    /// Report a panic caught while binding
    Internal,
}

/**
The outcome of resolving a command line. Nothing has been printed and no
handler has run yet; that happens when it's invoked.
*/
pub struct CallSite {
    command: String,
    directives: Directives,
    target: Target,
}

impl CallSite {
    pub(crate) fn new(command: String, directives: Directives, target: Target) -> Self {
        Self {
            command,
            directives,
            target,
        }
    }

    /// The full name of the command that was selected
    #[inline]
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    #[inline]
    #[must_use]
    pub fn directives(&self) -> &Directives {
        &self.directives
    }

    #[must_use]
    pub fn kind(&self) -> CallSiteKind {
        match self.target {
            Target::Invoke(Invocable::Sync(_)) => CallSiteKind::Invoke,
            Target::Invoke(Invocable::Async(_)) => CallSiteKind::InvokeAsync,
            Target::Help { .. } => CallSiteKind::Help,
            Target::Diagram { .. } => CallSiteKind::Diagram,
            Target::Failure { .. } => CallSiteKind::Failure,
            Target::Internal { .. } => CallSiteKind::Internal,
        }
    }

    #[must_use]
    pub fn failure(&self) -> Option<&Failure> {
        match self.target {
            Target::Failure { ref failure, .. } => Some(failure),
            _ => None,
        }
    }

    #[must_use]
    pub fn help_text(&self) -> Option<&str> {
        match self.target {
            Target::Help { ref text, .. } => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub fn diagram(&self) -> Option<&str> {
        match self.target {
            Target::Diagram { ref text, .. } => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub fn internal_message(&self) -> Option<&str> {
        match self.target {
            Target::Internal { ref message, .. } => Some(message),
            _ => None,
        }
    }

    /// The exit code, if it's known without running a handler
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        match self.target {
            Target::Invoke(_) => None,
            Target::Help { exit_code, .. }
            | Target::Diagram { exit_code, .. }
            | Target::Failure { exit_code, .. }
            | Target::Internal { exit_code, .. } => Some(exit_code),
        }
    }

    /// Run the handler, or print whatever replaces it, to stdout and stderr.
    /// Async handlers are driven to completion on the current thread.
    pub fn invoke(self) -> i32 {
        self.invoke_with(&mut io::stdout().lock(), &mut io::stderr().lock())
    }

    /// Like [`invoke`][Self::invoke], but printing to the given writers
    pub fn invoke_with(
        self,
        out: &mut (impl io::Write + ?Sized),
        err: &mut (impl io::Write + ?Sized),
    ) -> i32 {
        let outcome = match self.report(out, err) {
            Ok(code) => return code,
            Err(Invocable::Sync(handler)) => handler(),
            Err(Invocable::Async(future)) => futures::executor::block_on(future),
        };

        finish(outcome, err)
    }

    /// Run the handler, awaiting it if it's async. Dropping the future
    /// before it completes cancels the handler.
    pub async fn invoke_async(self) -> i32 {
        let result = self.report(&mut io::stdout().lock(), &mut io::stderr().lock());

        let outcome = match result {
            Ok(code) => return code,
            Err(Invocable::Sync(handler)) => handler(),
            Err(Invocable::Async(future)) => future.await,
        };

        finish(outcome, &mut io::stderr().lock())
    }

    /// Print a non-invoking outcome and return its exit code, or hand back
    /// the handler to run.
    fn report(
        self,
        out: &mut (impl io::Write + ?Sized),
        err: &mut (impl io::Write + ?Sized),
    ) -> Result<i32, Invocable> {
        let written = match self.target {
            Target::Invoke(invocable) => return Err(invocable),
            Target::Help { text, exit_code } => write!(out, "{text}").map(|()| exit_code),
            Target::Diagram { text, exit_code } => writeln!(out, "{text}").map(|()| exit_code),
            Target::Failure {
                failure,
                exit_code,
                help_tag,
            } => print_failure(err, &failure, help_tag.as_ref()).map(|()| exit_code),
            Target::Internal { message, exit_code } => {
                print_internal(err, &self.command, &message).map(|()| exit_code)
            }
        };

        Ok(written.unwrap_or_else(|error| {
            warn!(command = %self.command, %error, "couldn't write the report");
            1
        }))
    }
}

/// The exit code of a handler that ran, printing its error if it failed
fn finish(outcome: Result<i32, String>, err: &mut (impl io::Write + ?Sized)) -> i32 {
    match outcome {
        Ok(code) => code,
        Err(message) => {
            debug!(error = %message, "handler returned an error");

            if let Err(error) = print_handler_error(err, &message) {
                warn!(%error, "couldn't write the handler's error");
            }

            1
        }
    }
}

impl Debug for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallSite")
            .field("command", &self.command)
            .field("kind", &self.kind())
            .field("directives", &self.directives)
            .finish()
    }
}

/// The message carried by a panic payload, if it's a string
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        String::from("a panic with a non-string payload")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        errors::{Error, ModelError},
        model::Bindings,
    };

    #[derive(Debug)]
    struct Greet {
        name: String,
    }

    impl Model for Greet {
        fn symbols() -> Vec<crate::symbol::Symbol> {
            Vec::new()
        }

        fn build(_bindings: &mut Bindings) -> Result<Self, ModelError> {
            Ok(Self {
                name: "world".into(),
            })
        }
    }

    fn invoke(registry: &HandlerRegistry, model: Greet) -> CallSite {
        let invocable = registry.prepare(Box::new(model)).unwrap();
        CallSite::new("app".into(), Directives::default(), Target::Invoke(invocable))
    }

    #[test]
    fn exit_codes() {
        assert_eq!(3i32.into_exit_code(), Ok(3));
        assert_eq!(7u8.into_exit_code(), Ok(7));
        assert_eq!(().into_exit_code(), Ok(0));
        assert_eq!(Ok::<_, String>(4).into_exit_code(), Ok(4));
        assert_eq!(Err::<i32, _>("nope").into_exit_code(), Err("nope".to_owned()));
    }

    #[test]
    fn sync_handler() {
        let mut registry = HandlerRegistry::default();
        registry.insert(|greet: Greet| greet.name.len() as i32);

        let site = invoke(&registry, Greet { name: "tester".into() });
        assert_eq!(site.kind(), CallSiteKind::Invoke);
        assert_eq!(site.exit_code(), None);
        assert_eq!(site.invoke_with(&mut Vec::new(), &mut Vec::new()), 6);
    }

    #[test]
    fn async_handler() {
        let mut registry = HandlerRegistry::default();
        registry.insert_async(|greet: Greet| async move { greet.name.len() as i32 });

        let site = invoke(&registry, Greet { name: "abc".into() });
        assert_eq!(site.kind(), CallSiteKind::InvokeAsync);
        assert_eq!(futures::executor::block_on(site.invoke_async()), 3);
    }

    #[test]
    fn handler_errors_go_to_the_error_writer() {
        let mut registry = HandlerRegistry::default();
        registry.insert(|greet: Greet| -> Result<(), String> {
            Err(format!("no such user {:?}", greet.name))
        });

        let site = invoke(&registry, Greet { name: "ghost".into() });

        let mut out = Vec::new();
        let mut err = Vec::new();
        assert_eq!(site.invoke_with(&mut out, &mut err), 1);
        assert!(out.is_empty());
        assert_eq!(String::from_utf8(err).unwrap(), "error: no such user \"ghost\"\n");
    }

    #[test]
    fn unknown_model_type() {
        let registry = HandlerRegistry::default();
        assert!(!registry.contains(TypeId::of::<Greet>()));
        assert!(registry.prepare(Box::new(Greet { name: "x".into() })).is_none());
    }

    #[test]
    fn failure_report() {
        let failure = Failure::new("app", vec![Error::Model(ModelError::Custom("bad".into()))]);
        let site = CallSite::new(
            "app".into(),
            Directives::default(),
            Target::Failure {
                failure,
                exit_code: 1,
                help_tag: Some(Tag::Long("help".into())),
            },
        );

        let mut out = Vec::new();
        let mut err = Vec::new();
        assert_eq!(site.invoke_with(&mut out, &mut err), 1);
        assert!(out.is_empty());
        assert_eq!(
            String::from_utf8(err).unwrap(),
            "error: `app`: bad\n\nFor usage, try `app --help`\n"
        );
    }

    #[test]
    fn panic_messages() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(&*payload), "boom");

        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(&*payload), "bang");
    }
}
