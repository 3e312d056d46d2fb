use crate::arg::Param;
use crate::cli::{Cursor, Parser, Settings};
use crate::error::Error;
use crate::registry::Registry;
use tracing::debug;

/// The result of a deferred action or an after-parse hook.
pub type Result = std::result::Result<(), Box<dyn std::error::Error>>;

/// Work queued during parsing that runs only after the whole parse succeeds.
pub type Action = Box<dyn FnOnce() -> Result>;

/// What a nested parse observed.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Outcome {
    pub ran_subcommand: bool,
}

/// The handle a subcommand receives while it owns the remaining tokens.
pub struct Context<'p, 'a> {
    cursor: &'p mut Cursor,
    parent: &'p Registry<'a>,
    settings: &'p Settings,
    deferred: &'p mut Vec<Action>,
}

impl<'p, 'a> Context<'p, 'a> {
    pub(crate) fn new(
        cursor: &'p mut Cursor,
        parent: &'p Registry<'a>,
        settings: &'p Settings,
        deferred: &'p mut Vec<Action>,
    ) -> Self {
        Self {
            cursor,
            parent,
            settings,
            deferred,
        }
    }

    /// The tokens not yet consumed by any scope.
    pub fn remaining(&self) -> &[String] {
        self.cursor.remaining()
    }

    pub fn cursor(&mut self) -> &mut Cursor {
        &mut *self.cursor
    }

    /// The parameters of the scope that invoked this subcommand.
    pub fn parent(&self) -> &Registry<'a> {
        self.parent
    }

    /// Renders the enclosing scope's usage listing.
    pub fn usage(&self) -> String {
        crate::help::render(&self.parent.usage())
    }

    /// Queues `action` to run after the entire parse has succeeded.
    ///
    /// Actions run in the order they were queued, across every scope.
    pub fn defer<F>(&mut self, action: F)
    where
        F: FnOnce() -> Result + 'static,
    {
        self.deferred.push(Box::new(action));
    }

    /// Creates an empty nested parser carrying this scope's settings.
    pub fn parser<'b>(&self) -> Parser<'b> {
        Parser::with_settings(self.settings.clone())
    }

    /// Runs `parser` over the remaining tokens.
    ///
    /// On success the nested scope's deferred actions join this scope's
    /// queue; on failure they are dropped and the error is returned for the
    /// handler to propagate with `?`.
    pub fn run(&mut self, parser: &mut Parser<'_>) -> std::result::Result<Outcome, Error> {
        debug!(remaining = self.cursor.remaining().len(), "entering nested scope");
        parser.parse(&mut *self.cursor)?;
        self.deferred.append(&mut parser.take_deferred());
        Ok(Outcome {
            ran_subcommand: parser.ran_subcommand(),
        })
    }

    /// Builds a nested parser from `params` and runs it.
    pub fn parse<'b, I>(&mut self, params: I) -> std::result::Result<Outcome, Error>
    where
        I: IntoIterator<Item = Param<'b>>,
    {
        let mut parser = self.parser().add_params(params);
        self.run(&mut parser)
    }
}
