//! Sequential Pipeline Driver
//!
//! Each request flows through one ordered list of stages. Halting is
//! cooperative: the driver checks the context's halted flag before invoking
//! each stage, so a denial stops everything after it.

use crate::context::RequestContext;

/// A pipeline stage
///
/// Stages receive the context by mutable reference and communicate only
/// through it. Configuration inside a stage is read-only after construction,
/// so one stage instance may serve concurrent requests.
pub trait Middleware: Send + Sync {
    fn call(&self, ctx: &mut RequestContext);
}

impl<F> Middleware for F
where
    F: Fn(&mut RequestContext) + Send + Sync,
{
    fn call(&self, ctx: &mut RequestContext) {
        self(ctx)
    }
}

/// Ordered middleware chain for one request class
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn Middleware>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage
    pub fn stage(mut self, middleware: impl Middleware + 'static) -> Self {
        self.stages.push(Box::new(middleware));
        self
    }

    /// Drive the context through the stages, stopping at the first halt
    pub fn run(&self, ctx: &mut RequestContext) {
        for stage in &self.stages {
            if ctx.is_halted() {
                break;
            }
            stage.call(ctx);
        }
    }
}
