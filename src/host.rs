//! The execution host: bridges user-authored source to a capability
//! object and runs it in isolation.
//!
//! Each `execute()` mints a fresh session, sends the `start` control
//! (resetting the embed's model), builds the capability object from the
//! implementation module, then parses and interprets the source. The
//! interpreter resolves identifiers against the capability object only
//! (there is no ambient scope to fall back to) and charges every executed
//! statement and loop iteration against a configurable step budget.
//!
//! Failures are contained here: a parse error, an unknown operation, or
//! an exhausted budget is wrapped as an [`ExecutionFailure`] and reported
//! to the caller. The channel and the embed's state machine never see it,
//! and messages already delivered are not rolled back.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::capability::{CapabilityObject, ImplementationModule, MessageSender};
use crate::channel::{DomainMessage, Envelope, Outbound, SessionId};
use crate::error::{ExecutionErrorKind, ExecutionFailure};
use crate::lang::{parse, Program, Stmt};

/// Summary of a successful execution, for the editing surface.
#[derive(Debug, Clone)]
pub struct ExecutionReport {
    pub session: SessionId,
    /// Statements and loop iterations the interpreter executed.
    pub statements: u32,
    /// Domain messages accepted for delivery to the embed.
    pub messages: u32,
    pub started_at: DateTime<Utc>,
}

/// Executes user programs for one plugin over one channel endpoint.
pub struct ExecutionHost<M> {
    plugin: String,
    outbound: Outbound,
    /// Maximum interpreted steps per execution; `0` disables the budget.
    step_budget: u32,
    _marker: std::marker::PhantomData<fn(M)>,
}

impl<M: DomainMessage> ExecutionHost<M> {
    pub fn new(plugin: impl Into<String>, outbound: Outbound, step_budget: u32) -> Self {
        Self {
            plugin: plugin.into(),
            outbound,
            step_budget,
            _marker: std::marker::PhantomData,
        }
    }

    /// Runs `source` against the given language implementation.
    ///
    /// The `start` control is sent before evaluation, so even a failing
    /// run resets the embed to its initial model: a valid state, never a
    /// half-initialized one.
    pub async fn execute(
        &self,
        source: &str,
        implementation: &dyn ImplementationModule<M>,
    ) -> Result<ExecutionReport, ExecutionFailure> {
        let session = SessionId::new();
        let started_at = Utc::now();
        debug!(
            plugin = %self.plugin,
            language = implementation.language_id(),
            %session,
            "starting execution"
        );

        let start: Envelope<M> = Envelope::Start { session };
        match start.to_wire() {
            Ok(wire) => {
                self.outbound.post(wire);
            }
            Err(e) => debug!(error = %e, "failed to marshal start control"),
        }

        let sender = MessageSender::new(self.outbound.clone(), session);
        let counter = sender.clone();
        let capabilities = implementation.create(sender).await;

        let program = parse(source).map_err(|e| self.fail(ExecutionErrorKind::Parse {
            line: e.line,
            message: e.message,
        }))?;

        let statements = self.interpret(&program, &capabilities)?;

        let report = ExecutionReport {
            session,
            statements,
            messages: counter.sent_count(),
            started_at,
        };
        info!(
            plugin = %self.plugin,
            statements = report.statements,
            messages = report.messages,
            "execution finished"
        );
        Ok(report)
    }

    fn interpret(
        &self,
        program: &Program,
        capabilities: &CapabilityObject,
    ) -> Result<u32, ExecutionFailure> {
        let mut steps: u32 = 0;
        self.run_block(&program.stmts, capabilities, &mut steps)?;
        Ok(steps)
    }

    fn run_block(
        &self,
        stmts: &[Stmt],
        capabilities: &CapabilityObject,
        steps: &mut u32,
    ) -> Result<(), ExecutionFailure> {
        for stmt in stmts {
            match stmt {
                Stmt::Call { name, args, .. } => {
                    self.charge(steps)?;
                    let operation = capabilities.get(name).ok_or_else(|| {
                        self.fail(ExecutionErrorKind::UnknownOperation { name: name.clone() })
                    })?;
                    if operation.arity() != args.len() {
                        return Err(self.fail(ExecutionErrorKind::Arity {
                            name: name.clone(),
                            expected: operation.arity(),
                            got: args.len(),
                        }));
                    }
                    operation.invoke(args);
                }
                Stmt::Repeat { count, body, .. } => {
                    for _ in 0..*count {
                        self.charge(steps)?;
                        self.run_block(body, capabilities, steps)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn charge(&self, steps: &mut u32) -> Result<(), ExecutionFailure> {
        *steps = steps.saturating_add(1);
        if self.step_budget > 0 && *steps > self.step_budget {
            return Err(self.fail(ExecutionErrorKind::BudgetExhausted {
                limit: self.step_budget,
            }));
        }
        Ok(())
    }

    fn fail(&self, kind: ExecutionErrorKind) -> ExecutionFailure {
        ExecutionFailure {
            plugin: self.plugin.clone(),
            kind,
        }
    }
}
