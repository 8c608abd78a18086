//! The phase-by-phase pipeline executor.
//!
//! Phases run strictly in order, and entries within a phase run one at a
//! time:
//!
//! 1. preflight: scripts
//! 2. filter: the document tree is piped through each filter
//! 3. the engine renders the tree
//! 4. postprocess: the rendered text is piped through each command
//! 5. the output is written
//! 6. postflight: scripts
//! 7. cleanup: scripts, always run
//!
//! Scripts read the control message on stdin. A missing program or a
//! non-zero exit fails that entry only. In strict mode, errors reported
//! while the document was prepared stop the run before preflight.

use super::process;
use super::stderr::relay;
use crate::ast::Ast;
use crate::diagnostics::{Diagnostics, Severity};
use crate::document::Document;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::runlist::{Phase, RunListEntry, Status};
use crate::support::SHARED_ENV;
use std::path::Path;
use std::process::Command;

/// What a script phase does when an entry fails unexpectedly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort the phase (and honour strict mode after every entry)
    StopOnError,
    /// Report and carry on with the next entry
    RunAll,
}

/// Runs a document's run list around the conversion engine.
pub struct Executor<'a> {
    engine: &'a dyn Engine,
    diag: &'a Diagnostics,
}

impl<'a> Executor<'a> {
    pub fn new(engine: &'a dyn Engine, diag: &'a Diagnostics) -> Self {
        Self { engine, diag }
    }

    /// Run every phase. Cleanup runs even when an earlier phase failed; the
    /// first failure is returned after it.
    pub fn execute(&self, doc: &mut Document) -> Result<()> {
        let main = self.main_phases(doc);
        let cleanup = self.run_scripts(doc, Phase::Cleanup, FailurePolicy::RunAll);
        main?;
        cleanup?;
        self.diag.check_strict(doc.options.general.strict)
    }

    fn main_phases(&self, doc: &mut Document) -> Result<()> {
        self.diag.check_strict(doc.options.general.strict)?;
        self.run_scripts(doc, Phase::Preflight, FailurePolicy::StopOnError)?;
        self.pipe_through(doc, Phase::Filter)?;
        self.convert(doc)?;
        self.pipe_through(doc, Phase::Postprocess)?;
        doc.write_output(self.diag)?;
        self.run_scripts(doc, Phase::Postflight, FailurePolicy::StopOnError)
    }

    /// Run the scripts of `phase`, each fed the control message.
    pub fn run_scripts(&self, doc: &mut Document, phase: Phase, policy: FailurePolicy) -> Result<()> {
        if !phase.is_script() {
            return Err(Error::Internal(format!(
                "\"{}\" entries are piped, not run as scripts",
                phase
            )));
        }
        let queue = entries_of(doc, phase);
        if queue.is_empty() {
            return Ok(());
        }
        self.diag.info(format!("-- {} --", phase));

        for (n, &index) in queue.iter().enumerate() {
            self.diag.info(format!(
                "[{}/{}] \"{}\"",
                n + 1,
                queue.len(),
                doc.runlist[index].command_line()
            ));
            match self.run_script(doc, index) {
                Ok(()) => {}
                Err(err) if policy == FailurePolicy::RunAll => {
                    self.diag.emit(Severity::Error, &doc.runlist[index].sender(), err)
                }
                Err(err) => return Err(err),
            }
            if policy == FailurePolicy::StopOnError {
                self.diag.check_strict(doc.options.general.strict)?;
            }
        }
        Ok(())
    }

    fn run_script(&self, doc: &mut Document, index: usize) -> Result<()> {
        doc.runlist[index].advance(Status::Running)?;
        let message = doc.inject_control_message()?;
        let entry = &doc.runlist[index];
        let sender = entry.sender();

        let mut command = self.command_for(entry, doc.options.support());
        let next = match process::run(&mut command, Some(message.as_bytes()), false) {
            Ok(output) => {
                relay(&output.stderr, &sender, self.diag);
                self.exit_status(&sender, &output)
            }
            Err(err) => {
                self.diag.emit(Severity::Error, &sender, err);
                Status::Failed
            }
        };
        doc.runlist[index].advance(next)
    }

    /// Pipe data through the commands of `phase`.
    ///
    /// Filters receive the serialized tree and the last filter's output
    /// becomes the new tree; if it does not parse, the tree is left as it was
    /// before the phase. Postprocessors receive the rendered text. A failed
    /// step passes its input on unchanged.
    pub fn pipe_through(&self, doc: &mut Document, phase: Phase) -> Result<()> {
        let mut data = match phase {
            Phase::Filter => {
                doc.inject_control_message()?;
                doc.ast.to_json_string()
            }
            Phase::Postprocess => doc.output.clone().unwrap_or_default(),
            other => {
                return Err(Error::Internal(format!(
                    "\"{}\" entries are scripts and cannot be piped through",
                    other
                )))
            }
        };
        let queue = entries_of(doc, phase);
        if queue.is_empty() {
            return Ok(());
        }
        self.diag.info(format!("-- {} --", phase));

        for (n, &index) in queue.iter().enumerate() {
            let entry = &mut doc.runlist[index];
            self.diag.info(format!(
                "[{}/{}] \"{}\"",
                n + 1,
                queue.len(),
                entry.command_line()
            ));
            entry.advance(Status::Running)?;
            let sender = entry.sender();

            let mut command = self.command_for(entry, doc.options.support());
            let next = match process::run(&mut command, Some(data.as_bytes()), true) {
                Ok(output) => {
                    relay(&output.stderr, &sender, self.diag);
                    match self.exit_status(&sender, &output) {
                        Status::Done => match output.stdout_text() {
                            Ok(text) => {
                                data = text.to_string();
                                Status::Done
                            }
                            Err(err) => {
                                self.diag.emit(
                                    Severity::Error,
                                    &sender,
                                    format!("output is not valid UTF-8 ({})---passing input on", err),
                                );
                                Status::Failed
                            }
                        },
                        status => status,
                    }
                }
                Err(err) => {
                    self.diag.emit(Severity::Error, &sender, err);
                    Status::Failed
                }
            };
            doc.runlist[index].advance(next)?;
            self.diag.check_strict(doc.options.general.strict)?;
        }

        match phase {
            Phase::Filter => match Ast::parse(&data) {
                Ok(ast) => doc.ast = ast,
                Err(err) => self.diag.error(format!(
                    "failed to receive a document tree from filters---ignoring all filters: {}",
                    err
                )),
            },
            _ => doc.output = Some(data),
        }
        Ok(())
    }

    /// Render the document with the engine.
    pub fn convert(&self, doc: &mut Document) -> Result<()> {
        self.diag.info(format!("-- {} --", self.engine.name()));
        doc.inject_control_message()?;
        doc.output = self.engine.convert(
            &doc.ast,
            &doc.options.engine,
            doc.effective_template(),
            self.diag,
        )?;
        Ok(())
    }

    fn command_for(&self, entry: &RunListEntry, support: &Path) -> Command {
        let mut command = Command::new(&entry.command);
        command
            .args(&entry.arguments)
            .env(SHARED_ENV, support.join("shared"));
        command
    }

    fn exit_status(&self, sender: &str, output: &process::ProcessOutput) -> Status {
        if output.success() {
            Status::Done
        } else {
            self.diag.emit(
                Severity::Error,
                sender,
                format!("failed with {}", output.status),
            );
            Status::Failed
        }
    }
}

fn entries_of(doc: &Document, phase: Phase) -> Vec<usize> {
    doc.runlist
        .iter()
        .enumerate()
        .filter(|(_, entry)| entry.kind == phase)
        .map(|(index, _)| index)
        .collect()
}
