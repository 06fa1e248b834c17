// src/walkthrough/mod.rs
use anyhow::{bail, Context, Result};
use std::io::{BufRead, Write};
use tracing::info;

pub mod session;

pub use session::{challenge_steps, Session};

/// Decides when the next step may run. Called once per step, after its
/// description has been printed.
pub trait Confirm {
    fn confirm(&mut self, description: &str) -> Result<()>;
}

/// Waits for ENTER on an input stream.
pub struct StdinConfirm<R, W> {
    input: R,
    prompt_out: W,
}

impl<R: BufRead, W: Write> StdinConfirm<R, W> {
    pub fn new(input: R, prompt_out: W) -> Self {
        Self { input, prompt_out }
    }
}

impl<R: BufRead, W: Write> Confirm for StdinConfirm<R, W> {
    fn confirm(&mut self, _description: &str) -> Result<()> {
        writeln!(self.prompt_out, "Press ENTER to see the result...")?;
        self.prompt_out.flush()?;
        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("reading confirmation from stdin")?;
        if read == 0 {
            bail!("stdin closed before the step was confirmed");
        }
        Ok(())
    }
}

/// Never waits; used with `--yes` and in tests.
#[derive(Debug, Default)]
pub struct AutoConfirm;

impl Confirm for AutoConfirm {
    fn confirm(&mut self, _description: &str) -> Result<()> {
        Ok(())
    }
}

/// Any `FnMut(&str) -> Result<()>` can act as the confirmation callback.
impl<F> Confirm for F
where
    F: FnMut(&str) -> Result<()>,
{
    fn confirm(&mut self, description: &str) -> Result<()> {
        self(description)
    }
}

pub type Action<'a, S> = Box<dyn FnMut(&mut S) -> Result<()> + 'a>;

/// One entry of the walkthrough: what is shown, and what runs.
pub struct Step<'a, S> {
    pub description: String,
    pub action: Action<'a, S>,
}

impl<'a, S> Step<'a, S> {
    pub fn new(
        description: impl Into<String>,
        action: impl FnMut(&mut S) -> Result<()> + 'a,
    ) -> Self {
        Self {
            description: description.into(),
            action: Box::new(action),
        }
    }
}

/// Run `steps` in order against `state`: print the description, wait for
/// `confirm`, run the action. The first error stops the run.
pub fn run_steps<S, C, W>(
    state: &mut S,
    steps: Vec<Step<'_, S>>,
    confirm: &mut C,
    out: &mut W,
) -> Result<()>
where
    C: Confirm + ?Sized,
    W: Write + ?Sized,
{
    let total = steps.len();
    for (i, mut step) in steps.into_iter().enumerate() {
        writeln!(out, "\nChallenge: {}", step.description)?;
        out.flush()?;
        confirm.confirm(&step.description)?;

        info!(step = i + 1, total, description = %step.description, "running step");
        (step.action)(state).with_context(|| format!("step {} failed: {}", i + 1, step.description))?;
    }
    info!(total, "walkthrough finished");
    Ok(())
}
