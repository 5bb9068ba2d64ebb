//! Line-oriented conversational front end.
//!
//! Each line is parsed into a [`Command`]; queries are resolved to a region
//! and forecast for every configured pollutant, printing each report as soon
//! as it is ready. The interrupt future (Ctrl-C in the binary) ends the
//! session at the prompt and aborts a batch in progress; reports already
//! printed stay.

pub mod command;
pub mod responses;

use std::future::Future;
use std::io::{self, BufRead, Write};

use futures::{Stream, StreamExt};
use tracing::info;

pub use command::{Command, EXIT_TOKENS};
pub use responses::{render, FixedResponses, ResponseKind, ResponseStrategy, RotatingResponses};

use crate::error::{ForecastError, QueryError};
use crate::services::{ForecastPipeline, PollutantReport};

const PROMPT: &str = "🗣️ Tu: ";

/// Whether the loop keeps going after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct Shell {
    pipeline: ForecastPipeline,
    responses: Box<dyn ResponseStrategy>,
}

impl Shell {
    pub fn new(pipeline: ForecastPipeline, responses: Box<dyn ResponseStrategy>) -> Self {
        Self {
            pipeline,
            responses,
        }
    }

    fn say(&self, kind: ResponseKind, vars: &[(&str, &str)]) -> String {
        render(self.responses.select(kind), vars)
    }

    /// Interactive loop over `lines`, interrupted by Ctrl-C.
    pub async fn run<S, W>(&self, lines: S, output: &mut W) -> io::Result<()>
    where
        S: Stream<Item = io::Result<String>> + Unpin,
        W: Write,
    {
        self.run_with_interrupt(lines, output, ctrl_c).await
    }

    /// Interactive loop; `interrupt` is raced against every prompt and batch.
    pub async fn run_with_interrupt<S, W, F, Fut>(
        &self,
        mut lines: S,
        output: &mut W,
        interrupt: F,
    ) -> io::Result<()>
    where
        S: Stream<Item = io::Result<String>> + Unpin,
        W: Write,
        F: Fn() -> Fut,
        Fut: Future<Output = ()>,
    {
        writeln!(output, "{}", self.say(ResponseKind::Greeting, &[]))?;

        loop {
            write!(output, "{}", PROMPT)?;
            output.flush()?;

            let next = tokio::select! {
                biased;
                _ = interrupt() => {
                    writeln!(output)?;
                    writeln!(output, "{}", self.say(ResponseKind::Goodbye, &[]))?;
                    info!("interrupted at the prompt, leaving shell");
                    return Ok(());
                }
                next = lines.next() => next,
            };

            let Some(line) = next else {
                writeln!(output)?;
                info!("input closed, leaving shell");
                return Ok(());
            };

            if self.handle_line(&line?, output, &interrupt).await? == Flow::Exit {
                return Ok(());
            }
        }
    }

    /// Process one line of input.
    pub async fn handle_line<W, F, Fut>(
        &self,
        line: &str,
        output: &mut W,
        interrupt: &F,
    ) -> io::Result<Flow>
    where
        W: Write,
        F: Fn() -> Fut,
        Fut: Future<Output = ()>,
    {
        let query = match Command::parse(line) {
            Command::Exit => {
                writeln!(output, "{}", self.say(ResponseKind::Goodbye, &[]))?;
                return Ok(Flow::Exit);
            }
            Command::Empty => return Ok(Flow::Continue),
            Command::Query(query) => query,
        };

        let region = match self.pipeline.resolve(&query) {
            Ok(region) => region,
            Err(QueryError::Ambiguous { candidates }) => {
                writeln!(output, "{}", self.say(ResponseKind::Ambiguous, &[]))?;
                writeln!(output, "Regioni candidate: {}", candidates.join(", "))?;
                return Ok(Flow::Continue);
            }
            Err(QueryError::NotFound { known }) => {
                writeln!(output, "{}", self.say(ResponseKind::RegionNotFound, &[]))?;
                writeln!(output, "Regioni disponibili: {}", known.join(", "))?;
                return Ok(Flow::Continue);
            }
        };

        writeln!(
            output,
            "{}",
            self.say(ResponseKind::RegionFound, &[("region", region.as_str())])
        )?;
        output.flush()?;

        let reports = self.pipeline.reports(&region);
        tokio::pin!(reports);
        let interrupted = interrupt();
        tokio::pin!(interrupted);

        loop {
            tokio::select! {
                biased;
                _ = &mut interrupted => {
                    info!(region = %region, "batch interrupted");
                    writeln!(output, "{}", self.say(ResponseKind::Interrupted, &[]))?;
                    break;
                }
                next = reports.next() => match next {
                    Some(report) => self.print_report(&report, output)?,
                    None => break,
                },
            }
        }
        Ok(Flow::Continue)
    }

    /// Answer a single question without the greeting and prompt.
    pub async fn answer_once<W: Write>(&self, query: &str, output: &mut W) -> io::Result<()> {
        self.handle_line(query, output, &ctrl_c).await.map(|_| ())
    }

    fn print_report<W: Write>(&self, report: &PollutantReport, output: &mut W) -> io::Result<()> {
        let label = report.pollutant.label.as_str();
        writeln!(
            output,
            "{}",
            self.say(ResponseKind::Processing, &[("pollutant", label)])
        )?;

        match &report.outcome {
            Ok(artifacts) => {
                let result = &artifacts.result;
                if let (Some(first), Some(last)) = (result.first_future(), result.last_future()) {
                    writeln!(
                        output,
                        "    {}: {:.2} -> {}: {:.2} [{:.2}, {:.2}] (MAE {:.2}, R² {:.2})",
                        first.year(),
                        first.point_estimate,
                        last.year(),
                        last.point_estimate,
                        last.lower_bound,
                        last.upper_bound,
                        result.metrics.mean_absolute_error,
                        result.metrics.r_squared
                    )?;
                }
                match &artifacts.chart {
                    Some(path) => writeln!(output, "[✓] Grafico salvato in: {}", path.display())?,
                    None => writeln!(output, "[⚠️] Grafico non disponibile per {}", label)?,
                }
                if let Some(text) = &artifacts.explanation {
                    writeln!(output, "\n📄 Spiegazione AI per {}:\n{}\n", label, text)?;
                }
            }
            Err(ForecastError::InsufficientData { .. }) => {
                writeln!(output, "[⚠️] Dati insufficienti per {}", label)?;
            }
            Err(ForecastError::FitFailure(reason)) => {
                writeln!(output, "[⚠️] Dati insufficienti per {} ({})", label, reason)?;
            }
        }
        output.flush()
    }
}

/// Lines of standard input, read on a dedicated thread.
///
/// A blocking read cannot be cancelled, so it stays off the runtime; the
/// thread ends with the process or at end of input.
pub fn stdin_lines() -> io::Result<impl Stream<Item = io::Result<String>> + Unpin> {
    let (tx, rx) = tokio::sync::mpsc::channel(1);
    std::thread::Builder::new()
        .name("airq-stdin".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let failed = line.is_err();
                if tx.blocking_send(line).is_err() || failed {
                    break;
                }
            }
        })?;

    Ok(Box::pin(futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|line| (line, rx))
    })))
}

/// Resolves on Ctrl-C; never resolves if the handler cannot be installed.
async fn ctrl_c() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}
