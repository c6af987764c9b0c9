//! Line-oriented script interpreter.
//!
//! Scripts carry one token per line: a command word, then each argument on
//! its own line. Batched commands (`excess`, `observations`, `proximity`)
//! keep consuming lines until the next command word. Results go to the
//! output sink handed to [`Interpreter::run`]; a failing command is
//! reported there and never aborts the run.

use std::collections::BTreeMap;
use std::io::Write;
use std::iter::Peekable;

use aq_analysis as analysis;
use aq_network::{Network, PipeKey};
use tracing::debug;

use crate::coords;
use crate::error::{CliError, CliResult};

const COMMANDS: &[&str] = &[
    "source",
    "terminal",
    "junction",
    "connect",
    "subscribe",
    "open",
    "close",
    "backtrack",
    "supply",
    "demand",
    "flow-at",
    "demand-at",
    "subscriber-flow",
    "cycles",
    "tree",
    "min-flow",
    "excess",
    "observations",
    "proximity",
    "snapshot",
    "max-flow",
];

fn is_command(line: &str) -> bool {
    COMMANDS.contains(&line)
}

#[derive(Debug, Clone, Copy)]
enum ValveAction {
    Opened,
    Closed,
}

/// One executed valve command, kept for `backtrack`.
#[derive(Debug)]
struct ValveStep {
    /// Whether the command actually changed the valve; no-ops undo to
    /// nothing.
    changed: bool,
    action: ValveAction,
    node: String,
}

#[derive(Debug, Default)]
pub struct Interpreter {
    net: Network,
    undo: Vec<ValveStep>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The network in its current state, for embedding callers.
    pub fn network(&self) -> &Network {
        &self.net
    }

    /// Execute `script`, writing results and per-command errors to `out`.
    /// Only sink I/O failures abort the run.
    pub fn run<W: Write>(&mut self, script: &str, out: &mut W) -> std::io::Result<()> {
        let mut lines = script
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .peekable();
        while let Some(line) = lines.next() {
            if let Err(err) = self.dispatch(line, &mut lines, out) {
                match err {
                    CliError::Io(e) => return Err(e),
                    other => writeln!(out, "error: {other}")?,
                }
            }
        }
        Ok(())
    }

    fn dispatch<'a, I, W>(
        &mut self,
        command: &str,
        lines: &mut Peekable<I>,
        out: &mut W,
    ) -> CliResult<()>
    where
        I: Iterator<Item = &'a str>,
        W: Write,
    {
        debug!(command, "dispatching");
        match command {
            "source" => {
                let id = arg(lines, "source")?;
                let coord = coords::parse_coord(arg(lines, "source")?)?;
                self.net.add_source(id, coord)?;
            }
            "terminal" => {
                let id = arg(lines, "terminal")?;
                let coord = coords::parse_coord(arg(lines, "terminal")?)?;
                let peak = parse_f64(arg(lines, "terminal")?)?;
                self.net.add_terminal(id, coord, peak)?;
            }
            "junction" => {
                let id = arg(lines, "junction")?;
                let coord = coords::parse_coord(arg(lines, "junction")?)?;
                self.net.add_junction(id, coord)?;
            }
            "connect" => {
                let from = arg(lines, "connect")?;
                let to = arg(lines, "connect")?;
                let capacity = parse_f64(arg(lines, "connect")?)?;
                self.net.connect(from, to, capacity)?;
            }
            "subscribe" => {
                let client = arg(lines, "subscribe")?;
                let terminal = arg(lines, "subscribe")?;
                self.net.subscribe(client, terminal)?;
            }
            "open" => {
                let id = arg(lines, "open")?;
                let changed = self.net.open_valve(id)?;
                self.undo.push(ValveStep {
                    changed,
                    action: ValveAction::Opened,
                    node: id.to_string(),
                });
            }
            "close" => {
                let id = arg(lines, "close")?;
                let changed = self.net.close_valve(id)?;
                self.undo.push(ValveStep {
                    changed,
                    action: ValveAction::Closed,
                    node: id.to_string(),
                });
            }
            "backtrack" => {
                let text = arg(lines, "backtrack")?;
                let count: usize = text.parse().map_err(|_| CliError::BadNumber {
                    text: text.to_string(),
                })?;
                for _ in 0..count {
                    let Some(step) = self.undo.pop() else { break };
                    if step.changed {
                        match step.action {
                            ValveAction::Opened => self.net.close_valve(&step.node)?,
                            ValveAction::Closed => self.net.open_valve(&step.node)?,
                        };
                    }
                }
            }
            "supply" => {
                let id = arg(lines, "supply")?;
                let value = parse_f64(arg(lines, "supply")?)?;
                self.net.set_source_output(id, value)?;
            }
            "demand" => {
                let id = arg(lines, "demand")?;
                let value = parse_f64(arg(lines, "demand")?)?;
                self.net.set_terminal_demand(id, value)?;
            }
            "flow-at" => {
                let id = arg(lines, "flow-at")?;
                let value = self.net.flow_at(id)?;
                writeln!(out, "flow at {id}")?;
                writeln!(out, "{value}")?;
            }
            "demand-at" => {
                let id = arg(lines, "demand-at")?;
                let value = self.net.demand_at(id)?;
                writeln!(out, "demand at {id}")?;
                writeln!(out, "{value}")?;
            }
            "subscriber-flow" => {
                let client = arg(lines, "subscriber-flow")?;
                let value = self.net.subscriber_flow(client)?;
                writeln!(out, "subscriber flow")?;
                writeln!(out, "{value}")?;
            }
            "cycles" => {
                let id = arg(lines, "cycles")?;
                let cyclic = analysis::has_cycle(&self.net, id)?;
                if cyclic {
                    writeln!(out, "{id} has cycles")?;
                } else {
                    writeln!(out, "{id} has no cycles")?;
                }
            }
            "tree" => {
                let id = arg(lines, "tree")?;
                let tree = analysis::is_tree(&self.net, id)?;
                if tree {
                    writeln!(out, "{id} is a tree")?;
                } else {
                    writeln!(out, "{id} is not a tree")?;
                }
            }
            "min-flow" => {
                let id = arg(lines, "min-flow")?;
                let pct_text = arg(lines, "min-flow")?;
                let pct = parse_f64(pct_text.strip_suffix('%').unwrap_or(pct_text))?;
                let value = analysis::min_source_flow(&self.net, id, pct)?;
                writeln!(out, "min flow")?;
                writeln!(out, "{value}")?;
            }
            "excess" => {
                let mut candidates: Vec<PipeKey> = Vec::new();
                while let Some(line) = batch_line(lines) {
                    candidates.push(parse_pipe_id(line)?);
                }
                if candidates.is_empty() {
                    return Err(CliError::MissingArgument { command: "excess" });
                }
                let excess = analysis::excess_pipes(&self.net, &candidates)?;
                writeln!(out, "excess")?;
                for (from, to) in excess {
                    writeln!(out, "{from}-{to}")?;
                }
            }
            "observations" => {
                let mut observations: BTreeMap<String, bool> = BTreeMap::new();
                while let Some(line) = batch_line(lines) {
                    let (terminal, arrives) = parse_observation(line)?;
                    observations.insert(terminal, arrives);
                }
                if observations.is_empty() {
                    return Err(CliError::MissingArgument {
                        command: "observations",
                    });
                }
                let to_close = analysis::valves_to_close(&self.net, &observations)?;
                writeln!(out, "close")?;
                for id in to_close {
                    writeln!(out, "{id}")?;
                }
            }
            "proximity" => {
                let reference = coords::parse_coord(arg(lines, "proximity")?)?;
                let mut ids: Vec<String> = Vec::new();
                while let Some(line) = batch_line(lines) {
                    ids.push(line.to_string());
                }
                if ids.is_empty() {
                    return Err(CliError::MissingArgument {
                        command: "proximity",
                    });
                }
                let ordered = analysis::order_by_proximity(&self.net, reference, &ids)?;
                writeln!(out, "proximity")?;
                for id in ordered {
                    writeln!(out, "{id}")?;
                }
            }
            "snapshot" => {
                let id = arg(lines, "snapshot")?;
                let snapshot = self.net.snapshot(id)?;
                writeln!(out, "{}", serde_json::to_string_pretty(&snapshot)?)?;
            }
            "max-flow" => {
                let id = arg(lines, "max-flow")?;
                let outcome = analysis::max_flow(&self.net, id)?;
                for flow in &outcome.path_flows {
                    writeln!(out, "path flow: {flow}")?;
                }
                writeln!(out, "max flow: {}", outcome.total)?;
            }
            other => {
                return Err(CliError::UnknownCommand {
                    line: other.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn arg<'a, I>(lines: &mut Peekable<I>, command: &'static str) -> CliResult<&'a str>
where
    I: Iterator<Item = &'a str>,
{
    lines.next().ok_or(CliError::MissingArgument { command })
}

/// Next line of a batched block, or None at the next command word (or the
/// end of the script).
fn batch_line<'a, I>(lines: &mut Peekable<I>) -> Option<&'a str>
where
    I: Iterator<Item = &'a str>,
{
    match lines.peek() {
        Some(&line) if !is_command(line) => lines.next(),
        _ => None,
    }
}

fn parse_f64(text: &str) -> CliResult<f64> {
    text.parse().map_err(|_| CliError::BadNumber {
        text: text.to_string(),
    })
}

fn parse_pipe_id(text: &str) -> CliResult<PipeKey> {
    let (from, to) = text.split_once('-').ok_or_else(|| CliError::BadPipeId {
        text: text.to_string(),
    })?;
    Ok((from.to_string(), to.to_string()))
}

fn parse_observation(text: &str) -> CliResult<(String, bool)> {
    let bad = || CliError::BadObservation {
        text: text.to_string(),
    };
    let (terminal, answer) = text.split_once(' ').ok_or_else(bad)?;
    let arrives = match answer.trim() {
        "YES" => true,
        "NO" => false,
        _ => return Err(bad()),
    };
    Ok((terminal.to_string(), arrives))
}
