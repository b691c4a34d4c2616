//! Top-level orchestration: scan, register, analyze, pair, transform (§4.C).
//!
//! `run` is the only entry point a caller needs; it owns the whole
//! scan→transform sequence and is instrumented with `tracing` at the
//! boundaries a caller cares about (pipeline start, each registration,
//! each outcome, fatal errors).

use tracing::{debug, error, info, warn};

use trellis_core::{NodeKind, Program};

use crate::config::{GroupSpec, ResolvedConfig};
use crate::directive;
use crate::error::{EngineError, EngineResult};
use crate::passes::{Accelerator, BlockTransform};
use crate::transform::loop_extract::LoopExtract;
use crate::transform::loop_fusion::LoopFusion;
use crate::transform::{Queue, State, Transformation};

/// Pragma text carries a fixed directive-family prefix before the grammar of
/// §4.B begins (§6); everything else is left for other front-end-owned
/// pragma families and ignored here.
const DIRECTIVE_PREFIX: &str = "claw";

fn strip_prefix(text: &str) -> Option<&str> {
    let rest = text.strip_prefix(DIRECTIVE_PREFIX)?;
    Some(rest.trim_start())
}

/// The bare type name a directive of this kind is implemented by, so a
/// group's `class` path (§4.E's "class path implementing it") can be
/// resolved back to the directive kind it governs.
fn implementing_type_name(kind: &str) -> Option<&'static str> {
    match kind {
        "loop-fusion" => Some("LoopFusion"),
        "loop-extract" => Some("LoopExtract"),
        "parallelize" => Some("Accelerator"),
        "block-start" => Some("BlockTransform"),
        _ => None,
    }
}

fn construct(
    pragma: trellis_core::NodeId,
    line: u32,
    parsed: &directive::Directive,
) -> Option<Box<dyn Transformation>> {
    match parsed.kind.as_str() {
        "loop-fusion" => Some(Box::new(LoopFusion::new(pragma, line, parsed.group_label().map(str::to_string)))),
        "loop-extract" => Some(Box::new(LoopExtract::new(pragma, line, parsed))),
        "parallelize" => Some(Box::new(Accelerator::new(pragma, line, parsed))),
        "block-start" => Some(Box::new(BlockTransform::new(pragma, line, parsed))),
        _ => None,
    }
}

/// The group (and its position in the configuration's declared order, §4.C:
/// "groups themselves run in the order declared in the configuration")
/// whose `class` path names the type implementing `kind`.
fn resolve_group<'a>(groups: &'a [GroupSpec], kind: &str) -> Option<(usize, &'a GroupSpec)> {
    let type_name = implementing_type_name(kind)?;
    groups
        .iter()
        .enumerate()
        .find(|(_, group)| group.class.rsplit("::").next() == Some(type_name))
}

/// Scan every `Pragma` node reachable from the root, parse its directive
/// text, and register a matching transformation instance. Registration
/// consults `groups` twice (§4.C, §4.E): once to find the group whose class
/// path implements this directive's kind — a directive with no matching
/// group in the resolved configuration is left unregistered, since nothing
/// declared how to run it — and once to check that group's declared
/// `kind`/`trigger` actually match what the constructed transformation
/// reports of itself, recording a diagnostic and skipping registration on a
/// mismatch. Pragmas whose directive kind isn't recognized at all
/// (including `block-end`, which only ever participates as the target of a
/// `block-start`'s own analysis) are skipped outright. Parse failures are
/// recorded as diagnostics and the offending pragma is skipped; they do not
/// abort the scan (§7: *Parse* is recoverable).
fn scan(program: &mut Program, queue: &mut Queue, groups: &[GroupSpec]) {
    let mut pragmas = Vec::new();
    collect_pragmas(&program.doc, program.root, &mut pragmas);

    for pragma in pragmas {
        let text = program.doc.get(pragma).text.clone().unwrap_or_default();
        let Some(body) = strip_prefix(&text) else {
            continue;
        };
        let line = program
            .doc
            .get(pragma)
            .attr("lineno")
            .and_then(|l| l.parse().ok())
            .unwrap_or(0);

        match directive::parse(body) {
            Ok(parsed) => {
                program.doc.get_mut(pragma).set_attr("directive-kind", parsed.kind.clone());
                let Some((group_index, group)) = resolve_group(groups, &parsed.kind) else {
                    continue;
                };
                if let Some(transformation) = construct(pragma, line, &parsed) {
                    if transformation.class() != group.kind || transformation.trigger() != group.trigger {
                        program
                            .diagnostics
                            .error(
                                format!(
                                    "group {:?} declares kind={:?}/trigger={:?}, but {} is {:?}/{:?}",
                                    group.name,
                                    group.kind,
                                    group.trigger,
                                    transformation.kind_name(),
                                    transformation.class(),
                                    transformation.trigger()
                                ),
                                trellis_core::Span::line(line),
                            )
                            .emit();
                        continue;
                    }
                    debug!(
                        kind = transformation.kind_name(),
                        group = group.name.as_str(),
                        line,
                        "registered transformation"
                    );
                    queue.register(transformation, group_index);
                }
            }
            Err(err) => {
                program
                    .diagnostics
                    .error(EngineError::from(err).to_string(), trellis_core::Span::line(line))
                    .emit();
            }
        }
    }
}

fn collect_pragmas(doc: &trellis_core::Document, id: trellis_core::NodeId, out: &mut Vec<trellis_core::NodeId>) {
    for &child in doc.children(id) {
        if doc.kind(child) == NodeKind::Pragma {
            out.push(child);
        }
        collect_pragmas(doc, child, out);
    }
}

/// Run the full pipeline against `program`. `config.groups` drives
/// registration (§4.C: "using the configuration, selects a transformation
/// class") and the order `transformAll` applies surviving instances in
/// (§4.C: "groups themselves run in the order declared in the
/// configuration") — each registered transformation is tagged with its
/// governing group's position in `config.groups`, and that position, not
/// mere document order, is the primary sort key within `transform_all`.
pub fn run(program: &mut Program, config: &ResolvedConfig) -> EngineResult<()> {
    info!(
        groups = config.groups.len(),
        sets = config.sets.len(),
        "starting pipeline run"
    );

    let mut queue = Queue::new();
    scan(program, &mut queue, &config.groups);

    if queue.is_empty() {
        info!("no recognized pragmas; pipeline is a no-op");
        return Ok(());
    }

    queue.analyze_all(program);
    queue.pair(&program.doc, &mut program.diagnostics);
    let result = queue.transform_all(program);

    for (kind, state) in queue.outcomes() {
        match state {
            State::Transformed => debug!(kind, "transformation applied"),
            State::Discarded => warn!(kind, "transformation discarded"),
            other => debug!(kind, ?other, "transformation left unresolved"),
        }
    }

    if let Err(err) = &result {
        error!(error = %err, "pipeline aborted");
    } else {
        info!(
            errors = program.diagnostics.error_count(),
            warnings = program.diagnostics.warning_count(),
            "pipeline run complete"
        );
    }

    result
}

#[cfg(test)]
mod pipeline_tests;
