//! The transformation framework: registry, analysis, dependent pairing, and
//! ordered application (§4.C).

use std::any::Any;
use std::collections::HashMap;

use trellis_core::{Diagnostics, Document, Span};

use crate::error::EngineResult;

pub mod loop_extract;
pub mod loop_fusion;

/// Whether a transformation must be matched with a sibling instance before
/// it can run (§3, §4.C).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransformationClass {
    Independent,
    Dependent,
}

/// What triggers a transformation's registration (§4.E).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TriggerClass {
    Directive,
    TranslationUnit,
}

/// Lifecycle state of a queued transformation (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Pending,
    Analyzed(bool),
    Transformed,
    Discarded,
}

/// One registered transformation instance.
///
/// `pair_with` is the hook dependent classes use to absorb a partner
/// instance found during [`Queue::pair`]; independent transformations use
/// the default (always fails, so each instance runs on its own).
pub trait Transformation: Any {
    fn kind_name(&self) -> &'static str;
    fn class(&self) -> TransformationClass;
    fn trigger(&self) -> TriggerClass;
    fn group_label(&self) -> Option<String>;
    /// Document line of the triggering pragma, for ordering (§4.C).
    fn line(&self) -> u32;
    fn analyze(&mut self, program: &mut trellis_core::Program) -> bool;
    /// Apply this transformation. `spawned` collects any follow-up
    /// transformations this one enqueues (§4.D.2 step 6); most
    /// implementations leave it untouched.
    fn transform(
        &mut self,
        program: &mut trellis_core::Program,
        spawned: &mut Vec<Box<dyn Transformation>>,
    ) -> EngineResult<()>;
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Try to absorb `partner` (same kind, same group) found during pairing.
    /// `doc` is read-only here — pairing decides whether to merge, it never
    /// mutates the tree. Returns `false` when the pairing precondition fails
    /// (§4.D.1 condition c); both instances are then discarded with a
    /// diagnostic.
    fn pair_with(&mut self, _partner: &mut dyn Transformation, _doc: &Document) -> bool {
        false
    }
}

struct Entry {
    transformation: Box<dyn Transformation>,
    state: State,
    /// Position of this entry's governing group within the configuration's
    /// declared group order (§4.C: "groups themselves run in the order
    /// declared in the configuration"). A transformation spawned by another
    /// (§4.D.2 step 6) inherits its spawner's group index.
    group_index: usize,
}

/// Two disjoint mutable references into `entries` by index, regardless of
/// which of `a`/`b` is larger.
fn two_mut(entries: &mut [Entry], a: usize, b: usize) -> (&mut Entry, &mut Entry) {
    assert_ne!(a, b);
    if a < b {
        let (left, right) = entries.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = entries.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}

/// Queue of transformations registered during the scan phase of a pipeline
/// run, driven through `analyzeAll` → `pair` → `transformAll` (§4.C).
#[derive(Default)]
pub struct Queue {
    entries: Vec<Entry>,
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `transformation` under its governing group's position in
    /// the configuration's declared group order (§4.C).
    pub fn register(&mut self, transformation: Box<dyn Transformation>, group_index: usize) {
        self.entries.push(Entry {
            transformation,
            state: State::Pending,
            group_index,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run `analyze` on every pending instance.
    pub fn analyze_all(&mut self, program: &mut trellis_core::Program) {
        for entry in &mut self.entries {
            if entry.state != State::Pending {
                continue;
            }
            let ok = entry.transformation.analyze(program);
            entry.state = State::Analyzed(ok);
        }
    }

    /// Match analyzed dependent instances sharing (kind, group label): the
    /// earliest instance in document order is the anchor, and every later
    /// member of the group is absorbed into it one at a time via
    /// `pair_with` (so a group of 3+ — e.g. three contiguous same-group
    /// `loop-fusion` pragmas — chains onto a single survivor rather than
    /// only ever matching two at a time). A member the anchor refuses is
    /// discarded on its own; an anchor that absorbs nothing is discarded
    /// too, matching the plain-pairwise behavior for a group of exactly 2.
    pub fn pair(&mut self, doc: &Document, diagnostics: &mut Diagnostics) {
        let mut groups: HashMap<(&'static str, Option<String>), Vec<usize>> = HashMap::new();
        for (i, entry) in self.entries.iter().enumerate() {
            if entry.transformation.class() == TransformationClass::Dependent
                && entry.state == State::Analyzed(true)
            {
                let key = (entry.transformation.kind_name(), entry.transformation.group_label());
                groups.entry(key).or_default().push(i);
            }
        }

        for (_key, mut indices) in groups {
            indices.sort_by_key(|&i| self.entries[i].transformation.line());
            let mut iter = indices.into_iter();
            let Some(anchor) = iter.next() else { continue };

            let mut absorbed_any = false;
            for next in iter {
                let (anchor_entry, next_entry) = two_mut(&mut self.entries, anchor, next);
                if anchor_entry.transformation.pair_with(next_entry.transformation.as_mut(), doc) {
                    next_entry.state = State::Discarded;
                    absorbed_any = true;
                } else {
                    let line = next_entry.transformation.line();
                    let kind = next_entry.transformation.kind_name();
                    diagnostics
                        .error(
                            format!("{kind} pairing precondition failed against its group anchor; discarded"),
                            Span::line(line),
                        )
                        .emit();
                    next_entry.state = State::Discarded;
                }
            }

            if !absorbed_any {
                let line = self.entries[anchor].transformation.line();
                let kind = self.entries[anchor].transformation.kind_name();
                diagnostics
                    .error(format!("{kind} has no matching pair; discarded"), Span::line(line))
                    .emit();
                self.entries[anchor].state = State::Discarded;
            }
        }
    }

    /// Apply every surviving instance, ordered by its governing group's
    /// declared position first and document order second (§4.C: "within a
    /// group, transformations execute in document order... groups
    /// themselves run in the order declared in the configuration"). The
    /// first `transform` failure is fatal (§4.C, §7): the engine aborts and
    /// the caller must not emit the partially-transformed document.
    ///
    /// A transformation may itself spawn a follow-up instance (§4.D.2 step 6:
    /// loop extraction chaining a loop-fusion on its wrapped loop); the
    /// spawned instance inherits its spawner's group index. Spawned
    /// instances are registered, analyzed, and paired exactly like any
    /// other, then run through another round — repeating until a round
    /// spawns nothing new.
    pub fn transform_all(&mut self, program: &mut trellis_core::Program) -> EngineResult<()> {
        loop {
            let mut order: Vec<usize> = self
                .entries
                .iter()
                .enumerate()
                .filter(|(_, e)| e.state == State::Analyzed(true))
                .map(|(i, _)| i)
                .collect();
            if order.is_empty() {
                return Ok(());
            }
            order.sort_by_key(|&i| (self.entries[i].group_index, self.entries[i].transformation.line()));

            let mut spawned: Vec<(Box<dyn Transformation>, usize)> = Vec::new();
            for i in order {
                if self.entries[i].state != State::Analyzed(true) {
                    continue;
                }
                let group_index = self.entries[i].group_index;
                let mut new_transformations = Vec::new();
                self.entries[i].transformation.transform(program, &mut new_transformations)?;
                self.entries[i].state = State::Transformed;
                spawned.extend(new_transformations.into_iter().map(|t| (t, group_index)));
            }

            if spawned.is_empty() {
                return Ok(());
            }
            let start = self.entries.len();
            for (transformation, group_index) in spawned {
                self.register(transformation, group_index);
            }
            for entry in &mut self.entries[start..] {
                let ok = entry.transformation.analyze(program);
                entry.state = State::Analyzed(ok);
            }
            self.pair(&program.doc, &mut program.diagnostics);
        }
    }

    pub fn outcomes(&self) -> impl Iterator<Item = (&'static str, State)> + '_ {
        self.entries
            .iter()
            .map(|e| (e.transformation.kind_name(), e.state))
    }
}
