//! The processing driver.
//!
//! A [`Processor`] owns an [`Emitter`] with its registered passes and a
//! [`Refiner`] with its strategies, and runs a document through a sequence
//! of phases:
//!
//! 1. The source is parsed once. Units are delivered live to the first
//!    phase's handlers as the parser creates them.
//! 2. Each later phase replays every unit delivered so far, in order.
//! 3. Before VALIDATE, the whole tree is refined, so validators never see
//!    a raw span.
//!
//! ```rust
//! use rcss::Processor;
//!
//! let processor = Processor::new();
//! let sheet = processor.process("a { color: red }").unwrap();
//! assert_eq!(sheet.statements.len(), 1);
//! ```

use std::rc::Rc;

use crate::ast::{Status, Stylesheet};
use crate::cursor::Cursor;
use crate::emitter::{Context, Emitter, Pass, Phase};
use crate::error::Result;
use crate::grammar::Grammar;
use crate::parser;
use crate::refine::Refiner;
use crate::tree;

pub struct Processor {
    emitter: Emitter,
    refiner: Refiner,
    phases: Vec<Phase>,
}

impl Default for Processor {
    fn default() -> Self {
        Self {
            emitter: Emitter::new(),
            refiner: Refiner::new(),
            phases: Phase::ALL.to_vec(),
        }
    }
}

impl Processor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_grammar(mut self, grammar: Grammar) -> Self {
        self.refiner.set_grammar(grammar);
        self
    }

    /// Restricts the run to `phases`. They always run in phase order,
    /// whatever order they are given in.
    pub fn with_phases(mut self, phases: impl IntoIterator<Item = Phase>) -> Self {
        let mut phases: Vec<Phase> = phases.into_iter().collect();
        phases.sort();
        phases.dedup();
        self.phases = phases;
        self
    }

    /// Registers a pass; the returned handle is shared with its handlers.
    pub fn register<P: Pass>(&mut self, pass: P) -> Rc<P> {
        self.emitter.register(pass)
    }

    pub fn emitter_mut(&mut self) -> &mut Emitter {
        &mut self.emitter
    }

    /// The refinement registry, for registering strategies.
    pub fn refiner_mut(&mut self) -> &mut Refiner {
        &mut self.refiner
    }

    pub fn refiner(&self) -> &Refiner {
        &self.refiner
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    /// Parses `source` and runs it through every configured phase.
    pub fn process(&self, source: &str) -> Result<Stylesheet> {
        let cx = Context::new(&self.emitter, &self.refiner);
        let grammar = self.refiner.grammar();
        let mut cursor = Cursor::new(source);

        let Some((&first, rest)) = self.phases.split_first() else {
            cx.set_live(false);
            return parser::stylesheet(&mut cursor, &mut cx.broadcaster(), grammar);
        };

        let stylesheet = if first == Phase::Validate {
            cx.set_live(false);
            let stylesheet = parser::stylesheet(&mut cursor, &mut cx.broadcaster(), grammar)?;
            tree::refine_all(&stylesheet, &self.refiner, &mut cx.broadcaster())?;
            self.emitter.set_phase(Phase::Validate);
            cx.replay()?;
            stylesheet
        } else {
            self.emitter.set_phase(first);
            cx.set_live(true);
            parser::stylesheet(&mut cursor, &mut cx.broadcaster(), grammar)?
        };
        let mut previous = first;

        for &phase in rest {
            if phase == Phase::Validate {
                tree::refine_all(&stylesheet, &self.refiner, &mut cx.broadcaster())?;
            }
            finish_phase(&cx, previous);
            self.emitter.set_phase(phase);
            cx.replay()?;
            previous = phase;
        }
        finish_phase(&cx, previous);

        Ok(stylesheet)
    }
}

fn finish_phase(cx: &Context<'_>, phase: Phase) {
    if phase == Phase::Process {
        cx.advance_journal(Status::Processed);
    }
}
