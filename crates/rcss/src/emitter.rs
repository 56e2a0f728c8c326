//! Phased, tag-dispatched delivery of syntax units to passes.
//!
//! Passes subscribe handlers against an event tag and a [`Phase`]. When a
//! unit is emitted, the [`Emitter`] walks the unit's tag set (its concrete
//! kind plus every category it belongs to) and calls each handler
//! registered for one of those tags under the current phase, in
//! registration order.
//!
//! Handlers get a [`Context`] through which they can refine units and
//! attach new ones; anything they broadcast is delivered back through the
//! emitter.

use std::any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::ast::{
    AtRule, Declaration, EventTags, FunctionArgs, FunctionValue, PropertyValue, Selector,
    SelectorPart, Shared, Status, Syntax,
};
use crate::broadcast::Broadcaster;
use crate::error::Result;
use crate::refine::Refiner;
use crate::tree;

/// Processing phases, applied strictly in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Preprocess,
    Process,
    Validate,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Preprocess, Phase::Process, Phase::Validate];

    fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Phase::Preprocess => "preprocess",
            Phase::Process => "process",
            Phase::Validate => "validate",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A handler bound to a pass of type `P`.
pub type Handler<P> = fn(&P, &Syntax, &Context<'_>) -> Result<()>;

/// One (tag, phase, handler) entry declared by a pass.
pub struct Subscription<P> {
    pub tag: EventTags,
    pub phase: Phase,
    pub handler: Handler<P>,
}

impl<P> Subscription<P> {
    pub fn new(tag: EventTags, phase: Phase, handler: Handler<P>) -> Self {
        Self {
            tag,
            phase,
            handler,
        }
    }
}

/// A unit of work that observes syntax units as they are delivered.
///
/// Passes with state keep it behind `Cell`/`RefCell`, since handlers only
/// get a shared reference.
pub trait Pass: 'static {
    fn name(&self) -> &'static str {
        let name = any::type_name::<Self>();
        name.rsplit("::").next().unwrap_or(name)
    }

    /// The handlers this pass wants registered.
    fn subscriptions() -> Vec<Subscription<Self>>
    where
        Self: Sized;
}

type BoxedHandler = Box<dyn Fn(&Syntax, &Context<'_>) -> Result<()>>;

/// Routes emitted units to subscribed handlers.
pub struct Emitter {
    phase: Cell<Phase>,
    tables: [HashMap<EventTags, Vec<BoxedHandler>>; 3],
}

impl Default for Emitter {
    fn default() -> Self {
        Self {
            phase: Cell::new(Phase::Preprocess),
            tables: Default::default(),
        }
    }
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase.get()
    }

    pub fn set_phase(&self, phase: Phase) {
        if self.phase.replace(phase) != phase {
            log::debug!("entering {phase} phase");
        }
    }

    /// Registers every subscription declared by `pass` and returns the
    /// shared handle the handlers are bound to.
    pub fn register<P: Pass>(&mut self, pass: P) -> Rc<P> {
        let pass = Rc::new(pass);
        let subscriptions = P::subscriptions();
        log::debug!(
            "registering pass {} with {} handlers",
            pass.name(),
            subscriptions.len()
        );

        for subscription in subscriptions {
            let bound = Rc::clone(&pass);
            let handler = subscription.handler;
            self.subscribe(subscription.tag, subscription.phase, move |syntax, cx| {
                handler(&bound, syntax, cx)
            });
        }
        pass
    }

    /// Registers a single handler. A tag naming several flags registers the
    /// handler under each of them, so it runs once per matching flag.
    pub fn subscribe<F>(&mut self, tag: EventTags, phase: Phase, handler: F)
    where
        F: Fn(&Syntax, &Context<'_>) -> Result<()> + Clone + 'static,
    {
        let table = &mut self.tables[phase.index()];
        for flag in tag.iter() {
            table
                .entry(flag)
                .or_default()
                .push(Box::new(handler.clone()));
        }
    }

    /// Number of handlers registered for exactly `tag` under `phase`.
    pub fn subscribers(&self, tag: EventTags, phase: Phase) -> usize {
        self.tables[phase.index()].get(&tag).map_or(0, Vec::len)
    }

    /// Delivers `syntax` to the current phase's handlers.
    pub fn emit(&self, syntax: &Syntax, cx: &Context<'_>) -> Result<()> {
        let table = &self.tables[self.phase().index()];
        if table.is_empty() {
            return Ok(());
        }
        log::trace!("emitting {} during {}", syntax.kind(), self.phase());

        for tag in syntax.tags().iter() {
            if let Some(handlers) = table.get(&tag) {
                for handler in handlers {
                    handler(syntax, cx)?;
                }
            }
        }
        Ok(())
    }
}

/// What handlers see of the processing run.
///
/// Every unit broadcast through the context is recorded in a journal so
/// that later phases can replay it; while the context is live, broadcast
/// units are also emitted straight away.
pub struct Context<'a> {
    emitter: &'a Emitter,
    refiner: &'a Refiner,
    journal: RefCell<Vec<Syntax>>,
    live: Cell<bool>,
}

impl<'a> Context<'a> {
    pub fn new(emitter: &'a Emitter, refiner: &'a Refiner) -> Self {
        Self {
            emitter,
            refiner,
            journal: RefCell::new(Vec::new()),
            live: Cell::new(true),
        }
    }

    pub fn phase(&self) -> Phase {
        self.emitter.phase()
    }

    pub fn refiner(&self) -> &Refiner {
        self.refiner
    }

    pub fn emitter(&self) -> &Emitter {
        self.emitter
    }

    pub fn is_live(&self) -> bool {
        self.live.get()
    }

    /// When not live, broadcast units are only journaled.
    pub fn set_live(&self, live: bool) {
        self.live.set(live);
    }

    /// A sink that journals units and, while live, emits them.
    pub fn broadcaster(&self) -> EmittingBroadcaster<'_, 'a> {
        EmittingBroadcaster { cx: self }
    }

    pub fn refine_selector(
        &self,
        selector: &Shared<Selector>,
    ) -> Result<Vec<Shared<SelectorPart>>> {
        self.refiner.refine_selector(selector, &mut self.broadcaster())
    }

    pub fn refine_declaration(
        &self,
        declaration: &Shared<Declaration>,
    ) -> Result<Shared<PropertyValue>> {
        self.refiner
            .refine_declaration(declaration, &mut self.broadcaster())
    }

    pub fn refine_at_rule(&self, at_rule: &Shared<AtRule>) -> Result<()> {
        self.refiner.refine_at_rule(at_rule, &mut self.broadcaster())
    }

    pub fn refine_function(
        &self,
        function: &Shared<FunctionValue>,
    ) -> Result<Shared<FunctionArgs>> {
        self.refiner.refine_function(function, &mut self.broadcaster())
    }

    /// Attaches `child` to `parent` and broadcasts whatever of the child's
    /// subtree has not been broadcast yet.
    pub fn attach(&self, parent: &Syntax, child: Syntax) -> Result<()> {
        tree::attach(parent, child, &mut self.broadcaster())
    }

    /// Everything broadcast so far, in order.
    pub fn journal(&self) -> Vec<Syntax> {
        self.journal.borrow().clone()
    }

    /// Emits every journaled unit again under the current phase. Units
    /// broadcast by handlers during the replay are emitted once, live.
    pub fn replay(&self) -> Result<()> {
        let journal = self.journal();
        log::debug!(
            "replaying {} units for {} phase",
            journal.len(),
            self.phase()
        );
        let live = self.live.replace(true);
        for syntax in &journal {
            self.emitter.emit(syntax, self)?;
        }
        self.live.set(live);
        Ok(())
    }

    /// Moves every journaled unit to at least `status`.
    pub fn advance_journal(&self, status: Status) {
        for syntax in self.journal.borrow().iter() {
            syntax.advance_status(status);
        }
    }
}

/// The broadcaster handed out by [`Context::broadcaster`].
pub struct EmittingBroadcaster<'c, 'a> {
    cx: &'c Context<'a>,
}

impl Broadcaster for EmittingBroadcaster<'_, '_> {
    fn broadcast(&mut self, syntax: Syntax) -> Result<()> {
        syntax.advance_status(Status::Broadcast);
        self.cx.journal.borrow_mut().push(syntax.clone());
        if self.cx.is_live() {
            self.cx.emitter.emit(&syntax, self.cx)?;
        }
        Ok(())
    }
}
