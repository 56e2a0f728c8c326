//! Integration tests for phased, tagged delivery.
//!
//! Covers the emitter's routing rules:
//! - A handler only runs during the phase it subscribed to
//! - Category tags match every unit kind they contain
//! - Handlers for the same tag run in registration order
//! - Units attached by a handler reach the handlers of later phases

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use rcss::ast::{
    Declaration, EventTags, PropertyName, PropertyValue, Rule, SelectorPart, SelectorPartKind,
    Shared, Syntax, Term, TermKind, ValueMember, shared,
};
use rcss::error::{CssError, ErrorCode, Position};
use rcss::passes::AutoRefine;
use rcss::{Context, Emitter, Pass, Phase, Processor, Refiner, Subscription};

fn class_part() -> Syntax {
    Syntax::from(shared(SelectorPart::new(
        Position::new(1, 1),
        SelectorPartKind::Class("a".into()),
    )))
}

/// Records the kind of every unit it sees, per phase.
#[derive(Default)]
struct Recorder {
    seen: RefCell<Vec<(Phase, String)>>,
}

impl Recorder {
    fn record(&self, syntax: &Syntax, cx: &Context<'_>) -> rcss::Result<()> {
        self.seen
            .borrow_mut()
            .push((cx.phase(), syntax.kind().to_string()));
        Ok(())
    }

    fn count(&self, phase: Phase, kind: &str) -> usize {
        self.seen
            .borrow()
            .iter()
            .filter(|(p, k)| *p == phase && k == kind)
            .count()
    }
}

impl Pass for Recorder {
    fn subscriptions() -> Vec<Subscription<Self>> {
        vec![
            Subscription::new(EventTags::STATEMENT, Phase::Preprocess, Recorder::record),
            Subscription::new(EventTags::DECLARATION, Phase::Process, Recorder::record),
            Subscription::new(EventTags::DECLARATION, Phase::Validate, Recorder::record),
            Subscription::new(EventTags::SELECTOR_PART, Phase::Validate, Recorder::record),
        ]
    }
}

/// Looks at each refined fragment as it arrives and records whether its
/// parent already holds it.
#[derive(Default)]
struct AttachmentCheck {
    declaration: RefCell<Option<Shared<Declaration>>>,
    part_counts: RefCell<Vec<usize>>,
    members_attached: RefCell<Vec<bool>>,
}

impl AttachmentCheck {
    fn declaration(&self, syntax: &Syntax, _cx: &Context<'_>) -> rcss::Result<()> {
        if let Some(declaration) = syntax.get::<Declaration>() {
            *self.declaration.borrow_mut() = Some(declaration);
        }
        Ok(())
    }

    fn part(&self, syntax: &Syntax, _cx: &Context<'_>) -> rcss::Result<()> {
        let Some(part) = syntax.get::<SelectorPart>() else {
            return Ok(());
        };
        let count = match part.borrow().parent() {
            Some(selector) if selector.borrow().is_refined() => {
                let selector = selector.borrow();
                let held = selector.parts().iter().any(|p| Rc::ptr_eq(p, &part));
                if held {
                    selector.parts().len()
                } else {
                    0
                }
            }
            _ => 0,
        };
        self.part_counts.borrow_mut().push(count);
        Ok(())
    }

    fn member(&self, syntax: &Syntax, _cx: &Context<'_>) -> rcss::Result<()> {
        let value = self
            .declaration
            .borrow()
            .as_ref()
            .and_then(|declaration| declaration.borrow().value.clone());
        let attached = value.is_some_and(|value| {
            let value = value.borrow();
            value.members.iter().any(|member| member.to_syntax().ptr_eq(syntax))
        });
        self.members_attached.borrow_mut().push(attached);
        Ok(())
    }
}

impl Pass for AttachmentCheck {
    fn subscriptions() -> Vec<Subscription<Self>> {
        vec![
            Subscription::new(EventTags::DECLARATION, Phase::Process, Self::declaration),
            Subscription::new(EventTags::SELECTOR_PART, Phase::Process, Self::part),
            Subscription::new(EventTags::TERM, Phase::Process, Self::member),
        ]
    }
}

/// Gives every rule an extra `display: block` declaration during PROCESS.
struct AddDisplay;

impl AddDisplay {
    fn rule(&self, syntax: &Syntax, cx: &Context<'_>) -> rcss::Result<()> {
        if syntax.get::<Rule>().is_none() {
            return Ok(());
        }
        let mut value = PropertyValue::synthetic();
        let keyword = Term::synthetic(TermKind::Keyword("block".into()));
        value.members.push(ValueMember::Term(shared(keyword)));
        let declaration = Declaration::synthetic(PropertyName::new("display"), shared(value));
        cx.attach(syntax, Syntax::from(shared(declaration)))
    }
}

impl Pass for AddDisplay {
    fn subscriptions() -> Vec<Subscription<Self>> {
        vec![Subscription::new(EventTags::RULE, Phase::Process, AddDisplay::rule)]
    }
}

/// Rejects every id selector.
struct NoIds;

impl NoIds {
    fn id(&self, syntax: &Syntax, _cx: &Context<'_>) -> rcss::Result<()> {
        let position = syntax.position().unwrap_or(Position::UNKNOWN);
        Err(CssError::new(
            ErrorCode::IllegalArgument("id selectors are not allowed".into()),
            position,
        ))
    }
}

impl Pass for NoIds {
    fn subscriptions() -> Vec<Subscription<Self>> {
        vec![Subscription::new(EventTags::ID_SELECTOR, Phase::Validate, NoIds::id)]
    }
}

// ============================================================================
// PHASES
// ============================================================================

#[test]
fn test_handlers_only_run_in_their_phase() {
    let mut emitter = Emitter::new();
    let calls = Rc::new(Cell::new(0));
    let counted = Rc::clone(&calls);
    emitter.subscribe(EventTags::CLASS_SELECTOR, Phase::Validate, move |_, _| {
        counted.set(counted.get() + 1);
        Ok(())
    });

    let refiner = Refiner::new();
    let cx = Context::new(&emitter, &refiner);
    emitter.set_phase(Phase::Process);
    emitter.emit(&class_part(), &cx).unwrap();
    assert_eq!(calls.get(), 0);

    emitter.set_phase(Phase::Validate);
    emitter.emit(&class_part(), &cx).unwrap();
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_phase_subset_skips_other_handlers() {
    let mut processor = Processor::new().with_phases([Phase::Process]);
    let recorder = processor.register(Recorder::default());
    processor.process("a { color: red; margin: 0 }").unwrap();

    assert_eq!(recorder.count(Phase::Process, "declaration"), 2);
    assert_eq!(recorder.count(Phase::Validate, "declaration"), 0);
    assert_eq!(recorder.count(Phase::Preprocess, "rule"), 0);
}

#[test]
fn test_no_phases_delivers_nothing() {
    let mut processor = Processor::new().with_phases([]);
    let recorder = processor.register(Recorder::default());
    let sheet = processor.process("a { b: c }").unwrap();

    assert_eq!(sheet.statements.len(), 1);
    assert!(recorder.seen.borrow().is_empty());
}

#[test]
fn test_each_phase_sees_every_unit() {
    let mut processor = Processor::new();
    let recorder = processor.register(Recorder::default());
    processor.process("@import 'a.css'; a { color: red }").unwrap();

    assert_eq!(recorder.count(Phase::Preprocess, "at-rule"), 1);
    assert_eq!(recorder.count(Phase::Preprocess, "rule"), 1);
    assert_eq!(recorder.count(Phase::Process, "declaration"), 1);
    assert_eq!(recorder.count(Phase::Validate, "declaration"), 1);
}

#[test]
fn test_validate_sees_refined_parts() {
    let mut processor = Processor::new();
    let recorder = processor.register(Recorder::default());
    processor.process("a.b > #c { color: red }").unwrap();

    let parts: Vec<String> = recorder
        .seen
        .borrow()
        .iter()
        .filter(|(phase, kind)| *phase == Phase::Validate && kind != "declaration")
        .map(|(_, kind)| kind.clone())
        .collect();
    assert_eq!(
        parts,
        ["type selector", "class selector", "combinator", "id selector"]
    );
}

// ============================================================================
// TAGGED DISPATCH
// ============================================================================

#[test]
fn test_category_tags_match_members() {
    let mut emitter = Emitter::new();
    let fired = Rc::new(RefCell::new(Vec::new()));
    for (tag, name) in [
        (EventTags::CLASS_SELECTOR, "class"),
        (EventTags::SIMPLE_SELECTOR, "simple"),
        (EventTags::SELECTOR_PART, "part"),
        (EventTags::TERM, "term"),
        (EventTags::COMBINATOR, "combinator"),
    ] {
        let fired = Rc::clone(&fired);
        emitter.subscribe(tag, Phase::Preprocess, move |_, _| {
            fired.borrow_mut().push(name);
            Ok(())
        });
    }

    let refiner = Refiner::new();
    let cx = Context::new(&emitter, &refiner);
    emitter.emit(&class_part(), &cx).unwrap();

    let mut fired = fired.borrow().clone();
    fired.sort();
    assert_eq!(fired, ["class", "part", "simple"]);
}

#[test]
fn test_multi_flag_tag_registers_per_flag() {
    let mut emitter = Emitter::new();
    emitter.subscribe(
        EventTags::CLASS_SELECTOR | EventTags::ID_SELECTOR,
        Phase::Validate,
        |_, _| Ok(()),
    );
    assert_eq!(
        emitter.subscribers(EventTags::CLASS_SELECTOR, Phase::Validate),
        1
    );
    assert_eq!(emitter.subscribers(EventTags::ID_SELECTOR, Phase::Validate), 1);
    assert_eq!(
        emitter.subscribers(EventTags::CLASS_SELECTOR, Phase::Process),
        0
    );
}

#[test]
fn test_handlers_run_in_registration_order() {
    let mut emitter = Emitter::new();
    let order = Rc::new(RefCell::new(Vec::new()));
    for name in ["first", "second", "third"] {
        let order = Rc::clone(&order);
        emitter.subscribe(EventTags::CLASS_SELECTOR, Phase::Preprocess, move |_, _| {
            order.borrow_mut().push(name);
            Ok(())
        });
    }

    let refiner = Refiner::new();
    let cx = Context::new(&emitter, &refiner);
    emitter.emit(&class_part(), &cx).unwrap();
    assert_eq!(*order.borrow(), ["first", "second", "third"]);
}

// ============================================================================
// REFINED FRAGMENTS
// ============================================================================

#[test]
fn test_selector_parts_arrive_attached() {
    let mut processor = Processor::new().with_phases([Phase::Process]);
    let check = processor.register(AttachmentCheck::default());
    processor.register(AutoRefine);
    processor.process("a.b > c { margin: 0 }").unwrap();

    assert_eq!(*check.part_counts.borrow(), [4, 4, 4, 4]);
}

#[test]
fn test_value_members_arrive_attached() {
    let mut processor = Processor::new().with_phases([Phase::Process]);
    let check = processor.register(AttachmentCheck::default());
    processor.register(AutoRefine);
    processor.process("a { margin: 0 auto; color: red }").unwrap();

    assert_eq!(*check.members_attached.borrow(), [true, true, true]);
}

// ============================================================================
// HANDLERS CHANGING THE TREE
// ============================================================================

#[test]
fn test_attached_units_reach_later_phases() {
    let mut processor = Processor::new();
    processor.register(AddDisplay);
    let recorder = processor.register(Recorder::default());

    let sheet = processor.process("a { color: red }").unwrap();

    let rule = sheet.rules().next().unwrap().clone();
    let properties: Vec<String> = rule
        .borrow()
        .declarations
        .iter()
        .map(|declaration| declaration.borrow().to_string())
        .collect();
    assert_eq!(properties, ["color: red", "display: block"]);

    assert_eq!(recorder.count(Phase::Process, "declaration"), 2);
    assert_eq!(recorder.count(Phase::Validate, "declaration"), 2);
}

#[test]
fn test_handler_errors_abort_processing() {
    let mut processor = Processor::new();
    processor.register(NoIds);

    assert!(processor.process(".a { color: red }").is_ok());

    let err = processor.process("\n.a #b { color: red }").unwrap_err();
    assert!(matches!(err.code(), ErrorCode::IllegalArgument(_)));
    assert_eq!(err.position(), Position::new(2, 4));
}
