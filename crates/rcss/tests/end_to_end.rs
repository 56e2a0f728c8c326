//! End-to-end tests: source text through a `Processor` with `AutoRefine`.
//!
//! Checks that a fully processed stylesheet has every unit refined, with
//! positions pointing into the original source.

use insta::assert_snapshot;
use rcss::ast::{SelectorPartKind, Statement, Status, ValueMember};
use rcss::error::Position;
use rcss::passes::AutoRefine;
use rcss::{MediaStrategy, Processor};

fn processor() -> Processor {
    let mut processor = Processor::new();
    processor.register(AutoRefine);
    processor
}

// ============================================================================
// RULES
// ============================================================================

#[test]
fn test_compact_rule() {
    let sheet = processor().process(".a,#b{color:red}").unwrap();
    let rule = sheet.rules().next().unwrap().clone();
    let rule = rule.borrow();

    let positions: Vec<_> = rule
        .selectors
        .iter()
        .map(|selector| selector.borrow().meta.position().unwrap())
        .collect();
    assert_eq!(positions, [Position::new(1, 1), Position::new(1, 4)]);

    let kinds: Vec<SelectorPartKind> = rule
        .selectors
        .iter()
        .flat_map(|selector| selector.borrow().parts().to_vec())
        .map(|part| part.borrow().kind.clone())
        .collect();
    assert_eq!(
        kinds,
        [
            SelectorPartKind::Class("a".into()),
            SelectorPartKind::Id("b".into()),
        ]
    );

    let declaration = rule.declarations[0].borrow();
    assert_eq!(declaration.meta.position(), Some(Position::new(1, 7)));
    assert_snapshot!(declaration.to_string(), @"color: red");

    let value = declaration.value.as_ref().unwrap().borrow();
    let ValueMember::Term(red) = &value.members[0] else {
        panic!("expected a term");
    };
    assert_eq!(red.borrow().meta.position(), Some(Position::new(1, 13)));
}

#[test]
fn test_units_are_processed() {
    let sheet = processor().process("a { color: red }").unwrap();
    let rule = sheet.rules().next().unwrap().clone();
    let rule = rule.borrow();
    assert_eq!(rule.meta.status(), Status::Processed);

    let selector = rule.selectors[0].borrow();
    assert_eq!(selector.meta.status(), Status::Processed);
    assert_eq!(selector.parts()[0].borrow().meta.status(), Status::Processed);
}

#[test]
fn test_multiline_positions() {
    let source = "\
a {
  margin: 0
          auto;
}
";
    let sheet = processor().process(source).unwrap();
    let rule = sheet.rules().next().unwrap().clone();
    let rule = rule.borrow();
    let declaration = rule.declarations[0].borrow();
    let value = declaration.value.as_ref().unwrap().borrow();

    let positions: Vec<Position> = value
        .members
        .iter()
        .map(|member| member.to_syntax().position().unwrap())
        .collect();
    assert_eq!(positions, [Position::new(2, 11), Position::new(3, 11)]);
}

// ============================================================================
// AT-RULES
// ============================================================================

#[test]
fn test_nested_rules_are_refined() {
    let mut processor = processor();
    processor.refiner_mut().register_at_rule_strategy(MediaStrategy);

    let sheet = processor
        .process("@media screen, print {\n  .a > b { margin: calc(1px) }\n}")
        .unwrap();
    let media = sheet.at_rules().next().unwrap().clone();
    let media = media.borrow();
    assert_snapshot!(media.expression.as_ref().unwrap().borrow().to_string(), @"screen, print");

    let block = media.block.as_ref().unwrap().borrow();
    let Statement::Rule(rule) = &block.statements[0] else {
        panic!("expected a rule");
    };
    let rule = rule.borrow();
    assert_snapshot!(rule.selectors[0].borrow().to_string(), @".a > b");

    let part = rule.selectors[0].borrow().parts()[2].clone();
    assert_eq!(part.borrow().meta.position(), Some(Position::new(2, 8)));

    let declaration = rule.declarations[0].borrow();
    let value = declaration.value.as_ref().unwrap().borrow();
    let ValueMember::Function(calc) = &value.members[0] else {
        panic!("expected a function");
    };
    assert!(calc.borrow().is_refined());
    assert_snapshot!(declaration.to_string(), @"margin: calc(1px)");
}

#[test]
fn test_keyframe_offsets_are_refined() {
    let sheet = Processor::new()
        .process("@keyframes spin { from { top: 0 } 50% { top: 1px } to { top: 2px } }")
        .unwrap();
    let keyframes = sheet.at_rules().next().unwrap().clone();
    let keyframes = keyframes.borrow();
    let block = keyframes.block.as_ref().unwrap().borrow();

    let selectors: Vec<String> = block
        .statements
        .iter()
        .map(|statement| match statement {
            Statement::Rule(rule) => rule.borrow().selectors[0].borrow().to_string(),
            Statement::AtRule(_) => panic!("expected a rule"),
        })
        .collect();
    assert_eq!(selectors, ["from", "50%", "to"]);

    let Statement::Rule(halfway) = &block.statements[1] else {
        panic!("expected a rule");
    };
    let part = halfway.borrow().selectors[0].borrow().parts()[0].clone();
    assert_eq!(part.borrow().kind, SelectorPartKind::KeyframeOffset("50".into()));
    assert_eq!(part.borrow().meta.position(), Some(Position::new(1, 35)));
}

#[test]
fn test_comments_survive_processing() {
    let sheet = processor()
        .process("/* header */\na { /* why */ color: red }\n/* footer */")
        .unwrap();
    assert_eq!(sheet.orphaned_comments, [" footer "]);

    let rule = sheet.rules().next().unwrap().clone();
    let rule = rule.borrow();
    assert_eq!(rule.selectors[0].borrow().meta.comments(), [" header "]);
    assert_eq!(rule.declarations[0].borrow().meta.comments(), [" why "]);
}
