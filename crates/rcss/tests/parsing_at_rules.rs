//! Integration tests for at-rules.
//!
//! An at-rule is read with its expression and block kept raw. Refinement
//! fills them in:
//! - The expression as whitespace-normalized text, or as a media query list
//!   when `MediaStrategy` is registered
//! - The block as nested statements, or as declarations for at-rules such
//!   as `@font-face`

use insta::assert_snapshot;
use rcss::ast::{AtRule, ExpressionKind, Shared, Statement};
use rcss::broadcast::{Discard, QueryableBroadcaster};
use rcss::error::{ErrorCode, Position};
use rcss::grammar::Grammar;
use rcss::{MediaStrategy, Refiner, parse_stylesheet};

fn at_rule(source: &str) -> Shared<AtRule> {
    let sheet = parse_stylesheet(source).unwrap();
    let at_rule = sheet.at_rules().next().unwrap().clone();
    at_rule
}

fn expression(at_rule: &Shared<AtRule>) -> ExpressionKind {
    let at_rule = at_rule.borrow();
    let expression = at_rule.expression.as_ref().unwrap().borrow();
    expression.kind.clone()
}

fn expression_text(at_rule: &AtRule) -> String {
    at_rule.expression.as_ref().unwrap().borrow().to_string()
}

// ============================================================================
// RAW AT-RULES
// ============================================================================

#[test]
fn test_raw_spans_and_positions() {
    let media = at_rule("@media screen { a { b: c } }");
    let media = media.borrow();
    assert_eq!(media.name, "media");
    assert_eq!(media.meta.position(), Some(Position::new(1, 1)));

    let expression = media.raw_expression.clone().unwrap();
    assert_eq!(expression.content, "screen");
    assert_eq!(expression.position(), Position::new(1, 8));

    let block = media.raw_block.clone().unwrap();
    assert_eq!(block.content, " a { b: c } ");
    assert_eq!(block.position(), Position::new(1, 16));
    assert!(!media.is_refined());
}

#[test]
fn test_expression_only() {
    let import = at_rule("@import 'theme.css';\na {}");
    let import = import.borrow();
    assert_eq!(import.raw_expression.clone().unwrap().content, "'theme.css'");
    assert!(import.raw_block.is_none());
}

#[test]
fn test_block_only() {
    let font_face = at_rule("@font-face { font-family: x }");
    let font_face = font_face.borrow();
    assert!(font_face.raw_expression.is_none());
    assert!(font_face.raw_block.is_some());
}

#[test]
fn test_statement_order() {
    let sheet = parse_stylesheet("@charset 'utf-8'; a {} @media print {}").unwrap();
    let kinds: Vec<&str> = sheet
        .statements
        .iter()
        .map(|statement| match statement {
            Statement::Rule(_) => "rule",
            Statement::AtRule(_) => "at-rule",
        })
        .collect();
    assert_eq!(kinds, ["at-rule", "rule", "at-rule"]);
}

// ============================================================================
// REFINEMENT
// ============================================================================

#[test]
fn test_standard_refinement() {
    let media = at_rule("@media  screen   and (color) {\n  a { b: c }\n  d { e: f }\n}");
    Refiner::new().refine_at_rule(&media, &mut Discard).unwrap();

    assert!(media.borrow().is_refined());
    assert_eq!(
        expression(&media),
        ExpressionKind::Raw("screen and (color)".into())
    );

    let media = media.borrow();
    let block = media.block.as_ref().unwrap().borrow();
    assert_eq!(block.statements.len(), 2);
    assert!(block.declarations.is_empty());
    assert_eq!(block.meta.position(), Some(Position::new(1, 31)));
}

#[test]
fn test_nested_rules_keep_source_positions() {
    let media = at_rule("@media print {\n  a { b: c }\n}");
    Refiner::new().refine_at_rule(&media, &mut Discard).unwrap();

    let media = media.borrow();
    let block = media.block.as_ref().unwrap().borrow();
    let Statement::Rule(rule) = &block.statements[0] else {
        panic!("expected a rule");
    };
    assert_eq!(rule.borrow().meta.position(), Some(Position::new(2, 3)));
}

#[test]
fn test_nested_at_rules_stay_raw() {
    let supports = at_rule("@supports (display: grid) { @media print { a { b: c } } }");
    Refiner::new().refine_at_rule(&supports, &mut Discard).unwrap();

    let supports = supports.borrow();
    let block = supports.block.as_ref().unwrap().borrow();
    let Statement::AtRule(media) = &block.statements[0] else {
        panic!("expected an at-rule");
    };
    assert!(!media.borrow().is_refined());
    assert_eq!(media.borrow().name, "media");
}

#[test]
fn test_declaration_block() {
    let font_face = at_rule("@font-face { font-family: 'Open Sans'; src: url(a.woff) }");
    Refiner::new().refine_at_rule(&font_face, &mut Discard).unwrap();

    let font_face = font_face.borrow();
    let block = font_face.block.as_ref().unwrap().borrow();
    assert!(block.statements.is_empty());
    let properties: Vec<String> = block
        .declarations
        .iter()
        .map(|declaration| declaration.borrow().property.to_string())
        .collect();
    assert_eq!(properties, ["font-family", "src"]);
}

#[test]
fn test_declaration_block_table_is_configurable() {
    let grammar = Grammar::default().with_declaration_block_at_rules(["tailwind"]);
    let refiner = Refiner::with_grammar(grammar);

    let at_rule = at_rule("@tailwind { color: red }");
    refiner.refine_at_rule(&at_rule, &mut Discard).unwrap();
    let at_rule = at_rule.borrow();
    assert_eq!(at_rule.block.as_ref().unwrap().borrow().declarations.len(), 1);
}

#[test]
fn test_keyframes_block_parses_raw() {
    let keyframes = at_rule("@keyframes spin { from { top: 0 } 50% { top: 1px } }");
    Refiner::new().refine_at_rule(&keyframes, &mut Discard).unwrap();

    let keyframes = keyframes.borrow();
    assert_snapshot!(expression_text(&keyframes), @"spin");
    assert_eq!(
        keyframes.block.as_ref().unwrap().borrow().statements.len(),
        2
    );
}

#[test]
fn test_refinement_broadcasts_block_contents_before_block() {
    let media = at_rule("@media print { a { b: c } }");
    let mut query = QueryableBroadcaster::detached();
    Refiner::new().refine_at_rule(&media, &mut query).unwrap();

    let kinds: Vec<String> = query
        .received()
        .iter()
        .map(|syntax| syntax.kind().to_string())
        .collect();
    assert_eq!(
        kinds,
        [
            "at-rule expression",
            "selector",
            "declaration",
            "rule",
            "at-rule block",
        ]
    );
}

// ============================================================================
// MEDIA QUERIES
// ============================================================================

#[test]
fn test_media_strategy_splits_queries() {
    let mut refiner = Refiner::new();
    refiner.register_at_rule_strategy(MediaStrategy);

    let media = at_rule("@media screen and (min-width: 600px),  print { a { b: c } }");
    refiner.refine_at_rule(&media, &mut Discard).unwrap();

    assert_eq!(
        expression(&media),
        ExpressionKind::MediaQueryList(vec![
            "screen and (min-width: 600px)".into(),
            "print".into(),
        ])
    );
    let media = media.borrow();
    assert_snapshot!(expression_text(&media), @"screen and (min-width: 600px), print");
    assert_eq!(media.block.as_ref().unwrap().borrow().statements.len(), 1);
}

#[test]
fn test_media_strategy_ignores_other_at_rules() {
    let mut refiner = Refiner::new();
    refiner.register_at_rule_strategy(MediaStrategy);

    let import = at_rule("@import url(a.css) screen;");
    refiner.refine_at_rule(&import, &mut Discard).unwrap();
    assert_eq!(
        expression(&import),
        ExpressionKind::Raw("url(a.css) screen".into())
    );
}

#[test]
fn test_media_strategy_rejects_empty_query() {
    let mut refiner = Refiner::new();
    refiner.register_at_rule_strategy(MediaStrategy);

    let media = at_rule("@media screen, , print {}");
    let err = refiner.refine_at_rule(&media, &mut Discard).unwrap_err();
    assert_eq!(err.code(), &ErrorCode::MissingMediaQuery);
    assert!(!media.borrow().is_refined());
}

// ============================================================================
// ERRORS
// ============================================================================

#[test]
fn test_missing_at_rule_name() {
    let err = parse_stylesheet("a {}\n@ media print {}").unwrap_err();
    assert_eq!(err.code(), &ErrorCode::MissingAtRuleName);
    assert_eq!(err.position(), Position::new(2, 2));
}

#[test]
fn test_missing_at_rule_value() {
    let err = parse_stylesheet("@charset;").unwrap_err();
    assert_eq!(err.code(), &ErrorCode::MissingAtRuleValue("charset".into()));
    assert_eq!(err.position(), Position::new(1, 1));
}

#[test]
fn test_unparsable_block_content() {
    let media = at_rule("@media print { a { b: c } { } }");
    let err = Refiner::new().refine_at_rule(&media, &mut Discard).unwrap_err();
    assert!(matches!(err.code(), ErrorCode::UnparsableContent(rest) if rest.starts_with('{')));
    assert_eq!(err.position(), Position::new(1, 27));
}
