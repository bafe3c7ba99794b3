// Mapcalc
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! End-to-end compilation tests

use mapcalc_compiler::analysis::{AnalyzedScript, DiagnosticKind, Diagnostics};
use mapcalc_compiler::ast::{Expr, ExprKind, Ident, Script, Stmt, StmtKind};
use mapcalc_compiler::catalog::{OptionCatalog, OutsidePolicy};
use mapcalc_compiler::codegen::ir::{self, ArithOp, VarRef};
use mapcalc_compiler::codegen::{AssemblyError, ProgramAssembler};
use mapcalc_compiler::parser::Position;
use mapcalc_compiler::{CompileError, Compiler, CompilerConfig, EvaluationModel, ImageRole, ImageRoles};

fn roles() -> ImageRoles {
    [("src".to_string(), ImageRole::Source), ("dest".to_string(), ImageRole::Destination)].into_iter().collect()
}

fn compiler(model: EvaluationModel) -> Compiler {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    Compiler::new(CompilerConfig::for_model(model)).unwrap()
}

#[test]
fn test_direct_body_writes_destination() {
    let compiled = compiler(EvaluationModel::Direct).compile_source("dest = 2 * 3 + src;", &roles()).unwrap();
    let program = compiled.program;
    assert_eq!(program.model(), EvaluationModel::Direct);
    assert_eq!(program.body().len(), 1);
    let ir::Stmt::Write { image: 0, band: None, value } = &program.body()[0] else {
        panic!("expected a destination write, got {:?}", program.body()[0]);
    };
    let ir::Expr::Arith { op: ArithOp::Add, lhs, rhs } = value else { panic!("expected addition") };
    assert_eq!(**lhs, ir::Expr::Const(6.0));
    assert!(matches!(**rhs, ir::Expr::Read { image: 0, .. }));
}

#[test]
fn test_indirect_body_returns_result() {
    let compiled = compiler(EvaluationModel::Indirect).compile_source("a = src + 1; dest = a;", &roles()).unwrap();
    let program = compiled.program;
    let result = program.result_slot().unwrap();
    assert_eq!(program.local_count(), 2);
    let body = program.body();
    assert!(matches!(&body[0], ir::Stmt::Assign { var: VarRef::Local(slot), value: ir::Expr::Const(v) } if *slot == result && v.is_nan()));
    assert_eq!(body.last(), Some(&ir::Stmt::Return(ir::Expr::Var(VarRef::Local(result)))));
    assert!(!body.iter().any(|stmt| matches!(stmt, ir::Stmt::Write { .. })));
}

#[test]
fn test_indirect_needs_exactly_one_destination() {
    let mut two = roles();
    two.insert("other".into(), ImageRole::Destination);
    let err = compiler(EvaluationModel::Indirect).compile_source("dest = src; other = src;", &two).unwrap_err();
    assert!(matches!(err, CompileError::Unsupported(_)));

    let err = compiler(EvaluationModel::Indirect).compile_source("dest[1] = src;", &roles()).unwrap_err();
    assert!(matches!(err, CompileError::Unsupported(_)));
    assert!(compiler(EvaluationModel::Direct).compile_source("dest[1] = src;", &roles()).is_ok());
}

#[test]
fn test_errors_are_reported_as_a_batch() {
    let err = compiler(EvaluationModel::Direct).compile_source("src = 1; dest = unknown + nosuch(1);", &roles()).unwrap_err();
    let diagnostics = err.diagnostics().unwrap();
    assert!(diagnostics.contains(DiagnosticKind::SourceAssignment));
    assert!(diagnostics.contains(DiagnosticKind::UsedBeforeAssignment));
    assert!(diagnostics.contains(DiagnosticKind::UndefinedFunction));
    assert!(!err.is_internal());
}

#[test]
fn test_parse_errors_surface_as_parse() {
    let err = compiler(EvaluationModel::Direct).compile_source("dest = (src;", &roles()).unwrap_err();
    assert!(matches!(err, CompileError::Parse(_)));
}

#[test]
fn test_warnings_do_not_block_compilation() {
    let mut roles = roles();
    roles.insert("spare".into(), ImageRole::Source);
    let compiled = compiler(EvaluationModel::Direct).compile_source("dest = src;", &roles).unwrap();
    assert_eq!(compiled.warnings.warnings().count(), 1);
}

#[test]
fn test_two_argument_if_defaults_to_zero() {
    let config = CompilerConfig {
        enable_constant_folding: false,
        ..CompilerConfig::default()
    };
    let compiled = Compiler::new(config).unwrap().compile_source("dest = if(src, 5);", &roles()).unwrap();
    let ir::Stmt::Write { value, .. } = &compiled.program.body()[0] else { panic!("expected write") };
    let ir::Expr::Select { nonzero, zero, negative, .. } = value else { panic!("expected select") };
    assert_eq!(**nonzero, ir::Expr::Const(5.0));
    assert_eq!(**zero, ir::Expr::Const(0.0));
    assert!(negative.is_none());
}

#[test]
fn test_sections_and_listing() {
    let source = "options { outside = 0; } init { n = 1 + 1; m; } foreach (i in {1, 2}) { n += i; } dest = n + m + src[0, -1];";
    let compiled = compiler(EvaluationModel::Direct).compile_source(source, &roles()).unwrap();
    let program = compiled.program;
    assert_eq!(program.image_vars(), ["n".to_string(), "m".to_string()]);
    assert_eq!(program.defaults(), [0.0, 0.0]);
    assert_eq!(program.image_init().len(), 1);
    assert_eq!(program.image_init()[0].value, ir::Expr::Const(2.0));
    assert_eq!(program.variable_slot("m"), Some(1));
    assert_eq!(program.array_count(), 1);
    assert_eq!(program.outside_policy(), OutsidePolicy::Value(0.0));
    assert!(program.option_init()[0].active);

    let listing = program.to_string();
    for header in ["declarations:", "defaults:", "init:", "options:", "body:", "accessor:"] {
        assert!(listing.contains(header), "listing lacks {header}:\n{listing}");
    }
    assert!(listing.contains("write dest <- "));
    assert!(listing.contains("outside = 0 (set)"));
}

#[test]
fn test_default_outside_policy_fails() {
    let compiled = compiler(EvaluationModel::Direct).compile_source("dest = src;", &roles()).unwrap();
    assert_eq!(compiled.program.outside_policy(), OutsidePolicy::Fail);
    assert!(!compiled.program.option_init()[0].active);
}

#[test]
fn test_unbound_tree_is_an_internal_error() {
    let position = Position::new(1, 1);
    let mut script = Script::default();
    script.body.push(Stmt::new(
        StmtKind::Expr(Expr::new(ExprKind::Var(Ident::new("ghost", position)), position)),
        position,
    ));
    let analyzed = AnalyzedScript {
        script,
        sources: vec!["src".into()],
        destinations: vec!["dest".into()],
        image_vars: Vec::new(),
        local_count: 0,
        warnings: Diagnostics::new(),
    };
    let config = CompilerConfig::default();
    let options = OptionCatalog::standard();
    let err = ProgramAssembler::new(&config, &options).assemble(&analyzed).unwrap_err();
    assert!(matches!(err, AssemblyError::Internal(_)));
    assert!(CompileError::from(err).is_internal());
}
