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

//! Per-pixel body section

use super::traits::SectionGenerator;
use crate::codegen::context::AssemblyContext;
use crate::codegen::error::AssemblyResult;
use crate::codegen::folding::fold_stmts;
use crate::codegen::ir::{EvaluationModel, Expr, Stmt, VarRef};
use crate::codegen::program::{Section, SectionKind};
use tracing::debug;

/// Per-pixel procedure in the configured evaluation model
pub struct BodyGenerator;

impl SectionGenerator for BodyGenerator {
    fn generate(&self, context: &mut AssemblyContext<'_>) -> AssemblyResult<Section> {
        let analyzed = context.analyzed;
        let mut body = context.translate_stmts(&analyzed.script.body)?;
        if context.config.enable_constant_folding {
            body = fold_stmts(body);
        }
        if context.model() == EvaluationModel::Indirect {
            let result = VarRef::Local(context.result_slot()?);
            body.insert(
                0,
                Stmt::Assign {
                    var: result,
                    value: Expr::Const(f64::NAN),
                },
            );
            body.push(Stmt::Return(Expr::Var(result)));
        }
        debug!(statements = body.len(), model = ?context.model(), "body section generated");
        Ok(Section::Body(body))
    }

    fn section_kind(&self) -> SectionKind {
        SectionKind::Body
    }

    fn dependencies(&self) -> &'static [SectionKind] {
        &[SectionKind::Declarations]
    }
}
