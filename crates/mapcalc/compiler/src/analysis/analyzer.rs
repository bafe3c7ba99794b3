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

//! Semantic analyzer
//!
//! Walks a parsed [`Script`] together with the image role map, classifies
//! every name, fills in the `binding`/`resolved` slots of the tree and collects
//! diagnostics. Analysis either yields a fully annotated script or the whole
//! batch of problems found, never a partially annotated tree.

use super::diagnostics::{DiagnosticKind, Diagnostics};
use crate::ast::*;
use crate::catalog::{FunctionCatalog, OptionCatalog, constants};
use crate::parser::position::Position;
use crate::symbols::{ScopeStack, SymbolKind};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Image name to role, as supplied by the embedding application
pub type ImageRoles = BTreeMap<String, ImageRole>;

/// Output of a successful analysis
#[derive(Debug, Clone)]
pub struct AnalyzedScript {
    /// Script with every name bound and every call resolved
    pub script: Script,
    /// Source image names, indexed by `Binding::Source`
    pub sources: Vec<String>,
    /// Destination image names, indexed by `Binding::Destination`
    pub destinations: Vec<String>,
    /// Image-scope variable names, indexed by `Binding::ImageVar`
    pub image_vars: Vec<String>,
    /// Number of pixel-scope and loop variable slots
    pub local_count: usize,
    /// Warning-level diagnostics
    pub warnings: Diagnostics,
}

/// Semantic analyzer over shared catalogs
pub struct Analyzer<'a> {
    functions: &'a FunctionCatalog,
    options: &'a OptionCatalog,
    max_loop_nesting: usize,
}

impl<'a> Analyzer<'a> {
    pub fn new(functions: &'a FunctionCatalog, options: &'a OptionCatalog) -> Self {
        Self {
            functions,
            options,
            max_loop_nesting: usize::MAX,
        }
    }

    /// Limit how deeply loops may nest
    pub fn with_max_loop_nesting(mut self, limit: usize) -> Self {
        self.max_loop_nesting = limit;
        self
    }

    /// Analyze a script against the external role map
    pub fn analyze(&self, mut script: Script, roles: &ImageRoles) -> Result<AnalyzedScript, Diagnostics> {
        let mut walker = Walker::new(self);
        walker.merge_roles(&script.images, roles);
        walker.check_options(&script.options);

        walker.scopes.add_level("image");
        walker.in_init = true;
        for decl in &mut script.init {
            walker.init_decl(decl);
        }
        walker.in_init = false;

        walker.scopes.add_level("pixel");
        for stmt in &mut script.body {
            walker.stmt(stmt);
        }
        walker.scopes.drop_level();
        walker.scopes.drop_level();

        walker.report_unused();

        let Walker {
            diagnostics,
            sources,
            destinations,
            image_vars,
            local_count,
            ..
        } = walker;

        debug!(errors = diagnostics.errors().count(), warnings = diagnostics.warnings().count(), "semantic analysis finished");
        if diagnostics.has_errors() {
            return Err(diagnostics);
        }
        Ok(AnalyzedScript {
            script,
            sources,
            destinations,
            image_vars,
            local_count,
            warnings: diagnostics,
        })
    }
}

/// Mutable state of one analysis run
struct Walker<'a, 'c> {
    analyzer: &'c Analyzer<'a>,
    diagnostics: Diagnostics,
    roles: ImageRoles,
    sources: Vec<String>,
    destinations: Vec<String>,
    used_images: BTreeSet<String>,
    image_vars: Vec<String>,
    scopes: ScopeStack,
    /// Slots of variables first assigned in the `then` arm of each `if`
    /// whose `else` arm is being walked
    branch_slots: Vec<BTreeMap<String, usize>>,
    local_count: usize,
    loop_depth: usize,
    in_init: bool,
}

impl<'a, 'c> Walker<'a, 'c> {
    fn new(analyzer: &'c Analyzer<'a>) -> Self {
        Self {
            analyzer,
            diagnostics: Diagnostics::new(),
            roles: ImageRoles::new(),
            sources: Vec::new(),
            destinations: Vec::new(),
            used_images: BTreeSet::new(),
            image_vars: Vec::new(),
            scopes: ScopeStack::new(),
            branch_slots: Vec::new(),
            local_count: 0,
            loop_depth: 0,
            in_init: false,
        }
    }

    fn report(&mut self, kind: DiagnosticKind, position: Position, message: impl Into<String>) {
        self.diagnostics.report(kind, position, message);
    }

    fn merge_roles(&mut self, declared: &[ImageDecl], external: &ImageRoles) {
        self.roles = external.clone();
        let mut seen = BTreeSet::new();
        for decl in declared {
            if !seen.insert(decl.name.as_str()) {
                self.report(DiagnosticKind::DuplicateDeclaration, decl.position, format!("image '{}' is declared more than once", decl.name));
                continue;
            }
            match external.get(&decl.name) {
                Some(role) if *role != decl.role => {
                    self.report(
                        DiagnosticKind::ConflictingImageRole,
                        decl.position,
                        format!("image '{}' is declared as {:?} but bound as {:?}", decl.name, decl.role, role),
                    );
                }
                _ => {
                    self.roles.insert(decl.name.clone(), decl.role);
                }
            }
        }
        for (name, role) in &self.roles {
            match role {
                ImageRole::Source => self.sources.push(name.clone()),
                ImageRole::Destination => self.destinations.push(name.clone()),
            }
        }
    }

    fn check_options(&mut self, entries: &[OptionEntry]) {
        let mut seen = BTreeSet::new();
        for entry in entries {
            let Some(descriptor) = self.analyzer.options.resolve_option(&entry.name) else {
                self.report(DiagnosticKind::UnknownOption, entry.position, format!("unknown option '{}'", entry.name));
                continue;
            };
            if !seen.insert(descriptor.name) {
                self.report(DiagnosticKind::DuplicateDeclaration, entry.position, format!("option '{}' is set more than once", entry.name));
            }
            if !self.analyzer.options.domain_accepts(descriptor, &entry.value) {
                self.report(DiagnosticKind::InvalidOptionValue, entry.position, format!("option '{}' does not accept '{}'", entry.name, entry.value));
            }
        }
    }

    fn image_binding(&self, name: &str) -> Option<Binding> {
        match self.roles.get(name)? {
            ImageRole::Source => self.sources.iter().position(|n| n == name).map(Binding::Source),
            ImageRole::Destination => self.destinations.iter().position(|n| n == name).map(Binding::Destination),
        }
    }

    fn symbol_binding(&self, name: &str) -> Option<(Binding, SymbolKind)> {
        let symbol = self.scopes.find(name)?;
        let binding = match symbol.kind {
            SymbolKind::ImageScopeVar => Binding::ImageVar(symbol.slot),
            SymbolKind::PixelScopeVar | SymbolKind::LoopVar => Binding::Local(symbol.slot),
        };
        Some((binding, symbol.kind))
    }

    fn new_local(&mut self, name: &str, kind: SymbolKind) -> Binding {
        // The two arms of an `if` share one slot per name so a variable
        // assigned on both can outlive the statement
        let shared = match kind {
            SymbolKind::PixelScopeVar => self.branch_slots.iter().rev().find_map(|slots| slots.get(name).copied()),
            _ => None,
        };
        let slot = shared.unwrap_or_else(|| {
            self.local_count += 1;
            self.local_count - 1
        });
        if let Err(err) = self.scopes.add_symbol(name, kind, slot) {
            self.report(DiagnosticKind::DuplicateDeclaration, Position::unknown(), err.to_string());
        }
        Binding::Local(slot)
    }

    fn init_decl(&mut self, decl: &mut InitDecl) {
        if let Some(value) = &mut decl.value {
            self.expr(value);
        }
        let name = decl.name.name.clone();
        let position = decl.name.position;
        if self.roles.contains_key(&name) {
            self.report(DiagnosticKind::DuplicateDeclaration, position, format!("'{name}' is already an image name"));
            return;
        }
        if constants::is_constant(&name) {
            self.report(DiagnosticKind::ConstantAssignment, position, format!("cannot declare constant '{name}' as a variable"));
            return;
        }
        let slot = self.image_vars.len();
        match self.scopes.add_symbol(name.as_str(), SymbolKind::ImageScopeVar, slot) {
            Ok(_) => {
                self.image_vars.push(name);
                decl.name.binding = Some(Binding::ImageVar(slot));
            }
            Err(_) => self.report(DiagnosticKind::DuplicateDeclaration, position, format!("image-scope variable '{name}' is declared more than once")),
        }
    }

    fn block<F: FnOnce(&mut Self)>(&mut self, label: &str, f: F) {
        self.scopes.add_level(label);
        f(self);
        self.scopes.drop_level();
    }

    /// Walk one arm of an `if`, returning the variables it first assigned
    fn branch(&mut self, label: &str, stmt: &mut Stmt) -> BTreeMap<String, usize> {
        self.scopes.add_level(label);
        match &mut stmt.kind {
            StmtKind::Block(stmts) => stmts.iter_mut().for_each(|stmt| self.stmt(stmt)),
            _ => self.stmt(stmt),
        }
        self.scopes
            .drop_level()
            .map(|scope| {
                scope
                    .symbols()
                    .iter()
                    .filter(|symbol| symbol.kind == SymbolKind::PixelScopeVar)
                    .map(|symbol| (symbol.name.clone(), symbol.slot))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn loop_body(&mut self, label: &str, position: Position, body: &mut Stmt, loop_var: Option<&mut Ident>) {
        self.loop_depth += 1;
        if self.loop_depth == self.analyzer.max_loop_nesting.saturating_add(1) {
            self.report(DiagnosticKind::NestingTooDeep, position, format!("loops nest deeper than {}", self.analyzer.max_loop_nesting));
        }
        self.block(label, |walker| {
            if let Some(var) = loop_var {
                var.binding = Some(walker.new_local(&var.name, SymbolKind::LoopVar));
            }
            walker.stmt(body);
        });
        self.loop_depth -= 1;
    }

    fn stmt(&mut self, stmt: &mut Stmt) {
        let position = stmt.position;
        match &mut stmt.kind {
            StmtKind::Assign { target, op, value } => {
                self.expr(value);
                self.assign_target(target, *op);
            }
            StmtKind::Expr(expr) => self.expr(expr),
            StmtKind::Block(stmts) => self.block("block", |walker| {
                for stmt in stmts {
                    walker.stmt(stmt);
                }
            }),
            StmtKind::If { cond, then, otherwise } => {
                self.expr(cond);
                let assigned = self.branch("then", then);
                if let Some(otherwise) = otherwise {
                    self.branch_slots.push(assigned.clone());
                    let also_assigned = self.branch("else", otherwise);
                    self.branch_slots.pop();
                    // Assigned on both paths: visible after the statement
                    for (name, slot) in assigned {
                        if also_assigned.get(&name) == Some(&slot) {
                            if let Err(err) = self.scopes.add_symbol(name, SymbolKind::PixelScopeVar, slot) {
                                self.report(DiagnosticKind::DuplicateDeclaration, position, err.to_string());
                            }
                        }
                    }
                }
            }
            StmtKind::While { cond, body } | StmtKind::Until { cond, body } => {
                self.expr(cond);
                self.loop_body("loop", position, body, None);
            }
            StmtKind::Foreach { var, source, body } => {
                match source {
                    LoopSource::List(items) => items.iter_mut().for_each(|item| self.expr(item)),
                    LoopSource::Range { lo, hi } => {
                        self.expr(lo);
                        self.expr(hi);
                    }
                }
                if self.roles.contains_key(&var.name) || constants::is_constant(&var.name) {
                    self.report(DiagnosticKind::DuplicateDeclaration, var.position, format!("'{}' cannot be used as a loop variable", var.name));
                }
                self.loop_body("foreach", position, body, Some(var));
            }
            StmtKind::BreakIf(cond) => {
                self.check_in_loop(position, "breakif");
                self.expr(cond);
            }
            StmtKind::Break => self.check_in_loop(position, "break"),
            StmtKind::Empty => {}
        }
    }

    fn check_in_loop(&mut self, position: Position, keyword: &str) {
        if self.loop_depth == 0 {
            self.report(DiagnosticKind::BreakOutsideLoop, position, format!("'{keyword}' outside of a loop"));
        }
    }

    fn assign_target(&mut self, target: &mut AssignTarget, op: AssignOp) {
        match target {
            AssignTarget::Var(ident) => {
                let name = ident.name.clone();
                let position = ident.position;
                match self.roles.get(&name).copied() {
                    Some(ImageRole::Source) => {
                        self.report(DiagnosticKind::SourceAssignment, position, format!("cannot assign to source image '{name}'"));
                    }
                    Some(ImageRole::Destination) => {
                        self.used_images.insert(name.clone());
                        if op.is_compound() {
                            self.report(
                                DiagnosticKind::CompoundDestinationAssignment,
                                position,
                                format!("'{}' cannot be used on destination image '{name}'", op.symbol()),
                            );
                        }
                        ident.binding = self.image_binding(&name);
                    }
                    None => ident.binding = self.variable_write(&name, position, op.is_compound()),
                }
            }
            AssignTarget::Image(image) => {
                let name = image.image.name.clone();
                let position = image.image.position;
                match self.roles.get(&name).copied() {
                    Some(ImageRole::Source) => {
                        self.report(DiagnosticKind::SourceAssignment, position, format!("cannot assign to source image '{name}'"));
                    }
                    Some(ImageRole::Destination) => {
                        self.used_images.insert(name.clone());
                        if image.pixel.is_some() {
                            self.report(DiagnosticKind::PositionOnNonSource, position, format!("pixel positions cannot be used on destination image '{name}'"));
                        }
                        if op.is_compound() {
                            self.report(
                                DiagnosticKind::CompoundDestinationAssignment,
                                position,
                                format!("'{}' cannot be used on destination image '{name}'", op.symbol()),
                            );
                        }
                        if let Some(band) = &mut image.band {
                            self.expr(band);
                        }
                        image.image.binding = self.image_binding(&name);
                    }
                    None => {
                        self.report(DiagnosticKind::PositionOnNonSource, position, format!("'{name}' is not an image"));
                    }
                }
            }
        }
    }

    /// Bind the target of a variable write, declaring it on first plain assignment
    fn variable_write(&mut self, name: &str, position: Position, reads_first: bool) -> Option<Binding> {
        if constants::is_constant(name) {
            self.report(DiagnosticKind::ConstantAssignment, position, format!("cannot assign to constant '{name}'"));
            return None;
        }
        match self.symbol_binding(name) {
            Some((_, SymbolKind::LoopVar)) => {
                self.report(DiagnosticKind::LoopVariableAssignment, position, format!("cannot assign to loop variable '{name}'"));
                None
            }
            Some((binding, _)) => Some(binding),
            None if reads_first => {
                self.report(DiagnosticKind::UsedBeforeAssignment, position, format!("variable '{name}' is used before it is assigned"));
                None
            }
            None => Some(self.new_local(name, SymbolKind::PixelScopeVar)),
        }
    }

    fn image_in_init(&mut self, name: &str, role: ImageRole, position: Position) {
        let kind = match role {
            ImageRole::Source => DiagnosticKind::SourceInInit,
            ImageRole::Destination => DiagnosticKind::DestinationInInit,
        };
        self.report(kind, position, format!("image '{name}' cannot be used in the init block"));
    }

    fn read_ident(&mut self, ident: &mut Ident) {
        let name = ident.name.clone();
        let position = ident.position;
        if let Some(role) = self.roles.get(&name).copied() {
            self.used_images.insert(name.clone());
            if self.in_init {
                self.image_in_init(&name, role, position);
            } else if role == ImageRole::Destination {
                self.report(DiagnosticKind::DestinationRead, position, format!("destination image '{name}' cannot be read"));
            } else {
                ident.binding = self.image_binding(&name);
            }
            return;
        }
        if let Some((binding, _)) = self.symbol_binding(&name) {
            ident.binding = Some(binding);
        } else if let Some(value) = constants::lookup(&name) {
            ident.binding = Some(Binding::Constant(value));
        } else {
            self.report(DiagnosticKind::UsedBeforeAssignment, position, format!("variable '{name}' is used before it is assigned"));
        }
    }

    fn read_image(&mut self, image: &mut ImageRef) {
        let name = image.image.name.clone();
        let position = image.image.position;
        match self.roles.get(&name).copied() {
            None => self.report(DiagnosticKind::PositionOnNonSource, position, format!("'{name}' is not an image")),
            Some(role) => {
                self.used_images.insert(name.clone());
                if self.in_init {
                    self.image_in_init(&name, role, position);
                } else if role == ImageRole::Destination {
                    if image.pixel.is_some() {
                        self.report(DiagnosticKind::PositionOnNonSource, position, format!("pixel positions cannot be used on destination image '{name}'"));
                    } else {
                        self.report(DiagnosticKind::DestinationRead, position, format!("destination image '{name}' cannot be read"));
                    }
                } else {
                    image.image.binding = self.image_binding(&name);
                }
            }
        }
        if let Some(band) = &mut image.band {
            self.expr(band);
        }
        if let Some(pixel) = &mut image.pixel {
            for coord in [&mut pixel.x, &mut pixel.y] {
                match coord {
                    Coord::Relative(expr) | Coord::Absolute(expr) => self.expr(expr),
                }
            }
        }
    }

    fn expr(&mut self, expr: &mut Expr) {
        let position = expr.position;
        match &mut expr.kind {
            ExprKind::Number(_) => {}
            ExprKind::Var(ident) => self.read_ident(ident),
            ExprKind::Image(image) => self.read_image(image),
            ExprKind::Call { name, args, resolved } => {
                for arg in args.iter_mut() {
                    self.expr(arg);
                }
                if name.as_str() == "if" || name.as_str() == "con" {
                    if !(1..=4).contains(&args.len()) {
                        self.report(DiagnosticKind::UndefinedFunction, position, format!("'{name}' takes 1 to 4 arguments, got {}", args.len()));
                    }
                    return;
                }
                match self.analyzer.functions.resolve(name, args.len()) {
                    Some(descriptor) => *resolved = Some(descriptor),
                    None => self.report(DiagnosticKind::UndefinedFunction, position, format!("undefined function {name}/{}", args.len())),
                }
            }
            ExprKind::Unary { operand, .. } => self.expr(operand),
            ExprKind::Binary { lhs, rhs, .. } => {
                self.expr(lhs);
                self.expr(rhs);
            }
            ExprKind::Ternary { cond, then, otherwise } => {
                self.expr(cond);
                self.expr(then);
                self.expr(otherwise);
            }
            ExprKind::Update { target, op, .. } => {
                let name = target.name.clone();
                let position = target.position;
                let symbol = if *op == UpdateOp::Increment { "++" } else { "--" };
                match self.roles.get(&name).copied() {
                    Some(ImageRole::Source) => {
                        self.report(DiagnosticKind::SourceAssignment, position, format!("cannot apply '{symbol}' to source image '{name}'"));
                    }
                    Some(ImageRole::Destination) => {
                        self.report(DiagnosticKind::CompoundDestinationAssignment, position, format!("cannot apply '{symbol}' to destination image '{name}'"));
                    }
                    None => target.binding = self.variable_write(&name, position, true),
                }
            }
        }
    }

    fn report_unused(&mut self) {
        let unused: Vec<String> = self.roles.keys().filter(|name| !self.used_images.contains(*name)).cloned().collect();
        for name in unused {
            self.report(DiagnosticKind::UnusedImage, Position::unknown(), format!("image '{name}' is never used"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn roles(pairs: &[(&str, ImageRole)]) -> ImageRoles {
        pairs.iter().map(|(n, r)| (n.to_string(), *r)).collect()
    }

    fn src_dest() -> ImageRoles {
        roles(&[("src", ImageRole::Source), ("dest", ImageRole::Destination)])
    }

    fn analyze(source: &str, roles: &ImageRoles) -> Result<AnalyzedScript, Diagnostics> {
        let functions = FunctionCatalog::standard();
        let options = OptionCatalog::standard();
        Analyzer::new(&functions, &options).analyze(parse(source).unwrap(), roles)
    }

    fn errors(source: &str) -> Vec<DiagnosticKind> {
        analyze(source, &src_dest()).unwrap_err().errors().map(|d| d.kind).collect()
    }

    #[test]
    fn test_valid_script_binds_names() {
        let analyzed = analyze("init { n = 0; } a = src + n; dest = a * M_PI;", &src_dest()).unwrap();
        assert_eq!(analyzed.sources, vec!["src".to_string()]);
        assert_eq!(analyzed.destinations, vec!["dest".to_string()]);
        assert_eq!(analyzed.image_vars, vec!["n".to_string()]);
        assert_eq!(analyzed.local_count, 1);
        let StmtKind::Assign { target, .. } = &analyzed.script.body[1].kind else { panic!("expected assignment") };
        assert_eq!(target.ident().binding, Some(Binding::Destination(0)));
    }

    #[test]
    fn test_destination_rules() {
        assert_eq!(errors("dest = dest + 1;"), vec![DiagnosticKind::DestinationRead]);
        assert_eq!(errors("dest += src;"), vec![DiagnosticKind::CompoundDestinationAssignment]);
        assert_eq!(errors("dest = src; x1 = dest[1, 1];"), vec![DiagnosticKind::PositionOnNonSource]);
        assert_eq!(errors("init { n = dest; } dest = src;"), vec![DiagnosticKind::DestinationInInit]);
    }

    #[test]
    fn test_source_rules() {
        assert_eq!(errors("src = 1; dest = 2;"), vec![DiagnosticKind::SourceAssignment]);
        assert_eq!(errors("init { n = src; } dest = 1;"), vec![DiagnosticKind::SourceInInit]);
        assert_eq!(errors("a = 1; dest = a[0, 1] + src;"), vec![DiagnosticKind::PositionOnNonSource]);
    }

    #[test]
    fn test_used_before_assignment() {
        assert_eq!(errors("dest = a + src;"), vec![DiagnosticKind::UsedBeforeAssignment]);
        assert_eq!(errors("if (src > 0) { a = 1; } dest = a;"), vec![DiagnosticKind::UsedBeforeAssignment]);
        assert_eq!(errors("a += 1; dest = src;"), vec![DiagnosticKind::UsedBeforeAssignment]);
        assert_eq!(errors("if (src > 0) { a = 1; } else { b = 2; } dest = a;"), vec![DiagnosticKind::UsedBeforeAssignment]);
        assert_eq!(errors("if (src > 0) { a = 1; } else { a += 2; } dest = a;"), vec![DiagnosticKind::UsedBeforeAssignment, DiagnosticKind::UsedBeforeAssignment]);
        assert!(analyze("init { n; } dest = n + src;", &src_dest()).is_ok());
    }

    #[test]
    fn test_assigned_on_both_arms_is_visible_after_if() {
        let analyzed = analyze("if (src > 0) { v = 1; } else { v = 2; } dest = v;", &src_dest()).unwrap();
        assert_eq!(analyzed.local_count, 1);
        let StmtKind::Assign { value, .. } = &analyzed.script.body[1].kind else { panic!("expected assignment") };
        let ExprKind::Var(ident) = &value.kind else { panic!("expected variable read") };
        assert_eq!(ident.binding, Some(Binding::Local(0)));

        // Nested conditionals and unbraced arms merge the same way
        let source = "if (src > 0) v = 1; else if (src < 0) { v = 2; w = 1; } else { v = 3; } dest = v;";
        let analyzed = analyze(source, &src_dest()).unwrap();
        assert_eq!(analyzed.local_count, 2);
        assert_eq!(errors("if (src > 0) v = 1; else if (src < 0) v = 2; dest = v;"), vec![DiagnosticKind::UsedBeforeAssignment]);
    }

    #[test]
    fn test_functions() {
        assert_eq!(errors("dest = nosuch(src);"), vec![DiagnosticKind::UndefinedFunction]);
        assert_eq!(errors("dest = sqrt(src, 2);"), vec![DiagnosticKind::UndefinedFunction]);
        assert_eq!(errors("dest = if(src, 1, 2, 3, 4);"), vec![DiagnosticKind::UndefinedFunction]);
        assert!(analyze("dest = con(src, 1, 2, 3) + max(src, 1, 2);", &src_dest()).is_ok());
    }

    #[test]
    fn test_unused_image_is_a_warning() {
        let roles = roles(&[("src", ImageRole::Source), ("other", ImageRole::Source), ("dest", ImageRole::Destination)]);
        let analyzed = analyze("dest = src;", &roles).unwrap();
        let warnings: Vec<_> = analyzed.warnings.warnings().collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, DiagnosticKind::UnusedImage);
    }

    #[test]
    fn test_images_block_merges_roles() {
        let analyzed = analyze("images { a = read; b = write; } b = a;", &ImageRoles::new()).unwrap();
        assert_eq!(analyzed.sources, vec!["a".to_string()]);
        assert_eq!(analyzed.destinations, vec!["b".to_string()]);

        let err = analyze("images { src = write; } src = 1;", &src_dest()).unwrap_err();
        assert!(err.contains(DiagnosticKind::ConflictingImageRole));
    }

    #[test]
    fn test_options_and_constants() {
        assert_eq!(errors("options { wrap = 1; } dest = src;"), vec![DiagnosticKind::UnknownOption]);
        assert_eq!(errors("options { outside = wrap; } dest = src;"), vec![DiagnosticKind::InvalidOptionValue]);
        assert_eq!(errors("M_PI = 3; dest = src;"), vec![DiagnosticKind::ConstantAssignment]);
    }

    #[test]
    fn test_loops() {
        assert_eq!(errors("foreach (i in 1:3) { i = 2; } dest = src;"), vec![DiagnosticKind::LoopVariableAssignment]);
        assert_eq!(errors("break; dest = src;"), vec![DiagnosticKind::BreakOutsideLoop]);
        assert_eq!(errors("foreach (i in 1:3) { t = i; } dest = i;"), vec![DiagnosticKind::UsedBeforeAssignment]);
        assert!(analyze("s = 0; foreach (i in {1, 2}) { s += i; breakif(s > 2); } dest = s + src;", &src_dest()).is_ok());
    }

    #[test]
    fn test_loop_nesting_limit() {
        let functions = FunctionCatalog::standard();
        let options = OptionCatalog::standard();
        let script = parse("s = 0; while (s < 1) { while (s < 1) { s += 1; } } dest = s + src;").unwrap();
        let err = Analyzer::new(&functions, &options).with_max_loop_nesting(1).analyze(script, &src_dest()).unwrap_err();
        assert!(err.contains(DiagnosticKind::NestingTooDeep));
    }

    #[test]
    fn test_all_errors_are_reported_together() {
        let err = analyze("src = 1; dest = dest; dest = nosuch();", &src_dest()).unwrap_err();
        assert_eq!(err.errors().count(), 3);
    }
}
