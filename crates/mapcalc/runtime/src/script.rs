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

//! Lazily compiled script handle

use crate::error::RuntimeResult;
use crate::loader::{InterpreterLoader, ProgramLoader, RuntimeFactory};
use crate::runtime::Runtime;
use mapcalc_compiler::ast::Script;
use mapcalc_compiler::{Compiler, Diagnostics, GeneratedProgram, ImageRoles};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone)]
enum ScriptSource {
    Text(String),
    Tree(Script),
}

struct Loaded {
    factory: Arc<dyn RuntimeFactory>,
    warnings: Diagnostics,
}

/// A script together with its image roles
///
/// Compilation happens on first use and the loaded program is kept, so
/// every later instance shares it.
pub struct MapScript {
    source: ScriptSource,
    roles: ImageRoles,
    compiler: Compiler,
    loader: Arc<dyn ProgramLoader>,
    loaded: Mutex<Option<Loaded>>,
}

impl MapScript {
    /// Script from source text
    pub fn new(source: impl Into<String>, roles: ImageRoles) -> Self {
        Self::with_source(ScriptSource::Text(source.into()), roles)
    }

    /// Script from an already parsed tree
    pub fn from_tree(script: Script, roles: ImageRoles) -> Self {
        Self::with_source(ScriptSource::Tree(script), roles)
    }

    fn with_source(source: ScriptSource, roles: ImageRoles) -> Self {
        Self {
            source,
            roles,
            compiler: Compiler::default(),
            loader: Arc::new(InterpreterLoader::default()),
            loaded: Mutex::new(None),
        }
    }

    /// Use another compiler; drops any earlier compilation
    pub fn with_compiler(mut self, compiler: Compiler) -> Self {
        self.compiler = compiler;
        *self.loaded.get_mut() = None;
        self
    }

    /// Use another program loader; drops any earlier compilation
    pub fn with_loader(mut self, loader: Arc<dyn ProgramLoader>) -> Self {
        self.loader = loader;
        *self.loaded.get_mut() = None;
        self
    }

    pub fn roles(&self) -> &ImageRoles {
        &self.roles
    }

    pub fn is_compiled(&self) -> bool {
        self.loaded.lock().is_some()
    }

    /// Compile and load the script unless that already happened
    pub fn compile(&self) -> RuntimeResult<Arc<dyn RuntimeFactory>> {
        let mut loaded = self.loaded.lock();
        if let Some(loaded) = loaded.as_ref() {
            return Ok(Arc::clone(&loaded.factory));
        }
        let compiled = match &self.source {
            ScriptSource::Text(text) => self.compiler.compile_source(text, &self.roles)?,
            ScriptSource::Tree(tree) => self.compiler.compile_tree(tree.clone(), &self.roles)?,
        };
        let factory = self.loader.load(compiled.program)?;
        debug!(warnings = compiled.warnings.len(), "script loaded");
        *loaded = Some(Loaded {
            factory: Arc::clone(&factory),
            warnings: compiled.warnings,
        });
        Ok(factory)
    }

    pub fn program(&self) -> RuntimeResult<Arc<GeneratedProgram>> {
        Ok(Arc::clone(self.compile()?.program()))
    }

    /// Warnings of the last successful compilation
    pub fn warnings(&self) -> Option<Diagnostics> {
        self.loaded.lock().as_ref().map(|loaded| loaded.warnings.clone())
    }

    /// New runtime instance, compiling first if needed
    pub fn runtime_instance(&self) -> RuntimeResult<Box<dyn Runtime>> {
        Ok(self.compile()?.instantiate())
    }
}

impl fmt::Debug for MapScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapScript")
            .field("source", &self.source)
            .field("roles", &self.roles)
            .field("compiled", &self.is_compiled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuntimeError;
    use mapcalc_compiler::{CompilerConfig, EvaluationModel, ImageRole, parse};

    fn roles() -> ImageRoles {
        [("dest".to_string(), ImageRole::Destination)].into_iter().collect()
    }

    #[test]
    fn test_compiles_once() {
        let script = MapScript::new("dest = 1;", roles());
        assert!(!script.is_compiled());
        let first = script.program().unwrap();
        assert!(script.is_compiled());
        assert!(Arc::ptr_eq(&first, &script.program().unwrap()));
        assert_eq!(script.warnings().map(|w| w.len()), Some(0));
    }

    #[test]
    fn test_compile_error_is_kept_out() {
        let script = MapScript::new("dest = ;", roles());
        assert!(matches!(script.compile(), Err(RuntimeError::Compile(_))));
        assert!(!script.is_compiled());
        assert!(script.warnings().is_none());
    }

    #[test]
    fn test_from_tree_with_compiler() {
        let tree = parse("dest = 4;").unwrap();
        let compiler = Compiler::new(CompilerConfig::for_model(EvaluationModel::Indirect)).unwrap();
        let script = MapScript::from_tree(tree, roles()).with_compiler(compiler);
        assert_eq!(script.program().unwrap().model(), EvaluationModel::Indirect);
        let runtime = script.runtime_instance().unwrap();
        assert_eq!(runtime.model(), EvaluationModel::Indirect);
    }
}
