use anyhow::{bail, Result};

use crate::ast::{Module, SourceSpan};
use crate::diagnostics::Diagnostics;
use crate::lexer::{Lexer, LexerError, Token};
use crate::parser::Parser;
use crate::refiner::Refiner;
use crate::source::SourceFile;
use crate::typed::Program;

#[derive(Debug, Default)]
pub struct CompileOptions {
    pub dump_tokens: bool,
}

pub struct Compilation {
    pub module: Module,
    pub program: Program,
}

pub struct Compiler {
    diagnostics: Diagnostics,
    options: CompileOptions,
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Self {
        Self {
            diagnostics: Diagnostics::new(),
            options,
        }
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Runs every stage and fails when any of them reported an error.
    pub fn compile(&mut self, source: &SourceFile) -> Result<Compilation> {
        let compilation = self.analyze(source)?;
        if self.diagnostics.has_errors() {
            bail!("Semantic analysis failed");
        }
        Ok(compilation)
    }

    /// Runs every stage and keeps whatever the refiner produced, errors
    /// included. Only a lexing failure stops the pipeline early.
    pub fn analyze(&mut self, source: &SourceFile) -> Result<Compilation> {
        let tokens = self.tokenize(source)?;

        if self.options.dump_tokens {
            for token in &tokens {
                println!("{token:?}");
            }
        }

        let mut parser = Parser::new(source, tokens);
        let parsed = parser.parse();
        self.diagnostics.extend(parser.into_diagnostics());
        let module = parsed?;

        let mut refiner = Refiner::new();
        let program = refiner.refine_module(&module);
        self.diagnostics.extend(refiner.into_diagnostics());

        Ok(Compilation { module, program })
    }

    fn tokenize(&mut self, source: &SourceFile) -> Result<Vec<Token>> {
        let mut lexer = Lexer::new(source);
        match lexer.tokenize() {
            Ok(tokens) => Ok(tokens),
            Err(err) => {
                if let Some(lexer_error) = err.downcast_ref::<LexerError>() {
                    let line = lexer_error.line();
                    let column = lexer_error.column();
                    self.diagnostics.push_error_with_span(
                        lexer_error.to_string(),
                        SourceSpan::single_point(line, column),
                    );
                } else {
                    self.diagnostics
                        .push_error_with_span(err.to_string(), SourceSpan::default());
                }
                bail!("Lexing failed");
            }
        }
    }
}
