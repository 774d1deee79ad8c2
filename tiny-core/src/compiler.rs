//! Compiler pipeline orchestration.

use crate::codegen_cpp::generate_cpp;
use crate::diagnostics::Diagnostics;
use crate::error::CoreError;
use crate::lexer::{Lexer, TokenKind};
use crate::parser::parse;

/// Outcome of one best-effort compilation run: the generated C++ (kept
/// only when the run stayed clean) plus everything that was reported.
#[derive(Debug)]
pub struct CompilationArtifact {
    pub cpp: Option<String>,
    pub diagnostics: Diagnostics,
}

/// Runs the full pipeline. Parsing and generation continue past the
/// first error for diagnostics, but an errored run never yields output.
pub fn compile(source: &str) -> CompilationArtifact {
    let mut diagnostics = Diagnostics::new();
    let program = parse(source, &mut diagnostics);
    let cpp = generate_cpp(&program);
    let cpp = if diagnostics.has_errors() {
        None
    } else {
        Some(cpp)
    };
    CompilationArtifact { cpp, diagnostics }
}

/// Compiles `source` to C++ text, failing with the first diagnostic.
pub fn compile_cpp(source: &str) -> Result<String, CoreError> {
    let artifact = compile(source);
    match artifact.diagnostics.first() {
        None => Ok(artifact.cpp.unwrap_or_default()),
        Some(first) => Err(CoreError::from(first.clone())),
    }
}

/// Renders every token of `source` as a `<code> <text>` line, with
/// `new line` standing in for a terminator's text. This is a debug
/// surface, not a stable contract.
pub fn token_trace(source: &str) -> Vec<String> {
    let mut diagnostics = Diagnostics::new();
    let mut lexer = Lexer::new(source);
    lexer.next_token(&mut diagnostics);
    lexer.next_token(&mut diagnostics);

    let mut lines = Vec::new();
    loop {
        let token = lexer.current;
        let text = if token.kind == TokenKind::Line {
            "new line"
        } else {
            token.text
        };
        lines.push(format!("{:02} {}", token.kind.code(), text));
        if token.kind == TokenKind::Eof {
            break;
        }
        lexer.next_token(&mut diagnostics);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen_cpp::PRELUDE;

    #[test]
    fn compiles_hello_program() {
        let cpp = compile_cpp("main() {\nconsole << \"Hi\"\n}").expect("compile should succeed");
        assert!(cpp.starts_with(PRELUDE));
        assert!(cpp.ends_with("int main(){std::cout<<\"Hi\";return 0;}"));
    }

    #[test]
    fn reports_lexical_error_first() {
        let err = compile_cpp("main() {\nconsole << \"Hi\n}").unwrap_err();
        assert!(matches!(err, CoreError::Lex(_)));
        assert!(err.to_string().contains("Unterminated string"));
    }

    #[test]
    fn reports_parse_error() {
        let err = compile_cpp("main() {\nx y\n}").unwrap_err();
        assert!(matches!(err, CoreError::Parse(_)));
    }

    #[test]
    fn reports_semantic_error() {
        let err = compile_cpp("main() {\ngreet()\n}").unwrap_err();
        assert!(matches!(err, CoreError::Semantic(_)));
        assert_eq!(
            err.to_string(),
            "Error on line 2: Function 'greet' does not exist."
        );
    }

    #[test]
    fn errored_runs_produce_no_output() {
        let artifact = compile("main() {\ngreet()\n}");
        assert!(artifact.cpp.is_none());
        assert!(artifact.diagnostics.first().is_some());
    }

    #[test]
    fn traces_tokens_with_numeric_codes() {
        let trace = token_trace("main()\n");
        assert_eq!(
            trace,
            vec!["01 main", "03 (", "04 )", "16 new line", "17 "]
        );
    }

    #[test]
    fn traces_insertion_operators() {
        let trace = token_trace("<< >>");
        assert_eq!(trace, vec!["10 <<", "11 >>", "17 "]);
    }
}
