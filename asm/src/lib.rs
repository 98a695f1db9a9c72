//! A two-pass assembler for the per-node word format `ga144-core` executes:
//! lex source text into tokens, parse each `node` block into a flat item
//! list, then pack and resolve labels per node (see [`emit`] for the
//! packing and structured-control-flow rules).

mod emit;
mod lexer;
mod parser;

use ga144_core::compiled::{CompiledProgram, Diagnostic};

/// Assembles a whole source file into one [`CompiledProgram`], one
/// [`ga144_core::compiled::CompiledNode`] per `node` block. Never returns
/// `Err`: malformed input just accumulates diagnostics in the returned
/// program, the same way downstream tooling expects assembly to behave.
pub fn assemble_source(source: &str) -> CompiledProgram {
    let toks = lexer::lex(source);
    let (blocks, parse_errors) = parser::parse(&toks);

    let mut errors: Vec<Diagnostic> =
        parse_errors.iter().map(|e| Diagnostic::new(e.line, e.col, e.message.clone())).collect();

    let nodes = blocks.iter().map(|block| emit::emit_node(block, &mut errors)).collect();

    CompiledProgram { nodes, errors, warnings: None }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembles_a_two_node_program() {
        let program = assemble_source(
            r#"
            node 0
            org 0
            loop: dup drop
                  call loop

            node 1
            dup drop ret
            "#,
        );
        assert!(!program.has_errors(), "{:?}", program.errors);
        assert_eq!(program.nodes.len(), 2);
    }

    #[test]
    fn reports_diagnostics_without_panicking_on_bad_input() {
        let program = assemble_source("node 0 call somewhere_undefined");
        assert!(program.has_errors());
        assert_eq!(program.nodes.len(), 1);
    }
}
