use std::{fs, path::PathBuf};

use anyhow::{Context, Result};

pub use self::comments::CommentTable;
pub use self::diagnostics::{Diagnostic, DiagnosticKind, Severity};
pub use self::lexer::{LexerError, LexerOptions};
pub use self::normalize::normalize;
pub use self::parser::{ParseError, ParseOutput, ParserOptions};

/// Trailing comments keyed by source line.
pub mod comments;

/// Recoverable problems reported by the parser.
pub mod diagnostics;

/// Lexes source text into tokens.
///
/// The line `lda #$10 ; clear` becomes
///
/// ```text
/// [
///     Token { kind: Instruction(LDA), text: "lda", position: 1:1 },
///     Token { kind: Hash, text: "#", position: 1:5 },
///     Token { kind: HexConst, text: "$10", position: 1:6 },
///     Token { kind: Eof, text: "", position: 1:17 },
/// ]
/// ```
///
/// and records `; clear` for line 1 in the comment table.
pub mod lexer;

/// Parses tokens into an AST, recovering from errors.
pub mod parser;

/// Post-parse fix-up of the tree.
pub mod normalize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrontendOptions {
    pub lexer: LexerOptions,
    pub parser: ParserOptions,
}

#[derive(Debug, thiserror::Error)]
pub enum FrontendError {
    #[error("Lexer error: {0}")]
    Lex(#[from] LexerError),
}

/// Lex, parse and normalize one compilation unit.
///
/// `comments` is reset first and then holds the comments of `input`, ready to be claimed by
/// whoever consumes the tree. Only lexical errors fail; parse problems are returned as
/// diagnostics next to the partial tree.
#[tracing::instrument(skip(input, comments))]
pub fn parse_source(
    input: &str,
    options: &FrontendOptions,
    comments: &mut CommentTable,
) -> Result<ParseOutput, FrontendError> {
    comments.reset();
    let tokens = lexer::Lexer::new(input, options.lexer, comments).tokenize()?;
    let mut output = parser::Parser::new(tokens, options.parser).parse();
    normalize(&mut output.ast);
    Ok(output)
}

/// What to print for each input file.
#[derive(clap::ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Emit {
    /// The normalized tree, annotated with trailing comments
    #[default]
    Tree,
    /// The token stream
    Tokens,
}

#[derive(clap::Args, Debug)]
pub struct ParseArgs {
    #[clap(required = true)]
    #[clap(help = "Assembly source files")]
    pub inputs: Vec<PathBuf>,
    #[clap(long, value_enum, default_value_t = Emit::Tree)]
    #[clap(help = "What to print for each file")]
    pub emit: Emit,
    #[clap(long)]
    #[clap(help = "Lex `z:` and `a:` as labels instead of dropping them")]
    pub keep_addressing_prefixes: bool,
    #[clap(long, default_value_t = parser::DEFAULT_MAX_EXPRESSION_DEPTH)]
    #[clap(help = "Maximum nesting depth of expressions")]
    pub max_depth: usize,
    #[clap(long)]
    #[clap(help = "Fail if any file produced error diagnostics")]
    pub strict: bool,
}

impl ParseArgs {
    pub fn options(&self) -> FrontendOptions {
        FrontendOptions {
            lexer: LexerOptions {
                strip_addressing_prefixes: !self.keep_addressing_prefixes,
            },
            parser: ParserOptions {
                max_expression_depth: self.max_depth,
            },
        }
    }
}

/// Parse every input file and print the result to stdout, diagnostics to stderr.
///
/// One comment table is shared by all files and reset between them.
pub fn parse_files(args: &ParseArgs) -> Result<()> {
    let options = args.options();
    let mut comments = CommentTable::new();
    let mut errors = 0;

    for path in &args.inputs {
        let input = fs::read_to_string(path)
            .with_context(|| format!("Unable to read {}", path.display()))?;
        if args.inputs.len() > 1 {
            println!("; {}", path.display());
        }

        match args.emit {
            Emit::Tokens => {
                comments.reset();
                let tokens = lexer::Lexer::new(&input, options.lexer, &mut comments)
                    .tokenize()
                    .with_context(|| format!("Lexing {} failed", path.display()))?;
                for token in tokens {
                    println!("{}", token);
                }
            }
            Emit::Tree => {
                let output = parse_source(&input, &options, &mut comments)
                    .with_context(|| format!("Parsing {} failed", path.display()))?;
                print!("{}", output.ast.dump(Some(&mut comments)));
                for diagnostic in &output.diagnostics {
                    eprintln!("{}:{}", path.display(), diagnostic);
                }
                errors += output.diagnostics.iter().filter(|d| d.is_error()).count();
            }
        }
    }

    if args.strict && errors > 0 {
        anyhow::bail!("{} error diagnostics", errors);
    }
    Ok(())
}
