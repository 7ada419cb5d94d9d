/// Syntax tree of a 6502 assembly compilation unit.
///
/// The tree is stored in an arena and consists of
/// - **Declarations** - `NAME = expression`
/// - **Label sections** - a label owning either a nested label or a code block
/// - **Code blocks** - ordered lists of instructions and `.db`/`.dw` data
/// - **Expressions** - names, constants, addressing mode wrappers and `+`/`-`
pub mod ast;

/// Turns 6502 assembly source into an AST.
///
/// The steps are:
/// 1. **Lexing** - converting a string into tokens, collecting comments on the side
/// 2. **Parsing** - converting tokens into an AST, recovering from errors
/// 3. **Normalizing** - repairing the parent links of the finished tree
pub mod frontend;

/// Logging and chrome tracing setup
pub mod instrumentation;
