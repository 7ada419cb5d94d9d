use thiserror::Error;

use super::diagnostics::{Diagnostic, DiagnosticKind};
use super::lexer::source_position::SourcePosition;
use super::lexer::token::{Token, TokenKind};
use crate::ast::{Ast, LabelType, NodeId, NodeKind, OperandClass};

// Grammar:
//
//   program       := (directive | declaration | label-section)*
//   declaration   := NAME '=' expression
//   label-section := LABEL (label-section | code-block)?
//   code-block    := (instruction | data)*
//   data          := ('.db' | '.dw') expression (',' expression)*
//   expression    := primary (('+' | '-') primary)*
//   primary       := NAME | constant | '#' expression | '<' expression | '>' expression
//                  | '(' expression ')'
//   operand       := expression (',' ('x' | 'y'))?

#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum ParseError {
    #[error("{}: expected {expected}, found {}", .found.position, .found.kind)]
    UnexpectedToken { expected: String, found: Token },
    #[error("{position}: expected expression after '{after}'")]
    ExpectedExpression {
        after: String,
        position: SourcePosition,
    },
    #[error("{position}: expression nested deeper than {limit} levels")]
    NestingTooDeep {
        limit: usize,
        position: SourcePosition,
    },
}

impl ParseError {
    pub fn position(&self) -> SourcePosition {
        match self {
            ParseError::UnexpectedToken { found, .. } => found.position,
            ParseError::ExpectedExpression { position, .. }
            | ParseError::NestingTooDeep { position, .. } => *position,
        }
    }

    fn diagnostic_kind(&self) -> DiagnosticKind {
        match self {
            ParseError::UnexpectedToken { .. } | ParseError::ExpectedExpression { .. } => {
                DiagnosticKind::UnexpectedToken
            }
            ParseError::NestingTooDeep { .. } => DiagnosticKind::NestingTooDeep,
        }
    }
}

pub const DEFAULT_MAX_EXPRESSION_DEPTH: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// How deep `#`, `<`, `>` and parentheses may nest inside one expression.
    pub max_expression_depth: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            max_expression_depth: DEFAULT_MAX_EXPRESSION_DEPTH,
        }
    }
}

/// The tree of a compilation unit together with everything the parser had to recover from.
///
/// The tree is always usable, but when `diagnostics` contains errors it may be missing parts of
/// the source.
#[derive(Debug)]
pub struct ParseOutput {
    pub ast: Ast,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseOutput {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Recursive descent parser that keeps going after errors.
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    options: ParserOptions,
    depth: usize,
    ast: Ast,
    diagnostics: Vec<Diagnostic>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>, options: ParserOptions) -> Self {
        let mut tokens = tokens;
        if tokens.last().map(|token| token.kind) != Some(TokenKind::Eof) {
            let position = tokens
                .last()
                .map(|token| token.position)
                .unwrap_or_default();
            tokens.push(Token::new(TokenKind::Eof, "", position));
        }

        Self {
            tokens,
            position: 0,
            options,
            depth: 0,
            ast: Ast::new(),
            diagnostics: Vec::new(),
        }
    }

    fn current(&self) -> &Token {
        &self.tokens[self.position]
    }

    fn current_is(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    fn peek_is(&self, kind: TokenKind) -> bool {
        self.tokens
            .get(self.position + 1)
            .map_or(kind == TokenKind::Eof, |token| token.kind == kind)
    }

    /// Move to the next token. Stays on the final `Eof` token.
    fn next_token(&mut self) {
        if self.position + 1 < self.tokens.len() {
            self.position += 1;
        }
    }

    fn backtrack(&mut self) {
        self.position = self.position.saturating_sub(1);
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if !self.current_is(kind) {
            return Err(ParseError::UnexpectedToken {
                expected: kind.to_string(),
                found: self.current().clone(),
            });
        }
        let token = self.current().clone();
        self.next_token();
        Ok(token)
    }

    fn diagnose(&mut self, kind: DiagnosticKind, position: SourcePosition, message: String) {
        tracing::warn!("{}: {}", position, message);
        self.diagnostics.push(Diagnostic::new(kind, position, message));
    }

    fn report(&mut self, err: ParseError) {
        self.diagnose(err.diagnostic_kind(), err.position(), err.to_string());
    }

    fn skip_token(&mut self, kind: DiagnosticKind, reason: &str) {
        let token = self.current().clone();
        self.diagnose(
            kind,
            token.position,
            format!("skipped {} '{}': {}", token.kind, token.text, reason),
        );
        self.next_token();
    }

    /// Whether the current token clearly starts a new statement.
    fn at_statement_start(&self) -> bool {
        match self.current().kind {
            TokenKind::Label | TokenKind::Directive | TokenKind::Eof => true,
            TokenKind::Name => self.peek_is(TokenKind::Colon) || self.peek_is(TokenKind::Equals),
            _ => false,
        }
    }

    /// Discard tokens until something a statement can start with.
    fn synchronize(&mut self) {
        let start = self.current().position;
        let mut skipped = 0;
        while !self.at_statement_start() {
            self.next_token();
            skipped += 1;
        }
        tracing::debug!("{}: resynchronized after {} tokens", start, skipped);
    }

    /// Parse the whole token stream. Never fails; problems end up as diagnostics.
    #[tracing::instrument(skip(self))]
    pub fn parse(mut self) -> ParseOutput {
        let max_attempts = self.tokens.len() * 2;
        let mut attempts = 0;

        while !self.current_is(TokenKind::Eof) {
            attempts += 1;
            if attempts > max_attempts {
                let position = self.current().position;
                self.diagnose(
                    DiagnosticKind::RecoveryExhausted,
                    position,
                    format!("gave up after {} attempts", max_attempts),
                );
                break;
            }

            let start = self.position;
            match self.parse_statement() {
                Ok(()) => {
                    if self.position == start {
                        self.next_token();
                    }
                }
                Err(err) => {
                    self.report(err);
                    self.synchronize();
                }
            }
        }

        tracing::debug!("parser created {} root items", self.ast.root_items().len());
        ParseOutput {
            ast: self.ast,
            diagnostics: self.diagnostics,
        }
    }

    fn parse_statement(&mut self) -> Result<(), ParseError> {
        match self.current().kind {
            TokenKind::Directive => self.parse_directive(),
            TokenKind::Name => {
                if let Some(decl) = self.parse_declaration()? {
                    self.ast.push_item(decl);
                } else if self.peek_is(TokenKind::Colon) {
                    let label = self.recover_label();
                    self.ast.push_item(label);
                } else {
                    self.skip_token(DiagnosticKind::SkippedToken, "not a declaration or label");
                }
            }
            TokenKind::Label => {
                let token = self.current().clone();
                self.next_token();
                let label = self.parse_section(&token);
                self.ast.push_item(label);
            }
            _ => self.skip_token(DiagnosticKind::SkippedToken, "cannot start a statement"),
        }
        Ok(())
    }

    /// Directives produce no node. A single constant argument, as in `.org $8000`, is consumed
    /// with them.
    fn parse_directive(&mut self) {
        let directive = self.current().clone();
        self.next_token();
        if self.current().kind.is_constant() {
            tracing::debug!("{}: {} {}", directive.position, directive.text, self.current().text);
            self.next_token();
        } else {
            tracing::debug!("{}: {}", directive.position, directive.text);
        }
    }

    /// `NAME = expression`. Anything else leaves the name unconsumed and returns `None`.
    fn parse_declaration(&mut self) -> Result<Option<NodeId>, ParseError> {
        if !self.current_is(TokenKind::Name) {
            return Ok(None);
        }
        let name = self.current().clone();
        self.next_token();

        if !self.current_is(TokenKind::Equals) {
            self.backtrack();
            return Ok(None);
        }
        let equals = self.current().clone();
        self.next_token();

        let expression = self.require_expression(&equals)?;
        let line = name.line();
        Ok(Some(self.ast.add(
            NodeKind::Decl {
                name: name.text,
                expression,
            },
            line,
        )))
    }

    /// A name followed by a detached colon, e.g. `Loop :`.
    fn recover_label(&mut self) -> NodeId {
        let name = self.current().clone();
        self.next_token(); // name
        self.next_token(); // colon
        self.diagnose(
            DiagnosticKind::RecoveredLabel,
            name.position,
            format!("treating '{} :' as label '{}'", name.text, name.text),
        );
        self.parse_section(&name)
    }

    /// Parse the content of the label `label`, which has already been consumed.
    ///
    /// Labels that directly follow each other nest: `A: B: lda #0` gives `A` the child `B`,
    /// and `B` the code block.
    fn parse_section(&mut self, label: &Token) -> NodeId {
        let mut nested = Vec::new();
        while self.current_is(TokenKind::Label) {
            nested.push(self.current().clone());
            self.next_token();
        }

        let mut child = self.parse_code();
        for token in nested.iter().rev() {
            child = Some(self.new_label(token, child));
        }
        self.new_label(label, child)
    }

    fn new_label(&mut self, token: &Token, child: Option<NodeId>) -> NodeId {
        let name = token.text.strip_suffix(':').unwrap_or(&token.text);
        self.ast.add(
            NodeKind::Label {
                name: name.to_owned(),
                child,
                label_type: LabelType::None,
            },
            token.line(),
        )
    }

    /// Whether the current token ends a code block. Directives do not, they are skipped inside
    /// the block.
    fn at_block_end(&self) -> bool {
        !self.current_is(TokenKind::Directive) && self.at_statement_start()
    }

    /// Parse instructions and data up to the next label. Returns the head of the list, or
    /// `None` if the block is empty.
    ///
    /// Every iteration consumes at least one token: a token nothing can parse is skipped, and
    /// `Eof` always ends the block.
    fn parse_code(&mut self) -> Option<NodeId> {
        let mut items = Vec::new();

        while !self.at_block_end() {
            if self.current_is(TokenKind::Directive) {
                self.parse_directive();
                continue;
            }

            let start = self.position;
            match self.parse_code_item() {
                Ok(Some(item)) => {
                    items.push(item);
                    continue;
                }
                Ok(None) => (),
                Err(err) => {
                    self.report(err);
                    self.synchronize();
                    break;
                }
            }

            if self.position == start {
                self.skip_token(
                    DiagnosticKind::StructuralStall,
                    "not an instruction or data directive",
                );
            }
        }

        self.ast.add_list(&items)
    }

    fn parse_code_item(&mut self) -> Result<Option<NodeId>, ParseError> {
        if let Some(instruction) = self.parse_instruction()? {
            return Ok(Some(instruction));
        }
        self.parse_data()
    }

    fn parse_data(&mut self) -> Result<Option<NodeId>, ParseError> {
        let wrap: fn(NodeId) -> NodeKind = match self.current().kind {
            TokenKind::DataBytes => NodeKind::Data8,
            TokenKind::DataWords => NodeKind::Data16,
            _ => return Ok(None),
        };
        let marker = self.current().clone();
        self.next_token();

        let list = if self.current().line() == marker.line() {
            self.parse_data_list()?
        } else {
            None
        };
        match list {
            Some(list) => Ok(Some(self.ast.add(wrap(list), marker.line()))),
            None => {
                self.diagnose(
                    DiagnosticKind::MissingOperand,
                    marker.position,
                    format!("'{}' without data", marker.text),
                );
                Ok(None)
            }
        }
    }

    fn parse_data_list(&mut self) -> Result<Option<NodeId>, ParseError> {
        let Some(first) = self.parse_expression()? else {
            return Ok(None);
        };

        let mut expressions = vec![first];
        while self.current_is(TokenKind::Comma) {
            self.next_token();
            match self.parse_expression()? {
                Some(expression) => expressions.push(expression),
                None => break,
            }
        }
        Ok(self.ast.add_list(&expressions))
    }

    fn parse_instruction(&mut self) -> Result<Option<NodeId>, ParseError> {
        let TokenKind::Instruction(mnemonic) = self.current().kind else {
            return Ok(None);
        };
        let token = self.current().clone();
        self.next_token();

        // Operands never continue on the next line.
        let same_line = self.current().line() == token.line();
        let operand = match mnemonic.operand_class() {
            OperandClass::Implied => None,
            OperandClass::Memory => {
                let operand = if same_line { self.parse_operand()? } else { None };
                if operand.is_none() {
                    self.diagnose(
                        DiagnosticKind::MissingOperand,
                        token.position,
                        format!("'{}' without operand", token.text),
                    );
                }
                operand
            }
            OperandClass::Accumulator if same_line => self.parse_operand()?,
            OperandClass::Accumulator => None,
            OperandClass::Target => {
                let target = self.expect(TokenKind::Name)?;
                let line = target.line();
                Some(self.ast.add(NodeKind::Name(target.text), line))
            }
        };

        Ok(Some(self.ast.add(
            NodeKind::Instruction { mnemonic, operand },
            token.line(),
        )))
    }

    /// An expression, optionally indexed with `,x` or `,y`.
    fn parse_operand(&mut self) -> Result<Option<NodeId>, ParseError> {
        let Some(expression) = self.parse_expression()? else {
            return Ok(None);
        };
        if !self.current_is(TokenKind::Comma) {
            return Ok(Some(expression));
        }
        self.next_token();

        let wrap: fn(NodeId) -> NodeKind = match self.current().kind {
            TokenKind::XReg => NodeKind::IndexedX,
            TokenKind::YReg => NodeKind::IndexedY,
            _ => {
                return Err(ParseError::UnexpectedToken {
                    expected: "index register x or y".to_string(),
                    found: self.current().clone(),
                })
            }
        };
        self.next_token();
        let line = self.ast.node(expression).line;
        Ok(Some(self.ast.add(wrap(expression), line)))
    }

    fn parse_expression(&mut self) -> Result<Option<NodeId>, ParseError> {
        if self.depth >= self.options.max_expression_depth {
            return Err(ParseError::NestingTooDeep {
                limit: self.options.max_expression_depth,
                position: self.current().position,
            });
        }
        self.depth += 1;
        let expression = self.parse_additive();
        self.depth -= 1;
        expression
    }

    fn require_expression(&mut self, after: &Token) -> Result<NodeId, ParseError> {
        match self.parse_expression()? {
            Some(expression) => Ok(expression),
            None => Err(ParseError::ExpectedExpression {
                after: after.text.clone(),
                position: self.current().position,
            }),
        }
    }

    fn parse_additive(&mut self) -> Result<Option<NodeId>, ParseError> {
        let Some(mut lhs) = self.parse_primary()? else {
            return Ok(None);
        };

        loop {
            let combine: fn(NodeId, NodeId) -> NodeKind = match self.current().kind {
                TokenKind::Plus => NodeKind::Add,
                TokenKind::Minus => NodeKind::Subtract,
                _ => break,
            };
            let operator = self.current().clone();
            self.next_token();

            let rhs = match self.parse_primary()? {
                Some(rhs) => rhs,
                None => {
                    return Err(ParseError::ExpectedExpression {
                        after: operator.text,
                        position: self.current().position,
                    })
                }
            };
            let line = self.ast.node(lhs).line;
            lhs = self.ast.add(combine(lhs, rhs), line);
        }

        Ok(Some(lhs))
    }

    fn parse_primary(&mut self) -> Result<Option<NodeId>, ParseError> {
        let token = self.current().clone();
        let line = token.line();
        let node = match token.kind {
            TokenKind::Name => {
                self.next_token();
                self.ast.add(NodeKind::Name(token.text), line)
            }
            TokenKind::HexConst | TokenKind::BinConst | TokenKind::DecConst => {
                self.next_token();
                self.ast.add(NodeKind::Const(token.text), line)
            }
            TokenKind::Hash => self.parse_prefixed(NodeKind::Immediate)?,
            TokenKind::Less => self.parse_prefixed(NodeKind::LoByte)?,
            TokenKind::Greater => self.parse_prefixed(NodeKind::HiByte)?,
            TokenKind::ParenLeft => {
                self.next_token();
                let expression = self.require_expression(&token)?;
                self.expect(TokenKind::ParenRight)?;
                self.ast.add(NodeKind::Indirect(expression), line)
            }
            _ => return Ok(None),
        };
        Ok(Some(node))
    }

    /// A prefix operator applying to the whole expression that follows it, e.g. `#<Table+1`.
    fn parse_prefixed(&mut self, wrap: fn(NodeId) -> NodeKind) -> Result<NodeId, ParseError> {
        let operator = self.current().clone();
        self.next_token();
        let expression = self.require_expression(&operator)?;
        Ok(self.ast.add(wrap(expression), operator.line()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Mnemonic;
    use crate::frontend::{
        lexer::{Lexer, LexerOptions},
        CommentTable,
    };

    use pretty_assertions::assert_eq;

    fn tokens(input: &str) -> Vec<Token> {
        let mut comments = CommentTable::new();
        Lexer::new(input, LexerOptions::default(), &mut comments)
            .tokenize()
            .unwrap()
    }

    fn parse(input: &str) -> ParseOutput {
        Parser::new(tokens(input), ParserOptions::default()).parse()
    }

    fn kinds(output: &ParseOutput) -> Vec<DiagnosticKind> {
        output.diagnostics.iter().map(|d| d.kind).collect()
    }

    #[test]
    fn test_program() {
        let input = "\
Start:
    lda #$00
    sta $10
    jmp Start
Data:
    .db $01,$02,$03
";
        let expected = "\
label: Start [none]
    list element:
        instruction (line 2) 11 LDA:
            immediate:
                constant: $00
    list element:
        instruction (line 3) 14 STA:
            constant: $10
    list element:
        instruction (line 4) 46 JMP:
            name: Start
label: Data [none]
    list element:
        data:
            list element:
                constant: $01
            list element:
                constant: $02
            list element:
                constant: $03
";
        let output = parse(input);
        assert_eq!(output.diagnostics, vec![]);
        assert_eq!(output.ast.to_string(), expected);
    }

    #[test]
    fn test_declarations() {
        let input = "\
PPU_CTRL = $2000
Sprite0 = OAM+4
Limit = <Table-1
";
        let expected = "\
decl: PPU_CTRL =
    constant: $2000
decl: Sprite0 =
    add:
        name: OAM
        constant: 4
decl: Limit =
    low byte:
        subtract:
            name: Table
            constant: 1
";
        let output = parse(input);
        assert_eq!(output.diagnostics, vec![]);
        assert_eq!(output.ast.to_string(), expected);
    }

    #[test]
    fn test_declaration_backtrack() {
        let mut parser = Parser::new(tokens("FOO BAR"), ParserOptions::default());
        assert_eq!(parser.parse_declaration(), Ok(None));
        assert_eq!(parser.current().text, "FOO");
        assert_eq!(parser.position, 0);

        let output = parse("FOO BAR");
        assert!(output.ast.is_empty());
        assert_eq!(
            kinds(&output),
            vec![DiagnosticKind::SkippedToken, DiagnosticKind::SkippedToken]
        );
    }

    #[test]
    fn test_declaration_without_expression() {
        let output = parse("FOO =\nStart:\n  rts");
        assert_eq!(kinds(&output), vec![DiagnosticKind::UnexpectedToken]);
        assert_eq!(output.ast.root_items().len(), 1);
        assert!(matches!(
            output.ast.kind(output.ast.root_items()[0]),
            NodeKind::Label { name, .. } if name == "Start"
        ));
    }

    #[test]
    fn test_operands() {
        let input = "\
Main:
    lda ($06),y
    sta Buffer,x
    ldx #>Table+1
    adc (Pointer+2)
    asl
    ror a
    lsr Flags
    beq Main
";
        let expected = "\
label: Main [none]
    list element:
        instruction (line 2) 11 LDA:
            indexed y:
                indirect:
                    constant: $06
    list element:
        instruction (line 3) 14 STA:
            indexed x:
                name: Buffer
    list element:
        instruction (line 4) 12 LDX:
            immediate:
                high byte:
                    add:
                        name: Table
                        constant: 1
    list element:
        instruction (line 5) 31 ADC:
            indirect:
                add:
                    name: Pointer
                    constant: 2
    list element:
        instruction (line 6) 42 ASL:
    list element:
        instruction (line 7) 45 ROR:
            name: a
    list element:
        instruction (line 8) 43 LSR:
            name: Flags
    list element:
        instruction (line 9) 51 BEQ:
            name: Main
";
        let output = parse(input);
        assert_eq!(output.diagnostics, vec![]);
        assert_eq!(output.ast.to_string(), expected);
    }

    #[test]
    fn test_implied_instructions() {
        let output = parse("Reset:\n  sei\n  cld\n  txs\n  rti");
        let label = output.ast.root_items()[0];
        let NodeKind::Label {
            child: Some(code), ..
        } = output.ast.kind(label)
        else {
            panic!("expected label with code");
        };
        let mnemonics: Vec<(Mnemonic, bool)> = output
            .ast
            .list_items(*code)
            .map(|item| match output.ast.kind(item) {
                NodeKind::Instruction { mnemonic, operand } => (*mnemonic, operand.is_some()),
                other => panic!("unexpected node {:?}", other),
            })
            .collect();
        assert_eq!(
            mnemonics,
            vec![
                (Mnemonic::SEI, false),
                (Mnemonic::CLD, false),
                (Mnemonic::TXS, false),
                (Mnemonic::RTI, false),
            ]
        );
    }

    #[test]
    fn test_nested_labels() {
        let output = parse("Outer:\nInner:\n  rts\nEmpty:\n");
        let expected = "\
label: Outer [none]
    label: Inner [none]
        list element:
            instruction (line 3) 48 RTS:
label: Empty [none]
";
        assert_eq!(output.diagnostics, vec![]);
        assert_eq!(output.ast.to_string(), expected);
        let inner = output.ast.find_label("Inner").unwrap();
        assert_eq!(output.ast.parent(inner), output.ast.find_label("Outer"));
    }

    #[test]
    fn test_recovered_label() {
        let output = parse("Loop :\n  dex\n  bne Loop");
        assert_eq!(kinds(&output), vec![DiagnosticKind::RecoveredLabel]);
        assert_eq!(output.ast.root_items().len(), 1);
        let expected = "\
label: Loop [none]
    list element:
        instruction (line 2) 40 DEX:
    list element:
        instruction (line 3) 53 BNE:
            name: Loop
";
        assert_eq!(output.ast.to_string(), expected);
    }

    #[test]
    fn test_recovered_label_ends_code_block() {
        let output = parse("First:\n  nop\nSecond :\n  rts");
        assert_eq!(kinds(&output), vec![DiagnosticKind::RecoveredLabel]);
        assert_eq!(output.ast.root_items().len(), 2);
    }

    #[test]
    fn test_branch_needs_name() {
        let output = parse("Start:\n  inx\n  bne $10\n  rts\nNext:\n  nop");
        assert_eq!(kinds(&output), vec![DiagnosticKind::UnexpectedToken]);
        let expected = "\
label: Start [none]
    list element:
        instruction (line 2) 37 INX:
label: Next [none]
    list element:
        instruction (line 6) 65 NOP:
";
        assert_eq!(output.ast.to_string(), expected);
    }

    #[test]
    fn test_bad_index_register() {
        let output = parse("Start:\n  lda Table,Foo\nNext:\n  rts");
        assert_eq!(kinds(&output), vec![DiagnosticKind::UnexpectedToken]);
        assert_eq!(output.ast.root_items().len(), 2);
        assert!(output.diagnostics[0]
            .message
            .contains("expected index register x or y"));
    }

    #[test]
    fn test_unclosed_parenthesis() {
        let output = parse("Start:\n  jmp (Vector\nNext:\n  rts");
        assert_eq!(kinds(&output), vec![DiagnosticKind::UnexpectedToken]);
        assert_eq!(output.ast.root_items().len(), 2);
    }

    #[test]
    fn test_stall_skips_token() {
        let output = parse("Start:\n  lda #1\n  )\n  rts");
        assert_eq!(kinds(&output), vec![DiagnosticKind::StructuralStall]);
        let label = output.ast.root_items()[0];
        let NodeKind::Label {
            child: Some(code), ..
        } = output.ast.kind(label)
        else {
            panic!("expected label with code");
        };
        assert_eq!(output.ast.list_items(*code).count(), 2);
    }

    #[test]
    fn test_code_block_skips_every_stalled_token() {
        let mut parser = Parser::new(
            tokens("  ) , = # x\n  nop\n  lda (\nNext:\n  rts"),
            ParserOptions::default(),
        );
        let code = parser.parse_code().unwrap();

        assert_eq!(parser.current().text, "Next:");
        assert_eq!(parser.ast.list_items(code).count(), 1);
        let kinds: Vec<DiagnosticKind> = parser.diagnostics.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![
                DiagnosticKind::StructuralStall,
                DiagnosticKind::StructuralStall,
                DiagnosticKind::StructuralStall,
                DiagnosticKind::StructuralStall,
                DiagnosticKind::StructuralStall,
                DiagnosticKind::UnexpectedToken,
            ]
        );
    }

    #[test]
    fn test_code_block_stops_at_end_of_input() {
        let mut parser = Parser::new(tokens(")"), ParserOptions::default());
        assert_eq!(parser.parse_code(), None);
        assert!(parser.current_is(TokenKind::Eof));
        assert_eq!(parser.diagnostics.len(), 1);
    }

    #[test]
    fn test_statement_level_skip() {
        let output = parse("lda #$00\nStart:\n  rts");
        assert_eq!(
            kinds(&output),
            vec![
                DiagnosticKind::SkippedToken,
                DiagnosticKind::SkippedToken,
                DiagnosticKind::SkippedToken
            ]
        );
        assert_eq!(output.ast.root_items().len(), 1);
    }

    #[test]
    fn test_directives() {
        let output = parse(".org $8000\n.segment\nStart:\n  .align 2\n  rts\n");
        assert_eq!(output.diagnostics, vec![]);
        let expected = "\
label: Start [none]
    list element:
        instruction (line 5) 48 RTS:
";
        assert_eq!(output.ast.to_string(), expected);
    }

    #[test]
    fn test_data_words() {
        let output = parse("Vectors:\n  .dw NMI, Reset, IRQ\n  .db\n");
        let expected = "\
label: Vectors [none]
    list element:
        data (16 bit):
            list element:
                name: NMI
            list element:
                name: Reset
            list element:
                name: IRQ
";
        assert_eq!(kinds(&output), vec![DiagnosticKind::MissingOperand]);
        assert_eq!(output.ast.to_string(), expected);
    }

    #[test]
    fn test_operand_stays_on_its_line() {
        let output = parse("Start:\n  lda\nLoop :\n  sta Foo");
        assert_eq!(
            kinds(&output),
            vec![DiagnosticKind::MissingOperand, DiagnosticKind::RecoveredLabel]
        );
        assert_eq!(output.ast.root_items().len(), 2);
    }

    #[test]
    fn test_missing_operand() {
        let output = parse("Start:\n  lda\n  rts");
        assert_eq!(kinds(&output), vec![DiagnosticKind::MissingOperand]);
        assert!(!output.has_errors());
    }

    #[test]
    fn test_nesting_limit() {
        let input = format!("Start:\n  lda {}$00\n  rts\nNext:\n  rts", "(".repeat(20));
        let options = ParserOptions {
            max_expression_depth: 8,
        };
        let output = Parser::new(tokens(&input), options).parse();
        assert_eq!(kinds(&output), vec![DiagnosticKind::NestingTooDeep]);
        assert_eq!(output.ast.root_items().len(), 2);
    }

    #[test]
    fn test_empty_input() {
        let output = parse("");
        assert!(output.ast.is_empty());
        assert_eq!(output.diagnostics, vec![]);

        let output = Parser::new(vec![], ParserOptions::default()).parse();
        assert!(output.ast.is_empty());
    }

    #[test]
    fn test_parent_links() {
        let output = parse("Start:\n  lda Table,x\n");
        let ast = &output.ast;
        let label = ast.root_items()[0];
        assert_eq!(ast.parent(label), Some(ast.root()));

        let NodeKind::Label {
            child: Some(code), ..
        } = ast.kind(label)
        else {
            panic!("expected label with code");
        };
        assert_eq!(ast.parent(*code), Some(label));

        let instruction = ast.list_items(*code).next().unwrap();
        let NodeKind::Instruction {
            operand: Some(indexed),
            ..
        } = ast.kind(instruction)
        else {
            panic!("expected instruction with operand");
        };
        assert_eq!(ast.parent(*indexed), Some(instruction));
    }
}
