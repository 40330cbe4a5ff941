/// CST Parser - parses token indices into Green Tree
/// This is a simple recursive descent parser that produces a CST
use crate::error::ParserError;
use crate::green::{GreenNodeArena, GreenNodeId, GreenTreeBuilder, Marker, SyntaxKind};
use crate::preparser::PreParsedTokens;
use crate::token::{Token, TokenKind};

/// Helper trait to reduce node boilerplate
trait NodeBuilder {
    fn emit_node<F>(&mut self, kind: SyntaxKind, f: F)
    where
        F: FnOnce(&mut Self);
}

impl NodeBuilder for Parser<'_> {
    fn emit_node<F>(&mut self, kind: SyntaxKind, f: F)
    where
        F: FnOnce(&mut Self),
    {
        self.builder.start_node(kind);
        f(self);
        self.builder.finish_node();
    }
}

/// Parser state
pub struct Parser<'a> {
    source: &'a str,
    tokens: &'a [Token],
    preparsed: &'a PreParsedTokens,
    current: usize, // Index into preparsed.token_indices
    builder: GreenTreeBuilder,
    /// Collected parser errors for error recovery
    errors: Vec<ParserError>,
}

/// Maximum lookahead distance for disambiguation
const MAX_LOOKAHEAD: usize = 32;

const PRIMITIVE_TYPES: &[&str] = &[
    "u8", "u16", "u32", "u64", "u128", "u256", "bool", "address", "signer",
];

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, tokens: &'a [Token], preparsed: &'a PreParsedTokens) -> Self {
        Self {
            source,
            tokens,
            preparsed,
            current: 0,
            builder: GreenTreeBuilder::new(),
            errors: Vec::new(),
        }
    }

    /// Parse the entire file
    pub fn parse(mut self) -> (GreenNodeId, GreenNodeArena, Vec<ParserError>) {
        self.builder.start_node(SyntaxKind::SourceFile);
        while !self.is_at_end() {
            let before = self.current;
            match self.peek() {
                Some(TokenKind::Module | TokenKind::Sharp) => self.parse_module_definition(),
                _ => self.skip_token("module"),
            }
            if self.current == before {
                self.skip_token("module");
            }
        }
        let (root_id, arena) = self.builder.finish_root(SyntaxKind::SourceFile);
        (root_id, arena, self.errors)
    }

    // ------------------------------------------------------------------
    // token helpers
    // ------------------------------------------------------------------

    /// Record a parser error
    fn add_error(&mut self, error: ParserError) {
        log::trace!("parse error: {error}");
        self.errors.push(error);
    }

    /// Get the current token index in the original token array
    fn current_token_index(&self) -> usize {
        self.preparsed
            .token_indices
            .get(self.current)
            .copied()
            .unwrap_or(self.tokens.len().saturating_sub(1))
    }

    fn current_span(&self) -> std::ops::Range<usize> {
        self.tokens
            .get(self.current_token_index())
            .map(|t| t.start..t.end())
            .unwrap_or(self.source.len()..self.source.len())
    }

    /// Get the current token kind
    fn peek(&self) -> Option<TokenKind> {
        self.peek_ahead(0)
    }

    /// Peek ahead n tokens
    fn peek_ahead(&self, n: usize) -> Option<TokenKind> {
        self.preparsed
            .get_token(self.current + n, self.tokens)
            .map(|t| t.kind)
    }

    /// Source text of the token n positions ahead
    fn peek_text_ahead(&self, n: usize) -> &'a str {
        self.preparsed
            .get_token(self.current + n, self.tokens)
            .map(|t| t.text(self.source))
            .unwrap_or_default()
    }

    fn peek_text(&self) -> &'a str {
        self.peek_text_ahead(0)
    }

    /// Whether the token n positions ahead directly follows the one before it
    fn adjacent_ahead(&self, n: usize) -> bool {
        match (
            self.preparsed.get_token(self.current + n - 1, self.tokens),
            self.preparsed.get_token(self.current + n, self.tokens),
        ) {
            (Some(prev), Some(next)) => prev.end() == next.start,
            _ => false,
        }
    }

    /// Kind of the last consumed token
    fn prev_kind(&self) -> Option<TokenKind> {
        let prev = self.current.checked_sub(1)?;
        self.preparsed.get_token(prev, self.tokens).map(|t| t.kind)
    }

    /// Check if current token matches the expected kind
    fn check(&self, kind: TokenKind) -> bool {
        self.peek() == Some(kind)
    }

    fn check_ident(&self) -> bool {
        self.peek().is_some_and(TokenKind::is_contextual_ident)
    }

    fn check_ident_text(&self, text: &str) -> bool {
        self.check(TokenKind::Ident) && self.peek_text() == text
    }

    /// Check if we've reached the end
    fn is_at_end(&self) -> bool {
        self.peek().is_none_or(|k| k == TokenKind::Eof)
    }

    /// Advance to the next token and add current to the tree
    fn bump(&mut self) {
        if self.is_at_end() {
            return;
        }
        if let Some(&token_idx) = self.preparsed.token_indices.get(self.current) {
            self.builder.add_token(token_idx);
        }
        self.current += 1;
    }

    /// Expect a specific token kind and consume it
    /// Returns true if the token matched, false otherwise (and records error)
    fn expect(&mut self, kind: TokenKind) -> bool {
        self.expects(&[kind])
    }

    /// Expect any of the given token kinds and consume the first match.
    /// Returns true if matched; otherwise records an error and returns false.
    fn expects(&mut self, kinds: &[TokenKind]) -> bool {
        match self.peek() {
            Some(kind) if kinds.contains(&kind) && kind != TokenKind::Eof => {
                self.bump();
                true
            }
            _ => {
                let expected = kinds
                    .iter()
                    .map(|k| k.to_string())
                    .collect::<Vec<_>>()
                    .join(" or ");
                self.error_here(&expected);
                false
            }
        }
    }

    fn expect_ident(&mut self) -> bool {
        if self.check_ident() {
            self.bump();
            true
        } else {
            self.error_here("identifier");
            false
        }
    }

    fn error_here(&mut self, expected: &str) {
        let index = self.current_token_index();
        let span = self.current_span();
        if self.is_at_end() {
            self.add_error(ParserError::unexpected_eof(index, span, expected));
        } else {
            let found = self.peek_text().to_string();
            self.add_error(ParserError::unexpected_token(index, span, expected, &found));
        }
    }

    /// Record an error and consume the current token into an error node
    fn skip_token(&mut self, expected: &str) {
        self.error_here(expected);
        if !self.is_at_end() {
            self.emit_node(SyntaxKind::Error, |this| this.bump());
        }
    }

    fn marker_before_last(&self) -> Marker {
        Marker {
            pos: self.builder.marker().pos.saturating_sub(1),
        }
    }

    /// Parse `open item, item, ... close` allowing a trailing comma
    fn parse_delimited<F>(&mut self, open: TokenKind, close: TokenKind, mut item: F)
    where
        F: FnMut(&mut Self),
    {
        self.expect(open);
        while !self.check(close) && !self.is_at_end() {
            let before = self.current;
            item(self);
            if self.current == before {
                self.skip_token(&close.to_string());
                continue;
            }
            if self.check(TokenKind::Comma) {
                self.bump();
            } else {
                break;
            }
        }
        self.expect(close);
    }

    // ------------------------------------------------------------------
    // modules and members
    // ------------------------------------------------------------------

    fn parse_module_definition(&mut self) {
        self.emit_node(SyntaxKind::ModuleDefinition, |this| {
            while this.check(TokenKind::Sharp) {
                this.parse_annotation();
            }
            this.expect(TokenKind::Module);
            this.parse_module_access();
            this.emit_node(SyntaxKind::ModuleBody, |this| {
                if this.check(TokenKind::SemiColon) {
                    // `module a::b;` form: members run until the end of file
                    this.bump();
                    while !this.is_at_end() {
                        this.parse_member();
                    }
                } else {
                    this.expect(TokenKind::BlockBegin);
                    while !this.check(TokenKind::BlockEnd) && !this.is_at_end() {
                        this.parse_member();
                    }
                    this.expect(TokenKind::BlockEnd);
                }
            });
        });
    }

    fn parse_member(&mut self) {
        let before = self.current;
        let marker = self.builder.marker();
        while self.check(TokenKind::Sharp) {
            self.parse_annotation();
        }
        while self.at_modifier() {
            self.parse_modifier();
        }
        let kind = match self.peek() {
            Some(TokenKind::Use) => SyntaxKind::UseDeclaration,
            Some(TokenKind::Const) => SyntaxKind::ConstantDeclaration,
            Some(TokenKind::Struct) => SyntaxKind::StructDefinition,
            Some(TokenKind::Fun) => SyntaxKind::FunctionDefinition,
            _ => SyntaxKind::Error,
        };
        self.builder.start_node_at(marker, kind);
        match kind {
            SyntaxKind::UseDeclaration => self.parse_use_rest(),
            SyntaxKind::ConstantDeclaration => self.parse_constant_rest(),
            SyntaxKind::StructDefinition => self.parse_struct_rest(),
            SyntaxKind::FunctionDefinition => self.parse_function_rest(),
            _ => self.error_here("module member"),
        }
        if self.current == before && !self.is_at_end() {
            self.bump();
        }
        self.builder.finish_node();
    }

    fn at_modifier(&self) -> bool {
        match self.peek() {
            Some(TokenKind::Public | TokenKind::Entry | TokenKind::Native) => true,
            Some(TokenKind::Ident) => {
                self.peek_text() == "macro" && self.peek_ahead(1) == Some(TokenKind::Fun)
            }
            _ => false,
        }
    }

    /// `public`, `public(package)`, `entry`, `native`, `macro`
    fn parse_modifier(&mut self) {
        self.emit_node(SyntaxKind::Modifier, |this| {
            let is_public = this.check(TokenKind::Public);
            this.bump();
            if is_public && this.check(TokenKind::ParenBegin) {
                this.bump();
                this.expect_ident();
                this.expect(TokenKind::ParenEnd);
            }
        });
    }

    fn parse_annotation(&mut self) {
        self.emit_node(SyntaxKind::Annotation, |this| {
            this.expect(TokenKind::Sharp);
            this.parse_delimited(TokenKind::BracketBegin, TokenKind::BracketEnd, |this| {
                this.parse_annotation_item();
            });
        });
    }

    fn parse_annotation_item(&mut self) {
        self.emit_node(SyntaxKind::AnnotationItem, |this| {
            let named = this.check_ident();
            match this.peek_ahead(1) {
                Some(TokenKind::ParenBegin) if named => {
                    this.emit_node(SyntaxKind::AnnotationList, |this| {
                        this.parse_identifier(SyntaxKind::Identifier);
                        this.parse_delimited(TokenKind::ParenBegin, TokenKind::ParenEnd, |this| {
                            this.parse_annotation_item();
                        });
                    });
                }
                Some(TokenKind::Assign) if named => {
                    this.emit_node(SyntaxKind::AnnotationExpr, |this| {
                        this.parse_identifier(SyntaxKind::Identifier);
                        this.bump(); // =
                        if this.check(TokenKind::DoubleColon) {
                            this.bump();
                        }
                        this.parse_annotation_value();
                    });
                }
                _ => this.parse_annotation_value(),
            }
        });
    }

    fn parse_annotation_value(&mut self) {
        if self.at_literal() {
            self.parse_literal();
        } else {
            self.parse_module_access();
        }
    }

    fn parse_use_rest(&mut self) {
        self.expect(TokenKind::Use);
        self.parse_module_access();
        if self.check(TokenKind::DoubleColon) && self.peek_ahead(1) == Some(TokenKind::BlockBegin) {
            self.bump();
            self.parse_use_member_list();
        } else if self.check(TokenKind::As) {
            self.parse_alias();
        }
        self.expect(TokenKind::SemiColon);
    }

    fn parse_use_member_list(&mut self) {
        self.emit_node(SyntaxKind::UseMemberList, |this| {
            this.parse_delimited(TokenKind::BlockBegin, TokenKind::BlockEnd, |this| {
                this.emit_node(SyntaxKind::UseMember, |this| {
                    this.parse_module_access();
                    if this.check(TokenKind::DoubleColon)
                        && this.peek_ahead(1) == Some(TokenKind::BlockBegin)
                    {
                        this.bump();
                        this.parse_use_member_list();
                    } else if this.check(TokenKind::As) {
                        this.parse_alias();
                    }
                });
            });
        });
    }

    fn parse_alias(&mut self) {
        self.emit_node(SyntaxKind::Alias, |this| {
            this.expect(TokenKind::As);
            this.parse_identifier(SyntaxKind::Identifier);
        });
    }

    fn parse_constant_rest(&mut self) {
        self.expect(TokenKind::Const);
        self.parse_identifier(SyntaxKind::Identifier);
        self.expect(TokenKind::Colon);
        self.parse_type();
        self.expect(TokenKind::Assign);
        self.parse_expr();
        self.expect(TokenKind::SemiColon);
    }

    fn parse_struct_rest(&mut self) {
        self.expect(TokenKind::Struct);
        self.parse_identifier(SyntaxKind::Identifier);
        if self.check(TokenKind::Lt) {
            self.parse_type_parameters();
        }
        if self.check(TokenKind::Has) {
            self.parse_ability_decls();
        }
        match self.peek() {
            Some(TokenKind::BlockBegin) => {
                self.emit_node(SyntaxKind::NamedFields, |this| {
                    this.parse_delimited(TokenKind::BlockBegin, TokenKind::BlockEnd, |this| {
                        this.emit_node(SyntaxKind::FieldAnnotation, |this| {
                            this.parse_identifier(SyntaxKind::FieldIdentifier);
                            this.expect(TokenKind::Colon);
                            this.parse_type();
                        });
                    });
                });
            }
            Some(TokenKind::ParenBegin) => {
                self.emit_node(SyntaxKind::PositionalFields, |this| {
                    this.parse_delimited(TokenKind::ParenBegin, TokenKind::ParenEnd, |this| {
                        this.parse_type();
                    });
                });
                if self.check(TokenKind::Has) {
                    self.parse_ability_decls();
                }
                self.expect(TokenKind::SemiColon);
            }
            _ => {
                self.expect(TokenKind::SemiColon);
            }
        }
    }

    fn parse_type_parameters(&mut self) {
        self.emit_node(SyntaxKind::TypeParameters, |this| {
            this.parse_delimited(TokenKind::Lt, TokenKind::Gt, |this| {
                this.emit_node(SyntaxKind::TypeParameter, |this| {
                    if this.check_ident_text("phantom") && this.peek_ahead(1) == Some(TokenKind::Ident)
                    {
                        this.bump();
                    }
                    this.parse_identifier(SyntaxKind::Identifier);
                    if this.check(TokenKind::Colon) {
                        this.bump();
                        this.parse_ability();
                        while this.check(TokenKind::Plus) {
                            this.bump();
                            this.parse_ability();
                        }
                    }
                });
            });
        });
    }

    fn parse_ability_decls(&mut self) {
        self.emit_node(SyntaxKind::AbilityDecls, |this| {
            this.expect(TokenKind::Has);
            this.parse_ability();
            while this.check(TokenKind::Comma) && this.peek_ahead(1) == Some(TokenKind::Ident) {
                this.bump();
                this.parse_ability();
            }
        });
    }

    fn parse_ability(&mut self) {
        self.emit_node(SyntaxKind::Ability, |this| {
            this.expect_ident();
        });
    }

    fn parse_function_rest(&mut self) {
        self.expect(TokenKind::Fun);
        self.parse_identifier(SyntaxKind::Identifier);
        if self.check(TokenKind::Lt) {
            self.parse_type_parameters();
        }
        self.emit_node(SyntaxKind::FunctionParameters, |this| {
            this.parse_delimited(TokenKind::ParenBegin, TokenKind::ParenEnd, |this| {
                this.emit_node(SyntaxKind::FunctionParameter, |this| {
                    if this.check(TokenKind::Mut) {
                        this.bump();
                    }
                    this.parse_identifier(SyntaxKind::VariableIdentifier);
                    this.expect(TokenKind::Colon);
                    this.parse_type();
                });
            });
        });
        if self.check(TokenKind::Colon) {
            self.emit_node(SyntaxKind::RetType, |this| {
                this.bump();
                this.parse_type();
            });
        }
        if self.check(TokenKind::BlockBegin) {
            self.parse_block();
        } else {
            self.expect(TokenKind::SemiColon);
        }
    }

    // ------------------------------------------------------------------
    // names and types
    // ------------------------------------------------------------------

    fn parse_identifier(&mut self, kind: SyntaxKind) {
        self.emit_node(kind, |this| {
            this.expect_ident();
        });
    }

    /// `seg(::seg)*` where the first segment may be an address and the last
    /// one may be a macro name
    fn parse_module_access(&mut self) {
        self.emit_node(SyntaxKind::ModuleAccess, |this| {
            this.emit_node(SyntaxKind::Identifier, |this| {
                this.expects(&[
                    TokenKind::Ident,
                    TokenKind::Num,
                    TokenKind::MacroName,
                    TokenKind::Has,
                    TokenKind::Entry,
                    TokenKind::Native,
                ]);
            });
            while this.prev_kind() != Some(TokenKind::MacroName)
                && this.check(TokenKind::DoubleColon)
                && this
                    .peek_ahead(1)
                    .is_some_and(|k| k.is_contextual_ident() || k == TokenKind::MacroName)
            {
                this.emit_node(SyntaxKind::PathSeparator, |this| this.bump());
                this.emit_node(SyntaxKind::Identifier, |this| this.bump());
            }
        });
    }

    fn parse_type(&mut self) {
        match self.peek() {
            Some(TokenKind::Amp) => {
                self.emit_node(SyntaxKind::RefType, |this| {
                    this.parse_ref_marker();
                    this.parse_type();
                });
            }
            Some(TokenKind::ParenBegin) => {
                self.emit_node(SyntaxKind::TupleType, |this| {
                    this.parse_delimited(TokenKind::ParenBegin, TokenKind::ParenEnd, |this| {
                        this.parse_type();
                    });
                });
            }
            Some(TokenKind::Pipe) => {
                self.emit_node(SyntaxKind::FunctionType, |this| {
                    this.emit_node(SyntaxKind::FunctionTypeParameters, |this| {
                        this.parse_delimited(TokenKind::Pipe, TokenKind::Pipe, |this| {
                            this.parse_type();
                        });
                    });
                    if this.check(TokenKind::Arrow) {
                        this.bump();
                        this.parse_type();
                    }
                });
            }
            Some(TokenKind::PipePipe) => {
                self.emit_node(SyntaxKind::FunctionType, |this| {
                    if this.peek_ahead(1) == Some(TokenKind::Arrow) {
                        this.emit_node(SyntaxKind::FunctionTypeParameters, |this| this.bump());
                        this.bump(); // ->
                        this.parse_type();
                    } else {
                        this.bump();
                    }
                });
            }
            Some(k) if k.is_contextual_ident() || k == TokenKind::Num => {
                let primitive = PRIMITIVE_TYPES.contains(&self.peek_text())
                    && !matches!(
                        self.peek_ahead(1),
                        Some(TokenKind::Lt | TokenKind::DoubleColon)
                    );
                if primitive {
                    self.emit_node(SyntaxKind::PrimitiveType, |this| this.bump());
                } else {
                    self.emit_node(SyntaxKind::ApplyType, |this| {
                        this.parse_module_access();
                        if this.check(TokenKind::Lt) {
                            this.parse_type_arguments();
                        }
                    });
                }
            }
            _ => self.skip_token("type"),
        }
    }

    fn parse_ref_marker(&mut self) {
        self.emit_node(SyntaxKind::RefMarker, |this| {
            this.expect(TokenKind::Amp);
            if this.check(TokenKind::Mut) {
                this.bump();
            }
        });
    }

    fn parse_type_arguments(&mut self) {
        self.emit_node(SyntaxKind::TypeArguments, |this| {
            this.parse_delimited(TokenKind::Lt, TokenKind::Gt, |this| this.parse_type());
        });
    }

    /// Decide whether a `<` at the current position opens type arguments
    /// (`f<u64>(x)`, `S<T> { .. }`) rather than a comparison.
    fn looks_like_type_args(&self) -> bool {
        if !self.check(TokenKind::Lt) {
            return false;
        }
        let mut angle = 0usize;
        let mut paren = 0usize;
        for offset in 0..MAX_LOOKAHEAD {
            match self.peek_ahead(offset) {
                Some(TokenKind::Lt) => angle += 1,
                Some(TokenKind::Gt) => {
                    angle -= 1;
                    if angle == 0 {
                        return matches!(
                            self.peek_ahead(offset + 1),
                            Some(
                                TokenKind::ParenBegin
                                    | TokenKind::BlockBegin
                                    | TokenKind::BracketBegin
                                    | TokenKind::DoubleColon
                            )
                        );
                    }
                }
                Some(TokenKind::ParenBegin) => paren += 1,
                Some(TokenKind::ParenEnd) => {
                    if paren == 0 {
                        return false;
                    }
                    paren -= 1;
                }
                Some(
                    TokenKind::Ident
                    | TokenKind::Num
                    | TokenKind::DoubleColon
                    | TokenKind::Comma
                    | TokenKind::Amp
                    | TokenKind::Mut
                    | TokenKind::Has
                    | TokenKind::Entry
                    | TokenKind::Native,
                ) => {}
                _ => return false,
            }
        }
        false
    }

    // ------------------------------------------------------------------
    // blocks and statements
    // ------------------------------------------------------------------

    fn parse_block(&mut self) {
        self.emit_node(SyntaxKind::Block, |this| this.parse_block_contents());
    }

    fn parse_block_contents(&mut self) {
        self.expect(TokenKind::BlockBegin);
        while !self.check(TokenKind::BlockEnd) && !self.is_at_end() {
            let before = self.current;
            match self.peek() {
                Some(TokenKind::Let) => self.parse_let_statement(),
                Some(TokenKind::Use) => {
                    self.emit_node(SyntaxKind::UseDeclaration, |this| this.parse_use_rest());
                    continue;
                }
                _ => self.parse_expression_statement(),
            }
            if self.current == before {
                self.skip_token("statement");
                continue;
            }
            if self.check(TokenKind::SemiColon) {
                while self.check(TokenKind::SemiColon) {
                    self.bump();
                }
            } else if !self.check(TokenKind::BlockEnd)
                && self.prev_kind() != Some(TokenKind::BlockEnd)
            {
                self.error_here(";");
            }
        }
        self.expect(TokenKind::BlockEnd);
    }

    fn parse_let_statement(&mut self) {
        self.emit_node(SyntaxKind::LetStatement, |this| {
            this.expect(TokenKind::Let);
            this.parse_bind_list();
            if this.check(TokenKind::Colon) {
                this.bump();
                this.parse_type();
            }
            if this.check(TokenKind::Assign) {
                this.bump();
                this.parse_expr();
            }
        });
    }

    /// A statement starting with a block-like construct ends at its closing
    /// brace; only postfix operators may continue it.
    fn parse_expression_statement(&mut self) {
        let block_like = matches!(
            self.peek(),
            Some(TokenKind::If | TokenKind::While | TokenKind::Loop | TokenKind::BlockBegin)
        ) || (self.check(TokenKind::Label) && self.peek_ahead(1) == Some(TokenKind::Colon));
        if !block_like {
            self.parse_expr();
            return;
        }
        let marker = self.builder.marker();
        self.parse_postfix();
        if self.prev_kind() == Some(TokenKind::BlockEnd) {
            return;
        }
        self.parse_binary_rest(marker, 0);
        self.finish_assignment(marker);
    }

    // ------------------------------------------------------------------
    // bindings
    // ------------------------------------------------------------------

    fn parse_bind_list(&mut self) {
        self.emit_node(SyntaxKind::BindList, |this| {
            if this.check(TokenKind::ParenBegin) {
                this.parse_delimited(TokenKind::ParenBegin, TokenKind::ParenEnd, |this| {
                    this.parse_bind();
                });
            } else {
                this.parse_bind();
            }
        });
    }

    fn parse_bind(&mut self) {
        match self.peek() {
            Some(TokenKind::Mut) => {
                self.emit_node(SyntaxKind::MutBindVar, |this| {
                    this.bump();
                    this.emit_node(SyntaxKind::BindVar, |this| {
                        this.expect_ident();
                    });
                });
            }
            Some(k) if k.is_contextual_ident() || k == TokenKind::Num => {
                match self.peek_ahead(1) {
                    Some(TokenKind::AddressPrefix) => {
                        self.emit_node(SyntaxKind::AtBind, |this| {
                            this.emit_node(SyntaxKind::BindVar, |this| this.bump());
                            this.bump(); // @
                            this.parse_bind();
                        });
                    }
                    Some(
                        TokenKind::DoubleColon
                        | TokenKind::BlockBegin
                        | TokenKind::ParenBegin
                        | TokenKind::Lt,
                    ) => self.parse_bind_unpack(),
                    _ => self.emit_node(SyntaxKind::BindVar, |this| this.bump()),
                }
            }
            _ => self.skip_token("pattern"),
        }
    }

    fn parse_bind_unpack(&mut self) {
        self.emit_node(SyntaxKind::BindUnpack, |this| {
            this.emit_node(SyntaxKind::NameExpression, |this| {
                this.parse_module_access();
                if this.check(TokenKind::Lt) {
                    this.parse_type_arguments();
                }
            });
            this.emit_node(SyntaxKind::BindFields, |this| match this.peek() {
                Some(TokenKind::BlockBegin) => {
                    this.emit_node(SyntaxKind::BindNamedFields, |this| {
                        this.parse_delimited(TokenKind::BlockBegin, TokenKind::BlockEnd, |this| {
                            this.parse_named_bind_field();
                        });
                    });
                }
                _ => {
                    this.emit_node(SyntaxKind::BindPositionalFields, |this| {
                        this.parse_delimited(TokenKind::ParenBegin, TokenKind::ParenEnd, |this| {
                            this.parse_positional_bind_field();
                        });
                    });
                }
            });
        });
    }

    fn parse_named_bind_field(&mut self) {
        match self.peek() {
            Some(TokenKind::Mut) => {
                self.emit_node(SyntaxKind::MutBindField, |this| {
                    this.bump();
                    this.parse_identifier(SyntaxKind::FieldIdentifier);
                });
            }
            Some(TokenKind::DoubleDot) => {
                self.emit_node(SyntaxKind::BindField, |this| this.bump());
            }
            _ => {
                self.emit_node(SyntaxKind::BindField, |this| {
                    this.parse_identifier(SyntaxKind::FieldIdentifier);
                    if this.check(TokenKind::Colon) {
                        this.bump();
                        this.parse_bind_value();
                    }
                });
            }
        }
    }

    fn parse_positional_bind_field(&mut self) {
        self.emit_node(SyntaxKind::BindField, |this| {
            if this.check(TokenKind::DoubleDot) {
                this.bump();
            } else {
                this.parse_bind_value();
            }
        });
    }

    /// The bound side of a field pattern; `mut x` stays flat so that the
    /// keyword is a sibling of the variable
    fn parse_bind_value(&mut self) {
        if self.check(TokenKind::Mut) {
            self.bump();
            self.parse_identifier(SyntaxKind::VariableIdentifier);
        } else {
            self.parse_bind();
        }
    }

    // ------------------------------------------------------------------
    // expressions
    // ------------------------------------------------------------------

    /// Parse expression with operator precedence and assignment
    fn parse_expr(&mut self) {
        let marker = self.builder.marker();
        self.parse_binary(0);
        self.finish_assignment(marker);
    }

    /// Assignment has lower precedence than all binary operators
    fn finish_assignment(&mut self, marker: Marker) {
        if self.check(TokenKind::Assign) {
            self.builder
                .start_node_at(marker, SyntaxKind::AssignExpression);
            self.bump();
            self.parse_expr();
            self.builder.finish_node();
        }
    }

    /// Parse expression with given minimum precedence (Pratt parser)
    fn parse_binary(&mut self, min_prec: usize) {
        let marker = self.builder.marker();
        self.parse_cast();
        self.parse_binary_rest(marker, min_prec);
    }

    fn parse_binary_rest(&mut self, mut lhs_marker: Marker, min_prec: usize) {
        while let Some((prec, width)) = self.infix_operator() {
            if prec < min_prec {
                break;
            }
            self.builder
                .start_node_at(lhs_marker, SyntaxKind::BinaryExpression);
            self.emit_node(SyntaxKind::BinaryOperator, |this| {
                for _ in 0..width {
                    this.bump();
                }
            });
            self.parse_binary(prec + 1);
            self.builder.finish_node();
            lhs_marker = self.marker_before_last();
        }
    }

    /// Precedence and token count of the infix operator at the current
    /// position. Shift operators arrive as two adjacent angle tokens.
    fn infix_operator(&self) -> Option<(usize, usize)> {
        let kind = self.peek()?;
        let shift = matches!(kind, TokenKind::Lt | TokenKind::Gt)
            && self.peek_ahead(1) == Some(kind)
            && self.adjacent_ahead(1);
        if shift {
            return Some((9, 2));
        }
        let prec = match kind {
            TokenKind::EqEqGt | TokenKind::LtEqEqGt => 1,
            TokenKind::PipePipe => 2,
            TokenKind::AmpAmp => 3,
            TokenKind::EqEq
            | TokenKind::BangEq
            | TokenKind::Lt
            | TokenKind::Gt
            | TokenKind::LtEq
            | TokenKind::GtEq => 4,
            TokenKind::DoubleDot => 5,
            TokenKind::Pipe => 6,
            TokenKind::Caret => 7,
            TokenKind::Amp => 8,
            TokenKind::Plus | TokenKind::Minus => 10,
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => 11,
            _ => return None,
        };
        Some((prec, 1))
    }

    /// `e as T` binds looser than unary operators
    fn parse_cast(&mut self) {
        let mut marker = self.builder.marker();
        self.parse_unary();
        while self.check(TokenKind::As) {
            self.builder
                .start_node_at(marker, SyntaxKind::CastExpression);
            self.bump();
            self.parse_type();
            self.builder.finish_node();
            marker = self.marker_before_last();
        }
    }

    fn parse_unary(&mut self) {
        match self.peek() {
            Some(TokenKind::Bang | TokenKind::Star) => {
                self.emit_node(SyntaxKind::UnaryExpression, |this| {
                    this.emit_node(SyntaxKind::UnaryOperator, |this| this.bump());
                    this.parse_unary();
                });
            }
            Some(TokenKind::Amp) => {
                self.emit_node(SyntaxKind::BorrowExpression, |this| {
                    this.parse_ref_marker();
                    this.parse_unary();
                });
            }
            Some(TokenKind::Ident)
                if matches!(self.peek_text(), "move" | "copy")
                    && self.peek_ahead(1) == Some(TokenKind::Ident) =>
            {
                self.emit_node(SyntaxKind::UnaryExpression, |this| {
                    this.emit_node(SyntaxKind::UnaryOperator, |this| this.bump());
                    this.parse_unary();
                });
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) {
        let marker = self.builder.marker();
        self.parse_primary();
        self.parse_postfix_rest(marker);
    }

    /// Field access, method calls, calls and indexing
    fn parse_postfix_rest(&mut self, mut lhs_marker: Marker) {
        loop {
            match self.peek() {
                Some(TokenKind::Dot) => {
                    self.builder
                        .start_node_at(lhs_marker, SyntaxKind::DotExpression);
                    self.bump();
                    self.emit_node(SyntaxKind::FieldIdentifier, |this| {
                        this.expects(&[TokenKind::Ident, TokenKind::Num, TokenKind::MacroName]);
                    });
                    if self.looks_like_type_args() {
                        self.parse_type_arguments();
                    }
                    self.builder.finish_node();
                }
                Some(TokenKind::ParenBegin) => {
                    self.builder
                        .start_node_at(lhs_marker, SyntaxKind::CallExpression);
                    self.parse_arg_list();
                    self.builder.finish_node();
                }
                Some(TokenKind::BracketBegin) => {
                    self.builder
                        .start_node_at(lhs_marker, SyntaxKind::IndexExpression);
                    self.bump();
                    self.parse_expr();
                    self.expect(TokenKind::BracketEnd);
                    self.builder.finish_node();
                }
                _ => break,
            }
            lhs_marker = self.marker_before_last();
        }
    }

    fn parse_arg_list(&mut self) {
        self.emit_node(SyntaxKind::ArgList, |this| {
            this.parse_delimited(TokenKind::ParenBegin, TokenKind::ParenEnd, |this| {
                this.parse_expr();
            });
        });
    }

    fn at_literal(&self) -> bool {
        matches!(
            self.peek(),
            Some(
                TokenKind::Num
                    | TokenKind::True
                    | TokenKind::False
                    | TokenKind::AddressPrefix
                    | TokenKind::ByteString
                    | TokenKind::HexString
            )
        ) && !(self.check(TokenKind::Num) && self.peek_ahead(1) == Some(TokenKind::DoubleColon))
    }

    fn parse_literal(&mut self) {
        match self.peek() {
            Some(TokenKind::Num) => self.emit_node(SyntaxKind::NumLiteral, |this| this.bump()),
            Some(TokenKind::True | TokenKind::False) => {
                self.emit_node(SyntaxKind::BoolLiteral, |this| this.bump())
            }
            Some(TokenKind::AddressPrefix) => {
                self.emit_node(SyntaxKind::AddressLiteral, |this| {
                    this.bump();
                    this.expects(&[TokenKind::Num, TokenKind::Ident]);
                });
            }
            Some(TokenKind::ByteString | TokenKind::HexString) => {
                self.emit_node(SyntaxKind::ByteStringLiteral, |this| this.bump())
            }
            _ => self.skip_token("literal"),
        }
    }

    /// Whether an operand may start at the current token
    fn can_start_expr(&self) -> bool {
        !matches!(
            self.peek(),
            None | Some(
                TokenKind::SemiColon
                    | TokenKind::BlockEnd
                    | TokenKind::ParenEnd
                    | TokenKind::BracketEnd
                    | TokenKind::Comma
                    | TokenKind::Else
                    | TokenKind::Eof
            )
        )
    }

    fn parse_primary(&mut self) {
        if self.at_literal() {
            self.parse_literal();
            return;
        }
        match self.peek() {
            Some(TokenKind::ParenBegin) => self.parse_paren_or_tuple(),
            Some(TokenKind::BlockBegin) => self.parse_block(),
            Some(TokenKind::Label) if self.peek_ahead(1) == Some(TokenKind::Colon) => {
                self.parse_labeled()
            }
            Some(TokenKind::If) => self.emit_node(SyntaxKind::IfExpression, |this| this.parse_if_rest()),
            Some(TokenKind::While) => {
                self.emit_node(SyntaxKind::WhileExpression, |this| this.parse_while_rest())
            }
            Some(TokenKind::Loop) => {
                self.emit_node(SyntaxKind::LoopExpression, |this| this.parse_loop_rest())
            }
            Some(TokenKind::Break) => {
                self.emit_node(SyntaxKind::BreakExpression, |this| {
                    this.bump();
                    this.parse_optional_label();
                    if this.can_start_expr() {
                        this.parse_expr();
                    }
                });
            }
            Some(TokenKind::Continue) => {
                self.emit_node(SyntaxKind::ContinueExpression, |this| {
                    this.bump();
                    this.parse_optional_label();
                });
            }
            Some(TokenKind::Return) => {
                self.emit_node(SyntaxKind::ReturnExpression, |this| {
                    this.bump();
                    this.parse_optional_label();
                    if this.can_start_expr() {
                        this.parse_expr();
                    }
                });
            }
            Some(TokenKind::Abort) => {
                self.emit_node(SyntaxKind::AbortExpression, |this| {
                    this.bump();
                    this.parse_expr();
                });
            }
            Some(TokenKind::Pipe | TokenKind::PipePipe) => self.parse_lambda(),
            Some(k) if k.is_contextual_ident() || k == TokenKind::Num || k == TokenKind::MacroName => {
                if self.find_macro_after_path().is_some() {
                    self.parse_macro_call();
                } else if self.check_ident_text("vector")
                    && (self.peek_ahead(1) == Some(TokenKind::BracketBegin)
                        || self.at_vector_with_type_args())
                {
                    self.parse_vector();
                } else {
                    self.parse_name_or_pack();
                }
            }
            _ => self.skip_token("expression"),
        }
    }

    /// Offset of the macro name if the current position starts a path that
    /// ends in a macro call (`assert!`, `std::debug::print!`)
    fn find_macro_after_path(&self) -> Option<usize> {
        let mut offset = 0;
        loop {
            match self.peek_ahead(offset) {
                Some(TokenKind::MacroName) => return Some(offset),
                Some(k) if k.is_contextual_ident() || (offset == 0 && k == TokenKind::Num) => {}
                _ => return None,
            }
            offset += 1;
            if self.peek_ahead(offset) != Some(TokenKind::DoubleColon) {
                return None;
            }
            offset += 1;
        }
    }

    /// `vector<T>[...]`
    fn at_vector_with_type_args(&self) -> bool {
        if self.peek_ahead(1) != Some(TokenKind::Lt) {
            return false;
        }
        let mut depth = 0usize;
        for offset in 1..MAX_LOOKAHEAD {
            match self.peek_ahead(offset) {
                Some(TokenKind::Lt) => depth += 1,
                Some(TokenKind::Gt) => {
                    depth -= 1;
                    if depth == 0 {
                        return self.peek_ahead(offset + 1) == Some(TokenKind::BracketBegin);
                    }
                }
                None | Some(TokenKind::Eof | TokenKind::SemiColon) => return false,
                _ => {}
            }
        }
        false
    }

    fn parse_optional_label(&mut self) {
        if self.check(TokenKind::Label) {
            self.emit_node(SyntaxKind::Label, |this| this.bump());
        }
    }

    fn parse_paren_or_tuple(&mut self) {
        if self.peek_ahead(1) == Some(TokenKind::ParenEnd) {
            self.emit_node(SyntaxKind::UnitExpression, |this| {
                this.bump();
                this.bump();
            });
            return;
        }
        let marker = self.builder.marker();
        self.bump(); // (
        self.parse_expr();
        if self.check(TokenKind::Comma) {
            self.builder
                .start_node_at(marker, SyntaxKind::ExpressionList);
            while self.check(TokenKind::Comma) {
                self.bump();
                if self.check(TokenKind::ParenEnd) {
                    break;
                }
                self.parse_expr();
            }
        } else {
            self.builder
                .start_node_at(marker, SyntaxKind::ParenExpression);
        }
        self.expect(TokenKind::ParenEnd);
        self.builder.finish_node();
    }

    /// `'a: { .. }`, `'a: loop { .. }`, `'a: while (c) { .. }`
    fn parse_labeled(&mut self) {
        let marker = self.builder.marker();
        self.emit_node(SyntaxKind::BlockIdentifier, |this| {
            this.emit_node(SyntaxKind::Label, |this| this.bump());
            this.expect(TokenKind::Colon);
        });
        match self.peek() {
            Some(TokenKind::Loop) => {
                self.builder
                    .start_node_at(marker, SyntaxKind::LoopExpression);
                self.parse_loop_rest();
            }
            Some(TokenKind::While) => {
                self.builder
                    .start_node_at(marker, SyntaxKind::WhileExpression);
                self.parse_while_rest();
            }
            _ => {
                self.builder.start_node_at(marker, SyntaxKind::Block);
                self.parse_block_contents();
            }
        }
        self.builder.finish_node();
    }

    /// A branch that is a block is complete on its own: only postfix
    /// operators attach to it. Any other branch extends as far right as
    /// possible.
    fn parse_branch(&mut self) {
        if self.check(TokenKind::BlockBegin) {
            let marker = self.builder.marker();
            self.parse_block();
            self.parse_postfix_rest(marker);
        } else {
            self.parse_expr();
        }
    }

    fn parse_if_rest(&mut self) {
        self.expect(TokenKind::If);
        self.expect(TokenKind::ParenBegin);
        self.parse_expr();
        self.expect(TokenKind::ParenEnd);
        self.parse_branch();
        if self.check(TokenKind::Else) {
            self.bump();
            self.parse_branch();
        }
    }

    fn parse_while_rest(&mut self) {
        self.expect(TokenKind::While);
        self.expect(TokenKind::ParenBegin);
        self.parse_expr();
        self.expect(TokenKind::ParenEnd);
        self.parse_branch();
    }

    fn parse_loop_rest(&mut self) {
        self.expect(TokenKind::Loop);
        self.parse_branch();
    }

    fn parse_lambda(&mut self) {
        self.emit_node(SyntaxKind::LambdaExpression, |this| {
            this.emit_node(SyntaxKind::LambdaBindings, |this| {
                if this.check(TokenKind::PipePipe) {
                    this.bump();
                } else {
                    this.parse_delimited(TokenKind::Pipe, TokenKind::Pipe, |this| {
                        this.emit_node(SyntaxKind::LambdaBinding, |this| {
                            this.parse_bind();
                            if this.check(TokenKind::Colon) {
                                this.bump();
                                this.parse_type();
                            }
                        });
                    });
                }
            });
            if this.check(TokenKind::Arrow) {
                this.bump();
                this.parse_type();
            }
            this.parse_expr();
        });
    }

    fn parse_macro_call(&mut self) {
        self.emit_node(SyntaxKind::MacroCallExpression, |this| {
            this.parse_module_access();
            if this.looks_like_type_args() {
                this.parse_type_arguments();
            }
            this.parse_arg_list();
        });
    }

    fn parse_vector(&mut self) {
        self.emit_node(SyntaxKind::VectorExpression, |this| {
            this.bump(); // vector
            if this.check(TokenKind::Lt) {
                this.parse_type_arguments();
            }
            this.parse_delimited(TokenKind::BracketBegin, TokenKind::BracketEnd, |this| {
                this.parse_expr();
            });
        });
    }

    fn parse_name_or_pack(&mut self) {
        let marker = self.builder.marker();
        self.emit_node(SyntaxKind::NameExpression, |this| {
            this.parse_module_access();
            if this.looks_like_type_args() {
                this.parse_type_arguments();
            }
        });
        if self.check(TokenKind::BlockBegin) {
            self.builder
                .start_node_at(marker, SyntaxKind::PackExpression);
            self.emit_node(SyntaxKind::FieldInitializeList, |this| {
                this.parse_delimited(TokenKind::BlockBegin, TokenKind::BlockEnd, |this| {
                    this.emit_node(SyntaxKind::ExpField, |this| {
                        this.parse_identifier(SyntaxKind::FieldIdentifier);
                        if this.check(TokenKind::Colon) {
                            this.bump();
                            this.parse_expr();
                        }
                    });
                });
            });
            self.builder.finish_node();
        }
    }
}

/// Parse tokens into a Green Tree (CST) with error collection
pub fn parse_cst(
    source: &str,
    tokens: &[Token],
    preparsed: &PreParsedTokens,
) -> (GreenNodeId, GreenNodeArena, Vec<ParserError>) {
    let parser = Parser::new(source, tokens, preparsed);
    parser.parse()
}
