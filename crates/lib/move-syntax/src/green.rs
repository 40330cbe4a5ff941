/// Green Tree - Concrete Syntax Tree (CST) for full-fidelity representation
///
/// Green nodes are immutable and position-independent. Token leaves refer to
/// the lossless token array by index, internal nodes cache the index range of
/// the tokens they cover so that positions can be recovered without walking.
use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// A handle to a GreenNode stored in the arena
    pub struct GreenNodeId;
}

/// Green node - represents a CST node without position information
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GreenNode {
    /// A token node (leaf)
    Token { token_index: usize },

    /// An internal node with children
    Internal {
        kind: SyntaxKind,
        children: Vec<GreenNodeId>,
        /// First and last token index covered by this node, `None` when the
        /// node is empty (only produced by error recovery)
        token_range: Option<(usize, usize)>,
    },
}

impl GreenNode {
    /// Get the kind of this node
    pub fn kind(&self) -> Option<SyntaxKind> {
        match self {
            GreenNode::Token { .. } => None,
            GreenNode::Internal { kind, .. } => Some(*kind),
        }
    }

    /// Get children if this is an internal node
    pub fn children(&self) -> Option<&[GreenNodeId]> {
        match self {
            GreenNode::Token { .. } => None,
            GreenNode::Internal { children, .. } => Some(children),
        }
    }

    /// First and last token index covered by this node
    pub fn token_range(&self) -> Option<(usize, usize)> {
        match self {
            GreenNode::Token { token_index } => Some((*token_index, *token_index)),
            GreenNode::Internal { token_range, .. } => *token_range,
        }
    }
}

/// Arena holding every green node of one tree
#[derive(Debug, Default, Clone)]
pub struct GreenNodeArena {
    nodes: SlotMap<GreenNodeId, GreenNode>,
}

impl GreenNodeArena {
    /// Create a new arena
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
        }
    }

    /// Allocate a token node
    pub fn alloc_token(&mut self, token_index: usize) -> GreenNodeId {
        self.nodes.insert(GreenNode::Token { token_index })
    }

    /// Allocate an internal node
    pub fn alloc_internal(&mut self, kind: SyntaxKind, children: Vec<GreenNodeId>) -> GreenNodeId {
        let first = children
            .iter()
            .find_map(|&id| self.nodes[id].token_range())
            .map(|(first, _)| first);
        let last = children
            .iter()
            .rev()
            .find_map(|&id| self.nodes[id].token_range())
            .map(|(_, last)| last);
        let token_range = first.zip(last);
        self.nodes.insert(GreenNode::Internal {
            kind,
            children,
            token_range,
        })
    }

    /// Get a node by its ID
    pub fn get(&self, id: GreenNodeId) -> &GreenNode {
        &self.nodes[id]
    }

    /// Get the kind of a node
    pub fn kind(&self, id: GreenNodeId) -> Option<SyntaxKind> {
        self.nodes[id].kind()
    }

    /// Get children of a node
    pub fn children(&self, id: GreenNodeId) -> Option<&[GreenNodeId]> {
        self.nodes[id].children()
    }

    /// Get the token index range of a node
    pub fn token_range(&self, id: GreenNodeId) -> Option<(usize, usize)> {
        self.nodes[id].token_range()
    }

    /// Iterate over every node of the arena
    pub fn iter(&self) -> impl Iterator<Item = (GreenNodeId, &GreenNode)> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Syntax kinds - types of CST nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxKind {
    // Top-level
    SourceFile,
    ModuleDefinition,
    ModuleBody,

    // Annotations
    Annotation,
    AnnotationItem,
    AnnotationList,
    AnnotationExpr,

    // Declarations
    Modifier,
    UseDeclaration,
    UseMemberList,
    UseMember,
    Alias,
    ConstantDeclaration,
    StructDefinition,
    TypeParameters,
    TypeParameter,
    AbilityDecls,
    Ability,
    NamedFields,
    PositionalFields,
    FieldAnnotation,
    FunctionDefinition,
    FunctionParameters,
    FunctionParameter,
    RetType,

    // Types
    PrimitiveType,
    ApplyType,
    TypeArguments,
    RefType,
    RefMarker,
    TupleType,
    FunctionType,
    FunctionTypeParameters,

    // Names and paths
    ModuleAccess,
    PathSeparator,
    Identifier,
    VariableIdentifier,
    FieldIdentifier,
    Label,
    BlockIdentifier,

    // Statements
    Block,
    LetStatement,

    // Bindings
    BindList,
    MutBindVar,
    BindVar,
    AtBind,
    BindUnpack,
    BindFields,
    BindNamedFields,
    BindPositionalFields,
    BindField,
    MutBindField,

    // Expressions
    AssignExpression,
    BinaryExpression,
    BinaryOperator,
    UnaryExpression,
    UnaryOperator,
    BorrowExpression,
    CastExpression,
    DotExpression,
    IndexExpression,
    CallExpression,
    ArgList,
    MacroCallExpression,
    NameExpression,
    PackExpression,
    FieldInitializeList,
    ExpField,
    VectorExpression,
    LambdaExpression,
    LambdaBindings,
    LambdaBinding,
    IfExpression,
    WhileExpression,
    LoopExpression,
    BreakExpression,
    ContinueExpression,
    ReturnExpression,
    AbortExpression,
    ParenExpression,
    UnitExpression,
    ExpressionList,

    // Literals
    NumLiteral,
    BoolLiteral,
    AddressLiteral,
    ByteStringLiteral,

    // Other
    Error, // For error recovery
}

impl SyntaxKind {
    /// Kinds that denote a type
    pub fn is_type(self) -> bool {
        matches!(
            self,
            SyntaxKind::PrimitiveType
                | SyntaxKind::ApplyType
                | SyntaxKind::RefType
                | SyntaxKind::TupleType
                | SyntaxKind::FunctionType
        )
    }

    /// Kinds whose source text ends with a closing brace and which therefore
    /// terminate a statement without a semicolon
    pub fn is_block_like(self) -> bool {
        matches!(
            self,
            SyntaxKind::Block
                | SyntaxKind::IfExpression
                | SyntaxKind::WhileExpression
                | SyntaxKind::LoopExpression
        )
    }
}

impl std::fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            SyntaxKind::SourceFile => "source_file",
            SyntaxKind::ModuleDefinition => "module_definition",
            SyntaxKind::ModuleBody => "module_body",
            SyntaxKind::Annotation => "annotation",
            SyntaxKind::AnnotationItem => "annotation_item",
            SyntaxKind::AnnotationList => "annotation_list",
            SyntaxKind::AnnotationExpr => "annotation_expr",
            SyntaxKind::Modifier => "modifier",
            SyntaxKind::UseDeclaration => "use_declaration",
            SyntaxKind::UseMemberList => "use_member_list",
            SyntaxKind::UseMember => "use_member",
            SyntaxKind::Alias => "alias",
            SyntaxKind::ConstantDeclaration => "constant_declaration",
            SyntaxKind::StructDefinition => "struct_definition",
            SyntaxKind::TypeParameters => "type_parameters",
            SyntaxKind::TypeParameter => "type_parameter",
            SyntaxKind::AbilityDecls => "ability_decls",
            SyntaxKind::Ability => "ability",
            SyntaxKind::NamedFields => "named_fields",
            SyntaxKind::PositionalFields => "positional_fields",
            SyntaxKind::FieldAnnotation => "field_annotation",
            SyntaxKind::FunctionDefinition => "function_definition",
            SyntaxKind::FunctionParameters => "function_parameters",
            SyntaxKind::FunctionParameter => "function_parameter",
            SyntaxKind::RetType => "ret_type",
            SyntaxKind::PrimitiveType => "primitive_type",
            SyntaxKind::ApplyType => "apply_type",
            SyntaxKind::TypeArguments => "type_arguments",
            SyntaxKind::RefType => "ref_type",
            SyntaxKind::RefMarker => "ref_marker",
            SyntaxKind::TupleType => "tuple_type",
            SyntaxKind::FunctionType => "function_type",
            SyntaxKind::FunctionTypeParameters => "function_type_parameters",
            SyntaxKind::ModuleAccess => "module_access",
            SyntaxKind::PathSeparator => "path_separator",
            SyntaxKind::Identifier => "identifier",
            SyntaxKind::VariableIdentifier => "variable_identifier",
            SyntaxKind::FieldIdentifier => "field_identifier",
            SyntaxKind::Label => "label",
            SyntaxKind::BlockIdentifier => "block_identifier",
            SyntaxKind::Block => "block",
            SyntaxKind::LetStatement => "let_statement",
            SyntaxKind::BindList => "bind_list",
            SyntaxKind::MutBindVar => "mut_bind_var",
            SyntaxKind::BindVar => "bind_var",
            SyntaxKind::AtBind => "at_bind",
            SyntaxKind::BindUnpack => "bind_unpack",
            SyntaxKind::BindFields => "bind_fields",
            SyntaxKind::BindNamedFields => "bind_named_fields",
            SyntaxKind::BindPositionalFields => "bind_positional_fields",
            SyntaxKind::BindField => "bind_field",
            SyntaxKind::MutBindField => "mut_bind_field",
            SyntaxKind::AssignExpression => "assign_expression",
            SyntaxKind::BinaryExpression => "binary_expression",
            SyntaxKind::BinaryOperator => "binary_operator",
            SyntaxKind::UnaryExpression => "unary_expression",
            SyntaxKind::UnaryOperator => "unary_operator",
            SyntaxKind::BorrowExpression => "borrow_expression",
            SyntaxKind::CastExpression => "cast_expression",
            SyntaxKind::DotExpression => "dot_expression",
            SyntaxKind::IndexExpression => "index_expression",
            SyntaxKind::CallExpression => "call_expression",
            SyntaxKind::ArgList => "arg_list",
            SyntaxKind::MacroCallExpression => "macro_call_expression",
            SyntaxKind::NameExpression => "name_expression",
            SyntaxKind::PackExpression => "pack_expression",
            SyntaxKind::FieldInitializeList => "field_initialize_list",
            SyntaxKind::ExpField => "exp_field",
            SyntaxKind::VectorExpression => "vector_expression",
            SyntaxKind::LambdaExpression => "lambda_expression",
            SyntaxKind::LambdaBindings => "lambda_bindings",
            SyntaxKind::LambdaBinding => "lambda_binding",
            SyntaxKind::IfExpression => "if_expression",
            SyntaxKind::WhileExpression => "while_expression",
            SyntaxKind::LoopExpression => "loop_expression",
            SyntaxKind::BreakExpression => "break_expression",
            SyntaxKind::ContinueExpression => "continue_expression",
            SyntaxKind::ReturnExpression => "return_expression",
            SyntaxKind::AbortExpression => "abort_expression",
            SyntaxKind::ParenExpression => "paren_expression",
            SyntaxKind::UnitExpression => "unit_expression",
            SyntaxKind::ExpressionList => "expression_list",
            SyntaxKind::NumLiteral => "num_literal",
            SyntaxKind::BoolLiteral => "bool_literal",
            SyntaxKind::AddressLiteral => "address_literal",
            SyntaxKind::ByteStringLiteral => "byte_string_literal",
            SyntaxKind::Error => "ERROR",
        };
        write!(f, "{name}")
    }
}

/// A marker representing a position in the parse tree building process.
/// Used to wrap previously parsed nodes into a new parent node.
#[derive(Clone, Copy, Debug)]
pub struct Marker {
    /// Position in the children list of the current node when the marker was created
    pub pos: usize,
}

/// A builder for constructing Green Trees with an arena
pub struct GreenTreeBuilder {
    arena: GreenNodeArena,
    stack: Vec<(SyntaxKind, Vec<GreenNodeId>)>,
}

impl GreenTreeBuilder {
    pub fn new() -> Self {
        Self {
            arena: GreenNodeArena::new(),
            stack: Vec::new(),
        }
    }

    /// Get a reference to the arena
    pub fn arena(&self) -> &GreenNodeArena {
        &self.arena
    }

    /// Take ownership of the arena
    pub fn into_arena(self) -> GreenNodeArena {
        self.arena
    }

    /// Create a marker at the current position.
    /// Nodes parsed after this point can later be wrapped with `start_node_at`.
    pub fn marker(&self) -> Marker {
        let pos = self
            .stack
            .last()
            .map(|(_, children)| children.len())
            .unwrap_or(0);
        Marker { pos }
    }

    /// Start a new internal node
    pub fn start_node(&mut self, kind: SyntaxKind) {
        self.stack.push((kind, Vec::new()));
    }

    /// Start a new node at a previously saved marker position, wrapping all
    /// nodes parsed since the marker was created.
    pub fn start_node_at(&mut self, marker: Marker, kind: SyntaxKind) {
        if let Some((_, children)) = self.stack.last_mut() {
            let wrapped_children: Vec<_> = children.drain(marker.pos..).collect();
            self.stack.push((kind, wrapped_children));
        } else {
            self.stack.push((kind, Vec::new()));
        }
    }

    /// Add a token as a child
    pub fn add_token(&mut self, token_index: usize) {
        let token_id = self.arena.alloc_token(token_index);
        if let Some((_, children)) = self.stack.last_mut() {
            children.push(token_id);
        }
    }

    /// Finish the current node and add it to its parent
    pub fn finish_node(&mut self) -> Option<GreenNodeId> {
        let (kind, children) = self.stack.pop()?;
        let node_id = self.arena.alloc_internal(kind, children);
        if let Some((_, parent_children)) = self.stack.last_mut() {
            parent_children.push(node_id);
        }
        Some(node_id)
    }

    /// Check if the builder is at the root level
    pub fn is_root(&self) -> bool {
        self.stack.len() <= 1
    }

    /// Close every open node and return the outermost one with the arena.
    /// An empty builder yields an empty node of `kind`.
    pub fn finish_root(mut self, kind: SyntaxKind) -> (GreenNodeId, GreenNodeArena) {
        let mut root = None;
        while let Some(id) = self.finish_node() {
            root = Some(id);
        }
        let root = match root {
            Some(root) => root,
            None => self.arena.alloc_internal(kind, Vec::new()),
        };
        (root, self.arena)
    }
}

impl Default for GreenTreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_green_node_token() {
        let mut arena = GreenNodeArena::new();
        let token_id = arena.alloc_token(3);
        assert_eq!(arena.token_range(token_id), Some((3, 3)));
        assert_eq!(arena.kind(token_id), None);
    }

    #[test]
    fn test_green_node_internal() {
        let mut arena = GreenNodeArena::new();
        let token1 = arena.alloc_token(0);
        let token2 = arena.alloc_token(2);
        let internal = arena.alloc_internal(SyntaxKind::BinaryExpression, vec![token1, token2]);

        assert_eq!(arena.token_range(internal), Some((0, 2)));
        assert_eq!(arena.kind(internal), Some(SyntaxKind::BinaryExpression));
        assert_eq!(arena.children(internal).map(|c| c.len()), Some(2));
    }

    #[test]
    fn test_empty_internal_has_no_range() {
        let mut arena = GreenNodeArena::new();
        let empty = arena.alloc_internal(SyntaxKind::Error, vec![]);
        let tok = arena.alloc_token(4);
        let outer = arena.alloc_internal(SyntaxKind::Block, vec![empty, tok]);
        assert_eq!(arena.token_range(empty), None);
        assert_eq!(arena.token_range(outer), Some((4, 4)));
    }

    #[test]
    fn test_builder() {
        let mut builder = GreenTreeBuilder::new();

        builder.start_node(SyntaxKind::SourceFile);
        builder.start_node(SyntaxKind::NumLiteral);
        builder.add_token(0);
        builder.finish_node();
        let root_id = builder.finish_node().unwrap();

        let arena = builder.arena();
        assert_eq!(arena.kind(root_id), Some(SyntaxKind::SourceFile));
        assert_eq!(arena.token_range(root_id), Some((0, 0)));
    }

    #[test]
    fn test_start_node_at_wraps_previous() {
        let mut builder = GreenTreeBuilder::new();
        builder.start_node(SyntaxKind::SourceFile);
        let marker = builder.marker();
        builder.add_token(0); // "a"
        builder.start_node_at(marker, SyntaxKind::BinaryExpression);
        builder.add_token(2); // "+"
        builder.add_token(4); // "b"
        let bin = builder.finish_node().unwrap();
        let root = builder.finish_node().unwrap();

        let arena = builder.arena();
        assert_eq!(arena.children(root), Some(&[bin][..]));
        assert_eq!(arena.children(bin).map(|c| c.len()), Some(3));
        assert_eq!(arena.token_range(bin), Some((0, 4)));
    }

    #[test]
    fn test_finish_root_closes_open_nodes() {
        let mut builder = GreenTreeBuilder::new();
        builder.start_node(SyntaxKind::SourceFile);
        builder.start_node(SyntaxKind::Block);
        builder.add_token(0);
        let (root, arena) = builder.finish_root(SyntaxKind::SourceFile);
        assert_eq!(arena.kind(root), Some(SyntaxKind::SourceFile));
        assert_eq!(arena.children(root).map(|c| c.len()), Some(1));
    }

    #[test]
    fn test_display_uses_snake_case() {
        assert_eq!(SyntaxKind::BindNamedFields.to_string(), "bind_named_fields");
        assert_eq!(SyntaxKind::FunctionTypeParameters.to_string(), "function_type_parameters");
    }
}
