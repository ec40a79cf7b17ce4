//! Structural source tree
//!
//! Generated artifacts are assembled from these nodes rather than concatenated
//! text. Free-form fragments only enter the tree as [`Snippet`]s, which have
//! been lexed and checked for balanced delimiters and a terminator first.
//! Trees are built in growable buffers and frozen into [`SourceFile`] once.

pub mod lexer;
mod render;

pub use lexer::{
    parse_annotation, parse_member, parse_statement, parse_statements, validate, SyntaxError,
};
pub(crate) use render::{identifier, string_literal};

/// A parsed, dedented fragment: a statement, a member or an annotation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snippet {
    pub(crate) lines: Vec<SnippetLine>,
}

/// One line of a snippet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetLine {
    pub text: String,
    /// Line starts inside a template literal and must not be re-indented
    pub verbatim: bool,
}

impl Snippet {
    pub fn lines(&self) -> &[SnippetLine] {
        &self.lines
    }

    /// Source text at zero indentation
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Line comment block attached ahead of a node. Empty lines stay blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub lines: Vec<String>,
}

impl Comment {
    /// Banner placed on top of every generated file
    pub fn autogenerated(subject: Option<&str>) -> Self {
        let origin = match subject {
            Some(subject) => format!(
                "This file is an auto-generated file by Ballerina persistence layer for {subject}."
            ),
            None => "This file is an auto-generated file by Ballerina persistence layer.".to_string(),
        };
        Self {
            lines: vec![
                "AUTO-GENERATED FILE. DO NOT MODIFY.".to_string(),
                String::new(),
                origin,
                "It should not be modified by hand.".to_string(),
            ],
        }
    }
}

/// `import org/module [as prefix];`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub org: String,
    /// Dotted module name, e.g. `persist.sql`
    pub module: String,
    pub prefix: Option<String>,
    pub leading_comment: Option<Comment>,
}

impl Import {
    pub fn new(org: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            org: org.into(),
            module: module.into(),
            prefix: None,
            leading_comment: None,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_leading_comment(mut self, comment: Comment) -> Self {
        self.leading_comment = Some(comment);
        self
    }
}

/// Type descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDesc {
    Named {
        module: Option<String>,
        name: String,
    },
    Optional(Box<TypeDesc>),
    Array(Box<TypeDesc>),
    Union(Vec<TypeDesc>),
    Tuple(Vec<TypeDesc>),
    Stream(Box<TypeDesc>, Box<TypeDesc>),
    Typedesc(Box<TypeDesc>),
    /// `record {}`
    OpenRecord,
}

impl TypeDesc {
    pub fn named(name: impl Into<String>) -> Self {
        TypeDesc::Named {
            module: None,
            name: name.into(),
        }
    }

    pub fn qualified(module: impl Into<String>, name: impl Into<String>) -> Self {
        TypeDesc::Named {
            module: Some(module.into()),
            name: name.into(),
        }
    }

    pub fn optional(self) -> Self {
        TypeDesc::Optional(Box::new(self))
    }

    pub fn array(self) -> Self {
        TypeDesc::Array(Box::new(self))
    }

    pub fn or(self, other: TypeDesc) -> Self {
        match self {
            TypeDesc::Union(mut members) => {
                members.push(other);
                TypeDesc::Union(members)
            }
            single => TypeDesc::Union(vec![single, other]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qualifier {
    Public,
    Private,
    Isolated,
    Remote,
    Resource,
    Client,
    Final,
}

impl Qualifier {
    pub fn as_str(self) -> &'static str {
        match self {
            Qualifier::Public => "public",
            Qualifier::Private => "private",
            Qualifier::Isolated => "isolated",
            Qualifier::Remote => "remote",
            Qualifier::Resource => "resource",
            Qualifier::Client => "client",
            Qualifier::Final => "final",
        }
    }
}

/// Function parameter, optionally defaulted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub ty: TypeDesc,
    pub name: String,
    pub default: Option<String>,
}

impl Param {
    pub fn new(ty: TypeDesc, name: impl Into<String>) -> Self {
        Self {
            ty,
            name: name.into(),
            default: None,
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// Segment of a resource path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Name(String),
    Param { ty: TypeDesc, name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunctionKind {
    Named(String),
    Resource {
        accessor: String,
        path: Vec<PathSegment>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunctionBody {
    Block(Vec<Snippet>),
    /// `= <annotation> external;`
    External(Snippet),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub qualifiers: Vec<Qualifier>,
    pub kind: FunctionKind,
    pub params: Vec<Param>,
    pub returns: Option<TypeDesc>,
    pub body: FunctionBody,
}

impl Function {
    pub fn new(name: impl Into<String>, qualifiers: &[Qualifier], returns: Option<TypeDesc>) -> Self {
        Self {
            qualifiers: qualifiers.to_vec(),
            kind: FunctionKind::Named(name.into()),
            params: Vec::new(),
            returns,
            body: FunctionBody::Block(Vec::new()),
        }
    }

    pub fn resource(
        accessor: impl Into<String>,
        path: Vec<PathSegment>,
        qualifiers: &[Qualifier],
        returns: Option<TypeDesc>,
    ) -> Self {
        Self {
            kind: FunctionKind::Resource {
                accessor: accessor.into(),
                path,
            },
            ..Self::new(String::new(), qualifiers, returns)
        }
    }

    pub fn with_param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    pub fn with_params(mut self, params: impl IntoIterator<Item = Param>) -> Self {
        self.params.extend(params);
        self
    }

    /// Append a statement; turns an external body back into a block
    pub fn push_statement(&mut self, statement: Snippet) {
        match &mut self.body {
            FunctionBody::Block(statements) => statements.push(statement),
            FunctionBody::External(_) => self.body = FunctionBody::Block(vec![statement]),
        }
    }

    pub fn with_statements(mut self, statements: impl IntoIterator<Item = Snippet>) -> Self {
        for statement in statements {
            self.push_statement(statement);
        }
        self
    }

    pub fn external(mut self, annotation: Snippet) -> Self {
        self.body = FunctionBody::External(annotation);
        self
    }

    /// Plain name, or the accessor for resource functions
    pub fn name(&self) -> &str {
        match &self.kind {
            FunctionKind::Named(name) => name,
            FunctionKind::Resource { accessor, .. } => accessor,
        }
    }

    pub fn is_resource(&self) -> bool {
        matches!(self.kind, FunctionKind::Resource { .. })
    }

    /// Statements of a block body; external bodies have none
    pub fn statements(&self) -> &[Snippet] {
        match &self.body {
            FunctionBody::Block(statements) => statements,
            FunctionBody::External(_) => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassMember {
    Field(Snippet),
    Function(Function),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDef {
    pub qualifiers: Vec<Qualifier>,
    pub name: String,
    pub members: Vec<ClassMember>,
}

impl ClassDef {
    pub fn new(name: impl Into<String>, qualifiers: &[Qualifier]) -> Self {
        Self {
            qualifiers: qualifiers.to_vec(),
            name: name.into(),
            members: Vec::new(),
        }
    }

    pub fn push_member(&mut self, member: ClassMember) {
        self.members.push(member);
    }

    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.members.iter().filter_map(|m| match m {
            ClassMember::Function(f) => Some(f),
            ClassMember::Field(_) => None,
        })
    }
}

/// `const NAME = "value";`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstDecl {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDecl {
    pub name: String,
    pub members: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordField {
    Field {
        readonly: bool,
        ty: TypeDesc,
        name: String,
        optional: bool,
    },
    /// `*Other;`
    Inclusion(TypeDesc),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeBody {
    /// Closed record `record {| ... |}`
    Record(Vec<RecordField>),
    Alias(TypeDesc),
}

/// `public type Name <body>;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDefinition {
    pub name: String,
    pub body: TypeBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleMember {
    Const(ConstDecl),
    Enum(EnumDecl),
    Type(TypeDefinition),
    Class(ClassDef),
    Function(Function),
    Snippet(Snippet),
}

/// A finished source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    imports: Vec<Import>,
    /// Rendered ahead of the members when there are no imports to carry it
    leading_comment: Option<Comment>,
    members: Vec<ModuleMember>,
}

impl SourceFile {
    pub fn builder() -> SourceFileBuilder {
        SourceFileBuilder::default()
    }

    pub fn imports(&self) -> &[Import] {
        &self.imports
    }

    pub fn members(&self) -> &[ModuleMember] {
        &self.members
    }

    pub fn leading_comment(&self) -> Option<&Comment> {
        self.leading_comment.as_ref()
    }

    pub fn class(&self, name: &str) -> Option<&ClassDef> {
        self.members.iter().find_map(|m| match m {
            ModuleMember::Class(class) if class.name == name => Some(class),
            _ => None,
        })
    }

    /// Module-level functions
    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.members.iter().filter_map(|m| match m {
            ModuleMember::Function(f) => Some(f),
            _ => None,
        })
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions().find(|f| f.name() == name)
    }
}

#[derive(Debug, Default)]
pub struct SourceFileBuilder {
    imports: Vec<Import>,
    leading_comment: Option<Comment>,
    members: Vec<ModuleMember>,
}

impl SourceFileBuilder {
    pub fn import(&mut self, import: Import) -> &mut Self {
        self.imports.push(import);
        self
    }

    pub fn leading_comment(&mut self, comment: Comment) -> &mut Self {
        self.leading_comment = Some(comment);
        self
    }

    pub fn member(&mut self, member: ModuleMember) -> &mut Self {
        self.members.push(member);
        self
    }

    pub fn finish(self) -> SourceFile {
        SourceFile {
            imports: self.imports,
            leading_comment: self.leading_comment,
            members: self.members,
        }
    }
}
