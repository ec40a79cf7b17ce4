//! Serialization of the source tree to text

use std::borrow::Cow;
use std::fmt;

use super::{
    ClassDef, ClassMember, Comment, EnumDecl, Function, FunctionBody, FunctionKind, Import,
    ModuleMember, PathSegment, RecordField, Snippet, SourceFile, TypeBody, TypeDefinition,
    TypeDesc,
};

const INDENT: &str = "    ";

/// Words that cannot appear as bare identifiers
const RESERVED_WORDS: &[&str] = &[
    "abstract", "all", "annotation", "any", "anydata", "as", "ascending", "boolean", "break",
    "by", "byte", "check", "checkpanic", "class", "client", "commit", "configurable", "const",
    "continue", "decimal", "default", "descending", "distinct", "do", "else", "enum", "equals",
    "error", "external", "fail", "false", "final", "float", "foreach", "fork", "from",
    "function", "future", "handle", "if", "import", "in", "int", "is", "isolated", "join",
    "json", "let", "limit", "listener", "lock", "map", "match", "never", "new", "null",
    "object", "on", "order", "outer", "panic", "private", "public", "readonly", "record",
    "remote", "resource", "retry", "return", "returns", "rollback", "select", "service",
    "source", "start", "stream", "string", "table", "transaction", "trap", "true", "type",
    "typedesc", "typeof", "var", "wait", "where", "while", "worker", "xml", "xmlns",
];

impl fmt::Display for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();

        if self.imports.is_empty() {
            if let Some(comment) = &self.leading_comment {
                write_comment(&mut out, comment);
            }
        }
        for import in &self.imports {
            write_import(&mut out, import);
        }

        let mut prev: Option<&ModuleMember> = None;
        for member in &self.members {
            // runs of constants or declarations stay grouped
            let grouped = matches!(
                (prev, member),
                (Some(ModuleMember::Const(_)), ModuleMember::Const(_))
                    | (Some(ModuleMember::Snippet(_)), ModuleMember::Snippet(_))
            );
            if (prev.is_some() || !self.imports.is_empty()) && !grouped {
                out.push('\n');
            }
            write_member(&mut out, member);
            prev = Some(member);
        }

        f.write_str(&out)
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDesc::Named {
                module: Some(module),
                name,
            } => write!(f, "{module}:{name}"),
            TypeDesc::Named { module: None, name } => f.write_str(name),
            TypeDesc::Optional(inner) => write!(f, "{}?", Grouped(inner)),
            TypeDesc::Array(inner) => write!(f, "{}[]", Grouped(inner)),
            TypeDesc::Union(members) => write_joined(f, members, "|"),
            TypeDesc::Tuple(members) => {
                f.write_str("[")?;
                write_joined(f, members, ", ")?;
                f.write_str("]")
            }
            TypeDesc::Stream(row, completion) => write!(f, "stream<{row}, {completion}>"),
            TypeDesc::Typedesc(inner) => write!(f, "typedesc<{inner}>"),
            TypeDesc::OpenRecord => f.write_str("record {}"),
        }
    }
}

/// Parenthesizes unions used as an operand of `?` or `[]`
struct Grouped<'a>(&'a TypeDesc);

impl fmt::Display for Grouped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            TypeDesc::Union(_) => write!(f, "({})", self.0),
            other => write!(f, "{other}"),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[TypeDesc], sep: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

fn write_comment(out: &mut String, comment: &Comment) {
    for line in &comment.lines {
        if !line.is_empty() {
            out.push_str("// ");
            out.push_str(line);
        }
        out.push('\n');
    }
    out.push('\n');
}

fn write_import(out: &mut String, import: &Import) {
    if let Some(comment) = &import.leading_comment {
        write_comment(out, comment);
    }
    out.push_str(&format!("import {}/{}", import.org, import.module));
    if let Some(prefix) = &import.prefix {
        out.push_str(" as ");
        out.push_str(prefix);
    }
    out.push_str(";\n");
}

fn write_member(out: &mut String, member: &ModuleMember) {
    match member {
        ModuleMember::Const(c) => {
            out.push_str(&format!("const {} = {};\n", c.name, string_literal(&c.value)));
        }
        ModuleMember::Enum(e) => write_enum(out, e),
        ModuleMember::Type(t) => write_type_definition(out, t),
        ModuleMember::Class(class) => write_class(out, class),
        ModuleMember::Function(function) => write_function(out, function, 0),
        ModuleMember::Snippet(snippet) => write_snippet(out, snippet, 0),
    }
}

fn write_enum(out: &mut String, decl: &EnumDecl) {
    out.push_str(&format!("public enum {} {{\n", decl.name));
    let members: Vec<String> = decl
        .members
        .iter()
        .map(|m| format!("{INDENT}{}", identifier(m)))
        .collect();
    out.push_str(&members.join(",\n"));
    out.push_str("\n}\n");
}

fn write_type_definition(out: &mut String, def: &TypeDefinition) {
    match &def.body {
        TypeBody::Alias(ty) => out.push_str(&format!("public type {} {ty};\n", def.name)),
        TypeBody::Record(fields) => {
            out.push_str(&format!("public type {} record {{|\n", def.name));
            for field in fields {
                out.push_str(INDENT);
                match field {
                    RecordField::Inclusion(ty) => out.push_str(&format!("*{ty};\n")),
                    RecordField::Field {
                        readonly,
                        ty,
                        name,
                        optional,
                    } => {
                        if *readonly {
                            out.push_str("readonly ");
                        }
                        out.push_str(&format!("{ty} {}", identifier(name)));
                        if *optional {
                            out.push('?');
                        }
                        out.push_str(";\n");
                    }
                }
            }
            out.push_str("|};\n");
        }
    }
}

fn write_class(out: &mut String, class: &ClassDef) {
    out.push_str(&qualifier_prefix(&class.qualifiers));
    out.push_str(&format!("class {} {{\n", class.name));
    for (i, member) in class.members.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        match member {
            ClassMember::Field(snippet) => write_snippet(out, snippet, 1),
            ClassMember::Function(function) => write_function(out, function, 1),
        }
    }
    out.push_str("}\n");
}

fn write_function(out: &mut String, function: &Function, level: usize) {
    let indent = INDENT.repeat(level);
    out.push_str(&indent);
    out.push_str(&qualifier_prefix(&function.qualifiers));
    out.push_str("function ");

    match &function.kind {
        FunctionKind::Named(name) => out.push_str(name),
        FunctionKind::Resource { accessor, path } => {
            let segments: Vec<String> = path
                .iter()
                .map(|segment| match segment {
                    PathSegment::Name(name) => identifier(name).into_owned(),
                    PathSegment::Param { ty, name } => format!("[{ty} {}]", identifier(name)),
                })
                .collect();
            out.push_str(&format!("{accessor} {}", segments.join("/")));
        }
    }

    let params: Vec<String> = function
        .params
        .iter()
        .map(|p| match &p.default {
            Some(default) => format!("{} {} = {default}", p.ty, identifier(&p.name)),
            None => format!("{} {}", p.ty, identifier(&p.name)),
        })
        .collect();
    out.push_str(&format!("({})", params.join(", ")));

    if let Some(returns) = &function.returns {
        out.push_str(&format!(" returns {returns}"));
    }

    match &function.body {
        FunctionBody::Block(statements) => {
            out.push_str(" {\n");
            for statement in statements {
                write_snippet(out, statement, level + 1);
            }
            out.push_str(&indent);
            out.push_str("}\n");
        }
        FunctionBody::External(annotation) => {
            out.push_str(" = ");
            let mut annotated = String::new();
            write_snippet(&mut annotated, annotation, level);
            // first line continues the signature
            let annotated = annotated.trim_start().trim_end_matches('\n');
            out.push_str(annotated);
            out.push_str(" external;\n");
        }
    }
}

fn write_snippet(out: &mut String, snippet: &Snippet, level: usize) {
    let indent = INDENT.repeat(level);
    for line in &snippet.lines {
        if !line.verbatim && !line.text.is_empty() {
            out.push_str(&indent);
        }
        out.push_str(&line.text);
        out.push('\n');
    }
}

fn qualifier_prefix(qualifiers: &[super::Qualifier]) -> String {
    qualifiers
        .iter()
        .map(|q| format!("{} ", q.as_str()))
        .collect()
}

/// Identifier as written in source, quoted with `'` when it is a reserved word
pub(crate) fn identifier(name: &str) -> Cow<'_, str> {
    if RESERVED_WORDS.contains(&name) {
        Cow::Owned(format!("'{name}"))
    } else {
        Cow::Borrowed(name)
    }
}

/// Double-quoted string literal with escapes
pub(crate) fn string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
