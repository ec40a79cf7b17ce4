//! Test database wiring: an in-memory client plus setup and teardown functions
//! replaying SQL scripts against it.

use minijinja::context;
use tracing::{debug, info};

use crate::codegen::client::resources::persist_error;
use crate::codegen::snippets;
use crate::error::PersistGenError;
use crate::syntax::{Comment, Function, Import, ModuleMember, Qualifier, Snippet, SourceFile};

const SETUP_FUNCTION: &str = "setupTestDB";
const CLEANUP_FUNCTION: &str = "cleanupTestDB";

/// Generate the test init file from raw SQL scripts.
///
/// Every non-blank script runs in `setupTestDB`; scripts starting with the
/// `DROP` keyword also run in `cleanupTestDB`, in their original order.
pub fn generate_test_init<S: AsRef<str>>(scripts: &[S]) -> Result<SourceFile, PersistGenError> {
    let mut setup = test_function(SETUP_FUNCTION);
    let mut cleanup = test_function(CLEANUP_FUNCTION);

    for script in scripts.iter().map(|s| s.as_ref().trim()) {
        if script.is_empty() {
            continue;
        }
        let statement = execute(script)?;
        if is_drop(script) {
            cleanup.push_statement(statement.clone());
        }
        setup.push_statement(statement);
    }

    info!(
        setup = setup.statements().len(),
        cleanup = cleanup.statements().len(),
        "Generated test init"
    );

    let mut builder = SourceFile::builder();
    builder
        .import(
            Import::new("ballerina", "persist").with_leading_comment(Comment::autogenerated(None)),
        )
        .member(ModuleMember::Snippet(snippets::member(
            snippets::TEST_MOCK_CLIENT,
            context! {},
        )?))
        .member(ModuleMember::Function(setup))
        .member(ModuleMember::Function(cleanup));
    Ok(builder.finish())
}

fn test_function(name: &str) -> Function {
    Function::new(
        name,
        &[Qualifier::Public, Qualifier::Isolated],
        Some(persist_error().optional()),
    )
}

/// `_ = check h2Client->executeNativeSQL(`script`);`
fn execute(script: &str) -> Result<Snippet, PersistGenError> {
    if script.contains('`') || script.contains("${") {
        return Err(PersistGenError::UnembeddableScript {
            script: script.to_string(),
        });
    }
    debug!(script = ?script, "Embedding script");
    snippets::statement(snippets::TEST_EXECUTE, context! { script => script })
}

fn is_drop(script: &str) -> bool {
    let script = strip_leading_comments(script);
    let Some(keyword) = script.get(..4) else {
        return false;
    };
    keyword.eq_ignore_ascii_case("DROP")
        && !script[4..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn strip_leading_comments(mut script: &str) -> &str {
    loop {
        script = script.trim_start();
        if let Some(rest) = script.strip_prefix("--") {
            script = rest.split_once('\n').map_or("", |(_, after)| after);
        } else if let Some(rest) = script.strip_prefix("/*") {
            script = rest.split_once("*/").map_or("", |(_, after)| after);
        } else {
            return script;
        }
    }
}

/// Split a SQL script file into statements on `;`.
///
/// Semicolons inside quoted literals do not split. `--` and `/* */`
/// comments are dropped.
pub fn split_statements(script: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut chars = script.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                current.push(c);
                // doubled quotes close and reopen the literal
                for inner in chars.by_ref() {
                    current.push(inner);
                    if inner == c {
                        break;
                    }
                }
            }
            '-' if chars.peek() == Some(&'-') => {
                for inner in chars.by_ref() {
                    if inner == '\n' {
                        current.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for inner in chars.by_ref() {
                    if prev == '*' && inner == '/' {
                        break;
                    }
                    prev = inner;
                }
                current.push(' ');
            }
            ';' => finish_statement(&mut statements, &mut current),
            c => current.push(c),
        }
    }
    finish_statement(&mut statements, &mut current);

    statements
}

fn finish_statement(statements: &mut Vec<String>, current: &mut String) {
    let statement = current.trim();
    if !statement.is_empty() {
        statements.push(statement.to_string());
    }
    current.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::validate;

    fn texts(function: &Function) -> Vec<String> {
        function.statements().iter().map(|s| s.text()).collect()
    }

    #[test]
    fn test_create_and_drop() {
        let source =
            generate_test_init(&["CREATE TABLE t(id INT)", "DROP TABLE t"]).unwrap();

        let setup = source.function(SETUP_FUNCTION).unwrap();
        assert_eq!(
            texts(setup),
            vec![
                "_ = check h2Client->executeNativeSQL(`CREATE TABLE t(id INT)`);",
                "_ = check h2Client->executeNativeSQL(`DROP TABLE t`);",
            ]
        );
        let cleanup = source.function(CLEANUP_FUNCTION).unwrap();
        assert_eq!(
            texts(cleanup),
            vec!["_ = check h2Client->executeNativeSQL(`DROP TABLE t`);"]
        );
    }

    #[test]
    fn test_all_blank_scripts() {
        let source = generate_test_init(&["", "\n", "   \t"]).unwrap();
        assert!(source.function(SETUP_FUNCTION).unwrap().statements().is_empty());
        assert!(source.function(CLEANUP_FUNCTION).unwrap().statements().is_empty());

        let empty: [&str; 0] = [];
        let source = generate_test_init(&empty).unwrap();
        assert_eq!(source.functions().count(), 2);
    }

    #[test]
    fn test_rendered_file() {
        let scripts = vec![
            "DROP TABLE IF EXISTS t".to_string(),
            "CREATE TABLE t (\n  id INT\n)".to_string(),
        ];
        let text = generate_test_init(&scripts).unwrap().to_string();
        assert_eq!(
            text,
            "// AUTO-GENERATED FILE. DO NOT MODIFY.\n\n\
             // This file is an auto-generated file by Ballerina persistence layer.\n\
             // It should not be modified by hand.\n\n\
             import ballerina/persist;\n\n\
             isolated final H2Client h2Client = check new (\"jdbc:h2:./test\", \"sa\", \"\");\n\n\
             public isolated function setupTestDB() returns persist:Error? {\n    \
             _ = check h2Client->executeNativeSQL(`DROP TABLE IF EXISTS t`);\n    \
             _ = check h2Client->executeNativeSQL(`CREATE TABLE t (\n  id INT\n)`);\n\
             }\n\n\
             public isolated function cleanupTestDB() returns persist:Error? {\n    \
             _ = check h2Client->executeNativeSQL(`DROP TABLE IF EXISTS t`);\n\
             }\n"
        );
        assert!(validate(&text).is_empty());
    }

    #[test]
    fn test_drop_classification() {
        assert!(is_drop("DROP TABLE t"));
        assert!(is_drop("drop table t"));
        assert!(is_drop("DROP"));
        assert!(!is_drop("DROPPED_ROWS"));
        assert!(!is_drop("CREATE TABLE drop_log(id INT)"));
        assert!(!is_drop("DRO"));

        let source = generate_test_init(&["  drop table t  "]).unwrap();
        assert_eq!(source.function(CLEANUP_FUNCTION).unwrap().statements().len(), 1);
    }

    #[test]
    fn test_unembeddable_script() {
        assert!(matches!(
            generate_test_init(&["SELECT `x` FROM t"]),
            Err(PersistGenError::UnembeddableScript { .. })
        ));
        assert!(matches!(
            generate_test_init(&["SELECT '${x}'"]),
            Err(PersistGenError::UnembeddableScript { .. })
        ));
    }

    #[test]
    fn test_split_statements() {
        let statements = split_statements("DROP TABLE IF EXISTS t;\n\nCREATE TABLE t (\n  id INT\n);\n");
        assert_eq!(
            statements,
            vec!["DROP TABLE IF EXISTS t", "CREATE TABLE t (\n  id INT\n)"]
        );
        assert!(split_statements(" ;\n; ").is_empty());
    }

    #[test]
    fn test_split_keeps_semicolons_in_literals() {
        assert_eq!(
            split_statements("INSERT INTO t VALUES ('a;b');\nDROP TABLE t;"),
            vec!["INSERT INTO t VALUES ('a;b')", "DROP TABLE t"]
        );
        assert_eq!(
            split_statements("INSERT INTO t VALUES ('it''s; fine', \"x;y\");"),
            vec!["INSERT INTO t VALUES ('it''s; fine', \"x;y\")"]
        );
    }

    #[test]
    fn test_split_drops_comments() {
        assert_eq!(
            split_statements("-- schema;\nCREATE TABLE t(id INT); /* done; */\n-- teardown\nDROP TABLE t;"),
            vec!["CREATE TABLE t(id INT)", "DROP TABLE t"]
        );
        assert!(split_statements("-- only a comment;\n/* and; another */").is_empty());
    }

    #[test]
    fn test_commented_drop_reaches_cleanup() {
        let statements = split_statements("CREATE TABLE t(id INT);\n-- teardown\nDROP TABLE t;");
        let source = generate_test_init(&statements).unwrap();
        assert_eq!(
            texts(source.function(CLEANUP_FUNCTION).unwrap()),
            vec!["_ = check h2Client->executeNativeSQL(`DROP TABLE t`);"]
        );

        let source = generate_test_init(&["-- teardown\nDROP TABLE t", "/* x */ drop table u"]).unwrap();
        assert_eq!(source.function(CLEANUP_FUNCTION).unwrap().statements().len(), 2);
        assert!(!is_drop("-- DROP TABLE t\nCREATE TABLE t(id INT)"));
    }
}
