//! Canned source snippets
//!
//! Every fixed fragment of generated code is a minijinja template registered
//! once per process. Rendered text is parsed into a [`Snippet`] before it is
//! attached to a tree, so a broken template surfaces as
//! [`PersistGenError::MalformedSnippet`] instead of broken output.

use std::sync::LazyLock;

use minijinja::{Environment, UndefinedBehavior, Value};
use tracing::trace;

use crate::error::PersistGenError;
use crate::syntax::{self, Snippet, SyntaxError};

pub(crate) const CONFIG_URL: &str = "config/url";
pub(crate) const CONFIG_PORT: &str = "config/port";
pub(crate) const CONFIG_HOST: &str = "config/host";
pub(crate) const CONFIG_USER: &str = "config/user";
pub(crate) const CONFIG_DATABASE: &str = "config/database";
pub(crate) const CONFIG_PASSWORD: &str = "config/password";
pub(crate) const CONFIG_OPTIONS: &str = "config/options";
pub(crate) const CONFIG_DEFAULT_SCHEMA: &str = "config/default_schema";

pub(crate) const CLIENT_ABSTRACT: &str = "client/abstract";
pub(crate) const CLIENT_DB_FIELD: &str = "client/db_field";
pub(crate) const CLIENT_PERSIST_CLIENTS: &str = "client/persist_clients";
pub(crate) const CLIENT_METADATA: &str = "client/metadata";
pub(crate) const CLIENT_INIT: &str = "client/init";
pub(crate) const CLIENT_EXTERNAL: &str = "client/external";
pub(crate) const CLIENT_POST: &str = "client/post";
pub(crate) const CLIENT_PUT: &str = "client/put";
pub(crate) const CLIENT_DELETE: &str = "client/delete";
pub(crate) const CLIENT_CLOSE: &str = "client/close";

pub(crate) const TEST_MOCK_CLIENT: &str = "test/mock_client";
pub(crate) const TEST_EXECUTE: &str = "test/execute";

/// One-line snippets
const INLINE: &[(&str, &str)] = &[
    (CONFIG_URL, "configurable string url = ?;"),
    (CONFIG_PORT, "configurable int port = ?;"),
    (CONFIG_HOST, "configurable string host = ?;"),
    (CONFIG_USER, "configurable string user = ?;"),
    (CONFIG_DATABASE, "configurable string database = ?;"),
    (CONFIG_PASSWORD, "configurable string password = ?;"),
    (
        CONFIG_OPTIONS,
        "configurable {{ prefix }}:Options & readonly connectionOptions = {};",
    ),
    (CONFIG_DEFAULT_SCHEMA, "configurable string? defaultSchema = ();"),
    (CLIENT_ABSTRACT, "*persist:AbstractPersistClient;"),
    (CLIENT_DB_FIELD, "private final {{ client_type }} dbClient;"),
    (
        CLIENT_PERSIST_CLIENTS,
        "private final map<psql:SQLClient> persistClients;",
    ),
    (
        TEST_MOCK_CLIENT,
        "isolated final H2Client h2Client = check new (\"jdbc:h2:./test\", \"sa\", \"\");",
    ),
    (
        TEST_EXECUTE,
        "_ = check h2Client->executeNativeSQL(`{{ script }}`);",
    ),
];

static SNIPPETS: LazyLock<Environment<'static>> = LazyLock::new(|| {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.set_undefined_behavior(UndefinedBehavior::Strict);

    for &(name, source) in INLINE {
        env.add_template(name, source)
            .expect("Failed to load inline snippet");
    }

    env.add_template(CLIENT_METADATA, include_str!("templates/metadata.bal.jinja"))
        .expect("Failed to load metadata template");
    env.add_template(CLIENT_INIT, include_str!("templates/init.bal.jinja"))
        .expect("Failed to load init template");
    env.add_template(CLIENT_EXTERNAL, include_str!("templates/external.bal.jinja"))
        .expect("Failed to load external template");
    env.add_template(CLIENT_POST, include_str!("templates/post.bal.jinja"))
        .expect("Failed to load post template");
    env.add_template(CLIENT_PUT, include_str!("templates/put.bal.jinja"))
        .expect("Failed to load put template");
    env.add_template(CLIENT_DELETE, include_str!("templates/delete.bal.jinja"))
        .expect("Failed to load delete template");
    env.add_template(CLIENT_CLOSE, include_str!("templates/close.bal.jinja"))
        .expect("Failed to load close template");

    env
});

/// Render a snippet template to text
pub(crate) fn render(name: &str, ctx: Value) -> Result<String, PersistGenError> {
    let template = SNIPPETS
        .get_template(name)
        .map_err(|e| malformed(name, format!("Template error: {}", e)))?;

    let text = template
        .render(ctx)
        .map_err(|e| malformed(name, format!("Render error: {}", e)))?;
    trace!(snippet = name, text = ?text, "Rendered snippet");
    Ok(text)
}

pub(crate) fn statement(name: &str, ctx: Value) -> Result<Snippet, PersistGenError> {
    let text = render(name, ctx)?;
    syntax::parse_statement(&text).map_err(|e| parse_failure(name, e))
}

pub(crate) fn statements(name: &str, ctx: Value) -> Result<Vec<Snippet>, PersistGenError> {
    let text = render(name, ctx)?;
    syntax::parse_statements(&text).map_err(|e| parse_failure(name, e))
}

pub(crate) fn member(name: &str, ctx: Value) -> Result<Snippet, PersistGenError> {
    let text = render(name, ctx)?;
    syntax::parse_member(&text).map_err(|e| parse_failure(name, e))
}

pub(crate) fn annotation(name: &str, ctx: Value) -> Result<Snippet, PersistGenError> {
    let text = render(name, ctx)?;
    syntax::parse_annotation(&text).map_err(|e| parse_failure(name, e))
}

fn malformed(name: &str, message: String) -> PersistGenError {
    PersistGenError::MalformedSnippet {
        snippet: name.to_string(),
        message,
    }
}

fn parse_failure(name: &str, err: SyntaxError) -> PersistGenError {
    malformed(name, format!("Parse error: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    #[test]
    fn test_inline_snippets_parse_as_members() {
        for name in [
            CONFIG_URL,
            CONFIG_PORT,
            CONFIG_HOST,
            CONFIG_USER,
            CONFIG_DATABASE,
            CONFIG_PASSWORD,
            CONFIG_DEFAULT_SCHEMA,
            CLIENT_ABSTRACT,
            CLIENT_PERSIST_CLIENTS,
            TEST_MOCK_CLIENT,
        ] {
            let snippet = member(name, context! {}).unwrap();
            assert_eq!(snippet.lines().len(), 1, "{name}");
        }
    }

    #[test]
    fn test_options_snippet() {
        let snippet = member(CONFIG_OPTIONS, context! { prefix => "mysql" }).unwrap();
        assert_eq!(
            snippet.text(),
            "configurable mysql:Options & readonly connectionOptions = {};"
        );
    }

    #[test]
    fn test_missing_variable_is_malformed() {
        let err = member(CONFIG_OPTIONS, context! {}).unwrap_err();
        assert!(matches!(
            err,
            PersistGenError::MalformedSnippet { ref snippet, .. } if snippet == CONFIG_OPTIONS
        ));
    }

    #[test]
    fn test_unknown_template_is_malformed() {
        assert!(matches!(
            render("client/missing", context! {}),
            Err(PersistGenError::MalformedSnippet { .. })
        ));
    }

    #[test]
    fn test_external_annotation() {
        let with_method = annotation(
            CLIENT_EXTERNAL,
            context! { processor => "P", method => Some("query") },
        )
        .unwrap();
        assert_eq!(
            with_method.text(),
            "@java:Method {\n    'class: \"P\",\n    name: \"query\"\n}"
        );

        let without = annotation(
            CLIENT_EXTERNAL,
            context! { processor => "P", method => None::<&str> },
        )
        .unwrap();
        assert_eq!(without.text(), "@java:Method {\n    'class: \"P\"\n}");
    }

    #[test]
    fn test_close_body_statements() {
        let body = statements(CLIENT_CLOSE, context! {}).unwrap();
        assert_eq!(body.len(), 3);
        assert_eq!(body[2].text(), "return result;");
    }

    #[test]
    fn test_execute_embeds_script() {
        let stmt = statement(TEST_EXECUTE, context! { script => "DROP TABLE t" }).unwrap();
        assert_eq!(
            stmt.text(),
            "_ = check h2Client->executeNativeSQL(`DROP TABLE t`);"
        );
    }
}
