//! Connector-binding checks, run only with full [`SolutionContext`].
//!
//! Verifies that bridged tools bind to declared connectors, that stdio
//! connectors ship source code, that sources only import modules a manifest
//! declares, that launch args avoid the retired filesystem layout, and that
//! UI-capable connectors implement the plugin surface. The source scans are
//! heuristics over file text, not a module resolver.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use skillforge_domain::issue::{codes, Issue};
use skillforge_domain::solution::{ConnectorDecl, SolutionContext, SolutionDoc, SourceFile};

/// The retired connector layout; launches from here no longer work
const DEPRECATED_PATH_PREFIX: &str = "/opt/mcp-connectors/";

/// Node builtins that need no manifest entry
const NODE_BUILTINS: &[&str] = &[
    "assert", "buffer", "child_process", "crypto", "dns", "events", "fs", "http", "https", "net",
    "os", "path", "process", "querystring", "readline", "stream", "string_decoder", "timers",
    "tty", "url", "util", "worker_threads", "zlib",
];

static REQUIRE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"require\(\s*['"]([^'"]+)['"]\s*\)"#).unwrap());

static IMPORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"import\s+(?:[^'"]*?\s+from\s+)?['"]([^'"]+)['"]"#).unwrap());

static PLUGINS_WRAPPER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"plugins\s*:").unwrap());
static PLUGIN_WRAPPER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"plugin\s*:").unwrap());

/// Run every context-dependent check, appending to `issues`.
pub fn validate_connector_bindings(
    _solution: &SolutionDoc,
    ctx: &SolutionContext,
    issues: &mut Vec<Issue>,
) {
    check_tool_bindings(ctx, issues);

    for connector in &ctx.connectors {
        check_launch_args(connector, issues);

        if connector.transport == "stdio" {
            match ctx.mcp_store.get(&connector.id).filter(|files| !files.is_empty()) {
                None => {
                    issues.push(
                        Issue::error(
                            codes::CONNECTOR_SOURCE_MISSING,
                            format!("connectors.{}", connector.id),
                            format!(
                                "stdio connector '{}' has no source code in the store",
                                connector.id
                            ),
                        )
                        .with_suggestion("upload the connector's server source before deploying"),
                    );
                }
                Some(files) => check_imports(connector, files, issues),
            }
        }

        if connector.ui_capable {
            check_ui_capability(connector, ctx, issues);
        }
    }
}

fn check_tool_bindings(ctx: &SolutionContext, issues: &mut Vec<Issue>) {
    for (skill_id, skill) in &ctx.skills {
        for (idx, tool) in skill.tools.iter().enumerate() {
            if tool.source.kind != "mcp_bridge" {
                continue;
            }
            let path = format!("skills.{skill_id}.tools[{idx}].source.connection_id");
            match tool.source.connection_id.as_deref().filter(|id| !id.is_empty()) {
                None => issues.push(Issue::error(
                    codes::CONNECTOR_NOT_FOUND,
                    path,
                    format!("bridged tool '{}' declares no connection_id", tool.id),
                )),
                Some(connection) if ctx.connector(connection).is_none() => {
                    issues.push(Issue::error(
                        codes::CONNECTOR_NOT_FOUND,
                        path,
                        format!(
                            "bridged tool '{}' binds to undeclared connector '{connection}'",
                            tool.id
                        ),
                    ));
                }
                Some(_) => {}
            }
        }
    }
}

fn check_launch_args(connector: &ConnectorDecl, issues: &mut Vec<Issue>) {
    let command = connector.command.as_deref().unwrap_or("");
    for (idx, arg) in std::iter::once(command)
        .chain(connector.args.iter().map(String::as_str))
        .enumerate()
    {
        if arg.starts_with(DEPRECATED_PATH_PREFIX) {
            issues.push(
                Issue::error(
                    codes::CONNECTOR_DEPRECATED_PATH,
                    format!("connectors.{}.args", connector.id),
                    format!(
                        "connector '{}' launches from the retired {DEPRECATED_PATH_PREFIX} layout",
                        connector.id
                    ),
                )
                .with_suggestion("move the server into the managed connector store"),
            );
            return; // one report per connector; a mismatch warning would be noise
        }
        // skip the command itself for the id/path agreement check
        if idx == 0 {
            continue;
        }
        if let Some(parent) = script_parent_dir(arg) {
            if parent != connector.id {
                issues.push(Issue::warning(
                    codes::CONNECTOR_PATH_MISMATCH,
                    format!("connectors.{}.args", connector.id),
                    format!(
                        "script path '{arg}' sits under '{parent}', not under connector id '{}'",
                        connector.id
                    ),
                ));
            }
        }
    }
}

/// Parent directory of a script-looking argument, if it has one
fn script_parent_dir(arg: &str) -> Option<&str> {
    let is_script = [".js", ".mjs", ".cjs", ".ts", ".py"]
        .iter()
        .any(|ext| arg.ends_with(ext));
    if !is_script || !arg.contains('/') {
        return None;
    }
    let mut components = arg.rsplit('/');
    components.next(); // the file itself
    components.next().filter(|c| !c.is_empty())
}

fn manifest_dependencies(files: &[SourceFile]) -> Option<BTreeSet<String>> {
    let manifest = files
        .iter()
        .find(|f| f.path == "package.json" || f.path.ends_with("/package.json"))?;
    let parsed: serde_json::Value = serde_json::from_str(&manifest.content).unwrap_or_default();

    let mut declared = BTreeSet::new();
    for section in ["dependencies", "devDependencies"] {
        if let Some(deps) = parsed.get(section).and_then(|v| v.as_object()) {
            declared.extend(deps.keys().cloned());
        }
    }
    Some(declared)
}

/// Package name of an import specifier (`@scope/name/deep` → `@scope/name`)
fn package_of(specifier: &str) -> &str {
    let trimmed = specifier.strip_prefix("node:").unwrap_or(specifier);
    let mut parts = trimmed.splitn(3, '/');
    let first = parts.next().unwrap_or(trimmed);
    if first.starts_with('@') {
        match parts.next() {
            Some(second) => &trimmed[..first.len() + 1 + second.len()],
            None => first,
        }
    } else {
        first
    }
}

fn check_imports(connector: &ConnectorDecl, files: &[SourceFile], issues: &mut Vec<Issue>) {
    let declared = manifest_dependencies(files);

    let mut reported: BTreeSet<String> = BTreeSet::new();
    for file in files {
        let is_source = [".js", ".mjs", ".cjs", ".ts"]
            .iter()
            .any(|ext| file.path.ends_with(ext));
        if !is_source {
            continue;
        }

        let imports = REQUIRE_RE
            .captures_iter(&file.content)
            .chain(IMPORT_RE.captures_iter(&file.content))
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str());

        for specifier in imports {
            if specifier.starts_with("./") || specifier.starts_with("../") {
                continue;
            }
            let package = package_of(specifier);
            if NODE_BUILTINS.contains(&package) || !reported.insert(package.to_string()) {
                continue;
            }

            match &declared {
                None => issues.push(Issue::error(
                    codes::CONNECTOR_DEP_MISSING,
                    format!("mcp_store.{}.{}", connector.id, file.path),
                    format!(
                        "connector '{}' imports '{package}' but ships no package.json",
                        connector.id
                    ),
                )),
                Some(deps) if !deps.contains(package) => issues.push(Issue::warning(
                    codes::CONNECTOR_DEP_MISSING,
                    format!("mcp_store.{}.{}", connector.id, file.path),
                    format!(
                        "connector '{}' imports '{package}' but package.json does not declare it",
                        connector.id
                    ),
                )),
                Some(_) => {}
            }
        }
    }
}

fn check_ui_capability(connector: &ConnectorDecl, ctx: &SolutionContext, issues: &mut Vec<Issue>) {
    if connector.transport != "stdio" {
        issues.push(Issue::error(
            codes::UI_TRANSPORT_NOT_STDIO,
            format!("connectors.{}.transport", connector.id),
            format!(
                "UI-capable connector '{}' must use stdio transport, not '{}'",
                connector.id, connector.transport
            ),
        ));
    }

    let Some(files) = ctx.mcp_store.get(&connector.id) else {
        return; // source-missing already reported for stdio connectors
    };
    let source: String = files.iter().map(|f| f.content.as_str()).collect();

    for (tool, wrapper_re, wrapper) in [
        ("ui.listPlugins", &PLUGINS_WRAPPER_RE, "{ plugins: [...] }"),
        ("ui.getPlugin", &PLUGIN_WRAPPER_RE, "{ plugin: {...} }"),
    ] {
        if !source.contains(tool) {
            issues.push(Issue::error(
                codes::UI_TOOL_MISSING,
                format!("connectors.{}", connector.id),
                format!("UI-capable connector '{}' does not implement {tool}", connector.id),
            ));
        } else if !wrapper_re.is_match(&source) {
            issues.push(Issue::warning(
                codes::UI_RESPONSE_SHAPE,
                format!("connectors.{}", connector.id),
                format!("{tool} appears to return a bare array; wrap responses in {wrapper}"),
            ));
        }
    }

    let mentions_assets =
        files.iter().any(|f| f.path.contains("assets/") || f.content.contains("assets/"));
    if !mentions_assets {
        issues.push(Issue::warning(
            codes::UI_ASSETS_MISSING,
            format!("connectors.{}", connector.id),
            format!("UI-capable connector '{}' references no asset directory", connector.id),
        ));
    }
}
